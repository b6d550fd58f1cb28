//! # Domain Types
//!
//! Core domain types used throughout BookVault.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │      Book       │   │    Purchase     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  email (unique) │   │  title, author  │   │  user_id (FK)   │       │
//! │  │  device slot    │   │  price_cents    │   │  book_id (FK)   │       │
//! │  │  password_hash  │   │  is_active      │   │  status         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │                        ┌─────────────────┐                              │
//! │                        │ PurchaseStatus  │                              │
//! │                        │  ─────────────  │                              │
//! │                        │  Pending        │                              │
//! │                        │  Completed ◄── only this grants entitlement   │
//! │                        │  Failed         │                              │
//! │                        │  Refunded       │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity has an immutable UUID v4 `id` used for database relations.
//! Users additionally have a unique, mutable `email` as the human-facing key.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::DEFAULT_MAX_DOWNLOADS;

// =============================================================================
// User
// =============================================================================

/// A customer account.
///
/// The device slot is a single nullable field pair, not an owned collection:
/// the one-device policy holds exactly one identifier and registering a new
/// device overwrites the previous one (last-writer-wins).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Email address (unique, stored lowercased).
    pub email: String,

    /// Argon2 password hash. Never serialized to clients.
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub first_name: String,
    pub last_name: String,

    /// Whether the account is active (soft delete).
    pub is_active: bool,

    /// The single registered download device, if any.
    pub registered_device_id: Option<String>,

    /// Human-readable name of the registered device (e.g. "Maya's iPad").
    pub registered_device_name: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Checks whether any download device is registered on this account.
    ///
    /// The entitlement check cares only that *a* device exists, not which
    /// device issued the request (account-wide capacity, not attestation).
    #[inline]
    pub fn has_registered_device(&self) -> bool {
        self.registered_device_id.is_some()
    }
}

// =============================================================================
// Book
// =============================================================================

/// A catalog entry.
///
/// Books are created and maintained by catalog management; from the purchase
/// and entitlement flow's perspective they are read-only.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Book {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub title: String,
    pub author: String,
    pub description: Option<String>,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Cover image URL.
    pub cover_image: Option<String>,

    pub genre: String,

    /// Average rating (0.0 - 5.0).
    pub rating: f64,
    pub rating_count: i64,

    #[ts(as = "String")]
    pub published_date: NaiveDate,

    /// Path to the ebook file served on download.
    pub file_path: Option<String>,

    /// File size in bytes.
    pub file_size: Option<i64>,

    /// Whether the book is available for purchase (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if the book can currently be purchased.
    #[inline]
    pub fn is_purchasable(&self) -> bool {
        self.is_active
    }
}

// =============================================================================
// Purchase Status
// =============================================================================

/// The status of a purchase.
///
/// ## State Machine
/// ```text
/// pending ──► completed ──► refunded
///    │
///    └──────► failed
/// ```
/// Only `completed` grants download entitlement. A refund revokes future
/// authorization checks without deleting the audit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    /// Purchase recorded, payment not yet confirmed.
    Pending,
    /// Payment confirmed. The only status that grants entitlement.
    Completed,
    /// Payment failed.
    Failed,
    /// Purchase was refunded after completion.
    Refunded,
}

impl PurchaseStatus {
    /// Whether a transition from `self` to `next` is allowed by the
    /// purchase state machine.
    pub fn can_transition_to(&self, next: PurchaseStatus) -> bool {
        use PurchaseStatus::*;
        matches!(
            (self, next),
            (Pending, Completed) | (Pending, Failed) | (Completed, Refunded)
        )
    }

    /// Whether this status grants download entitlement.
    #[inline]
    pub fn grants_entitlement(&self) -> bool {
        matches!(self, PurchaseStatus::Completed)
    }

    /// The lowercase wire/database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Completed => "completed",
            PurchaseStatus::Failed => "failed",
            PurchaseStatus::Refunded => "refunded",
        }
    }
}

impl Default for PurchaseStatus {
    fn default() -> Self {
        PurchaseStatus::Pending
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// A purchase of a book by a user.
///
/// Purchase rows are never deleted - they form the audit trail. The price is
/// snapshotted at purchase time so later catalog price changes do not rewrite
/// history.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Purchase {
    pub id: String,
    pub user_id: String,
    pub book_id: String,

    /// Price in cents at time of purchase (frozen).
    pub price_cents: i64,

    /// Payment method as recorded at the boundary (e.g. "credit_card").
    /// Not integrated with a gateway; a recorded string by design scope.
    pub payment_method: String,

    pub status: PurchaseStatus,

    /// External payment processor transaction reference, when present.
    pub transaction_id: Option<String>,

    /// Number of downloads already consumed against this purchase.
    pub download_count: i64,

    /// Download cap for this purchase.
    pub max_downloads: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Purchase {
    /// Returns the purchase price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Downloads still available against this purchase.
    #[inline]
    pub fn downloads_remaining(&self) -> i64 {
        (self.max_downloads - self.download_count).max(0)
    }

    /// Whether this purchase currently permits a download.
    ///
    /// Status must be completed and the download cap must not be exhausted.
    /// The device-registration half of the entitlement check lives in
    /// [`crate::entitlement`], because it is a property of the user, not of
    /// the purchase.
    pub fn can_download(&self) -> bool {
        self.status.grants_entitlement() && self.download_count < self.max_downloads
    }
}

/// The default download cap applied to new purchases.
#[inline]
pub fn default_max_downloads() -> i64 {
    DEFAULT_MAX_DOWNLOADS
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn purchase_with(status: PurchaseStatus, downloads: i64) -> Purchase {
        Purchase {
            id: "p-1".to_string(),
            user_id: "u-1".to_string(),
            book_id: "b-1".to_string(),
            price_cents: 999,
            payment_method: "credit_card".to_string(),
            status,
            transaction_id: None,
            download_count: downloads,
            max_downloads: DEFAULT_MAX_DOWNLOADS,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_transitions() {
        use PurchaseStatus::*;

        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Failed));
        assert!(Completed.can_transition_to(Refunded));

        // Everything else is forbidden
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Refunded.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Refunded));
    }

    #[test]
    fn test_only_completed_grants_entitlement() {
        assert!(PurchaseStatus::Completed.grants_entitlement());
        assert!(!PurchaseStatus::Pending.grants_entitlement());
        assert!(!PurchaseStatus::Failed.grants_entitlement());
        assert!(!PurchaseStatus::Refunded.grants_entitlement());
    }

    #[test]
    fn test_can_download_respects_cap() {
        let fresh = purchase_with(PurchaseStatus::Completed, 0);
        assert!(fresh.can_download());
        assert_eq!(fresh.downloads_remaining(), DEFAULT_MAX_DOWNLOADS);

        let exhausted = purchase_with(PurchaseStatus::Completed, DEFAULT_MAX_DOWNLOADS);
        assert!(!exhausted.can_download());
        assert_eq!(exhausted.downloads_remaining(), 0);
    }

    #[test]
    fn test_refunded_purchase_cannot_download() {
        let refunded = purchase_with(PurchaseStatus::Refunded, 0);
        assert!(!refunded.can_download());
    }

    #[test]
    fn test_price_snapshot() {
        let p = purchase_with(PurchaseStatus::Completed, 0);
        assert_eq!(p.price().cents(), 999);
        assert_eq!(format!("{}", p.price()), "$9.99");
    }
}
