//! # Entitlement Module
//!
//! The download-authorization rule engine: given what the storage layer knows
//! about a (user, book) pair, decide whether a download is permitted.
//!
//! ## The Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Download Authorization                               │
//! │                                                                         │
//! │  authorize_download(purchase, registered_device)                        │
//! │       │                                                                 │
//! │       ├── no completed purchase? ────────► Denied(NotPurchased)        │
//! │       │                                                                 │
//! │       ├── no device registered? ─────────► Denied(NoDevice)            │
//! │       │                                                                 │
//! │       ├── download cap exhausted? ───────► Denied(DownloadLimitReached)│
//! │       │                                                                 │
//! │       └── otherwise ─────────────────────► Permitted                   │
//! │                                                                         │
//! │  The denial reason is part of the contract: the caller routes the      │
//! │  user to the correct remediation (buy vs. register vs. support).      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One-Device Policy
//! The check is account-wide capacity, not request-specific attestation: the
//! purchase is not bound to *which* device makes the request. Any request
//! from an authenticated session whose account has a registered device may
//! download.
//!
//! ## Purity
//! This module never touches the database. The serving layer fetches the
//! rows inside its request-scoped transaction, asks this module for the
//! decision, and applies side effects (incrementing the download counter)
//! only on a permit.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::types::Purchase;

// =============================================================================
// Decision Types
// =============================================================================

/// Why a download was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenialReason {
    /// No completed purchase exists for this (user, book) pair.
    /// Pending, failed, and refunded purchases all land here.
    NotPurchased,
    /// The account has no registered download device.
    NoDevice,
    /// The purchase's download cap is exhausted.
    DownloadLimitReached,
}

impl DenialReason {
    /// The wire-level reason code returned to clients.
    pub fn code(&self) -> &'static str {
        match self {
            DenialReason::NotPurchased => "NOT_PURCHASED",
            DenialReason::NoDevice => "NO_DEVICE",
            DenialReason::DownloadLimitReached => "DOWNLOAD_LIMIT",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            DenialReason::NotPurchased => "book not purchased",
            DenialReason::NoDevice => "no device registered",
            DenialReason::DownloadLimitReached => "download limit reached",
        };
        write!(f, "{}", msg)
    }
}

/// The outcome of a download-authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DownloadDecision {
    Permitted,
    Denied(DenialReason),
}

impl DownloadDecision {
    #[inline]
    pub fn is_permitted(&self) -> bool {
        matches!(self, DownloadDecision::Permitted)
    }

    /// The denial reason, if denied.
    pub fn denial_reason(&self) -> Option<DenialReason> {
        match self {
            DownloadDecision::Permitted => None,
            DownloadDecision::Denied(reason) => Some(*reason),
        }
    }
}

// =============================================================================
// The Check
// =============================================================================

/// Decides whether a download is permitted.
///
/// ## Arguments
/// * `completed_purchase` - the completed purchase row for (user, book), if
///   one exists. Callers must pass `None` for pending/failed/refunded rows;
///   a non-completed row passed here is still denied defensively.
/// * `registered_device` - the user's registered device id, if any.
///
/// ## Ordering
/// Checks run purchase-first so a user who neither owns the book nor has a
/// device is told to buy first - the remediation that actually unblocks them.
///
/// ## Example
/// ```rust
/// use vault_core::entitlement::{authorize_download, DenialReason, DownloadDecision};
///
/// let decision = authorize_download(None, None);
/// assert_eq!(decision, DownloadDecision::Denied(DenialReason::NotPurchased));
/// ```
pub fn authorize_download(
    completed_purchase: Option<&Purchase>,
    registered_device: Option<&str>,
) -> DownloadDecision {
    let purchase = match completed_purchase {
        Some(p) if p.status.grants_entitlement() => p,
        _ => return DownloadDecision::Denied(DenialReason::NotPurchased),
    };

    if registered_device.is_none() {
        return DownloadDecision::Denied(DenialReason::NoDevice);
    }

    if purchase.download_count >= purchase.max_downloads {
        return DownloadDecision::Denied(DenialReason::DownloadLimitReached);
    }

    DownloadDecision::Permitted
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PurchaseStatus;
    use crate::DEFAULT_MAX_DOWNLOADS;
    use chrono::Utc;

    fn purchase(status: PurchaseStatus, download_count: i64) -> Purchase {
        Purchase {
            id: "p-1".to_string(),
            user_id: "u-1".to_string(),
            book_id: "b-1".to_string(),
            price_cents: 999,
            payment_method: "credit_card".to_string(),
            status,
            transaction_id: None,
            download_count,
            max_downloads: DEFAULT_MAX_DOWNLOADS,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_denied_without_purchase() {
        let decision = authorize_download(None, Some("ios-123"));
        assert_eq!(decision, DownloadDecision::Denied(DenialReason::NotPurchased));
    }

    #[test]
    fn test_denied_without_device() {
        let p = purchase(PurchaseStatus::Completed, 0);
        let decision = authorize_download(Some(&p), None);
        assert_eq!(decision, DownloadDecision::Denied(DenialReason::NoDevice));
    }

    #[test]
    fn test_permitted_with_purchase_and_device() {
        let p = purchase(PurchaseStatus::Completed, 0);
        let decision = authorize_download(Some(&p), Some("ios-123"));
        assert!(decision.is_permitted());
    }

    /// Which device is registered must not matter, only that one is.
    #[test]
    fn test_device_identity_is_irrelevant() {
        let p = purchase(PurchaseStatus::Completed, 0);
        assert!(authorize_download(Some(&p), Some("ios-123")).is_permitted());
        assert!(authorize_download(Some(&p), Some("android-999")).is_permitted());
    }

    /// A refunded purchase passed in defensively still denies as unpurchased.
    #[test]
    fn test_refunded_purchase_denies_as_not_purchased() {
        let p = purchase(PurchaseStatus::Refunded, 0);
        let decision = authorize_download(Some(&p), Some("ios-123"));
        assert_eq!(decision, DownloadDecision::Denied(DenialReason::NotPurchased));
    }

    #[test]
    fn test_download_cap() {
        let p = purchase(PurchaseStatus::Completed, DEFAULT_MAX_DOWNLOADS);
        let decision = authorize_download(Some(&p), Some("ios-123"));
        assert_eq!(
            decision,
            DownloadDecision::Denied(DenialReason::DownloadLimitReached)
        );
    }

    /// A purchased book with no device denies as NO_DEVICE; registering a
    /// device flips the same inputs to permitted.
    #[test]
    fn test_purchase_then_register_scenario() {
        let p = purchase(PurchaseStatus::Completed, 0);

        let before = authorize_download(Some(&p), None);
        assert_eq!(before.denial_reason(), Some(DenialReason::NoDevice));

        let after = authorize_download(Some(&p), Some("ios-123"));
        assert!(after.is_permitted());
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(DenialReason::NotPurchased.code(), "NOT_PURCHASED");
        assert_eq!(DenialReason::NoDevice.code(), "NO_DEVICE");
        assert_eq!(DenialReason::DownloadLimitReached.code(), "DOWNLOAD_LIMIT");
    }
}
