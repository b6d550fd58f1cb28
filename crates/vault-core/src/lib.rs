//! # vault-core: Pure Business Logic for BookVault
//!
//! This crate is the **heart** of BookVault. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       BookVault Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Frontend (SPA, out of repo)                    │   │
//! │  │    Catalog UI ──► Purchase UI ──► Library UI ──► Reader        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ REST (JSON)                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  apps/store-api (axum)                          │   │
//! │  │    signup, login, browse, purchase, authorize download          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vault-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌──────────┐  │   │
//! │  │   │   types   │  │   money   │  │entitlement │  │validation│  │   │
//! │  │   │   User    │  │   Money   │  │  download  │  │  rules   │  │   │
//! │  │   │   Book    │  │  display  │  │   gating   │  │  checks  │  │   │
//! │  │   │ Purchase  │  │   math    │  │            │  │          │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    vault-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (User, Book, Purchase, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`entitlement`] - The download-authorization rule engine
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use vault_core::entitlement::{authorize_download, DenialReason};
//! use vault_core::DownloadDecision;
//!
//! // A user with no completed purchase is denied with a specific reason
//! let decision = authorize_download(None, Some("ios-123"));
//! assert_eq!(decision, DownloadDecision::Denied(DenialReason::NotPurchased));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod entitlement;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use vault_core::Money` instead of
// `use vault_core::money::Money`

pub use entitlement::{authorize_download, DenialReason, DownloadDecision};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default number of downloads allowed per completed purchase.
///
/// ## Business Reason
/// Downloads are a direct file handoff with no DRM, so an account-wide cap
/// per purchase keeps casual re-sharing in check without punishing users who
/// re-download onto a replacement device.
pub const DEFAULT_MAX_DOWNLOADS: i64 = 5;

/// Maximum catalog page size a client may request.
///
/// ## Business Reason
/// Prevents a single request from dragging the whole catalog over the wire.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default catalog page size when the client does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
