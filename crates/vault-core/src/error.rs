//! # Error Types
//!
//! Domain-specific error types for vault-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vault-core errors (this file)                                         │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  vault-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  REST API errors (in app)                                              │
//! │  └── ApiError         - What the frontend sees (status + JSON body)    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Frontend     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (email, ID, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::entitlement::DenialReason;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// User cannot be found (or has been soft-deleted).
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Book cannot be found.
    ///
    /// ## When This Occurs
    /// - Book ID doesn't exist in database
    /// - Book was deactivated (soft delete) and is no longer purchasable
    #[error("Book not found: {0}")]
    BookNotFound(String),

    /// The book exists but is not currently available for purchase.
    #[error("Book {0} is not available for purchase")]
    BookUnavailable(String),

    /// The user already owns this book.
    ///
    /// ## When This Occurs
    /// - A second purchase attempt for a (user, book) pair that already has
    ///   a completed purchase row
    /// - Two concurrent purchase attempts racing; the loser of the unique
    ///   constraint surfaces as this error
    ///
    /// ## User Workflow
    /// ```text
    /// Buy "Dune" (already in library)
    ///      │
    ///      ▼
    /// Completed purchase row exists for (user, book)
    ///      │
    ///      ▼
    /// AlreadyOwned { book_id: "..." }
    ///      │
    ///      ▼
    /// UI shows: "You already own this book"
    /// ```
    #[error("You already own this book: {book_id}")]
    AlreadyOwned { book_id: String },

    /// Download was denied by the entitlement check.
    ///
    /// Carries the specific [`DenialReason`] so the caller can route the
    /// user to the correct remediation (buy vs. register a device).
    #[error("Download not permitted: {reason}")]
    DownloadNotPermitted { reason: DenialReason },

    /// A purchase status transition that the state machine does not allow.
    ///
    /// ## When This Occurs
    /// - Refunding a purchase that is not completed
    /// - Completing a purchase that already failed
    #[error("Purchase {purchase_id} is {current_status}, cannot transition to {requested_status}")]
    InvalidStatusTransition {
        purchase_id: String,
        current_status: String,
        requested_status: String,
    },

    /// No device is registered on the account.
    #[error("No device is currently registered")]
    NoDeviceRegistered,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid email, invalid sort key).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., email already registered).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::AlreadyOwned {
            book_id: "b-42".to_string(),
        };
        assert_eq!(err.to_string(), "You already own this book: b-42");

        let err = CoreError::DownloadNotPermitted {
            reason: DenialReason::NoDevice,
        };
        assert_eq!(
            err.to_string(),
            "Download not permitted: no device registered"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "email".to_string(),
        };
        assert_eq!(err.to_string(), "email is required");

        let err = ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        };
        assert_eq!(err.to_string(), "password must be at least 6 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "email".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
