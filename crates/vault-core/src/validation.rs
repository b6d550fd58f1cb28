//! # Validation Module
//!
//! Input validation utilities for BookVault.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (SPA)                                               │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: REST Handler (Rust)                                          │
//! │  ├── Type validation (deserialization into request structs)            │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints (email, completed purchase pair)               │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: Multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum password length accepted at signup and password change.
pub const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// String Validators
// =============================================================================

/// Validates and normalizes an email address.
///
/// ## Rules
/// - Must not be empty
/// - Must contain exactly one `@` with a dot in the domain part
/// - Maximum 120 characters
///
/// ## Returns
/// The trimmed, lowercased email (the canonical form stored in the database).
///
/// ## Example
/// ```rust
/// use vault_core::validation::validate_email;
///
/// assert_eq!(validate_email(" Maya@Example.COM ").unwrap(), "maya@example.com");
/// assert!(validate_email("not-an-email").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim().to_lowercase();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if email.len() > 120 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 120,
        });
    }

    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");

    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.ends_with('.') {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must be a valid email address".to_string(),
        });
    }

    Ok(email)
}

/// Validates a password.
///
/// Only length is checked here; strength estimation is a UI concern.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.len() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    if password.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }

    Ok(())
}

/// Validates a person name field (first or last name).
///
/// ## Rules
/// - Must be at least 2 characters after trimming
/// - Maximum 50 characters
pub fn validate_person_name(field: &str, name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.len() < 2 {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min: 2,
        });
    }

    if name.len() > 50 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 50,
        });
    }

    Ok(name.to_string())
}

/// Validates a device identifier.
///
/// Device ids are opaque client-generated strings (e.g. "ios-123"); we only
/// bound their size and require them to be non-empty.
pub fn validate_device_id(device_id: &str) -> ValidationResult<String> {
    let device_id = device_id.trim();

    if device_id.is_empty() {
        return Err(ValidationError::Required {
            field: "device_id".to_string(),
        });
    }

    if device_id.len() > 255 {
        return Err(ValidationError::TooLong {
            field: "device_id".to_string(),
            max: 255,
        });
    }

    Ok(device_id.to_string())
}

/// Validates a device display name.
pub fn validate_device_name(device_name: &str) -> ValidationResult<String> {
    let device_name = device_name.trim();

    if device_name.is_empty() {
        return Err(ValidationError::Required {
            field: "device_name".to_string(),
        });
    }

    if device_name.len() > 255 {
        return Err(ValidationError::TooLong {
            field: "device_name".to_string(),
            max: 255,
        });
    }

    Ok(device_name.to_string())
}

/// Validates a payment method string.
///
/// Payment is recorded, not processed, so any reasonably-sized label is
/// accepted rather than a closed set of processor names.
pub fn validate_payment_method(method: &str) -> ValidationResult<String> {
    let method = method.trim();

    if method.is_empty() {
        return Err(ValidationError::Required {
            field: "payment_method".to_string(),
        });
    }

    if method.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "payment_method".to_string(),
            max: 50,
        });
    }

    Ok(method.to_string())
}

/// Validates a catalog search query.
///
/// ## Rules
/// - Can be empty (returns the unfiltered catalog)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Catalog Sort & Pagination
// =============================================================================

/// Allowed catalog sort fields.
pub const SORT_FIELDS: &[&str] = &["title", "author", "price", "rating", "published_date"];

/// Validates a sort field, falling back to `title` for unknown values.
///
/// Unknown sort keys are coerced rather than rejected so stale frontend
/// builds degrade gracefully.
pub fn validate_sort_field(sort_by: &str) -> &'static str {
    SORT_FIELDS
        .iter()
        .find(|f| **f == sort_by)
        .copied()
        .unwrap_or("title")
}

/// Validates a sort order, falling back to ascending.
pub fn validate_sort_order(order: &str) -> &'static str {
    if order.eq_ignore_ascii_case("desc") {
        "desc"
    } else {
        "asc"
    }
}

/// Clamps pagination parameters to sane bounds.
///
/// ## Returns
/// `(page, per_page)` with page >= 1 and per_page in 1..=[`MAX_PAGE_SIZE`].
pub fn clamp_pagination(page: Option<u32>, per_page: Option<u32>) -> (u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    (page, per_page)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert_eq!(
            validate_email("Maya@Example.COM").unwrap(),
            "maya@example.com"
        );
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("user@nodot").is_err());
        assert!(validate_email("user@trailing.").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret1").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password("").is_err());
    }

    #[test]
    fn test_validate_person_name() {
        assert_eq!(validate_person_name("first_name", " Maya ").unwrap(), "Maya");
        assert!(validate_person_name("first_name", "M").is_err());
    }

    #[test]
    fn test_validate_device_fields() {
        assert_eq!(validate_device_id(" ios-123 ").unwrap(), "ios-123");
        assert!(validate_device_id("  ").is_err());
        assert!(validate_device_name("Maya's iPad").is_ok());
        assert!(validate_device_name("").is_err());
    }

    #[test]
    fn test_validate_payment_method() {
        assert!(validate_payment_method("credit_card").is_ok());
        assert!(validate_payment_method("").is_err());
    }

    #[test]
    fn test_sort_coercion() {
        assert_eq!(validate_sort_field("price"), "price");
        assert_eq!(validate_sort_field("'; DROP TABLE books;--"), "title");
        assert_eq!(validate_sort_order("DESC"), "desc");
        assert_eq!(validate_sort_order("sideways"), "asc");
    }

    #[test]
    fn test_clamp_pagination() {
        assert_eq!(clamp_pagination(None, None), (1, DEFAULT_PAGE_SIZE));
        assert_eq!(clamp_pagination(Some(0), Some(0)), (1, 1));
        assert_eq!(clamp_pagination(Some(3), Some(500)), (3, MAX_PAGE_SIZE));
    }
}
