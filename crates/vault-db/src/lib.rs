//! # vault-db: Database Layer for BookVault
//!
//! This crate provides database access for the BookVault system.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        BookVault Data Flow                              │
//! │                                                                         │
//! │  REST Handler (purchase_book)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     vault-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (user.rs)    │    │  (embedded)  │  │   │
//! │  │   │               │    │  (book.rs)    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  (purchase.rs)│    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │               │    │              │  │   │
//! │  │   │ Management    │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │                  ./data/bookvault.db (WAL)                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (user, book, purchase)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vault_db::{Database, DbConfig};
//!
//! // Create database with default config
//! let config = DbConfig::new("path/to/bookvault.db");
//! let db = Database::new(config).await?;
//!
//! // Use repositories
//! let book = db.books().get_active_by_id("uuid-here").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::book::{BookPage, BookRepository, BookSearchParams};
pub use repository::purchase::PurchaseRepository;
pub use repository::user::UserRepository;
