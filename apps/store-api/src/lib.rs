//! # BookVault Store API
//!
//! REST server for the ebook storefront.
//!
//! ## Surface
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Store API Routes                                │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  Auth          │  │  Catalog       │  │  Entitlement               ││
//! │  │                │  │                │  │                            ││
//! │  │ • Signup       │  │ • List/Search  │  │ • Purchase                 ││
//! │  │ • Login        │  │ • Single book  │  │ • Download authorization   ││
//! │  │ • Refresh      │  │ • Genres       │  │ • Device register/remove   ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐                                                     │
//! │  │  Account       │                                                     │
//! │  │                │                                                     │
//! │  │ • Profile      │                                                     │
//! │  │ • Password     │                                                     │
//! │  │ • Library      │                                                     │
//! │  │ • History      │                                                     │
//! │  └────────────────┘                                                     │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │                                                                   │  │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────┐│  │
//! │  │  │  SQLite      │  │  JWT Auth    │  │  argon2 hashing          ││  │
//! │  │  │  (vault-db)  │  │ access +     │  │  password storage        ││  │
//! │  │  │              │  │ refresh pair │  │                          ││  │
//! │  │  └──────────────┘  └──────────────┘  └──────────────────────────┘│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `DATABASE_PATH` - SQLite database file (default: ./bookvault_dev.db)
//! - `HTTP_PORT` - HTTP listen port (default: 8080)
//! - `JWT_SECRET` - Secret for JWT signing
//! - `JWT_ACCESS_LIFETIME_SECS` - Access token lifetime (default: 3600)
//! - `JWT_REFRESH_LIFETIME_SECS` - Refresh token lifetime (default: 2592000)
//! - `CORS_ORIGINS` - Comma-separated allowed origins
//! - `DOWNLOAD_LINK_LIFETIME_SECS` - Download reference lifetime (default: 3600)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

// Re-exports
pub use config::ApiConfig;
pub use error::ApiError;
pub use state::AppState;
