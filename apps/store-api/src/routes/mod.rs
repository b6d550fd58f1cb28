//! # Route Layer
//!
//! Assembles the REST surface the SPA consumes.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Route Map                                      │
//! │                                                                         │
//! │  Public                                                                 │
//! │    POST   /api/auth/signup            create account, returns tokens   │
//! │    POST   /api/auth/login             returns access + refresh pair    │
//! │    POST   /api/auth/refresh           rotate the token pair            │
//! │    GET    /api/books                  catalog search/filter/paginate   │
//! │    GET    /api/books/genres           distinct genres                  │
//! │    GET    /api/books/{id}             single book                      │
//! │    GET    /api/health                 liveness + db check              │
//! │                                                                         │
//! │  Authenticated (Bearer access token)                                    │
//! │    POST   /api/purchase               buy a book                       │
//! │    GET    /api/download-authorization permit/deny with reason code     │
//! │    POST   /api/device                 register the download device     │
//! │    DELETE /api/device                 unregister it                    │
//! │    GET    /api/users/profile          profile + owned book ids         │
//! │    PUT    /api/users/profile          update email/names               │
//! │    PUT    /api/users/password         change password                  │
//! │    DELETE /api/users/account          soft-delete account              │
//! │    GET    /api/users/purchases        full purchase history            │
//! │    GET    /api/users/purchased-books  library view                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::{
    extract::State,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use crate::state::AppState;

pub mod auth;
pub mod books;
pub mod purchases;
pub mod users;

/// Builds the full API router with shared state applied.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Auth
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        // Catalog
        .route("/api/books", get(books::list_books))
        .route("/api/books/genres", get(books::list_genres))
        .route("/api/books/{book_id}", get(books::get_book))
        // Purchase & entitlement
        .route("/api/purchase", post(purchases::purchase_book))
        .route(
            "/api/download-authorization",
            get(purchases::download_authorization),
        )
        // Device slot
        .route(
            "/api/device",
            post(users::register_device).delete(users::unregister_device),
        )
        // Account
        .route(
            "/api/users/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/api/users/password", put(users::change_password))
        .route("/api/users/account", delete(users::delete_account))
        .route("/api/users/purchases", get(users::purchase_history))
        .route("/api/users/purchased-books", get(users::purchased_books))
        // Diagnostics
        .route("/api/health", get(health))
        .with_state(state)
}

/// Liveness probe with a database round-trip.
async fn health(State(state): State<AppState>) -> Json<Value> {
    let db_ok = state.db.health_check().await;
    let status = if db_ok { "ok" } else { "degraded" };
    Json(json!({
        "status": status,
        "database": db_ok,
    }))
}
