//! Purchase and download-authorization routes - the entitlement flow.
//!
//! ## Purchase Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/purchase { book_id, payment_method }                         │
//! │       │                                                                 │
//! │       ├── user inactive/missing ───────────► 404                       │
//! │       ├── book missing ────────────────────► 404                       │
//! │       ├── book deactivated ────────────────► 404 (unavailable)         │
//! │       ├── already owned (pre-check) ───────► 409                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT completed purchase (price snapshot, demo transaction id)       │
//! │       │                                                                 │
//! │       ├── UNIQUE violation (lost the race) ► 409 "already own"         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  201 { purchase_id, download_url }                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Authorization Flow
//! GET /api/download-authorization always answers 200 with an explicit
//! permit/deny payload; the deny carries a machine reason code so the
//! frontend can route the user to "buy" vs. "register a device". Only
//! missing auth or unknown ids are HTTP errors.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use vault_core::entitlement::{authorize_download, DownloadDecision};
use vault_core::validation::validate_payment_method;
use vault_core::CoreError;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / Response Schemas
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub book_id: String,
    pub payment_method: String,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub purchase_id: String,
    pub download_url: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthorizationQuery {
    pub book_id: String,
}

/// Permit/deny payload for the download-authorization check.
///
/// `reason` is present exactly when `permitted` is false; the download
/// fields are present exactly when it is true.
#[derive(Debug, Serialize)]
pub struct AuthorizationResponse {
    pub permitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloads_remaining: Option<i64>,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/purchase
pub async fn purchase_book(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<PurchaseResponse>), ApiError> {
    let payment_method = validate_payment_method(&req.payment_method)?;

    let account = state
        .db
        .users()
        .get_active_by_id(&user.user_id)
        .await?
        .ok_or_else(|| CoreError::UserNotFound(user.user_id.clone()))?;

    let book = state
        .db
        .books()
        .get_by_id(&req.book_id)
        .await?
        .ok_or_else(|| CoreError::BookNotFound(req.book_id.clone()))?;

    if !book.is_purchasable() {
        return Err(CoreError::BookUnavailable(book.id).into());
    }

    let purchases = state.db.purchases();

    // Friendly early check; the partial unique index is the real guard
    if purchases.has_completed(&account.id, &book.id).await? {
        return Err(CoreError::AlreadyOwned { book_id: book.id }.into());
    }

    // Payment is recorded, not processed: the row is born completed with a
    // demo transaction reference
    let transaction_id = format!("demo_txn_{}", Utc::now().timestamp_millis());

    let purchase = purchases
        .create_completed(
            &account.id,
            &book.id,
            book.price_cents,
            &payment_method,
            Some(transaction_id),
        )
        .await
        .map_err(|e| {
            if e.is_unique_violation_on("user_id") {
                // Lost a concurrent race for the same (user, book) pair
                ApiError::from(CoreError::AlreadyOwned {
                    book_id: req.book_id.clone(),
                })
            } else {
                e.into()
            }
        })?;

    info!(
        user_id = %account.id,
        book_id = %book.id,
        purchase_id = %purchase.id,
        price = %purchase.price(),
        "Book purchased"
    );

    Ok((
        StatusCode::CREATED,
        Json(PurchaseResponse {
            purchase_id: purchase.id,
            download_url: format!("/api/download-authorization?book_id={}", book.id),
        }),
    ))
}

/// GET /api/download-authorization?book_id=
pub async fn download_authorization(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<AuthorizationQuery>,
) -> Result<Json<AuthorizationResponse>, ApiError> {
    let account = state
        .db
        .users()
        .get_active_by_id(&user.user_id)
        .await?
        .ok_or_else(|| CoreError::UserNotFound(user.user_id.clone()))?;

    let book = state
        .db
        .books()
        .get_active_by_id(&query.book_id)
        .await?
        .ok_or_else(|| CoreError::BookNotFound(query.book_id.clone()))?;

    let purchases = state.db.purchases();
    let purchase = purchases.find_completed(&account.id, &book.id).await?;

    let decision = authorize_download(
        purchase.as_ref(),
        account.registered_device_id.as_deref(),
    );

    match (decision, purchase) {
        (DownloadDecision::Denied(reason), _) => {
            info!(
                user_id = %account.id,
                book_id = %book.id,
                reason = reason.code(),
                "Download denied"
            );

            Ok(Json(AuthorizationResponse {
                permitted: false,
                reason: Some(reason.code()),
                download_url: None,
                expires_in: None,
                downloads_remaining: None,
            }))
        }
        // authorize_download only permits when a completed purchase exists
        (DownloadDecision::Permitted, None) => Err(ApiError::Internal(
            "permit without a completed purchase".to_string(),
        )),
        (DownloadDecision::Permitted, Some(purchase)) => {
            // The decision said yes; consume one download. The guarded
            // UPDATE re-checks the cap so a concurrent request cannot
            // overshoot it - if we lose that race, report the limit.
            let refreshed =
                purchases
                    .record_download(&purchase.id)
                    .await
                    .map_err(|e| match e {
                        vault_db::DbError::NotFound { .. } => {
                            ApiError::from(CoreError::DownloadNotPermitted {
                                reason: vault_core::DenialReason::DownloadLimitReached,
                            })
                        }
                        other => other.into(),
                    })?;

            info!(
                user_id = %account.id,
                book_id = %book.id,
                downloads_remaining = refreshed.downloads_remaining(),
                "Download authorized"
            );

            Ok(Json(AuthorizationResponse {
                permitted: true,
                reason: None,
                download_url: Some(format!("/downloads/{}/{}", book.id, refreshed.id)),
                expires_in: Some(state.config.download_link_lifetime_secs),
                downloads_remaining: Some(refreshed.downloads_remaining()),
            }))
        }
    }
}
