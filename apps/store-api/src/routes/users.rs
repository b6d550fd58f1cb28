//! Account routes: profile, password, device slot, purchase views.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use vault_core::validation::{
    validate_device_id, validate_device_name, validate_email, validate_password,
    validate_person_name,
};
use vault_core::{CoreError, Purchase, User};

use crate::auth::{hash_password, verify_password, AuthenticatedUser};
use crate::error::ApiError;
use crate::routes::books::BookResponse;
use crate::state::AppState;

// =============================================================================
// Request / Response Schemas
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterDeviceRequest {
    pub device_id: String,
    pub device_name: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub registered_device: Option<String>,
    pub purchased_books: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct DeviceResponse {
    pub device_id: String,
    pub device_name: String,
}

#[derive(Debug, Serialize)]
pub struct PurchaseInfo {
    pub purchase_id: String,
    pub purchase_date: String,
    pub price_cents: i64,
    pub payment_method: String,
    pub status: String,
    pub download_count: i64,
    pub max_downloads: i64,
    pub can_download: bool,
}

impl From<&Purchase> for PurchaseInfo {
    fn from(p: &Purchase) -> Self {
        PurchaseInfo {
            purchase_id: p.id.clone(),
            purchase_date: p.created_at.to_rfc3339(),
            price_cents: p.price_cents,
            payment_method: p.payment_method.clone(),
            status: p.status.as_str().to_string(),
            download_count: p.download_count,
            max_downloads: p.max_downloads,
            can_download: p.can_download(),
        }
    }
}

/// One entry of the purchase-history view: the purchase plus a book summary.
#[derive(Debug, Serialize)]
pub struct PurchaseHistoryEntry {
    #[serde(flatten)]
    pub purchase: PurchaseInfo,
    pub book: Option<BookSummary>,
}

#[derive(Debug, Serialize)]
pub struct BookSummary {
    pub id: String,
    pub title: String,
    pub author: String,
    pub cover_image: Option<String>,
}

/// One entry of the library view: the book plus its purchase info.
#[derive(Debug, Serialize)]
pub struct PurchasedBookEntry {
    #[serde(flatten)]
    pub book: BookResponse,
    pub purchase_info: PurchaseInfo,
}

// =============================================================================
// Helpers
// =============================================================================

/// Fetches the authenticated account or reports it missing.
///
/// Soft-deleted accounts fail here even with a still-valid token.
async fn load_account(state: &AppState, user_id: &str) -> Result<User, ApiError> {
    state
        .db
        .users()
        .get_active_by_id(user_id)
        .await?
        .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()).into())
}

async fn profile_of(state: &AppState, account: &User) -> Result<ProfileResponse, ApiError> {
    let owned: Vec<String> = state
        .db
        .purchases()
        .list_completed_for_user(&account.id)
        .await?
        .into_iter()
        .map(|p| p.book_id)
        .collect();

    Ok(ProfileResponse {
        id: account.id.clone(),
        email: account.email.clone(),
        first_name: account.first_name.clone(),
        last_name: account.last_name.clone(),
        registered_device: account.registered_device_name.clone(),
        purchased_books: owned,
        created_at: account.created_at.to_rfc3339(),
    })
}

// =============================================================================
// Profile Handlers
// =============================================================================

/// GET /api/users/profile
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let account = load_account(&state, &user.user_id).await?;
    Ok(Json(profile_of(&state, &account).await?))
}

/// PUT /api/users/profile
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let account = load_account(&state, &user.user_id).await?;
    let users = state.db.users();

    let email = match req.email {
        Some(raw) => {
            let email = validate_email(&raw)?;
            if email != account.email && users.email_exists(&email).await? {
                return Err(ApiError::Conflict("Email already in use".to_string()));
            }
            email
        }
        None => account.email.clone(),
    };

    let first_name = match req.first_name {
        Some(raw) => validate_person_name("first_name", &raw)?,
        None => account.first_name.clone(),
    };

    let last_name = match req.last_name {
        Some(raw) => validate_person_name("last_name", &raw)?,
        None => account.last_name.clone(),
    };

    users
        .update_profile(&account.id, &email, &first_name, &last_name)
        .await
        .map_err(|e| {
            if e.is_unique_violation_on("email") {
                ApiError::Conflict("Email already in use".to_string())
            } else {
                e.into()
            }
        })?;

    let refreshed = load_account(&state, &account.id).await?;
    Ok(Json(profile_of(&state, &refreshed).await?))
}

/// PUT /api/users/password
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let account = load_account(&state, &user.user_id).await?;

    if !verify_password(&req.current_password, &account.password_hash) {
        return Err(ApiError::Validation(
            "Current password is incorrect".to_string(),
        ));
    }

    validate_password(&req.new_password)?;

    let hash = hash_password(&req.new_password)?;
    state
        .db
        .users()
        .update_password_hash(&account.id, &hash)
        .await?;

    info!(user_id = %account.id, "Password changed");

    Ok(Json(serde_json::json!({ "success": true })))
}

/// DELETE /api/users/account
///
/// Soft delete: the row stays for the purchase audit trail, but the account
/// disappears from every active lookup and its tokens stop refreshing.
pub async fn delete_account(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let account = load_account(&state, &user.user_id).await?;

    state.db.users().soft_delete(&account.id).await?;

    info!(user_id = %account.id, "Account soft-deleted");

    Ok(Json(serde_json::json!({ "success": true })))
}

// =============================================================================
// Device Handlers
// =============================================================================

/// POST /api/device
///
/// Registers the download device. An existing registration is silently
/// replaced - the slot holds one value and the last writer wins.
pub async fn register_device(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<RegisterDeviceRequest>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let device_id = validate_device_id(&req.device_id)?;
    let device_name = validate_device_name(&req.device_name)?;

    let account = load_account(&state, &user.user_id).await?;

    state
        .db
        .users()
        .register_device(&account.id, &device_id, &device_name)
        .await?;

    info!(user_id = %account.id, device_id = %device_id, "Device registered");

    Ok(Json(DeviceResponse {
        device_id,
        device_name,
    }))
}

/// DELETE /api/device
pub async fn unregister_device(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let account = load_account(&state, &user.user_id).await?;

    if !account.has_registered_device() {
        return Err(CoreError::NoDeviceRegistered.into());
    }

    state.db.users().unregister_device(&account.id).await?;

    info!(user_id = %account.id, "Device unregistered");

    Ok(Json(serde_json::json!({ "success": true })))
}

// =============================================================================
// Purchase View Handlers
// =============================================================================

/// GET /api/users/purchases
///
/// The full audit view: every purchase in any status, newest first.
pub async fn purchase_history(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<PurchaseHistoryEntry>>, ApiError> {
    let account = load_account(&state, &user.user_id).await?;

    let purchases = state.db.purchases().list_for_user(&account.id).await?;

    let mut entries = Vec::with_capacity(purchases.len());
    for purchase in &purchases {
        let book = state
            .db
            .books()
            .get_by_id(&purchase.book_id)
            .await?
            .map(|b| BookSummary {
                id: b.id,
                title: b.title,
                author: b.author,
                cover_image: b.cover_image,
            });

        entries.push(PurchaseHistoryEntry {
            purchase: PurchaseInfo::from(purchase),
            book,
        });
    }

    Ok(Json(entries))
}

/// GET /api/users/purchased-books
///
/// The library view: completed purchases joined with their (still-active)
/// catalog entries.
pub async fn purchased_books(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<PurchasedBookEntry>>, ApiError> {
    let account = load_account(&state, &user.user_id).await?;

    let purchases = state
        .db
        .purchases()
        .list_completed_for_user(&account.id)
        .await?;

    let mut entries = Vec::with_capacity(purchases.len());
    for purchase in &purchases {
        // Books pulled from the catalog can disappear from the library
        // view; the purchase history above still shows them
        if let Some(book) = state.db.books().get_active_by_id(&purchase.book_id).await? {
            entries.push(PurchasedBookEntry {
                book: BookResponse::from(&book),
                purchase_info: PurchaseInfo::from(purchase),
            });
        }
    }

    Ok(Json(entries))
}
