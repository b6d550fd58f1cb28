//! Authentication routes: signup, login, token refresh.
//!
//! Passwords are hashed with argon2; sessions are a stateless JWT
//! access + refresh pair. The login error is deliberately identical for
//! "no such user" and "wrong password".

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use vault_core::validation::{validate_email, validate_password, validate_person_name};
use vault_core::User;

use crate::auth::{hash_password, verify_password};
use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / Response Schemas
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// The user shape returned to clients (no password hash).
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub registered_device: Option<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            registered_device: user.registered_device_name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let email = validate_email(&req.email)?;
    validate_password(&req.password)?;
    let first_name = validate_person_name("first_name", &req.first_name)?;
    let last_name = validate_person_name("last_name", &req.last_name)?;

    let users = state.db.users();

    // Friendly early check; the unique index is the real guard
    if users.email_exists(&email).await? {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        password_hash: hash_password(&req.password)?,
        first_name,
        last_name,
        is_active: true,
        registered_device_id: None,
        registered_device_name: None,
        created_at: now,
        updated_at: now,
    };

    users.insert(&user).await.map_err(|e| {
        if e.is_unique_violation_on("email") {
            ApiError::Conflict("Email already registered".to_string())
        } else {
            e.into()
        }
    })?;

    info!(user_id = %user.id, "Account created");

    let token = state.jwt.generate_access_token(&user.id)?;
    let refresh_token = state.jwt.generate_refresh_token(&user.id)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserResponse::from(&user),
            token,
            refresh_token,
            expires_in: state.jwt.access_lifetime_secs(),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = validate_email(&req.email)?;

    let user = state.db.users().get_active_by_email(&email).await?;

    // Same response for unknown email and wrong password
    let user = match user {
        Some(u) if verify_password(&req.password, &u.password_hash) => u,
        _ => return Err(ApiError::unauthorized("Invalid email or password")),
    };

    info!(user_id = %user.id, "Login successful");

    let token = state.jwt.generate_access_token(&user.id)?;
    let refresh_token = state.jwt.generate_refresh_token(&user.id)?;

    Ok(Json(AuthResponse {
        user: UserResponse::from(&user),
        token,
        refresh_token,
        expires_in: state.jwt.access_lifetime_secs(),
    }))
}

/// POST /api/auth/refresh
///
/// Rotates the pair: a valid refresh token yields a fresh access token AND
/// a fresh refresh token. The account must still be active.
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let claims = state.jwt.validate_refresh_token(&req.refresh_token)?;

    // A deleted account's tokens stop working even before expiry
    if state
        .db
        .users()
        .get_active_by_id(&claims.sub)
        .await?
        .is_none()
    {
        return Err(ApiError::unauthorized("Account no longer active"));
    }

    let token = state.jwt.generate_access_token(&claims.sub)?;
    let refresh_token = state.jwt.generate_refresh_token(&claims.sub)?;

    Ok(Json(TokenResponse {
        token,
        refresh_token,
        expires_in: state.jwt.access_lifetime_secs(),
    }))
}
