//! JWT authentication and password hashing.
//!
//! Handles token generation/validation for the access + refresh pair, argon2
//! password hashing, and the extractor that guards authenticated routes.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Claims & Token Manager
// =============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    /// Token type ("access" or "refresh")
    pub token_type: String,
}

/// JWT token manager.
#[derive(Clone)]
pub struct JwtManager {
    secret: String,
    access_lifetime_secs: i64,
    refresh_lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: String, access_lifetime_secs: i64, refresh_lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            access_lifetime_secs,
            refresh_lifetime_secs,
        }
    }

    /// Access token lifetime, exposed for the login response's expires_in.
    pub fn access_lifetime_secs(&self) -> i64 {
        self.access_lifetime_secs
    }

    fn generate(&self, user_id: &str, token_type: &str, lifetime_secs: i64) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(lifetime_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: token_type.to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Generate an access token.
    pub fn generate_access_token(&self, user_id: &str) -> Result<String, ApiError> {
        self.generate(user_id, "access", self.access_lifetime_secs)
    }

    /// Generate a refresh token.
    pub fn generate_refresh_token(&self, user_id: &str) -> Result<String, ApiError> {
        self.generate(user_id, "refresh", self.refresh_lifetime_secs)
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| ApiError::AuthFailed(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }

    /// Validate that a token is an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, ApiError> {
        let claims = self.validate_token(token)?;

        if claims.token_type != "access" {
            return Err(ApiError::AuthFailed("Expected access token".to_string()));
        }

        Ok(claims)
    }

    /// Validate that a token is a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, ApiError> {
        let claims = self.validate_token(token)?;

        if claims.token_type != "refresh" {
            return Err(ApiError::AuthFailed("Expected refresh token".to_string()));
        }

        Ok(claims)
    }
}

// =============================================================================
// Password Hashing
// =============================================================================

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a password against its stored hash.
///
/// Malformed hashes verify as false rather than erroring; a corrupted hash
/// should read as "wrong password", not a 500.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Request Extractor
// =============================================================================

/// Extracts and validates the bearer token on protected routes.
///
/// Handlers take `user: AuthenticatedUser` as an argument; requests without
/// a valid access token are rejected with 401 before the handler runs.
pub struct AuthenticatedUser {
    pub user_id: String,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::unauthorized("Missing Authorization header"))?;

        let claims = state.jwt.validate_access_token(bearer.token())?;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600, 86400);

        let access_token = manager.generate_access_token("user-001").unwrap();

        let claims = manager.validate_access_token(&access_token).unwrap();

        assert_eq!(claims.sub, "user-001");
        assert_eq!(claims.token_type, "access");
    }

    #[test]
    fn test_refresh_token() {
        let manager = JwtManager::new("test-secret".to_string(), 3600, 86400);

        let refresh_token = manager.generate_refresh_token("user-001").unwrap();

        let claims = manager.validate_refresh_token(&refresh_token).unwrap();
        assert_eq!(claims.token_type, "refresh");
    }

    #[test]
    fn test_wrong_token_type() {
        let manager = JwtManager::new("test-secret".to_string(), 3600, 86400);

        let access_token = manager.generate_access_token("user-001").unwrap();

        // Try to validate access token as refresh token
        let result = manager.validate_refresh_token(&access_token);
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let manager = JwtManager::new("secret-a".to_string(), 3600, 86400);
        let other = JwtManager::new("secret-b".to_string(), 3600, 86400);

        let token = manager.generate_access_token("user-001").unwrap();
        assert!(other.validate_access_token(&token).is_err());
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("password123").unwrap();

        assert!(verify_password("password123", &hash));
        assert!(!verify_password("wrong-password", &hash));
        // Hashes are salted - two hashes of the same password differ
        let hash2 = hash_password("password123").unwrap();
        assert_ne!(hash, hash2);
    }

    #[test]
    fn test_malformed_hash_is_just_wrong() {
        assert!(!verify_password("password123", "not-a-phc-string"));
    }
}
