//! # User Repository
//!
//! Database operations for user accounts and the single-device slot.
//!
//! ## Device Registration
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One-Device Policy Storage                            │
//! │                                                                         │
//! │  The device "collection" is two nullable columns on the users row:     │
//! │                                                                         │
//! │  registered_device_id   │ registered_device_name                        │
//! │  ──────────────────────┼───────────────────────                        │
//! │  NULL                  │ NULL          ← no device registered          │
//! │  "ios-123"             │ "Maya's iPad" ← exactly one device            │
//! │                                                                         │
//! │  register_device() overwrites both columns unconditionally             │
//! │  (last-writer-wins). Two concurrent registrations race; the last       │
//! │  commit wins, which is the accepted semantic - no stronger ordering    │
//! │  is guaranteed or needed.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use vault_core::User;

/// Column list shared by the SELECT queries below.
const USER_COLUMNS: &str = r#"
    id, email, password_hash, first_name, last_name,
    is_active, registered_device_id, registered_device_name,
    created_at, updated_at
"#;

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new user.
    ///
    /// ## Returns
    /// * `Ok(())` - User inserted
    /// * `Err(DbError::UniqueViolation)` - Email already registered
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(email = %user.email, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, password_hash, first_name, last_name,
                is_active, registered_device_id, registered_device_name,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_active)
        .bind(&user.registered_device_id)
        .bind(&user.registered_device_name)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a user by ID, regardless of active flag.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets an active user by ID.
    ///
    /// Soft-deleted accounts are treated as absent everywhere except the
    /// audit trail, so this is the variant handlers should use.
    pub async fn get_active_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1 AND is_active = 1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets an active user by email (the login lookup).
    ///
    /// ## Arguments
    /// * `email` - Already-normalized (lowercased) email
    pub async fn get_active_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1 AND is_active = 1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Checks whether an email is already registered (any active flag).
    pub async fn email_exists(&self, email: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?1")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Updates profile fields (email and names).
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - New email already taken
    /// * `Err(DbError::NotFound)` - User doesn't exist or is inactive
    pub async fn update_profile(
        &self,
        id: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> DbResult<()> {
        debug!(id = %id, "Updating user profile");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE users SET
                email = ?2,
                first_name = ?3,
                last_name = ?4,
                updated_at = ?5
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Replaces the stored password hash.
    pub async fn update_password_hash(&self, id: &str, password_hash: &str) -> DbResult<()> {
        debug!(id = %id, "Updating password hash");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE users SET
                password_hash = ?2,
                updated_at = ?3
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Registers a download device, overwriting any existing registration.
    ///
    /// The one-device policy is a single slot; there is no capacity check
    /// beyond the columns themselves holding one value. Last writer wins.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - User doesn't exist or is inactive
    pub async fn register_device(
        &self,
        id: &str,
        device_id: &str,
        device_name: &str,
    ) -> DbResult<()> {
        debug!(id = %id, device_id = %device_id, "Registering device");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE users SET
                registered_device_id = ?2,
                registered_device_name = ?3,
                updated_at = ?4
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(device_id)
        .bind(device_name)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Clears the device slot.
    pub async fn unregister_device(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Unregistering device");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE users SET
                registered_device_id = NULL,
                registered_device_name = NULL,
                updated_at = ?2
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Soft-deletes a user account.
    ///
    /// ## Why Soft Delete?
    /// - Purchase rows reference this user (audit trail)
    /// - Can be restored by support if deleted by mistake
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting user");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE users SET
                is_active = 0,
                updated_at = ?2
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }
}

/// Helper to generate a new user ID.
pub fn generate_user_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn sample_user(email: &str) -> User {
        let now = Utc::now();
        User {
            id: generate_user_id(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            first_name: "Maya".to_string(),
            last_name: "Reyes".to_string(),
            is_active: true,
            registered_device_id: None,
            registered_device_name: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let db = test_db().await;
        let repo = db.users();

        let user = sample_user("maya@example.com");
        repo.insert(&user).await.unwrap();

        let fetched = repo.get_active_by_email("maya@example.com").await.unwrap();
        assert_eq!(fetched.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = test_db().await;
        let repo = db.users();

        repo.insert(&sample_user("dup@example.com")).await.unwrap();
        let err = repo.insert(&sample_user("dup@example.com")).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert!(err.is_unique_violation_on("email"));
    }

    #[tokio::test]
    async fn test_device_overwrite_is_last_writer_wins() {
        let db = test_db().await;
        let repo = db.users();

        let user = sample_user("device@example.com");
        repo.insert(&user).await.unwrap();

        repo.register_device(&user.id, "ios-123", "Maya's iPhone")
            .await
            .unwrap();
        repo.register_device(&user.id, "kindle-9", "Maya's Kindle")
            .await
            .unwrap();

        let fetched = repo.get_active_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(fetched.registered_device_id.as_deref(), Some("kindle-9"));
        assert_eq!(
            fetched.registered_device_name.as_deref(),
            Some("Maya's Kindle")
        );
    }

    #[tokio::test]
    async fn test_unregister_clears_slot() {
        let db = test_db().await;
        let repo = db.users();

        let user = sample_user("clear@example.com");
        repo.insert(&user).await.unwrap();
        repo.register_device(&user.id, "ios-123", "iPhone").await.unwrap();
        repo.unregister_device(&user.id).await.unwrap();

        let fetched = repo.get_active_by_id(&user.id).await.unwrap().unwrap();
        assert!(!fetched.has_registered_device());
        assert!(fetched.registered_device_name.is_none());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_active_lookups() {
        let db = test_db().await;
        let repo = db.users();

        let user = sample_user("gone@example.com");
        repo.insert(&user).await.unwrap();
        repo.soft_delete(&user.id).await.unwrap();

        assert!(repo.get_active_by_id(&user.id).await.unwrap().is_none());
        assert!(repo
            .get_active_by_email("gone@example.com")
            .await
            .unwrap()
            .is_none());
        // Still present for the audit trail
        assert!(repo.get_by_id(&user.id).await.unwrap().is_some());
        // A second delete targets nothing
        assert!(matches!(
            repo.soft_delete(&user.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
