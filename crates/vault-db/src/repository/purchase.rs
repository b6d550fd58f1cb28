//! # Purchase Repository
//!
//! Database operations for purchases - the entitlement store.
//!
//! ## Purchase Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Purchase Lifecycle                                │
//! │                                                                         │
//! │  1. PURCHASE                                                           │
//! │     └── create_completed() → Purchase { status: Completed }            │
//! │         Payment is recorded optimistically (no gateway integration),   │
//! │         so the row is born completed with a demo transaction id.       │
//! │                                                                         │
//! │  2. DOWNLOADS                                                          │
//! │     └── record_download() → download_count += 1 (guarded by cap)       │
//! │                                                                         │
//! │  3. (OPTIONAL) REFUND                                                  │
//! │     └── mark_refunded() → Purchase { status: Refunded }                │
//! │         Entitlement is revoked; the audit row stays forever.           │
//! │                                                                         │
//! │  pending/failed exist for flows where payment confirmation is          │
//! │  deferred; mark_completed()/mark_failed() drive those transitions.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Uniqueness Invariant
//! At most one COMPLETED purchase per (user, book). Enforced by the partial
//! unique index `idx_purchases_completed_once`, not by application logic:
//! two concurrent `create_completed` calls produce exactly one completed row
//! and one `DbError::UniqueViolation`, never two rows.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use vault_core::{default_max_downloads, Purchase, PurchaseStatus};

/// Column list shared by the SELECT queries below.
const PURCHASE_COLUMNS: &str = r#"
    id, user_id, book_id, price_cents, payment_method,
    status, transaction_id, download_count, max_downloads,
    created_at, updated_at
"#;

/// Repository for purchase database operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Inserts a purchase row as-is (tests, seeding, deferred-payment flows).
    pub async fn insert(&self, purchase: &Purchase) -> DbResult<()> {
        debug!(
            user_id = %purchase.user_id,
            book_id = %purchase.book_id,
            status = purchase.status.as_str(),
            "Inserting purchase"
        );

        sqlx::query(
            r#"
            INSERT INTO purchases (
                id, user_id, book_id, price_cents, payment_method,
                status, transaction_id, download_count, max_downloads,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&purchase.id)
        .bind(&purchase.user_id)
        .bind(&purchase.book_id)
        .bind(purchase.price_cents)
        .bind(&purchase.payment_method)
        .bind(purchase.status)
        .bind(&purchase.transaction_id)
        .bind(purchase.download_count)
        .bind(purchase.max_downloads)
        .bind(purchase.created_at)
        .bind(purchase.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a completed purchase.
    ///
    /// This is the purchase transaction of the storefront: payment is
    /// recorded optimistically, so the row is created directly in the
    /// `completed` status with the price snapshotted from the catalog.
    ///
    /// ## Concurrency
    /// Callers should pre-check ownership for a friendly early error, but
    /// the real guarantee is the partial unique index: the losing side of a
    /// concurrent duplicate purchase gets `DbError::UniqueViolation`, which
    /// the API layer reports as "you already own this book".
    ///
    /// ## Returns
    /// * `Ok(Purchase)` - The completed purchase row
    /// * `Err(DbError::UniqueViolation)` - A completed purchase already exists
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown user or book id
    pub async fn create_completed(
        &self,
        user_id: &str,
        book_id: &str,
        price_cents: i64,
        payment_method: &str,
        transaction_id: Option<String>,
    ) -> DbResult<Purchase> {
        let now = Utc::now();

        let purchase = Purchase {
            id: generate_purchase_id(),
            user_id: user_id.to_string(),
            book_id: book_id.to_string(),
            price_cents,
            payment_method: payment_method.to_string(),
            status: PurchaseStatus::Completed,
            transaction_id,
            download_count: 0,
            max_downloads: default_max_downloads(),
            created_at: now,
            updated_at: now,
        };

        self.insert(&purchase).await?;

        Ok(purchase)
    }

    /// Gets a purchase by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Purchase>> {
        let purchase = sqlx::query_as::<_, Purchase>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(purchase)
    }

    /// Finds the completed purchase for a (user, book) pair, if any.
    ///
    /// The partial unique index guarantees at most one row matches.
    pub async fn find_completed(&self, user_id: &str, book_id: &str) -> DbResult<Option<Purchase>> {
        let purchase = sqlx::query_as::<_, Purchase>(&format!(
            r#"
            SELECT {PURCHASE_COLUMNS} FROM purchases
            WHERE user_id = ?1 AND book_id = ?2 AND status = 'completed'
            "#
        ))
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(purchase)
    }

    /// Checks whether a user owns a book (has a completed purchase).
    pub async fn has_completed(&self, user_id: &str, book_id: &str) -> DbResult<bool> {
        Ok(self.find_completed(user_id, book_id).await?.is_some())
    }

    /// Lists a user's full purchase history, newest first (all statuses -
    /// this is the audit view).
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Purchase>> {
        let purchases = sqlx::query_as::<_, Purchase>(&format!(
            r#"
            SELECT {PURCHASE_COLUMNS} FROM purchases
            WHERE user_id = ?1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(purchases)
    }

    /// Lists a user's completed purchases, newest first (the library view).
    pub async fn list_completed_for_user(&self, user_id: &str) -> DbResult<Vec<Purchase>> {
        let purchases = sqlx::query_as::<_, Purchase>(&format!(
            r#"
            SELECT {PURCHASE_COLUMNS} FROM purchases
            WHERE user_id = ?1 AND status = 'completed'
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(purchases)
    }

    /// Consumes one download against a purchase.
    ///
    /// The guard re-checks status and cap in the UPDATE itself so a stale
    /// read can never push `download_count` past `max_downloads`.
    ///
    /// ## Returns
    /// * `Ok(Purchase)` - The refreshed row after the increment
    /// * `Err(DbError::NotFound)` - No downloadable purchase matched
    ///   (wrong id, not completed, or cap exhausted)
    pub async fn record_download(&self, id: &str) -> DbResult<Purchase> {
        debug!(id = %id, "Recording download");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE purchases SET
                download_count = download_count + 1,
                updated_at = ?2
            WHERE id = ?1
              AND status = 'completed'
              AND download_count < max_downloads
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Purchase (downloadable)", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase", id))
    }

    /// Transitions a pending purchase to completed.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No pending purchase with this id
    /// * `Err(DbError::UniqueViolation)` - Another completed purchase for the
    ///   same (user, book) pair already exists
    pub async fn mark_completed(&self, id: &str, transaction_id: Option<&str>) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE purchases SET
                status = 'completed',
                transaction_id = COALESCE(?2, transaction_id),
                updated_at = ?3
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(transaction_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Purchase (pending)", id));
        }

        Ok(())
    }

    /// Transitions a pending purchase to failed.
    pub async fn mark_failed(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE purchases SET
                status = 'failed',
                updated_at = ?2
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Purchase (pending)", id));
        }

        Ok(())
    }

    /// Refunds a completed purchase.
    ///
    /// Revokes entitlement (the row leaves the `completed` status the
    /// entitlement check looks for) without deleting the audit row. The
    /// status guard mirrors `PurchaseStatus::can_transition_to`.
    pub async fn mark_refunded(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Refunding purchase");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE purchases SET
                status = 'refunded',
                updated_at = ?2
            WHERE id = ?1 AND status = 'completed'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Purchase (completed)", id));
        }

        Ok(())
    }
}

/// Helper to generate a new purchase ID.
pub fn generate_purchase_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
// These tests double as the executable form of the system's testable
// properties: purchase/entitlement interplay, idempotence, concurrency,
// device overwrite, and refund revocation.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::book::new_book;
    use crate::repository::user::generate_user_id;
    use chrono::NaiveDate;
    use vault_core::entitlement::{authorize_download, DenialReason, DownloadDecision};
    use vault_core::User;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Inserts a user and a $9.99 book; returns (user_id, book_id).
    async fn seed_user_and_book(db: &Database) -> (String, String) {
        let now = Utc::now();
        let user = User {
            id: generate_user_id(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: "$argon2id$stub".to_string(),
            first_name: "Maya".to_string(),
            last_name: "Reyes".to_string(),
            is_active: true,
            registered_device_id: None,
            registered_device_name: None,
            created_at: now,
            updated_at: now,
        };
        db.users().insert(&user).await.unwrap();

        let book = new_book(
            "Dune",
            "Frank Herbert",
            "Sci-Fi",
            999,
            NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
        );
        db.books().insert(&book).await.unwrap();

        (user.id, book.id)
    }

    async fn buy(db: &Database, user_id: &str, book_id: &str) -> DbResult<Purchase> {
        db.purchases()
            .create_completed(user_id, book_id, 999, "credit_card", None)
            .await
    }

    #[tokio::test]
    async fn test_purchase_creates_completed_row() {
        let db = test_db().await;
        let (user_id, book_id) = seed_user_and_book(&db).await;

        let purchase = buy(&db, &user_id, &book_id).await.unwrap();

        assert_eq!(purchase.status, PurchaseStatus::Completed);
        assert_eq!(purchase.price_cents, 999);
        assert!(db.purchases().has_completed(&user_id, &book_id).await.unwrap());
    }

    /// Second purchase of the same book is a conflict, never a second row.
    #[tokio::test]
    async fn test_duplicate_purchase_conflicts() {
        let db = test_db().await;
        let (user_id, book_id) = seed_user_and_book(&db).await;

        buy(&db, &user_id, &book_id).await.unwrap();
        let err = buy(&db, &user_id, &book_id).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let history = db.purchases().list_for_user(&user_id).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    /// Concurrent purchases for the same (user, book): exactly one wins.
    #[tokio::test]
    async fn test_concurrent_purchases_yield_one_completed_row() {
        let db = test_db().await;
        let (user_id, book_id) = seed_user_and_book(&db).await;

        let (a, b) = tokio::join!(
            buy(&db, &user_id, &book_id),
            buy(&db, &user_id, &book_id)
        );

        let winners = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(winners, 1);

        let completed = db
            .purchases()
            .list_completed_for_user(&user_id)
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
    }

    /// End to end: buy at $9.99, denied for missing device, register
    /// "ios-123", permitted.
    #[tokio::test]
    async fn test_purchase_device_authorization_scenario() {
        let db = test_db().await;
        let (user_id, book_id) = seed_user_and_book(&db).await;

        buy(&db, &user_id, &book_id).await.unwrap();

        let purchase = db
            .purchases()
            .find_completed(&user_id, &book_id)
            .await
            .unwrap();
        let user = db.users().get_active_by_id(&user_id).await.unwrap().unwrap();

        let decision =
            authorize_download(purchase.as_ref(), user.registered_device_id.as_deref());
        assert_eq!(decision, DownloadDecision::Denied(DenialReason::NoDevice));

        db.users()
            .register_device(&user_id, "ios-123", "Maya's iPhone")
            .await
            .unwrap();

        let user = db.users().get_active_by_id(&user_id).await.unwrap().unwrap();
        let decision =
            authorize_download(purchase.as_ref(), user.registered_device_id.as_deref());
        assert!(decision.is_permitted());
    }

    /// Refund revokes entitlement without deleting the audit row.
    #[tokio::test]
    async fn test_refund_revokes_entitlement() {
        let db = test_db().await;
        let (user_id, book_id) = seed_user_and_book(&db).await;

        let purchase = buy(&db, &user_id, &book_id).await.unwrap();
        db.users()
            .register_device(&user_id, "ios-123", "iPhone")
            .await
            .unwrap();

        db.purchases().mark_refunded(&purchase.id).await.unwrap();

        // No completed purchase anymore → NOT_PURCHASED
        let completed = db
            .purchases()
            .find_completed(&user_id, &book_id)
            .await
            .unwrap();
        let decision = authorize_download(completed.as_ref(), Some("ios-123"));
        assert_eq!(
            decision,
            DownloadDecision::Denied(DenialReason::NotPurchased)
        );

        // Audit row survives with refunded status
        let row = db.purchases().get_by_id(&purchase.id).await.unwrap().unwrap();
        assert_eq!(row.status, PurchaseStatus::Refunded);

        // Refunding twice is an invalid transition (guard matches nothing)
        assert!(db.purchases().mark_refunded(&purchase.id).await.is_err());
    }

    /// A refund clears the slot for a future re-purchase (the partial index
    /// only covers completed rows).
    #[tokio::test]
    async fn test_repurchase_after_refund() {
        let db = test_db().await;
        let (user_id, book_id) = seed_user_and_book(&db).await;

        let first = buy(&db, &user_id, &book_id).await.unwrap();
        db.purchases().mark_refunded(&first.id).await.unwrap();

        let second = buy(&db, &user_id, &book_id).await.unwrap();
        assert_ne!(first.id, second.id);

        let history = db.purchases().list_for_user(&user_id).await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_download_cap_enforced_by_guarded_update() {
        let db = test_db().await;
        let (user_id, book_id) = seed_user_and_book(&db).await;

        let purchase = buy(&db, &user_id, &book_id).await.unwrap();

        for i in 1..=purchase.max_downloads {
            let refreshed = db.purchases().record_download(&purchase.id).await.unwrap();
            assert_eq!(refreshed.download_count, i);
        }

        // Cap reached: the guarded UPDATE matches nothing
        let err = db.purchases().record_download(&purchase.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let row = db.purchases().get_by_id(&purchase.id).await.unwrap().unwrap();
        assert_eq!(row.download_count, row.max_downloads);
    }

    #[tokio::test]
    async fn test_pending_lifecycle_transitions() {
        let db = test_db().await;
        let (user_id, book_id) = seed_user_and_book(&db).await;

        let now = Utc::now();
        let pending = Purchase {
            id: generate_purchase_id(),
            user_id: user_id.clone(),
            book_id: book_id.clone(),
            price_cents: 999,
            payment_method: "paypal".to_string(),
            status: PurchaseStatus::Pending,
            transaction_id: None,
            download_count: 0,
            max_downloads: default_max_downloads(),
            created_at: now,
            updated_at: now,
        };
        db.purchases().insert(&pending).await.unwrap();

        // Pending grants nothing
        assert!(!db.purchases().has_completed(&user_id, &book_id).await.unwrap());

        db.purchases()
            .mark_completed(&pending.id, Some("txn_123"))
            .await
            .unwrap();

        let row = db.purchases().get_by_id(&pending.id).await.unwrap().unwrap();
        assert_eq!(row.status, PurchaseStatus::Completed);
        assert_eq!(row.transaction_id.as_deref(), Some("txn_123"));

        // completed → failed is not a legal transition; the guard matches nothing
        assert!(db.purchases().mark_failed(&pending.id).await.is_err());
    }

    /// purchases reference real users and books; the FK catches typos.
    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let db = test_db().await;
        let (_user_id, book_id) = seed_user_and_book(&db).await;

        let err = buy(&db, "no-such-user", &book_id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
