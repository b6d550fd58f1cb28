//! # Book Repository
//!
//! Database operations for the catalog.
//!
//! ## Catalog Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Catalog Search Works                             │
//! │                                                                         │
//! │  GET /api/books?search=dune&genre=Sci-Fi&sort_by=price&page=2          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BookSearchParams { query, genre, price/rating bounds, sort, page }    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Dynamic WHERE built with sqlx::QueryBuilder                           │
//! │    title/author/description LIKE '%dune%'                              │
//! │    AND genre = 'Sci-Fi' AND is_active = 1                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Two queries: COUNT(*) for the pagination envelope, then the page      │
//! │                                                                         │
//! │  Sort keys come from a closed allowlist (vault-core validation), so    │
//! │  pushing them into the SQL text is safe. Everything user-typed goes    │
//! │  through push_bind.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use vault_core::Book;

/// Column list shared by the SELECT queries below.
const BOOK_COLUMNS: &str = r#"
    id, title, author, description, price_cents, cover_image, genre,
    rating, rating_count, published_date, file_path, file_size,
    is_active, created_at, updated_at
"#;

// =============================================================================
// Search Parameters
// =============================================================================

/// Filters, sort, and pagination for a catalog search.
///
/// All fields arrive pre-validated (sort keys from the allowlist, pagination
/// clamped); this struct is the storage-layer contract, not the HTTP one.
#[derive(Debug, Clone, Default)]
pub struct BookSearchParams {
    /// Free-text query matched against title, author, and description.
    pub query: Option<String>,
    /// Author substring filter.
    pub author: Option<String>,
    /// Exact genre filter.
    pub genre: Option<String>,
    /// Inclusive price bounds in cents.
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    /// Minimum average rating.
    pub min_rating: Option<f64>,
    /// Sort key, one of vault_core::validation::SORT_FIELDS.
    pub sort_by: &'static str,
    /// "asc" or "desc".
    pub sort_order: &'static str,
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
}

/// One page of catalog results plus the pagination envelope.
#[derive(Debug, Clone)]
pub struct BookPage {
    pub books: Vec<Book>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub pages: u32,
}

impl BookPage {
    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for book database operations.
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    /// Creates a new BookRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookRepository { pool }
    }

    /// Gets a book by its ID, regardless of active flag.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Gets an active (purchasable) book by its ID.
    ///
    /// Deactivated books are invisible to the storefront; from the purchase
    /// flow's perspective an inactive book is simply not found.
    pub async fn get_active_by_id(&self, id: &str) -> DbResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1 AND is_active = 1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Searches the catalog.
    ///
    /// Runs a COUNT query and a page query with the same filters; the two
    /// run back-to-back on the pool, not inside one transaction, which is
    /// fine for a browse view.
    pub async fn search(&self, params: &BookSearchParams) -> DbResult<BookPage> {
        debug!(?params, "Searching catalog");

        let total: i64 = {
            let mut qb: QueryBuilder<Sqlite> =
                QueryBuilder::new("SELECT COUNT(*) FROM books WHERE is_active = 1");
            push_filters(&mut qb, params);
            qb.build_query_scalar().fetch_one(&self.pool).await?
        };

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {BOOK_COLUMNS} FROM books WHERE is_active = 1"));
        push_filters(&mut qb, params);

        // Sort key and order come from the validation allowlist, never from
        // raw client input, so interpolating them is safe.
        qb.push(format!(" ORDER BY {} {}", params.sort_by, params.sort_order));

        let offset = (params.page.saturating_sub(1)) as i64 * params.per_page as i64;
        qb.push(" LIMIT ");
        qb.push_bind(params.per_page as i64);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let books = qb.build_query_as::<Book>().fetch_all(&self.pool).await?;

        debug!(count = books.len(), total, "Search returned books");

        let pages = if total == 0 {
            0
        } else {
            ((total as u64).div_ceil(params.per_page as u64)) as u32
        };

        Ok(BookPage {
            books,
            total,
            page: params.page,
            per_page: params.per_page,
            pages,
        })
    }

    /// Lists the distinct genres of active books, sorted.
    pub async fn list_genres(&self) -> DbResult<Vec<String>> {
        let genres: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT genre FROM books WHERE is_active = 1 ORDER BY genre",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(genres)
    }

    /// Inserts a new book (catalog management / seeding).
    pub async fn insert(&self, book: &Book) -> DbResult<()> {
        debug!(title = %book.title, "Inserting book");

        sqlx::query(
            r#"
            INSERT INTO books (
                id, title, author, description, price_cents, cover_image,
                genre, rating, rating_count, published_date,
                file_path, file_size, is_active, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15
            )
            "#,
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.description)
        .bind(book.price_cents)
        .bind(&book.cover_image)
        .bind(&book.genre)
        .bind(book.rating)
        .bind(book.rating_count)
        .bind(book.published_date)
        .bind(&book.file_path)
        .bind(book.file_size)
        .bind(book.is_active)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts active books (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Appends the shared WHERE filters to a query builder.
///
/// Used by both the COUNT and page queries so they cannot drift apart.
fn push_filters(qb: &mut QueryBuilder<Sqlite>, params: &BookSearchParams) {
    if let Some(query) = params.query.as_deref().filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", query);
        qb.push(" AND (title LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR author LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR description LIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }

    if let Some(author) = params.author.as_deref().filter(|a| !a.is_empty()) {
        qb.push(" AND author LIKE ");
        qb.push_bind(format!("%{}%", author));
    }

    if let Some(genre) = params.genre.as_deref().filter(|g| !g.is_empty()) {
        qb.push(" AND genre = ");
        qb.push_bind(genre.to_string());
    }

    if let Some(min) = params.min_price_cents {
        qb.push(" AND price_cents >= ");
        qb.push_bind(min);
    }

    if let Some(max) = params.max_price_cents {
        qb.push(" AND price_cents <= ");
        qb.push_bind(max);
    }

    if let Some(min_rating) = params.min_rating {
        qb.push(" AND rating >= ");
        qb.push_bind(min_rating);
    }
}

/// Helper to generate a new book ID.
pub fn generate_book_id() -> String {
    Uuid::new_v4().to_string()
}

/// Builds a Book with catalog defaults (seeding and tests).
pub fn new_book(
    title: &str,
    author: &str,
    genre: &str,
    price_cents: i64,
    published_date: chrono::NaiveDate,
) -> Book {
    let now = Utc::now();
    Book {
        id: generate_book_id(),
        title: title.to_string(),
        author: author.to_string(),
        description: None,
        price_cents,
        cover_image: None,
        genre: genre.to_string(),
        rating: 0.0,
        rating_count: 0,
        published_date,
        file_path: None,
        file_size: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use vault_core::validation::{validate_sort_field, validate_sort_order};

    async fn seeded_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.books();

        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();

        let mut dune = new_book("Dune", "Frank Herbert", "Sci-Fi", 1299, d(1965, 8, 1));
        dune.description = Some("Spice, sandworms, and statecraft".to_string());
        dune.rating = 4.8;
        repo.insert(&dune).await.unwrap();

        let hobbit = new_book("The Hobbit", "J.R.R. Tolkien", "Fantasy", 999, d(1937, 9, 21));
        repo.insert(&hobbit).await.unwrap();

        let mut neuromancer =
            new_book("Neuromancer", "William Gibson", "Sci-Fi", 1199, d(1984, 7, 1));
        neuromancer.rating = 4.2;
        repo.insert(&neuromancer).await.unwrap();

        let mut retired = new_book("Out of Print", "Nobody", "Sci-Fi", 199, d(1990, 1, 1));
        retired.is_active = false;
        repo.insert(&retired).await.unwrap();

        db
    }

    fn params() -> BookSearchParams {
        BookSearchParams {
            sort_by: validate_sort_field("title"),
            sort_order: validate_sort_order("asc"),
            page: 1,
            per_page: 20,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_search_excludes_inactive() {
        let db = seeded_db().await;

        let page = db.books().search(&params()).await.unwrap();
        assert_eq!(page.total, 3);
        assert!(page.books.iter().all(|b| b.is_active));
    }

    #[tokio::test]
    async fn test_text_search_matches_description() {
        let db = seeded_db().await;

        let mut p = params();
        p.query = Some("sandworms".to_string());
        let page = db.books().search(&p).await.unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.books[0].title, "Dune");
    }

    #[tokio::test]
    async fn test_genre_and_price_filters() {
        let db = seeded_db().await;

        let mut p = params();
        p.genre = Some("Sci-Fi".to_string());
        p.max_price_cents = Some(1200);
        let page = db.books().search(&p).await.unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.books[0].title, "Neuromancer");
    }

    #[tokio::test]
    async fn test_sort_by_price_desc() {
        let db = seeded_db().await;

        let mut p = params();
        p.sort_by = validate_sort_field("price");
        p.sort_order = validate_sort_order("desc");
        let page = db.books().search(&p).await.unwrap();

        let prices: Vec<i64> = page.books.iter().map(|b| b.price_cents).collect();
        assert_eq!(prices, vec![1299, 1199, 999]);
    }

    #[tokio::test]
    async fn test_pagination_envelope() {
        let db = seeded_db().await;

        let mut p = params();
        p.per_page = 2;
        let first = db.books().search(&p).await.unwrap();

        assert_eq!(first.total, 3);
        assert_eq!(first.pages, 2);
        assert_eq!(first.books.len(), 2);
        assert!(first.has_next());
        assert!(!first.has_prev());

        p.page = 2;
        let second = db.books().search(&p).await.unwrap();
        assert_eq!(second.books.len(), 1);
        assert!(!second.has_next());
        assert!(second.has_prev());
    }

    #[tokio::test]
    async fn test_list_genres() {
        let db = seeded_db().await;

        // Deduplicated and sorted; the inactive book adds no new genre
        let genres = db.books().list_genres().await.unwrap();
        assert_eq!(genres, vec!["Fantasy".to_string(), "Sci-Fi".to_string()]);
    }

    #[tokio::test]
    async fn test_inactive_book_invisible_to_storefront() {
        let db = seeded_db().await;
        let repo = db.books();

        let mut p = params();
        p.query = Some("Out of Print".to_string());
        let page = repo.search(&p).await.unwrap();
        assert_eq!(page.total, 0);
    }
}
