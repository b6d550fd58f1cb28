//! Catalog routes: browse, search, single book, genres.
//!
//! All catalog routes are public - browsing needs no account.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use vault_core::validation::{
    clamp_pagination, validate_search_query, validate_sort_field, validate_sort_order,
};
use vault_core::Book;
use vault_db::BookSearchParams;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / Response Schemas
// =============================================================================

/// Query parameters for GET /api/books.
///
/// Prices arrive in cents; the frontend converts from its display values.
#[derive(Debug, Deserialize)]
pub struct BookListQuery {
    pub search: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub min_rating: Option<f64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// The book shape returned to clients (no file internals).
#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub id: String,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub cover_image: Option<String>,
    pub genre: String,
    pub rating: f64,
    pub rating_count: i64,
    pub published_date: String,
}

impl From<&Book> for BookResponse {
    fn from(book: &Book) -> Self {
        BookResponse {
            id: book.id.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            description: book.description.clone(),
            price_cents: book.price_cents,
            cover_image: book.cover_image.clone(),
            genre: book.genre.clone(),
            rating: (book.rating * 10.0).round() / 10.0,
            rating_count: book.rating_count,
            published_date: book.published_date.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookListResponse {
    pub books: Vec<BookResponse>,
    pub total: i64,
    pub page: u32,
    pub pages: u32,
    pub per_page: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Serialize)]
pub struct GenresResponse {
    pub genres: Vec<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/books
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookListQuery>,
) -> Result<Json<BookListResponse>, ApiError> {
    let (page, per_page) = clamp_pagination(query.page, query.limit);

    let params = BookSearchParams {
        query: match query.search.as_deref() {
            Some(q) => Some(validate_search_query(q)?),
            None => None,
        },
        author: query.author,
        genre: query.genre,
        min_price_cents: query.min_price_cents,
        max_price_cents: query.max_price_cents,
        min_rating: query.min_rating,
        sort_by: validate_sort_field(query.sort_by.as_deref().unwrap_or("title")),
        sort_order: validate_sort_order(query.sort_order.as_deref().unwrap_or("asc")),
        page,
        per_page,
    };

    let result = state.db.books().search(&params).await?;

    Ok(Json(BookListResponse {
        books: result.books.iter().map(BookResponse::from).collect(),
        total: result.total,
        page: result.page,
        pages: result.pages,
        per_page: result.per_page,
        has_next: result.has_next(),
        has_prev: result.has_prev(),
    }))
}

/// GET /api/books/{book_id}
pub async fn get_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = state
        .db
        .books()
        .get_active_by_id(&book_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Book not found".to_string()))?;

    Ok(Json(BookResponse::from(&book)))
}

/// GET /api/books/genres
pub async fn list_genres(
    State(state): State<AppState>,
) -> Result<Json<GenresResponse>, ApiError> {
    let genres = state.db.books().list_genres().await?;
    Ok(Json(GenresResponse { genres }))
}
