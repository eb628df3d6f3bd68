//! services/api/src/web/books.rs
//!
//! Book endpoints: catalog search, scoped CRUD and reading statistics.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use book_tracker_core::domain::{Book, BookStatus, BookUpdate, CatalogEntry, NewBook};
use book_tracker_core::stats::ReadingStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiError, AppJson};
use crate::web::auth::MessageResponse;
use crate::web::state::{AppState, CurrentUser};

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: Uuid,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub cover_image: Option<String>,
    pub total_pages: u32,
    pub current_page: u32,
    /// One of `want_to_read`, `currently_reading`, `read`.
    pub status: String,
    pub progress: f64,
    pub date_added: DateTime<Utc>,
    pub date_finished: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub rating: Option<u8>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            isbn: book.isbn,
            title: book.title,
            author: book.author,
            cover_image: book.cover_image,
            total_pages: book.total_pages,
            current_page: book.current_page,
            status: book.status.to_string(),
            progress: book.progress,
            date_added: book.date_added,
            date_finished: book.date_finished,
            notes: book.notes,
            rating: book.rating,
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddBookRequest {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub cover_image: Option<String>,
    pub total_pages: u32,
    pub current_page: Option<u32>,
    pub status: Option<String>,
    pub progress: Option<f64>,
    pub date_finished: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub rating: Option<u8>,
}

impl TryFrom<AddBookRequest> for NewBook {
    type Error = ApiError;

    fn try_from(req: AddBookRequest) -> Result<Self, Self::Error> {
        let status = req.status.as_deref().map(str::parse::<BookStatus>).transpose()?;
        Ok(NewBook {
            isbn: req.isbn.trim().to_string(),
            title: req.title.trim().to_string(),
            author: req.author.trim().to_string(),
            cover_image: req.cover_image,
            total_pages: req.total_pages,
            current_page: req.current_page,
            status,
            progress: req.progress,
            date_finished: req.date_finished,
            notes: req.notes,
            rating: req.rating,
        })
    }
}

/// Partial update; absent fields are left unchanged.
#[derive(Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookRequest {
    pub current_page: Option<u32>,
    pub status: Option<String>,
    pub date_finished: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub rating: Option<u8>,
}

impl TryFrom<UpdateBookRequest> for BookUpdate {
    type Error = ApiError;

    fn try_from(req: UpdateBookRequest) -> Result<Self, Self::Error> {
        let status = req.status.as_deref().map(str::parse::<BookStatus>).transpose()?;
        Ok(BookUpdate {
            current_page: req.current_page,
            status,
            date_finished: req.date_finished,
            notes: req.notes,
            rating: req.rating,
        })
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub cover_image: Option<String>,
    pub total_pages: u32,
}

impl From<CatalogEntry> for CatalogResponse {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            isbn: entry.isbn,
            title: entry.title,
            author: entry.author,
            cover_image: entry.cover_image,
            total_pages: entry.total_pages,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub total_books: usize,
    pub want_to_read: usize,
    pub currently_reading: usize,
    pub read: usize,
    pub total_pages_read: u64,
    pub average_progress: f64,
    pub books_by_month: BTreeMap<String, usize>,
}

impl From<ReadingStats> for StatsResponse {
    fn from(stats: ReadingStats) -> Self {
        Self {
            total_books: stats.total_books,
            want_to_read: stats.want_to_read,
            currently_reading: stats.currently_reading,
            read: stats.read,
            total_pages_read: stats.total_pages_read,
            average_progress: stats.average_progress,
            books_by_month: stats.books_by_month,
        }
    }
}

#[derive(Deserialize, IntoParams)]
pub struct ListBooksQuery {
    /// Case-insensitive match on title, author or ISBN.
    pub search: Option<String>,
}

fn to_responses(books: Vec<Book>) -> Json<Vec<BookResponse>> {
    Json(books.into_iter().map(BookResponse::from).collect())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Look up an ISBN in the external catalogs.
///
/// Never returns 404: when no catalog knows the ISBN a generic placeholder is returned.
#[utoipa::path(
    get,
    path = "/books/search/{isbn}",
    params(("isbn" = String, Path, description = "ISBN-10 or ISBN-13, hyphens allowed.")),
    responses(
        (status = 200, description = "Catalog entry or placeholder", body = CatalogResponse),
        (status = 400, description = "Malformed ISBN")
    )
)]
pub async fn search_isbn_handler(
    State(state): State<Arc<AppState>>,
    Path(isbn): Path<String>,
) -> Result<Json<CatalogResponse>, ApiError> {
    let entry = state.books.search_catalog(&isbn).await?;
    Ok(Json(entry.into()))
}

/// Add a book to the caller's shelf.
#[utoipa::path(
    post,
    path = "/books",
    request_body = AddBookRequest,
    responses(
        (status = 200, description = "Book added", body = BookResponse),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn add_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    AppJson(req): AppJson<AddBookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = state.books.add_book(current.owner_id(), req.try_into()?).await?;
    Ok(Json(book.into()))
}

/// List the caller's books, newest first, optionally filtered by search text.
#[utoipa::path(
    get,
    path = "/books",
    params(ListBooksQuery),
    responses((status = 200, description = "Books", body = [BookResponse]))
)]
pub async fn list_books_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListBooksQuery>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = state
        .books
        .list_books(current.owner_id(), query.search.as_deref())
        .await?;
    Ok(to_responses(books))
}

/// List the caller's books with the given status.
#[utoipa::path(
    get,
    path = "/books/status/{status}",
    params(("status" = String, Path, description = "want_to_read, currently_reading or read")),
    responses(
        (status = 200, description = "Books", body = [BookResponse]),
        (status = 400, description = "Unknown status")
    )
)]
pub async fn list_by_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(status): Path<String>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let status = status.parse::<BookStatus>()?;
    let books = state.books.list_by_status(current.owner_id(), status).await?;
    Ok(to_responses(books))
}

#[utoipa::path(
    get,
    path = "/books/{id}",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book", body = BookResponse),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = state.books.get_book(current.owner_id(), &id).await?;
    Ok(Json(book.into()))
}

/// Update reading progress, status, finish date, notes or rating.
#[utoipa::path(
    put,
    path = "/books/{id}",
    params(("id" = String, Path, description = "Book id")),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "Updated book", body = BookResponse),
        (status = 400, description = "Malformed id or payload"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateBookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = state
        .books
        .update_book(current.owner_id(), &id, req.try_into()?)
        .await?;
    Ok(Json(book.into()))
}

#[utoipa::path(
    delete,
    path = "/books/{id}",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.books.delete_book(current.owner_id(), &id).await?;
    Ok(Json(MessageResponse {
        message: "Book deleted successfully".to_string(),
    }))
}

/// Aggregate statistics over the caller's books.
#[utoipa::path(
    get,
    path = "/stats",
    responses((status = 200, description = "Reading statistics", body = StatsResponse))
)]
pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.books.reading_stats(current.owner_id()).await?;
    Ok(Json(stats.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_payload_uses_camel_case() {
        let req: UpdateBookRequest = serde_json::from_str(
            r#"{"currentPage": 50, "status": "read", "dateFinished": "2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        let update = BookUpdate::try_from(req).unwrap();
        assert_eq!(update.current_page, Some(50));
        assert_eq!(update.status, Some(BookStatus::Read));
        assert!(update.date_finished.is_some());
        assert!(update.notes.is_none());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let req = UpdateBookRequest {
            status: Some("finished".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            BookUpdate::try_from(req),
            Err(ApiError::InvalidArgument(_))
        ));
    }

    #[test]
    fn book_serializes_wire_names() {
        let book = NewBook {
            isbn: "9780439708180".to_string(),
            title: "HP".to_string(),
            author: "JKR".to_string(),
            total_pages: 309,
            ..Default::default()
        }
        .into_book(Uuid::new_v4(), None, Utc::now());
        let json = serde_json::to_value(BookResponse::from(book)).unwrap();
        assert_eq!(json["totalPages"], 309);
        assert_eq!(json["currentPage"], 0);
        assert_eq!(json["status"], "want_to_read");
        assert!(json["dateFinished"].is_null());
        assert!(json.get("coverImage").is_some());
    }
}
