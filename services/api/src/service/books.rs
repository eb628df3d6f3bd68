//! services/api/src/service/books.rs
//!
//! Book CRUD scoped to an owner, plus catalog search and statistics.
//! `owner_id == None` is the anonymous partition used by requests without a
//! valid session.

use crate::error::ApiError;
use crate::service::catalog::{normalize_isbn, CatalogLookup};
use book_tracker_core::domain::{Book, BookFilter, BookStatus, BookUpdate, CatalogEntry, NewBook};
use book_tracker_core::ports::BookStore;
use book_tracker_core::progress::apply_update;
use book_tracker_core::stats::{compute_stats, ReadingStats};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Upper bound on records returned by a single listing.
pub const LIST_LIMIT: usize = 1000;

pub struct BookService {
    books: Arc<dyn BookStore>,
    catalog: Arc<CatalogLookup>,
}

fn parse_book_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::InvalidArgument("Invalid book ID".to_string()))
}

impl BookService {
    pub fn new(books: Arc<dyn BookStore>, catalog: Arc<CatalogLookup>) -> Self {
        Self { books, catalog }
    }

    pub async fn search_catalog(&self, isbn: &str) -> Result<CatalogEntry, ApiError> {
        let isbn = normalize_isbn(isbn)?;
        Ok(self.catalog.lookup(&isbn).await)
    }

    pub async fn add_book(&self, owner_id: Option<Uuid>, new_book: NewBook) -> Result<Book, ApiError> {
        new_book.validate()?;
        let book = new_book.into_book(Uuid::new_v4(), owner_id, Utc::now());
        self.books.insert_book(&book).await?;
        info!(book_id = %book.id, owner_id = ?owner_id, "Added book");
        Ok(book)
    }

    pub async fn list_books(
        &self,
        owner_id: Option<Uuid>,
        search: Option<&str>,
    ) -> Result<Vec<Book>, ApiError> {
        let filter = match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(text) => BookFilter::search(text),
            None => BookFilter::default(),
        };
        Ok(self.books.list_books(owner_id, &filter, Some(LIST_LIMIT)).await?)
    }

    pub async fn list_by_status(
        &self,
        owner_id: Option<Uuid>,
        status: BookStatus,
    ) -> Result<Vec<Book>, ApiError> {
        Ok(self
            .books
            .list_books(owner_id, &BookFilter::status(status), Some(LIST_LIMIT))
            .await?)
    }

    pub async fn get_book(&self, owner_id: Option<Uuid>, book_id: &str) -> Result<Book, ApiError> {
        let book_id = parse_book_id(book_id)?;
        Ok(self.books.get_book(owner_id, book_id).await?)
    }

    pub async fn update_book(
        &self,
        owner_id: Option<Uuid>,
        book_id: &str,
        update: BookUpdate,
    ) -> Result<Book, ApiError> {
        let book_id = parse_book_id(book_id)?;
        update.validate()?;

        let mut book = self.books.get_book(owner_id, book_id).await?;
        apply_update(&mut book, &update, Utc::now());
        self.books.save_book(&book).await?;
        debug!(book_id = %book.id, status = %book.status, progress = book.progress, "Updated book");
        Ok(book)
    }

    pub async fn delete_book(&self, owner_id: Option<Uuid>, book_id: &str) -> Result<(), ApiError> {
        let book_id = parse_book_id(book_id)?;
        self.books.delete_book(owner_id, book_id).await?;
        info!(book_id = %book_id, "Deleted book");
        Ok(())
    }

    pub async fn reading_stats(&self, owner_id: Option<Uuid>) -> Result<ReadingStats, ApiError> {
        let books = self
            .books
            .list_books(owner_id, &BookFilter::default(), None)
            .await?;
        Ok(compute_stats(&books))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use axum::http::StatusCode;
    use std::time::Duration;

    fn service() -> BookService {
        let catalog = Arc::new(CatalogLookup::new(Vec::new(), Duration::from_secs(1)));
        BookService::new(Arc::new(MemoryStore::new()), catalog)
    }

    fn harry_potter() -> NewBook {
        NewBook {
            isbn: "9780439708180".to_string(),
            title: "Harry Potter and the Sorcerer's Stone".to_string(),
            author: "J.K. Rowling".to_string(),
            total_pages: 309,
            current_page: Some(0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn reading_scenario() {
        let books = service();
        let book = books.add_book(None, harry_potter()).await.unwrap();
        assert_eq!(book.progress, 0.0);
        let id = book.id.to_string();

        let book = books
            .update_book(
                None,
                &id,
                BookUpdate {
                    current_page: Some(50),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!((book.progress - 16.181229773462782).abs() < 1e-9);

        let book = books
            .update_book(
                None,
                &id,
                BookUpdate {
                    status: Some(BookStatus::Read),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(book.current_page, 309);
        assert_eq!(book.progress, 100.0);
        assert!(book.date_finished.is_some());

        // The stored copy matches what was returned.
        assert_eq!(books.get_book(None, &id).await.unwrap(), book);
    }

    #[tokio::test]
    async fn ownership_isolation() {
        let books = service();
        let alice = Some(Uuid::new_v4());
        let bob = Some(Uuid::new_v4());
        let book = books.add_book(alice, harry_potter()).await.unwrap();
        let id = book.id.to_string();

        for owner in [bob, None] {
            assert!(books.list_books(owner, None).await.unwrap().is_empty());
            assert_eq!(
                books.get_book(owner, &id).await.unwrap_err().status_code(),
                StatusCode::NOT_FOUND
            );
            assert_eq!(
                books
                    .update_book(owner, &id, BookUpdate::default())
                    .await
                    .unwrap_err()
                    .status_code(),
                StatusCode::NOT_FOUND
            );
            assert_eq!(
                books.delete_book(owner, &id).await.unwrap_err().status_code(),
                StatusCode::NOT_FOUND
            );
            let stats = books.reading_stats(owner).await.unwrap();
            assert_eq!(stats.total_books, 0);
        }
        assert_eq!(books.list_books(alice, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_missing_book_is_not_found_every_time() {
        let books = service();
        let id = Uuid::new_v4().to_string();
        for _ in 0..2 {
            assert_eq!(
                books.delete_book(None, &id).await.unwrap_err().status_code(),
                StatusCode::NOT_FOUND
            );
        }

        let book = books.add_book(None, harry_potter()).await.unwrap();
        let id = book.id.to_string();
        books.delete_book(None, &id).await.unwrap();
        assert_eq!(
            books.delete_book(None, &id).await.unwrap_err().status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn malformed_ids_are_invalid_arguments() {
        let books = service();
        for result in [
            books.get_book(None, "not-a-uuid").await.map(|_| ()),
            books.delete_book(None, "123").await,
            books
                .update_book(None, "", BookUpdate::default())
                .await
                .map(|_| ()),
        ] {
            assert_eq!(result.unwrap_err().status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn search_and_status_listing() {
        let books = service();
        books.add_book(None, harry_potter()).await.unwrap();
        books
            .add_book(
                None,
                NewBook {
                    isbn: "9780547928227".to_string(),
                    title: "The Hobbit".to_string(),
                    author: "J.R.R. Tolkien".to_string(),
                    total_pages: 300,
                    status: Some(BookStatus::CurrentlyReading),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let found = books.list_books(None, Some("HOBBIT")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].author, "J.R.R. Tolkien");
        assert_eq!(books.list_books(None, Some("  ")).await.unwrap().len(), 2);
        assert_eq!(books.list_books(None, Some("tolkien")).await.unwrap().len(), 1);

        let reading = books
            .list_by_status(None, BookStatus::CurrentlyReading)
            .await
            .unwrap();
        assert_eq!(reading.len(), 1);
        assert!(books
            .list_by_status(None, BookStatus::Read)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn rejects_invalid_rating() {
        let books = service();
        let book = books.add_book(None, harry_potter()).await.unwrap();
        let err = books
            .update_book(
                None,
                &book.id.to_string(),
                BookUpdate {
                    rating: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn catalog_search_falls_back_to_placeholder() {
        let books = service();
        let entry = books.search_catalog("978-1-234-56789-7").await.unwrap();
        assert_eq!(entry, CatalogEntry::placeholder("9781234567897"));
        assert!(books.search_catalog("not an isbn").await.is_err());
    }
}
