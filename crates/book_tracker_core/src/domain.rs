//! crates/book_tracker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Users and Sessions
//=========================================================================================

/// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data.
// Federated-only accounts have no password hash.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub hashed_password: Option<String>,
}

/// Profile data returned by the federated identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct FederatedIdentity {
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

// Represents a browser login session (auth cookie / bearer token)
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AuthSession {
    /// A session is valid strictly before its expiry instant.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

//=========================================================================================
// Books
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BookStatus {
    #[default]
    WantToRead,
    CurrentlyReading,
    Read,
}

impl BookStatus {
    pub const ALL: [BookStatus; 3] = [
        BookStatus::WantToRead,
        BookStatus::CurrentlyReading,
        BookStatus::Read,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::WantToRead => "want_to_read",
            BookStatus::CurrentlyReading => "currently_reading",
            BookStatus::Read => "read",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

/// A book on a user's shelf. `owner_id` is `None` for the anonymous partition
/// and never changes after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub cover_image: Option<String>,
    pub total_pages: u32,
    pub current_page: u32,
    pub status: BookStatus,
    pub progress: f64,
    pub date_added: DateTime<Utc>,
    pub date_finished: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub rating: Option<u8>,
}

/// The fields a client supplies when adding a book.
#[derive(Debug, Clone, Default)]
pub struct NewBook {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub cover_image: Option<String>,
    pub total_pages: u32,
    pub current_page: Option<u32>,
    pub status: Option<BookStatus>,
    pub progress: Option<f64>,
    pub date_finished: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub rating: Option<u8>,
}

impl NewBook {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("isbn", &self.isbn),
            ("title", &self.title),
            ("author", &self.author),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::EmptyField(field));
            }
        }
        if let Some(progress) = self.progress {
            if !(0.0..=100.0).contains(&progress) {
                return Err(ValidationError::ProgressOutOfRange(progress));
            }
        }
        validate_pages("totalPages", Some(self.total_pages))?;
        validate_pages("currentPage", self.current_page)?;
        validate_rating(self.rating)
    }

    /// Builds the stored record. No derived fields are computed here beyond
    /// the defaults; progress only moves on a later page update.
    pub fn into_book(self, id: Uuid, owner_id: Option<Uuid>, now: DateTime<Utc>) -> Book {
        Book {
            id,
            owner_id,
            isbn: self.isbn,
            title: self.title,
            author: self.author,
            cover_image: self.cover_image,
            total_pages: self.total_pages,
            current_page: self.current_page.unwrap_or(0),
            status: self.status.unwrap_or_default(),
            progress: self.progress.unwrap_or(0.0),
            date_added: now,
            date_finished: self.date_finished,
            notes: self.notes,
            rating: self.rating,
        }
    }
}

/// A partial update. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookUpdate {
    pub current_page: Option<u32>,
    pub status: Option<BookStatus>,
    pub date_finished: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub rating: Option<u8>,
}

impl BookUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_pages("currentPage", self.current_page)?;
        validate_rating(self.rating)
    }
}

/// Upper bound for page counts and page numbers; storage uses signed 32-bit columns.
pub const MAX_PAGES: u32 = i32::MAX as u32;

fn validate_pages(field: &'static str, pages: Option<u32>) -> Result<(), ValidationError> {
    match pages {
        Some(p) if p > MAX_PAGES => Err(ValidationError::PageOutOfRange(field, p)),
        _ => Ok(()),
    }
}

fn validate_rating(rating: Option<u8>) -> Result<(), ValidationError> {
    match rating {
        Some(r) if !(1..=5).contains(&r) => Err(ValidationError::RatingOutOfRange(r)),
        _ => Ok(()),
    }
}

/// Narrows a scoped listing. Both criteria are optional and combine with AND.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    pub search: Option<String>,
    pub status: Option<BookStatus>,
}

impl BookFilter {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            status: None,
        }
    }

    pub fn status(status: BookStatus) -> Self {
        Self {
            search: None,
            status: Some(status),
        }
    }

    /// Case-insensitive substring match on title, author or ISBN.
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(status) = self.status {
            if book.status != status {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                [&book.title, &book.author, &book.isbn]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }
}

//=========================================================================================
// Catalog
//=========================================================================================

/// Descriptive metadata for an ISBN, as returned by a catalog provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub cover_image: Option<String>,
    pub total_pages: u32,
}

impl CatalogEntry {
    pub const PLACEHOLDER_PAGES: u32 = 250;

    /// The generic record returned when no provider knows the ISBN.
    pub fn placeholder(isbn: &str) -> Self {
        Self {
            isbn: isbn.to_string(),
            title: format!("Book - {}", isbn),
            author: "Unknown Author".to_string(),
            cover_image: Some(format!(
                "https://covers.openlibrary.org/b/isbn/{}-L.jpg",
                isbn
            )),
            total_pages: Self::PLACEHOLDER_PAGES,
        }
    }
}

//=========================================================================================
// Validation
//=========================================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),
    #[error("Unknown status '{0}', expected one of want_to_read, currently_reading, read")]
    UnknownStatus(String),
    #[error("Rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(u8),
    #[error("Progress must be between 0 and 100, got {0}")]
    ProgressOutOfRange(f64),
    #[error("Field '{0}' must be at most {max}, got {1}", max = MAX_PAGES)]
    PageOutOfRange(&'static str, u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_book() -> Book {
        NewBook {
            isbn: "9780439708180".to_string(),
            title: "Harry Potter and the Sorcerer's Stone".to_string(),
            author: "J.K. Rowling".to_string(),
            total_pages: 309,
            ..Default::default()
        }
        .into_book(Uuid::new_v4(), None, Utc::now())
    }

    #[test]
    fn status_round_trips_through_wire_names() {
        for status in BookStatus::ALL {
            assert_eq!(status.as_str().parse::<BookStatus>().unwrap(), status);
        }
        assert_eq!(
            "finished".parse::<BookStatus>(),
            Err(ValidationError::UnknownStatus("finished".to_string()))
        );
    }

    #[test]
    fn new_book_gets_defaults() {
        let book = sample_book();
        assert_eq!(book.current_page, 0);
        assert_eq!(book.progress, 0.0);
        assert_eq!(book.status, BookStatus::WantToRead);
        assert!(book.date_finished.is_none());
    }

    #[test]
    fn new_book_rejects_blank_title() {
        let new_book = NewBook {
            isbn: "123".to_string(),
            title: "   ".to_string(),
            author: "Someone".to_string(),
            ..Default::default()
        };
        assert_eq!(new_book.validate(), Err(ValidationError::EmptyField("title")));
    }

    #[test]
    fn rating_must_be_in_range() {
        let update = BookUpdate {
            rating: Some(6),
            ..Default::default()
        };
        assert_eq!(update.validate(), Err(ValidationError::RatingOutOfRange(6)));
        let update = BookUpdate {
            rating: Some(5),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn pages_must_fit_storage() {
        let new_book = NewBook {
            isbn: "1".to_string(),
            title: "t".to_string(),
            author: "a".to_string(),
            total_pages: 3_000_000_000,
            ..Default::default()
        };
        assert_eq!(
            new_book.validate(),
            Err(ValidationError::PageOutOfRange("totalPages", 3_000_000_000))
        );
        let new_book = NewBook {
            total_pages: MAX_PAGES,
            current_page: Some(MAX_PAGES + 1),
            ..new_book
        };
        assert_eq!(
            new_book.validate(),
            Err(ValidationError::PageOutOfRange("currentPage", MAX_PAGES + 1))
        );

        let update = BookUpdate {
            current_page: Some(3_000_000_000),
            ..Default::default()
        };
        assert!(matches!(update.validate(), Err(ValidationError::PageOutOfRange(..))));
        let update = BookUpdate {
            current_page: Some(MAX_PAGES),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn filter_matches_case_insensitively() {
        let book = sample_book();
        assert!(BookFilter::search("rowling").matches(&book));
        assert!(BookFilter::search("SORCERER").matches(&book));
        assert!(BookFilter::search("0439").matches(&book));
        assert!(!BookFilter::search("tolkien").matches(&book));
        assert!(BookFilter::search("  ").matches(&book));
        assert!(!BookFilter::status(BookStatus::Read).matches(&book));
    }

    #[test]
    fn session_expires_at_boundary() {
        let now = Utc::now();
        let session = AuthSession {
            token: "t".to_string(),
            user_id: Uuid::new_v4(),
            expires_at: now,
            created_at: now - chrono::Duration::days(7),
        };
        assert!(session.is_valid_at(now - chrono::Duration::seconds(1)));
        assert!(!session.is_valid_at(now));
    }

    #[test]
    fn placeholder_is_deterministic() {
        let entry = CatalogEntry::placeholder("1234567890");
        assert_eq!(entry.title, "Book - 1234567890");
        assert_eq!(entry.author, "Unknown Author");
        assert_eq!(entry.total_pages, 250);
        assert_eq!(entry, CatalogEntry::placeholder("1234567890"));
    }
}
