//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the persistence ports from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use book_tracker_core::domain::{AuthSession, Book, BookFilter, BookStatus, User, UserCredentials};
use book_tracker_core::ports::{BookStore, PortError, PortResult, SessionStore, UserStore};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `UserStore`, `SessionStore` and
/// `BookStore` ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const USER_COLUMNS: &str = "id, email, name, picture, hashed_password, created_at";
const SESSION_COLUMNS: &str = "token, user_id, expires_at, created_at";
const BOOK_COLUMNS: &str = "id, owner_id, isbn, title, author, cover_image, total_pages, \
     current_page, status, progress, date_added, date_finished, notes, rating";

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    name: String,
    picture: Option<String>,
    hashed_password: Option<String>,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_credentials(self) -> UserCredentials {
        UserCredentials {
            user: User {
                id: self.id,
                email: self.email,
                name: self.name,
                picture: self.picture,
                created_at: self.created_at,
            },
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    token: String,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}
impl SessionRecord {
    fn to_domain(self) -> AuthSession {
        AuthSession {
            token: self.token,
            user_id: self.user_id,
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct BookRecord {
    id: Uuid,
    owner_id: Option<Uuid>,
    isbn: String,
    title: String,
    author: String,
    cover_image: Option<String>,
    total_pages: i32,
    current_page: i32,
    status: String,
    progress: f64,
    date_added: DateTime<Utc>,
    date_finished: Option<DateTime<Utc>>,
    notes: Option<String>,
    rating: Option<i16>,
}
impl BookRecord {
    fn to_domain(self) -> PortResult<Book> {
        let id = self.id;
        let corrupt =
            |field: &str| PortError::Unexpected(format!("Book {} has an invalid {}", id, field));
        let status = self
            .status
            .parse::<BookStatus>()
            .map_err(|_| corrupt("status"))?;
        let total_pages = u32::try_from(self.total_pages).map_err(|_| corrupt("total_pages"))?;
        let current_page =
            u32::try_from(self.current_page).map_err(|_| corrupt("current_page"))?;
        let rating = self
            .rating
            .map(u8::try_from)
            .transpose()
            .map_err(|_| corrupt("rating"))?;

        Ok(Book {
            id,
            owner_id: self.owner_id,
            isbn: self.isbn,
            title: self.title,
            author: self.author,
            cover_image: self.cover_image,
            total_pages,
            current_page,
            status,
            progress: self.progress,
            date_added: self.date_added,
            date_finished: self.date_finished,
            notes: self.notes,
            rating,
        })
    }
}

fn pages(value: u32) -> PortResult<i32> {
    i32::try_from(value).map_err(|_| PortError::Unexpected(format!("Page count {} is too large", value)))
}

//=========================================================================================
// Persistence Port Implementations
//=========================================================================================

#[async_trait]
impl UserStore for DbAdapter {
    async fn create_user(&self, user: &User, hashed_password: Option<&str>) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO users (id, email, name, picture, hashed_password, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.picture)
        .bind(hashed_password)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return PortError::Conflict("Email already registered".to_string());
                }
            }
            unexpected(e)
        })?;
        Ok(())
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_credentials().user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;
        Ok(record.to_credentials())
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        name: &str,
        picture: Option<&str>,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET name = $2, picture = $3 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(name)
        .bind(picture)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_credentials().user)
    }
}

#[async_trait]
impl SessionStore for DbAdapter {
    async fn create_auth_session(&self, session: &AuthSession) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, expires_at, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.token)
        .bind(session.user_id)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn get_auth_session(&self, token: &str) -> PortResult<Option<AuthSession>> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {} FROM sessions WHERE token = $1",
            SESSION_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(SessionRecord::to_domain))
    }

    async fn delete_auth_session(&self, token: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

#[async_trait]
impl BookStore for DbAdapter {
    async fn insert_book(&self, book: &Book) -> PortResult<()> {
        sqlx::query(&format!(
            "INSERT INTO books ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
            BOOK_COLUMNS
        ))
        .bind(book.id)
        .bind(book.owner_id)
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.cover_image)
        .bind(pages(book.total_pages)?)
        .bind(pages(book.current_page)?)
        .bind(book.status.as_str())
        .bind(book.progress)
        .bind(book.date_added)
        .bind(book.date_finished)
        .bind(&book.notes)
        .bind(book.rating.map(i16::from))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn get_book(&self, owner_id: Option<Uuid>, book_id: Uuid) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {} FROM books WHERE id = $1 AND owner_id IS NOT DISTINCT FROM $2",
            BOOK_COLUMNS
        ))
        .bind(book_id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Book {} not found", book_id)),
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn list_books(
        &self,
        owner_id: Option<Uuid>,
        filter: &BookFilter,
        limit: Option<usize>,
    ) -> PortResult<Vec<Book>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let limit = limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));

        let records = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {} FROM books \
             WHERE owner_id IS NOT DISTINCT FROM $1 \
               AND ($2::text IS NULL OR status = $2) \
               AND ($3::text IS NULL \
                    OR strpos(lower(title), lower($3)) > 0 \
                    OR strpos(lower(author), lower($3)) > 0 \
                    OR strpos(lower(isbn), lower($3)) > 0) \
             ORDER BY date_added DESC \
             LIMIT $4",
            BOOK_COLUMNS
        ))
        .bind(owner_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(search)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(BookRecord::to_domain).collect()
    }

    async fn save_book(&self, book: &Book) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE books SET current_page = $3, status = $4, progress = $5, \
             date_finished = $6, notes = $7, rating = $8 \
             WHERE id = $1 AND owner_id IS NOT DISTINCT FROM $2",
        )
        .bind(book.id)
        .bind(book.owner_id)
        .bind(pages(book.current_page)?)
        .bind(book.status.as_str())
        .bind(book.progress)
        .bind(book.date_finished)
        .bind(&book.notes)
        .bind(book.rating.map(i16::from))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Book {} not found", book.id)));
        }
        Ok(())
    }

    async fn delete_book(&self, owner_id: Option<Uuid>, book_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1 AND owner_id IS NOT DISTINCT FROM $2")
            .bind(book_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Book {} not found", book_id)));
        }
        Ok(())
    }
}
