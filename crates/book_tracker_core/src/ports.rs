//! crates/book_tracker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use crate::domain::{
    AuthSession, Book, BookFilter, CatalogEntry, FederatedIdentity, User, UserCredentials,
};
use async_trait::async_trait;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence Ports
//=========================================================================================

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(&self, user: &User, hashed_password: Option<&str>) -> PortResult<()>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        name: &str,
        picture: Option<&str>,
    ) -> PortResult<User>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_auth_session(&self, session: &AuthSession) -> PortResult<()>;

    /// Returns the stored record regardless of expiry.
    async fn get_auth_session(&self, token: &str) -> PortResult<Option<AuthSession>>;

    /// Deleting an absent token is not an error.
    async fn delete_auth_session(&self, token: &str) -> PortResult<()>;
}

/// Book persistence. Every call is scoped to an owner; `None` is the anonymous
/// partition. A book outside the given scope behaves as if it did not exist.
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn insert_book(&self, book: &Book) -> PortResult<()>;

    async fn get_book(&self, owner_id: Option<Uuid>, book_id: Uuid) -> PortResult<Book>;

    /// Newest first, at most `limit` records when a limit is given.
    async fn list_books(
        &self,
        owner_id: Option<Uuid>,
        filter: &BookFilter,
        limit: Option<usize>,
    ) -> PortResult<Vec<Book>>;

    /// Overwrites the mutable fields of an existing book.
    async fn save_book(&self, book: &Book) -> PortResult<()>;

    async fn delete_book(&self, owner_id: Option<Uuid>, book_id: Uuid) -> PortResult<()>;
}

//=========================================================================================
// External Collaborator Ports
//=========================================================================================

#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// `Ok(None)` means the provider answered but does not know the ISBN.
    async fn lookup(&self, isbn: &str) -> PortResult<Option<CatalogEntry>>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves an external session id into profile data.
    async fn resolve_session(&self, external_session_id: &str) -> PortResult<FederatedIdentity>;
}
