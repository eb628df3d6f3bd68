//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-request identity.

use crate::config::Config;
use crate::service::{AuthService, BookService, CatalogLookup};
use book_tracker_core::domain::User;
use book_tracker_core::ports::{BookStore, IdentityProvider, SessionStore, UserStore};
use std::sync::Arc;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<AuthService>,
    pub books: Arc<BookService>,
}

impl AppState {
    /// Wires the services over the given ports.
    pub fn new(
        config: Arc<Config>,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        books: Arc<dyn BookStore>,
        catalog: CatalogLookup,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let auth = AuthService::new(users, sessions, identity, config.session_ttl);
        let books = BookService::new(books, Arc::new(catalog));
        Self {
            config,
            auth: Arc::new(auth),
            books: Arc::new(books),
        }
    }
}

//=========================================================================================
// CurrentUser (Specific to One Request)
//=========================================================================================

/// The identity resolved from the request's session, inserted by the session
/// middleware. `None` means the request acts on the anonymous partition.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    pub fn owner_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.id)
    }
}
