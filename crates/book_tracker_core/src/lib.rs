pub mod domain;
pub mod ports;
pub mod progress;
pub mod stats;

pub use domain::{
    AuthSession, Book, BookFilter, BookStatus, BookUpdate, CatalogEntry, FederatedIdentity,
    NewBook, User, UserCredentials, ValidationError,
};
pub use ports::{
    BookStore, CatalogProvider, IdentityProvider, PortError, PortResult, SessionStore, UserStore,
};
pub use stats::{compute_stats, ReadingStats};
