//! services/api/src/service/mod.rs
//!
//! Application services that sit between the HTTP layer and the core ports.

pub mod auth;
pub mod books;
pub mod catalog;
pub mod token;

pub use auth::{AuthService, IssuedSession};
pub use books::BookService;
pub use catalog::CatalogLookup;
