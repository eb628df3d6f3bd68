pub mod auth;
pub mod books;
pub mod middleware;
pub mod rest;
pub mod router;
pub mod session;
pub mod state;

// Re-export the router builder so the binary and the integration tests
// can construct the full application.
pub use router::build_router;
pub use state::{AppState, CurrentUser};
