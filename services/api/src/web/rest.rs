//! services/api/src/web/rest.rs
//!
//! Contains the health endpoint and the master definition for the OpenAPI
//! specification.

use axum::Json;
use utoipa::openapi::server::Server;
use utoipa::OpenApi;

use crate::web::auth::{self, AuthResponse, LoginRequest, MessageResponse, RegisterRequest, UserResponse};
use crate::web::books::{
    self, AddBookRequest, BookResponse, CatalogResponse, StatsResponse, UpdateBookRequest,
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::register_handler,
        auth::login_handler,
        auth::session_handler,
        auth::me_handler,
        auth::logout_handler,
        books::search_isbn_handler,
        books::add_book_handler,
        books::list_books_handler,
        books::list_by_status_handler,
        books::get_book_handler,
        books::update_book_handler,
        books::delete_book_handler,
        books::stats_handler,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            UserResponse,
            AuthResponse,
            MessageResponse,
            AddBookRequest,
            UpdateBookRequest,
            BookResponse,
            CatalogResponse,
            StatsResponse,
        )
    ),
    tags(
        (name = "Book Tracker API", description = "Personal reading list, progress tracking and statistics.")
    )
)]
pub struct ApiDoc;

/// The OpenAPI document with its server URL set to the prefix the routes are
/// mounted under, so documented paths resolve to served ones.
pub fn api_doc(prefix: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    let url = if prefix.is_empty() { "/" } else { prefix };
    doc.servers = Some(vec![Server::new(url)]);
    doc
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is up", body = MessageResponse))
)]
pub async fn health_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Book Tracker API".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/",
            "/auth/register",
            "/auth/login",
            "/auth/session",
            "/auth/me",
            "/auth/logout",
            "/books",
            "/books/search/{isbn}",
            "/books/status/{status}",
            "/books/{id}",
            "/stats",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn document_points_at_mount_prefix() {
        let server_url = |prefix: &str| {
            api_doc(prefix)
                .servers
                .and_then(|servers| servers.into_iter().next())
                .map(|server| server.url)
        };
        assert_eq!(server_url("/api").as_deref(), Some("/api"));
        assert_eq!(server_url("").as_deref(), Some("/"));
    }
}
