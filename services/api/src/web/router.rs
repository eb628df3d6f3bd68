//! services/api/src/web/router.rs
//!
//! Assembles the HTTP router: public auth routes, session-scoped book routes,
//! CORS, request tracing and the Swagger UI.

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::middleware::{require_auth, resolve_session};
use crate::web::rest::{api_doc, health_handler};
use crate::web::state::AppState;
use crate::web::{auth, books};

/// Joins the configured prefix with a route path. An empty prefix mounts at the root.
fn at(prefix: &str, path: &str) -> String {
    match (prefix.is_empty(), path) {
        (true, _) => path.to_string(),
        (false, "/") => format!("{}/", prefix),
        (false, _) => format!("{}{}", prefix, path),
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) if value != "*" => Some(value),
            _ => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static("x-session-id"),
        ])
}

/// Builds the complete application router over the shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let prefix = state.config.api_prefix.clone();
    let p = |path: &str| at(&prefix, path);

    // Public routes (no session needed)
    let public_routes = Router::new()
        .route(&p("/"), get(health_handler))
        .route(&p("/auth/register"), post(auth::register_handler))
        .route(&p("/auth/login"), post(auth::login_handler))
        .route(&p("/auth/session"), post(auth::session_handler))
        .route(&p("/auth/logout"), post(auth::logout_handler))
        .route(&p("/books/search/{isbn}"), get(books::search_isbn_handler));

    // Account routes (a valid session is mandatory)
    let account_routes = Router::new()
        .route(&p("/auth/me"), get(auth::me_handler))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    // Book routes (scoped to the session's user, or the anonymous shelf)
    let book_routes = Router::new()
        .route(
            &p("/books"),
            get(books::list_books_handler).post(books::add_book_handler),
        )
        .route(&p("/books/status/{status}"), get(books::list_by_status_handler))
        .route(
            &p("/books/{id}"),
            get(books::get_book_handler)
                .put(books::update_book_handler)
                .delete(books::delete_book_handler),
        )
        .route(&p("/stats"), get(books::stats_handler))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), resolve_session));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(account_routes)
        .merge(book_routes)
        .with_state(state.clone());

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_doc(&prefix)))
        .layer(cors_layer(&state.config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_prefix() {
        assert_eq!(at("/api", "/"), "/api/");
        assert_eq!(at("/api", "/books/{id}"), "/api/books/{id}");
        assert_eq!(at("", "/"), "/");
        assert_eq!(at("", "/stats"), "/stats");
    }

    #[test]
    fn cors_skips_wildcard_and_invalid_origins() {
        // A wildcard in an origin list makes tower-http panic.
        let _layer = cors_layer(&[
            "*".to_string(),
            "bad\norigin".to_string(),
            "http://localhost:3000".to_string(),
        ]);
    }
}
