//! services/api/src/web/middleware.rs
//!
//! Session middleware for book, stats and account routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::web::session::extract_token;
use crate::web::state::{AppState, CurrentUser};

/// Resolves the session if one is presented and inserts a `CurrentUser`.
///
/// Requests without a valid session are not rejected; they continue with
/// `CurrentUser(None)` and operate on anonymous data.
pub async fn resolve_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = match extract_token(req.headers()) {
        Some(token) => state.auth.resolve_session(&token).await?,
        None => None,
    };
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Middleware that validates the session and rejects the request with 401
/// when none resolves.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(req.headers());
    let user = state.auth.require_session(token.as_deref()).await?;
    req.extensions_mut().insert(CurrentUser(Some(user)));
    Ok(next.run(req).await)
}
