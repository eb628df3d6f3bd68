//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: registration, login, federated session exchange,
//! current user and logout.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use book_tracker_core::domain::User;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::adapters::identity::SESSION_ID_HEADER;
use crate::error::{ApiError, AppJson};
use crate::service::IssuedSession;
use crate::web::session::{clear_session_cookie, extract_token, session_cookie};
use crate::web::state::{AppState, CurrentUser};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            picture: user.picture,
        }
    }
}

/// User summary plus the issued token, for clients using the bearer header.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub session_token: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

fn issued_response(
    state: &AppState,
    status: StatusCode,
    issued: IssuedSession,
) -> impl IntoResponse {
    let cookie = session_cookie(
        &issued.session.token,
        state.auth.session_ttl(),
        state.config.cookie_secure,
    );
    let body = AuthResponse {
        user: issued.user.into(),
        session_token: issued.session.token,
    };
    (status, [(header::SET_COOKIE, cookie)], Json(body))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register - Create a new account and sign in
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created and session issued", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let issued = state.auth.register(&req.email, &req.password, &req.name).await?;
    Ok(issued_response(&state, StatusCode::CREATED, issued))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let issued = state.auth.login(&req.email, &req.password).await?;
    Ok(issued_response(&state, StatusCode::OK, issued))
}

/// POST /auth/session - Exchange a federated login session for a local one
#[utoipa::path(
    post,
    path = "/auth/session",
    params(
        ("X-Session-ID" = String, Header, description = "Session id issued by the identity provider.")
    ),
    responses(
        (status = 200, description = "Session issued", body = AuthResponse),
        (status = 401, description = "Unknown or rejected session id")
    )
)]
pub async fn session_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let external_id = headers
        .get(SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthenticated(format!("{} header is required", SESSION_ID_HEADER)))?;
    let issued = state.auth.exchange_federated_session(external_id).await?;
    Ok(issued_response(&state, StatusCode::OK, issued))
}

/// GET /auth/me - The signed-in user
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "No valid session")
    )
)]
pub async fn me_handler(Extension(current): Extension<CurrentUser>) -> Result<Json<UserResponse>, ApiError> {
    let user = current
        .0
        .ok_or_else(|| ApiError::Unauthenticated("Not authenticated".to_string()))?;
    Ok(Json(user.into()))
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = extract_token(&headers) {
        state.auth.logout(&token).await?;
    }

    let cookie = clear_session_cookie(state.config.cookie_secure);
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}
