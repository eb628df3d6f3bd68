//! services/api/src/web/session.rs
//!
//! Session token transport: the `session_token` cookie, with an
//! `Authorization: Bearer` header as fallback.

use axum::http::{header, HeaderMap};
use chrono::Duration;

pub const SESSION_COOKIE: &str = "session_token";

/// Reads the session token from the cookie first, then from the bearer header.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    cookie_token(headers).or_else(|| bearer_token(headers))
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    let prefix = format!("{}=", SESSION_COOKIE);
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| c.trim().strip_prefix(prefix.as_str()))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

/// HTTP-only, cross-site cookie whose lifetime mirrors the stored session.
pub fn session_cookie(token: &str, max_age: Duration, secure: bool) -> String {
    // Browsers drop SameSite=None cookies that are not also Secure.
    let same_site = if secure { "None" } else { "Lax" };
    format!(
        "{}={}; HttpOnly;{} SameSite={}; Path=/; Max-Age={}",
        SESSION_COOKIE,
        token,
        if secure { " Secure;" } else { "" },
        same_site,
        max_age.num_seconds().max(0)
    )
}

pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", Duration::zero(), secure)
}
