//! services/api/src/adapters/identity.rs
//!
//! Federated identity: resolves an external session id (sent by the frontend in
//! `X-Session-ID` after an OAuth round trip) into the user's profile.

use async_trait::async_trait;
use book_tracker_core::domain::FederatedIdentity;
use book_tracker_core::ports::{IdentityProvider, PortError, PortResult};
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

pub const SESSION_ID_HEADER: &str = "X-Session-ID";

pub struct HttpIdentityProvider {
    client: Client,
    session_url: String,
}

impl HttpIdentityProvider {
    pub fn new(client: Client, session_url: String) -> Self {
        Self {
            client,
            session_url,
        }
    }
}

#[derive(Deserialize)]
struct SessionData {
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

fn identity_from(data: SessionData) -> Option<FederatedIdentity> {
    let email = data.email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty())?;
    let name = data
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| email.clone());
    Some(FederatedIdentity {
        email,
        name,
        picture: data.picture,
    })
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn resolve_session(&self, external_session_id: &str) -> PortResult<FederatedIdentity> {
        let response = self
            .client
            .get(&self.session_url)
            .header(SESSION_ID_HEADER, external_session_id)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Identity provider unreachable");
                PortError::Unauthorized
            })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Identity provider rejected session");
            return Err(PortError::Unauthorized);
        }

        let data: SessionData = response.json().await.map_err(|e| {
            warn!(error = %e, "Identity provider returned malformed session data");
            PortError::Unauthorized
        })?;
        identity_from(data).ok_or(PortError::Unauthorized)
    }
}

/// Used when no identity provider is configured; every exchange is refused.
pub struct DisabledIdentityProvider;

#[async_trait]
impl IdentityProvider for DisabledIdentityProvider {
    async fn resolve_session(&self, _external_session_id: &str) -> PortResult<FederatedIdentity> {
        Err(PortError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_an_email() {
        let data: SessionData =
            serde_json::from_str(r#"{"name": "Ada", "picture": null}"#).unwrap();
        assert!(identity_from(data).is_none());
    }

    #[test]
    fn falls_back_to_email_for_name() {
        let data: SessionData =
            serde_json::from_str(r#"{"email": " Ada@Example.com ", "id": "x"}"#).unwrap();
        let identity = identity_from(data).unwrap();
        assert_eq!(identity.email, "ada@example.com");
        assert_eq!(identity.name, "ada@example.com");
        assert!(identity.picture.is_none());
    }

    #[tokio::test]
    async fn disabled_provider_refuses() {
        let result = DisabledIdentityProvider.resolve_session("abc").await;
        assert!(matches!(result, Err(PortError::Unauthorized)));
    }
}
