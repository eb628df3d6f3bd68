//! services/api/src/service/auth.rs
//!
//! Credential and federated login, session issuance and session resolution.
//!
//! Sessions expire lazily: an expired record is deleted the first time it is
//! presented, there is no background sweep. The check-then-delete is not atomic
//! against a concurrent request presenting the same token.

use crate::error::ApiError;
use crate::service::token::generate_session_token;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use book_tracker_core::domain::{AuthSession, User};
use book_tracker_core::ports::{IdentityProvider, PortError, SessionStore, UserStore};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 6;
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// A freshly issued session together with its owner.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub user: User,
    pub session: AuthSession,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    identity: Arc<dyn IdentityProvider>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        identity: Arc<dyn IdentityProvider>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            users,
            sessions,
            identity,
            session_ttl,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<IssuedSession, ApiError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::InvalidArgument(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidArgument("Name must not be empty".to_string()));
        }

        let password_hash = hash_password(password.to_string()).await?;
        let user = User {
            id: Uuid::new_v4(),
            email,
            name: name.to_string(),
            picture: None,
            created_at: Utc::now(),
        };
        self.users.create_user(&user, Some(&password_hash)).await?;
        info!(user_id = %user.id, "Registered new user");

        self.issue_session(user).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedSession, ApiError> {
        let email = normalize_email(email)
            .map_err(|_| ApiError::Unauthenticated(INVALID_CREDENTIALS.to_string()))?;

        let creds = match self.users.get_user_by_email(&email).await {
            Ok(creds) => creds,
            Err(PortError::NotFound(_)) => {
                return Err(ApiError::Unauthenticated(INVALID_CREDENTIALS.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        // Accounts created through federated login have no password.
        let Some(stored_hash) = creds.hashed_password else {
            return Err(ApiError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
        };
        if !verify_password(password.to_string(), stored_hash).await? {
            return Err(ApiError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
        }

        self.issue_session(creds.user).await
    }

    /// Exchanges an external session id for a local session, creating or
    /// refreshing the user keyed by email.
    pub async fn exchange_federated_session(
        &self,
        external_session_id: &str,
    ) -> Result<IssuedSession, ApiError> {
        if external_session_id.trim().is_empty() {
            return Err(ApiError::Unauthenticated("Missing session id".to_string()));
        }
        let identity = self
            .identity
            .resolve_session(external_session_id)
            .await
            .map_err(|e| {
                debug!(error = %e, "Federated session exchange failed");
                ApiError::Unauthenticated("Invalid session id".to_string())
            })?;

        let user = match self.users.get_user_by_email(&identity.email).await {
            Ok(creds) => {
                self.users
                    .update_user_profile(creds.user.id, &identity.name, identity.picture.as_deref())
                    .await?
            }
            Err(PortError::NotFound(_)) => {
                let user = User {
                    id: Uuid::new_v4(),
                    email: identity.email,
                    name: identity.name,
                    picture: identity.picture,
                    created_at: Utc::now(),
                };
                self.users.create_user(&user, None).await?;
                info!(user_id = %user.id, "Created user from federated login");
                user
            }
            Err(e) => return Err(e.into()),
        };

        self.issue_session(user).await
    }

    /// Returns the owner of a live session. Expired sessions are removed.
    pub async fn resolve_session(&self, token: &str) -> Result<Option<User>, ApiError> {
        let Some(session) = self.sessions.get_auth_session(token).await? else {
            return Ok(None);
        };

        if !session.is_valid_at(Utc::now()) {
            self.sessions.delete_auth_session(token).await?;
            debug!(user_id = %session.user_id, "Session expired");
            return Ok(None);
        }

        match self.users.get_user(session.user_id).await {
            Ok(user) => Ok(Some(user)),
            Err(PortError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn require_session(&self, token: Option<&str>) -> Result<User, ApiError> {
        let token = token.ok_or_else(|| ApiError::Unauthenticated("Not authenticated".to_string()))?;
        self.resolve_session(token)
            .await?
            .ok_or_else(|| ApiError::Unauthenticated("Invalid or expired session".to_string()))
    }

    /// Idempotent: logging out an unknown token succeeds.
    pub async fn logout(&self, token: &str) -> Result<(), ApiError> {
        self.sessions.delete_auth_session(token).await?;
        debug!("Revoked session");
        Ok(())
    }

    async fn issue_session(&self, user: User) -> Result<IssuedSession, ApiError> {
        let now = Utc::now();
        let session = AuthSession {
            token: generate_session_token(),
            user_id: user.id,
            expires_at: now + self.session_ttl,
            created_at: now,
        };
        self.sessions.create_auth_session(&session).await?;
        debug!(user_id = %user.id, expires_at = %session.expires_at, "Created session");
        Ok(IssuedSession { user, session })
    }
}

fn normalize_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(ApiError::InvalidArgument("Invalid email address".to_string())),
    }
}

// Hashing and verification run on the blocking pool.
async fn hash_password(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Hashing task failed: {}", e)))?
    .map_err(|e| {
        error!("Failed to hash password: {:?}", e);
        ApiError::Internal("Failed to hash password".to_string())
    })
}

async fn verify_password(password: String, stored_hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&stored_hash).map_err(|e| {
            error!("Failed to parse password hash: {:?}", e);
            ApiError::Internal("Authentication error".to_string())
        })?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Verification task failed: {}", e)))?
}
