//! Remote panel operations used by the batch engine.
//!
//! The trait is the seam between the engine and the HTTP client so jobs can be
//! driven against any implementation of the panel's REST contract.

use crate::domain::{User, UserModification, UserStatus};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::fmt;
use thiserror::Error;

/// Errors raised by panel calls.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Bad credentials or an unreachable token endpoint.
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Panel returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Failed to decode panel response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for PanelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Bearer credentials for one authenticated admin session.
///
/// Read-only once obtained and reusable across operations of the same session.
#[derive(Clone)]
pub struct AccessContext {
    admin: String,
    headers: HeaderMap,
}

impl AccessContext {
    pub fn bearer(admin: impl Into<String>, token: &str) -> Result<Self, PanelError> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| PanelError::Auth(format!("unusable access token: {e}")))?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, authorization);

        Ok(Self {
            admin: admin.into(),
            headers,
        })
    }

    /// Username of the admin this session belongs to.
    #[must_use]
    pub fn admin(&self) -> &str {
        &self.admin
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl fmt::Debug for AccessContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessContext")
            .field("admin", &self.admin)
            .field("authorization", &"Bearer ***")
            .finish()
    }
}

/// The panel's admin REST contract.
#[async_trait::async_trait]
pub trait PanelApi: Send + Sync {
    /// Exchanges admin credentials for an [`AccessContext`].
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Auth`] on any transport or HTTP failure.
    async fn authenticate(&self, username: &str, password: &str)
    -> Result<AccessContext, PanelError>;

    /// Fetches the users visible to the session, optionally pre-filtered by status.
    ///
    /// Never returns a partial list: any failure is an error.
    async fn list_users(
        &self,
        access: &AccessContext,
        status: Option<UserStatus>,
    ) -> Result<Vec<User>, PanelError>;

    /// Applies a partial update to one user. Single attempt.
    async fn modify_user(
        &self,
        access: &AccessContext,
        username: &str,
        changes: &UserModification,
    ) -> Result<(), PanelError>;

    /// Deletes one user. Single attempt.
    async fn delete_user(&self, access: &AccessContext, username: &str) -> Result<(), PanelError>;
}
