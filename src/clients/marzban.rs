use crate::config::PanelConfig;
use crate::domain::{User, UserModification, UserStatus};
use crate::services::panel_service::{AccessContext, PanelApi, PanelError};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

const MAX_ERROR_BODY: usize = 500;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UsersResponse {
    users: Vec<User>,
}

/// HTTP client for the panel's admin API.
#[derive(Debug, Clone)]
pub struct PanelClient {
    client: Client,
    base_url: Url,
}

impl PanelClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, PanelError> {
        let client = Client::builder()
            .user_agent(concat!("marzban-manager/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| PanelError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &PanelConfig) -> anyhow::Result<Self> {
        let base_url = config.base_url()?;
        let timeout = Duration::from_secs(config.request_timeout_seconds);
        Ok(Self::new(base_url, timeout)?)
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, PanelError> {
        self.base_url
            .join(path)
            .map_err(|e| PanelError::Transport(format!("invalid endpoint {path}: {e}")))
    }

    fn user_endpoint(&self, username: &str) -> Result<Url, PanelError> {
        self.endpoint(&format!("api/user/{}", urlencoding::encode(username)))
    }
}

async fn ensure_success(response: Response) -> Result<Response, PanelError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let body = if body.chars().count() > MAX_ERROR_BODY {
        format!("{}...", body.chars().take(MAX_ERROR_BODY).collect::<String>())
    } else {
        body
    };

    Err(PanelError::Http {
        status: status.as_u16(),
        body,
    })
}

#[async_trait::async_trait]
impl PanelApi for PanelClient {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccessContext, PanelError> {
        let url = self.endpoint("api/admin/token")?;
        let params = [("username", username), ("password", password)];

        let result: Result<TokenResponse, PanelError> = async {
            let response = self.client.post(url).form(&params).send().await?;
            let response = ensure_success(response).await?;
            Ok(response.json::<TokenResponse>().await?)
        }
        .await;

        match result {
            Ok(token) => {
                debug!(admin = %username, "Obtained access token");
                AccessContext::bearer(username, &token.access_token)
            }
            Err(e) => {
                error!(admin = %username, error = %e, "Error occurred while obtaining access token");
                Err(PanelError::Auth(e.to_string()))
            }
        }
    }

    async fn list_users(
        &self,
        access: &AccessContext,
        status: Option<UserStatus>,
    ) -> Result<Vec<User>, PanelError> {
        let mut url = self.endpoint("api/users")?;
        if let Some(status) = status {
            url.query_pairs_mut().append_pair("status", status.as_str());
        }

        let response = self
            .client
            .get(url)
            .headers(access.headers().clone())
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let text = response.text().await?;
        let parsed: UsersResponse = serde_json::from_str(&text).map_err(|e| {
            debug!(error = %e, "Failed to parse users response");
            PanelError::Decode(e.to_string())
        })?;

        debug!(count = parsed.users.len(), status = ?status, "Fetched users");
        Ok(parsed.users)
    }

    async fn modify_user(
        &self,
        access: &AccessContext,
        username: &str,
        changes: &UserModification,
    ) -> Result<(), PanelError> {
        let url = self.user_endpoint(username)?;
        let response = self
            .client
            .put(url)
            .headers(access.headers().clone())
            .json(changes)
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }

    async fn delete_user(&self, access: &AccessContext, username: &str) -> Result<(), PanelError> {
        let url = self.user_endpoint(username)?;
        let response = self
            .client
            .delete(url)
            .headers(access.headers().clone())
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}
