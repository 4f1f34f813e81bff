//! Bearer credential lifecycle for the upstream API.
//!
//! Credentials come from an OAuth account-credentials grant and are reused
//! until 90% of their lifetime has passed. Renewal is single-flight: callers
//! that arrive while a renewal is in progress wait for it and reuse its result
//! instead of requesting a second token.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

use agendakit_core::resources::error_message;
use agendakit_core::token::{is_reusable, renewal_deadline, TokenResponse};

use super::error::AuthenticationError;
use crate::config::UpstreamConfig;

const TOKEN_TIMEOUT: Duration = Duration::from_secs(10);
const GRANT_TYPE: &str = "account_credentials";

/// A bearer token and the instant after which it must be renewed.
#[derive(Clone)]
pub struct Credential {
    pub access_token: String,
    pub expires_at: Instant,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Obtains and caches the upstream bearer credential.
pub struct TokenManager {
    http: reqwest::Client,
    token_url: String,
    account_id: String,
    client_id: String,
    client_secret: String,
    current: RwLock<Option<Arc<Credential>>>,
    renewal: Mutex<()>,
}

impl TokenManager {
    pub fn new(http: reqwest::Client, config: &UpstreamConfig) -> Self {
        Self {
            http,
            token_url: config.token_url.clone(),
            account_id: config.account_id.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            current: RwLock::new(None),
            renewal: Mutex::new(()),
        }
    }

    /// Returns a credential that is still inside its usable lifetime,
    /// requesting a new one when needed.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationError` when the token endpoint cannot be reached
    /// or refuses the grant. Nothing is cached in that case.
    pub async fn get_token(&self) -> Result<Arc<Credential>, AuthenticationError> {
        if let Some(credential) = self.reusable().await {
            return Ok(credential);
        }

        let _renewal = self.renewal.lock().await;

        // Another caller may have renewed while we waited.
        if let Some(credential) = self.reusable().await {
            return Ok(credential);
        }

        let credential = Arc::new(self.request_token().await?);
        *self.current.write().await = Some(credential.clone());
        Ok(credential)
    }

    /// Drops the cached credential so the next call requests a new one.
    #[allow(dead_code)]
    pub async fn invalidate(&self) {
        self.current.write().await.take();
    }

    async fn reusable(&self) -> Option<Arc<Credential>> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|c| is_reusable(c.expires_at, Instant::now()))
            .cloned()
    }

    async fn request_token(&self) -> Result<Credential, AuthenticationError> {
        let issued_at = Instant::now();

        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", GRANT_TYPE), ("account_id", self.account_id.as_str())])
            .timeout(TOKEN_TIMEOUT)
            .send()
            .await
            .inspect_err(|err| tracing::error!(error = %err, "Token request failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = error_message(&body);
            tracing::error!(status = status.as_u16(), %message, "Token endpoint rejected grant");
            return Err(AuthenticationError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let token: TokenResponse = response.json().await?;
        tracing::info!(expires_in = token.expires_in, "Upstream access token refreshed");

        Ok(Credential {
            access_token: token.access_token,
            expires_at: renewal_deadline(issued_at, token.expires_in),
        })
    }
}
