//! IBM Cloud IAM bearer tokens for watsonx.ai

use std::time::{Duration, Instant};

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use url::Url;

use crate::error::LlmError;

const GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Tokens are refreshed this long before IAM says they expire
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct IamTokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: SecretString,
    refresh_at: Instant,
}

/// Exchanges an API key for bearer tokens and caches them until shortly
/// before expiry
pub struct IamAuthenticator {
    client: Client,
    token_url: String,
    api_key: SecretString,
    cached: Mutex<Option<CachedToken>>,
}

impl IamAuthenticator {
    pub fn new(client: Client, iam_url: &Url, api_key: SecretString) -> Self {
        let base = iam_url.as_str().trim_end_matches('/');

        Self {
            client,
            token_url: format!("{base}/identity/token"),
            api_key,
            cached: Mutex::new(None),
        }
    }

    /// Current bearer token, fetching a new one when the cached one is stale
    ///
    /// Concurrent callers wait on the same refresh.
    pub async fn token(&self) -> Result<SecretString, LlmError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        let fresh = self.fetch().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);

        Ok(value)
    }

    async fn fetch(&self) -> Result<CachedToken, LlmError> {
        tracing::debug!(url = %self.token_url, "requesting IAM token");

        let response = self
            .client
            .post(&self.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[("grant_type", GRANT_TYPE), ("apikey", self.api_key.expose_secret())])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "IAM token request failed");
                LlmError::Upstream(format!("IAM token request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "IAM rejected the API key");
            return Err(LlmError::Upstream(format!("IAM returned {status}: {body}")));
        }

        let body: IamTokenResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Upstream(format!("failed to parse IAM token response: {e}")))?;

        let lifetime = Duration::from_secs(body.expires_in).saturating_sub(REFRESH_MARGIN);

        Ok(CachedToken {
            value: SecretString::from(body.access_token),
            refresh_at: Instant::now() + lifetime,
        })
    }
}
