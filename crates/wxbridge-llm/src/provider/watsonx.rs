//! watsonx.ai HTTP transport

use async_trait::async_trait;
use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures_util::StreamExt;
use futures_util::future::ready;
use reqwest::{Client, Response};
use secrecy::ExposeSecret;
use url::Url;
use wxbridge_config::WatsonxConfig;

use super::auth::IamAuthenticator;
use super::{ChatTransport, ChunkStream};
use crate::error::LlmError;
use crate::protocol::watsonx::{WxChatRequest, WxChatResponse, WxErrorResponse, WxStreamChunk};

/// Talks to the watsonx.ai text chat endpoints with IAM bearer auth
pub struct WatsonxTransport {
    client: Client,
    chat_url: String,
    stream_url: String,
    auth: IamAuthenticator,
}

impl WatsonxTransport {
    /// Create a transport for the configured endpoint and credential
    pub fn new(config: &WatsonxConfig) -> Self {
        let client = Client::new();

        Self {
            chat_url: endpoint(&config.url, "chat", &config.api_version),
            stream_url: endpoint(&config.url, "chat_stream", &config.api_version),
            auth: IamAuthenticator::new(client.clone(), &config.iam_url, config.api_key.clone()),
            client,
        }
    }

    async fn post(&self, url: &str, request: &WxChatRequest) -> Result<Response, LlmError> {
        let token = self.auth.token().await?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(model_id = %request.model_id, error = %e, "upstream request failed");
                LlmError::Upstream(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(model_id = %request.model_id, status = %status, "upstream returned error");
            return Err(LlmError::Upstream(format!(
                "watsonx returned {status}: {}",
                error_message(&body)
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatTransport for WatsonxTransport {
    fn name(&self) -> &'static str {
        "watsonx"
    }

    async fn chat(&self, request: &WxChatRequest) -> Result<WxChatResponse, LlmError> {
        let response = self.post(&self.chat_url, request).await?;

        response
            .json()
            .await
            .map_err(|e| LlmError::Upstream(format!("failed to parse response: {e}")))
    }

    async fn chat_stream(&self, request: &WxChatRequest) -> Result<ChunkStream, LlmError> {
        let response = self.post(&self.stream_url, request).await?;

        let chunks = response
            .bytes_stream()
            .eventsource()
            .filter_map(|event| ready(decode_event(event)));

        Ok(Box::pin(chunks))
    }
}

/// Build `{base}/ml/v1/text/{operation}?version={version}`
fn endpoint(base: &Url, operation: &str, version: &str) -> String {
    let base = base.as_str().trim_end_matches('/');
    format!("{base}/ml/v1/text/{operation}?version={version}")
}

/// Decode one SSE event into a delta chunk
///
/// Events without data carry nothing and are skipped. A payload that does not
/// decode is an error rather than a skip, since it may hold a tool-call
/// fragment.
fn decode_event<E: std::fmt::Display>(
    event: Result<Event, EventStreamError<E>>,
) -> Option<Result<WxStreamChunk, LlmError>> {
    let event = match event {
        Ok(event) => event,
        Err(e) => {
            tracing::error!(error = %e, "stream transport failed");
            return Some(Err(LlmError::Streaming(e.to_string())));
        }
    };

    let data = event.data.trim();
    if data.is_empty() {
        return None;
    }

    Some(serde_json::from_str(data).map_err(|e| {
        tracing::debug!(error = %e, data = %data, "undecodable stream chunk");
        LlmError::Streaming(format!("failed to decode stream chunk: {e}"))
    }))
}

/// Pull the vendor's error messages out of an error body, falling back to the
/// raw body
fn error_message(body: &str) -> String {
    match serde_json::from_str::<WxErrorResponse>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed
            .errors
            .iter()
            .map(|error| match &error.code {
                Some(code) => format!("{code}: {}", error.message),
                None => error.message.clone(),
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => body.to_owned(),
    }
}
