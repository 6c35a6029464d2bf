//! Chat client for watsonx.ai foundation models

use std::fmt;
use std::sync::Arc;

use futures_util::stream;
use wxbridge_config::{WatsonxConfig, Workspace};

use crate::convert::watsonx::{parse_response, to_wire_messages, to_wire_tools};
use crate::error::LlmError;
use crate::protocol::watsonx::WxChatRequest;
use crate::provider::{ChatTransport, WatsonxTransport};
use crate::stream::{CreateStream, aggregate};
use crate::types::{CreateOptions, CreateResult, LlmMessage, ModelCapabilities, RequestUsage, ToolDescriptor};
use crate::usage::UsageTracker;

/// Translates generic conversations into watsonx.ai chat calls
///
/// Usage counters are shared by every call on one client and are safe to
/// update from concurrent calls.
pub struct WatsonxClient {
    config: WatsonxConfig,
    workspace: Workspace,
    transport: Arc<dyn ChatTransport>,
    usage: Arc<UsageTracker>,
}

impl WatsonxClient {
    /// Create a client talking to watsonx.ai over HTTP
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Configuration` if the configuration is invalid,
    /// including when neither or both workspace ids are set
    pub fn new(config: WatsonxConfig) -> Result<Self, LlmError> {
        let transport = WatsonxTransport::new(&config);
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over a caller-supplied transport
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Configuration` if the configuration is invalid
    pub fn with_transport(config: WatsonxConfig, transport: Arc<dyn ChatTransport>) -> Result<Self, LlmError> {
        config.validate().map_err(configuration_error)?;
        let workspace = config.workspace().map_err(configuration_error)?;

        tracing::debug!(
            model_id = %config.model_id,
            transport = transport.name(),
            "watsonx client ready"
        );

        Ok(Self {
            config,
            workspace,
            transport,
            usage: Arc::new(UsageTracker::new()),
        })
    }

    /// Run a one-shot chat completion
    ///
    /// Usage is merged into both counters only when the response decodes
    /// completely. A supplied cancellation token is honoured before and
    /// during the vendor call.
    ///
    /// # Errors
    ///
    /// - `UnsupportedFeature` for `json_output` or extra create arguments
    /// - `Conversion` if a message or tool has no wire equivalent
    /// - `Upstream` if the vendor call fails
    /// - `UnknownFinishReason` for an unrecognised finish code
    /// - `Cancelled` if the token fires first
    pub async fn create(
        &self,
        messages: &[LlmMessage],
        tools: &[ToolDescriptor],
        options: &CreateOptions,
    ) -> Result<CreateResult, LlmError> {
        check_options(options)?;
        let request = self.build_request(messages, tools)?;

        let response = match &options.cancellation {
            Some(token) if token.is_cancelled() => return Err(LlmError::Cancelled),
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => return Err(LlmError::Cancelled),
                response = self.transport.chat(&request) => response?,
            },
            None => self.transport.chat(&request).await?,
        };

        let result = parse_response(response)?;
        self.usage.merge(result.usage);

        Ok(result)
    }

    /// Run a streaming chat completion
    ///
    /// The returned stream yields text fragments as they arrive and then one
    /// final result. Cancelling the token ends the stream early with no final
    /// result. Streamed results report zero usage.
    ///
    /// # Errors
    ///
    /// Fails before any chunk is read for the same reasons as [`Self::create`],
    /// or with `NotImplemented` if the transport cannot stream
    pub async fn create_stream(
        &self,
        messages: &[LlmMessage],
        tools: &[ToolDescriptor],
        options: &CreateOptions,
    ) -> Result<CreateStream, LlmError> {
        check_options(options)?;
        let request = self.build_request(messages, tools)?;

        let cancellation = options.cancellation.clone().unwrap_or_default();
        if cancellation.is_cancelled() {
            return Ok(Box::pin(stream::empty()));
        }

        let chunks = tokio::select! {
            biased;
            () = cancellation.cancelled() => return Ok(Box::pin(stream::empty())),
            chunks = self.transport.chat_stream(&request) => chunks?,
        };

        Ok(aggregate(chunks, cancellation, Arc::clone(&self.usage)))
    }

    /// Usage of calls that reached the vendor
    pub fn actual_usage(&self) -> RequestUsage {
        self.usage.actual()
    }

    /// Usage of all calls
    pub fn total_usage(&self) -> RequestUsage {
        self.usage.total()
    }

    /// Token counting is not available for watsonx models; always 0
    #[allow(clippy::unused_self)]
    pub fn count_tokens(&self, _messages: &[LlmMessage], _tools: &[ToolDescriptor]) -> u64 {
        0
    }

    /// Token budgeting is not available for watsonx models; always 1
    #[allow(clippy::unused_self)]
    pub fn remaining_tokens(&self, _messages: &[LlmMessage], _tools: &[ToolDescriptor]) -> u64 {
        1
    }

    /// Features this client offers
    #[allow(clippy::unused_self)]
    pub const fn capabilities(&self) -> ModelCapabilities {
        ModelCapabilities {
            vision: true,
            function_calling: true,
            json_output: true,
        }
    }

    /// Configuration the client was built from
    pub const fn config(&self) -> &WatsonxConfig {
        &self.config
    }

    fn build_request(&self, messages: &[LlmMessage], tools: &[ToolDescriptor]) -> Result<WxChatRequest, LlmError> {
        let messages = to_wire_messages(messages)?;
        let tools = to_wire_tools(tools)?;

        let (space_id, project_id) = match &self.workspace {
            Workspace::Space(id) => (Some(id.clone()), None),
            Workspace::Project(id) => (None, Some(id.clone())),
        };

        tracing::debug!(
            model_id = %self.config.model_id,
            messages = messages.len(),
            tools = tools.len(),
            "built chat request"
        );

        let params = &self.config.params;
        Ok(WxChatRequest {
            model_id: self.config.model_id.clone(),
            space_id,
            project_id,
            messages,
            tools,
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
            frequency_penalty: params.frequency_penalty,
            presence_penalty: params.presence_penalty,
        })
    }
}

impl fmt::Debug for WatsonxClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatsonxClient")
            .field("model_id", &self.config.model_id)
            .field("workspace", &self.workspace)
            .field("transport", &self.transport.name())
            .finish_non_exhaustive()
    }
}

/// Reject call options this client does not model
fn check_options(options: &CreateOptions) -> Result<(), LlmError> {
    if options.json_output.is_some() {
        return Err(LlmError::UnsupportedFeature(
            "json_output is not supported by the watsonx client".to_owned(),
        ));
    }

    if !options.extra_create_args.is_empty() {
        let keys: Vec<&str> = options.extra_create_args.keys().map(String::as_str).collect();
        return Err(LlmError::UnsupportedFeature(format!(
            "extra create args are not supported by the watsonx client: {}",
            keys.join(", ")
        )));
    }

    Ok(())
}

#[allow(clippy::needless_pass_by_value)]
fn configuration_error(e: anyhow::Error) -> LlmError {
    LlmError::Configuration(format!("{e:#}"))
}
