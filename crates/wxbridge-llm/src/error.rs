use thiserror::Error;

/// Errors that can occur while talking to watsonx.ai
#[derive(Debug, Error)]
pub enum LlmError {
    /// Client configuration is invalid or incomplete
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Caller asked for a capability this client does not model
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// A message or tool descriptor matched no translation rule
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Vendor returned a finish reason outside the known set
    #[error("unknown finish reason: {0}")]
    UnknownFinishReason(String),

    /// Capability is deliberately not implemented
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Upstream request failed or returned an unusable response
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Error while reading a streaming response
    #[error("streaming error: {0}")]
    Streaming(String),

    /// Caller cancelled the request
    #[error("request cancelled")]
    Cancelled,

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
