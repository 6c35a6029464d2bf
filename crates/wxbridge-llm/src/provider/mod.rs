//! Transport trait and the watsonx.ai HTTP implementation

mod auth;
pub mod watsonx;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

pub use self::watsonx::WatsonxTransport;
use crate::error::LlmError;
use crate::protocol::watsonx::{WxChatRequest, WxChatResponse, WxStreamChunk};

/// Ordered sequence of decoded delta chunks; the end of the stream is the
/// end-of-sequence signal
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<WxStreamChunk, LlmError>> + Send>>;

/// Moves wire requests to the vendor and wire responses back
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Human-readable transport name
    fn name(&self) -> &str;

    /// Send a one-shot chat request
    async fn chat(&self, request: &WxChatRequest) -> Result<WxChatResponse, LlmError>;

    /// Open a streaming chat request
    ///
    /// Transports without streaming support keep the default, which fails
    /// with `LlmError::NotImplemented`.
    async fn chat_stream(&self, _request: &WxChatRequest) -> Result<ChunkStream, LlmError> {
        Err(LlmError::NotImplemented(format!(
            "streaming is not supported by the {} transport",
            self.name()
        )))
    }
}
