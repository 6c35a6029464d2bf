//! watsonx.ai chat client for multi-agent conversations
//!
//! Translates generic system, user, assistant and tool-result messages onto
//! the watsonx.ai text chat API, for both one-shot and streamed responses,
//! and reassembles streamed deltas into a complete result.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod client;
pub mod convert;
pub mod error;
pub mod protocol;
pub mod provider;
pub mod stream;
pub mod types;
pub mod usage;

pub use client::WatsonxClient;
pub use error::LlmError;
pub use provider::{ChatTransport, ChunkStream, WatsonxTransport};
pub use stream::{CreateStream, StreamAggregator, StreamItem};
pub use types::{
    CreateContent, CreateOptions, CreateResult, FinishReason, FunctionCall, FunctionExecutionResult, Image, LlmMessage,
    ModelCapabilities, RequestUsage, Tool, ToolDescriptor, ToolSchema,
};
pub use usage::UsageTracker;
