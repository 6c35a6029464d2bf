//! Vendor-neutral types for multi-agent chat
//!
//! These are the caller-facing shapes. Wire formats convert to and from them
//! in `convert`.

pub mod message;
pub mod request;
pub mod response;
pub mod tool;

pub use message::{
    AssistantContent, AssistantMessage, FunctionCall, FunctionExecutionResult, FunctionExecutionResultMessage, Image,
    LlmMessage, SystemMessage, UserContent, UserMessage, UserPart,
};
pub use request::CreateOptions;
pub use response::{CreateContent, CreateResult, FinishReason, ModelCapabilities, RequestUsage};
pub use tool::{ParametersSchema, Tool, ToolDescriptor, ToolSchema};
