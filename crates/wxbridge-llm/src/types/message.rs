use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// A message in a multi-agent conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LlmMessage {
    /// Instructions for the model
    #[serde(rename = "SystemMessage")]
    System(SystemMessage),
    /// Input from a user or another agent
    #[serde(rename = "UserMessage")]
    User(UserMessage),
    /// Earlier model output
    #[serde(rename = "AssistantMessage")]
    Assistant(AssistantMessage),
    /// Results of executed function calls
    #[serde(rename = "FunctionExecutionResultMessage")]
    ToolResult(FunctionExecutionResultMessage),
}

impl LlmMessage {
    /// System instruction
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(SystemMessage {
            content: content.into(),
        })
    }

    /// Plain-text user message
    pub fn user(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self::User(UserMessage {
            content: UserContent::Text(content.into()),
            source: source.into(),
        })
    }

    /// Plain-text assistant message
    pub fn assistant(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self::Assistant(AssistantMessage {
            content: AssistantContent::Text(content.into()),
            source: source.into(),
        })
    }

    /// Assistant message requesting function calls
    pub fn function_calls(calls: Vec<FunctionCall>, source: impl Into<String>) -> Self {
        Self::Assistant(AssistantMessage {
            content: AssistantContent::FunctionCalls(calls),
            source: source.into(),
        })
    }

    /// Results for previously requested function calls
    pub fn tool_results(results: Vec<FunctionExecutionResult>) -> Self {
        Self::ToolResult(FunctionExecutionResultMessage { content: results })
    }
}

/// System instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMessage {
    /// Instruction text
    pub content: String,
}

/// Message authored by a user or another agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    /// Message body
    pub content: UserContent,
    /// Name of the agent or user that produced the message
    pub source: String,
}

/// Body of a user message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserContent {
    /// Single text block
    Text(String),
    /// Ordered parts; must be non-empty and all of one kind
    Parts(Vec<UserPart>),
}

/// One element of a multipart user message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserPart {
    /// Text fragment
    Text(String),
    /// Inline image
    Image(Image),
}

/// Message previously produced by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Message body
    pub content: AssistantContent,
    /// Name of the agent that produced the message
    pub source: String,
}

/// Body of an assistant message: text or function calls, never both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssistantContent {
    /// Text reply
    Text(String),
    /// Requested function calls, in order
    FunctionCalls(Vec<FunctionCall>),
}

/// A requested tool invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Call identifier, echoed back in the matching result
    pub id: String,
    /// Tool name
    pub name: String,
    /// Arguments, typically JSON-encoded; never parsed here
    pub arguments: String,
}

/// Results of executed function calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionExecutionResultMessage {
    /// One result per executed call
    pub content: Vec<FunctionExecutionResult>,
}

/// Output of a single function call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionExecutionResult {
    /// Tool output
    pub content: String,
    /// Id of the call this result answers
    pub call_id: String,
}

impl FunctionExecutionResult {
    /// Result for the call with `call_id`
    pub fn new(content: impl Into<String>, call_id: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            call_id: call_id.into(),
        }
    }
}

/// Base64-encoded image with its MIME type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// MIME type (e.g. `image/png`)
    pub mime_type: String,
    /// Base64 payload
    pub data: String,
}

impl Image {
    /// Encode raw image bytes
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Wrap an existing base64 payload
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Conversion` if `data` is not valid base64
    pub fn from_base64(mime_type: impl Into<String>, data: impl Into<String>) -> Result<Self, LlmError> {
        let data = data.into();
        STANDARD
            .decode(&data)
            .map_err(|e| LlmError::Conversion(format!("invalid base64 image data: {e}")))?;

        Ok(Self {
            mime_type: mime_type.into(),
            data,
        })
    }

    /// `data:` URI embedding the image
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}
