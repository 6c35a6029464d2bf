//! watsonx.ai text chat API wire format types

use serde::{Deserialize, Serialize};

// -- Request types --

/// Chat request body for `/ml/v1/text/chat` and `/ml/v1/text/chat_stream`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WxChatRequest {
    /// Foundation model identifier
    pub model_id: String,
    /// Deployment space (mutually exclusive with `project_id`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,
    /// Project (mutually exclusive with `space_id`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Conversation messages
    pub messages: Vec<WxMessage>,
    /// Tool definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<WxTool>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Frequency penalty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    /// Presence penalty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
}

/// Message within a chat request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum WxMessage {
    /// System instruction
    System {
        /// Instruction text
        content: String,
    },
    /// User turn, always sent as content parts
    User {
        /// Text or image parts
        content: Vec<WxContentPart>,
    },
    /// Earlier assistant turn
    Assistant {
        /// Text reply
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        /// Requested tool calls
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<WxToolCall>>,
    },
    /// Result of one tool call
    Tool {
        /// Tool output
        content: String,
        /// Id of the call being answered
        tool_call_id: String,
    },
}

/// Content part of a user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WxContentPart {
    /// Text content
    Text {
        /// The text string
        text: String,
    },
    /// Inline image
    ImageUrl {
        /// `data:` URI of the image
        image_url: String,
    },
}

/// Tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WxTool {
    /// Tool type (always "function")
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function specification
    pub function: WxFunction,
}

/// Function specification within a tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WxFunction {
    /// Function name
    pub name: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Argument schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<WxParameters>,
}

/// Argument schema of a function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WxParameters {
    /// Schema type
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Per-argument schemas
    pub properties: serde_json::Map<String, serde_json::Value>,
    /// Mandatory arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

/// Complete tool call in a request or response message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WxToolCall {
    /// Call identifier
    pub id: String,
    /// Tool type (always "function")
    #[serde(rename = "type", default = "function_type")]
    pub tool_type: String,
    /// Function name and arguments
    pub function: WxFunctionCall,
}

/// Function name and arguments of a tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WxFunctionCall {
    /// Function name
    pub name: String,
    /// JSON-encoded arguments
    pub arguments: String,
}

fn function_type() -> String {
    "function".to_owned()
}

// -- Response types --

/// Non-streaming chat response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WxChatResponse {
    /// Response identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Model that served the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    /// Generated choices
    pub choices: Vec<WxChoice>,
    /// Token usage
    pub usage: WxUsage,
}

/// Choice within a chat response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WxChoice {
    /// Choice index
    #[serde(default)]
    pub index: u32,
    /// Generated message
    pub message: WxResponseMessage,
    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Message within a response choice
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WxResponseMessage {
    /// Role (always "assistant")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WxToolCall>>,
}

/// Token usage
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WxUsage {
    /// Prompt tokens
    pub prompt_tokens: u64,
    /// Completion tokens
    pub completion_tokens: u64,
    /// Total tokens
    #[serde(default)]
    pub total_tokens: u64,
}

// -- Streaming types --

/// One delta chunk of a streaming chat response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WxStreamChunk {
    /// Response identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Delta choices
    #[serde(default)]
    pub choices: Vec<WxStreamChoice>,
}

/// Choice within a streaming chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WxStreamChoice {
    /// Choice index
    #[serde(default)]
    pub index: u32,
    /// Incremental delta
    #[serde(default)]
    pub delta: WxStreamDelta,
    /// Finish reason (present on the final chunk)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Incremental message delta
///
/// `content` is doubly optional: the outer `Option` records whether the key
/// was present at all, the inner whether its value was non-null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WxStreamDelta {
    /// Role (first chunk only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Incremental text content
    #[serde(
        default,
        with = "::serde_with::rust::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<Option<String>>,
    /// Incremental tool calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WxStreamToolCall>>,
}

/// Tool call fragment within a streaming delta
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WxStreamToolCall {
    /// Position of the call in the final `tool_calls` list
    pub index: u32,
    /// Fragment of the call id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Tool type
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub tool_type: Option<String>,
    /// Partial function call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<WxStreamFunctionCall>,
}

/// Partial function call within a streaming tool call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WxStreamFunctionCall {
    /// Fragment of the function name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Fragment of the arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

// -- Error response --

/// Error body returned with non-2xx statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WxErrorResponse {
    /// Error entries
    #[serde(default)]
    pub errors: Vec<WxErrorDetail>,
    /// Request trace id
    #[serde(default)]
    pub trace: Option<String>,
}

/// One error entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WxErrorDetail {
    /// Error code
    #[serde(default)]
    pub code: Option<String>,
    /// Error message
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_distinguishes_absent_null_and_empty_content() {
        let absent: WxStreamDelta = serde_json::from_str(r#"{"role":"assistant"}"#).unwrap();
        assert_eq!(absent.content, None);

        let null: WxStreamDelta = serde_json::from_str(r#"{"content":null}"#).unwrap();
        assert_eq!(null.content, Some(None));

        let empty: WxStreamDelta = serde_json::from_str(r#"{"content":""}"#).unwrap();
        assert_eq!(empty.content, Some(Some(String::new())));
    }

    #[test]
    fn response_tool_call_type_defaults_to_function() {
        let call: WxToolCall =
            serde_json::from_str(r#"{"id":"c1","function":{"name":"f","arguments":"{}"}}"#).unwrap();
        assert_eq!(call.tool_type, "function");
    }

    #[test]
    fn empty_tools_are_omitted_from_request() {
        let request = WxChatRequest {
            model_id: "ibm/granite-3-8b-instruct".to_owned(),
            space_id: None,
            project_id: Some("p".to_owned()),
            messages: vec![WxMessage::System {
                content: "be brief".to_owned(),
            }],
            tools: Vec::new(),
            temperature: None,
            top_p: None,
            max_tokens: Some(64),
            frequency_penalty: None,
            presence_penalty: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model_id": "ibm/granite-3-8b-instruct",
                "project_id": "p",
                "messages": [{"role": "system", "content": "be brief"}],
                "max_tokens": 64
            })
        );
    }
}
