use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use super::message::FunctionCall;

/// Reason the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of generation
    Stop,
    /// Hit the token limit
    Length,
    /// Model decided to call one or more functions
    FunctionCalls,
    /// Output was filtered
    ContentFilter,
}

/// Token usage for one request, or a running total
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestUsage {
    /// Tokens consumed by the prompt
    pub prompt_tokens: u64,
    /// Tokens generated in the completion
    pub completion_tokens: u64,
}

impl RequestUsage {
    /// Usage sample
    pub const fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }
}

impl Add for RequestUsage {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            prompt_tokens: self.prompt_tokens.saturating_add(rhs.prompt_tokens),
            completion_tokens: self.completion_tokens.saturating_add(rhs.completion_tokens),
        }
    }
}

impl AddAssign for RequestUsage {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Content of a completed generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreateContent {
    /// Text reply
    Text(String),
    /// Requested function calls, in order
    FunctionCalls(Vec<FunctionCall>),
}

/// Result of a completed `create` or `create_stream` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateResult {
    /// Why generation stopped
    pub finish_reason: FinishReason,
    /// Text or function calls, never both
    pub content: CreateContent,
    /// Tokens used by this call
    pub usage: RequestUsage,
    /// Whether the result came from a cache
    pub cached: bool,
}

impl CreateResult {
    /// Text content, if the model answered in text
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            CreateContent::Text(text) => Some(text),
            CreateContent::FunctionCalls(_) => None,
        }
    }

    /// Function calls, if the model requested any
    pub fn function_calls(&self) -> Option<&[FunctionCall]> {
        match &self.content {
            CreateContent::Text(_) => None,
            CreateContent::FunctionCalls(calls) => Some(calls),
        }
    }
}

/// Features the model client supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCapabilities {
    /// Accepts image input
    pub vision: bool,
    /// Supports tool calling
    pub function_calling: bool,
    /// Produces JSON output
    pub json_output: bool,
}
