//! Conversion between generic chat types and the watsonx.ai wire format

use crate::error::LlmError;
use crate::protocol::watsonx::{
    WxChatResponse, WxContentPart, WxFunction, WxFunctionCall, WxMessage, WxParameters, WxTool, WxToolCall,
};
use crate::types::{
    AssistantContent, CreateContent, CreateResult, FinishReason, FunctionCall, LlmMessage, RequestUsage, ToolDescriptor,
    ToolSchema, UserContent, UserPart,
};

const FUNCTION_TYPE: &str = "function";

// -- Outbound: generic types -> watsonx wire format --

/// Translate a conversation into wire messages, preserving order
///
/// A tool-result message expands to one wire message per result; every
/// other message maps to exactly one.
///
/// # Errors
///
/// Returns `LlmError::Conversion` if any message has a content shape with no
/// wire equivalent
pub fn to_wire_messages(messages: &[LlmMessage]) -> Result<Vec<WxMessage>, LlmError> {
    let mut wire = Vec::with_capacity(messages.len());
    for message in messages {
        translate_message(message, &mut wire)?;
    }
    Ok(wire)
}

fn translate_message(message: &LlmMessage, wire: &mut Vec<WxMessage>) -> Result<(), LlmError> {
    match message {
        LlmMessage::System(system) => wire.push(WxMessage::System {
            content: system.content.clone(),
        }),
        LlmMessage::User(user) => wire.push(WxMessage::User {
            content: user_content(&user.content)?,
        }),
        LlmMessage::Assistant(assistant) => wire.push(assistant_message(&assistant.content)?),
        LlmMessage::ToolResult(results) => {
            wire.extend(results.content.iter().map(|result| WxMessage::Tool {
                content: result.content.clone(),
                tool_call_id: result.call_id.clone(),
            }));
        }
    }
    Ok(())
}

fn user_content(content: &UserContent) -> Result<Vec<WxContentPart>, LlmError> {
    let parts = match content {
        UserContent::Text(text) => return Ok(vec![WxContentPart::Text { text: text.clone() }]),
        UserContent::Parts(parts) => parts,
    };

    match parts.first() {
        None => Err(LlmError::Conversion("user message has an empty content list".to_owned())),
        Some(UserPart::Text(_)) => parts
            .iter()
            .map(|part| match part {
                UserPart::Text(text) => Ok(WxContentPart::Text { text: text.clone() }),
                UserPart::Image(_) => Err(mixed_user_parts()),
            })
            .collect(),
        Some(UserPart::Image(_)) => parts
            .iter()
            .map(|part| match part {
                UserPart::Image(image) => Ok(WxContentPart::ImageUrl {
                    image_url: image.data_uri(),
                }),
                UserPart::Text(_) => Err(mixed_user_parts()),
            })
            .collect(),
    }
}

fn mixed_user_parts() -> LlmError {
    LlmError::Conversion("user message mixes text and image parts".to_owned())
}

fn assistant_message(content: &AssistantContent) -> Result<WxMessage, LlmError> {
    match content {
        AssistantContent::Text(text) => Ok(WxMessage::Assistant {
            content: Some(text.clone()),
            tool_calls: None,
        }),
        AssistantContent::FunctionCalls(calls) if calls.is_empty() => Err(LlmError::Conversion(
            "assistant message has an empty function call list".to_owned(),
        )),
        AssistantContent::FunctionCalls(calls) => Ok(WxMessage::Assistant {
            content: None,
            tool_calls: Some(
                calls
                    .iter()
                    .map(|call| WxToolCall {
                        id: call.id.clone(),
                        tool_type: FUNCTION_TYPE.to_owned(),
                        function: WxFunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        },
                    })
                    .collect(),
            ),
        }),
    }
}

/// Translate tool descriptors into wire tool definitions
///
/// # Errors
///
/// Returns `LlmError::Conversion` if a descriptor has an empty name
pub fn to_wire_tools(tools: &[ToolDescriptor]) -> Result<Vec<WxTool>, LlmError> {
    tools.iter().map(|tool| to_wire_tool(&tool.schema())).collect()
}

fn to_wire_tool(schema: &ToolSchema) -> Result<WxTool, LlmError> {
    if schema.name.is_empty() {
        return Err(LlmError::Conversion("tool schema has an empty name".to_owned()));
    }

    Ok(WxTool {
        tool_type: FUNCTION_TYPE.to_owned(),
        function: WxFunction {
            name: schema.name.clone(),
            description: schema.description.clone(),
            parameters: schema.parameters.as_ref().map(|parameters| WxParameters {
                schema_type: parameters.schema_type.clone(),
                properties: parameters.properties.clone(),
                required: parameters.required.clone(),
            }),
        },
    })
}

// -- Inbound: watsonx wire format -> generic types --

/// Map a vendor finish code onto the generic taxonomy
///
/// Only `stop` and `tool_calls` are recognised. Anything else, including a
/// missing code, is an error rather than a silent default.
///
/// # Errors
///
/// Returns `LlmError::UnknownFinishReason` for any other code
pub fn parse_finish_reason(code: Option<&str>) -> Result<FinishReason, LlmError> {
    match code {
        Some("stop") => Ok(FinishReason::Stop),
        Some("tool_calls") => Ok(FinishReason::FunctionCalls),
        Some(other) => Err(LlmError::UnknownFinishReason(other.to_owned())),
        None => Err(LlmError::UnknownFinishReason("<none>".to_owned())),
    }
}

/// Build a result from a complete chat response
///
/// Only the first choice is read. Tool-call values are copied whole.
///
/// # Errors
///
/// Returns `LlmError::Upstream` if the response has no choices, or
/// `LlmError::UnknownFinishReason` for an unrecognised finish code
pub fn parse_response(response: WxChatResponse) -> Result<CreateResult, LlmError> {
    let usage = RequestUsage::new(response.usage.prompt_tokens, response.usage.completion_tokens);

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Upstream("watsonx response contained no choices".to_owned()))?;

    let finish_reason = parse_finish_reason(choice.finish_reason.as_deref())?;

    let content = match choice.message.content {
        Some(text) => CreateContent::Text(text),
        None => CreateContent::FunctionCalls(
            choice
                .message
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(|call| FunctionCall {
                    id: call.id,
                    name: call.function.name,
                    arguments: call.function.arguments,
                })
                .collect(),
        ),
    };

    Ok(CreateResult {
        finish_reason,
        content,
        usage,
        cached: false,
    })
}
