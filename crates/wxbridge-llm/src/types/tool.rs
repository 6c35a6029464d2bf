use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Description of a tool the model may call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name
    pub name: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON-schema for the arguments object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ParametersSchema>,
}

/// JSON-schema subset describing a tool's arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametersSchema {
    /// Schema type, normally `object`
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Per-argument schemas keyed by argument name
    pub properties: serde_json::Map<String, serde_json::Value>,
    /// Names of mandatory arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl ToolSchema {
    /// Schema with a name only
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parameters: None,
        }
    }

    /// Attach a description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach an argument schema
    #[must_use]
    pub fn with_parameters(mut self, parameters: ParametersSchema) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

/// A callable tool that can describe itself
#[async_trait]
pub trait Tool: Send + Sync {
    /// Schema offered to the model
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with the model-supplied argument string
    async fn run(&self, arguments: &str) -> Result<String, LlmError>;
}

/// Anything that can be offered to the model as a tool
#[derive(Clone)]
pub enum ToolDescriptor {
    /// Bare schema
    Schema(ToolSchema),
    /// Callable wrapper carrying its own schema
    Callable(Arc<dyn Tool>),
}

impl ToolDescriptor {
    /// Resolve the schema this descriptor offers
    pub fn schema(&self) -> ToolSchema {
        match self {
            Self::Schema(schema) => schema.clone(),
            Self::Callable(tool) => tool.schema(),
        }
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(schema) => f.debug_tuple("Schema").field(&schema.name).finish(),
            Self::Callable(tool) => f.debug_tuple("Callable").field(&tool.schema().name).finish(),
        }
    }
}

impl From<ToolSchema> for ToolDescriptor {
    fn from(schema: ToolSchema) -> Self {
        Self::Schema(schema)
    }
}

impl From<Arc<dyn Tool>> for ToolDescriptor {
    fn from(tool: Arc<dyn Tool>) -> Self {
        Self::Callable(tool)
    }
}
