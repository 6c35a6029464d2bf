//! Local demo tool the model can call

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use wxbridge_llm::types::ParametersSchema;
use wxbridge_llm::{LlmError, Tool, ToolSchema};

#[derive(Deserialize)]
struct WeatherArgs {
    city: String,
}

/// Canned weather report for any city
pub struct WeatherTool;

#[async_trait]
impl Tool for WeatherTool {
    fn schema(&self) -> ToolSchema {
        let mut properties = serde_json::Map::new();
        properties.insert(
            "city".to_owned(),
            json!({"type": "string", "description": "City to report on"}),
        );

        ToolSchema::new("get_weather")
            .with_description("Get the current weather for a city")
            .with_parameters(ParametersSchema {
                schema_type: "object".to_owned(),
                properties,
                required: Some(vec!["city".to_owned()]),
            })
    }

    async fn run(&self, arguments: &str) -> Result<String, LlmError> {
        let args: WeatherArgs = serde_json::from_str(arguments)
            .map_err(|e| LlmError::Conversion(format!("invalid get_weather arguments: {e}")))?;

        Ok(format!("The weather in {} is 72 degrees and sunny.", args.city))
    }
}
