use agios_llm::{generate_structured, GenerationClient, GenerationRequest, Structured};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::kind::ToolKind;
use crate::prompts;

/// Raw classifier verdict. `tool` is kept as text so an out-of-vocabulary
/// answer still parses and the caller decides how to degrade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSelection {
    pub tool: String,
    #[serde(default, deserialize_with = "params_or_empty")]
    pub params: Map<String, Value>,
}

impl ToolSelection {
    pub fn general_search() -> Self {
        Self {
            tool: ToolKind::GeneralSearch.as_str().to_string(),
            params: Map::new(),
        }
    }

    /// None when the model named a tool outside the vocabulary
    pub fn kind(&self) -> Option<ToolKind> {
        ToolKind::parse(&self.tool)
    }

    /// Non-blank string parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        param(&self.params, name)
    }
}

/// Non-blank string value of `name` in a params object
pub fn param<'a>(params: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

// `"params": null` shows up in model output often enough to accept it
fn params_or_empty<'de, D>(deserializer: D) -> std::result::Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ask the model which tool should handle `query`
pub async fn classify(
    client: &dyn GenerationClient,
    query: &str,
) -> Result<Structured<ToolSelection>> {
    let request = GenerationRequest::new(prompts::tool_detector(query));
    let selection = generate_structured::<ToolSelection>(client, request).await?;
    tracing::debug!(tool = %selection.value.tool, attempts = selection.attempts, "classified query");
    Ok(selection)
}
