use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const LAYOUT_SETS_SCHEMA_URL: &str =
    "https://altinncdn.no/schemas/json/layout/layout-sets.schema.v1.json";

/// Contents of `layout-sets.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSets {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default)]
    pub sets: Vec<LayoutSetConfig>,
    /// Keys this editor does not model, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LayoutSets {
    pub fn new(sets: Vec<LayoutSetConfig>) -> Self {
        Self {
            schema: Some(LAYOUT_SETS_SCHEMA_URL.to_string()),
            sets,
            extra: Map::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&LayoutSetConfig> {
        self.sets.iter().find(|set| set.id == id)
    }
}

/// A named group of layouts bound to a data type and the process tasks that show it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSetConfig {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
