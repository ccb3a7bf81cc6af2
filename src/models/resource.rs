use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Text keyed by language code (`nb`, `nn`, `en`).
pub type Translations = BTreeMap<String, String>;

/// Languages every translated resource field must carry.
pub const REQUIRED_LANGUAGES: [&str; 3] = ["nb", "nn", "en"];

/// Metadata for an access-controlled service resource.
///
/// Stored as `<id>/<id>.json` inside the organisation's resource repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub identifier: String,
    #[serde(default)]
    pub title: Translations,
    #[serde(default)]
    pub description: Translations,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_description: Option<Translations>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ResourceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<ResourceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<ResourceKeyword>>,
}

impl Resource {
    /// Resources are delegable unless explicitly marked otherwise.
    pub fn is_delegable(&self) -> bool {
        self.delegable.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResourceStatus {
    Completed,
    Deprecated,
    UnderDevelopment,
    Withdrawn,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResourceType {
    Default,
    Systemresource,
    MaskinportenSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceKeyword {
    pub language: String,
    pub word: String,
}

/// Summary row for the resource list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceListItem {
    pub identifier: String,
    pub title: Translations,
}

impl From<&Resource> for ResourceListItem {
    fn from(resource: &Resource) -> Self {
        Self {
            identifier: resource.identifier.clone(),
            title: resource.title.clone(),
        }
    }
}

/// Default authentication level applied when a stored policy omits one.
pub const DEFAULT_AUTHENTICATION_LEVEL: &str = "3";

fn default_authentication_level() -> String {
    DEFAULT_AUTHENTICATION_LEVEL.to_string()
}

/// Access policy attached to a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePolicy {
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
    #[serde(default = "default_authentication_level")]
    pub required_authentication_level_end_user: String,
    #[serde(default = "default_authentication_level")]
    pub required_authentication_level_org: String,
}

impl Default for ResourcePolicy {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            required_authentication_level_end_user: default_authentication_level(),
            required_authentication_level_org: default_authentication_level(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    pub rule_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subject: Vec<String>,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub resources: Vec<Vec<String>>,
}

/// Outcome of checking a resource for publishing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceValidation {
    pub status: u16,
    pub errors: Vec<String>,
}
