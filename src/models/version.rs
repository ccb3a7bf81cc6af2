use serde::{Deserialize, Serialize};

/// Versions of the app libraries the app under edit is built against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub backend_version: Option<String>,
    pub frontend_version: Option<String>,
}
