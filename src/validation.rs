//! Naming rules for route and query identifiers.
//!
//! Every identifier that ends up in a filesystem path goes through one of these
//! checks before the service layer touches storage.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

const LAYOUT_SET_MIN: usize = 3;
const LAYOUT_SET_MAX: usize = 28;
const ORG_MAX: usize = 64;
const FILE_NAME_MAX: usize = 100;

/// Reserved app slug that collides with the data model routes.
const RESERVED_APP: &str = "datamodels";

/// A layout set name matching `^[a-zA-Z0-9-]{3,28}$`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LayoutSetName(String);

impl LayoutSetName {
    pub fn parse(name: impl Into<String>) -> Result<Self, ServiceError> {
        let name = name.into();
        if is_valid_layout_set_name(&name) {
            Ok(Self(name))
        } else {
            Err(ServiceError::bad_request("LayoutSetName is not valid"))
        }
    }

    /// Parse an optional query value. Absent and empty both mean "no layout set".
    pub fn parse_optional(name: Option<&str>) -> Result<Option<Self>, ServiceError> {
        match name {
            None | Some("") => Ok(None),
            Some(name) => Self::parse(name).map(Some),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LayoutSetName {
    type Error = ServiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<LayoutSetName> for String {
    fn from(value: LayoutSetName) -> Self {
        value.0
    }
}

impl fmt::Display for LayoutSetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn is_valid_layout_set_name(name: &str) -> bool {
    let len = name.chars().count();
    (LAYOUT_SET_MIN..=LAYOUT_SET_MAX).contains(&len)
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// App slugs: `^[a-z][a-z0-9-]{1,28}[a-z0-9]$`, excluding `datamodels`.
pub fn is_valid_app_name(app: &str) -> bool {
    let bytes = app.as_bytes();
    if app == RESERVED_APP || !(3..=30).contains(&bytes.len()) {
        return false;
    }
    let first = bytes[0];
    let last = bytes[bytes.len() - 1];
    first.is_ascii_lowercase()
        && (last.is_ascii_lowercase() || last.is_ascii_digit())
        && bytes[1..bytes.len() - 1]
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
}

pub fn is_valid_org_name(org: &str) -> bool {
    let mut chars = org.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    org.len() <= ORG_MAX && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Layout and resource names become file stems, so path separators and dot
/// segments are never accepted.
pub fn is_valid_file_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().count() <= FILE_NAME_MAX
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' '))
}

pub fn ensure_org_and_app(org: &str, app: &str) -> Result<(), ServiceError> {
    if !is_valid_org_name(org) {
        return Err(ServiceError::bad_request("Organisation name is not valid"));
    }
    if !is_valid_app_name(app) {
        return Err(ServiceError::bad_request("App name is not valid"));
    }
    Ok(())
}

pub fn ensure_file_name(kind: &str, name: &str) -> Result<(), ServiceError> {
    if is_valid_file_name(name) {
        Ok(())
    } else {
        Err(ServiceError::bad_request(format!("{kind} name is not valid")))
    }
}
