use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ComponentType, ItemType};

/// Id of the implicit root container every internal layout owns.
pub const BASE_CONTAINER_ID: &str = "base-component";

/// Schema reference written at the top of every layout file.
pub const LAYOUT_SCHEMA_URL: &str = "https://altinncdn.no/schemas/json/layout/layout.schema.v1.json";

/// A layout page as stored on disk: a flat ordered list of items where
/// containers reference their children by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalFormLayout {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub data: ExternalLayoutData,
    /// Unrecognised top-level keys, preserved verbatim.
    #[serde(flatten)]
    pub custom_root_properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalLayoutData {
    pub layout: Vec<ExternalComponent>,
    #[serde(flatten)]
    pub custom_data_properties: Map<String, Value>,
}

/// One entry of `data.layout`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalComponent {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

/// A leaf item in the internal representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormComponent {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub item_type: ItemType,
    #[serde(default)]
    pub page_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_path: Option<String>,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl FormComponent {
    /// A new component of `kind` carrying the kind's default properties.
    pub fn new(id: impl Into<String>, kind: ComponentType) -> Self {
        Self {
            id: id.into(),
            component_type: kind,
            item_type: ItemType::Component,
            page_index: None,
            property_path: kind.property_path().map(str::to_string),
            properties: kind.default_properties(),
        }
    }
}

/// An item that owns an ordered list of children.
///
/// The root container has no `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormContainer {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<ComponentType>,
    pub item_type: ItemType,
    #[serde(default)]
    pub page_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_path: Option<String>,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl FormContainer {
    pub fn new(id: impl Into<String>, kind: ComponentType) -> Self {
        Self {
            id: id.into(),
            component_type: Some(kind),
            item_type: ItemType::Container,
            page_index: None,
            property_path: kind.property_path().map(str::to_string),
            properties: kind.default_properties(),
        }
    }

    pub fn base() -> Self {
        Self {
            id: BASE_CONTAINER_ID.to_string(),
            component_type: None,
            item_type: ItemType::Container,
            page_index: None,
            property_path: None,
            properties: Map::new(),
        }
    }

    /// Multi-page groups prefix child references with their page number.
    pub fn is_multi_page(&self) -> bool {
        self.properties
            .get("edit")
            .and_then(|edit| edit.get("multiPage"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Either kind of layout item, used when inserting into a tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FormItem {
    Component(FormComponent),
    Container(FormContainer),
}

impl FormItem {
    /// A new item of `kind` with defaults, placed in the right map by its kind.
    pub fn new(id: impl Into<String>, kind: ComponentType) -> Self {
        if kind.is_container() {
            Self::Container(FormContainer::new(id, kind))
        } else {
            Self::Component(FormComponent::new(id, kind))
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Component(c) => &c.id,
            Self::Container(c) => &c.id,
        }
    }

    pub fn kind(&self) -> Option<ComponentType> {
        match self {
            Self::Component(c) => Some(c.component_type),
            Self::Container(c) => c.component_type,
        }
    }
}

/// The normalized, id-indexed form of one layout page.
///
/// Invariant: every id in `order` values exists in exactly one of
/// `components`/`containers`, and `order` has an entry for every container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalLayout {
    pub components: BTreeMap<String, FormComponent>,
    pub containers: BTreeMap<String, FormContainer>,
    pub order: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub custom_root_properties: Map<String, Value>,
    #[serde(default)]
    pub custom_data_properties: Map<String, Value>,
}

impl InternalLayout {
    /// A layout holding only the root container.
    pub fn empty() -> Self {
        let mut containers = BTreeMap::new();
        containers.insert(BASE_CONTAINER_ID.to_string(), FormContainer::base());
        let mut order = BTreeMap::new();
        order.insert(BASE_CONTAINER_ID.to_string(), Vec::new());
        Self {
            components: BTreeMap::new(),
            containers,
            order,
            custom_root_properties: Map::new(),
            custom_data_properties: Map::new(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.components.contains_key(id) || self.containers.contains_key(id)
    }

    /// Kind of the item with `id`; `None` for the root or unknown ids.
    pub fn kind_of(&self, id: &str) -> Option<ComponentType> {
        self.components
            .get(id)
            .map(|c| c.component_type)
            .or_else(|| self.containers.get(id).and_then(|c| c.component_type))
    }

    /// The container whose order lists `id`.
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.order
            .iter()
            .find(|(_, children)| children.iter().any(|child| child == id))
            .map(|(parent, _)| parent.as_str())
    }

    pub fn children_of(&self, id: &str) -> &[String] {
        self.order.get(id).map(Vec::as_slice).unwrap_or_default()
    }
}

impl Default for InternalLayout {
    fn default() -> Self {
        Self::empty()
    }
}

/// Result of converting every layout of a layout set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedLayouts {
    pub converted_layouts: BTreeMap<String, InternalLayout>,
    /// Names of layouts where at least one entry was dropped.
    pub invalid_layouts: Vec<String>,
}
