//! Conversion between the on-disk layout format and the internal id-indexed form.
//!
//! Import never fails. Entries that cannot be placed in the tree are dropped and
//! reported as [`LayoutIssue`]s; everything else is kept.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{
    ComponentType, ConvertedLayouts, ExternalComponent, ExternalFormLayout, ExternalLayoutData,
    FormComponent, FormContainer, InternalLayout, ItemType, BASE_CONTAINER_ID, LAYOUT_SCHEMA_URL,
};

/// Keys that describe tree structure or internal bookkeeping and never end up in
/// an item's free-form properties.
const STRUCTURAL_KEYS: [&str; 7] = [
    "id",
    "type",
    "component",
    "children",
    "itemType",
    "propertyPath",
    "pageIndex",
];

/// Something in an external layout that could not be represented internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutIssue {
    #[error("layout document is malformed: {0}")]
    MalformedDocument(String),

    #[error("entry {index} is not an object with a string id")]
    MalformedEntry { index: usize },

    #[error("component {id} has unknown type {type_name:?}")]
    UnknownType { id: String, type_name: Option<String> },

    #[error("id {id} is used by more than one entry")]
    DuplicateId { id: String },

    #[error("component {id} of type {kind} cannot have children")]
    ChildrenOnComponent { id: String, kind: ComponentType },

    #[error("container {parent} has a child reference that is not a string")]
    MalformedChild { parent: String },

    #[error("container {parent} references missing child {child}")]
    UnresolvedChild { parent: String, child: String },

    #[error("{child} is already placed in the tree; reference from {parent} dropped")]
    DuplicateReference { parent: String, child: String },

    #[error("container {parent} does not accept children of type {kind} ({child})")]
    InvalidChildType {
        parent: String,
        child: String,
        kind: ComponentType,
    },

    #[error("{id} is not reachable from the root container")]
    Orphaned { id: String },
}

/// One converted layout and the problems found while converting it.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConversion {
    pub layout: InternalLayout,
    pub issues: Vec<LayoutIssue>,
}

impl LayoutConversion {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug)]
struct ChildRef {
    id: String,
    page_index: Option<u32>,
}

#[derive(Debug)]
struct Entry {
    id: String,
    kind: ComponentType,
    children: Vec<ChildRef>,
    properties: Map<String, Value>,
}

/// Convert a single external layout document.
pub fn convert_external_to_internal(document: &Value) -> LayoutConversion {
    let mut layout = InternalLayout::empty();
    let mut issues = Vec::new();

    let Some(root) = document.as_object() else {
        issues.push(LayoutIssue::MalformedDocument(
            "layout is not a JSON object".to_string(),
        ));
        return LayoutConversion { layout, issues };
    };

    layout.custom_root_properties = root
        .iter()
        .filter(|(key, _)| key.as_str() != "$schema" && key.as_str() != "data")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let data = match root.get("data") {
        None | Some(Value::Null) => return LayoutConversion { layout, issues },
        Some(Value::Object(data)) => data,
        Some(_) => {
            issues.push(LayoutIssue::MalformedDocument(
                "data is not an object".to_string(),
            ));
            return LayoutConversion { layout, issues };
        }
    };

    layout.custom_data_properties = data
        .iter()
        .filter(|(key, _)| key.as_str() != "layout")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let raw_entries = match data.get("layout") {
        None | Some(Value::Null) => return LayoutConversion { layout, issues },
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            issues.push(LayoutIssue::MalformedDocument(
                "data.layout is not an array".to_string(),
            ));
            return LayoutConversion { layout, issues };
        }
    };

    let mut dropped_children = Vec::new();
    let entries = parse_entries(raw_entries, &mut dropped_children, &mut issues);
    let index: HashMap<&str, usize> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (e.id.as_str(), i))
        .collect();

    // Children of dropped entries stay referenced so they surface as orphans
    // instead of moving to the root.
    let referenced: HashSet<&str> = entries
        .iter()
        .flat_map(|e| e.children.iter().map(|c| c.id.as_str()))
        .chain(dropped_children.iter().map(String::as_str))
        .collect();

    let mut builder = TreeBuilder {
        entries: &entries,
        index: &index,
        handled: HashSet::new(),
        layout: &mut layout,
        issues: &mut issues,
    };

    for entry in &entries {
        if !referenced.contains(entry.id.as_str()) {
            builder.place(BASE_CONTAINER_ID, None, &entry.id, None);
        }
    }

    let handled = builder.handled;
    for entry in &entries {
        if !handled.contains(entry.id.as_str()) {
            issues.push(LayoutIssue::Orphaned {
                id: entry.id.clone(),
            });
        }
    }

    LayoutConversion { layout, issues }
}

fn parse_entries(
    raw: &[Value],
    dropped_children: &mut Vec<String>,
    issues: &mut Vec<LayoutIssue>,
) -> Vec<Entry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(raw.len());

    for (position, value) in raw.iter().enumerate() {
        let Some(object) = value.as_object() else {
            issues.push(LayoutIssue::MalformedEntry { index: position });
            continue;
        };
        let id = match object.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                issues.push(LayoutIssue::MalformedEntry { index: position });
                continue;
            }
        };

        // Older layouts name the kind under `component`.
        let type_name = object
            .get("type")
            .or_else(|| object.get("component"))
            .and_then(Value::as_str);
        let Some(kind) = type_name.and_then(ComponentType::from_str) else {
            if let Some(Value::Array(children)) = object.get("children") {
                let multi_page = is_multi_page(object);
                dropped_children.extend(
                    children
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|reference| parse_child_ref(reference, multi_page).id),
                );
            }
            issues.push(LayoutIssue::UnknownType {
                id,
                type_name: type_name.map(str::to_string),
            });
            continue;
        };

        if !seen.insert(id.clone()) {
            issues.push(LayoutIssue::DuplicateId { id });
            continue;
        }

        let properties: Map<String, Value> = object
            .iter()
            .filter(|(key, _)| !STRUCTURAL_KEYS.contains(&key.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let children = match object.get("children") {
            Some(Value::Array(children)) if kind.is_container() => {
                parse_children(&id, children, is_multi_page(&properties), issues)
            }
            Some(Value::Array(_)) => {
                issues.push(LayoutIssue::ChildrenOnComponent {
                    id: id.clone(),
                    kind,
                });
                Vec::new()
            }
            _ => Vec::new(),
        };

        entries.push(Entry {
            id,
            kind,
            children,
            properties,
        });
    }

    entries
}

fn parse_children(
    parent: &str,
    children: &[Value],
    multi_page: bool,
    issues: &mut Vec<LayoutIssue>,
) -> Vec<ChildRef> {
    let mut refs = Vec::with_capacity(children.len());
    for child in children {
        let Some(reference) = child.as_str() else {
            issues.push(LayoutIssue::MalformedChild {
                parent: parent.to_string(),
            });
            continue;
        };
        refs.push(parse_child_ref(reference, multi_page));
    }
    refs
}

/// Multi-page groups write children as `"<page>:<id>"`.
fn parse_child_ref(reference: &str, multi_page: bool) -> ChildRef {
    if multi_page {
        if let Some((page, id)) = reference.split_once(':') {
            if let Ok(page) = page.parse::<u32>() {
                return ChildRef {
                    id: id.to_string(),
                    page_index: Some(page),
                };
            }
        }
    }
    ChildRef {
        id: reference.to_string(),
        page_index: None,
    }
}

fn is_multi_page(properties: &Map<String, Value>) -> bool {
    properties
        .get("edit")
        .and_then(|edit| edit.get("multiPage"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

struct TreeBuilder<'e, 'm> {
    entries: &'e [Entry],
    index: &'e HashMap<&'e str, usize>,
    handled: HashSet<&'e str>,
    layout: &'m mut InternalLayout,
    issues: &'m mut Vec<LayoutIssue>,
}

impl<'e, 'm> TreeBuilder<'e, 'm> {
    /// Place `id` under `parent`, then its subtree. `parent_kind` is `None` for the root.
    fn place(
        &mut self,
        parent: &str,
        parent_kind: Option<ComponentType>,
        id: &str,
        page_index: Option<u32>,
    ) {
        let Some(&position) = self.index.get(id) else {
            self.issues.push(LayoutIssue::UnresolvedChild {
                parent: parent.to_string(),
                child: id.to_string(),
            });
            return;
        };
        let entries = self.entries;
        let entry = &entries[position];

        if self.handled.contains(entry.id.as_str()) {
            self.issues.push(LayoutIssue::DuplicateReference {
                parent: parent.to_string(),
                child: entry.id.clone(),
            });
            return;
        }
        self.handled.insert(entry.id.as_str());

        if let Some(parent_kind) = parent_kind {
            if !parent_kind.accepts_child(entry.kind) {
                self.issues.push(LayoutIssue::InvalidChildType {
                    parent: parent.to_string(),
                    child: entry.id.clone(),
                    kind: entry.kind,
                });
                return;
            }
        }

        self.layout
            .order
            .entry(parent.to_string())
            .or_default()
            .push(entry.id.clone());

        if !entry.kind.is_container() {
            self.layout.components.insert(
                entry.id.clone(),
                FormComponent {
                    id: entry.id.clone(),
                    component_type: entry.kind,
                    item_type: ItemType::Component,
                    page_index,
                    property_path: entry.kind.property_path().map(str::to_string),
                    properties: entry.properties.clone(),
                },
            );
            return;
        }

        self.layout.containers.insert(
            entry.id.clone(),
            FormContainer {
                id: entry.id.clone(),
                component_type: Some(entry.kind),
                item_type: ItemType::Container,
                page_index,
                property_path: entry.kind.property_path().map(str::to_string),
                properties: entry.properties.clone(),
            },
        );
        self.layout.order.insert(entry.id.clone(), Vec::new());

        for child in &entry.children {
            self.place(&entry.id, Some(entry.kind), &child.id, child.page_index);
        }
    }
}

/// Convert every layout of a layout set, collecting the names of layouts that
/// had entries dropped.
pub fn convert_external_layouts(layouts: &BTreeMap<String, Value>) -> ConvertedLayouts {
    let mut result = ConvertedLayouts::default();
    for (name, document) in layouts {
        let conversion = convert_external_to_internal(document);
        if !conversion.is_valid() {
            for issue in &conversion.issues {
                tracing::warn!("Layout {}: {}", name, issue);
            }
            result.invalid_layouts.push(name.clone());
        }
        result
            .converted_layouts
            .insert(name.clone(), conversion.layout);
    }
    result
}

/// Flatten an internal layout back into the on-disk format.
///
/// Items are emitted depth-first: each container is followed by its subtree.
pub fn convert_internal_to_external(layout: &InternalLayout) -> ExternalFormLayout {
    let mut entries = Vec::new();
    for id in layout.children_of(BASE_CONTAINER_ID) {
        push_external(layout, id, &mut entries);
    }

    ExternalFormLayout {
        schema: Some(LAYOUT_SCHEMA_URL.to_string()),
        data: ExternalLayoutData {
            layout: entries,
            custom_data_properties: layout.custom_data_properties.clone(),
        },
        custom_root_properties: layout.custom_root_properties.clone(),
    }
}

fn push_external(layout: &InternalLayout, id: &str, out: &mut Vec<ExternalComponent>) {
    if let Some(component) = layout.components.get(id) {
        out.push(ExternalComponent {
            id: component.id.clone(),
            component_type: component.component_type,
            children: None,
            properties: component.properties.clone(),
        });
        return;
    }

    let Some(container) = layout.containers.get(id) else {
        return;
    };
    let Some(kind) = container.component_type else {
        return;
    };

    let multi_page = container.is_multi_page();
    let children: Vec<String> = layout
        .children_of(id)
        .iter()
        .map(|child| match (multi_page, page_index_of(layout, child)) {
            (true, Some(page)) => format!("{page}:{child}"),
            _ => child.clone(),
        })
        .collect();

    out.push(ExternalComponent {
        id: container.id.clone(),
        component_type: kind,
        children: Some(children),
        properties: container.properties.clone(),
    });

    for child in layout.children_of(id) {
        push_external(layout, child, out);
    }
}

fn page_index_of(layout: &InternalLayout, id: &str) -> Option<u32> {
    layout
        .components
        .get(id)
        .and_then(|c| c.page_index)
        .or_else(|| layout.containers.get(id).and_then(|c| c.page_index))
}
