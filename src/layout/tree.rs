//! Editing operations on the internal layout tree.
//!
//! Every operation either succeeds and leaves the layout satisfying
//! [`InternalLayout::validate`], or fails without modifying it.

use std::collections::HashSet;

use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ComponentType, FormItem, InternalLayout, BASE_CONTAINER_ID};

/// Properties that identify an item and cannot be changed through a patch.
const IMMUTABLE_PROPERTIES: [&str; 4] = ["id", "type", "itemType", "children"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("an item with id {0} already exists")]
    DuplicateId(String),

    #[error("item {0} not found")]
    ItemNotFound(String),

    #[error("container {0} not found")]
    ContainerNotFound(String),

    #[error("container {parent} does not accept children of type {kind}")]
    InvalidChild { parent: String, kind: String },

    #[error("the root container cannot be modified")]
    CannotModifyRoot,

    #[error("cannot move {id} into its own subtree ({target})")]
    WouldCreateCycle { id: String, target: String },

    #[error("property {0} cannot be changed")]
    ImmutableProperty(String),

    #[error("item id cannot be empty")]
    EmptyId,

    #[error("layout invariant violated: {0}")]
    InvariantViolation(String),
}

/// A fresh id for a new item of `kind`, e.g. `Input-3f9a1c`.
pub fn generate_component_id(kind: ComponentType) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", kind.as_str(), &suffix[..6])
}

impl InternalLayout {
    /// Insert `item` into `parent` at `position` (appended when `None` or past the end).
    pub fn add_item(
        &mut self,
        item: FormItem,
        parent: &str,
        position: Option<usize>,
    ) -> Result<(), LayoutError> {
        let id = item.id().to_string();
        if id.is_empty() {
            return Err(LayoutError::EmptyId);
        }
        if id == BASE_CONTAINER_ID || self.contains(&id) {
            return Err(LayoutError::DuplicateId(id));
        }
        self.ensure_accepts(parent, item.kind())?;

        match item {
            FormItem::Component(component) => {
                self.components.insert(id.clone(), component);
            }
            FormItem::Container(container) => {
                self.containers.insert(id.clone(), container);
                self.order.insert(id.clone(), Vec::new());
            }
        }
        insert_at(self.order.entry(parent.to_string()).or_default(), id, position);
        Ok(())
    }

    /// Remove an item. Removing a container removes its whole subtree.
    pub fn remove_item(&mut self, id: &str) -> Result<(), LayoutError> {
        if id == BASE_CONTAINER_ID {
            return Err(LayoutError::CannotModifyRoot);
        }
        if !self.contains(id) {
            return Err(LayoutError::ItemNotFound(id.to_string()));
        }

        if let Some(parent) = self.parent_of(id).map(str::to_string) {
            if let Some(siblings) = self.order.get_mut(&parent) {
                siblings.retain(|child| child != id);
            }
        }

        for removed in self.subtree(id) {
            self.components.remove(&removed);
            self.containers.remove(&removed);
            self.order.remove(&removed);
        }
        Ok(())
    }

    /// Move an item to `new_parent` at `position`.
    pub fn move_item(
        &mut self,
        id: &str,
        new_parent: &str,
        position: Option<usize>,
    ) -> Result<(), LayoutError> {
        if id == BASE_CONTAINER_ID {
            return Err(LayoutError::CannotModifyRoot);
        }
        if !self.contains(id) {
            return Err(LayoutError::ItemNotFound(id.to_string()));
        }
        if self.subtree(id).iter().any(|item| item == new_parent) {
            return Err(LayoutError::WouldCreateCycle {
                id: id.to_string(),
                target: new_parent.to_string(),
            });
        }
        self.ensure_accepts(new_parent, self.kind_of(id))?;

        if let Some(parent) = self.parent_of(id).map(str::to_string) {
            if let Some(siblings) = self.order.get_mut(&parent) {
                siblings.retain(|child| child != id);
            }
        }
        insert_at(
            self.order.entry(new_parent.to_string()).or_default(),
            id.to_string(),
            position,
        );
        Ok(())
    }

    /// Change an item's id, updating every reference to it.
    pub fn rename_item(&mut self, old_id: &str, new_id: &str) -> Result<(), LayoutError> {
        if old_id == BASE_CONTAINER_ID {
            return Err(LayoutError::CannotModifyRoot);
        }
        if new_id.is_empty() {
            return Err(LayoutError::EmptyId);
        }
        if old_id == new_id {
            return Ok(());
        }
        if new_id == BASE_CONTAINER_ID || self.contains(new_id) {
            return Err(LayoutError::DuplicateId(new_id.to_string()));
        }

        if let Some(mut component) = self.components.remove(old_id) {
            component.id = new_id.to_string();
            self.components.insert(new_id.to_string(), component);
        } else if let Some(mut container) = self.containers.remove(old_id) {
            container.id = new_id.to_string();
            self.containers.insert(new_id.to_string(), container);
            if let Some(children) = self.order.remove(old_id) {
                self.order.insert(new_id.to_string(), children);
            }
        } else {
            return Err(LayoutError::ItemNotFound(old_id.to_string()));
        }

        for children in self.order.values_mut() {
            for child in children.iter_mut().filter(|child| *child == old_id) {
                *child = new_id.to_string();
            }
        }
        Ok(())
    }

    /// Apply a partial update to an item's properties.
    ///
    /// Objects merge recursively, `null` removes a key. `propertyPath` and
    /// `pageIndex` update the matching fields.
    pub fn update_properties(
        &mut self,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Result<(), LayoutError> {
        if id == BASE_CONTAINER_ID {
            return Err(LayoutError::CannotModifyRoot);
        }
        if let Some(key) = patch
            .keys()
            .find(|key| IMMUTABLE_PROPERTIES.contains(&key.as_str()))
        {
            return Err(LayoutError::ImmutableProperty(key.clone()));
        }

        let (properties, page_index, property_path) =
            if let Some(component) = self.components.get_mut(id) {
                (
                    &mut component.properties,
                    &mut component.page_index,
                    &mut component.property_path,
                )
            } else if let Some(container) = self.containers.get_mut(id) {
                (
                    &mut container.properties,
                    &mut container.page_index,
                    &mut container.property_path,
                )
            } else {
                return Err(LayoutError::ItemNotFound(id.to_string()));
            };

        for (key, value) in patch {
            match key.as_str() {
                "pageIndex" => {
                    *page_index = value.as_u64().and_then(|v| u32::try_from(v).ok());
                }
                "propertyPath" => {
                    *property_path = value.as_str().map(str::to_string);
                }
                _ => merge_value(properties, key, value),
            }
        }
        Ok(())
    }

    /// Check the structural invariants of the tree.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let violation = |msg: String| Err(LayoutError::InvariantViolation(msg));

        if !self.containers.contains_key(BASE_CONTAINER_ID)
            || !self.order.contains_key(BASE_CONTAINER_ID)
        {
            return violation("root container is missing".to_string());
        }
        if let Some(id) = self.components.keys().find(|id| self.containers.contains_key(*id)) {
            return violation(format!("{id} is both a component and a container"));
        }
        if let Some(id) = self.containers.keys().find(|id| !self.order.contains_key(*id)) {
            return violation(format!("container {id} has no order entry"));
        }
        if let Some(id) = self.order.keys().find(|id| !self.containers.contains_key(*id)) {
            return violation(format!("order entry {id} is not a container"));
        }

        let mut placed = HashSet::new();
        for (parent, children) in &self.order {
            for child in children {
                if child == BASE_CONTAINER_ID {
                    return violation(format!("root container is listed as a child of {parent}"));
                }
                if !self.contains(child) {
                    return violation(format!("{parent} references missing item {child}"));
                }
                if !placed.insert(child.as_str()) {
                    return violation(format!("{child} has more than one parent"));
                }
            }
        }

        let unplaced = self
            .components
            .keys()
            .chain(self.containers.keys())
            .find(|id| id.as_str() != BASE_CONTAINER_ID && !placed.contains(id.as_str()));
        if let Some(id) = unplaced {
            return violation(format!("{id} has no parent"));
        }

        // Every item must be reachable from the root; this rules out detached cycles.
        let reachable = self.subtree(BASE_CONTAINER_ID);
        if reachable.len() != self.components.len() + self.containers.len() {
            return violation("layout contains items unreachable from the root".to_string());
        }
        Ok(())
    }

    /// `id` and every item below it, depth-first.
    fn subtree(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = vec![id.to_string()];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(children) = self.order.get(&current) {
                stack.extend(children.iter().rev().cloned());
            }
            out.push(current);
        }
        out
    }

    fn ensure_accepts(&self, parent: &str, kind: Option<ComponentType>) -> Result<(), LayoutError> {
        let Some(container) = self.containers.get(parent) else {
            return Err(LayoutError::ContainerNotFound(parent.to_string()));
        };
        let accepted = match (container.component_type, kind) {
            (_, None) => false,
            // The root accepts every kind.
            (None, Some(_)) => true,
            (Some(parent_kind), Some(kind)) => parent_kind.accepts_child(kind),
        };
        if accepted {
            Ok(())
        } else {
            Err(LayoutError::InvalidChild {
                parent: parent.to_string(),
                kind: kind.map(|k| k.to_string()).unwrap_or_else(|| "root".to_string()),
            })
        }
    }
}

fn insert_at(list: &mut Vec<String>, id: String, position: Option<usize>) {
    match position {
        Some(position) if position < list.len() => list.insert(position, id),
        _ => list.push(id),
    }
}

fn merge_value(target: &mut Map<String, Value>, key: &str, patch: &Value) {
    match patch {
        Value::Null => {
            target.remove(key);
        }
        Value::Object(patch_object) => {
            let entry = target
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(existing) = entry {
                for (k, v) in patch_object {
                    merge_value(existing, k, v);
                }
            }
        }
        other => {
            target.insert(key.to_string(), other.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FormComponent, FormContainer};
    use serde_json::json;

    fn layout_with_group() -> InternalLayout {
        let mut layout = InternalLayout::empty();
        layout
            .add_item(FormItem::new("group", ComponentType::Group), BASE_CONTAINER_ID, None)
            .unwrap();
        layout
            .add_item(FormItem::new("name", ComponentType::Input), "group", None)
            .unwrap();
        layout
            .add_item(FormItem::new("intro", ComponentType::Paragraph), BASE_CONTAINER_ID, Some(0))
            .unwrap();
        layout
    }

    #[test]
    fn add_item_respects_position() {
        let layout = layout_with_group();
        assert_eq!(layout.children_of(BASE_CONTAINER_ID), ["intro", "group"]);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn add_item_rejects_duplicates_and_unknown_parents() {
        let mut layout = layout_with_group();
        assert_eq!(
            layout.add_item(FormItem::new("name", ComponentType::Input), BASE_CONTAINER_ID, None),
            Err(LayoutError::DuplicateId("name".to_string()))
        );
        assert_eq!(
            layout.add_item(FormItem::new("x", ComponentType::Input), "intro", None),
            Err(LayoutError::ContainerNotFound("intro".to_string()))
        );
    }

    #[test]
    fn add_item_enforces_valid_child_types() {
        let mut layout = InternalLayout::empty();
        layout
            .add_item(
                FormItem::Container(FormContainer::new("buttons", ComponentType::ButtonGroup)),
                BASE_CONTAINER_ID,
                None,
            )
            .unwrap();
        let err = layout
            .add_item(
                FormItem::Component(FormComponent::new("name", ComponentType::Input)),
                "buttons",
                None,
            )
            .unwrap_err();
        assert!(matches!(err, LayoutError::InvalidChild { .. }));
        layout
            .add_item(FormItem::new("submit", ComponentType::Button), "buttons", None)
            .unwrap();
    }

    #[test]
    fn remove_container_removes_subtree() {
        let mut layout = layout_with_group();
        layout.remove_item("group").unwrap();
        assert!(!layout.contains("group"));
        assert!(!layout.contains("name"));
        assert!(!layout.order.contains_key("group"));
        assert_eq!(layout.children_of(BASE_CONTAINER_ID), ["intro"]);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn root_cannot_be_removed_or_moved() {
        let mut layout = layout_with_group();
        assert_eq!(layout.remove_item(BASE_CONTAINER_ID), Err(LayoutError::CannotModifyRoot));
        assert_eq!(
            layout.move_item(BASE_CONTAINER_ID, "group", None),
            Err(LayoutError::CannotModifyRoot)
        );
    }

    #[test]
    fn move_item_rejects_cycles() {
        let mut layout = layout_with_group();
        layout
            .add_item(FormItem::new("inner", ComponentType::Group), "group", None)
            .unwrap();
        assert!(matches!(
            layout.move_item("group", "inner", None),
            Err(LayoutError::WouldCreateCycle { .. })
        ));
        layout.move_item("name", "inner", None).unwrap();
        assert_eq!(layout.children_of("inner"), ["name"]);
        assert_eq!(layout.children_of("group"), ["inner"]);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn rename_updates_order_references() {
        let mut layout = layout_with_group();
        layout.rename_item("group", "personalia").unwrap();
        assert_eq!(layout.children_of(BASE_CONTAINER_ID), ["intro", "personalia"]);
        assert_eq!(layout.children_of("personalia"), ["name"]);
        assert_eq!(layout.containers["personalia"].id, "personalia");
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn update_properties_merges_and_removes() {
        let mut layout = layout_with_group();
        let patch = json!({
            "textResourceBindings": { "title": "name.title" },
            "required": null,
            "readOnly": true
        });
        layout
            .update_properties("name", patch.as_object().unwrap())
            .unwrap();
        let props = &layout.components["name"].properties;
        assert_eq!(props["textResourceBindings"]["title"], "name.title");
        assert!(!props.contains_key("required"));
        assert_eq!(props["readOnly"], true);

        let patch = json!({ "textResourceBindings": { "description": "d" } });
        layout
            .update_properties("name", patch.as_object().unwrap())
            .unwrap();
        let bindings = &layout.components["name"].properties["textResourceBindings"];
        assert_eq!(bindings["title"], "name.title");
        assert_eq!(bindings["description"], "d");
    }

    #[test]
    fn update_properties_rejects_identity_changes() {
        let mut layout = layout_with_group();
        let patch = json!({ "type": "TextArea" });
        assert_eq!(
            layout.update_properties("name", patch.as_object().unwrap()),
            Err(LayoutError::ImmutableProperty("type".to_string()))
        );
    }

    #[test]
    fn validate_detects_dangling_order_reference() {
        let mut layout = layout_with_group();
        layout
            .order
            .get_mut(BASE_CONTAINER_ID)
            .unwrap()
            .push("ghost".to_string());
        assert!(matches!(
            layout.validate(),
            Err(LayoutError::InvariantViolation(_))
        ));
    }

    #[test]
    fn generated_ids_carry_the_kind() {
        let id = generate_component_id(ComponentType::Input);
        assert!(id.starts_with("Input-"));
        assert_eq!(id.len(), "Input-".len() + 6);
    }
}
