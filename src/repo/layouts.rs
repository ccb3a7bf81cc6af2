use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use super::{json_file_stems, read_json, write_json, EditingContext, Repository};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{LayoutSetConfig, LayoutSets};
use crate::validation::{ensure_file_name, LayoutSetName};

const UI_DIR: &str = "App/ui";
const LAYOUTS_DIR: &str = "layouts";
const SETTINGS_FILE: &str = "Settings.json";
const LAYOUT_SETS_FILE: &str = "layout-sets.json";
const APP_METADATA_FILE: &str = "App/config/applicationmetadata.json";
const DEFAULT_TASK: &str = "Task_1";

pub const LAYOUT_SETTINGS_SCHEMA_URL: &str =
    "https://altinncdn.no/schemas/json/layout/layoutSettings.schema.v1.json";

/// Files that move into the set folder when an app starts using layout sets.
const SET_SCOPED_FILES: [&str; 3] = [SETTINGS_FILE, "RuleHandler.js", "RuleConfiguration.json"];

impl Repository {
    pub fn uses_layout_sets(&self, ctx: &EditingContext) -> ServiceResult<bool> {
        Ok(self.layout_sets_path(&self.clone_dir(ctx)?).is_file())
    }

    pub fn get_layout_sets(&self, ctx: &EditingContext) -> ServiceResult<LayoutSets> {
        let clone = self.clone_dir(ctx)?;
        read_json(&self.layout_sets_path(&clone), "Layout-sets.json")
    }

    /// Folder holding the ui files for the requested layout set.
    ///
    /// Apps without layout sets ignore `layout_set` and use `App/ui`. Apps with
    /// layout sets require a configured set name.
    pub(super) fn ui_dir(
        &self,
        ctx: &EditingContext,
        layout_set: Option<&LayoutSetName>,
    ) -> ServiceResult<PathBuf> {
        let clone = self.clone_dir(ctx)?;
        let ui = clone.join(UI_DIR);
        let sets_path = self.layout_sets_path(&clone);
        if !sets_path.is_file() {
            return Ok(ui);
        }

        let Some(name) = layout_set else {
            return Err(ServiceError::bad_request(
                "This app uses layout sets, but no layout set name was provided for this request",
            ));
        };
        let sets: LayoutSets = read_json(&sets_path, "Layout-sets.json")?;
        if sets.get(name.as_str()).is_none() {
            return Err(ServiceError::not_found(format!(
                "Layout set {name} not found"
            )));
        }
        Ok(ui.join(name.as_str()))
    }

    fn layout_sets_path(&self, clone: &Path) -> PathBuf {
        clone.join(UI_DIR).join(LAYOUT_SETS_FILE)
    }

    // ============================================================
    // Layouts
    // ============================================================

    /// All layouts of a layout set, keyed by layout name.
    pub fn get_form_layouts(
        &self,
        ctx: &EditingContext,
        layout_set: Option<&LayoutSetName>,
    ) -> ServiceResult<BTreeMap<String, Value>> {
        let dir = self.ui_dir(ctx, layout_set)?.join(LAYOUTS_DIR);
        let mut layouts = BTreeMap::new();
        if !dir.is_dir() {
            return Ok(layouts);
        }
        for name in json_file_stems(&dir)? {
            let layout = read_json(&dir.join(format!("{name}.json")), "Layout")?;
            layouts.insert(name, layout);
        }
        tracing::debug!("Read {} layouts for {}/{}", layouts.len(), ctx.org, ctx.repo);
        Ok(layouts)
    }

    pub fn get_form_layout(
        &self,
        ctx: &EditingContext,
        layout_set: Option<&LayoutSetName>,
        name: &str,
    ) -> ServiceResult<Value> {
        ensure_file_name("Layout", name)?;
        let path = self.layout_path(ctx, layout_set, name)?;
        read_json(&path, &format!("Layout {name}"))
    }

    /// Write a layout, adding it to the page order when it is new.
    pub fn save_form_layout(
        &self,
        ctx: &EditingContext,
        layout_set: Option<&LayoutSetName>,
        name: &str,
        layout: &Value,
    ) -> ServiceResult<()> {
        ensure_file_name("Layout", name)?;
        let path = self.layout_path(ctx, layout_set, name)?;
        let is_new = !path.is_file();
        write_json(&path, layout)?;
        tracing::info!("Saved layout {} in {}/{}", name, ctx.org, ctx.repo);

        if is_new {
            let mut settings = self.get_layout_settings(ctx, layout_set)?;
            if add_to_page_order(&mut settings, name) {
                self.save_layout_settings(ctx, layout_set, &settings)?;
            }
        }
        Ok(())
    }

    pub fn delete_form_layout(
        &self,
        ctx: &EditingContext,
        layout_set: Option<&LayoutSetName>,
        name: &str,
    ) -> ServiceResult<()> {
        ensure_file_name("Layout", name)?;
        let path = self.layout_path(ctx, layout_set, name)?;
        if !path.is_file() {
            return Err(ServiceError::not_found(format!("Layout {name} not found")));
        }
        std::fs::remove_file(&path)?;
        tracing::info!("Deleted layout {} in {}/{}", name, ctx.org, ctx.repo);

        let mut settings = self.get_layout_settings(ctx, layout_set)?;
        if remove_from_page_order(&mut settings, name) {
            self.save_layout_settings(ctx, layout_set, &settings)?;
        }
        Ok(())
    }

    pub fn rename_form_layout(
        &self,
        ctx: &EditingContext,
        layout_set: Option<&LayoutSetName>,
        name: &str,
        new_name: &str,
    ) -> ServiceResult<()> {
        ensure_file_name("Layout", name)?;
        ensure_file_name("Layout", new_name)?;
        let from = self.layout_path(ctx, layout_set, name)?;
        let to = self.layout_path(ctx, layout_set, new_name)?;
        if !from.is_file() {
            return Err(ServiceError::not_found(format!("Layout {name} not found")));
        }
        if name == new_name {
            return Ok(());
        }
        if to.exists() {
            return Err(ServiceError::bad_request(format!(
                "Layout {new_name} already exists"
            )));
        }
        std::fs::rename(&from, &to)?;
        tracing::info!("Renamed layout {} to {} in {}/{}", name, new_name, ctx.org, ctx.repo);

        let mut settings = self.get_layout_settings(ctx, layout_set)?;
        if rename_in_page_order(&mut settings, name, new_name) {
            self.save_layout_settings(ctx, layout_set, &settings)?;
        }
        Ok(())
    }

    fn layout_path(
        &self,
        ctx: &EditingContext,
        layout_set: Option<&LayoutSetName>,
        name: &str,
    ) -> ServiceResult<PathBuf> {
        Ok(self
            .ui_dir(ctx, layout_set)?
            .join(LAYOUTS_DIR)
            .join(format!("{name}.json")))
    }

    // ============================================================
    // Layout settings
    // ============================================================

    /// Read `Settings.json`, creating it with the current layouts as page order
    /// when it does not exist yet.
    pub fn get_layout_settings(
        &self,
        ctx: &EditingContext,
        layout_set: Option<&LayoutSetName>,
    ) -> ServiceResult<Value> {
        let ui = self.ui_dir(ctx, layout_set)?;
        let path = ui.join(SETTINGS_FILE);
        if path.is_file() {
            return read_json(&path, "Layout settings");
        }

        let layouts_dir = ui.join(LAYOUTS_DIR);
        let order = if layouts_dir.is_dir() {
            json_file_stems(&layouts_dir)?
        } else {
            Vec::new()
        };
        let settings = json!({
            "$schema": LAYOUT_SETTINGS_SCHEMA_URL,
            "pages": { "order": order },
        });
        write_json(&path, &settings)?;
        tracing::info!("Created default layout settings for {}/{}", ctx.org, ctx.repo);
        Ok(settings)
    }

    pub fn save_layout_settings(
        &self,
        ctx: &EditingContext,
        layout_set: Option<&LayoutSetName>,
        settings: &Value,
    ) -> ServiceResult<()> {
        let path = self.ui_dir(ctx, layout_set)?.join(SETTINGS_FILE);
        write_json(&path, settings)
    }

    // ============================================================
    // Layout sets
    // ============================================================

    /// Turn an app without layout sets into one with a single set named `name`.
    ///
    /// Existing layouts, settings and rule files move into the set folder.
    pub fn configure_layout_set(
        &self,
        ctx: &EditingContext,
        name: &LayoutSetName,
    ) -> ServiceResult<LayoutSets> {
        let clone = self.clone_dir(ctx)?;
        let sets_path = self.layout_sets_path(&clone);
        if sets_path.is_file() {
            return Err(ServiceError::bad_request(
                "Layout sets are already configured for this app",
            ));
        }

        let ui = clone.join(UI_DIR);
        let set_dir = ui.join(name.as_str());
        std::fs::create_dir_all(&set_dir)?;

        let layouts = ui.join(LAYOUTS_DIR);
        if layouts.is_dir() {
            std::fs::rename(&layouts, set_dir.join(LAYOUTS_DIR))?;
        } else {
            std::fs::create_dir_all(set_dir.join(LAYOUTS_DIR))?;
        }
        for file in SET_SCOPED_FILES {
            let from = ui.join(file);
            if from.is_file() {
                std::fs::rename(&from, set_dir.join(file))?;
            }
        }

        let sets = LayoutSets::new(vec![LayoutSetConfig {
            id: name.to_string(),
            data_type: app_logic_data_type(&clone),
            tasks: Some(vec![DEFAULT_TASK.to_string()]),
            ..Default::default()
        }]);
        write_json(&sets_path, &sets)?;
        tracing::info!("Configured layout set {} for {}/{}", name, ctx.org, ctx.repo);
        Ok(sets)
    }

    pub fn add_layout_set(
        &self,
        ctx: &EditingContext,
        config: LayoutSetConfig,
    ) -> ServiceResult<LayoutSets> {
        let name = LayoutSetName::parse(config.id.clone())?;
        let clone = self.clone_dir(ctx)?;
        let sets_path = self.layout_sets_path(&clone);
        let mut sets: LayoutSets = read_json(&sets_path, "Layout-sets.json")?;
        if sets.get(name.as_str()).is_some() {
            return Err(ServiceError::bad_request(format!(
                "Layout set {name} already exists"
            )));
        }

        sets.sets.push(config);
        write_json(&sets_path, &sets)?;
        std::fs::create_dir_all(clone.join(UI_DIR).join(name.as_str()).join(LAYOUTS_DIR))?;
        tracing::info!("Added layout set {} to {}/{}", name, ctx.org, ctx.repo);
        Ok(sets)
    }
}

/// Id of the data type the app's own logic binds to, if any.
fn app_logic_data_type(clone: &Path) -> Option<String> {
    let text = std::fs::read_to_string(clone.join(APP_METADATA_FILE)).ok()?;
    let metadata: Value = serde_json::from_str(&text).ok()?;
    metadata
        .get("dataTypes")?
        .as_array()?
        .iter()
        .find(|data_type| data_type.get("appLogic").is_some_and(|v| !v.is_null()))
        .and_then(|data_type| data_type.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn page_order(settings: &mut Value) -> Option<&mut Vec<Value>> {
    let root = settings.as_object_mut()?;
    let pages = root
        .entry("pages")
        .or_insert_with(|| json!({}))
        .as_object_mut()?;
    pages
        .entry("order")
        .or_insert_with(|| json!([]))
        .as_array_mut()
}

/// Returns whether the settings changed.
fn add_to_page_order(settings: &mut Value, name: &str) -> bool {
    match page_order(settings) {
        Some(order) if !order.iter().any(|v| v == name) => {
            order.push(Value::String(name.to_string()));
            true
        }
        _ => false,
    }
}

fn remove_from_page_order(settings: &mut Value, name: &str) -> bool {
    let Some(order) = page_order(settings) else {
        return false;
    };
    let before = order.len();
    order.retain(|v| v != name);
    order.len() != before
}

fn rename_in_page_order(settings: &mut Value, name: &str, new_name: &str) -> bool {
    let Some(order) = page_order(settings) else {
        return false;
    };
    let mut changed = false;
    for entry in order.iter_mut().filter(|v| *v == name) {
        *entry = Value::String(new_name.to_string());
        changed = true;
    }
    changed
}
