use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use super::{EditError, EditTarget, SaveSink};
use crate::error::ServiceResult;
use crate::layout::{convert_external_layouts, convert_internal_to_external};
use crate::models::InternalLayout;
use crate::repo::{EditingContext, Repository};
use crate::validation::LayoutSetName;

/// The layouts of one layout set, loaded for editing by one developer.
///
/// Cloning is cheap and every clone edits the same layouts.
#[derive(Clone)]
pub struct EditorContext {
    inner: Arc<Inner>,
}

struct Inner {
    repo: Repository,
    ctx: EditingContext,
    layout_set: Option<LayoutSetName>,
    layouts: Mutex<BTreeMap<String, InternalLayout>>,
    invalid_layouts: Vec<String>,
}

impl EditorContext {
    /// Read and convert every layout of the layout set.
    pub fn load(
        repo: Repository,
        ctx: EditingContext,
        layout_set: Option<LayoutSetName>,
    ) -> ServiceResult<Self> {
        let external = repo.get_form_layouts(&ctx, layout_set.as_ref())?;
        let converted = convert_external_layouts(&external);
        tracing::debug!(
            "Loaded {} layouts for {}/{} ({} invalid)",
            converted.converted_layouts.len(),
            ctx.org,
            ctx.repo,
            converted.invalid_layouts.len()
        );
        Ok(Self {
            inner: Arc::new(Inner {
                repo,
                ctx,
                layout_set,
                layouts: Mutex::new(converted.converted_layouts),
                invalid_layouts: converted.invalid_layouts,
            }),
        })
    }

    pub fn layout(&self, name: &str) -> Option<InternalLayout> {
        let layouts = self.inner.layouts.lock().expect("layouts lock poisoned");
        layouts.get(name).cloned()
    }

    pub fn layout_names(&self) -> Vec<String> {
        let layouts = self.inner.layouts.lock().expect("layouts lock poisoned");
        layouts.keys().cloned().collect()
    }

    /// Layouts that lost entries during conversion. These are read-only.
    pub fn invalid_layouts(&self) -> &[String] {
        &self.inner.invalid_layouts
    }

    /// Update an item's properties and write its layout back to the working copy.
    ///
    /// The in-memory layout is only changed when the write succeeds. Layouts
    /// listed in [`invalid_layouts`](Self::invalid_layouts) are refused, since
    /// writing them back would drop the entries the conversion discarded.
    pub fn apply_patch(
        &self,
        target: &EditTarget,
        patch: &Map<String, Value>,
    ) -> Result<(), EditError> {
        let inner = &self.inner;
        if inner.invalid_layouts.contains(&target.layout) {
            return Err(EditError::InvalidLayout(target.layout.clone()));
        }

        let mut layouts = inner.layouts.lock().expect("layouts lock poisoned");
        let current = layouts
            .get(&target.layout)
            .ok_or_else(|| EditError::LayoutNotLoaded(target.layout.clone()))?;

        let mut updated = current.clone();
        updated.update_properties(&target.item, patch)?;
        let document = serde_json::to_value(convert_internal_to_external(&updated))?;
        inner.repo.save_form_layout(
            &inner.ctx,
            inner.layout_set.as_ref(),
            &target.layout,
            &document,
        )?;

        layouts.insert(target.layout.clone(), updated);
        tracing::info!(
            "Updated {} in layout {} of {}/{}",
            target.item,
            target.layout,
            inner.ctx.org,
            inner.ctx.repo
        );
        Ok(())
    }
}

impl SaveSink for EditorContext {
    /// Runs the write on the blocking pool so file I/O never stalls the runtime.
    async fn save(&self, target: &EditTarget, patch: Map<String, Value>) -> Result<(), EditError> {
        let context = self.clone();
        let target = target.clone();
        tokio::task::spawn_blocking(move || context.apply_patch(&target, &patch)).await?
    }
}
