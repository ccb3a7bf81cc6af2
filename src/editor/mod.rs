//! Debounced property editing.
//!
//! Each `(item, field group)` pair moves through
//! `Idle -> Editing -> SavePending -> Saved | Error`. Edits to the same group
//! within the debounce window are merged and saved once; the last edit wins.
//! Groups never wait on each other.

mod context;

pub use context::EditorContext;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::ServiceError;
use crate::layout::LayoutError;

/// Default delay between the last edit of a group and its save.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum EditError {
    #[error("layout {0} is not loaded")]
    LayoutNotLoaded(String),

    #[error("layout {0} was not converted completely and cannot be edited")]
    InvalidLayout(String),

    #[error("save task failed: {0}")]
    Interrupted(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl From<serde_json::Error> for EditError {
    fn from(e: serde_json::Error) -> Self {
        EditError::Service(e.into())
    }
}

/// Save state of one field group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SaveState {
    Idle,
    Editing,
    SavePending,
    Saved { at: DateTime<Utc> },
    Error { message: String },
}

impl SaveState {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveState::Saved { .. })
    }
}

/// The component or container being edited.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EditTarget {
    pub layout: String,
    pub item: String,
}

impl EditTarget {
    pub fn new(layout: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            layout: layout.into(),
            item: item.into(),
        }
    }
}

/// Where accumulated patches are persisted.
pub trait SaveSink: Send + Sync + 'static {
    fn save(
        &self,
        target: &EditTarget,
        patch: Map<String, Value>,
    ) -> impl Future<Output = Result<(), EditError>> + Send;
}

type GroupKey = (EditTarget, String);

#[derive(Debug)]
struct GroupState {
    state: SaveState,
    generation: u64,
    pending: Map<String, Value>,
}

impl Default for GroupState {
    fn default() -> Self {
        Self {
            state: SaveState::Idle,
            generation: 0,
            pending: Map::new(),
        }
    }
}

pub struct PropertyEditor<S> {
    sink: Arc<S>,
    debounce: Duration,
    groups: Arc<Mutex<HashMap<GroupKey, GroupState>>>,
}

impl<S> Clone for PropertyEditor<S> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            debounce: self.debounce,
            groups: Arc::clone(&self.groups),
        }
    }
}

impl<S: SaveSink> PropertyEditor<S> {
    pub fn new(sink: Arc<S>) -> Self {
        Self::with_debounce(sink, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(sink: Arc<S>, debounce: Duration) -> Self {
        Self {
            sink,
            debounce,
            groups: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    /// Record an edit and (re)arm the group's save timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn edit(&self, target: EditTarget, group: impl Into<String>, patch: Map<String, Value>) {
        let key = (target, group.into());
        let generation = {
            let mut groups = self.groups.lock().expect("editor lock poisoned");
            let entry = groups.entry(key.clone()).or_default();
            entry.pending.extend(patch);
            entry.generation += 1;
            entry.state = SaveState::Editing;
            entry.generation
        };

        let editor = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(editor.debounce).await;
            editor.save_if_current(key, generation).await;
        });
    }

    pub fn state(&self, target: &EditTarget, group: &str) -> SaveState {
        let groups = self.groups.lock().expect("editor lock poisoned");
        groups
            .get(&(target.clone(), group.to_string()))
            .map(|g| g.state.clone())
            .unwrap_or(SaveState::Idle)
    }

    /// Save every group with unsaved edits now, without waiting for its timer.
    pub async fn flush(&self) {
        let due: Vec<(GroupKey, u64)> = {
            let mut groups = self.groups.lock().expect("editor lock poisoned");
            groups
                .iter_mut()
                .filter(|(_, g)| !g.pending.is_empty())
                .map(|(key, g)| {
                    g.generation += 1;
                    (key.clone(), g.generation)
                })
                .collect()
        };
        for (key, generation) in due {
            self.save_if_current(key, generation).await;
        }
    }

    async fn save_if_current(&self, key: GroupKey, generation: u64) {
        let patch = {
            let mut groups = self.groups.lock().expect("editor lock poisoned");
            let Some(group) = groups.get_mut(&key) else {
                return;
            };
            if group.generation != generation {
                return;
            }
            group.state = SaveState::SavePending;
            std::mem::take(&mut group.pending)
        };

        let (target, group_name) = &key;
        tracing::debug!(
            "Saving {} properties of {}/{} ({})",
            patch.len(),
            target.layout,
            target.item,
            group_name
        );
        let result = self.sink.save(target, patch.clone()).await;

        let mut groups = self.groups.lock().expect("editor lock poisoned");
        let Some(group) = groups.get_mut(&key) else {
            return;
        };
        if let Err(e) = &result {
            tracing::warn!("Saving {}/{} failed: {}", target.layout, target.item, e);
            // Keep failed values for the next attempt unless they were edited again.
            for (field, value) in patch {
                group.pending.entry(field).or_insert(value);
            }
        }
        if group.generation == generation {
            group.state = match result {
                Ok(()) => SaveState::Saved { at: Utc::now() },
                Err(e) => SaveState::Error {
                    message: e.to_string(),
                },
            };
        }
    }
}
