//! Service layer over each developer's working copy of an app repository.
//!
//! Every operation is scoped by an [`EditingContext`] and reads or writes plain
//! files below `<root>/<developer>/<org>/<repo>/`. Cloning, committing and
//! pushing happen elsewhere; this layer only requires that the clone exists.
//! Writes are last-writer-wins.

mod app_info;
mod layouts;
mod resources;
mod rules;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{ServiceError, ServiceResult};

pub use resources::{resource_repository_name, validate_resource};

/// Who is editing which repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditingContext {
    pub org: String,
    pub repo: String,
    pub developer: String,
}

impl EditingContext {
    pub fn new(
        org: impl Into<String>,
        repo: impl Into<String>,
        developer: impl Into<String>,
    ) -> Self {
        Self {
            org: org.into(),
            repo: repo.into(),
            developer: developer.into(),
        }
    }
}

/// Handle to the directory holding every developer's working copies.
#[derive(Debug, Clone)]
pub struct Repository {
    root: Arc<PathBuf>,
}

impl Repository {
    pub fn open(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root: Arc::new(root),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "studio-designer")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Self::open(dirs.data_dir().join("repos"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the working copy, whether or not it exists.
    pub fn clone_path(&self, ctx: &EditingContext) -> PathBuf {
        self.root
            .join(&ctx.developer)
            .join(&ctx.org)
            .join(&ctx.repo)
    }

    /// Path of the working copy, failing with `NotFound` when it has not been cloned.
    fn clone_dir(&self, ctx: &EditingContext) -> ServiceResult<PathBuf> {
        let path = self.clone_path(ctx);
        if path.is_dir() {
            Ok(path)
        } else {
            Err(ServiceError::not_found(format!(
                "Repository {}/{} is not cloned for {}",
                ctx.org, ctx.repo, ctx.developer
            )))
        }
    }
}

fn read_text(path: &Path, what: &str) -> ServiceResult<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ServiceError::not_found(format!("{what} not found")))
        }
        Err(e) => Err(e.into()),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> ServiceResult<T> {
    let text = read_text(path, what)?;
    Ok(serde_json::from_str(&text)?)
}

fn write_text(path: &Path, contents: &str) -> ServiceResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> ServiceResult<()> {
    let text = serde_json::to_string_pretty(value)?;
    write_text(path, &text)
}

/// Stems of the `*.json` files directly inside `dir`, sorted.
fn json_file_stems(dir: &Path) -> ServiceResult<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
