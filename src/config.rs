//! Server configuration from the environment, with command-line overrides.

use std::path::PathBuf;

use anyhow::Result;

use crate::api::middleware::SecurityConfig;
use crate::repo::Repository;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct DesignerConfig {
    pub port: u16,
    /// Directory holding the working copies (from DESIGNER_REPOSITORY_ROOT).
    /// Falls back to the platform data directory when unset.
    pub repository_root: Option<PathBuf>,
    pub security: SecurityConfig,
}

impl DesignerConfig {
    pub fn from_env() -> Self {
        Self {
            port: DEFAULT_PORT,
            repository_root: std::env::var_os("DESIGNER_REPOSITORY_ROOT").map(PathBuf::from),
            security: SecurityConfig::from_env(),
        }
    }

    /// Apply command-line values; anything not given keeps its current value.
    pub fn with_overrides(mut self, port: Option<u16>, repos: Option<PathBuf>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        if repos.is_some() {
            self.repository_root = repos;
        }
        self
    }

    pub fn bind_address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    pub fn open_repository(&self) -> Result<Repository> {
        match &self.repository_root {
            Some(root) => Repository::open(root.clone()),
            None => Repository::open_default(),
        }
    }
}
