//! Config store for loading layered rollout.toml files.

use std::path::{Path, PathBuf};

use crate::types::ConfigScope;

use super::{RolloutConfig, merge::merge_configs, parser, paths::config_path_for_scope};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    global_path: PathBuf,
    project_path: PathBuf,
}

impl ConfigStore {
    pub fn from_paths(global_dir: PathBuf, project_root: PathBuf) -> Self {
        Self {
            global_path: config_path_for_scope(ConfigScope::Global, &global_dir, &project_root),
            project_path: config_path_for_scope(ConfigScope::Project, &global_dir, &project_root),
        }
    }

    /// Store reading a single explicit file as the project layer.
    pub fn with_project_file(mut self, path: PathBuf) -> Self {
        self.project_path = path;
        self
    }

    pub fn config_path(&self, scope: ConfigScope) -> &Path {
        match scope {
            ConfigScope::Global => &self.global_path,
            ConfigScope::Project => &self.project_path,
        }
    }

    /// Load one scope. A missing file yields `None`.
    pub fn load_scope(&self, scope: ConfigScope) -> anyhow::Result<Option<RolloutConfig>> {
        let path = self.config_path(scope);
        if !path.exists() {
            return Ok(None);
        }
        parser::parse_rollout_toml(path).map(Some)
    }

    /// Load and merge both scopes.
    pub fn load(&self) -> anyhow::Result<RolloutConfig> {
        let global = self.load_scope(ConfigScope::Global)?;
        let project = self.load_scope(ConfigScope::Project)?;
        tracing::debug!(
            "Loaded config (global: {}, project: {})",
            global.is_some(),
            project.is_some()
        );
        Ok(merge_configs(global, project))
    }
}
