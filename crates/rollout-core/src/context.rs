//! Application context for unified dependency injection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{CommandsSection, ConfigStore, DeployOptions, RolloutConfig};
use crate::deploy::Collaborators;
use crate::runtime::{
    CommandInstaller, CommandTargetInspector, CommandTestRunner, JsonCoverageReader,
};

/// Paths and services shared by every command.
///
/// The CLI creates this once and derives config, options and collaborators
/// from it.
#[derive(Debug, Clone)]
pub struct AppContext {
    project_root: PathBuf,
    state_dir: PathBuf,
    global_config_dir: PathBuf,
}

impl AppContext {
    /// Create a new context with explicit paths.
    pub fn new(project_root: PathBuf, state_dir: PathBuf) -> Self {
        let global_config_dir = dirs::config_dir()
            .map(|p| p.join("rollout"))
            .unwrap_or_else(|| project_root.join(".config").join("rollout"));

        Self {
            project_root,
            state_dir,
            global_config_dir,
        }
    }

    /// Create context with custom global config directory (for testing).
    pub fn with_global_config_dir(
        project_root: PathBuf,
        state_dir: PathBuf,
        global_config_dir: PathBuf,
    ) -> Self {
        Self {
            project_root,
            state_dir,
            global_config_dir,
        }
    }

    /// Context for the current directory, with state under `.rollout/`.
    pub fn from_current_dir() -> anyhow::Result<Self> {
        let project_root = std::env::current_dir()?;
        let state_dir = project_root.join(".rollout");
        Ok(Self::new(project_root, state_dir))
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Get a ConfigStore reading the global and project layers.
    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::from_paths(self.global_config_dir.clone(), self.project_root.clone())
    }

    /// Where zipped artifacts are extracted.
    pub fn staging_dir(&self) -> PathBuf {
        self.state_dir.join("staging")
    }

    /// Default directory test commands write their results into.
    pub fn test_output_dir(&self) -> PathBuf {
        self.state_dir.join("test-results")
    }

    /// Run options from merged config, staging under the state dir unless set.
    pub fn deploy_options(&self, config: &RolloutConfig) -> anyhow::Result<DeployOptions> {
        let mut options = config.deploy.to_options()?;
        if options.staging_dir.is_none() {
            options = options.with_staging_dir(self.staging_dir());
        }
        Ok(options)
    }

    /// Command-backed collaborators for the `[commands]` table.
    pub fn collaborators(&self, commands: &CommandsSection) -> Collaborators {
        let output_dir = commands
            .test_output_dir
            .clone()
            .unwrap_or_else(|| self.test_output_dir());

        Collaborators {
            installer: Arc::new(CommandInstaller::new(
                commands.install_unlocked.clone(),
                commands.install_source.clone(),
                commands.install_data.clone(),
            )),
            inspector: Arc::new(CommandTargetInspector::new(
                commands.installed.clone(),
                commands.sandbox.clone(),
            )),
            test_runner: Arc::new(CommandTestRunner::new(commands.test.clone(), output_dir.clone())),
            coverage: Arc::new(JsonCoverageReader::new(output_dir)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConfigScope;

    #[test]
    fn derived_paths_live_under_state_dir() {
        let ctx = AppContext::with_global_config_dir(
            PathBuf::from("/project"),
            PathBuf::from("/project/.rollout"),
            PathBuf::from("/config/rollout"),
        );
        assert_eq!(ctx.staging_dir(), PathBuf::from("/project/.rollout/staging"));
        assert_eq!(
            ctx.config_store().config_path(ConfigScope::Global),
            Path::new("/config/rollout/rollout.toml")
        );
        assert_eq!(
            ctx.config_store().config_path(ConfigScope::Project),
            Path::new("/project/rollout.toml")
        );
    }

    #[test]
    fn deploy_options_default_staging_dir() {
        let ctx = AppContext::with_global_config_dir(
            PathBuf::from("/project"),
            PathBuf::from("/state"),
            PathBuf::from("/config"),
        );
        let mut config = RolloutConfig::new();
        config.deploy.target = Some("qa".to_string());
        config.deploy.artifact_dir = Some(PathBuf::from("artifacts"));

        let options = ctx.deploy_options(&config).unwrap();
        assert_eq!(options.staging_dir(), PathBuf::from("/state/staging"));
    }
}
