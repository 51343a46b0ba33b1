//! `rollout.toml` schema.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::deploy::report::LogGroupMarkers;
use crate::runtime::CommandSpec;
use crate::types::DeploymentMode;

use super::options::DeployOptions;

/// Root of a `rollout.toml` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RolloutConfig {
    #[serde(default)]
    pub deploy: DeploySection,

    #[serde(default)]
    pub commands: CommandsSection,
}

/// `[deploy]` table. Every field is optional so layers can be merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploySection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<DeploymentMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_tests: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_if_installed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_minutes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_promoted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_on_failure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_manifest: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_groups: Option<LogGroupMarkers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<PathBuf>,
}

/// `[commands]` table: external programs backing the collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_unlocked: Option<CommandSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_source: Option<CommandSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_data: Option<CommandSpec>,
    /// Prints the installed artifacts of `{target}` as JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed: Option<CommandSpec>,
    /// Exits 0 when `{target}` is a sandbox
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<CommandSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<CommandSpec>,
    /// Directory test commands write coverage reports into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_output_dir: Option<PathBuf>,
}

impl RolloutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(threshold) = self.deploy.coverage_threshold {
            if !(0.0..=100.0).contains(&threshold) {
                anyhow::bail!(
                    "coverage_threshold must be between 0 and 100, got {}",
                    threshold
                );
            }
        }
        if let Some(target) = &self.deploy.target {
            if target.trim().is_empty() {
                anyhow::bail!("target must not be empty");
            }
        }
        for (name, spec) in self.commands.named() {
            if spec.program.trim().is_empty() {
                anyhow::bail!("commands.{} has an empty program", name);
            }
        }
        Ok(())
    }
}

impl CommandsSection {
    /// Configured commands with their table keys.
    pub fn named(&self) -> Vec<(&'static str, &CommandSpec)> {
        [
            ("install_unlocked", self.install_unlocked.as_ref()),
            ("install_source", self.install_source.as_ref()),
            ("install_data", self.install_data.as_ref()),
            ("installed", self.installed.as_ref()),
            ("sandbox", self.sandbox.as_ref()),
            ("test", self.test.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, spec)| spec.map(|s| (name, s)))
        .collect()
    }
}

impl DeploySection {
    /// Build run options. `target` and `artifact_dir` must be set.
    pub fn to_options(&self) -> anyhow::Result<DeployOptions> {
        let target = self
            .target
            .clone()
            .ok_or_else(|| anyhow::anyhow!("No target configured. Pass --target or set deploy.target"))?;
        let artifact_dir = self.artifact_dir.clone().ok_or_else(|| {
            anyhow::anyhow!("No artifact directory configured. Pass --artifact-dir or set deploy.artifact_dir")
        })?;

        let mut options = DeployOptions::new(target, artifact_dir);
        if let Some(mode) = self.mode {
            options = options.with_mode(mode);
        }
        if let Some(run_tests) = self.run_tests {
            options = options.with_run_tests(run_tests);
        }
        if let Some(skip) = self.skip_if_installed {
            options = options.with_skip_if_installed(skip);
        }
        if let Some(threshold) = self.coverage_threshold {
            options = options.with_coverage_threshold(threshold);
        }
        if let Some(wait) = self.wait_minutes {
            options = options.with_wait_minutes(wait);
        }
        if let Some(stage) = &self.stage {
            options = options.with_stage(stage.clone());
        }
        if let Some(baseline) = &self.baseline {
            options = options.with_baseline(baseline.clone());
        }
        if let Some(check) = self.check_promoted {
            options = options.with_check_promoted(check);
        }
        if let Some(retry) = self.retry_on_failure {
            options = options.with_retry_on_failure(retry);
        }
        if let Some(secs) = self.retry_delay_secs {
            options = options.with_retry_delay(Duration::from_secs(secs));
        }
        if let Some(path) = &self.project_manifest {
            options = options.with_project_manifest(path.clone());
        }
        if let Some(markers) = &self.log_groups {
            options = options.with_log_groups(markers.clone());
        }
        if let Some(dir) = &self.staging_dir {
            options = options.with_staging_dir(dir.clone());
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_options_requires_target() {
        let section = DeploySection {
            artifact_dir: Some(PathBuf::from("artifacts")),
            ..Default::default()
        };
        let err = section.to_options().unwrap_err();
        assert!(err.to_string().contains("No target configured"));
    }

    #[test]
    fn to_options_applies_set_fields() {
        let section = DeploySection {
            target: Some("qa".to_string()),
            artifact_dir: Some(PathBuf::from("artifacts")),
            mode: Some(DeploymentMode::SourcePackagesOnly),
            retry_on_failure: Some(true),
            retry_delay_secs: Some(0),
            ..Default::default()
        };
        let options = section.to_options().unwrap();
        assert_eq!(options.target, "qa");
        assert_eq!(options.mode, DeploymentMode::SourcePackagesOnly);
        assert!(options.retry_on_failure);
        assert_eq!(options.retry_delay, Duration::ZERO);
        assert!(!options.run_tests);
    }

    #[test]
    fn validate_rejects_out_of_range_threshold() {
        let mut config = RolloutConfig::new();
        config.deploy.coverage_threshold = Some(120.0);
        assert!(config.validate().is_err());
    }
}
