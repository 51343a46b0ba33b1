//! Release manifest: the ordered package declarations of a project.
//!
//! Manifest order is install order. It encodes the dependency order chosen by
//! the release engineer and is never re-sorted.

pub mod validation;

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::deploy::targeting::{self, TargetingPolicy};
use crate::error::DeployError;
use crate::types::PackageKind;

pub use validation::validate_build_numbers;

/// Release manifest document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub package_directories: Vec<PackageDescriptor>,
}

/// One package declaration with its install-time policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PackageDescriptor {
    pub package: String,

    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub version_number: Option<String>,

    /// Declared kind; absent means unlocked
    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    /// Install even when the baseline already has this version
    #[serde(default)]
    pub always_deploy: bool,

    /// Pipeline stages on which this package is not deployed
    #[serde(default)]
    pub ignore_on_stage: Vec<String>,

    /// Target blacklist
    #[serde(default, alias = "skipDeployOnTargets", deserialize_with = "targeting::target_list")]
    pub skip_deploy_on_orgs: Option<Vec<String>>,

    /// Target whitelist; takes precedence over the blacklist
    #[serde(default, deserialize_with = "targeting::target_list")]
    pub deploy_on_targets: Option<Vec<String>>,

    #[serde(default)]
    pub skip_testing: bool,

    #[serde(default)]
    pub skip_coverage_validation: bool,

    /// Allow a source package to opt out of optimized deployment
    #[serde(default)]
    pub is_optimized_deployment: Option<bool>,
}

impl PackageDescriptor {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            path: None,
            version_number: None,
            kind: None,
            always_deploy: false,
            ignore_on_stage: Vec::new(),
            skip_deploy_on_orgs: None,
            deploy_on_targets: None,
            skip_testing: false,
            skip_coverage_validation: false,
            is_optimized_deployment: None,
        }
    }

    pub fn with_always_deploy(mut self, always_deploy: bool) -> Self {
        self.always_deploy = always_deploy;
        self
    }

    pub fn with_ignore_on_stage<I, S>(mut self, stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_on_stage = stages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_skip_deploy_on<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_deploy_on_orgs = Some(targets.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_deploy_on<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deploy_on_targets = Some(targets.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_skip_testing(mut self, skip: bool) -> Self {
        self.skip_testing = skip;
        self
    }

    pub fn with_skip_coverage_validation(mut self, skip: bool) -> Self {
        self.skip_coverage_validation = skip;
        self
    }

    pub fn with_optimized_deployment(mut self, optimized: bool) -> Self {
        self.is_optimized_deployment = Some(optimized);
        self
    }

    /// Declared kind, defaulting to unlocked.
    pub fn declared_kind(&self) -> Result<PackageKind, DeployError> {
        match &self.kind {
            Some(kind) => kind.parse(),
            None => Ok(PackageKind::Unlocked),
        }
    }

    pub fn targeting(&self) -> TargetingPolicy {
        TargetingPolicy::new(
            self.deploy_on_targets.clone(),
            self.skip_deploy_on_orgs.clone(),
        )
    }

    /// True if this package is excluded on the given stage (case-insensitive).
    pub fn is_ignored_on_stage(&self, stage: &str) -> bool {
        self.ignore_on_stage
            .iter()
            .any(|s| s.eq_ignore_ascii_case(stage))
    }

    /// Optimized deployment is on unless the descriptor disables it.
    pub fn optimized_deployment(&self) -> bool {
        self.is_optimized_deployment.unwrap_or(true)
    }
}

impl Manifest {
    pub fn new(package_directories: Vec<PackageDescriptor>) -> Self {
        Self {
            package_directories,
        }
    }

    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        serde_json::from_str(content).context("Failed to parse release manifest")
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read release manifest: {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Invalid release manifest: {}", path.display()))
    }
}

/// Pick the manifest for a run.
///
/// The manifest embedded in the most recently built artifact wins, since it
/// reflects the project state the artifacts were produced from. Falls back to
/// the project manifest file.
pub fn resolve_manifest(
    artifacts: &[Artifact],
    project_manifest: Option<&Path>,
) -> Result<Manifest, DeployError> {
    if let Some(manifest) = latest_manifest_from_artifacts(artifacts).map_err(DeployError::Manifest)? {
        return Ok(manifest);
    }

    match project_manifest {
        Some(path) => Manifest::from_path(path).map_err(DeployError::Manifest),
        None => Err(DeployError::Manifest(anyhow::anyhow!(
            "No artifact carries a manifest and no project manifest is configured"
        ))),
    }
}

fn latest_manifest_from_artifacts(artifacts: &[Artifact]) -> anyhow::Result<Option<Manifest>> {
    let mut latest: Option<&Artifact> = None;
    for artifact in artifacts.iter().filter(|a| a.metadata.payload.is_some()) {
        let newer = match latest {
            None => true,
            Some(current) => artifact.metadata.created_at() > current.metadata.created_at(),
        };
        if newer {
            latest = Some(artifact);
        }
    }

    let Some(artifact) = latest else {
        return Ok(None);
    };
    let Some(payload) = artifact.metadata.payload.clone() else {
        return Ok(None);
    };

    tracing::debug!(
        "Using manifest embedded in artifact {} {}",
        artifact.package_name(),
        artifact.version()
    );
    let manifest = serde_json::from_value(payload).with_context(|| {
        format!(
            "Invalid manifest embedded in artifact {}",
            artifact.package_name()
        )
    })?;
    Ok(Some(manifest))
}
