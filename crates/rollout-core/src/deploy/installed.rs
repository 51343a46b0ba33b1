//! Drop queued packages whose version is already present in the baseline.

use std::cmp::Ordering;
use std::collections::HashMap;

use anyhow::Context;

use crate::error::DeployError;
use crate::manifest::PackageDescriptor;
use crate::version;

use super::ports::{InstalledArtifact, TargetInspector};
use super::resolver::PackageInfos;

/// Installed-artifact listings fetched during a run, keyed by target.
///
/// Owned by the orchestrator and cleared with [`reset`](Self::reset) once the
/// installed filter has finished.
#[derive(Debug, Default)]
pub struct InstalledArtifactsCache {
    fetched: HashMap<String, Vec<InstalledArtifact>>,
}

impl InstalledArtifactsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listing for `target`, querying the inspector on first use.
    pub async fn get_or_fetch(
        &mut self,
        target: &str,
        inspector: &dyn TargetInspector,
    ) -> anyhow::Result<&[InstalledArtifact]> {
        if !self.fetched.contains_key(target) {
            let installed = inspector
                .installed_artifacts(target)
                .await
                .with_context(|| format!("Failed to list installed artifacts in {}", target))?;
            tracing::debug!("Fetched {} installed artifacts from {}", installed.len(), target);
            self.fetched.insert(target.to_string(), installed);
        }
        Ok(self
            .fetched
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    pub fn reset(&mut self) {
        self.fetched.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.fetched.is_empty()
    }
}

/// Installed state of one package in an environment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstalledStatus {
    pub is_installed: bool,
    /// Version found in the environment, if the package is there at all
    pub version_number: Option<String>,
}

/// Compare the incoming version against what the environment has.
///
/// The package counts as installed when the environment version is at or
/// above the incoming one. Versions that do not normalize into semver fall
/// back to exact string equality.
pub fn installed_status(
    installed: &[InstalledArtifact],
    package: &str,
    incoming_version: &str,
) -> InstalledStatus {
    let Some(found) = installed.iter().find(|a| a.name == package) else {
        return InstalledStatus::default();
    };

    let is_installed = match version::compare_versions(&found.version, incoming_version) {
        Ok(ordering) => ordering != Ordering::Less,
        Err(_) => found.version == incoming_version,
    };

    InstalledStatus {
        is_installed,
        version_number: Some(found.version.clone()),
    }
}

/// Remove queued packages already installed in `baseline`.
///
/// `alwaysDeploy` entries stay queued. The baseline version is recorded on
/// every package info that has one, removed or not.
pub async fn filter_installed(
    queue: Vec<PackageDescriptor>,
    infos: &mut PackageInfos,
    baseline: &str,
    inspector: &dyn TargetInspector,
    cache: &mut InstalledArtifactsCache,
) -> Result<Vec<PackageDescriptor>, DeployError> {
    let installed = cache
        .get_or_fetch(baseline, inspector)
        .await
        .map_err(DeployError::Environment)?;

    let mut remaining = Vec::with_capacity(queue.len());
    for descriptor in queue {
        let Some(info) = infos.get_mut(&descriptor.package) else {
            return Err(DeployError::MissingArtifact(descriptor.package));
        };

        let status = installed_status(installed, &descriptor.package, info.version());
        info.version_installed_in_baseline = status.version_number.clone();

        if status.is_installed && !descriptor.always_deploy {
            tracing::debug!(
                "{} {} already installed in {}, skipping",
                descriptor.package,
                info.version(),
                baseline
            );
            info.is_installed = true;
            continue;
        }
        remaining.push(descriptor);
    }

    Ok(remaining)
}
