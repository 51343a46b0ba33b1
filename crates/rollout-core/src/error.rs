//! Error taxonomy surfaced through a deployment result.

use std::path::PathBuf;

use serde::Serializer;

/// Terminating error of a deployment run.
///
/// Planning failures (no artifacts, empty queue, promotion policy) are raised
/// before any installation begins. Per-package failures are folded into the
/// [`DeploymentResult`](crate::deploy::DeploymentResult) by the runner.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("No artifacts to deploy found in {}", .0.display())]
    NoArtifacts(PathBuf),

    #[error("No artifacts from project config to be deployed")]
    NothingToDeploy,

    #[error("Unhandled package type {0}")]
    UnhandledPackageType(String),

    #[error("Invalid version number '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("No artifact was resolved for queued package {0}")]
    MissingArtifact(String),

    #[error("Unable to load release manifest: {0:#}")]
    Manifest(anyhow::Error),

    #[error("Unable to read artifacts: {0:#}")]
    Artifact(anyhow::Error),

    #[error("Unable to inspect target environment: {0:#}")]
    Environment(anyhow::Error),

    #[error("Packages must be promoted for deployments to production org: {}", .packages.join(","))]
    PackagesNotPromoted { packages: Vec<String> },

    #[error("Installation of {package} failed: {message}")]
    InstallationFailed { package: String, message: String },

    /// Raw error from the second attempt of a retried installation.
    #[error("Installation of {package} aborted: {error:#}")]
    InstallationAborted {
        package: String,
        error: anyhow::Error,
    },

    #[error("Tests for {package} failed: {message}")]
    TestFailed { package: String, message: String },
}

impl DeployError {
    /// True for bad deployment input detected while planning, before any
    /// package was attempted. Per-package failures folded in by the runner
    /// are never configuration errors.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            DeployError::NoArtifacts(_)
                | DeployError::NothingToDeploy
                | DeployError::InvalidVersion { .. }
                | DeployError::Manifest(_)
                | DeployError::Artifact(_)
        )
    }
}

/// Serialize an optional error as its display string.
pub(crate) fn serialize_error<S>(error: &Option<DeployError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match error {
        Some(err) => serializer.serialize_some(&err.to_string()),
        None => serializer.serialize_none(),
    }
}
