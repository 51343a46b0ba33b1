//! Shared core types used across the planning and execution layers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DeployError;

/// Package kinds understood by the install dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    /// Versioned package installed by id.
    Unlocked,
    /// Source deployed straight from the artifact's source directory.
    Source,
    /// Data loaded from the artifact's source directory.
    Data,
}

impl PackageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageKind::Unlocked => "unlocked",
            PackageKind::Source => "source",
            PackageKind::Data => "data",
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageKind {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unlocked" => Ok(PackageKind::Unlocked),
            "source" => Ok(PackageKind::Source),
            "data" => Ok(PackageKind::Data),
            _ => Err(DeployError::UnhandledPackageType(s.to_string())),
        }
    }
}

/// How packages are deployed during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentMode {
    /// Each kind goes through its own install routine.
    #[default]
    Normal,
    /// Unlocked packages are deployed as source, without optimization.
    SourcePackagesOnly,
}

impl FromStr for DeploymentMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(DeploymentMode::Normal),
            "source-packages-only" | "source-packages" | "source" => {
                Ok(DeploymentMode::SourcePackagesOnly)
            }
            _ => anyhow::bail!(
                "Unknown deployment mode: {}. Use 'normal' or 'source-packages-only'",
                s
            ),
        }
    }
}

/// Outcome tag of one installation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallationStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// Result of one install routine invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationResult {
    pub status: InstallationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl InstallationResult {
    pub fn succeeded() -> Self {
        Self {
            status: InstallationStatus::Succeeded,
            message: None,
        }
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            status: InstallationStatus::Skipped,
            message: Some(message.into()),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: InstallationStatus::Failed,
            message: Some(message.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == InstallationStatus::Failed
    }
}

/// Configuration file scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigScope {
    /// User-wide configuration.
    Global,
    /// Project configuration, usually checked into version control.
    Project,
}
