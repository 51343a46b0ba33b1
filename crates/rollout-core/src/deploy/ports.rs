//! Collaborator interfaces for the orchestrator.
//!
//! Installation mechanics, installed-state queries and test execution live
//! outside the orchestrator. Each is reached through one of these traits; the
//! `runtime` module provides command-backed implementations.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::artifact::PackageMetadata;
use crate::types::InstallationResult;

/// Everything an install routine needs to know about one package.
#[derive(Debug, Clone, Copy)]
pub struct InstallRequest<'a> {
    pub package: &'a str,
    pub target: &'a str,
    pub source_dir: &'a Path,
    pub metadata: &'a PackageMetadata,
    /// Wait time handed to the routine, in minutes
    pub wait_minutes: u64,
    /// Let the routine itself skip an installed version
    pub skip_if_installed: bool,
}

/// Fixed options for unlocked package installs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockedInstallOptions {
    pub installation_key: Option<String>,
    pub compile_scope: String,
    pub security_type: String,
    pub upgrade_type: String,
    /// Minutes to wait for the version to become available
    pub publish_wait_minutes: u64,
}

impl Default for UnlockedInstallOptions {
    fn default() -> Self {
        Self {
            installation_key: None,
            compile_scope: "package".to_string(),
            security_type: "AdminsOnly".to_string(),
            upgrade_type: "Mixed".to_string(),
            publish_wait_minutes: 10,
        }
    }
}

/// Options for source package deployments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInstallOptions {
    pub optimize_deployment: bool,
    pub skip_testing: bool,
    /// Ignore file applied on top of the package content
    pub ignore_file: Option<PathBuf>,
}

/// Per-kind install routines.
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    async fn install_unlocked(
        &self,
        request: &InstallRequest<'_>,
        options: &UnlockedInstallOptions,
    ) -> anyhow::Result<InstallationResult>;

    async fn install_source(
        &self,
        request: &InstallRequest<'_>,
        options: &SourceInstallOptions,
    ) -> anyhow::Result<InstallationResult>;

    async fn install_data(&self, request: &InstallRequest<'_>) -> anyhow::Result<InstallationResult>;
}

/// An artifact already present in an environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledArtifact {
    pub name: String,
    pub version: String,
}

impl InstalledArtifact {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Queries against a target environment.
#[async_trait]
pub trait TargetInspector: Send + Sync {
    /// All artifacts installed in the environment.
    async fn installed_artifacts(&self, target: &str) -> anyhow::Result<Vec<InstalledArtifact>>;

    /// Whether the environment is a sandbox (not production-like).
    async fn is_sandbox(&self, target: &str) -> anyhow::Result<bool>;
}

/// Test trigger for one installed package.
#[derive(Debug, Clone, Copy)]
pub struct TestRequest<'a> {
    pub package: &'a str,
    pub target: &'a str,
    pub source_dir: &'a Path,
    pub wait_minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunOutcome {
    pub id: String,
    pub passed: bool,
    #[serde(default)]
    pub message: String,
}

#[async_trait]
pub trait TestRunner: Send + Sync {
    async fn run_tests(&self, request: &TestRequest<'_>) -> anyhow::Result<TestRunOutcome>;
}

/// Reads the coverage produced by a test run.
pub trait CoverageReader: Send + Sync {
    /// Package coverage as a percentage in `0.0..=100.0`.
    fn package_coverage(&self, package: &str, run_id: &str) -> anyhow::Result<f64>;
}
