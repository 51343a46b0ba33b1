//! In-memory collaborators and fixtures shared by integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rollout_core::artifact::{Artifact, PackageMetadata};
use rollout_core::config::DeployOptions;
use rollout_core::deploy::Collaborators;
use rollout_core::deploy::ports::{
    CoverageReader, InstallRequest, InstalledArtifact, PackageInstaller, SourceInstallOptions,
    TargetInspector, TestRequest, TestRunOutcome, TestRunner, UnlockedInstallOptions,
};
use rollout_core::types::InstallationResult;
use tempfile::TempDir;

pub const TARGET: &str = "qa";

/// Scripted outcome of one install call.
#[derive(Debug, Clone)]
pub enum Outcome {
    Succeed,
    Fail(&'static str),
    Skip,
    Error(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routine {
    Unlocked,
    Source,
    Data,
}

#[derive(Debug, Clone)]
pub struct InstallCall {
    pub package: String,
    pub routine: Routine,
    pub source_options: Option<SourceInstallOptions>,
    pub skip_if_installed: bool,
    pub wait_minutes: u64,
}

/// Installer returning scripted outcomes per package; succeeds by default.
#[derive(Default)]
pub struct FakeInstaller {
    script: Mutex<HashMap<String, VecDeque<Outcome>>>,
    calls: Mutex<Vec<InstallCall>>,
}

impl FakeInstaller {
    pub fn script(&self, package: &str, outcomes: &[Outcome]) {
        self.script
            .lock()
            .unwrap()
            .insert(package.to_string(), outcomes.iter().cloned().collect());
    }

    pub fn calls(&self) -> Vec<InstallCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn attempts(&self, package: &str) -> usize {
        self.calls().iter().filter(|c| c.package == package).count()
    }

    fn record(
        &self,
        request: &InstallRequest<'_>,
        routine: Routine,
        source_options: Option<SourceInstallOptions>,
    ) -> anyhow::Result<InstallationResult> {
        self.calls.lock().unwrap().push(InstallCall {
            package: request.package.to_string(),
            routine,
            source_options,
            skip_if_installed: request.skip_if_installed,
            wait_minutes: request.wait_minutes,
        });

        let outcome = self
            .script
            .lock()
            .unwrap()
            .get_mut(request.package)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Outcome::Succeed);

        match outcome {
            Outcome::Succeed => Ok(InstallationResult::succeeded()),
            Outcome::Fail(message) => Ok(InstallationResult::failed(message)),
            Outcome::Skip => Ok(InstallationResult::skipped("already installed")),
            Outcome::Error(message) => Err(anyhow::anyhow!(message)),
        }
    }
}

#[async_trait]
impl PackageInstaller for FakeInstaller {
    async fn install_unlocked(
        &self,
        request: &InstallRequest<'_>,
        _options: &UnlockedInstallOptions,
    ) -> anyhow::Result<InstallationResult> {
        self.record(request, Routine::Unlocked, None)
    }

    async fn install_source(
        &self,
        request: &InstallRequest<'_>,
        options: &SourceInstallOptions,
    ) -> anyhow::Result<InstallationResult> {
        self.record(request, Routine::Source, Some(options.clone()))
    }

    async fn install_data(&self, request: &InstallRequest<'_>) -> anyhow::Result<InstallationResult> {
        self.record(request, Routine::Data, None)
    }
}

/// Environment state keyed by target.
#[derive(Default)]
pub struct FakeInspector {
    installed: Mutex<HashMap<String, Vec<InstalledArtifact>>>,
    sandbox: Mutex<bool>,
    unreachable: Mutex<bool>,
    listings: AtomicUsize,
}

impl FakeInspector {
    pub fn install(&self, target: &str, name: &str, version: &str) {
        self.installed
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_default()
            .push(InstalledArtifact::new(name, version));
    }

    pub fn set_sandbox(&self, sandbox: bool) {
        *self.sandbox.lock().unwrap() = sandbox;
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        *self.unreachable.lock().unwrap() = unreachable;
    }

    /// Number of installed-artifact listings served.
    pub fn listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TargetInspector for FakeInspector {
    async fn installed_artifacts(&self, target: &str) -> anyhow::Result<Vec<InstalledArtifact>> {
        if *self.unreachable.lock().unwrap() {
            anyhow::bail!("{} is unreachable", target);
        }
        self.listings.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .installed
            .lock()
            .unwrap()
            .get(target)
            .cloned()
            .unwrap_or_default())
    }

    async fn is_sandbox(&self, _target: &str) -> anyhow::Result<bool> {
        Ok(*self.sandbox.lock().unwrap())
    }
}

/// Test runner passing every package unless told otherwise.
#[derive(Default)]
pub struct FakeTestRunner {
    failing: Mutex<HashMap<String, Option<&'static str>>>,
    runs: Mutex<Vec<String>>,
}

impl FakeTestRunner {
    /// Tests for `package` fail with `message`.
    pub fn fail(&self, package: &str, message: &'static str) {
        self.failing
            .lock()
            .unwrap()
            .insert(package.to_string(), Some(message));
    }

    /// The runner errors for `package`.
    pub fn error(&self, package: &str) {
        self.failing.lock().unwrap().insert(package.to_string(), None);
    }

    pub fn runs(&self) -> Vec<String> {
        self.runs.lock().unwrap().clone()
    }
}

#[async_trait]
impl TestRunner for FakeTestRunner {
    async fn run_tests(&self, request: &TestRequest<'_>) -> anyhow::Result<TestRunOutcome> {
        self.runs.lock().unwrap().push(request.package.to_string());
        match self.failing.lock().unwrap().get(request.package) {
            None => Ok(TestRunOutcome {
                id: format!("run-{}", request.package),
                passed: true,
                message: "all tests passed".to_string(),
            }),
            Some(Some(message)) => Ok(TestRunOutcome {
                id: format!("run-{}", request.package),
                passed: false,
                message: message.to_string(),
            }),
            Some(None) => anyhow::bail!("test service unavailable"),
        }
    }
}

/// Coverage per package, 100% unless set.
#[derive(Default)]
pub struct FakeCoverage {
    coverage: Mutex<HashMap<String, f64>>,
}

impl FakeCoverage {
    pub fn set(&self, package: &str, percent: f64) {
        self.coverage
            .lock()
            .unwrap()
            .insert(package.to_string(), percent);
    }
}

impl CoverageReader for FakeCoverage {
    fn package_coverage(&self, package: &str, _run_id: &str) -> anyhow::Result<f64> {
        Ok(self
            .coverage
            .lock()
            .unwrap()
            .get(package)
            .copied()
            .unwrap_or(100.0))
    }
}

#[derive(Default, Clone)]
pub struct Fakes {
    pub installer: Arc<FakeInstaller>,
    pub inspector: Arc<FakeInspector>,
    pub tests: Arc<FakeTestRunner>,
    pub coverage: Arc<FakeCoverage>,
}

impl Fakes {
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            installer: self.installer.clone(),
            inspector: self.inspector.clone(),
            test_runner: self.tests.clone(),
            coverage: self.coverage.clone(),
        }
    }
}

/// In-memory artifact.
pub fn artifact(name: &str, version: &str, kind: &str) -> Artifact {
    artifact_with(name, version, kind, serde_json::json!({}))
}

/// In-memory artifact with extra metadata fields.
pub fn artifact_with(name: &str, version: &str, kind: &str, extra: serde_json::Value) -> Artifact {
    let mut value = serde_json::json!({
        "package_name": name,
        "package_version_number": version,
        "package_type": kind,
    });
    if let (Some(target), Some(fields)) = (value.as_object_mut(), extra.as_object()) {
        for (key, field) in fields {
            target.insert(key.clone(), field.clone());
        }
    }
    let metadata: PackageMetadata = serde_json::from_value(value).unwrap();
    Artifact::new(metadata, PathBuf::from(format!("/artifacts/{}/source", name)))
}

/// Write a project manifest with the given descriptors.
pub fn write_manifest(dir: &Path, descriptors: serde_json::Value) -> PathBuf {
    let path = dir.join("project.json");
    let manifest = serde_json::json!({ "packageDirectories": descriptors });
    std::fs::write(&path, serde_json::to_string_pretty(&manifest).unwrap()).unwrap();
    path
}

/// Manifest listing `names` in order with default policy.
pub fn write_plain_manifest(dir: &Path, names: &[&str]) -> PathBuf {
    let descriptors: Vec<_> = names
        .iter()
        .map(|name| serde_json::json!({ "package": name }))
        .collect();
    write_manifest(dir, serde_json::Value::Array(descriptors))
}

/// Options deploying into [`TARGET`] with no retry delay.
pub fn options(temp: &TempDir, manifest: &Path) -> DeployOptions {
    DeployOptions::new(TARGET, temp.path().join("artifacts"))
        .with_project_manifest(manifest)
        .with_retry_delay(Duration::ZERO)
        .with_staging_dir(temp.path().join("staging"))
}
