//! Top-level deployment orchestration.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::artifact::{Artifact, discover_artifacts};
use crate::config::DeployOptions;
use crate::error::DeployError;
use crate::manifest::{PackageDescriptor, resolve_manifest};

use super::dispatch::InstallDispatcher;
use super::gate::TestGate;
use super::installed::{InstalledArtifactsCache, filter_installed};
use super::ports::{CoverageReader, PackageInstaller, TargetInspector, TestRunner};
use super::promotion::check_promotion;
use super::queue::build_queue;
use super::report;
use super::resolver::{PackageInfos, resolve_package_infos};
use super::retry::{RetryPolicy, RetryingExecutor};
use super::runner::{DeploymentResult, RunSettings, SequentialRunner};

/// External services the orchestrator drives.
#[derive(Clone)]
pub struct Collaborators {
    pub installer: Arc<dyn PackageInstaller>,
    pub inspector: Arc<dyn TargetInspector>,
    pub test_runner: Arc<dyn TestRunner>,
    pub coverage: Arc<dyn CoverageReader>,
}

/// Packages a run would install, without installing them.
#[derive(Debug, Clone)]
pub struct DeploymentPlan {
    pub queue: Vec<PackageDescriptor>,
    pub package_infos: PackageInfos,
    /// Environment consulted for installed state, when that check ran
    pub baseline: Option<String>,
}

impl DeploymentPlan {
    pub fn package_names(&self) -> Vec<&str> {
        self.queue.iter().map(|d| d.package.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Deploys artifacts into a target in manifest order.
pub struct DeployOrchestrator {
    options: DeployOptions,
    collaborators: Collaborators,
    cache: InstalledArtifactsCache,
}

impl DeployOrchestrator {
    pub fn new(options: DeployOptions, collaborators: Collaborators) -> Self {
        Self {
            options,
            collaborators,
            cache: InstalledArtifactsCache::new(),
        }
    }

    pub fn options(&self) -> &DeployOptions {
        &self.options
    }

    pub fn inspector(&self) -> &dyn TargetInspector {
        self.collaborators.inspector.as_ref()
    }

    /// Discover artifacts and deploy them. Failures are reported through
    /// [`DeploymentResult::error`].
    pub async fn exec(&mut self) -> DeploymentResult {
        let started_at = Utc::now();
        match self.discover() {
            Ok(artifacts) => self.exec_inner(&artifacts, started_at).await,
            Err(err) => abort(started_at, err),
        }
    }

    /// Deploy an already discovered set of artifacts.
    pub async fn exec_with_artifacts(&mut self, artifacts: &[Artifact]) -> DeploymentResult {
        self.exec_inner(artifacts, Utc::now()).await
    }

    async fn exec_inner(
        &mut self,
        artifacts: &[Artifact],
        started_at: chrono::DateTime<Utc>,
    ) -> DeploymentResult {
        let plan = match self.plan_with_artifacts(artifacts).await {
            Ok(plan) => plan,
            Err(err) => return abort(started_at, err),
        };

        if plan.is_empty() {
            tracing::info!("All queued packages are already installed, nothing to do");
            return DeploymentResult::nothing_installed(started_at);
        }

        let result = self.run_plan(&plan, started_at).await;
        if let Some(err) = &result.error {
            tracing::error!("{}", err);
        }
        result
    }

    /// Discover artifacts and compute the plan.
    pub async fn plan(&mut self) -> Result<DeploymentPlan, DeployError> {
        let artifacts = self.discover()?;
        self.plan_with_artifacts(&artifacts).await
    }

    /// Resolve, queue, filter and check a set of artifacts.
    pub async fn plan_with_artifacts(
        &mut self,
        artifacts: &[Artifact],
    ) -> Result<DeploymentPlan, DeployError> {
        if artifacts.is_empty() {
            return Err(DeployError::NoArtifacts(self.options.artifact_dir.clone()));
        }

        let mut infos = resolve_package_infos(artifacts)?;
        let manifest = resolve_manifest(artifacts, self.options.project_manifest())?;
        let mut queue = build_queue(
            &manifest,
            &infos,
            &self.options.target,
            self.options.stage.as_deref(),
        )?;

        let mut baseline = None;
        if self.options.skip_if_installed {
            let baseline_org = self.options.baseline_or_target().to_string();
            let filtered = filter_installed(
                queue.clone(),
                &mut infos,
                &baseline_org,
                self.collaborators.inspector.as_ref(),
                &mut self.cache,
            )
            .await;
            self.reset_installed_cache();
            let filtered = filtered?;

            report::log_block(&report::breakdown_table(&queue, &infos, &baseline_org));
            queue = filtered;
            baseline = Some(baseline_org);
        }

        if !queue.is_empty() {
            report::log_block(&report::queue_table(&queue, &infos));
        }

        if self.options.check_promoted {
            check_promotion(
                &queue,
                &infos,
                &self.options.target,
                self.collaborators.inspector.as_ref(),
            )
            .await?;
        }

        Ok(DeploymentPlan {
            queue,
            package_infos: infos,
            baseline,
        })
    }

    /// Install every package of a plan.
    pub async fn run_plan(
        &self,
        plan: &DeploymentPlan,
        started_at: chrono::DateTime<Utc>,
    ) -> DeploymentResult {
        let options = &self.options;
        let dispatcher = InstallDispatcher::new(
            self.collaborators.installer.as_ref(),
            options.mode,
            options.stage.as_deref(),
        );
        let executor = RetryingExecutor::new(
            RetryPolicy::new(options.retry_on_failure).with_delay(options.retry_delay),
        );
        let settings = RunSettings {
            target: &options.target,
            wait_minutes: options.wait_minutes,
            skip_if_installed: options.skip_if_installed,
            log_groups: options.log_groups.as_ref(),
        };

        let mut runner = SequentialRunner::new(dispatcher, executor, settings);
        if options.run_tests {
            runner = runner.with_test_gate(
                TestGate::new(
                    self.collaborators.test_runner.as_ref(),
                    self.collaborators.coverage.as_ref(),
                )
                .with_threshold(options.coverage_threshold),
            );
        }

        runner.run(&plan.queue, &plan.package_infos, started_at).await
    }

    /// Drop installed-artifact listings fetched so far.
    pub fn reset_installed_cache(&mut self) {
        self.cache.reset();
    }

    fn discover(&self) -> Result<Vec<Artifact>, DeployError> {
        discover_in(&self.options.artifact_dir, &self.options.staging_dir())
    }
}

fn discover_in(artifact_dir: &Path, staging_dir: &Path) -> Result<Vec<Artifact>, DeployError> {
    let artifacts = discover_artifacts(artifact_dir, staging_dir).map_err(DeployError::Artifact)?;
    tracing::info!(
        "Found {} artifacts in {}",
        artifacts.len(),
        artifact_dir.display()
    );
    Ok(artifacts)
}

fn abort(started_at: chrono::DateTime<Utc>, err: DeployError) -> DeploymentResult {
    tracing::error!("{}", err);
    DeploymentResult::aborted(started_at, err)
}
