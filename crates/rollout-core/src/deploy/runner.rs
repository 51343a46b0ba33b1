//! Sequential installation of the queue.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::DeployError;
use crate::manifest::PackageDescriptor;
use crate::types::InstallationStatus;

use super::dispatch::InstallDispatcher;
use super::gate::TestGate;
use super::ports::InstallRequest;
use super::report::{self, LogGroupMarkers};
use super::resolver::PackageInfos;
use super::retry::RetryingExecutor;

/// Outcome of a deployment run.
///
/// Either every queued package succeeded and `error` is `None`, or `error`
/// holds the terminating error.
#[derive(Debug, Serialize)]
pub struct DeploymentResult {
    /// Installed packages, in install order
    pub deployed: Vec<String>,
    /// Packages whose install routine reported them as skipped
    pub skipped: Vec<String>,
    /// Packages that failed or were never attempted because of a failure
    pub failed: Vec<String>,
    /// Package whose tests failed, if any
    pub test_failure: Option<String>,
    #[serde(serialize_with = "crate::error::serialize_error")]
    pub error: Option<DeployError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DeploymentResult {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            deployed: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            test_failure: None,
            error: None,
            started_at,
            finished_at: started_at,
        }
    }

    /// Successful result for a run with nothing left to install.
    pub fn nothing_installed(started_at: DateTime<Utc>) -> Self {
        let mut result = Self::new(started_at);
        result.finished_at = Utc::now();
        result
    }

    /// Result for a run that stopped before installing anything.
    pub fn aborted(started_at: DateTime<Utc>, error: DeployError) -> Self {
        let mut result = Self::new(started_at);
        result.error = Some(error);
        result.finished_at = Utc::now();
        result
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    fn fail_from(&mut self, queue: &[PackageDescriptor], index: usize, error: DeployError) {
        self.failed = queue[index..].iter().map(|d| d.package.clone()).collect();
        self.error = Some(error);
    }
}

/// Settings the runner applies to every package.
#[derive(Debug, Clone)]
pub struct RunSettings<'a> {
    pub target: &'a str,
    pub wait_minutes: u64,
    pub skip_if_installed: bool,
    pub log_groups: Option<&'a LogGroupMarkers>,
}

/// Installs queued packages one at a time, stopping at the first failure.
pub struct SequentialRunner<'a> {
    dispatcher: InstallDispatcher<'a>,
    executor: RetryingExecutor,
    gate: Option<TestGate<'a>>,
    settings: RunSettings<'a>,
}

impl<'a> SequentialRunner<'a> {
    pub fn new(
        dispatcher: InstallDispatcher<'a>,
        executor: RetryingExecutor,
        settings: RunSettings<'a>,
    ) -> Self {
        Self {
            dispatcher,
            executor,
            gate: None,
            settings,
        }
    }

    /// Gate installed packages that contain executable logic on their tests.
    pub fn with_test_gate(mut self, gate: TestGate<'a>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub async fn run(
        &self,
        queue: &[PackageDescriptor],
        infos: &PackageInfos,
        started_at: DateTime<Utc>,
    ) -> DeploymentResult {
        let mut result = DeploymentResult::new(started_at);

        for (index, descriptor) in queue.iter().enumerate() {
            let package = descriptor.package.as_str();
            let Some(info) = infos.get(package) else {
                result.fail_from(queue, index, DeployError::MissingArtifact(package.to_string()));
                break;
            };
            let kind = match info.metadata.kind() {
                Ok(kind) => kind,
                Err(err) => {
                    result.fail_from(queue, index, err);
                    break;
                }
            };

            self.open_group(&format!("Installing {}", package));
            report::log_block(&report::package_header(
                descriptor,
                info,
                kind,
                self.settings.skip_if_installed,
            ));

            let request = InstallRequest {
                package,
                target: self.settings.target,
                source_dir: &info.source_dir,
                metadata: &info.metadata,
                wait_minutes: self.settings.wait_minutes,
                skip_if_installed: false,
            };
            let request = &request;
            let dispatcher = &self.dispatcher;

            let outcome = self
                .executor
                .execute(move |attempt| {
                    if attempt > 1 {
                        report::log_block(&report::retry_header(package, attempt));
                    }
                    dispatcher.dispatch(kind, request, descriptor)
                })
                .await;

            let installation = match outcome {
                Ok(installation) => installation,
                Err(err) => {
                    tracing::error!("Installation of {} aborted: {:#}", package, err);
                    result.fail_from(
                        queue,
                        index,
                        DeployError::InstallationAborted {
                            package: package.to_string(),
                            error: err,
                        },
                    );
                    self.close_group();
                    break;
                }
            };

            match installation.status {
                InstallationStatus::Succeeded => {
                    tracing::info!("Successfully installed {}", package);
                    result.deployed.push(package.to_string());
                    self.close_group();
                }
                InstallationStatus::Skipped => {
                    tracing::info!(
                        "Skipped {}: {}",
                        package,
                        installation.message.as_deref().unwrap_or("already installed")
                    );
                    result.skipped.push(package.to_string());
                    self.close_group();
                    continue;
                }
                InstallationStatus::Failed => {
                    let message = installation
                        .message
                        .unwrap_or_else(|| "Installation failed".to_string());
                    tracing::error!("Failed to install {}: {}", package, message);
                    result.fail_from(
                        queue,
                        index,
                        DeployError::InstallationFailed {
                            package: package.to_string(),
                            message,
                        },
                    );
                    self.close_group();
                    break;
                }
            }

            let Some(gate) = &self.gate else {
                continue;
            };
            if !info.metadata.contains_executable_logic {
                continue;
            }
            if descriptor.skip_testing {
                tracing::info!("Skipping testing of {}", package);
                continue;
            }

            self.open_group(&format!("Trigger Tests for {}", package));
            let outcome = gate
                .evaluate(
                    package,
                    self.settings.target,
                    &info.source_dir,
                    descriptor.skip_coverage_validation,
                )
                .await;
            self.close_group();

            if outcome.passed {
                tracing::info!("{}", outcome.message);
            } else {
                tracing::error!("Tests for {} failed: {}", package, outcome.message);
                result.test_failure = Some(package.to_string());
                result.fail_from(
                    queue,
                    index + 1,
                    DeployError::TestFailed {
                        package: package.to_string(),
                        message: outcome.message,
                    },
                );
                break;
            }
        }

        result.finished_at = Utc::now();
        result
    }

    // Markers go straight to stdout so CI runners see them at line start.
    fn open_group(&self, title: &str) {
        if let Some(markers) = self.settings.log_groups {
            println!("{}", markers.open_line(title));
        }
    }

    fn close_group(&self) {
        if let Some(markers) = self.settings.log_groups {
            println!("{}", markers.close_line());
        }
    }
}
