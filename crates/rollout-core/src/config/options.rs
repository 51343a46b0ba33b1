//! Structured options for one deployment run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::deploy::gate::DEFAULT_COVERAGE_THRESHOLD;
use crate::deploy::report::LogGroupMarkers;
use crate::deploy::retry::DEFAULT_RETRY_DELAY;
use crate::types::DeploymentMode;

/// Default wait handed to install routines, in minutes
pub const DEFAULT_WAIT_MINUTES: u64 = 120;

#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Environment receiving the packages
    pub target: String,
    /// Directory holding artifact directories or archives
    pub artifact_dir: PathBuf,
    pub mode: DeploymentMode,
    /// Trigger tests after installing packages with executable logic
    pub run_tests: bool,
    /// Drop packages already installed in the baseline
    pub skip_if_installed: bool,
    pub coverage_threshold: f64,
    pub wait_minutes: u64,
    /// Current pipeline stage, matched against `ignoreOnStage`
    pub stage: Option<String>,
    /// Environment consulted for installed state; defaults to the target
    pub baseline: Option<String>,
    /// Require promoted artifacts on non-sandbox targets
    pub check_promoted: bool,
    pub retry_on_failure: bool,
    pub retry_delay: Duration,
    /// Manifest used when no artifact carries one
    pub project_manifest: Option<PathBuf>,
    pub log_groups: Option<LogGroupMarkers>,
    /// Where zipped artifacts are extracted
    pub staging_dir: Option<PathBuf>,
}

impl DeployOptions {
    pub fn new(target: impl Into<String>, artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            artifact_dir: artifact_dir.into(),
            mode: DeploymentMode::Normal,
            run_tests: false,
            skip_if_installed: false,
            coverage_threshold: DEFAULT_COVERAGE_THRESHOLD,
            wait_minutes: DEFAULT_WAIT_MINUTES,
            stage: None,
            baseline: None,
            check_promoted: false,
            retry_on_failure: false,
            retry_delay: DEFAULT_RETRY_DELAY,
            project_manifest: None,
            log_groups: None,
            staging_dir: None,
        }
    }

    pub fn with_mode(mut self, mode: DeploymentMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_run_tests(mut self, run_tests: bool) -> Self {
        self.run_tests = run_tests;
        self
    }

    pub fn with_skip_if_installed(mut self, skip: bool) -> Self {
        self.skip_if_installed = skip;
        self
    }

    pub fn with_coverage_threshold(mut self, threshold: f64) -> Self {
        self.coverage_threshold = threshold;
        self
    }

    pub fn with_wait_minutes(mut self, minutes: u64) -> Self {
        self.wait_minutes = minutes;
        self
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn with_baseline(mut self, baseline: impl Into<String>) -> Self {
        self.baseline = Some(baseline.into());
        self
    }

    pub fn with_check_promoted(mut self, check: bool) -> Self {
        self.check_promoted = check;
        self
    }

    pub fn with_retry_on_failure(mut self, retry: bool) -> Self {
        self.retry_on_failure = retry;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_project_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_manifest = Some(path.into());
        self
    }

    pub fn with_log_groups(mut self, markers: LogGroupMarkers) -> Self {
        self.log_groups = Some(markers);
        self
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Environment used for installed-state checks.
    pub fn baseline_or_target(&self) -> &str {
        self.baseline.as_deref().unwrap_or(&self.target)
    }

    /// Directory for extracted archives, under the system temp dir by default.
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("rollout").join("staging"))
    }

    pub fn project_manifest(&self) -> Option<&Path> {
        self.project_manifest.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = DeployOptions::new("qa", "artifacts");
        assert_eq!(options.mode, DeploymentMode::Normal);
        assert_eq!(options.coverage_threshold, 75.0);
        assert_eq!(options.wait_minutes, 120);
        assert_eq!(options.retry_delay, Duration::from_secs(2));
        assert_eq!(options.baseline_or_target(), "qa");
    }

    #[test]
    fn baseline_overrides_target_for_installed_checks() {
        let options = DeployOptions::new("qa", "artifacts").with_baseline("prod");
        assert_eq!(options.baseline_or_target(), "prod");
    }
}
