//! Post-install test gate.

use std::path::Path;

use anyhow::Context;

use super::ports::{CoverageReader, TestRequest, TestRunner};

pub const DEFAULT_COVERAGE_THRESHOLD: f64 = 75.0;

/// Message reported whenever a collaborator fails during testing.
pub const TEST_EXECUTION_FAILED: &str = "Test Execution failed";

#[derive(Debug, Clone, PartialEq)]
pub struct GateOutcome {
    pub passed: bool,
    pub message: String,
}

impl GateOutcome {
    fn passed(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }
}

/// Runs tests for one package and checks its coverage.
pub struct TestGate<'a> {
    runner: &'a dyn TestRunner,
    coverage: &'a dyn CoverageReader,
    threshold: f64,
    wait_minutes: u64,
}

impl<'a> TestGate<'a> {
    pub fn new(runner: &'a dyn TestRunner, coverage: &'a dyn CoverageReader) -> Self {
        Self {
            runner,
            coverage,
            threshold: DEFAULT_COVERAGE_THRESHOLD,
            wait_minutes: 60,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_wait_minutes(mut self, wait_minutes: u64) -> Self {
        self.wait_minutes = wait_minutes;
        self
    }

    /// Evaluate the gate. Collaborator errors are logged and reported as a
    /// failed outcome.
    pub async fn evaluate(
        &self,
        package: &str,
        target: &str,
        source_dir: &Path,
        skip_coverage_validation: bool,
    ) -> GateOutcome {
        match self
            .try_evaluate(package, target, source_dir, skip_coverage_validation)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!("{:#}", err);
                GateOutcome::failed(TEST_EXECUTION_FAILED)
            }
        }
    }

    async fn try_evaluate(
        &self,
        package: &str,
        target: &str,
        source_dir: &Path,
        skip_coverage_validation: bool,
    ) -> anyhow::Result<GateOutcome> {
        let request = TestRequest {
            package,
            target,
            source_dir,
            wait_minutes: self.wait_minutes,
        };
        let run = self
            .runner
            .run_tests(&request)
            .await
            .with_context(|| format!("Failed to run tests for {}", package))?;

        if !run.passed {
            return Ok(GateOutcome::failed(run.message));
        }
        if skip_coverage_validation {
            tracing::info!("Skipping coverage validation of {}", package);
            return Ok(GateOutcome::passed(run.message));
        }

        let coverage = self
            .coverage
            .package_coverage(package, &run.id)
            .with_context(|| format!("Failed to read coverage for {}", package))?;

        if coverage >= self.threshold {
            Ok(GateOutcome::passed(format!(
                "Package {} has {:.2}% coverage, meeting the {}% threshold",
                package, coverage, self.threshold
            )))
        } else {
            Ok(GateOutcome::failed(format!(
                "Package {} has {:.2}% coverage, below the {}% threshold",
                package, coverage, self.threshold
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::ports::TestRunOutcome;
    use async_trait::async_trait;

    struct Runner(anyhow::Result<bool>);

    #[async_trait]
    impl TestRunner for Runner {
        async fn run_tests(&self, _request: &TestRequest<'_>) -> anyhow::Result<TestRunOutcome> {
            match &self.0 {
                Ok(passed) => Ok(TestRunOutcome {
                    id: "run-1".to_string(),
                    passed: *passed,
                    message: "done".to_string(),
                }),
                Err(err) => Err(anyhow::anyhow!("{err}")),
            }
        }
    }

    struct Coverage(Option<f64>);

    impl CoverageReader for Coverage {
        fn package_coverage(&self, _package: &str, _run_id: &str) -> anyhow::Result<f64> {
            self.0.ok_or_else(|| anyhow::anyhow!("no coverage report"))
        }
    }

    async fn evaluate(runner: Runner, coverage: Coverage, skip_coverage: bool) -> GateOutcome {
        TestGate::new(&runner, &coverage)
            .evaluate("core", "qa", Path::new("/src"), skip_coverage)
            .await
    }

    #[tokio::test]
    async fn passes_at_threshold() {
        let outcome = evaluate(Runner(Ok(true)), Coverage(Some(75.0)), false).await;
        assert!(outcome.passed);
    }

    #[tokio::test]
    async fn fails_below_threshold() {
        let outcome = evaluate(Runner(Ok(true)), Coverage(Some(74.9)), false).await;
        assert!(!outcome.passed);
    }

    #[tokio::test]
    async fn skipping_coverage_ignores_reader() {
        let outcome = evaluate(Runner(Ok(true)), Coverage(None), true).await;
        assert!(outcome.passed);
    }

    #[tokio::test]
    async fn failing_tests_fail_gate() {
        let outcome = evaluate(Runner(Ok(false)), Coverage(Some(100.0)), false).await;
        assert!(!outcome.passed);
        assert_eq!(outcome.message, "done");
    }

    #[tokio::test]
    async fn collaborator_errors_become_generic_failure() {
        let outcome = evaluate(Runner(Err(anyhow::anyhow!("no org"))), Coverage(None), false).await;
        assert_eq!(outcome, GateOutcome::failed(TEST_EXECUTION_FAILED));

        let outcome = evaluate(Runner(Ok(true)), Coverage(None), false).await;
        assert_eq!(outcome.message, TEST_EXECUTION_FAILED);
    }
}
