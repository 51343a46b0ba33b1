//! Test trigger backed by an external command.

use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;

use crate::deploy::ports::{TestRequest, TestRunOutcome, TestRunner};

use super::{CommandSpec, Placeholders, run_command};

/// Runs the test command and reads `{"id", "passed", "message"}` from stdout.
#[derive(Debug, Clone)]
pub struct CommandTestRunner {
    spec: Option<CommandSpec>,
    output_dir: PathBuf,
}

impl CommandTestRunner {
    pub fn new(spec: Option<CommandSpec>, output_dir: PathBuf) -> Self {
        Self { spec, output_dir }
    }
}

#[async_trait]
impl TestRunner for CommandTestRunner {
    async fn run_tests(&self, request: &TestRequest<'_>) -> anyhow::Result<TestRunOutcome> {
        let spec = self
            .spec
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No test command configured"))?;
        let output_dir = self.output_dir.join(request.package);
        std::fs::create_dir_all(&output_dir).with_context(|| {
            format!("Failed to create test output directory: {}", output_dir.display())
        })?;

        let placeholders = Placeholders::new()
            .set("package", request.package)
            .set("target", request.target)
            .set("source_dir", request.source_dir.display())
            .set("wait", request.wait_minutes)
            .set("output_dir", output_dir.display());
        let output = run_command(spec, &placeholders).await?;

        match output.last_json_line::<TestRunOutcome>() {
            Some(outcome) => Ok(outcome),
            None if output.success => {
                anyhow::bail!("Test command for {} printed no result", request.package)
            }
            None => anyhow::bail!(
                "Test command for {} failed: {}",
                request.package,
                output.failure_message()
            ),
        }
    }
}
