//! Target queries backed by external commands.

use anyhow::Context;
use async_trait::async_trait;

use crate::deploy::ports::{InstalledArtifact, TargetInspector};

use super::{CommandSpec, Placeholders, run_command};

#[derive(Debug, Clone, Default)]
pub struct CommandTargetInspector {
    /// Prints `[{"name", "version"}]` for `{target}`
    pub installed: Option<CommandSpec>,
    /// Exits 0 when `{target}` is a sandbox
    pub sandbox: Option<CommandSpec>,
}

impl CommandTargetInspector {
    pub fn new(installed: Option<CommandSpec>, sandbox: Option<CommandSpec>) -> Self {
        Self { installed, sandbox }
    }
}

#[async_trait]
impl TargetInspector for CommandTargetInspector {
    async fn installed_artifacts(&self, target: &str) -> anyhow::Result<Vec<InstalledArtifact>> {
        let spec = self
            .installed
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No installed-artifacts command configured"))?;
        let output = run_command(spec, &Placeholders::new().set("target", target)).await?;
        if !output.success {
            anyhow::bail!(
                "Installed-artifacts command failed for {}: {}",
                target,
                output.failure_message()
            );
        }
        serde_json::from_str(output.stdout.trim())
            .with_context(|| format!("Invalid installed-artifacts listing for {}", target))
    }

    async fn is_sandbox(&self, target: &str) -> anyhow::Result<bool> {
        let Some(spec) = &self.sandbox else {
            return Ok(false);
        };
        let output = run_command(spec, &Placeholders::new().set("target", target)).await?;
        Ok(output.success)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parses_installed_listing() {
        let listing = r#"[{"name":"core","version":"1.0.0.4"}]"#;
        let inspector = CommandTargetInspector::new(
            Some(CommandSpec::new("sh").with_args(["-c", format!("echo '{}'", listing).as_str()])),
            None,
        );
        let installed = inspector.installed_artifacts("qa").await.unwrap();
        assert_eq!(installed, vec![InstalledArtifact::new("core", "1.0.0.4")]);
    }

    #[tokio::test]
    async fn sandbox_follows_exit_status() {
        let inspector = CommandTargetInspector::new(None, Some(CommandSpec::new("true")));
        assert!(inspector.is_sandbox("qa").await.unwrap());

        let inspector = CommandTargetInspector::new(None, Some(CommandSpec::new("false")));
        assert!(!inspector.is_sandbox("qa").await.unwrap());
    }

    #[tokio::test]
    async fn no_sandbox_command_means_production_like() {
        let inspector = CommandTargetInspector::default();
        assert!(!inspector.is_sandbox("prod").await.unwrap());
        assert!(inspector.installed_artifacts("prod").await.is_err());
    }
}
