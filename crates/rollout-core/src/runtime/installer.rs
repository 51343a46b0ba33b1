//! Install routines backed by external commands.

use async_trait::async_trait;
use serde::Deserialize;

use crate::deploy::ports::{
    InstallRequest, PackageInstaller, SourceInstallOptions, UnlockedInstallOptions,
};
use crate::types::{InstallationResult, InstallationStatus, PackageKind};

use super::{CommandOutput, CommandSpec, Placeholders, run_command};

/// Report an install command may print as its last stdout line.
#[derive(Debug, Deserialize)]
struct InstallReport {
    result: InstallationStatus,
    #[serde(default)]
    message: Option<String>,
}

/// One command per package kind.
#[derive(Debug, Clone, Default)]
pub struct CommandInstaller {
    pub unlocked: Option<CommandSpec>,
    pub source: Option<CommandSpec>,
    pub data: Option<CommandSpec>,
}

impl CommandInstaller {
    pub fn new(
        unlocked: Option<CommandSpec>,
        source: Option<CommandSpec>,
        data: Option<CommandSpec>,
    ) -> Self {
        Self {
            unlocked,
            source,
            data,
        }
    }

    async fn run(
        &self,
        kind: PackageKind,
        spec: Option<&CommandSpec>,
        placeholders: Placeholders,
    ) -> anyhow::Result<InstallationResult> {
        let spec = spec
            .ok_or_else(|| anyhow::anyhow!("No install command configured for {} packages", kind))?;
        let output = run_command(spec, &placeholders).await?;
        Ok(interpret(&output))
    }
}

fn request_placeholders(request: &InstallRequest<'_>) -> Placeholders {
    Placeholders::new()
        .set("package", request.package)
        .set("target", request.target)
        .set("source_dir", request.source_dir.display())
        .set("version", &request.metadata.package_version_number)
        .set(
            "version_id",
            request.metadata.package_version_id.as_deref().unwrap_or_default(),
        )
        .set("kind", &request.metadata.package_type)
        .set("wait", request.wait_minutes)
}

/// The JSON report wins; otherwise the exit status decides.
fn interpret(output: &CommandOutput) -> InstallationResult {
    if let Some(report) = output.last_json_line::<InstallReport>() {
        return InstallationResult {
            status: report.result,
            message: report.message,
        };
    }
    if output.success {
        InstallationResult::succeeded()
    } else {
        InstallationResult::failed(output.failure_message())
    }
}

#[async_trait]
impl PackageInstaller for CommandInstaller {
    async fn install_unlocked(
        &self,
        request: &InstallRequest<'_>,
        options: &UnlockedInstallOptions,
    ) -> anyhow::Result<InstallationResult> {
        let placeholders = request_placeholders(request)
            .set("publish_wait", options.publish_wait_minutes)
            .set("compile_scope", &options.compile_scope)
            .set("security_type", &options.security_type)
            .set("upgrade_type", &options.upgrade_type)
            .set(
                "installation_key",
                options.installation_key.as_deref().unwrap_or_default(),
            );
        self.run(PackageKind::Unlocked, self.unlocked.as_ref(), placeholders)
            .await
    }

    async fn install_source(
        &self,
        request: &InstallRequest<'_>,
        options: &SourceInstallOptions,
    ) -> anyhow::Result<InstallationResult> {
        let ignore_file = options
            .ignore_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let placeholders = request_placeholders(request)
            .set("optimize", options.optimize_deployment)
            .set("skip_testing", options.skip_testing)
            .set("ignore_file", ignore_file);
        self.run(PackageKind::Source, self.source.as_ref(), placeholders)
            .await
    }

    async fn install_data(&self, request: &InstallRequest<'_>) -> anyhow::Result<InstallationResult> {
        self.run(PackageKind::Data, self.data.as_ref(), request_placeholders(request))
            .await
    }
}
