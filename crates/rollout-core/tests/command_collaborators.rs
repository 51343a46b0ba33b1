//! Orchestrator runs driven through command-backed collaborators.
#![cfg(unix)]

mod support;

use rollout_core::config::RolloutConfig;
use rollout_core::context::AppContext;
use rollout_core::deploy::DeployOrchestrator;
use rollout_core::error::DeployError;
use rollout_core::runtime::CommandSpec;
use tempfile::TempDir;

use support::{TARGET, artifact, artifact_with, write_plain_manifest};

fn sh(script: &str) -> CommandSpec {
    CommandSpec::new("sh").with_args(["-c", script])
}

fn context(temp: &TempDir) -> AppContext {
    AppContext::with_global_config_dir(
        temp.path().join("project"),
        temp.path().join("state"),
        temp.path().join("global"),
    )
}

fn config(temp: &TempDir, manifest: &std::path::Path) -> RolloutConfig {
    let mut config = RolloutConfig::new();
    config.deploy.target = Some(TARGET.to_string());
    config.deploy.artifact_dir = Some(temp.path().join("artifacts"));
    config.deploy.project_manifest = Some(manifest.to_path_buf());
    config.deploy.retry_delay_secs = Some(0);
    config
}

#[tokio::test]
async fn installs_with_configured_commands() {
    let temp = TempDir::new().unwrap();
    let manifest = write_plain_manifest(temp.path(), &["core", "seed"]);
    let log = temp.path().join("installs.log");

    let mut config = config(&temp, &manifest);
    config.commands.install_source = Some(sh(&format!(
        "echo {{package}}:{{version}}:{{optimize}} >> {}",
        log.display()
    )));
    config.commands.install_data = Some(sh(
        r#"echo '{"result":"skipped","message":"no changes"}'"#,
    ));

    let ctx = context(&temp);
    let options = ctx.deploy_options(&config).unwrap();
    let mut orchestrator = DeployOrchestrator::new(options, ctx.collaborators(&config.commands));
    let result = orchestrator
        .exec_with_artifacts(&[
            artifact("core", "1.0.0.4", "source"),
            artifact("seed", "1.0.0.1", "data"),
        ])
        .await;

    assert!(result.is_success(), "{:?}", result.error);
    assert_eq!(result.deployed, vec!["core"]);
    assert_eq!(result.skipped, vec!["seed"]);
    assert_eq!(
        std::fs::read_to_string(&log).unwrap().trim(),
        "core:1.0.0.4:true"
    );
}

#[tokio::test]
async fn missing_install_command_fails_the_package() {
    let temp = TempDir::new().unwrap();
    let manifest = write_plain_manifest(temp.path(), &["core"]);
    let config = config(&temp, &manifest);

    let ctx = context(&temp);
    let options = ctx.deploy_options(&config).unwrap();
    let mut orchestrator = DeployOrchestrator::new(options, ctx.collaborators(&config.commands));
    let result = orchestrator
        .exec_with_artifacts(&[artifact("core", "1.0.0.4", "unlocked")])
        .await;

    assert_eq!(result.failed, vec!["core"]);
    assert!(matches!(
        result.error,
        Some(DeployError::InstallationFailed { ref message, .. })
            if message.contains("No install command configured for unlocked packages")
    ));
}

#[tokio::test]
async fn coverage_report_gates_tested_packages() {
    let temp = TempDir::new().unwrap();
    let manifest = write_plain_manifest(temp.path(), &["core"]);

    let mut config = config(&temp, &manifest);
    config.deploy.run_tests = Some(true);
    config.commands.install_source = Some(sh("exit 0"));
    config.commands.test = Some(sh(
        r#"echo '[{"name":"Svc","totalLines":10,"coveredLines":5}]' > {output_dir}/coverage.json && echo '{"id":"r1","passed":true,"message":"ok"}'"#,
    ));

    let ctx = context(&temp);
    let options = ctx.deploy_options(&config).unwrap();
    let mut orchestrator = DeployOrchestrator::new(options, ctx.collaborators(&config.commands));
    let result = orchestrator
        .exec_with_artifacts(&[artifact_with(
            "core",
            "1.0.0.4",
            "source",
            serde_json::json!({ "isApexFound": true }),
        )])
        .await;

    assert_eq!(result.deployed, vec!["core"]);
    assert_eq!(result.test_failure.as_deref(), Some("core"));
    assert!(matches!(
        result.error,
        Some(DeployError::TestFailed { ref message, .. }) if message.contains("50.00%")
    ));
}
