//! Configuration layer merging.
//!
//! Global -> Project: a value set in a later layer replaces the earlier one.

use super::schema::{CommandsSection, DeploySection, RolloutConfig};

/// Merge the global and project layers.
pub fn merge_configs(global: Option<RolloutConfig>, project: Option<RolloutConfig>) -> RolloutConfig {
    let mut merged = global.unwrap_or_default();
    if let Some(project) = project {
        merge_deploy_section(&mut merged.deploy, project.deploy);
        merge_commands_section(&mut merged.commands, project.commands);
    }
    merged
}

fn merge_deploy_section(base: &mut DeploySection, layer: DeploySection) {
    macro_rules! take {
        ($($field:ident),*) => {
            $(if layer.$field.is_some() {
                base.$field = layer.$field;
            })*
        };
    }
    take!(
        target,
        artifact_dir,
        mode,
        run_tests,
        skip_if_installed,
        coverage_threshold,
        wait_minutes,
        stage,
        baseline,
        check_promoted,
        retry_on_failure,
        retry_delay_secs,
        project_manifest,
        log_groups,
        staging_dir
    );
}

fn merge_commands_section(base: &mut CommandsSection, layer: CommandsSection) {
    macro_rules! take {
        ($($field:ident),*) => {
            $(if layer.$field.is_some() {
                base.$field = layer.$field;
            })*
        };
    }
    take!(
        install_unlocked,
        install_source,
        install_data,
        installed,
        sandbox,
        test,
        test_output_dir
    );
}
