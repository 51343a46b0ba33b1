//! Result and plan printing.

use console::style;

use rollout_core::deploy::{DeploymentPlan, DeploymentResult};

pub fn print_result_table(result: &DeploymentResult) {
    let elapsed = result.finished_at - result.started_at;

    if result.is_success() {
        println!(
            "{} Deployment succeeded ({} deployed, {} skipped) in {}s",
            style("✓").green(),
            result.deployed.len(),
            result.skipped.len(),
            elapsed.num_seconds()
        );
    } else {
        println!(
            "{} Deployment failed after {}s",
            style("✗").red(),
            elapsed.num_seconds()
        );
    }

    print_list("Deployed", &result.deployed);
    print_list("Skipped", &result.skipped);
    print_list("Failed", &result.failed);
    if let Some(package) = &result.test_failure {
        println!("  {:<12} {}", "Test failure", style(package).red());
    }
    if let Some(err) = &result.error {
        println!("  {:<12} {}", "Error", err);
    }
}

pub fn print_result_quiet(result: &DeploymentResult) {
    if let Some(err) = &result.error {
        println!("{} {}", style("✗").red(), err);
        print_list("Failed", &result.failed);
    }
}

fn print_list(label: &str, packages: &[String]) {
    if !packages.is_empty() {
        println!("  {:<12} {}", label, packages.join(", "));
    }
}

pub fn print_plan_table(plan: &DeploymentPlan) {
    if plan.is_empty() {
        println!("Nothing to deploy: all packages are already installed.");
        return;
    }

    println!(
        "  {:<30} {:<20} {:<10} Baseline",
        "Package", "Version", "Kind"
    );
    println!("  {}", "-".repeat(75));

    for descriptor in &plan.queue {
        let Some(info) = plan.package_infos.get(&descriptor.package) else {
            continue;
        };
        println!(
            "  {:<30} {:<20} {:<10} {}",
            descriptor.package,
            info.version(),
            info.metadata.package_type,
            info.version_installed_in_baseline.as_deref().unwrap_or("-")
        );
    }

    println!("\n{} packages to deploy", plan.queue.len());
}

pub fn plan_json(plan: &DeploymentPlan) -> serde_json::Value {
    let packages: Vec<_> = plan
        .queue
        .iter()
        .filter_map(|d| plan.package_infos.get(&d.package).map(|info| (d, info)))
        .map(|(descriptor, info)| {
            serde_json::json!({
                "package": descriptor.package,
                "version": info.version(),
                "kind": info.metadata.package_type,
                "always_deploy": descriptor.always_deploy,
                "version_in_baseline": info.version_installed_in_baseline,
            })
        })
        .collect();

    serde_json::json!({
        "baseline": plan.baseline,
        "packages": packages,
    })
}
