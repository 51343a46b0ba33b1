//! Promotion policy for production-like targets.

use crate::error::DeployError;
use crate::manifest::PackageDescriptor;

use super::ports::TargetInspector;
use super::resolver::PackageInfos;

/// Queued packages whose artifact has not been promoted.
pub fn unpromoted_packages(queue: &[PackageDescriptor], infos: &PackageInfos) -> Vec<String> {
    queue
        .iter()
        .filter(|d| {
            infos
                .get(&d.package)
                .is_some_and(|info| !info.metadata.is_promoted)
        })
        .map(|d| d.package.clone())
        .collect()
}

/// Fail when a non-sandbox target would receive unpromoted packages.
pub async fn check_promotion(
    queue: &[PackageDescriptor],
    infos: &PackageInfos,
    target: &str,
    inspector: &dyn TargetInspector,
) -> Result<(), DeployError> {
    let is_sandbox = inspector
        .is_sandbox(target)
        .await
        .map_err(DeployError::Environment)?;
    if is_sandbox {
        tracing::debug!("{} is a sandbox, skipping promotion check", target);
        return Ok(());
    }

    let packages = unpromoted_packages(queue, infos);
    if packages.is_empty() {
        Ok(())
    } else {
        Err(DeployError::PackagesNotPromoted { packages })
    }
}
