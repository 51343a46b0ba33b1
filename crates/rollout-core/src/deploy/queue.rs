//! Build the ordered installation queue from the manifest.

use crate::error::DeployError;
use crate::manifest::{Manifest, PackageDescriptor};

use super::resolver::PackageInfos;

/// Select the manifest entries to process this run, in manifest order.
///
/// Filters are applied in a fixed order: entries without an artifact, entries
/// excluded for the target, then entries ignored on the current stage.
pub fn build_queue(
    manifest: &Manifest,
    infos: &PackageInfos,
    target: &str,
    stage: Option<&str>,
) -> Result<Vec<PackageDescriptor>, DeployError> {
    let queue: Vec<PackageDescriptor> = manifest
        .package_directories
        .iter()
        .filter(|d| infos.contains_key(&d.package))
        .filter(|d| match d.targeting().exclusion(target) {
            Some(reason) => {
                tracing::debug!("Skipping {} on target {}: {}", d.package, target, reason);
                false
            }
            None => true,
        })
        .filter(|d| match stage {
            Some(stage) if d.is_ignored_on_stage(stage) => {
                tracing::debug!("Ignoring {} on stage {}", d.package, stage);
                false
            }
            _ => true,
        })
        .cloned()
        .collect();

    if queue.is_empty() {
        return Err(DeployError::NothingToDeploy);
    }
    Ok(queue)
}
