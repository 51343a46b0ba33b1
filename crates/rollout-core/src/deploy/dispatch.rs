//! Route one package to the install routine for its kind.

use std::path::PathBuf;

use crate::manifest::PackageDescriptor;
use crate::types::{DeploymentMode, InstallationResult, PackageKind};

use super::ports::{InstallRequest, PackageInstaller, SourceInstallOptions, UnlockedInstallOptions};

/// Stage whose source deployments carry the prepare ignore file.
pub const PREPARE_STAGE: &str = "prepare";

/// Ignore file location inside a package's source directory.
pub const PREPARE_IGNORE_FILE: &str = "forceignores/.prepareignore";

/// Which routine a package goes through, and with what options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Unlocked(UnlockedInstallOptions),
    Source(SourceInstallOptions),
    Data,
}

/// Decide the routine for a kind under a deployment mode.
pub fn route(mode: DeploymentMode, kind: PackageKind, descriptor: &PackageDescriptor) -> Route {
    match (mode, kind) {
        (DeploymentMode::Normal, PackageKind::Unlocked) => {
            Route::Unlocked(UnlockedInstallOptions::default())
        }
        (DeploymentMode::Normal, PackageKind::Source) => Route::Source(SourceInstallOptions {
            optimize_deployment: descriptor.optimized_deployment(),
            skip_testing: descriptor.skip_testing,
            ignore_file: None,
        }),
        (DeploymentMode::SourcePackagesOnly, PackageKind::Unlocked | PackageKind::Source) => {
            Route::Source(SourceInstallOptions {
                optimize_deployment: false,
                skip_testing: true,
                ignore_file: None,
            })
        }
        (_, PackageKind::Data) => Route::Data,
    }
}

/// Invokes exactly one install routine per call.
pub struct InstallDispatcher<'a> {
    installer: &'a dyn PackageInstaller,
    mode: DeploymentMode,
    stage: Option<&'a str>,
}

impl<'a> InstallDispatcher<'a> {
    pub fn new(installer: &'a dyn PackageInstaller, mode: DeploymentMode, stage: Option<&'a str>) -> Self {
        Self {
            installer,
            mode,
            stage,
        }
    }

    pub async fn dispatch(
        &self,
        kind: PackageKind,
        request: &InstallRequest<'_>,
        descriptor: &PackageDescriptor,
    ) -> anyhow::Result<InstallationResult> {
        match route(self.mode, kind, descriptor) {
            Route::Unlocked(options) => self.installer.install_unlocked(request, &options).await,
            Route::Source(mut options) => {
                options.ignore_file = self.ignore_file_for(request);
                self.installer.install_source(request, &options).await
            }
            Route::Data => self.installer.install_data(request).await,
        }
    }

    fn ignore_file_for(&self, request: &InstallRequest<'_>) -> Option<PathBuf> {
        match self.stage {
            Some(stage) if stage.eq_ignore_ascii_case(PREPARE_STAGE) => {
                Some(request.source_dir.join(PREPARE_IGNORE_FILE))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_mode_routes_by_kind() {
        let descriptor = PackageDescriptor::new("core");
        assert_eq!(
            route(DeploymentMode::Normal, PackageKind::Unlocked, &descriptor),
            Route::Unlocked(UnlockedInstallOptions::default())
        );
        assert_eq!(
            route(DeploymentMode::Normal, PackageKind::Data, &descriptor),
            Route::Data
        );
    }

    #[test]
    fn normal_source_honours_descriptor_flags() {
        let descriptor = PackageDescriptor::new("core")
            .with_optimized_deployment(false)
            .with_skip_testing(true);
        let Route::Source(options) = route(DeploymentMode::Normal, PackageKind::Source, &descriptor)
        else {
            panic!("expected source route");
        };
        assert!(!options.optimize_deployment);
        assert!(options.skip_testing);
    }

    #[test]
    fn source_is_optimized_unless_disabled() {
        let descriptor = PackageDescriptor::new("core");
        let Route::Source(options) = route(DeploymentMode::Normal, PackageKind::Source, &descriptor)
        else {
            panic!("expected source route");
        };
        assert!(options.optimize_deployment);
        assert!(!options.skip_testing);
    }

    #[test]
    fn source_packages_only_mode_deploys_unlocked_as_source() {
        let descriptor = PackageDescriptor::new("core").with_optimized_deployment(true);
        let expected = Route::Source(SourceInstallOptions {
            optimize_deployment: false,
            skip_testing: true,
            ignore_file: None,
        });
        assert_eq!(
            route(DeploymentMode::SourcePackagesOnly, PackageKind::Unlocked, &descriptor),
            expected
        );
        assert_eq!(
            route(DeploymentMode::SourcePackagesOnly, PackageKind::Source, &descriptor),
            expected
        );
        assert_eq!(
            route(DeploymentMode::SourcePackagesOnly, PackageKind::Data, &descriptor),
            Route::Data
        );
    }
}
