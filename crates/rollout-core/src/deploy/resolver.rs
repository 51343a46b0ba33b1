//! Resolve discovered artifacts into one package info per package name.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::artifact::{Artifact, PackageMetadata};
use crate::error::DeployError;
use crate::version;

/// An artifact selected for deployment, plus installed state learned during the run.
#[derive(Debug, Clone)]
pub struct PackageInfo {
    pub metadata: PackageMetadata,
    pub source_dir: PathBuf,
    /// Version found in the baseline environment, if any
    pub version_installed_in_baseline: Option<String>,
    /// Set when the baseline already has this version
    pub is_installed: bool,
}

impl PackageInfo {
    pub fn from_artifact(artifact: &Artifact) -> Self {
        Self {
            metadata: artifact.metadata.clone(),
            source_dir: artifact.source_dir.clone(),
            version_installed_in_baseline: None,
            is_installed: false,
        }
    }

    pub fn version(&self) -> &str {
        &self.metadata.package_version_number
    }
}

/// Package name to its authoritative package info.
pub type PackageInfos = HashMap<String, PackageInfo>;

/// Keep the highest version per package name.
///
/// Ties keep the first artifact seen. Versions are only parsed when two
/// artifacts share a name, so a lone artifact with an odd version never fails.
pub fn resolve_package_infos(artifacts: &[Artifact]) -> Result<PackageInfos, DeployError> {
    let mut infos = PackageInfos::new();

    for artifact in artifacts {
        let name = artifact.package_name();
        match infos.get(name) {
            Some(existing) => {
                if version::is_newer(artifact.version(), existing.version())? {
                    tracing::debug!(
                        "Artifact {} {} supersedes {}",
                        name,
                        artifact.version(),
                        existing.version()
                    );
                    infos.insert(name.to_string(), PackageInfo::from_artifact(artifact));
                }
            }
            None => {
                infos.insert(name.to_string(), PackageInfo::from_artifact(artifact));
            }
        }
    }

    Ok(infos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(name: &str, version: &str, dir: &str) -> Artifact {
        let metadata: PackageMetadata = serde_json::from_value(serde_json::json!({
            "package_name": name,
            "package_version_number": version,
            "package_type": "source",
        }))
        .unwrap();
        Artifact::new(metadata, PathBuf::from(dir))
    }

    #[test]
    fn highest_build_number_wins() {
        let artifacts = vec![
            artifact("core", "2.1.0.5", "/a/core-5"),
            artifact("core", "2.1.0.12", "/a/core-12"),
        ];
        let infos = resolve_package_infos(&artifacts).unwrap();
        assert_eq!(infos["core"].version(), "2.1.0.12");
        assert_eq!(infos["core"].source_dir, PathBuf::from("/a/core-12"));
    }

    #[test]
    fn order_of_discovery_does_not_matter() {
        let artifacts = vec![
            artifact("core", "2.1.0.12", "/a/core-12"),
            artifact("core", "2.1.0.5", "/a/core-5"),
        ];
        let infos = resolve_package_infos(&artifacts).unwrap();
        assert_eq!(infos["core"].version(), "2.1.0.12");
    }

    #[test]
    fn tie_keeps_first_seen() {
        let artifacts = vec![
            artifact("core", "1.0.0.1", "/a/first"),
            artifact("core", "1.0.0.1", "/a/second"),
        ];
        let infos = resolve_package_infos(&artifacts).unwrap();
        assert_eq!(infos["core"].source_dir, PathBuf::from("/a/first"));
    }

    #[test]
    fn distinct_packages_are_kept() {
        let artifacts = vec![artifact("core", "1.0.0", "/a/core"), artifact("ui", "junk", "/a/ui")];
        let infos = resolve_package_infos(&artifacts).unwrap();
        assert_eq!(infos.len(), 2);
        assert!(!infos["ui"].is_installed);
    }

    #[test]
    fn colliding_unparsable_version_fails() {
        let artifacts = vec![artifact("core", "1.0.0", "/a/1"), artifact("core", "one", "/a/2")];
        let err = resolve_package_infos(&artifacts).unwrap_err();
        assert!(matches!(err, DeployError::InvalidVersion { .. }));
    }
}
