//! Built package artifacts and their metadata documents.

pub mod discovery;

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::DeployError;
use crate::types::PackageKind;

pub use discovery::{ARTIFACT_METADATA_FILE, ARTIFACT_SOURCE_DIR, discover_artifacts};

/// Metadata document written by the build step next to each artifact.
///
/// Unknown fields are ignored so newer build tooling can add fields freely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub package_name: String,

    pub package_version_number: String,

    /// Declared kind as written by the build ("unlocked", "source", "data")
    pub package_type: String,

    /// Installable version id (unlocked packages only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_version_id: Option<String>,

    /// Whether the package contains executable logic that must be tested
    #[serde(
        default,
        rename = "isApexFound",
        alias = "containsExecutableLogic",
        alias = "contains_executable_logic"
    )]
    pub contains_executable_logic: bool,

    /// Whether the artifact was approved for production-like targets
    #[serde(default, rename = "isPromoted", alias = "is_promoted")]
    pub is_promoted: bool,

    #[serde(default, rename = "metadataCount", alias = "metadata_count")]
    pub metadata_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_details: Option<CreationDetails>,

    /// Snapshot of the release manifest at build time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl PackageMetadata {
    /// Parse the declared kind.
    pub fn kind(&self) -> Result<PackageKind, DeployError> {
        self.package_type.parse()
    }

    /// Build timestamp in milliseconds, if recorded.
    pub fn created_at(&self) -> Option<i64> {
        self.creation_details.as_ref().and_then(|d| d.timestamp)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreationDetails {
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// An already-built package output ready for installation.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub metadata: PackageMetadata,
    /// Directory holding the package source content
    pub source_dir: PathBuf,
}

impl Artifact {
    pub fn new(metadata: PackageMetadata, source_dir: PathBuf) -> Self {
        Self {
            metadata,
            source_dir,
        }
    }

    pub fn package_name(&self) -> &str {
        &self.metadata.package_name
    }

    pub fn version(&self) -> &str {
        &self.metadata.package_version_number
    }

    /// Load an artifact from its root directory.
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        let metadata_path = root.join(ARTIFACT_METADATA_FILE);
        let content = std::fs::read_to_string(&metadata_path).with_context(|| {
            format!("Failed to read artifact metadata: {}", metadata_path.display())
        })?;
        let metadata: PackageMetadata = serde_json::from_str(&content).with_context(|| {
            format!(
                "Failed to parse artifact metadata: {}",
                metadata_path.display()
            )
        })?;
        Ok(Self::new(metadata, root.join(ARTIFACT_SOURCE_DIR)))
    }
}
