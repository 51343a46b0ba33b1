//! Rollout Core Library
//!
//! Provides the domain logic for deploying versioned package artifacts into a
//! target environment in manifest order, with retry, skip-if-installed
//! filtering and post-install test gating.

pub mod artifact;
pub mod config;
pub mod context;
pub mod deploy;
pub mod error;
pub mod manifest;
pub mod runtime;
pub mod types;
pub mod version;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigStore, DeployOptions, DeploySection, RolloutConfig};
    pub use crate::context::AppContext;

    // Inputs
    pub use crate::artifact::{Artifact, PackageMetadata, discover_artifacts};
    pub use crate::manifest::{Manifest, PackageDescriptor};

    // Orchestration
    pub use crate::deploy::{
        Collaborators, DeployOrchestrator, DeploymentPlan, DeploymentResult, PackageInfo,
        PackageInfos,
    };
    pub use crate::deploy::ports::{
        CoverageReader, PackageInstaller, TargetInspector, TestRunner,
    };

    // Errors
    pub use crate::error::DeployError;

    // Shared types
    pub use crate::types::{DeploymentMode, InstallationResult, InstallationStatus, PackageKind};
}
