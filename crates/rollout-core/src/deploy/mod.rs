//! Deployment pipeline: resolve artifacts, build the queue, install in order.
//!
//! ```text
//! artifacts -> resolver -> queue -> installed filter -> runner
//!                                                      |
//!                          dispatch -> retry -> (success) -> test gate
//! ```

pub mod dispatch;
pub mod gate;
pub mod installed;
pub mod orchestrator;
pub mod ports;
pub mod promotion;
pub mod queue;
pub mod report;
pub mod resolver;
pub mod retry;
pub mod runner;
pub mod targeting;

pub use dispatch::InstallDispatcher;
pub use gate::{DEFAULT_COVERAGE_THRESHOLD, GateOutcome, TestGate};
pub use installed::{InstalledArtifactsCache, filter_installed};
pub use orchestrator::{Collaborators, DeployOrchestrator, DeploymentPlan};
pub use queue::build_queue;
pub use report::LogGroupMarkers;
pub use resolver::{PackageInfo, PackageInfos, resolve_package_infos};
pub use retry::{RetryDecision, RetryPolicy, RetryingExecutor};
pub use runner::{DeploymentResult, RunSettings, SequentialRunner};
pub use targeting::TargetingPolicy;
