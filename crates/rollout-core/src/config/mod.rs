//! Configuration for deployment runs.
//!
//! `rollout.toml` is read from two scopes:
//! - Global: `<config dir>/rollout/rollout.toml`
//! - Project: `./rollout.toml`, overriding global values
//!
//! Command-line flags override both.

pub mod merge;
pub mod options;
pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

pub use merge::merge_configs;
pub use options::{DEFAULT_WAIT_MINUTES, DeployOptions};
pub use parser::{parse_rollout_toml, parse_rollout_toml_str};
pub use paths::{CONFIG_FILE_NAME, config_path_for_scope};
pub use schema::{CommandsSection, DeploySection, RolloutConfig};
pub use store::ConfigStore;
