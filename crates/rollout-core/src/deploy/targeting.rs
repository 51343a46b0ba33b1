//! Per-package target selection from manifest whitelists and blacklists.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// Which target environments receive a package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TargetingPolicy {
    #[default]
    Everywhere,
    /// `deployOnTargets`: only these targets.
    Only(Vec<String>),
    /// `skipDeployOnOrgs`: every target except these.
    Except(Vec<String>),
}

impl TargetingPolicy {
    /// A whitelist wins over a blacklist when a descriptor declares both.
    pub fn new(deploy_on: Option<Vec<String>>, skip_on: Option<Vec<String>>) -> Self {
        match (deploy_on, skip_on) {
            (Some(only), _) => TargetingPolicy::Only(only),
            (None, Some(except)) => TargetingPolicy::Except(except),
            (None, None) => TargetingPolicy::Everywhere,
        }
    }

    pub fn should_deploy_to(&self, target: &str) -> bool {
        self.exclusion(target).is_none()
    }

    /// Reason `target` is excluded, or `None` when the package deploys there.
    pub fn exclusion(&self, target: &str) -> Option<&'static str> {
        match self {
            TargetingPolicy::Everywhere => None,
            TargetingPolicy::Only(targets) if targets.iter().any(|t| t == target) => None,
            TargetingPolicy::Only(_) => Some("target is not in deployOnTargets"),
            TargetingPolicy::Except(targets) if targets.iter().any(|t| t == target) => {
                Some("target is in skipDeployOnOrgs")
            }
            TargetingPolicy::Except(_) => None,
        }
    }
}

/// Deserialize an optional list of target names, rejecting a bare string or
/// any other non-array value.
pub(crate) fn target_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None => Ok(None),
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(name) => Ok(name),
                other => Err(D::Error::custom(format!(
                    "target names must be strings, got {}",
                    other
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(other) => Err(D::Error::custom(format!(
            "target list must be of type Array, got {}",
            other
        ))),
    }
}
