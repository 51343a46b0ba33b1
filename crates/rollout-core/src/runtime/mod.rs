//! Command-backed collaborators.
//!
//! Each collaborator runs an external program described by a [`CommandSpec`].
//! Arguments may contain `{name}` placeholders that are filled per call:
//!
//! | Placeholder      | Value                                        |
//! |------------------|----------------------------------------------|
//! | `{package}`      | package name                                 |
//! | `{target}`       | target environment                           |
//! | `{source_dir}`   | artifact source directory                    |
//! | `{version}`      | package version number                       |
//! | `{version_id}`   | installable version id (unlocked packages)   |
//! | `{kind}`         | declared package kind                        |
//! | `{wait}`         | wait time in minutes                         |
//! | `{optimize}`     | optimized deployment flag (source packages)  |
//! | `{skip_testing}` | skip-testing flag (source packages)          |
//! | `{ignore_file}`  | stage ignore file, empty when none           |
//! | `{output_dir}`   | per-package test output directory            |

mod coverage;
mod inspector;
mod installer;
mod test_runner;

use std::collections::BTreeMap;
use std::process::Stdio;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

pub use coverage::JsonCoverageReader;
pub use inspector::CommandTargetInspector;
pub use installer::CommandInstaller;
pub use test_runner::CommandTestRunner;

/// An external program with arguments and extra environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Arguments with placeholders filled in.
    pub fn render_args(&self, placeholders: &Placeholders) -> Vec<String> {
        self.args.iter().map(|arg| placeholders.render(arg)).collect()
    }
}

/// Placeholder values for one command invocation.
#[derive(Debug, Clone, Default)]
pub struct Placeholders {
    values: BTreeMap<&'static str, String>,
}

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: &'static str, value: impl ToString) -> Self {
        self.values.insert(name, value.to_string());
        self
    }

    /// Fill `{name}` tokens in one left-to-right pass. Substituted values are
    /// never rescanned and unknown tokens are kept as written.
    pub fn render(&self, template: &str) -> String {
        let mut rendered = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            rendered.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let known = after
                .find('}')
                .and_then(|close| self.values.get(&after[..close]).map(|value| (close, value)));
            match known {
                Some((close, value)) => {
                    rendered.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    rendered.push('{');
                    rest = after;
                }
            }
        }
        rendered.push_str(rest);
        rendered
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Short description of a failed run for error messages.
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        match (self.code, stderr.is_empty()) {
            (Some(code), true) => format!("exited with code {}", code),
            (None, true) => "terminated by signal".to_string(),
            (_, false) => stderr.to_string(),
        }
    }

    /// Last stdout line that parses as `T`.
    pub fn last_json_line<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        self.stdout
            .lines()
            .rev()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .find_map(|line| serde_json::from_str(line).ok())
    }
}

/// Spawn `spec` and wait for it to finish.
///
/// Only a spawn failure is an error; a non-zero exit is reported through
/// [`CommandOutput::success`].
pub async fn run_command(spec: &CommandSpec, placeholders: &Placeholders) -> anyhow::Result<CommandOutput> {
    let args = spec.render_args(placeholders);
    tracing::debug!("Running {} {}", spec.program, args.join(" "));

    let output = Command::new(&spec.program)
        .args(&args)
        .envs(&spec.env)
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("Failed to run command: {}", spec.program))?;

    Ok(CommandOutput {
        success: output.status.success(),
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
