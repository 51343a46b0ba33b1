//! Progress text for a deployment run.
//!
//! Renderers return plain strings; callers decide whether they go to the log
//! or to stdout.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::manifest::PackageDescriptor;
use crate::types::PackageKind;

use super::resolver::{PackageInfo, PackageInfos};

const RULE_WIDTH: usize = 79;

/// Markers wrapping each package's output, e.g. CI log groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogGroupMarkers {
    pub open: String,
    pub close: String,
}

impl LogGroupMarkers {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// GitHub Actions style `::group::` / `::endgroup::` markers.
    pub fn github() -> Self {
        Self::new("::group::", "::endgroup::")
    }

    pub fn open_line(&self, title: &str) -> String {
        format!("{}{}", self.open, title)
    }

    pub fn close_line(&self) -> String {
        self.close.clone()
    }
}

fn rule() -> String {
    "-".repeat(RULE_WIDTH)
}

/// Header printed before a package is installed.
pub fn package_header(
    descriptor: &PackageDescriptor,
    info: &PackageInfo,
    kind: PackageKind,
    skip_if_installed: bool,
) -> String {
    let metadata = &info.metadata;
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(out, "Installing package");
    let _ = writeln!(out, "Name: {}", descriptor.package);
    let _ = writeln!(out, "Type: {}", kind);
    let _ = writeln!(out, "Version Number: {}", metadata.package_version_number);
    if let Some(count) = metadata.metadata_count {
        let _ = writeln!(out, "Metadata Count: {}", count);
    }
    if kind != PackageKind::Unlocked {
        let _ = writeln!(
            out,
            "Contains executable logic: {}",
            metadata.contains_executable_logic
        );
    }
    if skip_if_installed {
        let _ = writeln!(out, "Always Deploy: {}", descriptor.always_deploy);
    }
    let _ = write!(out, "{}", rule());
    out
}

/// Banner printed before a retried installation.
pub fn retry_header(package: &str, attempt: u32) -> String {
    format!(
        "{}\nRetrying installation of {} (attempt {})\n{}",
        rule(),
        package,
        attempt,
        rule()
    )
}

/// Table of queued packages and the version each will receive.
pub fn queue_table(queue: &[PackageDescriptor], infos: &PackageInfos) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Packages to be deployed:");
    let _ = writeln!(out, "  {:<30} {:<20} Kind", "Package", "Version");
    let _ = writeln!(out, "  {}", "-".repeat(60));
    for descriptor in queue {
        let (version, kind) = infos
            .get(&descriptor.package)
            .map(|info| {
                (
                    info.version().to_string(),
                    info.metadata.package_type.clone(),
                )
            })
            .unwrap_or_else(|| ("-".to_string(), "-".to_string()));
        let _ = writeln!(
            out,
            "  {:<30} {:<20} {}",
            descriptor.package, version, kind
        );
    }
    out.truncate(out.trim_end().len());
    out
}

/// Incoming version against the baseline for every candidate package.
pub fn breakdown_table(candidates: &[PackageDescriptor], infos: &PackageInfos, baseline: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Full deployment breakdown against {}:", baseline);
    let _ = writeln!(
        out,
        "  {:<30} {:<20} {:<20} To be installed?",
        "Package", "Incoming Version", "Version in baseline"
    );
    let _ = writeln!(out, "  {}", "-".repeat(90));
    for descriptor in candidates {
        let Some(info) = infos.get(&descriptor.package) else {
            continue;
        };
        let baseline_version = info
            .version_installed_in_baseline
            .as_deref()
            .unwrap_or("N/A");
        let install = if info.is_installed { "No" } else { "Yes" };
        let _ = writeln!(
            out,
            "  {:<30} {:<20} {:<20} {}",
            descriptor.package,
            info.version(),
            baseline_version,
            install
        );
    }
    out.truncate(out.trim_end().len());
    out
}

/// Emit a multi-line block through `tracing` one line at a time.
pub(crate) fn log_block(block: &str) {
    for line in block.lines() {
        tracing::info!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{Artifact, PackageMetadata};
    use crate::deploy::resolver::resolve_package_infos;
    use std::path::PathBuf;

    fn infos() -> PackageInfos {
        let metadata: PackageMetadata = serde_json::from_value(serde_json::json!({
            "package_name": "core",
            "package_version_number": "1.2.0.3",
            "package_type": "source",
            "metadataCount": 42,
            "isApexFound": true,
        }))
        .unwrap();
        resolve_package_infos(&[Artifact::new(metadata, PathBuf::from("/a/core"))]).unwrap()
    }

    #[test]
    fn header_lists_package_facts() {
        let infos = infos();
        let descriptor = PackageDescriptor::new("core").with_always_deploy(true);
        let header = package_header(&descriptor, &infos["core"], PackageKind::Source, true);
        assert!(header.contains("Name: core"));
        assert!(header.contains("Type: source"));
        assert!(header.contains("Version Number: 1.2.0.3"));
        assert!(header.contains("Metadata Count: 42"));
        assert!(header.contains("Contains executable logic: true"));
        assert!(header.contains("Always Deploy: true"));
    }

    #[test]
    fn unlocked_header_omits_executable_logic() {
        let infos = infos();
        let descriptor = PackageDescriptor::new("core");
        let header = package_header(&descriptor, &infos["core"], PackageKind::Unlocked, false);
        assert!(!header.contains("executable logic"));
        assert!(!header.contains("Always Deploy"));
    }

    #[test]
    fn breakdown_marks_installed_packages() {
        let mut infos = infos();
        if let Some(info) = infos.get_mut("core") {
            info.version_installed_in_baseline = Some("1.2.0.3".to_string());
            info.is_installed = true;
        }
        let table = breakdown_table(&[PackageDescriptor::new("core")], &infos, "qa");
        let row = table.lines().last().unwrap();
        assert!(row.contains("1.2.0.3"));
        assert!(row.ends_with("No"));
    }

    #[test]
    fn github_markers() {
        let markers = LogGroupMarkers::github();
        assert_eq!(markers.open_line("Installing core"), "::group::Installing core");
        assert_eq!(markers.close_line(), "::endgroup::");
    }
}
