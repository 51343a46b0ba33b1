//! Coverage read from JSON reports written by the test command.

use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

use crate::deploy::ports::CoverageReader;

pub const COVERAGE_REPORT_FILE: &str = "coverage.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassCoverage {
    #[allow(dead_code)]
    name: String,
    total_lines: u64,
    covered_lines: u64,
}

/// Reads `<output_dir>/<package>/coverage.json`.
#[derive(Debug, Clone)]
pub struct JsonCoverageReader {
    output_dir: PathBuf,
}

impl JsonCoverageReader {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }
}

impl CoverageReader for JsonCoverageReader {
    fn package_coverage(&self, package: &str, run_id: &str) -> anyhow::Result<f64> {
        let path = self.output_dir.join(package).join(COVERAGE_REPORT_FILE);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read coverage report: {}", path.display()))?;
        let classes: Vec<ClassCoverage> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse coverage report: {}", path.display()))?;

        let total: u64 = classes.iter().map(|c| c.total_lines).sum();
        let covered: u64 = classes.iter().map(|c| c.covered_lines).sum();
        if total == 0 {
            anyhow::bail!(
                "Coverage report for {} (run {}) has no coverable lines",
                package,
                run_id
            );
        }
        Ok(covered as f64 * 100.0 / total as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_report(dir: &std::path::Path, package: &str, json: &str) {
        let package_dir = dir.join(package);
        std::fs::create_dir_all(&package_dir).unwrap();
        std::fs::write(package_dir.join(COVERAGE_REPORT_FILE), json).unwrap();
    }

    #[test]
    fn aggregates_lines_across_classes() {
        let temp = tempfile::tempdir().unwrap();
        write_report(
            temp.path(),
            "core",
            r#"[
                {"name": "AccountService", "totalLines": 30, "coveredLines": 30},
                {"name": "ContactService", "totalLines": 10, "coveredLines": 0}
            ]"#,
        );
        let reader = JsonCoverageReader::new(temp.path().to_path_buf());
        assert_eq!(reader.package_coverage("core", "run-1").unwrap(), 75.0);
    }

    #[test]
    fn empty_report_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        write_report(temp.path(), "core", "[]");
        let reader = JsonCoverageReader::new(temp.path().to_path_buf());
        assert!(reader.package_coverage("core", "run-1").is_err());
    }

    #[test]
    fn missing_report_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let reader = JsonCoverageReader::new(temp.path().to_path_buf());
        assert!(reader.package_coverage("core", "run-1").is_err());
    }
}
