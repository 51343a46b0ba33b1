//! Version normalization and ordering for artifact version numbers.
//!
//! Artifact builds stamp a fourth build segment onto their version
//! (`major.minor.patch.build`), which semver rejects. Before any comparison the
//! build-number delimiter is rewritten into a pre-release separator, so
//! `1.2.3.10` becomes `1.2.3-10` and orders after `1.2.3-4`.

use std::cmp::Ordering;

use crate::error::DeployError;

/// Number of non-digit characters preceding the build number.
const BUILD_NUMBER_DELIMITER_POSITION: usize = 3;

/// Convert the build-number dot delimiter into a hyphen.
///
/// Returns the input unchanged if the third delimiter is not a dot or the
/// version has fewer than three delimiters.
pub fn normalize_build_number(version: &str) -> String {
    match build_number_delimiter_index(version) {
        Some(index) if version[index..].starts_with('.') => {
            format!("{}-{}", &version[..index], &version[index + 1..])
        }
        _ => version.to_string(),
    }
}

/// Byte index of the build-number delimiter, if any.
fn build_number_delimiter_index(version: &str) -> Option<usize> {
    let mut delimiters = 0;
    for (index, ch) in version.char_indices() {
        if !ch.is_ascii_digit() {
            delimiters += 1;
        }
        if delimiters == BUILD_NUMBER_DELIMITER_POSITION {
            return Some(index);
        }
    }
    None
}

/// Parse an artifact version into semver after normalization.
pub fn parse_version(version: &str) -> Result<semver::Version, DeployError> {
    let normalized = normalize_build_number(version.trim());
    semver::Version::parse(&normalized).map_err(|e| DeployError::InvalidVersion {
        version: version.to_string(),
        reason: e.to_string(),
    })
}

/// Compare two artifact versions.
pub fn compare_versions(a: &str, b: &str) -> Result<Ordering, DeployError> {
    let a = parse_version(a)?;
    let b = parse_version(b)?;
    Ok(a.cmp(&b))
}

/// True if `candidate` is strictly newer than `current`.
pub fn is_newer(candidate: &str, current: &str) -> Result<bool, DeployError> {
    Ok(compare_versions(candidate, current)? == Ordering::Greater)
}
