//! Artifact discovery on disk.
//!
//! An artifact is either a directory holding `artifact_metadata.json` and a
//! `source/` directory, or a `.zip` archive with the same layout. Archives are
//! extracted into a staging directory keyed by the archive path.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use super::Artifact;

pub const ARTIFACT_METADATA_FILE: &str = "artifact_metadata.json";
pub const ARTIFACT_SOURCE_DIR: &str = "source";

/// Discover all artifacts directly under `artifact_dir`.
///
/// Returns an empty list when the directory does not exist. Entries are
/// visited in file-name order so resolution is deterministic.
pub fn discover_artifacts(artifact_dir: &Path, staging_dir: &Path) -> anyhow::Result<Vec<Artifact>> {
    if !artifact_dir.exists() {
        return Ok(Vec::new());
    }

    let mut entries: Vec<PathBuf> = fs::read_dir(artifact_dir)
        .with_context(|| format!("Failed to read artifact directory: {}", artifact_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    let mut artifacts = Vec::new();
    for path in entries {
        if path.is_dir() {
            if let Some(root) = locate_artifact_root(&path) {
                artifacts.push(Artifact::load(&root)?);
            }
        } else if is_zip(&path) {
            let extracted = extract_archive(&path, staging_dir)?;
            match locate_artifact_root(&extracted) {
                Some(root) => artifacts.push(Artifact::load(&root)?),
                None => tracing::warn!(
                    "Archive {} does not contain {}; ignoring",
                    path.display(),
                    ARTIFACT_METADATA_FILE
                ),
            }
        }
    }

    tracing::debug!(
        "Discovered {} artifact(s) in {}",
        artifacts.len(),
        artifact_dir.display()
    );
    Ok(artifacts)
}

fn is_zip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

/// Find the directory holding the metadata file: the directory itself or a
/// single nested directory one level down (archives usually wrap content).
fn locate_artifact_root(dir: &Path) -> Option<PathBuf> {
    if dir.join(ARTIFACT_METADATA_FILE).is_file() {
        return Some(dir.to_path_buf());
    }
    let mut nested = fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir() && p.join(ARTIFACT_METADATA_FILE).is_file())
        .collect::<Vec<_>>();
    nested.sort();
    nested.into_iter().next()
}

/// Staging location for an archive.
///
/// Keyed by a hash of the archive path so repeated runs reuse the same
/// directory and distinct archives never collide.
pub fn staging_path_for(archive: &Path, staging_dir: &Path) -> PathBuf {
    let path = fs::canonicalize(archive).unwrap_or_else(|_| archive.to_path_buf());
    let hash = blake3::hash(path.to_string_lossy().as_bytes());
    staging_dir.join(hash.to_hex().as_str())
}

fn extract_archive(archive: &Path, staging_dir: &Path) -> anyhow::Result<PathBuf> {
    let dest = staging_path_for(archive, staging_dir);
    if dest.exists() {
        fs::remove_dir_all(&dest).with_context(|| {
            format!("Failed to clear staging directory: {}", dest.display())
        })?;
    }
    fs::create_dir_all(&dest)
        .with_context(|| format!("Failed to create staging directory: {}", dest.display()))?;

    let file = fs::File::open(archive)
        .with_context(|| format!("Failed to open artifact archive: {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to read artifact archive: {}", archive.display()))?;
    zip.extract(&dest)
        .with_context(|| format!("Failed to extract artifact archive: {}", archive.display()))?;

    Ok(dest)
}
