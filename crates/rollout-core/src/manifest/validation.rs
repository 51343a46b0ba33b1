//! Manifest checks run before a deployment.

use crate::types::PackageKind;

use super::Manifest;

const BUILD_NUMBER_KEYWORDS: [&str; 2] = ["NEXT", "LATEST"];

/// Reject build-number keywords on kinds whose versions are stamped at build time.
///
/// `NEXT` and `LATEST` are only resolvable for unlocked packages.
pub fn validate_build_numbers(manifest: &Manifest) -> anyhow::Result<()> {
    let offending: Vec<&str> = manifest
        .package_directories
        .iter()
        .filter(|d| {
            matches!(
                d.declared_kind(),
                Ok(PackageKind::Source) | Ok(PackageKind::Data)
            )
        })
        .filter(|d| {
            d.version_number
                .as_deref()
                .map(has_build_number_keyword)
                .unwrap_or(false)
        })
        .map(|d| d.package.as_str())
        .collect();

    if !offending.is_empty() {
        anyhow::bail!(
            "The build-number keywords \"NEXT\" & \"LATEST\" are not supported for source & data packages. Please use 0 instead ({})",
            offending.join(", ")
        );
    }
    Ok(())
}

fn has_build_number_keyword(version: &str) -> bool {
    let upper = version.to_ascii_uppercase();
    BUILD_NUMBER_KEYWORDS.iter().any(|k| upper.ends_with(k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::PackageDescriptor;

    fn descriptor(name: &str, kind: Option<&str>, version: &str) -> PackageDescriptor {
        let mut d = PackageDescriptor::new(name);
        d.kind = kind.map(str::to_string);
        d.version_number = Some(version.to_string());
        d
    }

    #[test]
    fn unlocked_packages_may_use_keywords() {
        let manifest = Manifest::new(vec![
            descriptor("core", None, "1.0.0.NEXT"),
            descriptor("ui", Some("unlocked"), "1.0.0.latest"),
        ]);
        assert!(validate_build_numbers(&manifest).is_ok());
    }

    #[test]
    fn source_and_data_packages_reject_keywords() {
        let manifest = Manifest::new(vec![
            descriptor("core", Some("source"), "1.0.0.next"),
            descriptor("seed", Some("data"), "1.0.0.LATEST"),
            descriptor("ui", Some("source"), "1.0.0.0"),
        ]);
        let err = validate_build_numbers(&manifest).unwrap_err().to_string();
        assert!(err.ends_with("(core, seed)"));
    }
}
