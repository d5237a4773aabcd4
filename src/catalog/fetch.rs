//! Per-mod metadata lookup and compatible release selection.

use log::{debug, warn};
use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

use crate::http::StatusError;
use crate::package::{ArchiveName, PackageSet, ReleaseInfo};

use super::{Catalog, CatalogRelease};

/// Why a mod ended up without a compatible release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataIssue {
    /// The catalog has no mod under this name.
    NotFound,
    /// The lookup failed (server error, network error, malformed response).
    Unavailable(String),
    /// The mod exists but has no release for the game version.
    NoCompatibleRelease { compat: String },
    /// The selected release would not be stored as `<name>_<version>.zip`
    /// directly inside the mod directory.
    InvalidFileName { file_name: String },
}

/// A mod that will be skipped because its metadata could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataWarning {
    pub package: String,
    pub issue: MetadataIssue,
}

impl fmt::Display for MetadataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.issue {
            MetadataIssue::NotFound => {
                write!(f, "{}: not found on the mod portal, skipped", self.package)
            }
            MetadataIssue::Unavailable(reason) => write!(
                f,
                "{}: unable to retrieve metadata ({}), skipped",
                self.package, reason
            ),
            MetadataIssue::NoCompatibleRelease { compat } => write!(
                f,
                "{}: no release for Factorio {}, skipped",
                self.package, compat
            ),
            MetadataIssue::InvalidFileName { file_name } => write!(
                f,
                "{}: release file name '{}' is not an archive of this mod, skipped",
                self.package, file_name
            ),
        }
    }
}

/// Picks the release for `compat` (`<major>.<minor>`).
///
/// The portal lists releases oldest first, so the last match is the latest.
/// Versions are never compared; catalog order decides.
pub fn select_release<'a>(releases: &'a [CatalogRelease], compat: &str) -> Option<&'a CatalogRelease> {
    releases
        .iter()
        .rev()
        .find(|r| r.info_json.factorio_version == compat)
}

/// Whether `file_name` is a bare `<package>_<version>.zip` filename.
fn is_archive_of(file_name: &str, package: &str) -> bool {
    Path::new(file_name).file_name() == Some(OsStr::new(file_name))
        && ArchiveName::parse(file_name).is_some_and(|archive| archive.name == package)
}

/// Looks up every mod in `packages` and attaches its compatible release.
///
/// Each lookup is independent: a failure only leaves that mod's
/// `latest_release` unset and is reported in the returned warnings.
#[tracing::instrument(skip(catalog, packages))]
pub async fn fetch_metadata<C: Catalog + ?Sized>(
    catalog: &C,
    packages: &mut PackageSet,
    compat: &str,
) -> Vec<MetadataWarning> {
    let mut warnings = Vec::new();

    for record in packages.iter_mut() {
        record.latest_release = None;

        let issue = match catalog.full_info(&record.name).await {
            Ok(info) => match select_release(&info.releases, compat) {
                Some(release) if !is_archive_of(&release.file_name, &record.name) => {
                    MetadataIssue::InvalidFileName {
                        file_name: release.file_name.clone(),
                    }
                }
                Some(release) => {
                    debug!("{}: latest release for {} is {}", record.name, compat, release.version);
                    record.latest_release = Some(ReleaseInfo::from(release));
                    continue;
                }
                None => MetadataIssue::NoCompatibleRelease {
                    compat: compat.to_string(),
                },
            },
            Err(e) => match e.downcast_ref::<StatusError>() {
                Some(StatusError::NotFound) => MetadataIssue::NotFound,
                _ => MetadataIssue::Unavailable(format!("{:#}", e)),
            },
        };

        warn!("{}: metadata unavailable: {:?}", record.name, issue);
        warnings.push(MetadataWarning {
            package: record.name.clone(),
            issue,
        });
    }

    warnings
}
