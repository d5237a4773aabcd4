//! Executes reconciliation decisions against the mod directory.

use anyhow::{Context, Result};
use log::{info, warn};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::catalog::{Catalog, Credentials};
use crate::checksum;
use crate::package::{PackageRecord, ReleaseInfo, scan_archives};
use crate::runtime::Runtime;

use super::plan::{Action, ReplaceReason, plan};

/// Result of synchronising one mod. Every variant is a normal outcome; only
/// conditions that leave the mod directory in an unknown state are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No compatible release is known.
    Skipped,
    /// The installed archive matches the catalog digest.
    Verified { version: String },
    /// The mod was not installed and has been downloaded.
    Installed { version: String },
    /// Another version was installed and has been replaced.
    Updated { from: String, to: String },
    /// The installed archive was corrupt and has been downloaded again.
    Repaired { version: String },
    /// The catalog refused or failed the download.
    DownloadFailed { version: String, reason: String },
    /// The downloaded archive does not match the catalog digest.
    ChecksumMismatch { version: String },
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            SyncOutcome::Verified { .. }
                | SyncOutcome::Installed { .. }
                | SyncOutcome::Updated { .. }
                | SyncOutcome::Repaired { .. }
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            SyncOutcome::DownloadFailed { .. } | SyncOutcome::ChecksumMismatch { .. }
        )
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Skipped => write!(f, "missing metadata, skipping update!"),
            SyncOutcome::Verified { version } => write!(f, "'{}' is valid", version),
            SyncOutcome::Installed { version } => write!(f, "downloaded '{}'", version),
            SyncOutcome::Updated { from, to } => {
                write!(f, "updated from '{}' to '{}'", from, to)
            }
            SyncOutcome::Repaired { version } => {
                write!(f, "'{}' failed validation, downloaded again", version)
            }
            SyncOutcome::DownloadFailed { version, reason } => {
                write!(f, "unable to retrieve '{}' ({}), skipping!", version, reason)
            }
            SyncOutcome::ChecksumMismatch { version } => {
                write!(f, "download of '{}' did not match checksum!", version)
            }
        }
    }
}

/// What happened to one mod during a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSync {
    /// The action planned before execution.
    pub action: Action,
    /// Filenames removed from the mod directory.
    pub pruned: Vec<String>,
    pub outcome: SyncOutcome,
}

/// Brings single mods in line with their selected release, one at a time.
pub struct SyncExecutor<'a, R: Runtime, C: Catalog + ?Sized> {
    runtime: &'a R,
    catalog: &'a C,
    credentials: &'a Credentials,
    mod_dir: PathBuf,
}

impl<'a, R: Runtime, C: Catalog + ?Sized> SyncExecutor<'a, R, C> {
    pub fn new(
        runtime: &'a R,
        catalog: &'a C,
        credentials: &'a Credentials,
        mod_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runtime,
            catalog,
            credentials,
            mod_dir: mod_dir.into(),
        }
    }

    /// Prunes, plans and executes the sync of `record`, updating its
    /// installed version to match the mod directory afterwards.
    ///
    /// Planning happens after pruning, so an archive of the selected release
    /// that is already on disk is validated rather than downloaded again.
    ///
    /// Errors are fatal for the whole run: a superseded archive could not be
    /// deleted, or an archive could not be read for validation.
    #[tracing::instrument(skip(self, record), fields(package = %record.name))]
    pub async fn sync(&self, record: &mut PackageRecord) -> Result<PackageSync> {
        let Some(latest) = record.latest_release.clone() else {
            warn!("{}: missing metadata, skipping update", record.name);
            return Ok(PackageSync {
                action: plan(record),
                pruned: Vec::new(),
                outcome: SyncOutcome::Skipped,
            });
        };

        let pruned = self.prune(&record.name, &latest.file_name)?;
        let target = self.mod_dir.join(&latest.file_name);

        // Pruning leaves at most the target archive behind.
        if self.runtime.exists(&target) {
            record.installed_version = Some(latest.version.clone());
        }
        let planned = plan(record);

        let mut action = planned.clone();
        let outcome = loop {
            action = match action {
                Action::Skip => break SyncOutcome::Skipped,
                Action::Validate => {
                    info!("{}: validating installed '{}'", record.name, latest.version);
                    let valid = self.validate_installed(&latest, &target)?;
                    match Action::Validate.after_validation(valid) {
                        None => {
                            break SyncOutcome::Verified {
                                version: latest.version.clone(),
                            };
                        }
                        Some(next) => {
                            info!("{}: '{}' is invalid", record.name, target.display());
                            next
                        }
                    }
                }
                Action::Replace(reason) => break self.replace(&latest, &target, reason).await?,
            };
        };

        record.installed_version = self
            .runtime
            .exists(&target)
            .then(|| latest.version.clone());

        Ok(PackageSync {
            action: planned,
            pruned,
            outcome,
        })
    }

    /// Deletes every archive of `name` except `keep`.
    ///
    /// Returns the removed filenames. Any deletion failure aborts, since the
    /// mod directory can no longer be assumed to hold a single version.
    #[tracing::instrument(skip(self))]
    pub fn prune(&self, name: &str, keep: &str) -> Result<Vec<String>> {
        let mut removed = Vec::new();

        for (path, archive) in scan_archives(self.runtime, &self.mod_dir)? {
            let file_name = path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default();
            if archive.name != name || file_name == keep {
                continue;
            }

            info!("{}: removing '{}'", name, file_name);
            self.runtime.remove_file(&path).with_context(|| {
                format!(
                    "Failed to remove '{}' while pruning old releases of {}",
                    path.display(),
                    name
                )
            })?;
            removed.push(file_name);
        }

        Ok(removed)
    }

    /// A missing target counts as invalid so it gets downloaded.
    fn validate_installed(&self, latest: &ReleaseInfo, target: &Path) -> Result<bool> {
        if !self.runtime.exists(target) {
            return Ok(false);
        }
        checksum::validate(self.runtime, &latest.sha1, target)
    }

    async fn replace(
        &self,
        latest: &ReleaseInfo,
        target: &Path,
        reason: ReplaceReason,
    ) -> Result<SyncOutcome> {
        info!("Downloading {} ({})", latest.file_name, latest.version);

        if let Err(e) = self
            .catalog
            .download(latest, self.credentials, target)
            .await
        {
            warn!("Download of {} failed: {:#}", latest.file_name, e);
            return Ok(SyncOutcome::DownloadFailed {
                version: latest.version.clone(),
                reason: format!("{:#}", e),
            });
        }

        if !checksum::validate(self.runtime, &latest.sha1, target)? {
            warn!("{} did not match checksum {}", target.display(), latest.sha1);
            return Ok(SyncOutcome::ChecksumMismatch {
                version: latest.version.clone(),
            });
        }

        let version = latest.version.clone();
        Ok(match reason {
            ReplaceReason::Missing => SyncOutcome::Installed { version },
            ReplaceReason::Outdated { installed } => SyncOutcome::Updated {
                from: installed,
                to: version,
            },
            ReplaceReason::Corrupted => SyncOutcome::Repaired { version },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MockCatalog;
    use crate::checksum::sha1_hex;
    use crate::runtime::{MockRuntime, RealRuntime};
    use std::io::Cursor;
    use tempfile::{TempDir, tempdir};

    const BODY: &str = "release 2.0.0 archive";

    fn digest(content: &str) -> String {
        sha1_hex(&mut Cursor::new(content.as_bytes())).unwrap()
    }

    fn release(version: &str, sha1: &str) -> ReleaseInfo {
        ReleaseInfo {
            version: version.into(),
            download_path: format!("/download/foo/{}", version),
            file_name: format!("foo_{}.zip", version),
            sha1: sha1.into(),
        }
    }

    fn record(installed: Option<&str>, latest: Option<ReleaseInfo>) -> PackageRecord {
        PackageRecord {
            name: "foo".into(),
            enabled: true,
            installed_version: installed.map(String::from),
            latest_release: latest,
        }
    }

    fn mod_dir_with(files: &[(&str, &str)]) -> TempDir {
        let dir = tempdir().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// A catalog whose download writes `body` to the destination.
    fn serving(body: &'static str) -> MockCatalog {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_download()
            .times(1)
            .returning(move |_, _, dest| {
                std::fs::write(dest, body)?;
                Ok(body.len() as u64)
            });
        catalog
    }

    fn credentials() -> Credentials {
        Credentials::new("alice", "secret")
    }

    #[test_log::test(tokio::test)]
    async fn test_already_current_and_valid() {
        let dir = mod_dir_with(&[("foo_2.0.0.zip", BODY)]);
        let mut catalog = MockCatalog::new();
        catalog.expect_download().never();
        let credentials = credentials();
        let executor = SyncExecutor::new(&RealRuntime, &catalog, &credentials, dir.path());

        let mut rec = record(Some("2.0.0"), Some(release("2.0.0", &digest(BODY))));
        let result = executor.sync(&mut rec).await.unwrap();

        assert_eq!(result.action, Action::Validate);
        assert!(result.pruned.is_empty());
        assert_eq!(
            result.outcome,
            SyncOutcome::Verified {
                version: "2.0.0".into()
            }
        );
        assert_eq!(files_in(dir.path()), vec!["foo_2.0.0.zip"]);
        assert_eq!(rec.installed_version.as_deref(), Some("2.0.0"));
    }

    #[test_log::test(tokio::test)]
    async fn test_stale_install_is_replaced() {
        let dir = mod_dir_with(&[("foo_1.0.0.zip", "old release")]);
        let catalog = serving(BODY);
        let credentials = credentials();
        let executor = SyncExecutor::new(&RealRuntime, &catalog, &credentials, dir.path());

        let mut rec = record(Some("1.0.0"), Some(release("2.0.0", &digest(BODY))));
        let result = executor.sync(&mut rec).await.unwrap();

        assert_eq!(
            result.action,
            Action::Replace(ReplaceReason::Outdated {
                installed: "1.0.0".into()
            })
        );
        assert_eq!(result.pruned, vec!["foo_1.0.0.zip"]);
        assert_eq!(
            result.outcome,
            SyncOutcome::Updated {
                from: "1.0.0".into(),
                to: "2.0.0".into()
            }
        );
        assert_eq!(files_in(dir.path()), vec!["foo_2.0.0.zip"]);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("foo_2.0.0.zip")).unwrap(),
            BODY
        );
        assert_eq!(rec.installed_version.as_deref(), Some("2.0.0"));
    }

    #[tokio::test]
    async fn test_corrupted_current_version_is_downloaded_again() {
        let dir = mod_dir_with(&[("foo_2.0.0.zip", "truncated")]);
        let catalog = serving(BODY);
        let credentials = credentials();
        let executor = SyncExecutor::new(&RealRuntime, &catalog, &credentials, dir.path());

        let mut rec = record(Some("2.0.0"), Some(release("2.0.0", &digest(BODY))));
        let result = executor.sync(&mut rec).await.unwrap();

        assert_eq!(result.action, Action::Validate);
        assert_eq!(
            result.outcome,
            SyncOutcome::Repaired {
                version: "2.0.0".into()
            }
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("foo_2.0.0.zip")).unwrap(),
            BODY
        );
    }

    #[tokio::test]
    async fn test_missing_install_is_downloaded() {
        let dir = mod_dir_with(&[]);
        let catalog = serving(BODY);
        let credentials = credentials();
        let executor = SyncExecutor::new(&RealRuntime, &catalog, &credentials, dir.path());

        let mut rec = record(None, Some(release("2.0.0", &digest(BODY))));
        let result = executor.sync(&mut rec).await.unwrap();

        assert_eq!(result.action, Action::Replace(ReplaceReason::Missing));
        assert_eq!(
            result.outcome,
            SyncOutcome::Installed {
                version: "2.0.0".into()
            }
        );
        assert!(rec.installed());
    }

    #[tokio::test]
    async fn test_metadata_unavailable_is_skipped() {
        let dir = mod_dir_with(&[("foo_1.0.0.zip", "old release")]);
        let catalog = MockCatalog::new();
        let credentials = credentials();
        let executor = SyncExecutor::new(&RealRuntime, &catalog, &credentials, dir.path());

        let mut rec = record(Some("1.0.0"), None);
        let result = executor.sync(&mut rec).await.unwrap();

        assert_eq!(result.action, Action::Skip);
        assert_eq!(result.outcome, SyncOutcome::Skipped);
        assert!(!result.outcome.is_success());
        assert!(!result.outcome.is_failure());
        assert_eq!(files_in(dir.path()), vec!["foo_1.0.0.zip"]);
        assert_eq!(rec.installed_version.as_deref(), Some("1.0.0"));
    }

    #[tokio::test]
    async fn test_pruning_leaves_only_target() {
        let dir = mod_dir_with(&[
            ("foo_1.0.0.zip", "a"),
            ("foo_1.1.0.zip", "b"),
            ("foo_1.2.0.zip", BODY),
            ("foo_bar_1.0.0.zip", "other mod"),
            ("mod-list.json", "{}"),
        ]);
        let catalog = MockCatalog::new();
        let credentials = credentials();
        let executor = SyncExecutor::new(&RealRuntime, &catalog, &credentials, dir.path());

        let mut rec = record(Some("1.2.0"), Some(release("1.2.0", &digest(BODY))));
        let result = executor.sync(&mut rec).await.unwrap();

        assert_eq!(result.pruned, vec!["foo_1.0.0.zip", "foo_1.1.0.zip"]);
        assert!(result.outcome.is_success());
        assert_eq!(
            files_in(dir.path()),
            vec!["foo_1.2.0.zip", "foo_bar_1.0.0.zip", "mod-list.json"]
        );
    }

    #[tokio::test]
    async fn test_target_already_on_disk_is_validated_not_downloaded() {
        let dir = mod_dir_with(&[("foo_1.10.0.zip", BODY), ("foo_1.9.0.zip", "older release")]);
        let mut catalog = MockCatalog::new();
        catalog.expect_download().never();
        let credentials = credentials();
        let executor = SyncExecutor::new(&RealRuntime, &catalog, &credentials, dir.path());

        // Path order reports 1.9.0 as installed.
        let mut rec = record(Some("1.9.0"), Some(release("1.10.0", &digest(BODY))));
        let result = executor.sync(&mut rec).await.unwrap();

        assert_eq!(result.action, Action::Validate);
        assert_eq!(result.pruned, vec!["foo_1.9.0.zip"]);
        assert_eq!(
            result.outcome,
            SyncOutcome::Verified {
                version: "1.10.0".into()
            }
        );
        assert_eq!(files_in(dir.path()), vec!["foo_1.10.0.zip"]);
        assert_eq!(rec.installed_version.as_deref(), Some("1.10.0"));
    }

    #[tokio::test]
    async fn test_download_failure_is_soft() {
        let dir = mod_dir_with(&[("foo_1.0.0.zip", "old release")]);
        let mut catalog = MockCatalog::new();
        catalog
            .expect_download()
            .returning(|_, _, _| Err(anyhow::anyhow!("Authentication failed")));
        let credentials = credentials();
        let executor = SyncExecutor::new(&RealRuntime, &catalog, &credentials, dir.path());

        let mut rec = record(Some("1.0.0"), Some(release("2.0.0", &digest(BODY))));
        let result = executor.sync(&mut rec).await.unwrap();

        assert!(matches!(
            &result.outcome,
            SyncOutcome::DownloadFailed { reason, .. } if reason.contains("Authentication")
        ));
        assert!(result.outcome.is_failure());
        // The stale archive was pruned before the download was attempted.
        assert!(files_in(dir.path()).is_empty());
        assert_eq!(rec.installed_version, None);
    }

    #[tokio::test]
    async fn test_checksum_mismatch_after_download() {
        let dir = mod_dir_with(&[]);
        let catalog = serving("tampered");
        let credentials = credentials();
        let executor = SyncExecutor::new(&RealRuntime, &catalog, &credentials, dir.path());

        let mut rec = record(None, Some(release("2.0.0", &digest(BODY))));
        let result = executor.sync(&mut rec).await.unwrap();

        assert_eq!(
            result.outcome,
            SyncOutcome::ChecksumMismatch {
                version: "2.0.0".into()
            }
        );
        assert!(result.outcome.is_failure());
    }

    #[tokio::test]
    async fn test_prune_failure_is_fatal() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_dir()
            .returning(|_| Ok(vec![PathBuf::from("/mods/foo_1.0.0.zip")]));
        runtime.expect_is_file().returning(|_| true);
        runtime
            .expect_remove_file()
            .returning(|_| Err(anyhow::anyhow!("Permission denied")));

        let mut catalog = MockCatalog::new();
        catalog.expect_download().never();
        let credentials = credentials();
        let executor = SyncExecutor::new(&runtime, &catalog, &credentials, "/mods");

        let mut rec = record(Some("1.0.0"), Some(release("2.0.0", &digest(BODY))));
        let err = executor.sync(&mut rec).await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("/mods/foo_1.0.0.zip"));
        assert!(message.contains("foo"));
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(
            SyncOutcome::Updated {
                from: "1.0.0".into(),
                to: "2.0.0".into()
            }
            .to_string(),
            "updated from '1.0.0' to '2.0.0'"
        );
        assert_eq!(
            SyncOutcome::ChecksumMismatch {
                version: "2.0.0".into()
            }
            .to_string(),
            "download of '2.0.0' did not match checksum!"
        );
    }
}
