use anyhow::Result;
use log::info;
use std::fmt;

use crate::{
    catalog::{Catalog, ModPortal},
    runtime::Runtime,
    sync::{SyncExecutor, SyncOutcome},
};

use super::{config::Config, load_packages};

/// Counts of per-mod outcomes over one update run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSummary {
    pub verified: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl UpdateSummary {
    pub fn record(&mut self, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Skipped => self.skipped += 1,
            SyncOutcome::Verified { .. } => self.verified += 1,
            SyncOutcome::Installed { .. }
            | SyncOutcome::Updated { .. }
            | SyncOutcome::Repaired { .. } => self.downloaded += 1,
            SyncOutcome::DownloadFailed { .. } | SyncOutcome::ChecksumMismatch { .. } => {
                self.failed += 1
            }
        }
    }
}

impl fmt::Display for UpdateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} valid, {} downloaded, {} failed, {} skipped",
            self.verified, self.downloaded, self.failed, self.skipped
        )
    }
}

/// Bring every tracked mod in line with its latest compatible release.
#[tracing::instrument(skip_all)]
pub async fn update<R: Runtime>(runtime: &R, config: &Config) -> Result<()> {
    let portal = ModPortal::new(runtime, config.http_client.clone(), &config.catalog_url);
    let summary = run_update(runtime, &portal, config).await?;
    println!("\n{}", summary);
    Ok(())
}

/// Syncs mods one after another. Per-mod download and checksum failures are
/// reported and counted; any error returned aborts the remaining mods.
pub(crate) async fn run_update<R: Runtime, C: Catalog + ?Sized>(
    runtime: &R,
    catalog: &C,
    config: &Config,
) -> Result<UpdateSummary> {
    let mut packages = load_packages(runtime, catalog, config).await?;
    let executor = SyncExecutor::new(runtime, catalog, &config.credentials, &config.mod_dir);

    let mut summary = UpdateSummary::default();
    for record in packages.iter_mut() {
        let result = executor.sync(record).await?;
        for file in &result.pruned {
            println!("{}: removing '{}'", record.name, file);
        }
        println!("{}: {}", record.name, result.outcome);
        summary.record(&result.outcome);
    }

    info!("Update finished: {}", summary);
    Ok(summary)
}
