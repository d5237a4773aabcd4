//! Operator commands.
//!
//! Both commands build the same picture of the server first: the tracked
//! mods from the manifest, what is installed, and the release the catalog
//! offers for the game version.

use anyhow::Result;
use std::io::Write;

use crate::{
    catalog::{Catalog, fetch_metadata},
    package::{PackageSet, collect_local_state},
    runtime::Runtime,
};

pub mod config;
mod list;
mod update;

pub use list::{format_table, list};
pub use update::{UpdateSummary, update};

use config::Config;

/// Collects local state and enriches it with catalog metadata, printing
/// progress and metadata warnings.
#[tracing::instrument(skip_all)]
pub(crate) async fn load_packages<R: Runtime, C: Catalog + ?Sized>(
    runtime: &R,
    catalog: &C,
    config: &Config,
) -> Result<PackageSet> {
    let compat = config.game_version.compat_key();
    println!("Factorio release: {}\n", compat);

    let mut packages = collect_local_state(runtime, &config.mod_dir, &config.mod_list_path)?;

    print!("Retrieving metadata...");
    let _ = std::io::stdout().flush();
    let warnings = fetch_metadata(catalog, &mut packages, &compat).await;
    println!("complete!");

    for warning in &warnings {
        println!("Warning: {}", warning);
    }

    Ok(packages)
}
