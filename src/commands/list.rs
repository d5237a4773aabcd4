use anyhow::Result;
use log::debug;

use crate::{
    catalog::{Catalog, ModPortal},
    package::PackageSet,
    runtime::Runtime,
};

use super::{config::Config, load_packages};

/// List the tracked mods with installed and latest compatible versions.
#[tracing::instrument(skip_all)]
pub async fn list<R: Runtime>(runtime: &R, config: &Config) -> Result<()> {
    let portal = ModPortal::new(runtime, config.http_client.clone(), &config.catalog_url);
    run_list(runtime, &portal, config).await
}

pub(crate) async fn run_list<R: Runtime, C: Catalog + ?Sized>(
    runtime: &R,
    catalog: &C,
    config: &Config,
) -> Result<()> {
    let packages = load_packages(runtime, catalog, config).await?;
    if packages.is_empty() {
        println!("No mods listed in {}.", config.mod_list_path.display());
        return Ok(());
    }

    debug!("Listing {} mod(s)", packages.len());
    print!("{}", format_table(&packages));
    Ok(())
}

/// One header line and one line per mod in manifest order.
/// Missing versions print as `N/A`.
pub fn format_table(packages: &PackageSet) -> String {
    let width = packages
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("mod_name".len());

    let mut out = format!(
        "{:<width$}\tenabled\tinstalled\tcurrent_v\tlatest_v\n",
        "mod_name"
    );
    for record in packages.iter() {
        let current = record.installed_version.as_deref().unwrap_or("N/A");
        let latest = record
            .latest_release
            .as_ref()
            .map(|r| r.version.as_str())
            .unwrap_or("N/A");
        out.push_str(&format!(
            "{:<width$}\t{}\t{}\t\t{}\t\t{}\n",
            record.name,
            record.enabled,
            record.installed(),
            current,
            latest
        ));
    }
    out
}
