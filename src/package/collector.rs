//! Builds the local [`PackageSet`] from the manifest and the mod directory.

use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};

use super::archive::{ARCHIVE_EXTENSION, ArchiveName};
use super::manifest::ModList;
use super::record::PackageSet;
use crate::runtime::Runtime;

/// Lists the mod archives in `mod_dir`, sorted by path.
///
/// Entries that are not files or whose names do not follow
/// `<name>_<version>.zip` are ignored.
#[tracing::instrument(skip(runtime))]
pub fn scan_archives<R: Runtime>(runtime: &R, mod_dir: &Path) -> Result<Vec<(PathBuf, ArchiveName)>> {
    let mut entries = runtime
        .read_dir(mod_dir)
        .with_context(|| format!("Failed to read mod directory '{}'", mod_dir.display()))?;
    entries.sort();

    let archives: Vec<_> = entries
        .into_iter()
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext == ARCHIVE_EXTENSION)
        })
        .filter_map(|path| ArchiveName::from_path(&path).map(|archive| (path, archive)))
        .filter(|(path, _)| runtime.is_file(path))
        .collect();

    debug!("Found {} archive(s) in {:?}", archives.len(), mod_dir);
    Ok(archives)
}

/// Reads the manifest and marks every tracked mod that has an archive in
/// `mod_dir` as installed.
///
/// When several archives exist for one mod the last one in path order is
/// reported; the sync step removes the others.
#[tracing::instrument(skip(runtime))]
pub fn collect_local_state<R: Runtime>(
    runtime: &R,
    mod_dir: &Path,
    mod_list_path: &Path,
) -> Result<PackageSet> {
    let mod_list = ModList::load(runtime, mod_list_path)?;
    let mut packages = PackageSet::from_mod_list(&mod_list);

    for (_path, archive) in scan_archives(runtime, mod_dir)? {
        if let Some(record) = packages.get_mut(&archive.name) {
            record.installed_version = Some(archive.version);
        }
    }

    Ok(packages)
}
