//! Local package state
//!
//! This module models the mods tracked by a server: the `mod-list.json`
//! manifest, the archives present in the mod directory, and the per-mod
//! records the rest of the crate reconciles against the catalog.

mod archive;
mod collector;
mod manifest;
mod record;

pub use archive::{ARCHIVE_EXTENSION, ArchiveName};
pub use collector::{collect_local_state, scan_archives};
pub use manifest::{ModEntry, ModList};
pub use record::{BASE_PACKAGE, PackageRecord, PackageSet, ReleaseInfo};
