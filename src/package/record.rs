use std::collections::HashMap;

use super::manifest::ModList;

/// Name of the game's own base package. It is always present in the manifest
/// and is never downloaded from the catalog.
pub const BASE_PACKAGE: &str = "base";

/// A release selected from the catalog for the running game version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub version: String,
    /// Path relative to the catalog base URL.
    pub download_path: String,
    /// Filename the archive is stored under in the mod directory.
    pub file_name: String,
    /// Lowercase hex SHA-1 digest.
    pub sha1: String,
}

/// Local and remote state of one tracked mod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub name: String,
    pub enabled: bool,
    /// Version parsed from the archive found in the mod directory.
    pub installed_version: Option<String>,
    /// Latest catalog release compatible with the game version.
    pub latest_release: Option<ReleaseInfo>,
}

impl PackageRecord {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
            installed_version: None,
            latest_release: None,
        }
    }

    pub fn installed(&self) -> bool {
        self.installed_version.is_some()
    }
}

/// The tracked mods of one run, in manifest order and unique by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageSet {
    records: Vec<PackageRecord>,
    index: HashMap<String, usize>,
}

impl PackageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds one record per manifest entry, skipping [`BASE_PACKAGE`].
    /// A repeated name keeps its first position and takes the last
    /// `enabled` flag.
    pub fn from_mod_list(list: &ModList) -> Self {
        let mut set = Self::new();
        for entry in list.mods.iter().filter(|m| m.name != BASE_PACKAGE) {
            set.insert(PackageRecord::new(&entry.name, entry.enabled));
        }
        set
    }

    pub fn insert(&mut self, record: PackageRecord) {
        match self.index.get(&record.name) {
            Some(&i) => self.records[i].enabled = record.enabled,
            None => {
                self.index.insert(record.name.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&PackageRecord> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut PackageRecord> {
        self.index.get(name).map(|&i| &mut self.records[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PackageRecord> {
        self.records.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
