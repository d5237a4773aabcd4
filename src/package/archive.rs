//! Archive filename parsing (`<name>_<version>.zip`).

use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Extension of installed mod archives.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Name and version encoded in an archive filename.
///
/// The split happens at the rightmost underscore, so mod names may contain
/// underscores as long as the version does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
    pub name: String,
    pub version: String,
}

impl ArchiveName {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Parses a bare filename. Returns `None` for anything that is not a
    /// `<name>_<version>.zip` archive.
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(&format!(".{}", ARCHIVE_EXTENSION))?;
        let (name, version) = stem.rsplit_once('_')?;
        if name.is_empty() || version.is_empty() {
            return None;
        }
        Some(Self::new(name, version))
    }

    /// Parses the final component of `path`.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(Self::parse)
    }

    /// The filename this archive is stored under.
    pub fn file_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ArchiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}.{}", self.name, self.version, ARCHIVE_EXTENSION)
    }
}

impl FromStr for ArchiveName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid archive name '{}'. Expected '<name>_<version>.{}'.",
                s,
                ARCHIVE_EXTENSION
            )
        })
    }
}
