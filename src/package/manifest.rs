use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::runtime::Runtime;

/// The `mod-list.json` document kept by the game in the mod directory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ModList {
    pub mods: Vec<ModEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModEntry {
    pub name: String,
    pub enabled: bool,
}

impl ModList {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to open mod list '{}'", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid mod list '{}'", path.display()))
    }
}
