//! Remote mod catalog.
//!
//! The [`Catalog`] trait is the seam between the reconciliation engine and
//! the mod portal: one metadata lookup per mod and one authenticated
//! download per release. [`ModPortal`] talks to the real portal over HTTP.

mod fetch;
mod portal;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::package::ReleaseInfo;

pub use fetch::{MetadataIssue, MetadataWarning, fetch_metadata, select_release};
pub use portal::{DEFAULT_CATALOG_URL, ModPortal};

/// Mod portal "full info" response. Only the fields used here are modelled.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModFullInfo {
    #[serde(default)]
    pub name: String,
    pub releases: Vec<CatalogRelease>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogRelease {
    pub version: String,
    pub download_url: String,
    pub file_name: String,
    pub sha1: String,
    pub info_json: ReleaseInfoJson,
}

/// The `info.json` excerpt the portal attaches to every release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReleaseInfoJson {
    pub factorio_version: String,
}

impl From<&CatalogRelease> for ReleaseInfo {
    fn from(release: &CatalogRelease) -> Self {
        ReleaseInfo {
            version: release.version.clone(),
            download_path: release.download_url.clone(),
            file_name: release.file_name.clone(),
            sha1: release.sha1.to_lowercase(),
        }
    }
}

/// factorio.com account used for downloads.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }

    /// Query parameters expected by the download endpoint.
    pub fn query(&self) -> [(&str, &str); 2] {
        [
            ("username", self.username.as_str()),
            ("token", self.token.as_str()),
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"*********")
            .finish()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch the full release list of a mod.
    async fn full_info(&self, name: &str) -> Result<ModFullInfo>;

    /// Download `release` into `dest`, returning the number of bytes written.
    /// `dest` is only created once the server has accepted the request.
    async fn download(
        &self,
        release: &ReleaseInfo,
        credentials: &Credentials,
        dest: &Path,
    ) -> Result<u64>;
}
