//! Factorio mod portal implementation.
//!
//! See <https://wiki.factorio.com/Mod_portal_API> for the endpoints used.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Url;
use std::path::Path;

use crate::download::download_file;
use crate::http::HttpClient;
use crate::package::ReleaseInfo;
use crate::runtime::Runtime;

use super::{Catalog, Credentials, ModFullInfo};

pub const DEFAULT_CATALOG_URL: &str = "https://mods.factorio.com";

/// Mod portal client. Archives are written through the [`Runtime`].
pub struct ModPortal<'a, R: Runtime> {
    runtime: &'a R,
    http_client: HttpClient,
    base_url: String,
}

impl<'a, R: Runtime> ModPortal<'a, R> {
    pub fn new(runtime: &'a R, http_client: HttpClient, base_url: &str) -> Self {
        Self {
            runtime,
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `{base}/api/mods/{name}/full`, with the name escaped as a path segment.
    pub fn full_info_url(&self, name: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid catalog URL '{}'", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Catalog URL '{}' cannot be a base", self.base_url))?
            .pop_if_empty()
            .extend(["api", "mods", name, "full"]);
        Ok(url)
    }

    pub fn download_url(&self, release: &ReleaseInfo) -> String {
        format!("{}{}", self.base_url, release.download_path)
    }
}

#[async_trait]
impl<R: Runtime> Catalog for ModPortal<'_, R> {
    async fn full_info(&self, name: &str) -> Result<ModFullInfo> {
        let url = self.full_info_url(name)?;
        debug!("Fetching metadata for {} from {}...", name, url);
        self.http_client.get_json(url.as_str()).await
    }

    async fn download(
        &self,
        release: &ReleaseInfo,
        credentials: &Credentials,
        dest: &Path,
    ) -> Result<u64> {
        let url = self.download_url(release);
        download_file(
            self.runtime,
            &url,
            &credentials.query(),
            dest,
            &self.http_client,
        )
        .await
    }
}
