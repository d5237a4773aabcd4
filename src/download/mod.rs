use crate::http::HttpClient;
use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// Streams a file from a URL to `dest`, overwriting any existing file.
#[tracing::instrument(skip(runtime, query, dest, http_client))]
pub async fn download_file<R: Runtime>(
    runtime: &R,
    url: &str,
    query: &[(&str, &str)],
    dest: &Path,
    http_client: &HttpClient,
) -> Result<u64> {
    info!("Downloading {} to {:?}...", url, dest);

    let bytes = http_client
        .download_file(url, query, || {
            runtime
                .create_file(dest)
                .with_context(|| format!("Failed to create file at {:?}", dest))
        })
        .await?;

    info!("Download complete ({} bytes).", bytes);
    Ok(bytes)
}
