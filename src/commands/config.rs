use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{
    catalog::{Credentials, DEFAULT_CATALOG_URL},
    game::GameVersion,
    http::HttpClient,
    runtime::Runtime,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Credential fields of the server's `server-settings.json`.
/// Everything else in that file is ignored.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct ServerSettings {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

impl ServerSettings {
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to open file '{}'", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse json file '{}'", path.display()))
    }
}

/// Where the game version comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum GameSource {
    /// Run `<binary> --version`.
    Binary(PathBuf),
    /// Use the given version as is.
    Version(GameVersion),
}

/// Unresolved command-line options.
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub username: Option<String>,
    pub token: Option<String>,
    pub server_settings: Option<PathBuf>,
    pub mod_dir: Option<PathBuf>,
    pub mod_list: Option<PathBuf>,
    pub catalog_url: Option<String>,
    pub game: Option<GameSource>,
}

/// Settings resolved once at startup and passed to the commands.
#[derive(Debug)]
pub struct Config {
    pub credentials: Credentials,
    pub mod_dir: PathBuf,
    pub mod_list_path: PathBuf,
    pub catalog_url: String,
    pub game_version: GameVersion,
    pub http_client: HttpClient,
}

impl Config {
    pub fn new<R: Runtime>(runtime: &R, options: ConfigOptions) -> Result<Self> {
        let settings = match &options.server_settings {
            Some(path) => ServerSettings::load(runtime, path)?,
            None => ServerSettings::default(),
        };
        let credentials = resolve_credentials(options.username, options.token, settings)?;
        debug!("Using factorio.com account {}", credentials.username);

        let game_version = match options.game {
            Some(GameSource::Version(version)) => version,
            Some(GameSource::Binary(path)) => GameVersion::detect(runtime, &path)?,
            None => anyhow::bail!("Either --fact-path or --game-version must be specified"),
        };

        let mod_dir = match options.mod_dir {
            Some(path) => path,
            None => default_mod_dir(runtime)?,
        };
        if !runtime.is_dir(&mod_dir) {
            anyhow::bail!("Mod directory '{}' does not exist!", mod_dir.display());
        }
        let mod_list_path = options
            .mod_list
            .unwrap_or_else(|| mod_dir.join("mod-list.json"));

        let catalog_url = options
            .catalog_url
            .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            credentials,
            mod_dir,
            mod_list_path,
            catalog_url,
            game_version,
            http_client: HttpClient::new(build_client()?),
        })
    }
}

/// Command-line values take precedence over `server-settings.json`.
/// Empty strings count as unset.
pub fn resolve_credentials(
    username: Option<String>,
    token: Option<String>,
    settings: ServerSettings,
) -> Result<Credentials> {
    fn pick(cli: Option<String>, file: Option<String>) -> Option<String> {
        cli.filter(|v| !v.is_empty())
            .or_else(|| file.filter(|v| !v.is_empty()))
    }

    let username = pick(username, settings.username).ok_or_else(|| {
        anyhow::anyhow!("username not specified in server-settings.json or via --username")
    })?;
    let token = pick(token, settings.token).ok_or_else(|| {
        anyhow::anyhow!("token not specified in server-settings.json or via --token")
    })?;

    Ok(Credentials::new(username, token))
}

/// `~/.factorio/mods`, the default mod directory of a headless install.
pub fn default_mod_dir<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    let home = runtime
        .home_dir()
        .context("Could not determine home directory; use --mod-directory")?;
    Ok(home.join(".factorio").join("mods"))
}

pub fn build_client() -> Result<Client> {
    let client = Client::builder()
        .user_agent(concat!("modsync/", env!("MODSYNC_VERSION")))
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    Ok(client)
}
