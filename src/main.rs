use anyhow::Result;
use clap::Parser;
use modsync::commands::config::{Config, ConfigOptions, GameSource};
use modsync::game::GameVersion;
use std::path::PathBuf;

/// modsync - Factorio server mod synchroniser
///
/// Keeps the mods listed in mod-list.json at the latest release published
/// for the server's game version.
///
/// Credentials for the mod portal are read from server-settings.json unless
/// given on the command line or through FACTORIO_USERNAME / FACTORIO_TOKEN.
///
/// Examples:
///   modsync --fact-path /opt/factorio/bin/x64/factorio -s server-settings.json list
///   modsync --game-version 1.1 -u alice -t TOKEN update
#[derive(Parser, Debug)]
#[command(author, version = env!("MODSYNC_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// factorio.com username (overrides server-settings.json)
    #[arg(
        long,
        short = 'u',
        env = "FACTORIO_USERNAME",
        value_name = "NAME",
        global = true
    )]
    username: Option<String>,

    /// factorio.com API token (overrides server-settings.json)
    #[arg(
        long,
        short = 't',
        env = "FACTORIO_TOKEN",
        hide_env_values = true,
        value_name = "TOKEN",
        global = true
    )]
    token: Option<String>,

    /// Path to the server's server-settings.json
    #[arg(long = "server-settings", short = 's', value_name = "PATH", global = true)]
    server_settings: Option<PathBuf>,

    /// Mod directory (defaults to ~/.factorio/mods)
    #[arg(
        long = "mod-directory",
        short = 'm',
        env = "FACTORIO_MOD_DIR",
        value_name = "PATH",
        global = true
    )]
    mod_dir: Option<PathBuf>,

    /// Mod manifest (defaults to <mod directory>/mod-list.json)
    #[arg(long = "mod-list", value_name = "PATH", global = true)]
    mod_list: Option<PathBuf>,

    /// Factorio binary, run with --version to find the game version
    #[arg(
        long = "fact-path",
        value_name = "PATH",
        global = true,
        conflicts_with = "game_version"
    )]
    fact_path: Option<PathBuf>,

    /// Game version to match releases against, e.g. 1.1
    #[arg(long = "game-version", value_name = "VERSION", global = true)]
    game_version: Option<GameVersion>,

    /// Mod portal URL (defaults to https://mods.factorio.com)
    #[arg(long = "catalog-url", value_name = "URL", global = true)]
    catalog_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List tracked mods with installed and latest compatible versions
    List,

    /// Download, replace and validate mods to match the latest compatible release
    Update,
}

impl Cli {
    fn config_options(&self) -> ConfigOptions {
        let game = match (&self.fact_path, self.game_version) {
            (Some(path), _) => Some(GameSource::Binary(path.clone())),
            (None, Some(version)) => Some(GameSource::Version(version)),
            (None, None) => None,
        };
        ConfigOptions {
            username: self.username.clone(),
            token: self.token.clone(),
            server_settings: self.server_settings.clone(),
            mod_dir: self.mod_dir.clone(),
            mod_list: self.mod_list.clone(),
            catalog_url: self.catalog_url.clone(),
            game,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = modsync::runtime::RealRuntime;
    let config = Config::new(&runtime, cli.config_options())?;

    match cli.command {
        Commands::List => modsync::commands::list(&runtime, &config).await?,
        Commands::Update => modsync::commands::update(&runtime, &config).await?,
    }
    Ok(())
}
