//! Game version detection.
//!
//! Mod releases are matched on the `<major>.<minor>` part of the server's
//! game version, which is read from `factorio --version`.

use anyhow::{Context, Result};
use log::debug;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::runtime::Runtime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

impl GameVersion {
    /// The key catalog releases declare as their `factorio_version`.
    pub fn compat_key(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }

    /// Extracts the version from `--version` output, whose first relevant
    /// line looks like `Version: 1.1.104 (build 60000, linux64, headless)`.
    pub fn from_version_output(output: &str) -> Result<Self> {
        let version = output
            .lines()
            .find_map(|line| line.strip_prefix("Version: "))
            .and_then(|rest| rest.split_whitespace().next())
            .ok_or_else(|| anyhow::anyhow!("Unable to parse version from:\n{}", output))?;

        let parsed: GameVersion = version
            .parse()
            .with_context(|| format!("Unable to parse version from:\n{}", output))?;
        if parsed.patch.is_none() {
            anyhow::bail!("Unable to parse version from:\n{}", output);
        }
        Ok(parsed)
    }

    /// Runs `<binary> --version` and parses the result.
    #[tracing::instrument(skip(runtime))]
    pub fn detect<R: Runtime>(runtime: &R, binary: &Path) -> Result<Self> {
        if !runtime.exists(binary) {
            anyhow::bail!("Factorio binary '{}' does not exist!", binary.display());
        }

        let output = runtime
            .run_command(binary, &["--version".to_string()])
            .with_context(|| format!("Failed to run '{} --version'", binary.display()))?;
        debug!("{} --version: {}", binary.display(), output.trim());

        Self::from_version_output(&output)
    }
}

impl fmt::Display for GameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "{}.{}.{}", self.major, self.minor, patch),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

impl FromStr for GameVersion {
    type Err = anyhow::Error;

    /// Accepts `<major>.<minor>` or `<major>.<minor>.<patch>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            anyhow::anyhow!(
                "Invalid game version '{}'. Expected '<major>.<minor>[.<patch>]'.",
                s
            )
        };

        let parts: Vec<&str> = s.split('.').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(invalid());
        }

        let numbers = parts
            .iter()
            .map(|p| p.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;

        Ok(GameVersion {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers.get(2).copied(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::{always, eq};
    use std::path::PathBuf;

    const VERSION_OUTPUT: &str = "Version: 1.1.104 (build 60000, linux64, headless)\n\
                                  Binary version: 64\n\
                                  Map input version: 1.0.0-0\n\
                                  Map output version: 1.1.104-0\n";

    #[test]
    fn test_from_version_output() {
        let version = GameVersion::from_version_output(VERSION_OUTPUT).unwrap();
        assert_eq!(
            version,
            GameVersion {
                major: 1,
                minor: 1,
                patch: Some(104)
            }
        );
        assert_eq!(version.compat_key(), "1.1");
        assert_eq!(version.to_string(), "1.1.104");
    }

    #[test]
    fn test_from_version_output_rejects_garbage() {
        assert!(GameVersion::from_version_output("factorio: command not found").is_err());
        assert!(GameVersion::from_version_output("Version: 1.1 (build 1)").is_err());
        assert!(GameVersion::from_version_output("Version: one.two.three").is_err());
    }

    #[test]
    fn test_from_str() {
        let short: GameVersion = "2.0".parse().unwrap();
        assert_eq!(short.compat_key(), "2.0");
        assert_eq!(short.patch, None);
        assert_eq!(short.to_string(), "2.0");

        let full: GameVersion = "0.18.47".parse().unwrap();
        assert_eq!(full.compat_key(), "0.18");

        assert!("1".parse::<GameVersion>().is_err());
        assert!("1.2.3.4".parse::<GameVersion>().is_err());
        assert!("1.x".parse::<GameVersion>().is_err());
    }

    #[test]
    fn test_detect() {
        let mut runtime = MockRuntime::new();
        let binary = PathBuf::from("/opt/factorio/bin/x64/factorio");

        runtime
            .expect_exists()
            .with(eq(binary.clone()))
            .returning(|_| true);
        runtime
            .expect_run_command()
            .with(eq(binary.clone()), always())
            .returning(|_, args| {
                assert_eq!(args, ["--version".to_string()]);
                Ok(VERSION_OUTPUT.to_string())
            });

        let version = GameVersion::detect(&runtime, &binary).unwrap();
        assert_eq!(version.compat_key(), "1.1");
    }

    #[test]
    fn test_detect_missing_binary() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| false);

        let err = GameVersion::detect(&runtime, Path::new("/opt/factorio")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_detect_command_failure() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_run_command()
            .returning(|_, _| Err(anyhow::anyhow!("exit status: 1")));

        let err = GameVersion::detect(&runtime, Path::new("/opt/factorio")).unwrap_err();
        assert!(err.to_string().contains("--version"));
    }
}
