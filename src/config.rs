use anyhow::{Context, Result};
use autocommit_core::{Identity, RunSettings};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::CliArgs;
use crate::schedule::DailySchedule;

pub const DEFAULT_TOKEN_ENV: &str = "AUTOCOMMIT_TOKEN";

#[serde_as]
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Config {
    pub version: u32,
    pub repo_path: PathBuf,
    pub remote: String,
    /// Branch to push; the current branch when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Cloned into `repo_path` when it holds no repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_url: Option<String>,
    #[serde_as(as = "DisplayFromStr")]
    pub schedule: DailySchedule,
    /// Environment variable holding the push token
    pub token_env: String,
    #[serde(default)]
    pub identity: Identity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            repo_path: PathBuf::from("."),
            remote: "origin".to_string(),
            branch: None,
            clone_url: None,
            schedule: DailySchedule::default(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            identity: Identity::default(),
        }
    }
}

pub fn get_default_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "autocommit")
        .context("Failed to determine project directories")?;

    let config_dir = proj_dirs.config_dir();
    Ok(config_dir.join("autocommit.toml"))
}

/// Expand a leading `~` to the home directory
fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p,
            None => get_default_config_path()?,
        };

        if !path.exists() {
            let default_config = Config::default();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
            default_config.save(&path)?;
            return Ok(default_config);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    pub fn from_cli_and_file(cli_args: &CliArgs) -> Result<Self> {
        let mut config = Self::load(cli_args.config.clone())?;

        // CLI args override config file
        if let Some(repo) = &cli_args.repo {
            config.repo_path = repo.clone();
        }
        if let Some(remote) = &cli_args.remote {
            config.remote = remote.clone();
        }
        if let Some(branch) = &cli_args.branch {
            config.branch = Some(branch.clone());
        }

        Ok(config)
    }

    pub fn resolved_repo_path(&self) -> PathBuf {
        expand_home(&self.repo_path)
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            identity: self.identity.clone(),
            remote: self.remote.clone(),
            branch: self.branch.clone(),
        }
    }
}
