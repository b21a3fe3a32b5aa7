use anyhow::{Context, Result};
use config::{Environment, File, FileFormat};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name used under the platform config/data/cache dirs
pub const APP_DIR_NAME: &str = "game-library";

/// Prefix of environment overrides, e.g. `GAMELIB__STEAM__API_KEY`
pub const ENV_PREFIX: &str = "GAMELIB";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Local paths configuration
    pub paths: PathsConfig,

    /// Steam integration
    pub steam: SteamConfig,

    /// Installed-game scanning
    pub scan: ScanConfig,

    /// Cover art and metadata lookups
    pub metadata: MetadataConfig,
}

/// Local paths configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding `games.json`
    pub data_dir: PathBuf,

    /// Directory for cached cover lookups
    pub cache_dir: PathBuf,
}

/// Steam integration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SteamConfig {
    /// Steam Web API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// SteamID64 of the library owner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steam_id: Option<String>,

    /// Steam install directory; well-known locations are probed when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_dir: Option<PathBuf>,

    /// Store language for app details
    pub language: String,

    /// Store country code
    pub country: String,
}

/// Installed-game scanning
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    /// Epic manifest directory; the ProgramData default is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epic_manifest_dir: Option<PathBuf>,

    /// Directories searched by `scan-programs` when none are given
    pub program_dirs: Vec<PathBuf>,
}

/// Cover art and metadata lookups
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MetadataConfig {
    /// Cached covers older than this many days are refetched
    pub stale_days: u64,

    /// Entries fetched concurrently during a library refresh
    pub batch_size: usize,

    /// Portrait artwork used when every source fails
    pub default_portrait_cover: String,

    /// Landscape artwork used when every source fails
    pub default_landscape_cover: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| home_dir.join(".local").join("share"))
                .join(APP_DIR_NAME),
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(|| home_dir.join(".cache"))
                .join(APP_DIR_NAME),
        }
    }
}

impl Default for SteamConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            steam_id: None,
            install_dir: None,
            language: "english".to_string(),
            country: "US".to_string(),
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            stale_days: 30,
            batch_size: 4,
            default_portrait_cover: "https://images.weserv.nl/?url=store.steampowered.com/public/shared/images/responsive/header_logo.png&w=600&h=900&fit=cover".to_string(),
            default_landscape_cover: "https://images.weserv.nl/?url=store.steampowered.com/public/shared/images/header/globalheader_logo.png&w=1280&h=720&fit=cover".to_string(),
        }
    }
}

impl SteamConfig {
    /// API key and SteamID64, if both are configured and non-blank
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let key = self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
        let id = self.steam_id.as_deref().map(str::trim).filter(|id| !id.is_empty())?;
        Some((key, id))
    }
}

impl Config {
    /// Get the default configuration file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
            .join("config.toml")
    }

    /// Load configuration from `path` (or the default location), layering
    /// `GAMELIB__SECTION__KEY` environment variables on top.
    ///
    /// A missing file is not an error; defaults fill every unset key.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        if !config_path.exists() {
            info!("Configuration file not found at {}, using defaults", config_path.display());
        }

        let settings = config::Config::builder()
            .add_source(
                File::from(config_path.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", config_path.display()))?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to parse configuration")?;

        info!("Configuration loaded");
        Ok(config)
    }

    /// Save configuration to `path` (or the default location)
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let config_str = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(&config_path, config_str)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;

        info!("Configuration saved to {}", config_path.display());
        Ok(())
    }

    /// Ensure all configured directories exist
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.paths.data_dir, &self.paths.cache_dir] {
            if !dir.exists() {
                info!("Creating directory: {}", dir.display());
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
        }

        Ok(())
    }
}
