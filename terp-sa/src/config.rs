//! Configuration resolution for terp-sa
//!
//! Settings are resolved per-field with the following priority:
//! 1. Command-line argument (highest, environment variables fold in via clap)
//! 2. TOML config file (`--config`, or `~/.config/terptracker/config.toml`)
//! 3. Compiled default (fallback)

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default listen port for the strain analysis service
pub const DEFAULT_PORT: u16 = 5780;

/// Default per-client request budget for analysis endpoints
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 30;

/// Default base URL for the Cannlytics lab-data API
pub const DEFAULT_CANNLYTICS_BASE_URL: &str = "https://cannlytics.com/api";

/// Default base URL for the Kushy open dataset API
pub const DEFAULT_KUSHY_BASE_URL: &str = "http://api.kushy.net/api/1.1/tables";

/// Command-line arguments for terp-sa
#[derive(Parser, Debug, Default)]
#[command(name = "terp-sa")]
#[command(about = "Strain analysis microservice for TerpTracker")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, env = "TERP_SA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "TERP_SA_PORT")]
    pub port: Option<u16>,

    /// Path to the SQLite profile database
    #[arg(short, long, env = "TERP_SA_DATABASE")]
    pub database: Option<PathBuf>,

    /// Directory containing seed dataset JSON files
    #[arg(long, env = "TERP_SA_SEED_DIR")]
    pub seed_dir: Option<PathBuf>,

    /// Per-client requests per minute on analysis endpoints
    #[arg(long, env = "TERP_SA_RATE_LIMIT")]
    pub rate_limit: Option<u32>,

    /// API key for the Cannlytics supplemental lookup
    #[arg(long, env = "CANNLYTICS_API_KEY")]
    pub cannlytics_api_key: Option<String>,
}

/// Optional settings loaded from a TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub database: Option<PathBuf>,
    pub seed_dir: Option<PathBuf>,
    pub rate_limit_per_minute: Option<u32>,
    pub cannlytics_api_key: Option<String>,
    pub cannlytics_base_url: Option<String>,
    pub kushy_base_url: Option<String>,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub database_path: PathBuf,
    pub seed_dir: PathBuf,
    pub rate_limit_per_minute: u32,
    pub cannlytics_base_url: String,
    pub cannlytics_api_key: Option<String>,
    pub kushy_base_url: String,
}

impl Settings {
    /// Resolve settings from CLI arguments, a TOML file, and compiled defaults
    pub fn resolve(cli: &Cli) -> Result<Settings> {
        let toml_config = load_toml_config(cli.config.as_deref())?;

        let port = cli.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);

        let database_path = cli
            .database
            .clone()
            .or_else(|| toml_config.database.clone())
            .unwrap_or_else(default_database_path);

        let seed_dir = cli
            .seed_dir
            .clone()
            .or_else(|| toml_config.seed_dir.clone())
            .unwrap_or_else(|| PathBuf::from("data"));

        let rate_limit_per_minute = cli
            .rate_limit
            .or(toml_config.rate_limit_per_minute)
            .unwrap_or(DEFAULT_RATE_LIMIT_PER_MINUTE);

        let cannlytics_api_key = cli
            .cannlytics_api_key
            .clone()
            .or_else(|| toml_config.cannlytics_api_key.clone())
            .filter(|key| !key.trim().is_empty());

        let cannlytics_base_url = toml_config
            .cannlytics_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_CANNLYTICS_BASE_URL.to_string());

        let kushy_base_url = toml_config
            .kushy_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_KUSHY_BASE_URL.to_string());

        Ok(Settings {
            port,
            database_path,
            seed_dir,
            rate_limit_per_minute,
            cannlytics_base_url,
            cannlytics_api_key,
            kushy_base_url,
        })
    }
}

/// Load the TOML config file
///
/// An explicitly passed path must exist; the default location
/// (`~/.config/terptracker/config.toml`) is optional and silently
/// skipped when absent.
fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            path.to_path_buf()
        }
        None => {
            let Some(default_path) = default_config_path() else {
                return Ok(TomlConfig::default());
            };
            if !default_path.exists() {
                return Ok(TomlConfig::default());
            }
            default_path
        }
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: TomlConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Default config file path for the platform
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("terptracker").join("config.toml"))
}

/// OS-dependent default database path
///
/// Linux: `~/.local/share/terptracker/terptracker.db`
fn default_database_path() -> PathBuf {
    let data_dir = dirs::data_local_dir().unwrap_or_else(|| {
        warn!("Could not determine data directory, using current directory");
        PathBuf::from(".")
    });
    data_dir.join("terptracker").join("terptracker.db")
}
