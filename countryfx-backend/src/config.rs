use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

pub const DEFAULT_COUNTRIES_URL: &str =
    "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies";
pub const DEFAULT_EXCHANGE_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub sources: SourcesConfig,

    #[serde(default)]
    pub artifact: ArtifactConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_countries_url")]
    pub countries_url: String,

    #[serde(default = "default_exchange_rates_url")]
    pub exchange_rates_url: String,

    /// Per-request timeout for each feed
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Where the summary PNG is written (overwritten on each refresh)
    #[serde(default = "default_artifact_path")]
    pub path: PathBuf,

    /// Extra font directory loaded on top of the system fonts
    #[serde(default = "default_fonts_dir")]
    pub fonts_dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data/countries.db")
}

fn default_countries_url() -> String {
    DEFAULT_COUNTRIES_URL.to_string()
}

fn default_exchange_rates_url() -> String {
    DEFAULT_EXCHANGE_RATES_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("cache/summary.png")
}

fn default_fonts_dir() -> PathBuf {
    PathBuf::from("fonts")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_dir: default_log_dir(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            countries_url: default_countries_url(),
            exchange_rates_url: default_exchange_rates_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            path: default_artifact_path(),
            fonts_dir: default_fonts_dir(),
        }
    }
}

impl SourcesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl BackendConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: BackendConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;
        Ok(config)
    }

    /// Apply `DATABASE_URL` and `PORT` on top of the file values.
    pub fn apply_env_overrides(&mut self, database_url: Option<String>, port: Option<String>) -> anyhow::Result<()> {
        if let Some(url) = database_url.filter(|u| !u.trim().is_empty()) {
            let path = url
                .trim()
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            self.database.path = PathBuf::from(path);
        }

        if let Some(port) = port.filter(|p| !p.trim().is_empty()) {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid PORT '{}': {}", port, e))?;
        }

        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

pub static CONFIG: OnceLock<BackendConfig> = OnceLock::new();

/// Load `config.toml` (defaults when absent), then `.env` and the process
/// environment, and publish the result in [`CONFIG`].
pub fn read_config() -> anyhow::Result<&'static BackendConfig> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }

    let mut config = if Path::new(DEFAULT_CONFIG_PATH).exists() {
        BackendConfig::from_file(DEFAULT_CONFIG_PATH)?
    } else {
        BackendConfig::default()
    };

    // A missing .env is normal outside development.
    let _ = dotenvy::dotenv();
    config.apply_env_overrides(std::env::var("DATABASE_URL").ok(), std::env::var("PORT").ok())?;

    Ok(CONFIG.get_or_init(|| config))
}
