//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub map: MapConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend REST API (login, flood reports)
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:5001".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Static data published by the weather collector
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_url")]
    pub base_url: String,
}

fn default_data_url() -> String {
    "http://localhost:4200/WeatheriaBackend/weatheria".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_url: default_data_url(),
        }
    }
}

/// Local client state
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_state_dir")]
    pub state_dir: String,

    #[serde(default = "default_downloads_dir")]
    pub downloads_dir: String,
}

fn default_state_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("weatheria").to_string_lossy().to_string())
        .unwrap_or_else(|| "./weatheria_state".to_string())
}

fn default_downloads_dir() -> String {
    dirs::download_dir()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            downloads_dir: default_downloads_dir(),
        }
    }
}

impl StorageConfig {
    fn expand_home(&mut self) {
        self.state_dir = expand_home(&self.state_dir);
        self.downloads_dir = expand_home(&self.downloads_dir);
    }
}

/// Resolve a leading `~` or `~/` against the user's home directory
fn expand_home(path: &str) -> String {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return path.to_string(),
    };

    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home.to_string_lossy().to_string(),
        Some(home) => home.join(rest).to_string_lossy().to_string(),
        None => {
            tracing::warn!(path, "No home directory to expand");
            path.to_string()
        }
    }
}

/// Dashboard screen
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

fn default_refresh_interval() -> u64 {
    900 // 15 minutes
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

/// Where the history screen lists its days from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistorySourceKind {
    /// `history/index.json` listing of CSV files
    #[default]
    Index,
    /// Keyed map of dates in a realtime database
    Remote,
}

/// History screen
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    #[serde(default)]
    pub source: HistorySourceKind,

    #[serde(default = "default_remote_url")]
    pub remote_url: String,
}

fn default_remote_url() -> String {
    "https://weatheriadx-default-rtdb.firebaseio.com/historial".to_string()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            source: HistorySourceKind::default(),
            remote_url: default_remote_url(),
        }
    }
}

/// Flood map screen
#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_center_lat")]
    pub center_lat: f64,

    #[serde(default = "default_center_lng")]
    pub center_lng: f64,

    #[serde(default = "default_zoom")]
    pub zoom: i32,

    #[serde(default = "default_location_label")]
    pub location_label: String,

    #[serde(default = "default_report_window")]
    pub report_window_hours: i64,

    #[serde(default = "default_geolocation_timeout")]
    pub geolocation_timeout_secs: u64,

    /// Position reported as the device location, if known
    pub device_lat: Option<f64>,
    pub device_lng: Option<f64>,
}

fn default_center_lat() -> f64 {
    20.5888
}

fn default_center_lng() -> f64 {
    -100.3961
}

fn default_zoom() -> i32 {
    10
}

fn default_location_label() -> String {
    "Estación - Universidad Tecnológica de Querétaro".to_string()
}

fn default_report_window() -> i64 {
    24
}

fn default_geolocation_timeout() -> u64 {
    8
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: default_center_lat(),
            center_lng: default_center_lng(),
            zoom: default_zoom(),
            location_label: default_location_label(),
            report_window_hours: default_report_window(),
            geolocation_timeout_secs: default_geolocation_timeout(),
            device_lat: None,
            device_lng: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(content)?;
        config.storage.expand_home();
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("weatheria").join("config.toml")),
            Some(PathBuf::from("/etc/weatheria/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("WEATHERIA_API_URL") {
            self.api.base_url = url;
        }
        if let Ok(url) = std::env::var("WEATHERIA_DATA_URL") {
            self.data.base_url = url;
        }
        if let Ok(dir) = std::env::var("WEATHERIA_STATE_DIR") {
            self.storage.state_dir = expand_home(&dir);
        }
        if let Ok(level) = std::env::var("WEATHERIA_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("WEATHERIA_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Weatheria Configuration
#
# Environment variables override these settings:
# - WEATHERIA_API_URL
# - WEATHERIA_DATA_URL
# - WEATHERIA_STATE_DIR
# - WEATHERIA_LOG_LEVEL
# - WEATHERIA_LOG_FORMAT

[api]
# Backend serving /login, /flood_history and /report_flood
base_url = "http://localhost:5001"

# Request timeout in seconds
request_timeout_secs = 30

[data]
# Where registros.json, the forecast and history/ are published
base_url = "http://localhost:4200/WeatheriaBackend/weatheria"

[storage]
# Directory holding the session token
state_dir = "~/.local/share/weatheria"

# Directory for downloaded day files
downloads_dir = "~/Downloads"

[dashboard]
# How often the dashboard refreshes while open (seconds)
refresh_interval_secs = 900

[history]
# "index" reads history/index.json, "remote" reads a keyed map of dates
source = "index"
remote_url = "https://weatheriadx-default-rtdb.firebaseio.com/historial"

[map]
center_lat = 20.5888
center_lng = -100.3961
zoom = 10
location_label = "Estación - Universidad Tecnológica de Querétaro"

# Reported floods older than this are hidden (hours)
report_window_hours = 24

# How long to wait for a device position (seconds)
geolocation_timeout_secs = 8

# Device position used by flood reports, if known
# device_lat = 20.59
# device_lng = -100.39

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:5001");
        assert_eq!(config.dashboard.refresh_interval_secs, 900);
        assert_eq!(config.history.source, HistorySourceKind::Index);
        assert_eq!(config.map.report_window_hours, 24);
        assert_eq!(config.map.device_lat, None);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::parse(
            r#"
[history]
source = "remote"

[map]
zoom = 12
"#,
        )
        .unwrap();

        assert_eq!(config.history.source, HistorySourceKind::Remote);
        assert_eq!(config.map.zoom, 12);
        assert_eq!(config.map.center_lat, 20.5888);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_generated_storage_paths_are_absolute() {
        let config = Config::parse(&generate_default_config()).unwrap();
        let store = crate::session::FileTokenStore::new(&config.storage.state_dir);

        assert!(store.path().is_absolute(), "{:?}", store.path());
        assert!(!config.storage.state_dir.contains('~'));
        assert!(Path::new(&config.storage.downloads_dir).is_absolute());
    }

    #[test]
    fn test_expand_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_home("~"), home.to_string_lossy());
        assert_eq!(
            expand_home("~/Downloads"),
            home.join("Downloads").to_string_lossy()
        );
        assert_eq!(expand_home("/var/lib/weatheria"), "/var/lib/weatheria");
        assert_eq!(expand_home("~ana/files"), "~ana/files");
        assert_eq!(expand_home("./state"), "./state");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/weatheria.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
