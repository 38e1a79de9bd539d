use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{AppError, ConfigError};

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Upstream service endpoints
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Display preferences
    #[serde(default)]
    pub ui: UiConfig,

    /// Fixed device position, used when no platform location service exists
    #[serde(default)]
    pub location: LocationConfig,

    /// Offline snapshot cache
    #[serde(default)]
    pub offline: OfflineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// Base URL of the geocoding service (`/v1/search` is appended)
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    /// Base URL of the forecast service (`/v1/forecast` is appended)
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,

    /// Map tile URL template with `{s}`, `{z}`, `{x}` and `{y}` placeholders
    #[serde(default = "default_tile_url")]
    pub tile_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com".to_string()
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com".to_string()
}

fn default_tile_url() -> String {
    "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            geocoding_url: default_geocoding_url(),
            forecast_url: default_forecast_url(),
            tile_url: default_tile_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// The other unit
    pub fn toggled(self) -> Self {
        match self {
            Self::Celsius => Self::Fahrenheit,
            Self::Fahrenheit => Self::Celsius,
        }
    }

    /// Single-letter label shown after the degree sign
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    /// Start in dark mode
    #[serde(default)]
    pub dark_mode: bool,

    /// Initial display unit
    #[serde(default)]
    pub temperature_unit: TemperatureUnit,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationConfig {
    /// Both halves of the fixed position, if configured
    pub fn fixed_position(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineConfig {
    /// Route requests through the offline snapshot cache
    #[serde(default = "default_offline_enabled")]
    pub enabled: bool,

    /// Current snapshot version; any other stored snapshot is deleted on activate
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Origin the asset paths are resolved against
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Assets stored in the snapshot on install
    #[serde(default = "default_assets")]
    pub assets: Vec<String>,
}

fn default_offline_enabled() -> bool {
    true
}

fn default_cache_name() -> String {
    "weather-app-v1".to_string()
}

fn default_origin() -> String {
    "http://localhost:8000".to_string()
}

fn default_assets() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/style.css",
        "/script.js",
        "/manifest.json",
        "/icons/clear-day.svg",
        "/icons/mainly-clear.svg",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            enabled: default_offline_enabled(),
            cache_name: default_cache_name(),
            origin: default_origin(),
            assets: default_assets(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("skycast")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            endpoints: EndpointsConfig::default(),
            ui: UiConfig::default(),
            location: LocationConfig::default(),
            offline: OfflineConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self, AppError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, writing defaults there if missing
    pub fn load_from(config_path: &Path) -> Result<Self, AppError> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(config_path)?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            ConfigError::ParseError(format!("{}: {}", config_path.display(), e))
        })?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult), AppError> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(
            &self.endpoints.geocoding_url,
            "endpoints.geocoding_url",
            &mut result,
        );
        self.validate_url(
            &self.endpoints.forecast_url,
            "endpoints.forecast_url",
            &mut result,
        );

        for placeholder in ["{z}", "{x}", "{y}"] {
            if !self.endpoints.tile_url.contains(placeholder) {
                result.add_error(
                    "endpoints.tile_url",
                    format!("Tile URL template is missing {}", placeholder),
                );
            }
        }

        if self.endpoints.timeout_seconds == 0 {
            result.add_error(
                "endpoints.timeout_seconds",
                "Request timeout must be greater than 0",
            );
        } else if self.endpoints.timeout_seconds > 300 {
            result.add_warning(
                "endpoints.timeout_seconds",
                "Request timeout is unusually long (>300s)",
            );
        }

        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    result.add_error("location.latitude", "Latitude must be between -90 and 90");
                }
                if !(-180.0..=180.0).contains(&lon) {
                    result.add_error(
                        "location.longitude",
                        "Longitude must be between -180 and 180",
                    );
                }
            }
            (None, None) => {}
            _ => {
                result.add_error(
                    "location",
                    "Both latitude and longitude must be set for a fixed position",
                );
            }
        }

        if self.offline.enabled {
            if self.offline.cache_name.trim().is_empty() {
                result.add_error("offline.cache_name", "Cache name cannot be empty");
            }
            self.validate_url(&self.offline.origin, "offline.origin", &mut result);
            if self.offline.assets.is_empty() {
                result.add_warning("offline.assets", "No assets listed; snapshot will be empty");
            }
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), AppError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<(), AppError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        std::fs::write(config_path, contents)?;

        Ok(())
    }

    /// Path of the offline snapshot database
    pub fn snapshot_db_path(&self) -> PathBuf {
        self.config_dir.join("offline.db")
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound("no user configuration directory".to_string()))?
            .join("skycast");

        Ok(config_dir.join("config.toml"))
    }
}
