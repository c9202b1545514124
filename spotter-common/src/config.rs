//! Configuration loading and root folder resolution
//!
//! Bootstrap settings come from a small TOML file. Everything has a compiled
//! default, so a missing or unreadable file is a warning, never a startup
//! failure.
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable `SPOTTER_ROOT_FOLDER`
//! 3. TOML config file `root_folder`
//! 4. OS-dependent compiled default (fallback)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::models::BoundingBox;
use crate::{Error, Result};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "SPOTTER_ROOT_FOLDER";

/// Environment variable carrying the classifier API key
pub const CLASSIFIER_API_KEY_ENV: &str = "SPOTTER_GEMINI_API_KEY";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "swamp-spotter.db";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5780;

const APP_DIR: &str = "swamp-spotter";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP port (optional, default 5780)
    #[serde(default)]
    pub port: Option<u16>,

    /// Bind address (optional, default 127.0.0.1)
    #[serde(default)]
    pub bind_address: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Region new sightings must fall within (default: Alachua County)
    #[serde(default)]
    pub bounds: Option<BoundingBox>,

    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// External image classifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// API key; `SPOTTER_GEMINI_API_KEY` takes priority
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_output_tokens() -> u32 {
    100
}

impl TomlConfig {
    /// Parse and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path or the platform default location
    ///
    /// Missing or invalid files fall back to defaults. Runs before logging is
    /// initialized, so the outcome is returned for the caller to log.
    pub fn load_or_default(explicit: Option<&Path>) -> (Self, ConfigSource) {
        let path = match explicit.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => path,
            None => return (Self::default(), ConfigSource::Defaults),
        };

        match Self::load(&path) {
            Ok(config) => (config, ConfigSource::File(path)),
            Err(e) => (
                Self::default(),
                ConfigSource::Fallback {
                    path,
                    reason: e.to_string(),
                },
            ),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(bounds) = &self.bounds {
            bounds.validate()?;
        }
        if self.classifier.timeout_secs == 0 {
            return Err(Error::Config("classifier.timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }

    /// Configured bounds or the compiled default
    pub fn bounds(&self) -> BoundingBox {
        self.bounds.unwrap_or_default()
    }
}

/// Where the bootstrap configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// No file found; compiled defaults
    Defaults,
    /// File present but unusable; compiled defaults
    Fallback { path: PathBuf, reason: String },
}

impl ConfigSource {
    /// Log the outcome once tracing is up
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::Defaults => info!("No config file found, using compiled defaults"),
            ConfigSource::Fallback { reason, .. } => {
                warn!("{} - using compiled defaults", reason)
            }
        }
    }
}

/// Locate the config file for the platform
///
/// Linux checks `~/.config/swamp-spotter/config.toml`, then
/// `/etc/swamp-spotter/config.toml`. Other platforms check only the user
/// config directory.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"));
    if let Some(path) = user_config.filter(|p| p.exists()) {
        return Some(path);
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(APP_DIR).join("config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/swamp-spotter (or /var/lib/swamp-spotter)
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("/var/lib").join(APP_DIR))
    } else if cfg!(target_os = "macos") || cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("./swamp_spotter_data"))
    } else {
        PathBuf::from("./swamp_spotter_data")
    }
}

/// Resolves the root folder through the four-tier priority order
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>, config: &TomlConfig) -> Self {
        Self {
            cli_arg,
            toml_value: config.root_folder.clone(),
        }
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_value {
            return path.clone();
        }

        default_root_folder()
    }
}

/// Creates the root folder and locates the database inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}

/// Resolve the classifier API key: environment first, then TOML
///
/// Returns `None` when neither source has a non-blank key; the service then
/// runs with identification disabled.
pub fn resolve_classifier_api_key(config: &ClassifierConfig) -> Option<String> {
    let env_key = std::env::var(CLASSIFIER_API_KEY_ENV).ok().filter(|k| is_valid_key(k));
    let toml_key = config.api_key.clone().filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!("Classifier API key found in environment and TOML. Using environment.");
    }

    if let Some(key) = env_key {
        info!("Classifier API key loaded from environment variable");
        return Some(key);
    }
    if let Some(key) = toml_key {
        info!("Classifier API key loaded from TOML config");
        return Some(key);
    }

    warn!(
        "Classifier API key not configured; identification disabled. Set {} or classifier.api_key",
        CLASSIFIER_API_KEY_ENV
    );
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifier_defaults() {
        let config = ClassifierConfig::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_output_tokens, 100);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert!(config.root_folder.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.bounds(), BoundingBox::ALACHUA_COUNTY);
        assert_eq!(config.classifier.base_url, default_base_url());
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }

    #[test]
    fn test_database_path_inside_root() {
        let init = RootFolderInitializer::new(PathBuf::from("/tmp/spotter-root"));
        assert_eq!(
            init.database_path(),
            PathBuf::from("/tmp/spotter-root/swamp-spotter.db")
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config: TomlConfig = toml::from_str("[classifier]\ntimeout_secs = 0\n").unwrap();
        assert!(config.validate().is_err());
    }
}
