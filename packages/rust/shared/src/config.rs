//! Application configuration for LeadScout.
//!
//! User config lives at `~/.leadscout/leadscout.toml`. The file stores the
//! *names* of the environment variables holding API keys, never the keys
//! themselves. CLI flags override config file values, which override
//! defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LeadScoutError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "leadscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".leadscout";

// ---------------------------------------------------------------------------
// Config structs (matching leadscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Search backend settings.
    #[serde(default)]
    pub search: SearchBackendConfig,

    /// Model inference settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Database file path (defaults under the config directory).
    #[serde(default)]
    pub database_path: Option<String>,
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchBackendConfig {
    /// Env var holding the Serper.dev API key.
    #[serde(default = "default_serper_key_env")]
    pub serper_api_key_env: String,

    /// Env var holding the Google Custom Search API key.
    #[serde(default = "default_google_key_env")]
    pub google_api_key_env: String,

    /// Env var holding the Google Custom Search engine id (cx).
    #[serde(default = "default_google_cx_env")]
    pub google_cx_env: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchBackendConfig {
    fn default() -> Self {
        Self {
            serper_api_key_env: default_serper_key_env(),
            google_api_key_env: default_google_key_env(),
            google_cx_env: default_google_cx_env(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_serper_key_env() -> String {
    "SERPER_API_KEY".into()
}
fn default_google_key_env() -> String {
    "GOOGLE_SEARCH_API_KEY".into()
}
fn default_google_cx_env() -> String {
    "GOOGLE_SEARCH_CX".into()
}
fn default_search_timeout() -> u64 {
    30
}

/// `[model]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Env var holding the OpenRouter API key (never store the key itself).
    #[serde(default = "default_model_key_env")]
    pub api_key_env: String,

    /// Default model to use for extraction.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_model_key_env(),
            default_model: default_model(),
            timeout_secs: default_model_timeout(),
        }
    }
}

fn default_model_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "moonshotai/kimi-k2.5".into()
}
fn default_model_timeout() -> u64 {
    120
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.leadscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LeadScoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.leadscout/leadscout.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LeadScoutError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| LeadScoutError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LeadScoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LeadScoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LeadScoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the search and model API key env vars are set and non-empty.
///
/// The Google backend vars are optional at startup: the gateway degrades to
/// the primary provider alone when the secondary cannot be configured.
pub fn validate_api_keys(config: &AppConfig) -> Result<()> {
    for var_name in [
        &config.search.serper_api_key_env,
        &config.model.api_key_env,
    ] {
        match std::env::var(var_name) {
            Ok(val) if !val.is_empty() => {}
            _ => {
                return Err(LeadScoutError::config(format!(
                    "API key not found. Set the {var_name} environment variable."
                )));
            }
        }
    }
    Ok(())
}
