//! TOML configuration file loading
//!
//! Supports `~/.config/doctor-gateway/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Remote API endpoint and credential
    #[serde(default)]
    pub api: ApiFileConfig,

    /// Model identifiers
    #[serde(default)]
    pub models: ModelsFileConfig,

    /// Voice output configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// Remote API configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiFileConfig {
    /// OpenAI-compatible base URL (e.g. `https://api.groq.com/openai/v1`)
    pub base_url: Option<String>,

    /// API key; `GROQ_API_KEY` takes precedence
    pub api_key: Option<String>,
}

/// Model identifiers for each remote call
#[derive(Debug, Default, Deserialize)]
pub struct ModelsFileConfig {
    pub vision: Option<String>,
    pub stt: Option<String>,
    pub tts: Option<String>,
}

/// Voice output configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// TTS voice identifier (e.g. "Fritz-PlayAI")
    pub tts_voice: Option<String>,

    /// TTS response format (e.g. "wav", "mp3")
    pub tts_format: Option<String>,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// HTTP server port
    pub port: Option<u16>,

    /// Directory for synthesized audio files
    pub output_dir: Option<String>,

    /// Directory with a custom web UI
    pub static_dir: Option<String>,

    /// Global request budget per minute
    pub rate_limit_per_minute: Option<u32>,

    /// Seconds a synthesized audio file is kept before pruning
    pub audio_ttl_secs: Option<u64>,
}

/// Parse a config file from disk
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML
pub fn parse_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load the TOML config file from the standard path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ConfigFile {
    let Some(path) = config_file_path() else {
        return ConfigFile::default();
    };

    if !path.exists() {
        return ConfigFile::default();
    }

    match parse_config_file(&path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            ConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/doctor-gateway/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("doctor-gateway").join("config.toml"))
}
