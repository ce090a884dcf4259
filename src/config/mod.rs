//! Configuration management for the doctor gateway

pub mod file;

use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};

use self::file::ConfigFile;

/// Default OpenAI-compatible endpoint (Groq)
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default multimodal model
pub const DEFAULT_VISION_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

/// Default transcription model
pub const DEFAULT_STT_MODEL: &str = "whisper-large-v3";

/// Default speech synthesis model
pub const DEFAULT_TTS_MODEL: &str = "playai-tts";

/// Default speech synthesis voice
pub const DEFAULT_TTS_VOICE: &str = "Fritz-PlayAI";

/// Default port for the web form
pub const DEFAULT_PORT: u16 = 7860;

/// Doctor gateway configuration
///
/// Built once at startup and passed by reference to each client.
#[derive(Debug)]
pub struct Config {
    /// Remote API endpoint and credential
    pub api: ApiConfig,

    /// Model identifiers
    pub models: ModelConfig,

    /// Voice output configuration
    pub voice: VoiceConfig,

    /// HTTP server configuration
    pub server: ServerConfig,
}

/// Remote API configuration
#[derive(Debug)]
pub struct ApiConfig {
    /// OpenAI-compatible base URL, without trailing slash
    pub base_url: String,

    /// Credential forwarded as a bearer token (from `GROQ_API_KEY`)
    pub api_key: Option<SecretString>,
}

/// Model identifiers for each remote call
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Multimodal chat completion model
    pub vision: String,

    /// Speech-to-text model
    pub stt: String,

    /// Text-to-speech model
    pub tts: String,
}

/// Voice output configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS response format, also used as the output file extension
    pub tts_format: String,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Directory synthesized audio is written to
    pub output_dir: PathBuf,

    /// Path to static files directory (custom web UI)
    pub static_dir: Option<PathBuf>,

    /// Global requests-per-minute budget; `None` disables limiting
    pub rate_limit_per_minute: Option<u32>,

    /// Age in seconds after which synthesized audio is pruned
    pub audio_ttl_secs: u64,
}

impl Config {
    /// Load configuration from the environment and the optional TOML file
    ///
    /// Precedence is env > toml > default.
    #[must_use]
    pub fn load() -> Self {
        let fc = file::load_config_file();
        Self::resolve(fc, &|key: &str| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an environment lookup
    #[must_use]
    pub fn resolve(fc: ConfigFile, env: &dyn Fn(&str) -> Option<String>) -> Self {
        let base_url = env("DOCTOR_API_BASE_URL")
            .or(fc.api.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let api_key = env("GROQ_API_KEY")
            .or(fc.api.api_key)
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from);

        let models = ModelConfig {
            vision: env("DOCTOR_VISION_MODEL")
                .or(fc.models.vision)
                .unwrap_or_else(|| DEFAULT_VISION_MODEL.to_string()),
            stt: env("DOCTOR_STT_MODEL")
                .or(fc.models.stt)
                .unwrap_or_else(|| DEFAULT_STT_MODEL.to_string()),
            tts: env("DOCTOR_TTS_MODEL")
                .or(fc.models.tts)
                .unwrap_or_else(|| DEFAULT_TTS_MODEL.to_string()),
        };

        let voice = VoiceConfig {
            tts_voice: env("DOCTOR_TTS_VOICE")
                .or(fc.voice.tts_voice)
                .unwrap_or_else(|| DEFAULT_TTS_VOICE.to_string()),
            tts_format: env("DOCTOR_TTS_FORMAT")
                .or(fc.voice.tts_format)
                .unwrap_or_else(|| "wav".to_string()),
        };

        let server = ServerConfig {
            port: env("DOCTOR_PORT")
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
            output_dir: env("DOCTOR_OUTPUT_DIR")
                .or(fc.server.output_dir)
                .map_or_else(default_output_dir, PathBuf::from),
            static_dir: env("DOCTOR_STATIC_DIR")
                .or(fc.server.static_dir)
                .map(PathBuf::from),
            rate_limit_per_minute: env("DOCTOR_RATE_LIMIT")
                .and_then(|s| s.parse().ok())
                .or(fc.server.rate_limit_per_minute)
                .filter(|rpm| *rpm > 0),
            audio_ttl_secs: env("DOCTOR_AUDIO_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .or(fc.server.audio_ttl_secs)
                .unwrap_or(3600),
        };

        Self {
            api: ApiConfig { base_url, api_key },
            models,
            voice,
            server,
        }
    }

    /// Whether a credential is configured
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api.api_key.is_some()
    }

    /// Copy of the credential for a client, empty when unset
    ///
    /// A missing key is not rejected here; the first remote call fails instead.
    #[must_use]
    pub fn api_key(&self) -> SecretString {
        self.api
            .api_key
            .as_ref()
            .map_or_else(|| SecretString::from(""), |k| SecretString::from(k.expose_secret()))
    }

    /// Build a full endpoint URL from a path relative to the base URL
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api.base_url, path.trim_start_matches('/'))
    }
}

/// Default audio output directory: `~/.cache/doctor-gateway/audio`
fn default_output_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".cache/doctor-gateway/audio"),
        |d| d.cache_dir().join("doctor-gateway").join("audio"),
    )
}
