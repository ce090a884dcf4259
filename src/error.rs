//! Error types for the doctor gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the doctor gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Vision API error
    #[error("vision error: {0}")]
    Vision(String),

    /// Media handling error (unreadable or empty uploads)
    #[error("media error: {0}")]
    Media(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// The message without its category prefix
    ///
    /// Used where a failure is shown inline next to a fixed label.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Config(msg)
            | Self::Stt(msg)
            | Self::Tts(msg)
            | Self::Vision(msg)
            | Self::Media(msg) => msg.clone(),
            Self::Io(e) => e.to_string(),
            Self::Http(e) => e.to_string(),
            Self::Toml(e) => e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_drops_category_prefix() {
        let err = Error::Stt("bad audio".to_string());
        assert_eq!(err.to_string(), "STT error: bad audio");
        assert_eq!(err.detail(), "bad audio");
    }

    #[test]
    fn detail_of_wrapped_error_is_its_message() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        assert_eq!(Error::from(io).detail(), "no such file");
    }
}
