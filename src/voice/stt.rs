//! Speech-to-text (STT) processing

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::consult::Transcriber;
use crate::media::AudioInput;
use crate::{Config, Error, Result};

/// Response from a Whisper-style transcription API
#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Transcribes speech to text
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: SecretString,
    url: String,
    model: String,
}

impl SpeechToText {
    /// Create a new STT instance from configuration
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key(),
            url: config.endpoint("audio/transcriptions"),
            model: config.models.stt.clone(),
        }
    }

    /// Transcribe an audio clip to text
    ///
    /// # Errors
    ///
    /// Returns error if the upload fails or the API rejects the clip
    pub async fn transcribe(&self, audio: &AudioInput) -> Result<String> {
        tracing::debug!(
            audio_bytes = audio.data.len(),
            file_name = %audio.file_name,
            model = %self.model,
            "starting transcription"
        );

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.data.clone())
                    .file_name(audio.file_name.clone())
                    .mime_str(&audio.mime_type)
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone())
            .text("response_format", "json");

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key.expose_secret()))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "transcription request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Stt(format!("transcription API error {status}: {body}")));
        }

        let result: TranscriptionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse response");
            e
        })?;

        tracing::info!(transcript_chars = result.text.len(), "transcription complete");
        Ok(result.text)
    }
}

#[async_trait]
impl Transcriber for SpeechToText {
    async fn transcribe(&self, audio: &AudioInput) -> Result<String> {
        Self::transcribe(self, audio).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::file::ConfigFile;

    fn config_for(url: &str) -> Config {
        let url = url.to_string();
        Config::resolve(ConfigFile::default(), &move |key: &str| match key {
            "DOCTOR_API_BASE_URL" => Some(url.clone()),
            "GROQ_API_KEY" => Some("test-groq-key".to_string()),
            _ => None,
        })
    }

    fn clip() -> AudioInput {
        AudioInput {
            data: vec![0u8; 100],
            file_name: "patient.webm".to_string(),
            mime_type: "audio/webm".to_string(),
        }
    }

    #[test]
    fn transcription_response_parse_unicode() {
        let json = r#"{"text": "Olá, dói aqui"}"#;
        let result: TranscriptionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(result.text, "Olá, dói aqui");
    }

    #[tokio::test]
    async fn transcribes_clip() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/audio/transcriptions")
            .match_header("Authorization", "Bearer test-groq-key")
            .match_body(mockito::Matcher::Regex("whisper-large-v3".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"text": "I have a rash on my cheek"}"#)
            .create_async()
            .await;

        let stt = SpeechToText::new(&config_for(&server.url()));
        let text = stt.transcribe(&clip()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(text, "I have a rash on my cheek");
    }

    #[tokio::test]
    async fn api_error_returns_stt_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/audio/transcriptions")
            .with_status(401)
            .with_body(r#"{"error": "Invalid API key"}"#)
            .create_async()
            .await;

        let stt = SpeechToText::new(&config_for(&server.url()));
        let err = stt.transcribe(&clip()).await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, Error::Stt(_)));
        assert!(err.to_string().contains("401"), "error should mention status code: {err}");
    }

    #[tokio::test]
    async fn malformed_json_response_is_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/audio/transcriptions")
            .with_status(200)
            .with_body("{not json")
            .create_async()
            .await;

        let stt = SpeechToText::new(&config_for(&server.url()));
        let err = stt.transcribe(&clip()).await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
