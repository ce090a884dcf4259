//! Consultation pipeline
//!
//! Runs one submission through transcription, the vision model, reply
//! normalization, and speech synthesis. Every remote step that fails is
//! replaced by a substitute value so all four outputs are always produced.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::Instrument;

use crate::media::{AudioInput, EncodedImage, ImageInput, Upload};
use crate::normalize::{StructuredReply, normalize};
use crate::output::AudioOutputs;
use crate::prompt::build_prompt;
use crate::voice::{SpeechToText, TextToSpeech};
use crate::vision::VisionClient;
use crate::{Config, Result};

/// Speech-to-text collaborator
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a recorded clip
    ///
    /// # Errors
    ///
    /// Returns error if transcription fails
    async fn transcribe(&self, audio: &AudioInput) -> Result<String>;
}

/// Multimodal chat completion collaborator
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Return the model's raw reply to `prompt`, optionally with an image
    ///
    /// # Errors
    ///
    /// Returns error if the completion fails
    async fn complete(&self, prompt: &str, image: Option<&EncodedImage>) -> Result<String>;
}

/// Text-to-speech collaborator
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` to audio bytes
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;

    /// Extension for files holding the synthesized audio
    fn file_extension(&self) -> &str {
        "wav"
    }
}

/// One user submission; either input may be absent
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub audio: Option<Upload<AudioInput>>,
    pub image: Option<Upload<ImageInput>>,
}

/// Everything handed back to the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsultOutcome {
    pub transcript: String,
    pub analysis: String,
    pub treatment: String,
    pub audio_path: Option<PathBuf>,
}

/// Orchestrates the remote collaborators for each submission
pub struct Consultant {
    transcriber: Arc<dyn Transcriber>,
    vision: Arc<dyn VisionModel>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    outputs: AudioOutputs,
}

impl Consultant {
    /// Create a consultant from explicit collaborators
    #[must_use]
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        vision: Arc<dyn VisionModel>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        outputs: AudioOutputs,
    ) -> Self {
        Self {
            transcriber,
            vision,
            synthesizer,
            outputs,
        }
    }

    /// Create a consultant backed by the configured remote APIs
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(SpeechToText::new(config)),
            Arc::new(VisionClient::new(config)),
            Arc::new(TextToSpeech::new(config)),
            AudioOutputs::new(&config.server.output_dir),
        )
    }

    /// Where synthesized audio is written
    #[must_use]
    pub const fn outputs(&self) -> &AudioOutputs {
        &self.outputs
    }

    /// Run one submission end to end
    ///
    /// Never fails; each failed step degrades its own output field.
    pub async fn consult(&self, submission: Submission) -> ConsultOutcome {
        let span = tracing::info_span!(
            "consult",
            id = %uuid::Uuid::new_v4(),
            has_audio = submission.audio.is_some(),
            has_image = submission.image.is_some()
        );
        self.run(submission).instrument(span).await
    }

    async fn run(&self, submission: Submission) -> ConsultOutcome {
        let transcript = match submission.audio {
            Some(audio) => self.transcribe(audio).await,
            None => String::new(),
        };

        let prompt = build_prompt(&transcript, submission.image.is_some());
        let raw = match submission.image {
            Some(image) => self.analyze_image(&prompt, image).await,
            None => self.analyze_text(&prompt).await,
        };

        let reply = normalize(&raw);
        let (treatment, audio_path) = self.speak(&reply).await;

        tracing::info!(has_audio_reply = audio_path.is_some(), "consultation complete");

        ConsultOutcome {
            transcript,
            analysis: reply.analysis,
            treatment,
            audio_path,
        }
    }

    async fn transcribe(&self, audio: Upload<AudioInput>) -> String {
        let result = match audio.load() {
            Ok(audio) => self.transcriber.transcribe(&audio).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "transcription failed");
                format!("[STT error: {}]", e.detail())
            }
        }
    }

    async fn analyze_image(&self, prompt: &str, image: Upload<ImageInput>) -> String {
        let result = match image.load() {
            Ok(image) => {
                let encoded = image.encode();
                self.vision.complete(prompt, Some(&encoded)).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "image analysis failed");
                serde_json::json!({
                    "analysis": "Image processing error",
                    "treatment": format!("Failed to analyze image due to error: {}", e.detail()),
                })
                .to_string()
            }
        }
    }

    async fn analyze_text(&self, prompt: &str) -> String {
        match self.vision.complete(prompt, None).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "text-only analysis failed");
                serde_json::json!({
                    "analysis": "Image not provided or unclear",
                    "treatment": format!(
                        "No image was provided. If you can, please upload a clear photo. Error detail: {}",
                        e.detail()
                    ),
                })
                .to_string()
            }
        }
    }

    /// Synthesize the reply; on failure the audio is dropped and the reason
    /// is appended to the treatment text
    async fn speak(&self, reply: &StructuredReply) -> (String, Option<PathBuf>) {
        let path = self.outputs.next_path(self.synthesizer.file_extension());

        match self.synthesize_to(&path, &reply.speech_text()).await {
            Ok(()) => (reply.treatment.clone(), Some(path)),
            Err(e) => {
                tracing::warn!(error = %e, "speech synthesis failed");
                (
                    format!("{}\n\n[TTS generation failed: {}]", reply.treatment, e.detail()),
                    None,
                )
            }
        }
    }

    async fn synthesize_to(&self, path: &std::path::Path, text: &str) -> Result<()> {
        self.outputs.clear(path).await?;
        let audio = self.synthesizer.synthesize(text).await?;
        self.outputs.write(path, &audio).await
    }
}
