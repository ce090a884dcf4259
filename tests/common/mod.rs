//! Shared test utilities

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use doctor_gateway::{
    AudioInput, AudioOutputs, Consultant, EncodedImage, Error, Result, SpeechSynthesizer,
    Transcriber, VisionModel,
};

/// Transcriber returning a canned transcript or STT error
pub struct MockTranscriber {
    result: std::result::Result<String, String>,
    pub calls: Mutex<Vec<String>>,
}

impl MockTranscriber {
    pub fn ok(text: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, audio: &AudioInput) -> Result<String> {
        self.calls.lock().unwrap().push(audio.file_name.clone());
        self.result.clone().map_err(Error::Stt)
    }
}

/// A prompt received by [`MockVision`] and the image URL sent with it
#[derive(Debug, Clone)]
pub struct VisionCall {
    pub prompt: String,
    pub image_url: Option<String>,
}

/// Vision model returning a canned reply or vision error
pub struct MockVision {
    result: std::result::Result<String, String>,
    pub calls: Mutex<Vec<VisionCall>>,
}

impl MockVision {
    pub fn ok(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn last_call(&self) -> VisionCall {
        self.calls.lock().unwrap().last().cloned().expect("vision was not called")
    }
}

#[async_trait]
impl VisionModel for MockVision {
    async fn complete(&self, prompt: &str, image: Option<&EncodedImage>) -> Result<String> {
        self.calls.lock().unwrap().push(VisionCall {
            prompt: prompt.to_string(),
            image_url: image.map(EncodedImage::data_url),
        });
        self.result.clone().map_err(Error::Vision)
    }
}

/// Synthesizer returning canned audio bytes or a TTS error
pub struct MockSynthesizer {
    result: std::result::Result<Vec<u8>, String>,
    pub inputs: Mutex<Vec<String>>,
}

impl MockSynthesizer {
    pub fn ok(audio: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(audio.to_vec()),
            inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Err(message.to_string()),
            inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn last_input(&self) -> String {
        self.inputs.lock().unwrap().last().cloned().expect("synthesizer was not called")
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        self.inputs.lock().unwrap().push(text.to_string());
        self.result.clone().map_err(Error::Tts)
    }

    fn file_extension(&self) -> &str {
        "mp3"
    }
}

/// Build a consultant over mock collaborators writing into `dir`
pub fn consultant(
    transcriber: Arc<MockTranscriber>,
    vision: Arc<MockVision>,
    synthesizer: Arc<MockSynthesizer>,
    dir: &Path,
) -> Consultant {
    Consultant::new(transcriber, vision, synthesizer, AudioOutputs::new(dir))
}

/// Well-formed model reply
pub const GOOD_REPLY: &str =
    r#"{"analysis": "With what I see, mild acne.", "treatment": "Wash gently twice a day."}"#;
