//! Doctor Gateway - Voice and vision consultations backed by hosted AI models
//!
//! A browser form submits an optional voice clip and an optional image. The
//! gateway transcribes the clip, asks a multimodal model for a JSON reply with
//! `analysis` and `treatment`, recovers that reply from whatever text comes
//! back, and reads it aloud through a speech synthesis API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Browser form / CLI                  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Consultant                         │
//! │   STT  →  prompt  →  vision  →  normalize  →  TTS   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │          OpenAI-compatible API (Groq)                │
//! │   chat/completions │ audio/transcriptions │ speech  │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod consult;
pub mod error;
pub mod media;
pub mod normalize;
pub mod output;
pub mod prompt;
pub mod vision;
pub mod voice;

pub use config::Config;
pub use consult::{
    ConsultOutcome, Consultant, SpeechSynthesizer, Submission, Transcriber, VisionModel,
};
pub use error::{Error, Result};
pub use media::{AudioInput, EncodedImage, FromFile, ImageInput, Upload, encode_image};
pub use normalize::{StructuredReply, normalize};
pub use output::AudioOutputs;
