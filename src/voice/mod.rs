//! Voice processing module
//!
//! Speech-to-text for the patient's recording and text-to-speech for the
//! doctor's reply, both against OpenAI-compatible audio endpoints.

mod stt;
mod tts;

pub use stt::SpeechToText;
pub use tts::TextToSpeech;
