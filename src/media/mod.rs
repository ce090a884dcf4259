//! Uploaded media handling
//!
//! Images are passed to the vision API as base64 `data:` URLs; audio clips are
//! forwarded to the transcription API untouched.

use std::path::{Path, PathBuf};

use base64::Engine;

use crate::{Error, Result};

/// An uploaded image awaiting encoding
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// An uploaded or recorded audio clip
#[derive(Debug, Clone)]
pub struct AudioInput {
    pub data: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

/// Base64 image ready for a chat completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub base64: String,
    pub media_type: &'static str,
}

impl EncodedImage {
    /// Render as a `data:` URL for an `image_url` content part
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.base64)
    }
}

/// Media that can be read from a file on disk
pub trait FromFile: Sized {
    /// Read the file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is empty
    fn from_path(path: &Path) -> Result<Self>;
}

/// An upload that is either already in memory or still on disk
///
/// File-backed uploads are read only when the pipeline reaches them, so an
/// unreadable file fails that step instead of the whole consultation.
#[derive(Debug, Clone)]
pub enum Upload<T> {
    /// Bytes received with the request
    Received(T),
    /// A path to read on demand
    File(PathBuf),
}

impl<T: FromFile> Upload<T> {
    /// Resolve the upload to its contents
    ///
    /// # Errors
    ///
    /// Returns error if a file-backed upload cannot be read
    pub fn load(self) -> Result<T> {
        match self {
            Self::Received(input) => Ok(input),
            Self::File(path) => T::from_path(&path),
        }
    }
}

impl<T> From<T> for Upload<T> {
    fn from(input: T) -> Self {
        Self::Received(input)
    }
}

impl FromFile for ImageInput {
    /// Read an image from disk, guessing its MIME type from the extension
    fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        if data.is_empty() {
            return Err(Error::Media(format!("image file is empty: {}", path.display())));
        }

        let mime_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or("image/jpeg", mime_from_extension)
            .to_string();

        Ok(Self { data, mime_type })
    }
}

impl ImageInput {
    /// Base64-encode the image
    #[must_use]
    pub fn encode(&self) -> EncodedImage {
        EncodedImage {
            base64: base64::engine::general_purpose::STANDARD.encode(&self.data),
            media_type: normalize_image_mime(&self.mime_type),
        }
    }
}

impl FromFile for AudioInput {
    /// Read an audio clip from disk
    fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        if data.is_empty() {
            return Err(Error::Media(format!("audio file is empty: {}", path.display())));
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let mime_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or("audio/wav", mime_from_extension)
            .to_string();

        Ok(Self {
            data,
            file_name,
            mime_type,
        })
    }
}

/// Read an image file and return its base64 text
///
/// # Errors
///
/// Returns error if the file cannot be read
pub fn encode_image(path: &Path) -> Result<String> {
    Ok(ImageInput::from_path(path)?.encode().base64)
}

/// Normalize an image MIME type to one the vision API accepts
fn normalize_image_mime(mime_type: &str) -> &'static str {
    match mime_type.to_lowercase().as_str() {
        "image/png" => "image/png",
        "image/gif" => "image/gif",
        "image/webp" => "image/webp",
        // jpeg, jpg, and any unknown type default to jpeg
        _ => "image/jpeg",
    }
}

/// Guess a MIME type from a file extension
fn mime_from_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "jpg" | "jpeg" => "image/jpeg",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "ogg" | "opus" => "audio/ogg",
        "webm" => "audio/webm",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        _ => "application/octet-stream",
    }
}
