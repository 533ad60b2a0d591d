use std::path::Path;
use std::time::Duration;

use thiserror::Error;

/// Audio container formats accepted by the transcription endpoint.
pub const SUPPORTED_AUDIO_FORMATS: &[&str] =
    &["mp3", "wav", "m4a", "mp4", "webm", "ogg", "mpeg", "mpga"];

/// Whisper API hard limit.
pub const MAX_FILE_SIZE_MB: u64 = 25;

const MAX_FILE_SIZE_BYTES: u64 = MAX_FILE_SIZE_MB * 1024 * 1024;

#[derive(Error, Debug)]
pub enum TranscribeError {
    #[error("지원하지 않는 오디오 형식입니다: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("오디오 파일이 너무 큽니다: {size_mb:.1}MB (최대 {MAX_FILE_SIZE_MB}MB)")]
    FileTooLarge { size_mb: f64 },

    #[error("오디오 파일이 비어있습니다")]
    EmptyFile,

    #[error("transcription request failed: {0}")]
    Http(String),

    #[error("transcription API error (status {status}): {body}")]
    Api { status: u16, body: String },
}

/// Whether a filename looks like an audio file we can transcribe.
pub fn is_audio_file(filename: &str) -> bool {
    audio_extension(filename)
        .map(|ext| SUPPORTED_AUDIO_FORMATS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn audio_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Blocking client for the OpenAI audio transcription endpoint.
pub struct WhisperClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl WhisperClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, TranscribeError> {
        if api_key.trim().is_empty() {
            return Err(TranscribeError::Http("empty API key".to_string()));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| TranscribeError::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Transcribe an audio file to plain text. `language` is an ISO-639-1
    /// code hint ("ko" for Korean call recordings).
    pub fn transcribe(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        language: &str,
    ) -> Result<String, TranscribeError> {
        let extension = audio_extension(filename).unwrap_or_default();
        if !SUPPORTED_AUDIO_FORMATS.contains(&extension.as_str()) {
            return Err(TranscribeError::UnsupportedFormat { extension });
        }
        if bytes.is_empty() {
            return Err(TranscribeError::EmptyFile);
        }
        if bytes.len() as u64 > MAX_FILE_SIZE_BYTES {
            return Err(TranscribeError::FileTooLarge {
                size_mb: bytes.len() as f64 / (1024.0 * 1024.0),
            });
        }

        tracing::info!(filename, size = bytes.len(), "transcribing audio file");

        let file_part = reqwest::blocking::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| TranscribeError::Http(e.to_string()))?;

        let form = reqwest::blocking::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("language", language.to_string())
            .text("response_format", "text");

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .map_err(|e| TranscribeError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| TranscribeError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(TranscribeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body.trim().to_string())
    }
}
