//! File-to-conversation ingestion. Text files go straight to the LLM
//! parser; audio files are transcribed first.

use std::path::Path;

use thiserror::Error;

use crate::faq::extract::decode_text;
use crate::llm::parser::{parse_conversation, ParseError};
use crate::llm::transcribe::{is_audio_file, TranscribeError, WhisperClient};
use crate::llm::ChatModel;
use crate::models::Conversation;

/// Text formats accepted for conversation upload.
pub const TEXT_FILE_TYPES: &[&str] = &["txt", "csv", "json", "md"];

/// Language hint passed to transcription for call recordings.
const TRANSCRIPTION_LANGUAGE: &str = "ko";

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("지원하지 않는 파일 형식입니다: {extension}")]
    UnsupportedFileType { extension: String },

    #[error("파일 텍스트를 읽을 수 없습니다")]
    Decode,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Transcribe(#[from] TranscribeError),
}

/// Turn an uploaded file into a structured conversation. Dispatches on
/// the file extension: text formats are parsed directly, audio formats
/// are transcribed first.
pub fn conversation_from_file(
    chat: &dyn ChatModel,
    whisper: &WhisperClient,
    bytes: Vec<u8>,
    filename: &str,
) -> Result<Conversation, IngestError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if TEXT_FILE_TYPES.contains(&extension.as_str()) {
        let text = decode_text(&bytes).map_err(|_| IngestError::Decode)?;
        return Ok(parse_conversation(chat, &text)?);
    }

    if is_audio_file(filename) {
        tracing::info!(filename, "transcribing uploaded audio before parsing");
        let transcript = whisper.transcribe(bytes, filename, TRANSCRIPTION_LANGUAGE)?;
        return Ok(parse_conversation(chat, &transcript)?);
    }

    Err(IngestError::UnsupportedFileType { extension })
}
