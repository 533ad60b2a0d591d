//! FAQ knowledge base: ingestion, chunking, embedding, and search.

pub mod chunker;
pub mod extract;
pub mod service;

pub use service::{search_chunks, FaqService};

use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::llm::LlmError;
use crate::vector::VectorStoreError;

#[derive(Error, Debug)]
pub enum FaqError {
    #[error("지원하지 않는 파일 형식입니다: {extension}")]
    UnsupportedFileType { extension: String },

    #[error("문서 내용이 비어있습니다")]
    EmptyContent,

    #[error("파일 텍스트를 읽을 수 없습니다")]
    Decode,

    #[error("허용되지 않는 URL입니다: {reason}")]
    UrlBlocked { reason: String },

    #[error("URL 콘텐츠를 가져오지 못했습니다: {0}")]
    UrlFetch(String),

    #[error("콘텐츠가 너무 큽니다: {size} bytes (최대 {max} bytes)")]
    ContentTooLarge { size: usize, max: usize },

    #[error("FAQ 문서를 찾을 수 없습니다: {id}")]
    DocumentNotFound { id: Uuid },

    #[error(transparent)]
    Embedding(#[from] LlmError),

    #[error(transparent)]
    VectorStore(#[from] VectorStoreError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for FaqError {
    fn from(e: rusqlite::Error) -> Self {
        FaqError::Database(DatabaseError::Sqlite(e))
    }
}
