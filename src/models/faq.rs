use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Embedding width produced by text-embedding-3-small.
pub const EMBEDDING_DIMENSIONS: usize = 1536;

/// A FAQ source document (TXT upload, raw text, or URL ingestion).
///
/// One document owns many chunks; chunk rows live in the vector store and
/// are deleted explicitly alongside the document, not by cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqDocument {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub file_type: String,
    pub file_size_bytes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_preview: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

/// A single hit from FAQ similarity search. Transient, produced per query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqSearchResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Uuid>,
    pub content: String,
    /// Normalized similarity in [0, 1], cosine-based.
    pub similarity_score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<usize>,
}

/// Ordered FAQ search results for one query, formatted for LLM prompts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaqContext {
    pub results: Vec<FaqSearchResult>,
}

impl FaqContext {
    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }

    /// Format results as a context block for the analysis prompt.
    /// Empty string when there are no results.
    pub fn to_prompt_context(&self) -> String {
        if self.results.is_empty() {
            return String::new();
        }

        let mut lines = vec!["## 참고 FAQ 정보".to_string(), String::new()];
        for (i, result) in self.results.iter().enumerate() {
            let source = result.filename.as_deref().unwrap_or("알 수 없음");
            lines.push(format!("### FAQ #{} (출처: {})", i + 1, source));
            lines.push(result.content.clone());
            lines.push(String::new());
        }
        lines.join("\n")
    }
}

/// Returned after a successful FAQ upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqUploadReceipt {
    pub document: FaqDocument,
    pub chunks_created: usize,
    pub message: String,
}
