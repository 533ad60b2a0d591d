//! Vector similarity search over FAQ chunks.
//!
//! Embeddings are stored alongside chunk text and compared with cosine
//! similarity at query time. The store is small enough (hundreds to low
//! thousands of chunks) that a full scan per query is the right trade.

pub mod sqlite_store;

pub use sqlite_store::SqliteVectorStore;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("embedding count mismatch: {chunks} chunks, {embeddings} embeddings")]
    CountMismatch { chunks: usize, embeddings: usize },

    #[error("corrupt embedding blob for chunk {chunk_id}")]
    CorruptEmbedding { chunk_id: Uuid },
}

/// A chunk of FAQ content as stored in the vector index.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub id: Uuid,
    pub document_id: Uuid,
    pub chunk_index: usize,
    pub content: String,
    pub filename: Option<String>,
    pub token_count: Option<usize>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A chunk paired with its similarity score for a query.
#[derive(Debug, Clone)]
pub struct ScoredHit {
    pub chunk: ChunkRecord,
    pub score: f32,
}

/// Storage and similarity search for embedded chunks.
pub trait VectorStore {
    /// Persist chunks with their embeddings. All-or-nothing: on error no
    /// chunk is stored. Returns the stored chunk ids in input order.
    fn add_chunks(
        &self,
        chunks: &[ChunkRecord],
        embeddings: &[Vec<f32>],
    ) -> Result<Vec<Uuid>, VectorStoreError>;

    /// Rank all (optionally only active) chunks against the query
    /// embedding and return the top `top_k` by similarity, descending.
    fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        active_only: bool,
    ) -> Result<Vec<ScoredHit>, VectorStoreError>;

    /// Remove every chunk belonging to a document. Returns removed count.
    fn delete_by_document(&self, document_id: &Uuid) -> Result<usize, VectorStoreError>;

    /// Flip the active flag on a document's chunks. Returns affected count.
    fn set_document_active(&self, document_id: &Uuid, active: bool)
        -> Result<usize, VectorStoreError>;
}

impl<V: VectorStore + ?Sized> VectorStore for &V {
    fn add_chunks(
        &self,
        chunks: &[ChunkRecord],
        embeddings: &[Vec<f32>],
    ) -> Result<Vec<Uuid>, VectorStoreError> {
        (**self).add_chunks(chunks, embeddings)
    }

    fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        active_only: bool,
    ) -> Result<Vec<ScoredHit>, VectorStoreError> {
        (**self).search(query_embedding, top_k, active_only)
    }

    fn delete_by_document(&self, document_id: &Uuid) -> Result<usize, VectorStoreError> {
        (**self).delete_by_document(document_id)
    }

    fn set_document_active(
        &self,
        document_id: &Uuid,
        active: bool,
    ) -> Result<usize, VectorStoreError> {
        (**self).set_document_active(document_id, active)
    }
}

/// Cosine similarity clamped to `[0, 1]`. Returns 0 for mismatched
/// dimensions or zero-magnitude vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}
