//! SQLite-backed vector store.
//!
//! Embeddings are serialized as little-endian f32 blobs in the
//! `faq_chunks` table. Search loads candidate rows and ranks them in
//! process with cosine similarity.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{cosine_similarity, ChunkRecord, ScoredHit, VectorStore, VectorStoreError};

pub struct SqliteVectorStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteVectorStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn vec_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

fn blob_to_vec(blob: &[u8], chunk_id: Uuid) -> Result<Vec<f32>, VectorStoreError> {
    if blob.len() % 4 != 0 {
        return Err(VectorStoreError::CorruptEmbedding { chunk_id });
    }
    Ok(blob
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

impl VectorStore for SqliteVectorStore<'_> {
    fn add_chunks(
        &self,
        chunks: &[ChunkRecord],
        embeddings: &[Vec<f32>],
    ) -> Result<Vec<Uuid>, VectorStoreError> {
        if chunks.len() != embeddings.len() {
            return Err(VectorStoreError::CountMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO faq_chunks
                 (id, document_id, chunk_index, content, filename, token_count, is_active, embedding, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
                stmt.execute(params![
                    chunk.id.to_string(),
                    chunk.document_id.to_string(),
                    chunk.chunk_index as i64,
                    chunk.content,
                    chunk.filename,
                    chunk.token_count.map(|n| n as i64),
                    chunk.is_active,
                    vec_to_blob(embedding),
                    chunk.created_at.to_rfc3339(),
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!(count = chunks.len(), "stored chunks with embeddings");
        Ok(chunks.iter().map(|c| c.id).collect())
    }

    fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        active_only: bool,
    ) -> Result<Vec<ScoredHit>, VectorStoreError> {
        if top_k == 0 || query_embedding.is_empty() {
            return Ok(Vec::new());
        }

        let sql = if active_only {
            "SELECT id, document_id, chunk_index, content, filename, token_count, is_active, embedding, created_at
             FROM faq_chunks WHERE is_active = 1"
        } else {
            "SELECT id, document_id, chunk_index, content, filename, token_count, is_active, embedding, created_at
             FROM faq_chunks"
        };

        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let document_id: String = row.get(1)?;
            let chunk_index: i64 = row.get(2)?;
            let content: String = row.get(3)?;
            let filename: Option<String> = row.get(4)?;
            let token_count: Option<i64> = row.get(5)?;
            let is_active: bool = row.get(6)?;
            let embedding: Vec<u8> = row.get(7)?;
            let created_at: String = row.get(8)?;
            Ok((
                id,
                document_id,
                chunk_index,
                content,
                filename,
                token_count,
                is_active,
                embedding,
                created_at,
            ))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (id, document_id, chunk_index, content, filename, token_count, is_active, blob, created_at) =
                row?;
            let chunk_id = Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::nil());
            let embedding = blob_to_vec(&blob, chunk_id)?;
            let score = cosine_similarity(query_embedding, &embedding);
            hits.push(ScoredHit {
                chunk: ChunkRecord {
                    id: chunk_id,
                    document_id: Uuid::parse_str(&document_id).unwrap_or_else(|_| Uuid::nil()),
                    chunk_index: chunk_index as usize,
                    content,
                    filename,
                    token_count: token_count.map(|n| n as usize),
                    is_active,
                    created_at: created_at
                        .parse::<DateTime<Utc>>()
                        .unwrap_or_else(|_| Utc::now()),
                },
                score,
            });
        }

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        Ok(hits)
    }

    fn delete_by_document(&self, document_id: &Uuid) -> Result<usize, VectorStoreError> {
        let deleted = self.conn.execute(
            "DELETE FROM faq_chunks WHERE document_id = ?1",
            params![document_id.to_string()],
        )?;
        tracing::debug!(%document_id, deleted, "deleted document chunks");
        Ok(deleted)
    }

    fn set_document_active(
        &self,
        document_id: &Uuid,
        active: bool,
    ) -> Result<usize, VectorStoreError> {
        let updated = self.conn.execute(
            "UPDATE faq_chunks SET is_active = ?1 WHERE document_id = ?2",
            params![active, document_id.to_string()],
        )?;
        Ok(updated)
    }
}
