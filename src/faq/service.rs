//! FAQ document lifecycle: upload, list, toggle, update, delete, search.

use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use super::chunker::chunk_text;
use super::extract::{decode_text, fetch_url_content, supported_extension};
use super::FaqError;
use crate::db::repository::{
    delete_faq_document, get_faq_document, get_faq_document_content, insert_faq_document,
    list_faq_documents, set_faq_document_active, update_faq_document_content, NewFaqDocument,
};
use crate::llm::embeddings::EmbeddingClient;
use crate::models::{FaqDocument, FaqSearchResult, FaqUploadReceipt};
use crate::vector::{ChunkRecord, VectorStore};

pub struct FaqService<'a, E, V> {
    conn: &'a Connection,
    embedder: E,
    store: V,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl<'a, E, V> FaqService<'a, E, V>
where
    E: EmbeddingClient,
    V: VectorStore,
{
    pub fn new(
        conn: &'a Connection,
        embedder: E,
        store: V,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        Self {
            conn,
            embedder,
            store,
            chunk_size,
            chunk_overlap,
        }
    }

    /// Ingest raw text as a FAQ document: store the document row, chunk
    /// the text, embed the chunks, and index them. If embedding or
    /// indexing fails the document row is rolled back.
    pub fn upload_text(
        &self,
        content: &str,
        filename: Option<&str>,
        url: Option<&str>,
        file_type: &str,
    ) -> Result<FaqUploadReceipt, FaqError> {
        if content.trim().is_empty() {
            return Err(FaqError::EmptyContent);
        }

        let document = insert_faq_document(
            self.conn,
            &NewFaqDocument {
                filename,
                url,
                file_type,
                file_size_bytes: content.len() as i64,
                content: Some(content),
            },
        )?;

        match self.index_document(&document, content) {
            Ok(chunks_created) => {
                tracing::info!(
                    document_id = %document.id,
                    chunks_created,
                    "FAQ document uploaded"
                );
                let message = format!("FAQ 문서가 업로드되었습니다 ({chunks_created}개 청크 생성)");
                Ok(FaqUploadReceipt {
                    document,
                    chunks_created,
                    message,
                })
            }
            Err(e) => {
                // keep document and index consistent
                if let Err(cleanup) = delete_faq_document(self.conn, &document.id) {
                    tracing::error!(
                        document_id = %document.id,
                        error = %cleanup,
                        "failed to roll back document after indexing error"
                    );
                }
                Err(e)
            }
        }
    }

    /// Ingest an uploaded file. Only plain-text formats are accepted;
    /// bytes are decoded as UTF-8 with a Latin-1 fallback.
    pub fn upload_file(&self, bytes: &[u8], filename: &str) -> Result<FaqUploadReceipt, FaqError> {
        let file_type = supported_extension(filename)?;
        let content = decode_text(bytes)?;
        self.upload_text(&content, Some(filename), None, &file_type)
    }

    /// Fetch a public URL and ingest its visible text.
    pub fn upload_from_url(&self, url: &str) -> Result<FaqUploadReceipt, FaqError> {
        let content = fetch_url_content(url)?;
        self.upload_text(&content, None, Some(url), "url")
    }

    fn index_document(&self, document: &FaqDocument, content: &str) -> Result<usize, FaqError> {
        let chunks = chunk_text(content, self.chunk_size, self.chunk_overlap);
        if chunks.is_empty() {
            return Err(FaqError::EmptyContent);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedder.embed(&texts)?;

        let now = Utc::now();
        let records: Vec<ChunkRecord> = chunks
            .iter()
            .enumerate()
            .map(|(i, c)| ChunkRecord {
                id: Uuid::new_v4(),
                document_id: document.id,
                chunk_index: i,
                content: c.content.clone(),
                filename: document.filename.clone(),
                token_count: Some(c.token_count),
                // re-indexing must not resurrect a deactivated document
                is_active: document.is_active,
                created_at: now,
            })
            .collect();

        self.store.add_chunks(&records, &embeddings)?;
        Ok(records.len())
    }

    pub fn list(&self, include_inactive: bool, limit: usize) -> Result<Vec<FaqDocument>, FaqError> {
        Ok(list_faq_documents(self.conn, include_inactive, limit)?)
    }

    pub fn get(&self, id: &Uuid) -> Result<FaqDocument, FaqError> {
        get_faq_document(self.conn, id)?.ok_or(FaqError::DocumentNotFound { id: *id })
    }

    /// Delete a document and its index entries.
    pub fn delete(&self, id: &Uuid) -> Result<(), FaqError> {
        let removed_chunks = self.store.delete_by_document(id)?;
        let removed = delete_faq_document(self.conn, id)?;
        if !removed {
            return Err(FaqError::DocumentNotFound { id: *id });
        }
        tracing::info!(document_id = %id, removed_chunks, "FAQ document deleted");
        Ok(())
    }

    /// Toggle a document in and out of retrieval without deleting it.
    pub fn set_active(&self, id: &Uuid, active: bool) -> Result<(), FaqError> {
        let updated = set_faq_document_active(self.conn, id, active)?;
        if !updated {
            return Err(FaqError::DocumentNotFound { id: *id });
        }
        self.store.set_document_active(id, active)?;
        Ok(())
    }

    /// Replace a document's content and rebuild its index entries.
    pub fn update_content(&self, id: &Uuid, content: &str) -> Result<usize, FaqError> {
        if content.trim().is_empty() {
            return Err(FaqError::EmptyContent);
        }
        let document = self.get(id)?;
        let previous = get_faq_document_content(self.conn, id)?;

        self.store.delete_by_document(id)?;
        if !update_faq_document_content(self.conn, id, content, content.len() as i64)? {
            return Err(FaqError::DocumentNotFound { id: *id });
        }

        match self.index_document(&document, content) {
            Ok(chunks_created) => Ok(chunks_created),
            Err(e) => {
                // restore the previous content so the row matches the index
                if let Some(previous) = previous {
                    let size = previous.len() as i64;
                    if let Err(cleanup) = update_faq_document_content(self.conn, id, &previous, size) {
                        tracing::error!(
                            document_id = %id,
                            error = %cleanup,
                            "failed to restore content after re-index error"
                        );
                    }
                }
                Err(e)
            }
        }
    }

    pub fn search(
        &self,
        query: &str,
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<FaqSearchResult>, FaqError> {
        search_chunks(&self.embedder, &self.store, query, top_k, threshold)
    }
}

/// Embed a query and return chunks scoring at or above `threshold`,
/// best first. Shared between the FAQ admin surface and the analysis
/// pipeline's retrieval stage.
pub fn search_chunks<E, V>(
    embedder: &E,
    store: &V,
    query: &str,
    top_k: usize,
    threshold: f32,
) -> Result<Vec<FaqSearchResult>, FaqError>
where
    E: EmbeddingClient + ?Sized,
    V: VectorStore + ?Sized,
{
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }

    let query_embedding = embedder.embed_one(query)?;
    let hits = store.search(&query_embedding, top_k, true)?;

    let results: Vec<FaqSearchResult> = hits
        .into_iter()
        .filter(|hit| hit.score >= threshold)
        .map(|hit| FaqSearchResult {
            chunk_id: Some(hit.chunk.id),
            document_id: Some(hit.chunk.document_id),
            content: hit.chunk.content,
            similarity_score: hit.score,
            filename: hit.chunk.filename,
            token_count: hit.chunk.token_count,
        })
        .collect();

    tracing::debug!(results = results.len(), threshold, "FAQ search completed");
    Ok(results)
}
