//! Retrieval stage: pull FAQ chunks relevant to what the customer is
//! asking about.

use crate::faq::{search_chunks, FaqError};
use crate::llm::embeddings::EmbeddingClient;
use crate::models::{Conversation, FaqContext};
use crate::vector::VectorStore;

/// Customer messages considered when building the retrieval query.
const QUERY_MESSAGE_WINDOW: usize = 3;

pub struct RetrievalStage<E, V> {
    embedder: E,
    store: V,
    top_k: usize,
    threshold: f32,
}

impl<E, V> RetrievalStage<E, V>
where
    E: EmbeddingClient,
    V: VectorStore,
{
    pub fn new(embedder: E, store: V, top_k: usize, threshold: f32) -> Self {
        Self {
            embedder,
            store,
            top_k,
            threshold,
        }
    }

    /// Search the FAQ index with the customer's recent messages. Returns
    /// `None` when there is nothing to search with or nothing relevant
    /// enough; errors are left for the caller to treat as recoverable.
    pub fn retrieve(&self, conversation: &Conversation) -> Result<Option<FaqContext>, FaqError> {
        let query = match build_query(conversation) {
            Some(q) => q,
            None => {
                tracing::debug!("no customer messages, skipping retrieval");
                return Ok(None);
            }
        };

        let results = search_chunks(&self.embedder, &self.store, &query, self.top_k, self.threshold)?;
        if results.is_empty() {
            tracing::debug!("no FAQ chunks above threshold");
            return Ok(None);
        }

        tracing::info!(hits = results.len(), "retrieved FAQ context");
        Ok(Some(FaqContext { results }))
    }
}

/// The last few customer messages joined into one query string.
fn build_query(conversation: &Conversation) -> Option<String> {
    let messages = conversation.customer_messages();
    if messages.is_empty() {
        return None;
    }
    let start = messages.len().saturating_sub(QUERY_MESSAGE_WINDOW);
    Some(messages[start..].join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use crate::models::{Speaker, Turn};
    use crate::vector::{ChunkRecord, ScoredHit, VectorStoreError};
    use chrono::Utc;
    use uuid::Uuid;

    struct FixedEmbedder;

    impl EmbeddingClient for FixedEmbedder {
        fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, LlmError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    /// Store returning preset scores regardless of the query.
    struct ScoreStore(Vec<f32>);

    impl VectorStore for ScoreStore {
        fn add_chunks(
            &self,
            _chunks: &[ChunkRecord],
            _embeddings: &[Vec<f32>],
        ) -> Result<Vec<Uuid>, VectorStoreError> {
            Ok(Vec::new())
        }

        fn search(
            &self,
            _query: &[f32],
            top_k: usize,
            _active_only: bool,
        ) -> Result<Vec<ScoredHit>, VectorStoreError> {
            Ok(self
                .0
                .iter()
                .take(top_k)
                .enumerate()
                .map(|(i, &score)| ScoredHit {
                    chunk: ChunkRecord {
                        id: Uuid::new_v4(),
                        document_id: Uuid::new_v4(),
                        chunk_index: i,
                        content: format!("청크 {i}"),
                        filename: Some("faq.txt".to_string()),
                        token_count: Some(2),
                        is_active: true,
                        created_at: Utc::now(),
                    },
                    score,
                })
                .collect())
        }

        fn delete_by_document(&self, _id: &Uuid) -> Result<usize, VectorStoreError> {
            Ok(0)
        }

        fn set_document_active(&self, _id: &Uuid, _active: bool) -> Result<usize, VectorStoreError> {
            Ok(0)
        }
    }

    fn customer_says(messages: &[&str]) -> Conversation {
        Conversation::new(
            messages
                .iter()
                .map(|m| Turn::new(Speaker::Customer, *m))
                .collect(),
        )
    }

    #[test]
    fn query_uses_last_three_customer_messages() {
        let conv = customer_says(&["첫째", "둘째", "셋째", "넷째", "다섯째"]);
        assert_eq!(build_query(&conv).unwrap(), "셋째 넷째 다섯째");
    }

    #[test]
    fn agent_only_conversation_skips_retrieval() {
        let conv = Conversation::new(vec![Turn::new(Speaker::Agent, "안내드립니다")]);
        let stage = RetrievalStage::new(FixedEmbedder, ScoreStore(vec![0.9]), 5, 0.6);
        assert!(stage.retrieve(&conv).unwrap().is_none());
    }

    #[test]
    fn threshold_filters_weak_matches() {
        let stage = RetrievalStage::new(FixedEmbedder, ScoreStore(vec![0.9, 0.5]), 5, 0.8);
        let context = stage
            .retrieve(&customer_says(&["배송 문의"]))
            .unwrap()
            .unwrap();
        assert_eq!(context.results.len(), 1);
        assert!(context.results[0].similarity_score >= 0.8);
    }

    #[test]
    fn all_below_threshold_yields_none() {
        let stage = RetrievalStage::new(FixedEmbedder, ScoreStore(vec![0.3, 0.2]), 5, 0.6);
        assert!(stage.retrieve(&customer_says(&["배송 문의"])).unwrap().is_none());
    }
}
