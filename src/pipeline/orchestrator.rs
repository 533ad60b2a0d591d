//! Pipeline orchestrator: guardrail, retrieval, analysis, persistence.
//!
//! Stage failure handling follows each stage's [`FailurePolicy`]: the
//! guardrail fails open (an unreachable classifier must not block
//! analysis), retrieval fails soft (analysis proceeds without FAQ
//! context), analysis failures are fatal.

use rusqlite::Connection;

use super::analysis::AnalysisStage;
use super::guardrail::{GuardrailOutcome, GuardrailStage};
use super::retrieval::RetrievalStage;
use super::state::GraphState;
use super::{FailurePolicy, PipelineError};
use crate::config::{Settings, ANALYSIS_TEMPERATURE, GUARDRAIL_TEMPERATURE};
use crate::db::repository::{insert_analysis, insert_conversation};
use crate::llm::embeddings::{EmbeddingClient, OpenAiEmbedder};
use crate::llm::openai::OpenAiChatClient;
use crate::llm::{ChatModel, LlmError};
use crate::models::{AnalysisResult, Conversation};
use crate::vector::{SqliteVectorStore, VectorStore};

const EMBED_MAX_RETRIES: usize = 3;

pub struct AnalysisPipeline<'a, G, A, E, V> {
    conn: &'a Connection,
    guardrail: GuardrailStage<G>,
    retrieval: RetrievalStage<E, V>,
    analysis: AnalysisStage<A>,
}

impl<'a, G, A, E, V> AnalysisPipeline<'a, G, A, E, V>
where
    G: ChatModel,
    A: ChatModel,
    E: EmbeddingClient,
    V: VectorStore,
{
    pub fn new(
        conn: &'a Connection,
        guardrail: GuardrailStage<G>,
        retrieval: RetrievalStage<E, V>,
        analysis: AnalysisStage<A>,
    ) -> Self {
        Self {
            conn,
            guardrail,
            retrieval,
            analysis,
        }
    }

    /// Run the full pipeline over a conversation. `use_faq` controls
    /// whether the retrieval stage runs at all.
    pub fn run(
        &self,
        conversation: Conversation,
        use_faq: bool,
    ) -> Result<AnalysisResult, PipelineError> {
        // persist the conversation up front so results can reference it;
        // analysis still proceeds if the write fails
        let conversation = match insert_conversation(self.conn, &conversation) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "failed to persist conversation, continuing");
                conversation
            }
        };

        let mut state = GraphState::new(conversation);
        state.skip_retrieval = !use_faq;

        match self.guardrail.check(&state.conversation) {
            Ok(GuardrailOutcome::Pass) => {}
            Ok(GuardrailOutcome::Reject { reason }) => {
                return Err(PipelineError::Rejected { reason });
            }
            Err(e) => match FailurePolicy::GUARDRAIL {
                FailurePolicy::Recoverable => {
                    tracing::warn!(error = %e, "guardrail unavailable, failing open");
                }
                FailurePolicy::Fatal => return Err(PipelineError::Guardrail(e)),
            },
        }

        if !state.skip_retrieval {
            match self.retrieval.retrieve(&state.conversation) {
                Ok(context) => state.faq_context = context,
                Err(e) => match FailurePolicy::RETRIEVAL {
                    FailurePolicy::Recoverable => {
                        tracing::warn!(error = %e, "retrieval failed, analyzing without FAQ context");
                    }
                    FailurePolicy::Fatal => return Err(PipelineError::Retrieval(e)),
                },
            }
        }

        let result = match self
            .analysis
            .analyze(&state.conversation, state.faq_context.as_ref())
        {
            Ok(result) => result,
            Err(e) => match FailurePolicy::ANALYSIS {
                // analysis has no degraded fallback to continue with
                FailurePolicy::Fatal | FailurePolicy::Recoverable => {
                    return Err(PipelineError::Analysis(e));
                }
            },
        };

        if let Err(e) = insert_analysis(self.conn, &result) {
            tracing::warn!(error = %e, request_id = %result.request_id, "failed to persist analysis result");
        }

        Ok(result)
    }
}

impl<'a>
    AnalysisPipeline<'a, OpenAiChatClient, OpenAiChatClient, OpenAiEmbedder, SqliteVectorStore<'a>>
{
    /// Wire up the production pipeline from settings: OpenAI clients
    /// per role plus the SQLite-backed vector store.
    pub fn from_settings(
        conn: &'a Connection,
        settings: &Settings,
    ) -> Result<Self, LlmError> {
        let guardrail = OpenAiChatClient::new(
            &settings.openai_base_url,
            &settings.openai_api_key,
            &settings.guardrail_model,
            GUARDRAIL_TEMPERATURE,
            settings.request_timeout_secs,
        )?;
        let analysis = OpenAiChatClient::new(
            &settings.openai_base_url,
            &settings.openai_api_key,
            &settings.chat_model,
            ANALYSIS_TEMPERATURE,
            settings.request_timeout_secs,
        )?;
        let embedder = OpenAiEmbedder::new(
            &settings.openai_base_url,
            &settings.openai_api_key,
            &settings.embedding_model,
            settings.request_timeout_secs,
            EMBED_MAX_RETRIES,
        )?;

        Ok(Self::new(
            conn,
            GuardrailStage::new(guardrail),
            RetrievalStage::new(
                embedder,
                SqliteVectorStore::new(conn),
                settings.retrieval_top_k,
                settings.similarity_threshold,
            ),
            AnalysisStage::new(analysis),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::get_analysis;
    use crate::llm::LlmError;
    use crate::vector::SqliteVectorStore;
    use crate::models::{Speaker, Turn};
    use std::cell::Cell;

    struct MockChat {
        response: serde_json::Value,
        calls: Cell<usize>,
    }

    impl MockChat {
        fn returning(response: serde_json::Value) -> Self {
            Self {
                response,
                calls: Cell::new(0),
            }
        }
    }

    impl ChatModel for &MockChat {
        fn complete_json(&self, _system: &str, _user: &str) -> Result<serde_json::Value, LlmError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.response.clone())
        }
    }

    struct FailingChat;

    impl ChatModel for FailingChat {
        fn complete_json(&self, _system: &str, _user: &str) -> Result<serde_json::Value, LlmError> {
            Err(LlmError::Http("connection refused".to_string()))
        }
    }

    struct FailingEmbedder;

    impl EmbeddingClient for FailingEmbedder {
        fn embed(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, LlmError> {
            Err(LlmError::Http("embeddings down".to_string()))
        }
    }

    struct CountingEmbedder {
        calls: Cell<usize>,
    }

    impl EmbeddingClient for &CountingEmbedder {
        fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, LlmError> {
            self.calls.set(self.calls.get() + 1);
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    fn guardrail_pass() -> serde_json::Value {
        serde_json::json!({"is_cs_conversation": true, "reason": "상담 대화"})
    }

    fn guardrail_reject() -> serde_json::Value {
        serde_json::json!({"is_cs_conversation": false, "reason": "뉴스 기사입니다"})
    }

    fn analysis_response() -> serde_json::Value {
        let block = || serde_json::json!({"score": 8, "evidence": "근거"});
        serde_json::json!({
            "scores_with_evidence": {
                "clarification": block(), "empathy_tone": block(),
                "solution_accuracy": block(), "actionability": block(),
                "confirmation_closure": block(), "compliance_safety": block()
            },
            "strengths": ["정중한 어조"],
            "improvements": [],
            "overall_feedback": "양호합니다.",
            "is_resolved": true,
            "csat_score": 4
        })
    }

    fn sample_conversation() -> Conversation {
        Conversation::new(vec![
            Turn::new(Speaker::Customer, "환불 규정이 궁금해요"),
            Turn::new(Speaker::Agent, "구매 후 7일 이내 환불 가능합니다"),
            Turn::new(Speaker::Customer, "택배비는 누가 내나요?"),
        ])
    }

    #[test]
    fn happy_path_persists_conversation_and_result() {
        let conn = open_memory_database().unwrap();
        let guard = MockChat::returning(guardrail_pass());
        let analyze = MockChat::returning(analysis_response());
        let pipeline = AnalysisPipeline::new(
            &conn,
            GuardrailStage::new(&guard),
            RetrievalStage::new(FailingEmbedder, SqliteVectorStore::new(&conn), 5, 0.6),
            AnalysisStage::new(&analyze),
        );

        let result = pipeline.run(sample_conversation(), false).unwrap();
        assert_eq!(result.total_score, 80);
        assert!(result.conversation_id.is_some());
        assert!(result.faq_accuracy.is_none());

        let stored = get_analysis(&conn, &result.request_id).unwrap().unwrap();
        assert_eq!(stored.total_score, 80);
        assert_eq!(stored.conversation_id, result.conversation_id);
    }

    #[test]
    fn guardrail_rejection_stops_before_analysis() {
        let conn = open_memory_database().unwrap();
        let guard = MockChat::returning(guardrail_reject());
        let analyze = MockChat::returning(analysis_response());
        let pipeline = AnalysisPipeline::new(
            &conn,
            GuardrailStage::new(&guard),
            RetrievalStage::new(FailingEmbedder, SqliteVectorStore::new(&conn), 5, 0.6),
            AnalysisStage::new(&analyze),
        );

        let result = pipeline.run(sample_conversation(), false);
        match result {
            Err(PipelineError::Rejected { reason }) => assert_eq!(reason, "뉴스 기사입니다"),
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(analyze.calls.get(), 0);
    }

    #[test]
    fn guardrail_outage_fails_open() {
        let conn = open_memory_database().unwrap();
        let analyze = MockChat::returning(analysis_response());
        let pipeline = AnalysisPipeline::new(
            &conn,
            GuardrailStage::new(FailingChat),
            RetrievalStage::new(FailingEmbedder, SqliteVectorStore::new(&conn), 5, 0.6),
            AnalysisStage::new(&analyze),
        );

        let result = pipeline.run(sample_conversation(), false).unwrap();
        assert_eq!(analyze.calls.get(), 1);
        assert_eq!(result.total_score, 80);
    }

    #[test]
    fn retrieval_outage_is_recoverable() {
        let conn = open_memory_database().unwrap();
        let guard = MockChat::returning(guardrail_pass());
        let analyze = MockChat::returning(analysis_response());
        let pipeline = AnalysisPipeline::new(
            &conn,
            GuardrailStage::new(&guard),
            RetrievalStage::new(FailingEmbedder, SqliteVectorStore::new(&conn), 5, 0.6),
            AnalysisStage::new(&analyze),
        );

        // use_faq = true with a broken embedder: analysis still runs
        let result = pipeline.run(sample_conversation(), true).unwrap();
        assert!(result.faq_accuracy.is_none());
        assert_eq!(analyze.calls.get(), 1);
    }

    #[test]
    fn disabled_faq_never_touches_the_embedder() {
        let conn = open_memory_database().unwrap();
        let guard = MockChat::returning(guardrail_pass());
        let analyze = MockChat::returning(analysis_response());
        let embedder = CountingEmbedder {
            calls: Cell::new(0),
        };
        let pipeline = AnalysisPipeline::new(
            &conn,
            GuardrailStage::new(&guard),
            RetrievalStage::new(&embedder, SqliteVectorStore::new(&conn), 5, 0.6),
            AnalysisStage::new(&analyze),
        );

        // conversation has customer turns, so only the flag skips retrieval
        pipeline.run(sample_conversation(), false).unwrap();
        assert_eq!(embedder.calls.get(), 0);

        pipeline.run(sample_conversation(), true).unwrap();
        assert_eq!(embedder.calls.get(), 1);
    }

    #[test]
    fn analysis_failure_is_fatal() {
        let conn = open_memory_database().unwrap();
        let guard = MockChat::returning(guardrail_pass());
        let pipeline = AnalysisPipeline::new(
            &conn,
            GuardrailStage::new(&guard),
            RetrievalStage::new(FailingEmbedder, SqliteVectorStore::new(&conn), 5, 0.6),
            AnalysisStage::new(FailingChat),
        );

        assert!(matches!(
            pipeline.run(sample_conversation(), false),
            Err(PipelineError::Analysis(_))
        ));
    }
}
