//! Conversation analysis pipeline: guardrail, FAQ retrieval, scoring.

pub mod analysis;
pub mod guardrail;
pub mod orchestrator;
pub mod prompts;
pub mod retrieval;
pub mod state;
pub mod transcript;

pub use analysis::{AnalysisError, AnalysisStage};
pub use guardrail::{GuardrailOutcome, GuardrailStage};
pub use orchestrator::AnalysisPipeline;
pub use retrieval::RetrievalStage;
pub use state::GraphState;
pub use transcript::format_transcript;

use thiserror::Error;

use crate::faq::FaqError;
use crate::llm::LlmError;

/// How the orchestrator reacts when a stage errors out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the pipeline and surface the error.
    Fatal,
    /// Log and continue with degraded output.
    Recoverable,
}

impl FailurePolicy {
    /// An unreachable classifier must not block analysis: fail open.
    pub const GUARDRAIL: FailurePolicy = FailurePolicy::Recoverable;
    /// Analysis without FAQ context is still useful: fail soft.
    pub const RETRIEVAL: FailurePolicy = FailurePolicy::Recoverable;
    /// No scores means no result.
    pub const ANALYSIS: FailurePolicy = FailurePolicy::Fatal;
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("상담 분석 불가: {reason}")]
    Rejected { reason: String },

    #[error("guardrail stage failed: {0}")]
    Guardrail(LlmError),

    #[error("retrieval stage failed: {0}")]
    Retrieval(FaqError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}
