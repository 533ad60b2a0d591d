//! Customer-service conversation coaching.
//!
//! Analyzes support conversations with an LLM pipeline: a guardrail
//! verifies the input is a real CS conversation, FAQ retrieval pulls
//! relevant knowledge-base chunks, and a scoring stage rates the agent
//! on six coaching dimensions with evidence and rewrite suggestions.
//! Conversations, analysis results, and the FAQ knowledge base persist
//! in a local SQLite database.

pub mod config;
pub mod db;
pub mod faq;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod vector;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// default filter. Safe to call once at startup; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
