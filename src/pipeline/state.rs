use crate::models::{Conversation, FaqContext};

/// Shared state threaded through the pipeline stages. Each stage reads
/// what earlier stages wrote and fills in its own field; the analysis
/// result is the pipeline's return value rather than state.
#[derive(Debug)]
pub struct GraphState {
    pub conversation: Conversation,
    /// Set when retrieval should be skipped (FAQ disabled or nothing to
    /// search with).
    pub skip_retrieval: bool,
    pub faq_context: Option<FaqContext>,
}

impl GraphState {
    pub fn new(conversation: Conversation) -> Self {
        Self {
            conversation,
            skip_retrieval: false,
            faq_context: None,
        }
    }
}
