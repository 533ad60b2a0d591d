//! Guardrail stage: verify the input really is a customer-service
//! conversation before spending analysis tokens on it.

use serde::Deserialize;

use super::prompts::GUARDRAIL_SYSTEM_PROMPT;
use super::transcript::format_transcript;
use crate::llm::{ChatModel, LlmError};
use crate::models::Conversation;

/// Verdict of the guardrail check.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardrailOutcome {
    Pass,
    Reject { reason: String },
}

#[derive(Debug, Deserialize)]
struct GuardrailResponse {
    is_cs_conversation: bool,
    #[serde(default)]
    reason: Option<String>,
}

pub struct GuardrailStage<C> {
    llm: C,
}

impl<C: ChatModel> GuardrailStage<C> {
    pub fn new(llm: C) -> Self {
        Self { llm }
    }

    /// Classify the conversation. Transport and parse errors surface to
    /// the caller, which decides whether to fail open.
    pub fn check(&self, conversation: &Conversation) -> Result<GuardrailOutcome, LlmError> {
        if conversation.turns.is_empty() {
            return Ok(GuardrailOutcome::Reject {
                reason: "대화 내용이 없습니다".to_string(),
            });
        }

        let transcript = format_transcript(conversation);
        let user_prompt = format!("다음 텍스트를 판별해주세요:\n\n{transcript}");
        let value = self.llm.complete_json(GUARDRAIL_SYSTEM_PROMPT, &user_prompt)?;
        let response: GuardrailResponse = serde_json::from_value(value)
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        if response.is_cs_conversation {
            Ok(GuardrailOutcome::Pass)
        } else {
            let reason = response
                .reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| "상담 대화가 아닙니다".to_string());
            tracing::info!(%reason, "guardrail rejected input");
            Ok(GuardrailOutcome::Reject { reason })
        }
    }
}
