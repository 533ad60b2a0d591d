//! Analysis stage: score the conversation on the six coaching
//! dimensions and collect structured feedback.

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use super::prompts::{analysis_user_prompt, ANALYSIS_SYSTEM_PROMPT, ANALYSIS_WITH_FAQ_SYSTEM_PROMPT};
use super::transcript::format_transcript;
use crate::llm::{ChatModel, LlmError};
use crate::models::{
    AnalysisResult, Conversation, FaqAccuracy, FaqContext, Improvement, ScoreOutOfRange,
    ScoresWithEvidence,
};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    InvalidScore(#[from] ScoreOutOfRange),
}

/// JSON shape the analysis model is asked to produce. The total score
/// is always recomputed locally rather than trusted from the model.
#[derive(Debug, Deserialize)]
struct LlmAnalysisResponse {
    scores_with_evidence: ScoresWithEvidence,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    improvements: Vec<Improvement>,
    #[serde(default)]
    overall_feedback: String,
    #[serde(default)]
    faq_accuracy: Option<RawFaqAccuracy>,
    #[serde(default)]
    is_resolved: Option<bool>,
    #[serde(default)]
    csat_score: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct RawFaqAccuracy {
    #[serde(default)]
    correct_info: Vec<String>,
    #[serde(default)]
    incorrect_info: Vec<String>,
    #[serde(default)]
    missing_info: Vec<String>,
}

pub struct AnalysisStage<C> {
    llm: C,
}

impl<C: ChatModel> AnalysisStage<C> {
    pub fn new(llm: C) -> Self {
        Self { llm }
    }

    /// Run the scoring model over the conversation, with FAQ context
    /// injected when retrieval produced one.
    pub fn analyze(
        &self,
        conversation: &Conversation,
        faq_context: Option<&FaqContext>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let transcript = format_transcript(conversation);
        let has_faq = faq_context.map(FaqContext::has_results).unwrap_or(false);

        let system = if has_faq {
            ANALYSIS_WITH_FAQ_SYSTEM_PROMPT
        } else {
            ANALYSIS_SYSTEM_PROMPT
        };
        let context_text = if has_faq {
            faq_context.map(|c| c.to_prompt_context())
        } else {
            None
        };
        let user = analysis_user_prompt(&transcript, context_text.as_deref());

        let value = self.llm.complete_json(system, &user)?;
        let response: LlmAnalysisResponse = serde_json::from_value(value)
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        let scores = response.scores_with_evidence.to_scores();
        scores.validate()?;
        let total_score = scores.total_score();

        let faq_accuracy = if has_faq {
            let raw = response.faq_accuracy.unwrap_or(RawFaqAccuracy {
                correct_info: Vec::new(),
                incorrect_info: Vec::new(),
                missing_info: Vec::new(),
            });
            Some(FaqAccuracy {
                has_faq_context: true,
                correct_info: raw.correct_info,
                incorrect_info: raw.incorrect_info,
                missing_info: raw.missing_info,
            })
        } else {
            None
        };

        let csat_score = response.csat_score.filter(|s| (1..=5).contains(s));
        if csat_score != response.csat_score {
            tracing::warn!(value = ?response.csat_score, "dropping out-of-range csat_score");
        }

        tracing::info!(total_score, has_faq, "analysis completed");

        Ok(AnalysisResult {
            request_id: Uuid::new_v4(),
            conversation_id: conversation.id,
            analyzed_at: Utc::now(),
            scores,
            scores_with_evidence: response.scores_with_evidence,
            total_score,
            strengths: response.strengths,
            improvements: response.improvements,
            overall_feedback: response.overall_feedback,
            faq_accuracy,
            is_resolved: response.is_resolved,
            csat_score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FaqSearchResult, Speaker, Turn};

    struct MockChat(serde_json::Value);

    impl ChatModel for MockChat {
        fn complete_json(&self, _system: &str, _user: &str) -> Result<serde_json::Value, LlmError> {
            Ok(self.0.clone())
        }
    }

    fn sample_conversation() -> Conversation {
        Conversation::new(vec![
            Turn::new(Speaker::Customer, "배송이 안 와요"),
            Turn::new(Speaker::Agent, "확인 후 다시 안내드리겠습니다"),
        ])
    }

    fn score_block(score: u8) -> serde_json::Value {
        serde_json::json!({"score": score, "evidence": "근거 발화"})
    }

    fn full_response(score: u8) -> serde_json::Value {
        serde_json::json!({
            "scores_with_evidence": {
                "clarification": score_block(score),
                "empathy_tone": score_block(score),
                "solution_accuracy": score_block(score),
                "actionability": score_block(score),
                "confirmation_closure": score_block(score),
                "compliance_safety": score_block(score)
            },
            "strengths": ["경청 태도"],
            "improvements": [{
                "issue": "마무리 확인 부재",
                "original_excerpt": "확인 후 다시 안내드리겠습니다",
                "suggested_rewrite": "확인 후 오늘 중으로 회신드리겠습니다. 더 도와드릴 것이 있을까요?",
                "reason": "구체적인 회신 시점과 마무리 확인이 없음"
            }],
            "overall_feedback": "전반적으로 양호하나 마무리가 약합니다.",
            "is_resolved": false,
            "csat_score": 3
        })
    }

    fn faq_context() -> FaqContext {
        FaqContext {
            results: vec![FaqSearchResult {
                chunk_id: None,
                document_id: None,
                content: "배송은 평일 기준 1~2일 소요".to_string(),
                similarity_score: 0.9,
                filename: Some("faq.txt".to_string()),
                token_count: Some(5),
            }],
        }
    }

    #[test]
    fn total_score_is_recomputed_locally() {
        let mut response = full_response(7);
        // a model-supplied total must be ignored
        response["total_score"] = serde_json::json!(1);
        let stage = AnalysisStage::new(MockChat(response));
        let result = stage.analyze(&sample_conversation(), None).unwrap();
        // 42/60 -> 70
        assert_eq!(result.total_score, 70);
        assert_eq!(result.scores.raw_sum(), 42);
    }

    #[test]
    fn out_of_range_score_is_rejected() {
        let stage = AnalysisStage::new(MockChat(full_response(11)));
        let result = stage.analyze(&sample_conversation(), None);
        assert!(matches!(result, Err(AnalysisError::InvalidScore(_))));
    }

    #[test]
    fn faq_accuracy_absent_without_context() {
        let stage = AnalysisStage::new(MockChat(full_response(8)));
        let result = stage.analyze(&sample_conversation(), None).unwrap();
        assert!(result.faq_accuracy.is_none());
    }

    #[test]
    fn faq_accuracy_present_with_context_even_if_model_omits_it() {
        let stage = AnalysisStage::new(MockChat(full_response(8)));
        let context = faq_context();
        let result = stage.analyze(&sample_conversation(), Some(&context)).unwrap();
        let accuracy = result.faq_accuracy.unwrap();
        assert!(accuracy.has_faq_context);
        assert!(accuracy.correct_info.is_empty());
    }

    #[test]
    fn out_of_range_csat_is_dropped() {
        let mut response = full_response(6);
        response["csat_score"] = serde_json::json!(9);
        let stage = AnalysisStage::new(MockChat(response));
        let result = stage.analyze(&sample_conversation(), None).unwrap();
        assert!(result.csat_score.is_none());
    }

    #[test]
    fn conversation_id_is_carried_over() {
        let mut conv = sample_conversation();
        let id = Uuid::new_v4();
        conv.id = Some(id);
        let stage = AnalysisStage::new(MockChat(full_response(5)));
        let result = stage.analyze(&conv, None).unwrap();
        assert_eq!(result.conversation_id, Some(id));
    }
}
