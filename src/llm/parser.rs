use serde::Deserialize;
use thiserror::Error;

use super::{ChatModel, LlmError};
use crate::models::{Conversation, Speaker, Turn};

/// Maximum input text length (~25K tokens)
pub const MAX_INPUT_CHARS: usize = 100_000;

const PARSER_SYSTEM_PROMPT: &str = r#"당신은 상담 대화 분석 전문가입니다.

주어진 텍스트에서 상담원(agent)과 고객(customer) 간의 대화를 추출해주세요.

규칙:
1. 각 메시지의 화자를 정확히 구분하세요 (agent 또는 customer)
2. 상담원/상담사/CS담당자/Agent = "agent"
3. 고객/손님/구매자/Customer = "customer"
4. 대화 순서를 유지하세요
5. 메시지 내용은 원문 그대로 유지하세요
6. 인사말, 문의 내용, 답변 등 모든 발화를 포함하세요

텍스트가 명시적인 대화 형식이 아니더라도 대화 내용을 추출해주세요.

반드시 아래 형식의 JSON만 출력하세요:
{"messages": [{"role": "agent" | "customer", "content": "메시지 내용"}, ...]}"#;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("입력 텍스트가 비어있습니다")]
    EmptyInput,

    #[error("입력 텍스트가 너무 깁니다. 최대 {MAX_INPUT_CHARS}자까지 지원됩니다 (현재 {length}자)")]
    InputTooLong { length: usize },

    #[error("대화 메시지를 추출하지 못했습니다")]
    NoMessages,

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Structured-output schema for the parser model.
#[derive(Debug, Deserialize)]
struct ParsedConversation {
    messages: Vec<ParsedMessage>,
}

#[derive(Debug, Deserialize)]
struct ParsedMessage {
    role: Speaker,
    content: String,
}

/// Parse raw text into a [`Conversation`] using an LLM with structured
/// output. Accepts explicit dialogue, narrative descriptions, and
/// transcripts; input is validated before any model call.
pub fn parse_conversation(llm: &dyn ChatModel, raw_content: &str) -> Result<Conversation, ParseError> {
    if raw_content.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let length = raw_content.chars().count();
    if length > MAX_INPUT_CHARS {
        return Err(ParseError::InputTooLong { length });
    }

    tracing::info!("parsing conversation with LLM");

    let user_prompt = format!("다음 텍스트에서 대화를 추출해주세요:\n\n{raw_content}");
    let value = llm.complete_json(PARSER_SYSTEM_PROMPT, &user_prompt)?;

    let parsed: ParsedConversation = serde_json::from_value(value)
        .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

    if parsed.messages.is_empty() {
        return Err(ParseError::NoMessages);
    }

    tracing::debug!(messages = parsed.messages.len(), "LLM parsed messages");

    let turns = parsed
        .messages
        .into_iter()
        .map(|msg| Turn::new(msg.role, msg.content))
        .collect();

    let mut conversation = Conversation::new(turns);
    conversation.metadata = Some(
        [("parsing_method".to_string(), "llm".to_string())]
            .into_iter()
            .collect(),
    );
    Ok(conversation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Mock that returns canned JSON and counts invocations.
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

    impl ChatModel for MockChat {
        fn complete_json(&self, _system: &str, _user: &str) -> Result<serde_json::Value, LlmError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.response.clone())
        }
    }

    #[test]
    fn empty_input_fails_before_llm_call() {
        let mock = MockChat::returning(serde_json::json!({"messages": []}));
        let result = parse_conversation(&mock, "   \n  ");
        assert!(matches!(result, Err(ParseError::EmptyInput)));
        assert_eq!(mock.calls.get(), 0);
    }

    #[test]
    fn oversized_input_fails_before_llm_call() {
        let mock = MockChat::returning(serde_json::json!({"messages": []}));
        let huge = "가".repeat(MAX_INPUT_CHARS + 1);
        let result = parse_conversation(&mock, &huge);
        assert!(matches!(result, Err(ParseError::InputTooLong { .. })));
        assert_eq!(mock.calls.get(), 0);
    }

    #[test]
    fn parses_roles_and_preserves_order() {
        let mock = MockChat::returning(serde_json::json!({
            "messages": [
                {"role": "agent", "content": "안녕하세요"},
                {"role": "customer", "content": "배송이 늦어요"},
                {"role": "agent", "content": "확인해 드리겠습니다"}
            ]
        }));

        let conv = parse_conversation(&mock, "상담원: 안녕하세요\n고객: 배송이 늦어요").unwrap();
        assert_eq!(conv.turn_count(), 3);
        assert_eq!(conv.turns[0].speaker, Speaker::Agent);
        assert_eq!(conv.turns[1].speaker, Speaker::Customer);
        assert_eq!(conv.turns[1].message, "배송이 늦어요");
    }

    #[test]
    fn attaches_parsing_provenance_metadata() {
        let mock = MockChat::returning(serde_json::json!({
            "messages": [{"role": "customer", "content": "문의합니다"}]
        }));
        let conv = parse_conversation(&mock, "고객 문의").unwrap();
        assert_eq!(
            conv.metadata.unwrap().get("parsing_method").unwrap(),
            "llm"
        );
    }

    #[test]
    fn empty_extraction_is_an_error() {
        let mock = MockChat::returning(serde_json::json!({"messages": []}));
        let result = parse_conversation(&mock, "의미 있는 입력");
        assert!(matches!(result, Err(ParseError::NoMessages)));
    }

    #[test]
    fn unknown_role_is_malformed_response() {
        let mock = MockChat::returning(serde_json::json!({
            "messages": [{"role": "narrator", "content": "한때..."}]
        }));
        let result = parse_conversation(&mock, "소설 텍스트");
        assert!(matches!(result, Err(ParseError::Llm(LlmError::MalformedResponse(_)))));
    }
}
