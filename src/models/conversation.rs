use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a turn: the service agent or the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Agent,
    Customer,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Customer => "customer",
        }
    }

    /// Korean label used in LLM-facing transcripts.
    pub fn label_ko(&self) -> &'static str {
        match self {
            Self::Agent => "상담원",
            Self::Customer => "고객",
        }
    }
}

/// A single utterance by either party. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Turn {
    pub fn new(speaker: Speaker, message: impl Into<String>) -> Self {
        Self {
            speaker,
            message: message.into(),
            timestamp: None,
        }
    }
}

/// A complete counseling conversation between an agent and a customer.
///
/// `id` and `created_at` are assigned at persistence time. Turn order is
/// conversation chronology and is preserved throughout the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub turns: Vec<Turn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl Conversation {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self {
            id: None,
            created_at: None,
            turns,
            metadata: None,
        }
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    pub fn agent_turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(|t| t.speaker == Speaker::Agent)
    }

    pub fn customer_turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(|t| t.speaker == Speaker::Customer)
    }

    /// Customer-side messages in chronological order.
    pub fn customer_messages(&self) -> Vec<&str> {
        self.customer_turns().map(|t| t.message.as_str()).collect()
    }
}
