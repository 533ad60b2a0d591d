use crate::models::Conversation;

/// Render a conversation as a plain-text transcript with Korean speaker
/// labels, one turn per line.
pub fn format_transcript(conversation: &Conversation) -> String {
    conversation
        .turns
        .iter()
        .map(|turn| format!("{}: {}", turn.speaker.label_ko(), turn.message))
        .collect::<Vec<_>>()
        .join("\n")
}
