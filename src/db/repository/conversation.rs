use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Conversation;

/// Persist a conversation, assigning its identity. Returns the stored copy
/// with `id` and `created_at` filled in.
pub fn insert_conversation(
    conn: &Connection,
    conversation: &Conversation,
) -> Result<Conversation, DatabaseError> {
    let mut saved = conversation.clone();
    saved.id = Some(saved.id.unwrap_or_else(Uuid::new_v4));
    saved.created_at = Some(saved.created_at.unwrap_or_else(Utc::now));

    let turns_json = serde_json::to_string(&saved.turns)
        .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?;
    let metadata_json = saved
        .metadata
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?;

    conn.execute(
        "INSERT INTO conversations (id, created_at, turns, metadata)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            saved.id.map(|id| id.to_string()),
            saved.created_at.map(|t| t.to_rfc3339()),
            turns_json,
            metadata_json,
        ],
    )?;

    Ok(saved)
}

pub fn get_conversation(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<Conversation>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, created_at, turns, metadata FROM conversations WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        },
    );

    match result {
        Ok((id_raw, created_raw, turns_raw, metadata_raw)) => {
            let turns = serde_json::from_str(&turns_raw)
                .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?;
            let metadata = metadata_raw
                .map(|m| serde_json::from_str(&m))
                .transpose()
                .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?;
            Ok(Some(Conversation {
                id: Some(
                    Uuid::parse_str(&id_raw)
                        .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?,
                ),
                created_at: Some(
                    DateTime::parse_from_rfc3339(&created_raw)
                        .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?
                        .with_timezone(&Utc),
                ),
                turns,
                metadata,
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
