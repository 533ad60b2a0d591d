use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::FaqDocument;

const PREVIEW_CHARS: usize = 300;

/// Fields for a new FAQ document record.
pub struct NewFaqDocument<'a> {
    pub filename: Option<&'a str>,
    pub url: Option<&'a str>,
    pub file_type: &'a str,
    pub file_size_bytes: i64,
    pub content: Option<&'a str>,
}

pub fn insert_faq_document(
    conn: &Connection,
    doc: &NewFaqDocument<'_>,
) -> Result<FaqDocument, DatabaseError> {
    let id = Uuid::new_v4();
    let created_at = Utc::now();

    conn.execute(
        "INSERT INTO faq_documents (id, filename, url, file_type, file_size_bytes,
                                    content, created_at, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1)",
        params![
            id.to_string(),
            doc.filename,
            doc.url,
            doc.file_type,
            doc.file_size_bytes,
            doc.content,
            created_at.to_rfc3339(),
        ],
    )?;

    Ok(FaqDocument {
        id,
        filename: doc.filename.map(|s| s.to_string()),
        url: doc.url.map(|s| s.to_string()),
        file_type: doc.file_type.to_string(),
        file_size_bytes: doc.file_size_bytes,
        content_preview: doc.content.map(preview),
        created_at,
        is_active: true,
    })
}

pub fn get_faq_document(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<FaqDocument>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, filename, url, file_type, file_size_bytes, content, created_at, is_active
         FROM faq_documents WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id.to_string()], row_to_document);
    match result {
        Ok(doc) => Ok(Some(doc?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Full stored content of a document (not just the preview).
pub fn get_faq_document_content(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<String>, DatabaseError> {
    let result = conn.query_row(
        "SELECT content FROM faq_documents WHERE id = ?1",
        params![id.to_string()],
        |row| row.get::<_, Option<String>>(0),
    );
    match result {
        Ok(content) => Ok(content),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_faq_documents(
    conn: &Connection,
    include_inactive: bool,
    limit: usize,
) -> Result<Vec<FaqDocument>, DatabaseError> {
    let sql = if include_inactive {
        "SELECT id, filename, url, file_type, file_size_bytes, content, created_at, is_active
         FROM faq_documents ORDER BY created_at DESC LIMIT ?1"
    } else {
        "SELECT id, filename, url, file_type, file_size_bytes, content, created_at, is_active
         FROM faq_documents WHERE is_active = 1 ORDER BY created_at DESC LIMIT ?1"
    };

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![limit as i64], row_to_document)?;

    let mut docs = Vec::new();
    for row in rows {
        docs.push(row??);
    }
    Ok(docs)
}

pub fn delete_faq_document(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM faq_documents WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(deleted > 0)
}

pub fn set_faq_document_active(
    conn: &Connection,
    id: &Uuid,
    is_active: bool,
) -> Result<bool, DatabaseError> {
    let updated = conn.execute(
        "UPDATE faq_documents SET is_active = ?1 WHERE id = ?2",
        params![is_active as i32, id.to_string()],
    )?;
    Ok(updated > 0)
}

pub fn update_faq_document_content(
    conn: &Connection,
    id: &Uuid,
    content: &str,
    file_size_bytes: i64,
) -> Result<bool, DatabaseError> {
    let updated = conn.execute(
        "UPDATE faq_documents SET content = ?1, file_size_bytes = ?2 WHERE id = ?3",
        params![content, file_size_bytes, id.to_string()],
    )?;
    Ok(updated > 0)
}

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Result<FaqDocument, DatabaseError>> {
    let id_raw: String = row.get(0)?;
    let filename: Option<String> = row.get(1)?;
    let url: Option<String> = row.get(2)?;
    let file_type: String = row.get(3)?;
    let file_size_bytes: i64 = row.get(4)?;
    let content: Option<String> = row.get(5)?;
    let created_raw: String = row.get(6)?;
    let is_active: i32 = row.get(7)?;

    Ok(build_document(
        id_raw,
        filename,
        url,
        file_type,
        file_size_bytes,
        content,
        created_raw,
        is_active != 0,
    ))
}

#[allow(clippy::too_many_arguments)]
fn build_document(
    id_raw: String,
    filename: Option<String>,
    url: Option<String>,
    file_type: String,
    file_size_bytes: i64,
    content: Option<String>,
    created_raw: String,
    is_active: bool,
) -> Result<FaqDocument, DatabaseError> {
    Ok(FaqDocument {
        id: Uuid::parse_str(&id_raw).map_err(|e| DatabaseError::CorruptRow(e.to_string()))?,
        filename,
        url,
        file_type,
        file_size_bytes,
        content_preview: content.as_deref().map(preview),
        created_at: DateTime::parse_from_rfc3339(&created_raw)
            .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?
            .with_timezone(&Utc),
        is_active,
    })
}

fn preview(content: &str) -> String {
    let truncated: String = content.chars().take(PREVIEW_CHARS).collect();
    if content.chars().count() > PREVIEW_CHARS {
        format!("{truncated}...")
    } else {
        truncated
    }
}
