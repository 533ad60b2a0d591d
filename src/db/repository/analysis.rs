use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{
    AnalysisResult, AnalysisSummary, Grade, Scores, SortBy,
};

pub fn insert_analysis(
    conn: &Connection,
    result: &AnalysisResult,
) -> Result<(), DatabaseError> {
    let scores_with_evidence = serde_json::to_string(&result.scores_with_evidence)
        .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?;
    let strengths = serde_json::to_string(&result.strengths)
        .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?;
    let improvements = serde_json::to_string(&result.improvements)
        .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?;
    let faq_accuracy = result
        .faq_accuracy
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?;

    conn.execute(
        "INSERT INTO analysis_results (
            request_id, conversation_id, analyzed_at,
            clarification_score, empathy_tone_score, solution_accuracy_score,
            actionability_score, confirmation_closure_score, compliance_safety_score,
            total_score, scores_with_evidence, strengths, improvements,
            overall_feedback, faq_accuracy, is_resolved, csat_score)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            result.request_id.to_string(),
            result.conversation_id.map(|id| id.to_string()),
            result.analyzed_at.to_rfc3339(),
            result.scores.clarification,
            result.scores.empathy_tone,
            result.scores.solution_accuracy,
            result.scores.actionability,
            result.scores.confirmation_closure,
            result.scores.compliance_safety,
            result.total_score,
            scores_with_evidence,
            strengths,
            improvements,
            result.overall_feedback,
            faq_accuracy,
            result.is_resolved.map(|b| b as i32),
            result.csat_score,
        ],
    )?;

    Ok(())
}

pub fn get_analysis(
    conn: &Connection,
    request_id: &Uuid,
) -> Result<Option<AnalysisResult>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT request_id, conversation_id, analyzed_at,
                clarification_score, empathy_tone_score, solution_accuracy_score,
                actionability_score, confirmation_closure_score, compliance_safety_score,
                total_score, scores_with_evidence, strengths, improvements,
                overall_feedback, faq_accuracy, is_resolved, csat_score
         FROM analysis_results WHERE request_id = ?1",
    )?;

    let result = stmt.query_row(params![request_id.to_string()], row_to_raw);

    match result {
        Ok(raw) => Ok(Some(raw_to_result(raw)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// List analysis summaries, newest first by default.
pub fn list_analyses(
    conn: &Connection,
    limit: usize,
    sort_by: SortBy,
) -> Result<Vec<AnalysisSummary>, DatabaseError> {
    let order = match sort_by {
        SortBy::Date => "analyzed_at DESC",
        SortBy::Score => "total_score DESC",
    };
    let sql = format!(
        "SELECT request_id, analyzed_at, total_score
         FROM analysis_results ORDER BY {order} LIMIT ?1"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit as i64], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, u8>(2)?,
        ))
    })?;

    let mut items = Vec::new();
    for row in rows {
        let (id_raw, at_raw, total_score) = row?;
        items.push(AnalysisSummary {
            request_id: Uuid::parse_str(&id_raw)
                .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?,
            analyzed_at: parse_rfc3339(&at_raw)?,
            total_score,
            grade: Grade::from_total(total_score),
        });
    }
    Ok(items)
}

pub fn delete_analysis(conn: &Connection, request_id: &Uuid) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM analysis_results WHERE request_id = ?1",
        params![request_id.to_string()],
    )?;
    Ok(deleted > 0)
}

struct RawAnalysisRow {
    request_id: String,
    conversation_id: Option<String>,
    analyzed_at: String,
    scores: [u8; 6],
    total_score: u8,
    scores_with_evidence: String,
    strengths: String,
    improvements: String,
    overall_feedback: String,
    faq_accuracy: Option<String>,
    is_resolved: Option<i32>,
    csat_score: Option<u8>,
}

fn row_to_raw(row: &Row<'_>) -> rusqlite::Result<RawAnalysisRow> {
    Ok(RawAnalysisRow {
        request_id: row.get(0)?,
        conversation_id: row.get(1)?,
        analyzed_at: row.get(2)?,
        scores: [
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
        ],
        total_score: row.get(9)?,
        scores_with_evidence: row.get(10)?,
        strengths: row.get(11)?,
        improvements: row.get(12)?,
        overall_feedback: row.get(13)?,
        faq_accuracy: row.get(14)?,
        is_resolved: row.get(15)?,
        csat_score: row.get(16)?,
    })
}

fn raw_to_result(raw: RawAnalysisRow) -> Result<AnalysisResult, DatabaseError> {
    let corrupt = |e: serde_json::Error| DatabaseError::CorruptRow(e.to_string());
    let [clarification, empathy_tone, solution_accuracy, actionability, confirmation_closure, compliance_safety] =
        raw.scores;

    Ok(AnalysisResult {
        request_id: Uuid::parse_str(&raw.request_id)
            .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?,
        conversation_id: raw
            .conversation_id
            .map(|id| Uuid::parse_str(&id))
            .transpose()
            .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?,
        analyzed_at: parse_rfc3339(&raw.analyzed_at)?,
        scores: Scores {
            clarification,
            empathy_tone,
            solution_accuracy,
            actionability,
            confirmation_closure,
            compliance_safety,
        },
        scores_with_evidence: serde_json::from_str(&raw.scores_with_evidence)
            .map_err(corrupt)?,
        total_score: raw.total_score,
        strengths: serde_json::from_str(&raw.strengths).map_err(corrupt)?,
        improvements: serde_json::from_str(&raw.improvements).map_err(corrupt)?,
        overall_feedback: raw.overall_feedback,
        faq_accuracy: raw
            .faq_accuracy
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(corrupt)?,
        is_resolved: raw.is_resolved.map(|v| v != 0),
        csat_score: raw.csat_score,
    })
}

fn parse_rfc3339(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DatabaseError::CorruptRow(e.to_string()))
}
