use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::DatabaseError;
use crate::models::case::CaseRecord;
use crate::models::case_profile::CaseProfile;

// ═══════════════════════════════════════════
// Case Repository
// ═══════════════════════════════════════════

/// Insert or replace a case by `id`.
pub fn upsert_case(conn: &Connection, case: &CaseRecord) -> Result<(), DatabaseError> {
    if case.id.trim().is_empty() {
        return Err(DatabaseError::ConstraintViolation("case id is empty".into()));
    }
    let body = serde_json::to_string(case)?;
    conn.execute(
        "INSERT INTO cases (id, case_id, event_datetime, body, updated_at)
         VALUES (?1, ?2, ?3, ?4, datetime('now'))
         ON CONFLICT(id) DO UPDATE SET
            case_id = excluded.case_id,
            event_datetime = excluded.event_datetime,
            body = excluded.body,
            updated_at = excluded.updated_at",
        params![case.id, case.case_id, case.event_datetime, body],
    )?;
    Ok(())
}

/// Raw case bodies for one profile, newest first, undated last.
pub fn list_case_bodies(conn: &Connection, case_id: u32) -> Result<Vec<Value>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT body FROM cases WHERE case_id = ?1 ORDER BY event_datetime DESC, id",
    )?;
    let rows = stmt.query_map(params![case_id], |row| row.get::<_, String>(0))?;
    collect_bodies(rows)
}

/// Raw case bodies for every profile, newest first.
pub fn list_all_case_bodies(conn: &Connection) -> Result<Vec<Value>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT body FROM cases ORDER BY event_datetime DESC, id")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    collect_bodies(rows)
}

pub fn get_case_body(conn: &Connection, id: &str) -> Result<Option<Value>, DatabaseError> {
    let body: Option<String> = conn
        .query_row("SELECT body FROM cases WHERE id = ?1", params![id], |row| row.get(0))
        .optional()?;
    body.map(|b| serde_json::from_str(&b).map_err(DatabaseError::from))
        .transpose()
}

fn collect_bodies(
    rows: impl Iterator<Item = rusqlite::Result<String>>,
) -> Result<Vec<Value>, DatabaseError> {
    let mut out = Vec::new();
    for row in rows {
        let body = row?;
        match serde_json::from_str(&body) {
            Ok(value) => out.push(value),
            // malformed rows still reach the normalizer as an empty blob
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable case body");
                out.push(Value::Null);
            }
        }
    }
    Ok(out)
}

// ═══════════════════════════════════════════
// Profile Repository
// ═══════════════════════════════════════════

/// Insert or replace a profile. Body and `share_token` column are
/// written in one statement, so the previous token stops resolving
/// in the same write that stores the new one.
pub fn upsert_profile(conn: &Connection, profile: &CaseProfile) -> Result<(), DatabaseError> {
    let body = serde_json::to_string(profile)?;
    conn.execute(
        "INSERT INTO profiles (case_id, share_token, body, updated_at)
         VALUES (?1, ?2, ?3, datetime('now'))
         ON CONFLICT(case_id) DO UPDATE SET
            share_token = excluded.share_token,
            body = excluded.body,
            updated_at = excluded.updated_at",
        params![profile.case_id, profile.share_token, body],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation("share token already in use".into())
        }
        other => DatabaseError::Sqlite(other),
    })?;
    Ok(())
}

pub fn get_profile_body(conn: &Connection, case_id: u32) -> Result<Option<Value>, DatabaseError> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM profiles WHERE case_id = ?1",
            params![case_id],
            |row| row.get(0),
        )
        .optional()?;
    body.map(|b| serde_json::from_str(&b).map_err(DatabaseError::from))
        .transpose()
}

/// Exact lookup of the profile owning `token`.
pub fn find_case_id_by_share_token(
    conn: &Connection,
    token: &str,
) -> Result<Option<u32>, DatabaseError> {
    let case_id = conn
        .query_row(
            "SELECT case_id FROM profiles WHERE share_token = ?1",
            params![token],
            |row| row.get::<_, u32>(0),
        )
        .optional()?;
    Ok(case_id)
}
