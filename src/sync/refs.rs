//! External-reference resolver.
//!
//! Maps upstream (source, id) pairs to local row ids through the
//! `external_refs` table. Every upsert resolves here first; only a miss
//! leads to an insert, which is what makes repeated imports idempotent.
//! Uniqueness in both directions is enforced by the table's unique
//! indexes, so a racing duplicate surfaces as [`SyncError::Conflict`]
//! instead of silently binding twice.

use super::SyncError;
use crate::event_store::RefKind;
use rusqlite::{params, Connection};

/// Look up the local row bound to an upstream (source, id) pair.
pub fn resolve(
    conn: &Connection,
    source: &str,
    kind: RefKind,
    upstream_id: i64,
) -> Result<Option<i64>, SyncError> {
    let mut stmt = conn.prepare_cached(
        "SELECT local_id FROM external_refs WHERE source = ?1 AND kind = ?2 AND upstream_id = ?3",
    )?;
    match stmt.query_row(params![source, kind.to_db_str(), upstream_id], |r| r.get(0)) {
        Ok(local_id) => Ok(Some(local_id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Record a new upstream-to-local mapping.
///
/// A no-op when the identical mapping already exists; [`SyncError::Conflict`]
/// when the pair is bound to a different local row or the local row already
/// carries a binding for this source and kind.
pub fn bind(
    conn: &Connection,
    source: &str,
    kind: RefKind,
    upstream_id: i64,
    local_id: i64,
) -> Result<(), SyncError> {
    match resolve(conn, source, kind, upstream_id)? {
        Some(existing) if existing == local_id => return Ok(()),
        Some(_) => {
            return Err(SyncError::Conflict {
                kind,
                source_tag: source.to_string(),
                upstream_id,
            })
        }
        None => {}
    }

    let inserted = conn.execute(
        "INSERT INTO external_refs (source, kind, upstream_id, local_id) VALUES (?1, ?2, ?3, ?4)",
        params![source, kind.to_db_str(), upstream_id, local_id],
    );

    match inserted {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(SyncError::Conflict {
                kind,
                source_tag: source.to_string(),
                upstream_id,
            })
        }
        Err(e) => Err(e.into()),
    }
}
