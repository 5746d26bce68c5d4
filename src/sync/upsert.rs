//! The generic create-or-update routine shared by all five entity kinds.

use super::refs;
use super::SyncError;
use crate::event_store::RefKind;
use rusqlite::Connection;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

#[derive(Clone, Copy, Debug)]
pub struct Upserted {
    pub id: i64,
    pub outcome: UpsertOutcome,
}

/// One entity kind's write operations. Implementations carry the per-entity
/// field policy: `update` overwrites exactly the columns the feed owns for
/// that kind, which is not always every column `insert` wrote.
pub trait EntityWriter {
    const KIND: RefKind;

    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64>;
    fn update(&self, conn: &Connection, id: i64) -> rusqlite::Result<()>;
}

/// Resolve the upstream pair; update the bound row in place, or insert a
/// new row and bind it. Returns the local id either way.
pub fn upsert<W: EntityWriter>(
    conn: &Connection,
    source: &str,
    upstream_id: i64,
    payload: &W,
) -> Result<Upserted, SyncError> {
    match refs::resolve(conn, source, W::KIND, upstream_id)? {
        Some(id) => {
            payload.update(conn, id)?;
            Ok(Upserted {
                id,
                outcome: UpsertOutcome::Updated,
            })
        }
        None => {
            let id = payload.insert(conn)?;
            refs::bind(conn, source, W::KIND, upstream_id, id)?;
            Ok(Upserted {
                id,
                outcome: UpsertOutcome::Created,
            })
        }
    }
}
