//! SQLite-backed store for the events database.
//!
//! One write connection guarded by a mutex (all writes go through
//! `BEGIN IMMEDIATE` transactions) plus a small round-robin pool of
//! read-only connections.

use super::models::*;
use super::schema::EVENT_DB_SCHEMAS;
use crate::sqlite_persistence::migrate_to_latest;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

const READ_POOL_SIZE: usize = 2;

#[derive(Clone)]
pub struct SqliteEventStore {
    write_conn: Arc<Mutex<Connection>>,
    read_pool: Vec<Arc<Mutex<Connection>>>,
    read_index: Arc<AtomicUsize>,
}

impl SqliteEventStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open events database")?;

        migrate_to_latest(&mut write_conn, EVENT_DB_SCHEMAS)?;

        write_conn.pragma_update(None, "journal_mode", "WAL")?;
        write_conn.pragma_update(None, "foreign_keys", true)?;

        let mut read_pool = Vec::with_capacity(READ_POOL_SIZE);
        for _ in 0..READ_POOL_SIZE {
            let read_conn = Connection::open_with_flags(
                db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            read_conn.pragma_update(None, "journal_mode", "WAL")?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        let store = SqliteEventStore {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_pool,
            read_index: Arc::new(AtomicUsize::new(0)),
        };

        info!(
            "Opened events db: {} events, {} venues, {} leaders, {} time slots, {} sessions",
            store.events_count(),
            store.venues_count(),
            store.leaders_count(),
            store.time_slots_count(),
            store.sessions_count(),
        );

        Ok(store)
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    /// Run `f` inside a `BEGIN IMMEDIATE` transaction on the write
    /// connection, committing on `Ok` and rolling back on `Err`.
    pub fn with_write<T, E>(&self, f: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<rusqlite::Error>,
    {
        let conn = self.write_conn.lock().unwrap();
        conn.execute("BEGIN IMMEDIATE", []).map_err(E::from)?;

        match f(&conn) {
            Ok(value) => {
                conn.execute("COMMIT", []).map_err(E::from)?;
                Ok(value)
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    pub fn get_event(&self, id: i64) -> Result<Option<Event>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();

        let mut stmt = conn.prepare_cached(
            "SELECT id, title, slug, description, hashtag, time_zone, starts_at, ends_at, group_id
             FROM events WHERE id = ?1",
        )?;

        match stmt.query_row(params![id], |row| {
            Ok(Event {
                id: row.get(0)?,
                title: row.get(1)?,
                slug: row.get(2)?,
                description: row.get(3)?,
                hashtag: row.get(4)?,
                time_zone: row.get(5)?,
                starts_at: row.get(6)?,
                ends_at: row.get(7)?,
                group_id: row.get(8)?,
            })
        }) {
            Ok(event) => Ok(Some(event)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_venue(&self, id: i64) -> Result<Option<Venue>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();

        let mut stmt = conn.prepare_cached(
            "SELECT id, name, postal_address, latitude, longitude, location_hint, created_by
             FROM venues WHERE id = ?1",
        )?;

        match stmt.query_row(params![id], |row| {
            Ok(Venue {
                id: row.get(0)?,
                name: row.get(1)?,
                postal_address: row.get(2)?,
                latitude: row.get(3)?,
                longitude: row.get(4)?,
                location_hint: row.get(5)?,
                created_by: row.get(6)?,
            })
        }) {
            Ok(venue) => Ok(Some(venue)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_leader(&self, id: i64) -> Result<Option<Leader>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();

        let mut stmt = conn.prepare_cached(
            "SELECT id, name, bio, personal_url, handle, company, title, location, member_id
             FROM leaders WHERE id = ?1",
        )?;

        match stmt.query_row(params![id], |row| {
            Ok(Leader {
                id: row.get(0)?,
                name: row.get(1)?,
                bio: row.get(2)?,
                personal_url: row.get(3)?,
                handle: row.get(4)?,
                company: row.get(5)?,
                title: row.get(6)?,
                location: row.get(7)?,
                member_id: row.get(8)?,
            })
        }) {
            Ok(leader) => Ok(Some(leader)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_time_slot(&self, id: i64) -> Result<Option<TimeSlot>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();

        let mut stmt = conn.prepare_cached(
            "SELECT id, event_id, label, starts_at, ends_at FROM time_slots WHERE id = ?1",
        )?;

        match stmt.query_row(params![id], Self::parse_time_slot_row) {
            Ok(slot) => Ok(Some(slot)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn time_slots_for_event(&self, event_id: i64) -> Result<Vec<TimeSlot>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();

        let mut stmt = conn.prepare_cached(
            "SELECT id, event_id, label, starts_at, ends_at FROM time_slots
             WHERE event_id = ?1 ORDER BY starts_at, id",
        )?;
        let slots = stmt
            .query_map(params![event_id], Self::parse_time_slot_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(slots)
    }

    pub fn sessions_for_event(&self, event_id: i64) -> Result<Vec<EventSession>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();

        let mut stmt = conn.prepare_cached(
            "SELECT id, event_id, session_number, title, description, hashtag, venue_id, time_slot_id
             FROM event_sessions WHERE event_id = ?1 ORDER BY session_number",
        )?;
        let sessions = stmt
            .query_map(params![event_id], |row| {
                Ok(EventSession {
                    id: row.get(0)?,
                    event_id: row.get(1)?,
                    session_number: row.get(2)?,
                    title: row.get(3)?,
                    description: row.get(4)?,
                    hashtag: row.get(5)?,
                    venue_id: row.get(6)?,
                    time_slot_id: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    /// Venue ids linked to an event through the event/venue junction.
    pub fn event_venue_ids(&self, event_id: i64) -> Result<Vec<i64>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();

        let mut stmt = conn.prepare_cached(
            "SELECT venue_id FROM event_venues WHERE event_id = ?1 ORDER BY venue_id",
        )?;
        let ids = stmt
            .query_map(params![event_id], |r| r.get(0))?
            .collect::<std::result::Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    fn parse_time_slot_row(row: &rusqlite::Row) -> rusqlite::Result<TimeSlot> {
        Ok(TimeSlot {
            id: row.get(0)?,
            event_id: row.get(1)?,
            label: row.get(2)?,
            starts_at: row.get(3)?,
            ends_at: row.get(4)?,
        })
    }

    // =========================================================================
    // Counts
    // =========================================================================

    fn count(&self, table: &str) -> usize {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
            r.get::<_, i64>(0)
        })
        .unwrap_or(0) as usize
    }

    pub fn events_count(&self) -> usize {
        self.count("events")
    }

    pub fn venues_count(&self) -> usize {
        self.count("venues")
    }

    pub fn leaders_count(&self) -> usize {
        self.count("leaders")
    }

    pub fn time_slots_count(&self) -> usize {
        self.count("time_slots")
    }

    pub fn sessions_count(&self) -> usize {
        self.count("event_sessions")
    }

    pub fn external_refs_count(&self) -> usize {
        self.count("external_refs")
    }
}
