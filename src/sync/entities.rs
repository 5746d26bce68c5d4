//! The five payload kinds driven through the generic upsert.
//!
//! Each `update` overwrites exactly the columns the upstream feed owns for
//! that kind. Two are narrower than their inserts, matching the observed
//! behavior of the feed: an event's description and hashtag are written
//! once at insert and never touched again, and a leader's company, title,
//! location, and member link are never fed at all.

use super::upsert::EntityWriter;
use crate::event_store::RefKind;
use rusqlite::{params, Connection};

pub struct EventFields {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub hashtag: Option<String>,
    pub time_zone: String,
    pub starts_at: i64,
    pub ends_at: i64,
    pub group_id: i64,
}

impl EntityWriter for EventFields {
    const KIND: RefKind = RefKind::Event;

    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO events (title, slug, description, hashtag, time_zone, starts_at, ends_at, group_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                self.title,
                self.slug,
                self.description,
                self.hashtag,
                self.time_zone,
                self.starts_at,
                self.ends_at,
                self.group_id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    // Description, hashtag, and owning group keep their insert-time values.
    fn update(&self, conn: &Connection, id: i64) -> rusqlite::Result<()> {
        conn.execute(
            "UPDATE events SET title = ?1, slug = ?2, time_zone = ?3, starts_at = ?4, ends_at = ?5
             WHERE id = ?6",
            params![
                self.title,
                self.slug,
                self.time_zone,
                self.starts_at,
                self.ends_at,
                id
            ],
        )?;
        Ok(())
    }
}

pub struct VenueFields {
    pub name: String,
    pub postal_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_hint: Option<String>,
    pub created_by: Option<i64>,
}

impl EntityWriter for VenueFields {
    const KIND: RefKind = RefKind::Venue;

    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO venues (name, postal_address, latitude, longitude, location_hint, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.name,
                self.postal_address,
                self.latitude,
                self.longitude,
                self.location_hint,
                self.created_by,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, conn: &Connection, id: i64) -> rusqlite::Result<()> {
        conn.execute(
            "UPDATE venues SET name = ?1, postal_address = ?2, latitude = ?3, longitude = ?4,
             location_hint = ?5, created_by = ?6 WHERE id = ?7",
            params![
                self.name,
                self.postal_address,
                self.latitude,
                self.longitude,
                self.location_hint,
                self.created_by,
                id
            ],
        )?;
        Ok(())
    }
}

pub struct LeaderFields {
    pub name: String,
    pub bio: Option<String>,
    pub personal_url: Option<String>,
    pub handle: Option<String>,
}

impl EntityWriter for LeaderFields {
    const KIND: RefKind = RefKind::Leader;

    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO leaders (name, bio, personal_url, handle) VALUES (?1, ?2, ?3, ?4)",
            params![self.name, self.bio, self.personal_url, self.handle],
        )?;
        Ok(conn.last_insert_rowid())
    }

    // company/title/location/member_id belong to the member-facing app and
    // are never written from the feed.
    fn update(&self, conn: &Connection, id: i64) -> rusqlite::Result<()> {
        conn.execute(
            "UPDATE leaders SET name = ?1, bio = ?2, personal_url = ?3, handle = ?4 WHERE id = ?5",
            params![self.name, self.bio, self.personal_url, self.handle, id],
        )?;
        Ok(())
    }
}

pub struct TimeSlotFields {
    pub event_id: i64,
    pub label: String,
    pub starts_at: i64,
    pub ends_at: i64,
}

impl EntityWriter for TimeSlotFields {
    const KIND: RefKind = RefKind::TimeSlot;

    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO time_slots (event_id, label, starts_at, ends_at) VALUES (?1, ?2, ?3, ?4)",
            params![self.event_id, self.label, self.starts_at, self.ends_at],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, conn: &Connection, id: i64) -> rusqlite::Result<()> {
        conn.execute(
            "UPDATE time_slots SET event_id = ?1, label = ?2, starts_at = ?3, ends_at = ?4
             WHERE id = ?5",
            params![self.event_id, self.label, self.starts_at, self.ends_at, id],
        )?;
        Ok(())
    }
}

pub struct SessionFields {
    pub event_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub hashtag: Option<String>,
    pub venue_id: i64,
    pub time_slot_id: i64,
}

impl EntityWriter for SessionFields {
    const KIND: RefKind = RefKind::Session;

    /// Inserts allocate the next sequence number within the owning event;
    /// (event_id, session_number) is the session's natural key.
    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> {
        let next_number: i64 = conn.query_row(
            "SELECT COALESCE(MAX(session_number), 0) + 1 FROM event_sessions WHERE event_id = ?1",
            params![self.event_id],
            |r| r.get(0),
        )?;
        conn.execute(
            "INSERT INTO event_sessions (event_id, session_number, title, description, hashtag, venue_id, time_slot_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.event_id,
                next_number,
                self.title,
                self.description,
                self.hashtag,
                self.venue_id,
                self.time_slot_id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, conn: &Connection, id: i64) -> rusqlite::Result<()> {
        conn.execute(
            "UPDATE event_sessions SET title = ?1, description = ?2, hashtag = ?3, venue_id = ?4,
             time_slot_id = ?5 WHERE id = ?6",
            params![
                self.title,
                self.description,
                self.hashtag,
                self.venue_id,
                self.time_slot_id,
                id
            ],
        )?;
        Ok(())
    }
}

/// Link a venue to an event. Inserted if absent, never removed.
pub fn ensure_event_venue(conn: &Connection, event_id: i64, venue_id: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO event_venues (event_id, venue_id) VALUES (?1, ?2)",
        params![event_id, venue_id],
    )?;
    Ok(())
}
