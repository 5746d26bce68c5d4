//! Read models for the events database.
//!
//! Timestamps are epoch seconds (UTC); an event's time zone is the Olson id
//! reported by the upstream feed, stored verbatim.

use serde::Serialize;

/// Entity kinds addressable through the external reference table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum RefKind {
    Event,
    Venue,
    Leader,
    TimeSlot,
    Session,
}

impl RefKind {
    pub fn to_db_str(self) -> &'static str {
        match self {
            RefKind::Event => "event",
            RefKind::Venue => "venue",
            RefKind::Leader => "leader",
            RefKind::TimeSlot => "time_slot",
            RefKind::Session => "session",
        }
    }
}

impl std::fmt::Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_db_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub hashtag: Option<String>,
    pub time_zone: String,
    pub starts_at: i64,
    pub ends_at: i64,
    /// Owning group; managed by the member-facing application.
    pub group_id: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub postal_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_hint: Option<String>,
    pub created_by: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Leader {
    pub id: i64,
    pub name: String,
    pub bio: Option<String>,
    pub personal_url: Option<String>,
    pub handle: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    /// Link to a local member account, populated outside the sync engine.
    pub member_id: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeSlot {
    pub id: i64,
    pub event_id: i64,
    pub label: String,
    pub starts_at: i64,
    pub ends_at: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventSession {
    pub id: i64,
    pub event_id: i64,
    /// Per-event sequence number; (event_id, session_number) is the natural key.
    pub session_number: i64,
    pub title: String,
    pub description: Option<String>,
    pub hashtag: Option<String>,
    pub venue_id: i64,
    pub time_slot_id: i64,
}
