//! Record types for the upstream show document.
//!
//! One document per show: the event itself, its venue, and the speaker,
//! time-slot, and session lists. Datetimes arrive as RFC 3339 strings and
//! are parsed during payload construction, not here. Unknown upstream
//! fields are ignored by serde.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamShow {
    pub event: EventRecord,
    pub venue: VenueRecord,
    #[serde(default)]
    pub leaders: Vec<LeaderRecord>,
    #[serde(default)]
    pub time_slots: Vec<TimeSlotRecord>,
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub hashtag: Option<String>,
    pub time_zone: String,
    pub starts_at: String,
    pub ends_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueRecord {
    pub id: i64,
    pub name: String,
    pub postal_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_hint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderRecord {
    pub id: i64,
    pub name: String,
    pub bio: Option<String>,
    pub personal_url: Option<String>,
    pub handle: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotRecord {
    pub id: i64,
    pub label: String,
    pub starts_at: String,
    pub ends_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub hashtag: Option<String>,
    pub venue_id: i64,
    pub time_slot_id: i64,
}
