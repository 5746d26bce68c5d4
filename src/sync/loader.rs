//! The show-import orchestrator.
//!
//! One call fetches one upstream show and drives the upserts in dependency
//! order: event, venue (+ event/venue link), leaders, time slots, sessions.
//! Sessions reference venue and slot rows through ids produced earlier in
//! the same pass, so the order is load-bearing. All writes happen inside a
//! single `BEGIN IMMEDIATE` transaction; the upstream fetch and datetime
//! validation run before it opens, so a failed fetch or a malformed payload
//! writes nothing at all.

use super::entities::{
    ensure_event_venue, EventFields, LeaderFields, SessionFields, TimeSlotFields, VenueFields,
};
use super::upsert::{upsert, UpsertOutcome};
use super::SyncError;
use crate::event_store::{RefKind, SqliteEventStore};
use crate::feed::{ShowFeed, UpstreamShow};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Source tag recorded on every external reference, e.g. "NFJS".
    pub source: String,
    /// Owning group for events created from this feed.
    pub group_id: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub events: usize,
    pub venues: usize,
    pub leaders: usize,
    pub time_slots: usize,
    pub sessions: usize,
}

impl KindCounts {
    fn bump(&mut self, kind: RefKind) {
        match kind {
            RefKind::Event => self.events += 1,
            RefKind::Venue => self.venues += 1,
            RefKind::Leader => self.leaders += 1,
            RefKind::TimeSlot => self.time_slots += 1,
            RefKind::Session => self.sessions += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.events + self.venues + self.leaders + self.time_slots + self.sessions
    }
}

/// Outcome summary of one successful pass.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub show_id: i64,
    pub event_id: i64,
    pub created: KindCounts,
    pub updated: KindCounts,
}

impl SyncReport {
    fn tally(&mut self, kind: RefKind, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created.bump(kind),
            UpsertOutcome::Updated => self.updated.bump(kind),
        }
    }
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "show {} -> event {}: {} rows created, {} rows updated ({} sessions, {} time slots, {} leaders)",
            self.show_id,
            self.event_id,
            self.created.total(),
            self.updated.total(),
            self.created.sessions + self.updated.sessions,
            self.created.time_slots + self.updated.time_slots,
            self.created.leaders + self.updated.leaders,
        )
    }
}

/// Event and slot datetimes parsed up front, before any write.
struct ParsedTimes {
    event_starts_at: i64,
    event_ends_at: i64,
    /// (starts_at, ends_at) parallel to the show's time-slot list.
    slots: Vec<(i64, i64)>,
}

impl ParsedTimes {
    fn build(show: &UpstreamShow) -> Result<Self, SyncError> {
        let event_starts_at = parse_timestamp(RefKind::Event, "startsAt", &show.event.starts_at)?;
        let event_ends_at = parse_timestamp(RefKind::Event, "endsAt", &show.event.ends_at)?;

        let mut slots = Vec::with_capacity(show.time_slots.len());
        for slot in &show.time_slots {
            slots.push((
                parse_timestamp(RefKind::TimeSlot, "startsAt", &slot.starts_at)?,
                parse_timestamp(RefKind::TimeSlot, "endsAt", &slot.ends_at)?,
            ));
        }

        Ok(ParsedTimes {
            event_starts_at,
            event_ends_at,
            slots,
        })
    }
}

fn parse_timestamp(kind: RefKind, field: &str, value: &str) -> Result<i64, SyncError> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.timestamp())
        .map_err(|e| SyncError::Validation {
            kind,
            message: format!("unparsable {} '{}': {}", field, value, e),
        })
}

pub struct EventDataLoader {
    store: Arc<SqliteEventStore>,
    feed: Arc<dyn ShowFeed>,
    settings: SyncSettings,
}

impl EventDataLoader {
    pub fn new(store: Arc<SqliteEventStore>, feed: Arc<dyn ShowFeed>, settings: SyncSettings) -> Self {
        Self {
            store,
            feed,
            settings,
        }
    }

    /// Synchronize one upstream show into the local store.
    ///
    /// Running this any number of times against unchanged upstream content
    /// leaves identical row counts and field values; upstream edits land as
    /// in-place updates and new upstream ids as single new rows.
    pub fn load_event_data(&self, show_id: i64) -> Result<SyncReport, SyncError> {
        debug!(
            "Fetching show {} from source {}",
            show_id, self.settings.source
        );
        let show = self
            .feed
            .fetch_show(show_id)
            .map_err(|source| SyncError::Fetch { show_id, source })?;
        let times = ParsedTimes::build(&show)?;

        let report = self
            .store
            .with_write(|conn| self.apply(conn, show_id, &show, &times))?;

        info!("{}", report);
        Ok(report)
    }

    fn apply(
        &self,
        conn: &Connection,
        show_id: i64,
        show: &UpstreamShow,
        times: &ParsedTimes,
    ) -> Result<SyncReport, SyncError> {
        let source = self.settings.source.as_str();
        let mut report = SyncReport {
            show_id,
            event_id: 0,
            created: KindCounts::default(),
            updated: KindCounts::default(),
        };

        let event = upsert(
            conn,
            source,
            show.event.id,
            &EventFields {
                title: show.event.title.clone(),
                slug: show.event.slug.clone(),
                description: show.event.description.clone(),
                hashtag: show.event.hashtag.clone(),
                time_zone: show.event.time_zone.clone(),
                starts_at: times.event_starts_at,
                ends_at: times.event_ends_at,
                group_id: self.settings.group_id,
            },
        )?;
        report.event_id = event.id;
        report.tally(RefKind::Event, event.outcome);

        let venue = upsert(
            conn,
            source,
            show.venue.id,
            &VenueFields {
                name: show.venue.name.clone(),
                postal_address: show.venue.postal_address.clone(),
                latitude: show.venue.latitude,
                longitude: show.venue.longitude,
                location_hint: show.venue.location_hint.clone(),
                created_by: None,
            },
        )?;
        ensure_event_venue(conn, event.id, venue.id)?;
        report.tally(RefKind::Venue, venue.outcome);

        let mut venue_ids = HashMap::new();
        venue_ids.insert(show.venue.id, venue.id);

        for leader in &show.leaders {
            let upserted = upsert(
                conn,
                source,
                leader.id,
                &LeaderFields {
                    name: leader.name.clone(),
                    bio: leader.bio.clone(),
                    personal_url: leader.personal_url.clone(),
                    handle: leader.handle.clone(),
                },
            )?;
            report.tally(RefKind::Leader, upserted.outcome);
        }

        let mut slot_ids = HashMap::with_capacity(show.time_slots.len());
        for (slot, &(starts_at, ends_at)) in show.time_slots.iter().zip(&times.slots) {
            let upserted = upsert(
                conn,
                source,
                slot.id,
                &TimeSlotFields {
                    event_id: event.id,
                    label: slot.label.clone(),
                    starts_at,
                    ends_at,
                },
            )?;
            slot_ids.insert(slot.id, upserted.id);
            report.tally(RefKind::TimeSlot, upserted.outcome);
        }

        for session in &show.sessions {
            let venue_id = *venue_ids.get(&session.venue_id).ok_or_else(|| {
                SyncError::Validation {
                    kind: RefKind::Session,
                    message: format!(
                        "session {} references unknown venue {}",
                        session.id, session.venue_id
                    ),
                }
            })?;
            let time_slot_id = *slot_ids.get(&session.time_slot_id).ok_or_else(|| {
                SyncError::Validation {
                    kind: RefKind::Session,
                    message: format!(
                        "session {} references unknown time slot {}",
                        session.id, session.time_slot_id
                    ),
                }
            })?;

            let upserted = upsert(
                conn,
                source,
                session.id,
                &SessionFields {
                    event_id: event.id,
                    title: session.title.clone(),
                    description: session.description.clone(),
                    hashtag: session.hashtag.clone(),
                    venue_id,
                    time_slot_id,
                },
            )?;
            report.tally(RefKind::Session, upserted.outcome);
        }

        Ok(report)
    }
}
