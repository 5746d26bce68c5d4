//! The event-feed synchronization engine.
//!
//! One pass (`EventDataLoader::load_event_data`) fetches an upstream show,
//! transforms it into five payload kinds, and upserts them in dependency
//! order inside a single write transaction. Every synced row is keyed by
//! its upstream (source, id) pair through the external reference table, so
//! re-running a pass updates rows in place instead of duplicating them.

mod entities;
mod error;
mod loader;
pub mod refs;
mod upsert;

pub use entities::{
    ensure_event_venue, EventFields, LeaderFields, SessionFields, TimeSlotFields, VenueFields,
};
pub use error::SyncError;
pub use loader::{EventDataLoader, KindCounts, SyncReport, SyncSettings};
pub use upsert::{upsert, EntityWriter, UpsertOutcome, Upserted};
