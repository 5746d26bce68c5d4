//! End-to-end synchronization tests: a fixture feed standing in for the
//! upstream HTTP API, a tempfile-backed store, and the loader driving full
//! passes over a realistically sized show.

use showsync::feed::{
    EventRecord, FeedError, LeaderRecord, SessionRecord, TimeSlotRecord, UpstreamShow, VenueRecord,
};
use showsync::sync::KindCounts;
use showsync::{EventDataLoader, ShowFeed, SqliteEventStore, SyncError, SyncSettings};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const SHOW_ID: i64 = 271;
const VENUE_ID: i64 = 38;
const LEADER_BASE_ID: i64 = 1000;
const SLOT_BASE_ID: i64 = 500;
const SESSION_BASE_ID: i64 = 7000;

struct FixtureFeed {
    shows: Mutex<HashMap<i64, UpstreamShow>>,
}

impl FixtureFeed {
    fn new() -> Self {
        Self {
            shows: Mutex::new(HashMap::new()),
        }
    }

    fn set_show(&self, show_id: i64, show: UpstreamShow) {
        self.shows.lock().unwrap().insert(show_id, show);
    }

    fn clear(&self) {
        self.shows.lock().unwrap().clear();
    }
}

impl ShowFeed for FixtureFeed {
    fn fetch_show(&self, show_id: i64) -> Result<UpstreamShow, FeedError> {
        self.shows
            .lock()
            .unwrap()
            .get(&show_id)
            .cloned()
            .ok_or(FeedError::Status(404))
    }
}

/// RFC 3339 datetime within the show's week, offset by `index` hours.
fn slot_time(index: usize) -> String {
    let day = 15 + index / 12;
    let hour = 8 + index % 12;
    format!("2012-10-{:02}T{:02}:00:00-05:00", day, hour)
}

fn leader_record(id: i64) -> LeaderRecord {
    LeaderRecord {
        id,
        name: format!("Speaker {}", id),
        bio: Some(format!("Bio of speaker {}", id)),
        personal_url: Some(format!("https://example.org/speakers/{}", id)),
        handle: Some(format!("speaker{}", id)),
    }
}

fn slot_record(id: i64, index: usize) -> TimeSlotRecord {
    TimeSlotRecord {
        id,
        label: format!("Slot {}", index + 1),
        starts_at: slot_time(index),
        ends_at: slot_time(index + 1),
    }
}

fn session_record(id: i64, slot_id: i64) -> SessionRecord {
    SessionRecord {
        id,
        title: format!("Session {}", id),
        description: Some(format!("Abstract for session {}", id)),
        hashtag: Some(format!("#s{}", id)),
        venue_id: VENUE_ID,
        time_slot_id: slot_id,
    }
}

/// The show-271 fixture: one event and venue, 85 leaders, 36 time slots,
/// 112 sessions.
fn show_271() -> UpstreamShow {
    let leaders = (0..85).map(|i| leader_record(LEADER_BASE_ID + i)).collect();
    let time_slots = (0..36)
        .map(|i| slot_record(SLOT_BASE_ID + i as i64, i))
        .collect::<Vec<_>>();
    let sessions = (0..112)
        .map(|i| session_record(SESSION_BASE_ID + i as i64, SLOT_BASE_ID + (i % 36) as i64))
        .collect();

    UpstreamShow {
        event: EventRecord {
            id: SHOW_ID,
            title: "SpringOne 2GX".to_string(),
            slug: "S2GX".to_string(),
            description: Some("Two conferences for the price of one".to_string()),
            hashtag: Some("#s2gx".to_string()),
            time_zone: "America/Chicago".to_string(),
            starts_at: "2012-10-15T08:00:00-05:00".to_string(),
            ends_at: "2012-10-18T18:00:00-05:00".to_string(),
        },
        venue: VenueRecord {
            id: VENUE_ID,
            name: "Chicago Marriott Downtown".to_string(),
            postal_address: "540 North Michigan Avenue, Chicago, IL 60611".to_string(),
            latitude: Some(41.89001),
            longitude: Some(-87.624381),
            location_hint: Some("Michigan Ave at Ohio St".to_string()),
        },
        leaders,
        time_slots,
        sessions,
    }
}

struct TestHarness {
    _temp_dir: TempDir,
    store: Arc<SqliteEventStore>,
    feed: Arc<FixtureFeed>,
    loader: EventDataLoader,
}

fn harness() -> TestHarness {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteEventStore::open(temp_dir.path().join("events.db")).unwrap());
    let feed = Arc::new(FixtureFeed::new());
    feed.set_show(SHOW_ID, show_271());

    let loader = EventDataLoader::new(
        store.clone(),
        feed.clone(),
        SyncSettings {
            source: "NFJS".to_string(),
            group_id: 1,
        },
    );

    TestHarness {
        _temp_dir: temp_dir,
        store,
        feed,
        loader,
    }
}

fn counts(store: &SqliteEventStore) -> (usize, usize, usize, usize, usize, usize) {
    (
        store.events_count(),
        store.venues_count(),
        store.leaders_count(),
        store.time_slots_count(),
        store.sessions_count(),
        store.external_refs_count(),
    )
}

#[test]
fn first_import_creates_the_whole_graph() {
    let h = harness();

    let report = h.loader.load_event_data(SHOW_ID).unwrap();
    assert_eq!(
        report.created,
        KindCounts {
            events: 1,
            venues: 1,
            leaders: 85,
            time_slots: 36,
            sessions: 112,
        }
    );
    assert_eq!(report.updated, KindCounts::default());
    assert_eq!(counts(&h.store), (1, 1, 85, 36, 112, 235));

    let event = h.store.get_event(report.event_id).unwrap().unwrap();
    assert_eq!(event.title, "SpringOne 2GX");
    assert_eq!(event.time_zone, "America/Chicago");
    assert_eq!(event.slug, "S2GX");
    assert_eq!(event.group_id, 1);

    let venue_ids = h.store.event_venue_ids(event.id).unwrap();
    assert_eq!(venue_ids.len(), 1);
    let venue = h.store.get_venue(venue_ids[0]).unwrap().unwrap();
    assert_eq!(venue.name, "Chicago Marriott Downtown");
}

#[test]
fn reimporting_unchanged_content_is_idempotent() {
    let h = harness();

    let first = h.loader.load_event_data(SHOW_ID).unwrap();
    let snapshot_event = h.store.get_event(first.event_id).unwrap();
    let snapshot_sessions = h.store.sessions_for_event(first.event_id).unwrap();
    let snapshot_slots = h.store.time_slots_for_event(first.event_id).unwrap();
    let counts_before = counts(&h.store);

    let second = h.loader.load_event_data(SHOW_ID).unwrap();
    assert_eq!(second.created, KindCounts::default());
    assert_eq!(
        second.updated,
        KindCounts {
            events: 1,
            venues: 1,
            leaders: 85,
            time_slots: 36,
            sessions: 112,
        }
    );

    assert_eq!(counts(&h.store), counts_before);
    assert_eq!(h.store.get_event(first.event_id).unwrap(), snapshot_event);
    assert_eq!(
        h.store.sessions_for_event(first.event_id).unwrap(),
        snapshot_sessions
    );
    assert_eq!(
        h.store.time_slots_for_event(first.event_id).unwrap(),
        snapshot_slots
    );
}

#[test]
fn upstream_edits_are_applied_in_place() {
    let h = harness();
    let first = h.loader.load_event_data(SHOW_ID).unwrap();

    let mut show = show_271();
    show.event.title = "SpringOne/2GX".to_string();
    show.event.time_zone = "America/Boise".to_string();
    // Upstream also rewrites the blurb; the engine never re-applies it.
    show.event.description = Some("Completely rewritten blurb".to_string());
    show.leaders[0].bio = Some("Updated bio".to_string());
    show.sessions[0].title = "Retitled session".to_string();
    h.feed.set_show(SHOW_ID, show);

    let counts_before = counts(&h.store);
    let second = h.loader.load_event_data(SHOW_ID).unwrap();
    assert_eq!(second.created, KindCounts::default());
    assert_eq!(counts(&h.store), counts_before);

    let event = h.store.get_event(first.event_id).unwrap().unwrap();
    assert_eq!(event.title, "SpringOne/2GX");
    assert_eq!(event.time_zone, "America/Boise");
    assert_eq!(
        event.description.as_deref(),
        Some("Two conferences for the price of one")
    );

    // Leaders were inserted in feed order into an empty store.
    let leader = h.store.get_leader(1).unwrap().unwrap();
    assert_eq!(leader.bio.as_deref(), Some("Updated bio"));

    let sessions = h.store.sessions_for_event(first.event_id).unwrap();
    assert_eq!(sessions[0].title, "Retitled session");
    assert_eq!(sessions[0].session_number, 1);
}

#[test]
fn new_upstream_items_insert_exactly_one_row_each() {
    let h = harness();
    let first = h.loader.load_event_data(SHOW_ID).unwrap();
    let snapshot_sessions = h.store.sessions_for_event(first.event_id).unwrap();

    let mut show = show_271();
    show.event.title = "SpringOne/2GX".to_string();
    show.event.time_zone = "America/Boise".to_string();
    show.leaders.push(leader_record(1999));
    show.time_slots.push(slot_record(599, 36));
    show.sessions.push(session_record(7999, 599));
    h.feed.set_show(SHOW_ID, show);

    let second = h.loader.load_event_data(SHOW_ID).unwrap();
    assert_eq!(
        second.created,
        KindCounts {
            events: 0,
            venues: 0,
            leaders: 1,
            time_slots: 1,
            sessions: 1,
        }
    );
    assert_eq!(counts(&h.store), (1, 1, 86, 37, 113, 238));

    let event = h.store.get_event(first.event_id).unwrap().unwrap();
    assert_eq!(event.title, "SpringOne/2GX");
    assert_eq!(event.time_zone, "America/Boise");

    // The new session got the next sequence number; the 112 previously
    // synced sessions are byte-for-byte unchanged apart from none at all.
    let sessions = h.store.sessions_for_event(first.event_id).unwrap();
    assert_eq!(sessions.len(), 113);
    assert_eq!(sessions[..112], snapshot_sessions[..]);
    assert_eq!(sessions[112].session_number, 113);
    assert_eq!(sessions[112].title, "Session 7999");
}

#[test]
fn session_references_stay_within_the_event() {
    let h = harness();
    let report = h.loader.load_event_data(SHOW_ID).unwrap();

    let venue_ids = h.store.event_venue_ids(report.event_id).unwrap();
    let sessions = h.store.sessions_for_event(report.event_id).unwrap();
    assert_eq!(sessions.len(), 112);

    for session in &sessions {
        assert!(venue_ids.contains(&session.venue_id));
        let slot = h.store.get_time_slot(session.time_slot_id).unwrap().unwrap();
        assert_eq!(slot.event_id, report.event_id);
    }
}

#[test]
fn failed_fetch_leaves_previously_synced_data_untouched() {
    let h = harness();
    let first = h.loader.load_event_data(SHOW_ID).unwrap();
    let snapshot_event = h.store.get_event(first.event_id).unwrap();
    let counts_before = counts(&h.store);

    h.feed.clear();
    let err = h.loader.load_event_data(SHOW_ID).unwrap_err();
    assert!(matches!(err, SyncError::Fetch { show_id: SHOW_ID, .. }));

    assert_eq!(counts(&h.store), counts_before);
    assert_eq!(h.store.get_event(first.event_id).unwrap(), snapshot_event);
}

#[test]
fn malformed_payload_rolls_back_the_whole_pass() {
    let h = harness();
    let first = h.loader.load_event_data(SHOW_ID).unwrap();
    let counts_before = counts(&h.store);

    // A dangling slot reference is only discovered mid-transaction, after
    // the event, venue, leaders, and slots were already upserted.
    let mut show = show_271();
    show.leaders.push(leader_record(1999));
    show.sessions.push(session_record(7999, 999_999));
    h.feed.set_show(SHOW_ID, show);

    let err = h.loader.load_event_data(SHOW_ID).unwrap_err();
    assert!(matches!(err, SyncError::Validation { .. }));

    // The new leader's insert was rolled back along with everything else.
    assert_eq!(counts(&h.store), counts_before);
}

#[test]
fn shows_sync_independently() {
    let h = harness();

    // A second show with its own upstream ids; the three shared speakers are
    // the only overlap between the two entity graphs.
    let mut other = show_271();
    other.event.id = 272;
    other.event.title = "Madison Meetup".to_string();
    other.event.slug = "MAD".to_string();
    other.venue.id = 77;
    other.leaders.truncate(3);
    other.time_slots = (0..4).map(|i| slot_record(600 + i as i64, i)).collect();
    other.sessions = (0..8)
        .map(|i| {
            let mut session = session_record(8000 + i, 600 + (i % 4));
            session.venue_id = 77;
            session
        })
        .collect();
    h.feed.set_show(272, other);

    let first = h.loader.load_event_data(SHOW_ID).unwrap();
    let second = h.loader.load_event_data(272).unwrap();
    assert_ne!(first.event_id, second.event_id);
    assert_eq!(h.store.events_count(), 2);
    assert_eq!(h.store.venues_count(), 2);

    // Re-importing one show does not disturb the other.
    let other_sessions_before = h.store.sessions_for_event(second.event_id).unwrap();
    h.loader.load_event_data(SHOW_ID).unwrap();
    assert_eq!(
        h.store.sessions_for_event(second.event_id).unwrap(),
        other_sessions_before
    );
}
