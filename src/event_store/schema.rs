//! Schema for the events database.
//!
//! Five entity tables, the event/venue junction, and the polymorphic
//! `external_refs` table that keys every synced row by its upstream
//! (source, id) pair. Both reference invariants are enforced here: a
//! (source, kind, upstream_id) pair binds at most one local row, and a
//! local row carries at most one binding per source.

use crate::sqlite_persistence::{Column, SchemaVersion, SqlType, Table, DEFAULT_TIMESTAMP};

const EVENTS_TABLE: Table = Table {
    name: "events",
    columns: &[
        Column::new("id", SqlType::Integer).primary_key(),
        Column::new("title", SqlType::Text).non_null(),
        Column::new("slug", SqlType::Text).non_null(),
        Column::new("description", SqlType::Text),
        Column::new("hashtag", SqlType::Text),
        Column::new("time_zone", SqlType::Text).non_null(),
        Column::new("starts_at", SqlType::Integer).non_null(),
        Column::new("ends_at", SqlType::Integer).non_null(),
        // Owning group lives in the member-facing app's tables; no FK here.
        Column::new("group_id", SqlType::Integer).non_null(),
        Column::new("created_at", SqlType::Integer)
            .non_null()
            .default_sql(DEFAULT_TIMESTAMP),
    ],
    indices: &[("idx_events_slug", "slug"), ("idx_events_group", "group_id")],
    unique_constraints: &[],
};

const VENUES_TABLE: Table = Table {
    name: "venues",
    columns: &[
        Column::new("id", SqlType::Integer).primary_key(),
        Column::new("name", SqlType::Text).non_null(),
        Column::new("postal_address", SqlType::Text).non_null(),
        Column::new("latitude", SqlType::Real),
        Column::new("longitude", SqlType::Real),
        Column::new("location_hint", SqlType::Text),
        Column::new("created_by", SqlType::Integer),
        Column::new("created_at", SqlType::Integer)
            .non_null()
            .default_sql(DEFAULT_TIMESTAMP),
    ],
    indices: &[],
    unique_constraints: &[],
};

const LEADERS_TABLE: Table = Table {
    name: "leaders",
    columns: &[
        Column::new("id", SqlType::Integer).primary_key(),
        Column::new("name", SqlType::Text).non_null(),
        Column::new("bio", SqlType::Text),
        Column::new("personal_url", SqlType::Text),
        Column::new("handle", SqlType::Text),
        Column::new("company", SqlType::Text),
        Column::new("title", SqlType::Text),
        Column::new("location", SqlType::Text),
        Column::new("member_id", SqlType::Integer),
        Column::new("created_at", SqlType::Integer)
            .non_null()
            .default_sql(DEFAULT_TIMESTAMP),
    ],
    indices: &[("idx_leaders_member", "member_id")],
    unique_constraints: &[],
};

const TIME_SLOTS_TABLE: Table = Table {
    name: "time_slots",
    columns: &[
        Column::new("id", SqlType::Integer).primary_key(),
        Column::new("event_id", SqlType::Integer)
            .non_null()
            .references("events(id)"),
        Column::new("label", SqlType::Text).non_null(),
        Column::new("starts_at", SqlType::Integer).non_null(),
        Column::new("ends_at", SqlType::Integer).non_null(),
    ],
    indices: &[("idx_time_slots_event", "event_id")],
    unique_constraints: &[],
};

const EVENT_SESSIONS_TABLE: Table = Table {
    name: "event_sessions",
    columns: &[
        Column::new("id", SqlType::Integer).primary_key(),
        Column::new("event_id", SqlType::Integer)
            .non_null()
            .references("events(id)"),
        Column::new("session_number", SqlType::Integer).non_null(),
        Column::new("title", SqlType::Text).non_null(),
        Column::new("description", SqlType::Text),
        Column::new("hashtag", SqlType::Text),
        Column::new("venue_id", SqlType::Integer)
            .non_null()
            .references("venues(id)"),
        Column::new("time_slot_id", SqlType::Integer)
            .non_null()
            .references("time_slots(id)"),
    ],
    indices: &[("idx_event_sessions_event", "event_id")],
    unique_constraints: &[&["event_id", "session_number"]],
};

const EVENT_VENUES_TABLE: Table = Table {
    name: "event_venues",
    columns: &[
        Column::new("event_id", SqlType::Integer)
            .non_null()
            .references("events(id)"),
        Column::new("venue_id", SqlType::Integer)
            .non_null()
            .references("venues(id)"),
    ],
    indices: &[("idx_event_venues_event", "event_id")],
    unique_constraints: &[&["event_id", "venue_id"]],
};

const EXTERNAL_REFS_TABLE: Table = Table {
    name: "external_refs",
    columns: &[
        Column::new("source", SqlType::Text).non_null(),
        Column::new("kind", SqlType::Text).non_null(),
        Column::new("upstream_id", SqlType::Integer).non_null(),
        Column::new("local_id", SqlType::Integer).non_null(),
        Column::new("created_at", SqlType::Integer)
            .non_null()
            .default_sql(DEFAULT_TIMESTAMP),
    ],
    indices: &[],
    unique_constraints: &[
        &["source", "kind", "upstream_id"],
        &["source", "kind", "local_id"],
    ],
};

pub const EVENT_DB_SCHEMAS: &[SchemaVersion] = &[SchemaVersion {
    version: 0,
    tables: &[
        EVENTS_TABLE,
        VENUES_TABLE,
        LEADERS_TABLE,
        TIME_SLOTS_TABLE,
        EVENT_SESSIONS_TABLE,
        EVENT_VENUES_TABLE,
        EXTERNAL_REFS_TABLE,
    ],
    migration: None,
}];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::{params, Connection};

    fn create_schema() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        let schema = &EVENT_DB_SCHEMAS[0];
        schema.create(&conn).unwrap();
        conn
    }

    #[test]
    fn schema_creates_and_validates() {
        let conn = create_schema();
        EVENT_DB_SCHEMAS[0].validate(&conn).unwrap();
    }

    #[test]
    fn event_ids_autoincrement_from_one() {
        let conn = create_schema();
        for title in ["First", "Second"] {
            conn.execute(
                "INSERT INTO events (title, slug, time_zone, starts_at, ends_at, group_id)
                 VALUES (?1, 'x', 'America/Chicago', 0, 1, 1)",
                params![title],
            )
            .unwrap();
        }
        let ids: Vec<i64> = conn
            .prepare("SELECT id FROM events ORDER BY id")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn session_natural_key_is_unique_per_event() {
        let conn = create_schema();
        conn.execute(
            "INSERT INTO events (title, slug, time_zone, starts_at, ends_at, group_id)
             VALUES ('E', 'e', 'UTC', 0, 1, 1)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO venues (name, postal_address) VALUES ('V', 'Somewhere 1')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO time_slots (event_id, label, starts_at, ends_at) VALUES (1, 'S', 0, 1)",
            [],
        )
        .unwrap();

        conn.execute(
            "INSERT INTO event_sessions (event_id, session_number, title, venue_id, time_slot_id)
             VALUES (1, 1, 'Talk', 1, 1)",
            [],
        )
        .unwrap();
        assert!(conn
            .execute(
                "INSERT INTO event_sessions (event_id, session_number, title, venue_id, time_slot_id)
                 VALUES (1, 1, 'Other talk', 1, 1)",
                [],
            )
            .is_err());
    }

    #[test]
    fn external_ref_pair_binds_at_most_one_local_row() {
        let conn = create_schema();
        conn.execute(
            "INSERT INTO external_refs (source, kind, upstream_id, local_id) VALUES ('NFJS', 'event', 271, 1)",
            [],
        )
        .unwrap();
        // Same pair, different local row.
        assert!(conn
            .execute(
                "INSERT INTO external_refs (source, kind, upstream_id, local_id) VALUES ('NFJS', 'event', 271, 2)",
                [],
            )
            .is_err());
        // Same local row, different pair.
        assert!(conn
            .execute(
                "INSERT INTO external_refs (source, kind, upstream_id, local_id) VALUES ('NFJS', 'event', 999, 1)",
                [],
            )
            .is_err());
        // Another source may bind the same local row.
        conn.execute(
            "INSERT INTO external_refs (source, kind, upstream_id, local_id) VALUES ('OTHER', 'event', 271, 1)",
            [],
        )
        .unwrap();
    }
}
