//! Shared SQLite schema machinery.
//!
//! Tables are declared as consts and grouped into versioned schemas; a
//! database is stamped with `PRAGMA user_version` so later versions can be
//! applied as migrations.

mod versioned_schema;

pub use versioned_schema::{
    migrate_to_latest, Column, SchemaVersion, SqlType, Table, BASE_DB_VERSION, DEFAULT_TIMESTAMP,
};
