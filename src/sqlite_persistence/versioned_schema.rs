use anyhow::{bail, Result};
use rusqlite::{params, Connection};
use tracing::info;

/// Offset added to schema versions before stamping `PRAGMA user_version`,
/// so a database created by an unrelated tool is never mistaken for ours.
pub const BASE_DB_VERSION: usize = 4000;

/// SQL default expression for epoch-seconds creation timestamps.
pub const DEFAULT_TIMESTAMP: &str = "(cast(strftime('%s','now') as int))";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
}

impl SqlType {
    fn as_sql(self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
        }
    }
}

/// A column declaration, built with const chaining:
/// `Column::new("id", SqlType::Integer).primary_key()`.
pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub primary_key: bool,
    pub non_null: bool,
    pub default_sql: Option<&'static str>,
    /// Target in `table(column)` form, rendered as a REFERENCES clause.
    pub references: Option<&'static str>,
}

impl Column {
    pub const fn new(name: &'static str, sql_type: SqlType) -> Self {
        Column {
            name,
            sql_type,
            primary_key: false,
            non_null: false,
            default_sql: None,
            references: None,
        }
    }

    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub const fn non_null(mut self) -> Self {
        self.non_null = true;
        self
    }

    pub const fn default_sql(mut self, sql: &'static str) -> Self {
        self.default_sql = Some(sql);
        self
    }

    pub const fn references(mut self, target: &'static str) -> Self {
        self.references = Some(target);
        self
    }
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    /// (index_name, indexed columns) pairs.
    pub indices: &'static [(&'static str, &'static str)],
    pub unique_constraints: &'static [&'static [&'static str]],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let mut sql = format!("CREATE TABLE {} (", self.name);
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(column.name);
            sql.push(' ');
            sql.push_str(column.sql_type.as_sql());
            if column.primary_key {
                sql.push_str(" PRIMARY KEY");
            }
            if column.non_null {
                sql.push_str(" NOT NULL");
            }
            if let Some(default_sql) = column.default_sql {
                sql.push_str(&format!(" DEFAULT {}", default_sql));
            }
            if let Some(target) = column.references {
                sql.push_str(&format!(" REFERENCES {}", target));
            }
        }
        for unique in self.unique_constraints {
            sql.push_str(&format!(", UNIQUE ({})", unique.join(", ")));
        }
        sql.push_str(");");
        conn.execute(&sql, params![])?;

        for (index_name, columns) in self.indices {
            conn.execute(
                &format!("CREATE INDEX {} ON {}({});", index_name, self.name, columns),
                params![],
            )?;
        }
        Ok(())
    }
}

pub struct SchemaVersion {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl SchemaVersion {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys = ON;", params![])?;
        for table in self.tables {
            table.create(conn)?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }

    /// Check that every declared table exists with the declared column
    /// names and types, in order.
    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", table.name))?;
            let actual: Vec<(String, String)> = stmt
                .query_map(params![], |row| Ok((row.get(1)?, row.get(2)?)))?
                .collect::<std::result::Result<_, _>>()?;

            if actual.len() != table.columns.len() {
                bail!(
                    "table {} has {} columns, expected {} ({})",
                    table.name,
                    actual.len(),
                    table.columns.len(),
                    table
                        .columns
                        .iter()
                        .map(|c| c.name)
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            for ((name, sql_type), expected) in actual.iter().zip(table.columns.iter()) {
                if name != expected.name {
                    bail!(
                        "table {} column mismatch: expected {}, got {}",
                        table.name,
                        expected.name,
                        name
                    );
                }
                if sql_type != expected.sql_type.as_sql() {
                    bail!(
                        "table {} column {} type mismatch: expected {}, got {}",
                        table.name,
                        expected.name,
                        expected.sql_type.as_sql(),
                        sql_type
                    );
                }
            }
        }
        Ok(())
    }
}

/// Bring a database up to the newest schema version.
///
/// A brand new database gets the latest schema directly; an existing one is
/// walked through the pending migrations inside a single transaction. A
/// database whose `user_version` predates [`BASE_DB_VERSION`] but already
/// contains tables was not created by this crate and is rejected.
pub fn migrate_to_latest(conn: &mut Connection, schemas: &'static [SchemaVersion]) -> Result<()> {
    let latest = schemas
        .last()
        .expect("at least one schema version must be defined");

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;
    if table_count == 0 {
        info!("Creating db schema at version {}", latest.version);
        return latest.create(conn);
    }

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if (db_version as usize) < BASE_DB_VERSION {
        bail!(
            "database has tables but user_version {} is not ours; refusing to migrate",
            db_version
        );
    }

    let mut current = db_version as usize - BASE_DB_VERSION;
    if current >= latest.version {
        return Ok(());
    }

    let tx = conn.transaction()?;
    let start = current;
    for schema in schemas.iter().filter(|s| s.version > start) {
        let Some(migration) = schema.migration else {
            bail!(
                "no migration path from schema version {} to {}",
                current,
                schema.version
            );
        };
        info!("Migrating db from version {} to {}", current, schema.version);
        migration(&tx)?;
        current = schema.version;
    }
    tx.pragma_update(None, "user_version", BASE_DB_VERSION + current)?;
    tx.commit()?;
    Ok(())
}
