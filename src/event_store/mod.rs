mod models;
mod schema;
mod store;

pub use models::*;
pub use schema::EVENT_DB_SCHEMAS;
pub use store::SqliteEventStore;
