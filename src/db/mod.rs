mod factory;
pub mod sqlite;
mod types;

pub use factory::{get_db, init_global};
pub use types::{Database, DatabaseConfig, SqliteConfig};
