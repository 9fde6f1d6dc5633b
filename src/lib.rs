pub use quarry_core::*;
pub use quarry_mysql::{MySQLDriver, MySQLSqlWriter};
pub use quarry_postgres::{PostgresDriver, PostgresSqlWriter};
pub use quarry_sqlite::{SQLiteDriver, SQLiteSqlWriter};

use std::sync::Arc;

/// Registry holding every bundled dialect.
///
/// Keys are the URL schemes: `sqlite`, `postgres` (also `postgresql`), `mysql`
/// and `generic`.
pub fn registry() -> DialectRegistry {
    let mut registry = DialectRegistry::new();
    registry
        .register_driver(&SQLiteDriver::new())
        .register_driver(&PostgresDriver::new())
        .register("postgresql", Arc::new(PostgresSqlWriter::new()))
        .register_driver(&MySQLDriver::new())
        .register("generic", Arc::new(GenericSqlWriter::new()));
    registry
}
