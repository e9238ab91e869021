//! Schema migrations for the supplements database.
//!
//! # Responsibility
//! - Keep the ordered list of schema steps compiled into the binary.
//! - Bring a connection up to the latest schema in one transaction.
//!
//! # Invariants
//! - Step versions are strictly increasing, starting at 1.
//! - The applied version lives in `PRAGMA user_version`.
//! - A database stamped with a newer version than this binary knows is
//!   refused rather than touched.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// `(version, sql)` pairs in apply order.
const SCHEMA_STEPS: &[(u32, &str)] = &[(1, include_str!("0001_init.sql"))];

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |(version, _)| *version)
}

/// Applies every schema step newer than the connection's `user_version`.
///
/// # Errors
/// - `SchemaTooNew` when the file was written by a newer binary.
/// - `Migration` naming the failing step; the whole batch is rolled back.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from = schema_version(conn)?;
    let to = latest_version();

    if from > to {
        return Err(DbError::SchemaTooNew {
            found: from,
            supported: to,
        });
    }
    if from == to {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for &(version, sql) in SCHEMA_STEPS.iter().filter(|(version, _)| *version > from) {
        tx.execute_batch(sql)
            .and_then(|()| tx.pragma_update(None, "user_version", version))
            .map_err(|source| DbError::Migration { version, source })?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={from} to_version={to}");
    Ok(())
}

/// Reads the schema version stamped on the connection.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}
