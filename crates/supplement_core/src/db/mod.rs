//! SQLite bootstrap for the relational supplement store.
//!
//! # Responsibility
//! - Open file or in-memory connections ready for repository use.
//! - Own the schema version and the migration steps that reach it.
//!
//! # Invariants
//! - No repository touches a connection before migrations succeeded.
//! - Schema version is tracked via `PRAGMA user_version`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure raised while opening, migrating or querying the supplements database.
#[derive(Debug)]
pub enum DbError {
    /// The connection could not be opened or configured.
    Open {
        mode: &'static str,
        source: rusqlite::Error,
    },
    /// A schema step failed; every step of the batch was rolled back.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was stamped by a newer binary and is left untouched.
    SchemaTooNew {
        found: u32,
        supported: u32,
    },
    /// Statement failure on an open connection.
    Sqlite(rusqlite::Error),
}

impl DbError {
    /// Whether SQLite rejected the statement for a constraint, e.g. a second
    /// row for an existing `gtin`.
    pub fn is_constraint_violation(&self) -> bool {
        let source = match self {
            Self::Open { source, .. } | Self::Migration { source, .. } | Self::Sqlite(source) => {
                source
            }
            Self::SchemaTooNew { .. } => return false,
        };
        matches!(
            source,
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { mode, source } => {
                write!(f, "cannot open {mode} supplement database: {source}")
            }
            Self::Migration { version, source } => {
                write!(f, "supplement schema step {version} failed: {source}")
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "supplement database schema version {found} is newer than supported {supported}"
            ),
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Migration { source, .. } | Self::Sqlite(source) => {
                Some(source)
            }
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
