//! Supplement store contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the plain CRUD contract every supplement backend satisfies.
//! - Keep SQL details for the `supplements` table inside this module.
//!
//! # Invariants
//! - Absence is `Ok(None)` / empty `Vec`, never an error.
//! - No business rules live here: uniqueness and existence checks belong to
//!   the service. Backend-level failures (including a primary-key violation)
//!   propagate unchanged.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::DbError;
use crate::model::supplement::Supplement;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const SUPPLEMENT_SELECT_SQL: &str = "SELECT
    gtin,
    name,
    brand,
    flavor,
    carbohydrates,
    electrolytes,
    maltodextrose,
    fructose,
    caffeine,
    sodium,
    protein
FROM supplements";

pub type RepoResult<T> = Result<T, RepoError>;

/// Failure surfaced by a supplement store backend.
#[derive(Debug)]
pub enum RepoError {
    /// Relational backend failure (connection, constraint, SQL).
    Db(DbError),
    /// Document backend file access failure.
    Io(std::io::Error),
    /// Document backend (de)serialization failure.
    Json(serde_json::Error),
    /// Backend-enforced uniqueness rejected an insert for this gtin.
    DuplicateKey(String),
    /// A persisted record does not satisfy the model invariants.
    InvalidData(String),
}

impl RepoError {
    /// Whether the backend refused a second record for an existing `gtin`.
    pub fn is_duplicate_key(&self) -> bool {
        match self {
            Self::DuplicateKey(_) => true,
            Self::Db(err) => err.is_constraint_violation(),
            Self::Io(_) | Self::Json(_) | Self::InvalidData(_) => false,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "document store i/o: {err}"),
            Self::Json(err) => write!(f, "document store encoding: {err}"),
            Self::DuplicateKey(gtin) => write!(f, "duplicate supplement key: {gtin}"),
            Self::InvalidData(message) => write!(f, "invalid persisted supplement data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::DuplicateKey(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for RepoError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Key-value style CRUD contract for supplement persistence.
pub trait SupplementRepository {
    /// Looks up one record by its key.
    fn find_by_gtin(&self, gtin: &str) -> RepoResult<Option<Supplement>>;
    /// Inserts a new record.
    fn create(&self, supplement: &Supplement) -> RepoResult<()>;
    /// Replaces the record stored under `supplement.gtin`.
    fn update(&self, supplement: &Supplement) -> RepoResult<()>;
    /// Removes the stored record. Receives the full entity so backends that
    /// match whole documents can do so; key matching is sufficient.
    fn delete(&self, supplement: &Supplement) -> RepoResult<()>;
    /// Returns every stored record.
    fn list_all(&self) -> RepoResult<Vec<Supplement>>;
}

impl<R: SupplementRepository + ?Sized> SupplementRepository for &R {
    fn find_by_gtin(&self, gtin: &str) -> RepoResult<Option<Supplement>> {
        (**self).find_by_gtin(gtin)
    }

    fn create(&self, supplement: &Supplement) -> RepoResult<()> {
        (**self).create(supplement)
    }

    fn update(&self, supplement: &Supplement) -> RepoResult<()> {
        (**self).update(supplement)
    }

    fn delete(&self, supplement: &Supplement) -> RepoResult<()> {
        (**self).delete(supplement)
    }

    fn list_all(&self) -> RepoResult<Vec<Supplement>> {
        (**self).list_all()
    }
}

/// Relational backend over the `supplements` table.
pub struct SqliteSupplementRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSupplementRepository<'conn> {
    /// Wraps a connection returned by [`crate::db::open_db`] (already migrated).
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SupplementRepository for SqliteSupplementRepository<'_> {
    fn find_by_gtin(&self, gtin: &str) -> RepoResult<Option<Supplement>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{SUPPLEMENT_SELECT_SQL} WHERE gtin = ?1;"))?;

        let mut rows = stmt.query([gtin])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_supplement_row(row)?)),
            None => Ok(None),
        }
    }

    fn create(&self, supplement: &Supplement) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO supplements (
                gtin,
                name,
                brand,
                flavor,
                carbohydrates,
                electrolytes,
                maltodextrose,
                fructose,
                caffeine,
                sodium,
                protein
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                supplement.gtin.as_str(),
                supplement.name.as_str(),
                supplement.brand.as_str(),
                supplement.flavor.as_str(),
                f64::from(supplement.carbohydrates),
                f64::from(supplement.electrolytes),
                f64::from(supplement.maltodextrose),
                f64::from(supplement.fructose),
                f64::from(supplement.caffeine),
                f64::from(supplement.sodium),
                f64::from(supplement.protein),
            ],
        )?;

        Ok(())
    }

    fn update(&self, supplement: &Supplement) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE supplements
             SET
                name = ?1,
                brand = ?2,
                flavor = ?3,
                carbohydrates = ?4,
                electrolytes = ?5,
                maltodextrose = ?6,
                fructose = ?7,
                caffeine = ?8,
                sodium = ?9,
                protein = ?10
             WHERE gtin = ?11;",
            params![
                supplement.name.as_str(),
                supplement.brand.as_str(),
                supplement.flavor.as_str(),
                f64::from(supplement.carbohydrates),
                f64::from(supplement.electrolytes),
                f64::from(supplement.maltodextrose),
                f64::from(supplement.fructose),
                f64::from(supplement.caffeine),
                f64::from(supplement.sodium),
                f64::from(supplement.protein),
                supplement.gtin.as_str(),
            ],
        )?;

        Ok(())
    }

    fn delete(&self, supplement: &Supplement) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM supplements WHERE gtin = ?1;",
            [supplement.gtin.as_str()],
        )?;

        Ok(())
    }

    fn list_all(&self) -> RepoResult<Vec<Supplement>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{SUPPLEMENT_SELECT_SQL} ORDER BY gtin ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut supplements = Vec::new();

        while let Some(row) = rows.next()? {
            supplements.push(parse_supplement_row(row)?);
        }

        Ok(supplements)
    }
}

fn parse_supplement_row(row: &Row<'_>) -> RepoResult<Supplement> {
    let supplement = Supplement {
        gtin: row.get("gtin")?,
        name: row.get("name")?,
        brand: row.get("brand")?,
        flavor: row.get("flavor")?,
        carbohydrates: real_column(row, "carbohydrates")?,
        electrolytes: real_column(row, "electrolytes")?,
        maltodextrose: real_column(row, "maltodextrose")?,
        fructose: real_column(row, "fructose")?,
        caffeine: real_column(row, "caffeine")?,
        sodium: real_column(row, "sodium")?,
        protein: real_column(row, "protein")?,
    };

    supplement.validate().map_err(|err| {
        RepoError::InvalidData(format!(
            "row `{}` in supplements: {err}",
            supplement.gtin
        ))
    })?;
    Ok(supplement)
}

// Columns are REAL (f64); values were written from f32 so narrowing is exact.
fn real_column(row: &Row<'_>, column: &str) -> RepoResult<f32> {
    let value: f64 = row.get(column)?;
    Ok(value as f32)
}
