//! Vault storage: one SQLite file per vault, versioned by migrations.
//!
//! # Responsibility
//! - Open vault files (or scratch in-memory vaults) with the pragmas the note
//!   store relies on.
//! - Bring the vault schema up to date before any note is read.
//! - Tell "not a vault", "vault from a newer build" and "migration broke"
//!   apart, so callers can report each one precisely.
//!
//! # Invariants
//! - The vault schema version lives in `PRAGMA user_version`.
//! - A failed migration leaves the vault at its previous version.

use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file exists but is not an SQLite database.
    NotAVault(rusqlite::Error),
    /// The vault was written by a build with a newer schema.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A schema step failed; the whole upgrade was rolled back.
    MigrationFailed {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::NotAVault(_) => write!(f, "file is not a note vault"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "vault schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::MigrationFailed {
                version,
                name,
                source,
            } => write!(f, "vault migration {version} ({name}) failed: {source}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::NotAVault(err) => Some(err),
            Self::MigrationFailed { source, .. } => Some(source),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        match value.sqlite_error_code() {
            Some(ErrorCode::NotADatabase) => Self::NotAVault(value),
            _ => Self::Sqlite(value),
        }
    }
}
