//! Vault schema steps, oldest first.
//!
//! Version 1 holds notes, both edge tables and metadata; version 2 adds the
//! FTS5 content index and the triggers that keep it in sync with `notes`.
//! All pending steps run in one transaction.

use crate::db::{DbError, DbResult};
use log::{debug, info, warn};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "notes_and_edges",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "content_fts",
        sql: include_str!("0002_content_fts.sql"),
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Upgrades the vault schema to `latest_version()`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the vault is newer than this build.
/// - `MigrationFailed` naming the first step that failed; earlier steps of
///   the same upgrade are rolled back with it.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version = current_user_version(conn)?;
    let latest = latest_version();

    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }
    if from_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().filter(|step| step.version > from_version) {
        tx.execute_batch(migration.sql)
            .and_then(|()| {
                tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
            })
            .map_err(|source| {
                warn!(
                    "event=db_migrate module=db status=error version={} name={}",
                    migration.version, migration.name
                );
                DbError::MigrationFailed {
                    version: migration.version,
                    name: migration.name,
                    source,
                }
            })?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={from_version} to_version={latest}"
    );
    Ok(())
}

/// Reads the schema version mirrored in `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
