//! Note store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the CRUD + reverse-edge index contract consumed by the graph core.
//! - Own edge-set replacement and delete cascades with atomic semantics.
//! - Keep `is_favorite` flags and the favorites metadata list in step.
//!
//! # Invariants
//! - Write paths call `Note::validate()` before any SQL mutation.
//! - `put_many` writes all rows first and edges second, inside one transaction,
//!   so notes may reference each other within a batch.
//! - Edges toward ids that do not exist are dropped on write.
//! - Deleting a note removes every edge pointing at it (via `ON DELETE
//!   CASCADE`) and removes it from the favorites list in the same transaction.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::note::{now_epoch_ms, Note, NoteId, NoteValidationError};
use crate::repo::meta::{decode_favorites, encode_favorites, MetaKey};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    is_favorite,
    created_at,
    modified_at
FROM notes";

pub type StoreResult<T> = Result<T, StoreError>;

/// Store failure. The only error class the graph core propagates to callers.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Validation(NoteValidationError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted data cannot be converted to a valid note.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "note store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<NoteValidationError> for StoreError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Persistence contract consumed by the topology engine, the relationship
/// mutator and the session layer.
pub trait NoteStore {
    fn get(&self, id: &NoteId) -> StoreResult<Option<Note>>;
    /// Loads several notes, keeping `None` for ids that do not resolve.
    fn batch_get(&self, ids: &[NoteId]) -> StoreResult<Vec<Option<Note>>>;
    /// Notes whose `links_to` contains `target`.
    fn find_by_reverse_edge(&self, target: &NoteId) -> StoreResult<Vec<Note>>;
    fn count(&self) -> StoreResult<u64>;
    /// Oldest note, used as a fallback center.
    fn first_note_id(&self) -> StoreResult<Option<NoteId>>;
    /// Every note ordered by creation time.
    fn list_all(&self) -> StoreResult<Vec<Note>>;
    fn put(&mut self, note: &Note) -> StoreResult<()> {
        self.put_many(std::slice::from_ref(note))
    }
    /// Upserts all notes in one transaction.
    fn put_many(&mut self, notes: &[Note]) -> StoreResult<()>;
    /// Deletes one note and cascades edge/favorite cleanup.
    ///
    /// Returns `false` when the note did not exist.
    fn delete(&mut self, id: &NoteId) -> StoreResult<bool>;
    /// Sets the favorite flag and list membership together.
    ///
    /// Returns the updated note, or `None` when it does not exist.
    fn set_favorite(&mut self, id: &NoteId, favorite: bool) -> StoreResult<Option<Note>> {
        let Some(mut note) = self.get(id)? else {
            return Ok(None);
        };
        if note.is_favorite != favorite {
            note.is_favorite = favorite;
            self.put(&note)?;
        }
        Ok(Some(note))
    }
    /// Replaces the whole note set (favorites included) in one transaction.
    fn replace_all(&mut self, notes: &[Note]) -> StoreResult<()>;
    fn get_meta(&self, key: MetaKey) -> StoreResult<Option<String>>;
    fn set_meta(&mut self, key: MetaKey, value: &str) -> StoreResult<()>;
    fn delete_meta(&mut self, key: MetaKey) -> StoreResult<()>;
}

/// SQLite-backed note store. Owns the vault connection.
pub struct SqliteNoteStore {
    conn: Connection,
}

impl SqliteNoteStore {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        let actual_version = current_user_version(&conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(StoreError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }

    /// Read access for query helpers (search) that work on the raw connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl NoteStore for SqliteNoteStore {
    fn get(&self, id: &NoteId) -> StoreResult<Option<Note>> {
        load_note(&self.conn, id)
    }

    fn batch_get(&self, ids: &[NoteId]) -> StoreResult<Vec<Option<Note>>> {
        ids.iter().map(|id| load_note(&self.conn, id)).collect()
    }

    fn find_by_reverse_edge(&self, target: &NoteId) -> StoreResult<Vec<Note>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{NOTE_SELECT_SQL}
             WHERE id IN (SELECT source_id FROM note_links WHERE target_id = ?1)
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([target.as_str()])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(&self.conn, row)?);
        }
        Ok(notes)
    }

    fn count(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))?;
        u64::try_from(count).map_err(|_| StoreError::InvalidData(format!("negative count {count}")))
    }

    fn first_note_id(&self) -> StoreResult<Option<NoteId>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM notes ORDER BY created_at ASC, id ASC LIMIT 1;",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(id.map(NoteId::from))
    }

    fn list_all(&self) -> StoreResult<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} ORDER BY created_at ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(&self.conn, row)?);
        }
        Ok(notes)
    }

    fn put_many(&mut self, notes: &[Note]) -> StoreResult<()> {
        if notes.is_empty() {
            return Ok(());
        }
        for note in notes {
            note.validate()?;
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        write_notes(&tx, notes)?;
        tx.commit()?;
        Ok(())
    }

    fn delete(&mut self, id: &NoteId) -> StoreResult<bool> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Neighbours lose an edge, so they count as modified.
        tx.execute(
            "UPDATE notes
             SET modified_at = MAX(modified_at, ?2)
             WHERE id IN (
                SELECT source_id FROM note_links WHERE target_id = ?1
                UNION
                SELECT source_id FROM note_relations WHERE target_id = ?1
             );",
            params![id.as_str(), now_epoch_ms()],
        )?;
        let changed = tx.execute("DELETE FROM notes WHERE id = ?1;", [id.as_str()])?;

        let mut favorites = read_favorites(&tx)?;
        let before = favorites.len();
        favorites.retain(|favorite| favorite != id);
        if favorites.len() != before {
            write_meta(&tx, MetaKey::Favorites, &encode_favorites(&favorites)?)?;
        }

        tx.commit()?;
        Ok(changed > 0)
    }

    fn replace_all(&mut self, notes: &[Note]) -> StoreResult<()> {
        for note in notes {
            note.validate()?;
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM notes;", [])?;
        tx.execute(
            "DELETE FROM metadata WHERE key = ?1;",
            [MetaKey::Favorites.as_str()],
        )?;
        write_notes(&tx, notes)?;
        tx.commit()?;
        Ok(())
    }

    fn get_meta(&self, key: MetaKey) -> StoreResult<Option<String>> {
        read_meta(&self.conn, key)
    }

    fn set_meta(&mut self, key: MetaKey, value: &str) -> StoreResult<()> {
        write_meta(&self.conn, key, value)
    }

    fn delete_meta(&mut self, key: MetaKey) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM metadata WHERE key = ?1;", [key.as_str()])?;
        Ok(())
    }
}

fn write_notes(conn: &Connection, notes: &[Note]) -> StoreResult<()> {
    for note in notes {
        upsert_note_row(conn, note)?;
    }
    for note in notes {
        replace_edges(conn, "note_links", &note.id, &note.links_to)?;
        replace_edges(conn, "note_relations", &note.id, &note.related_to)?;
    }
    sync_favorites(conn, notes)
}

fn upsert_note_row(conn: &Connection, note: &Note) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO notes (
            id,
            title,
            content,
            is_favorite,
            created_at,
            modified_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT (id) DO UPDATE SET
            title = excluded.title,
            content = excluded.content,
            is_favorite = excluded.is_favorite,
            created_at = excluded.created_at,
            modified_at = excluded.modified_at;",
        params![
            note.id.as_str(),
            note.title.as_str(),
            note.content.as_str(),
            bool_to_int(note.is_favorite),
            note.created_at,
            note.modified_at,
        ],
    )?;
    Ok(())
}

fn replace_edges(
    conn: &Connection,
    table: &'static str,
    source: &NoteId,
    targets: &BTreeSet<NoteId>,
) -> StoreResult<()> {
    conn.execute(
        &format!("DELETE FROM {table} WHERE source_id = ?1;"),
        [source.as_str()],
    )?;
    let mut insert = conn.prepare_cached(&format!(
        "INSERT OR IGNORE INTO {table} (source_id, target_id)
         SELECT ?1, id
         FROM notes
         WHERE id = ?2;"
    ))?;
    for target in targets {
        insert.execute(params![source.as_str(), target.as_str()])?;
    }
    Ok(())
}

fn sync_favorites(conn: &Connection, notes: &[Note]) -> StoreResult<()> {
    let mut favorites = read_favorites(conn)?;
    let original = favorites.clone();
    for note in notes {
        let listed = favorites.contains(&note.id);
        if note.is_favorite && !listed {
            favorites.push(note.id.clone());
        } else if !note.is_favorite && listed {
            favorites.retain(|id| id != &note.id);
        }
    }
    if favorites != original {
        write_meta(conn, MetaKey::Favorites, &encode_favorites(&favorites)?)?;
    }
    Ok(())
}

fn read_favorites(conn: &Connection) -> StoreResult<Vec<NoteId>> {
    match read_meta(conn, MetaKey::Favorites)? {
        Some(raw) => decode_favorites(&raw),
        None => Ok(Vec::new()),
    }
}

fn read_meta(conn: &Connection, key: MetaKey) -> StoreResult<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1;",
            [key.as_str()],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(value)
}

fn write_meta(conn: &Connection, key: MetaKey, value: &str) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO metadata (key, value) VALUES (?1, ?2)
         ON CONFLICT (key) DO UPDATE SET value = excluded.value;",
        params![key.as_str(), value],
    )?;
    Ok(())
}

fn load_note(conn: &Connection, id: &NoteId) -> StoreResult<Option<Note>> {
    let mut stmt = conn.prepare_cached(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.as_str()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_note_row(conn, row)?)),
        None => Ok(None),
    }
}

fn load_edge_targets(
    conn: &Connection,
    table: &'static str,
    source: &str,
) -> StoreResult<BTreeSet<NoteId>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT target_id FROM {table} WHERE source_id = ?1;"
    ))?;
    let mut rows = stmt.query([source])?;
    let mut targets = BTreeSet::new();
    while let Some(row) = rows.next()? {
        targets.insert(NoteId::from(row.get::<_, String>(0)?));
    }
    Ok(targets)
}

fn parse_note_row(conn: &Connection, row: &Row<'_>) -> StoreResult<Note> {
    let id_text: String = row.get("id")?;
    let is_favorite = match row.get::<_, i64>("is_favorite")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid is_favorite value `{other}` in notes.is_favorite"
            )));
        }
    };

    let note = Note {
        links_to: load_edge_targets(conn, "note_links", &id_text)?,
        related_to: load_edge_targets(conn, "note_relations", &id_text)?,
        id: NoteId::from(id_text),
        title: row.get("title")?,
        content: row.get("content")?,
        is_favorite,
        created_at: row.get("created_at")?,
        modified_at: row.get("modified_at")?,
    };
    note.validate()?;
    Ok(note)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
