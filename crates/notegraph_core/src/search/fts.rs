//! SQLite FTS5-based full-text search over note titles and content.
//!
//! # Invariants
//! - The FTS index is maintained by triggers; deleted notes never match.
//! - Result ordering is deterministic by rank, `modified_at`, then id.

use crate::db::DbError;
use crate::model::note::NoteId;
use crate::search::{SearchError, SearchResult};
use rusqlite::{params, Connection, Row};

const CONTENT_DEFAULT_LIMIT: u32 = 20;

/// Search options for full-text query behavior.
#[derive(Debug, Clone)]
pub struct ContentQuery {
    pub text: String,
    pub limit: u32,
    /// Pass `text` through as a raw FTS5 expression.
    ///
    /// Off by default so search-as-you-type never trips on syntax errors.
    pub raw_fts_syntax: bool,
}

impl ContentQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: CONTENT_DEFAULT_LIMIT,
            raw_fts_syntax: false,
        }
    }
}

/// Single full-text hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHit {
    pub id: NoteId,
    pub title: String,
    pub snippet: String,
}

/// Searches note titles and bodies via FTS5.
///
/// Returns an empty list for blank queries.
pub fn search_content(conn: &Connection, query: &ContentQuery) -> SearchResult<Vec<ContentHit>> {
    let Some(match_expr) = build_match_expression(query) else {
        return Ok(Vec::new());
    };
    if query.limit == 0 {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(
        "SELECT
            notes.id AS id,
            notes.title AS title,
            snippet(notes_fts, 1, '[', ']', ' ... ', 10) AS snippet
         FROM notes_fts
         JOIN notes ON notes.rowid = notes_fts.rowid
         WHERE notes_fts MATCH ?1
         ORDER BY bm25(notes_fts), notes.modified_at DESC, notes.id ASC
         LIMIT ?2;",
    )?;
    let mut rows = stmt
        .query(params![match_expr, i64::from(query.limit)])
        .map_err(|err| map_query_error(err, &match_expr))?;

    let mut hits = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|err| map_query_error(err, &match_expr))?
    {
        hits.push(parse_content_hit(row)?);
    }
    Ok(hits)
}

fn parse_content_hit(row: &Row<'_>) -> SearchResult<ContentHit> {
    Ok(ContentHit {
        id: NoteId::from(row.get::<_, String>("id")?),
        title: row.get("title")?,
        snippet: row.get("snippet")?,
    })
}

fn build_match_expression(query: &ContentQuery) -> Option<String> {
    let text = query.text.trim();
    if text.is_empty() {
        return None;
    }
    if query.raw_fts_syntax {
        return Some(text.to_string());
    }

    let terms = text
        .split_whitespace()
        .map(escape_fts_term)
        .collect::<Vec<_>>();
    Some(terms.join(" AND "))
}

fn escape_fts_term(raw: &str) -> String {
    format!("\"{}\"", raw.replace('"', "\"\""))
}

fn map_query_error(err: rusqlite::Error, query: &str) -> SearchError {
    if is_match_syntax_error(&err) {
        return SearchError::InvalidQuery {
            query: query.to_string(),
            message: err.to_string(),
        };
    }
    SearchError::Db(DbError::Sqlite(err))
}

fn is_match_syntax_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            let msg = message.to_lowercase();
            (msg.contains("fts5") && msg.contains("syntax"))
                || msg.contains("malformed match expression")
                || msg.contains("unterminated")
        }
        _ => false,
    }
}
