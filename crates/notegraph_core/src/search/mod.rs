//! Search entry points consumed by navigation and linking flows.
//!
//! # Responsibility
//! - Ranked title search for pickers and quick-open.
//! - Full-text content search backed by SQLite FTS5.
//! - Debouncing for search-as-you-type.

use crate::db::DbError;
use crate::repo::note_repo::SqliteNoteStore;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod debounce;
pub mod fts;
pub mod title;

use fts::{ContentHit, ContentQuery};
use title::TitleHit;

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for query parsing, DB interaction and result decoding.
#[derive(Debug)]
pub enum SearchError {
    /// User-provided query cannot be parsed by FTS5 syntax.
    InvalidQuery {
        query: String,
        message: String,
    },
    Db(DbError),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid full-text query `{query}`: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidQuery { .. } => None,
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Search collaborator contract.
pub trait SearchIndex {
    fn search_titles(&self, query: &str, limit: u32) -> SearchResult<Vec<TitleHit>>;
    fn search_content(&self, query: &ContentQuery) -> SearchResult<Vec<ContentHit>>;
}

impl SearchIndex for SqliteNoteStore {
    fn search_titles(&self, query: &str, limit: u32) -> SearchResult<Vec<TitleHit>> {
        title::search_titles(self.connection(), query, limit)
    }

    fn search_content(&self, query: &ContentQuery) -> SearchResult<Vec<ContentHit>> {
        fts::search_content(self.connection(), query)
    }
}
