//! Ranked substring search over note titles.
//!
//! # Invariants
//! - A prefix match beats a word-start match, which beats a plain substring.
//! - Within a tier, earlier match position wins, then shorter title.
//! - Ordering is total (ties broken by lowercase title, then id).

use crate::model::note::NoteId;
use crate::search::SearchResult;
use rusqlite::Connection;

/// How a title matched the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    Prefix,
    WordStart,
    Substring,
}

/// Single title search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleHit {
    pub id: NoteId,
    pub title: String,
    pub tier: MatchTier,
    /// Byte offset of the first match in the lowercased title.
    pub position: usize,
}

/// Searches titles and returns at most `limit` ranked hits.
///
/// Returns an empty list for blank queries or a zero limit.
pub fn search_titles(conn: &Connection, query: &str, limit: u32) -> SearchResult<Vec<TitleHit>> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() || limit == 0 {
        return Ok(Vec::new());
    }

    // SQLite folds ASCII case only, so every title is scored here.
    let mut stmt = conn.prepare_cached("SELECT id, title FROM notes;")?;
    let mut rows = stmt.query([])?;

    let mut hits = Vec::new();
    while let Some(row) = rows.next()? {
        let id: String = row.get(0)?;
        let title: String = row.get(1)?;
        if let Some((tier, position)) = score_title(&title, &needle) {
            hits.push(TitleHit {
                id: NoteId::from(id),
                title,
                tier,
                position,
            });
        }
    }

    hits.sort_by_cached_key(|hit| {
        (
            hit.tier,
            hit.position,
            hit.title.chars().count(),
            hit.title.to_lowercase(),
            hit.id.clone(),
        )
    });
    hits.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    Ok(hits)
}

/// Scores one title against an already-lowercased needle.
///
/// Returns `None` when the title does not contain the needle.
pub fn score_title(title: &str, needle: &str) -> Option<(MatchTier, usize)> {
    if needle.is_empty() {
        return None;
    }
    let haystack = title.to_lowercase();
    let position = haystack.find(needle)?;
    if position == 0 {
        return Some((MatchTier::Prefix, 0));
    }

    let word_start = haystack.match_indices(needle).any(|(index, _)| {
        haystack[..index]
            .chars()
            .next_back()
            .is_some_and(|previous| !previous.is_alphanumeric())
    });
    let tier = if word_start {
        MatchTier::WordStart
    } else {
        MatchTier::Substring
    };
    Some((tier, position))
}
