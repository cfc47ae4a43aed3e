//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the graph session (open vault, view, key events, link and edit
//!   commands, search, import/export) to Dart via FRB.
//! - Flatten core types into plain string/number envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - One session is active per process; opening a vault replaces it.
//! - Failures are reported in envelopes, never thrown.

use notegraph_core::search::debounce::SearchDebouncer;
use notegraph_core::search::title::TitleHit;
use notegraph_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Direction, GraphService, ImportMode, NavEvent, Note, NoteId, RelationKind, Section,
    SqliteNoteStore, Vault,
};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

const SEARCH_DEFAULT_LIMIT: u32 = 20;
const SEARCH_LIMIT_MAX: u32 = 50;
const VAULT_DIR_ENV: &str = "NOTEGRAPH_VAULT_DIR";
const VAULT_DIR_NAME: &str = "notegraph_vaults";

static VAULT_DIR: OnceLock<PathBuf> = OnceLock::new();
static SESSION: Mutex<Option<Session>> = Mutex::new(None);

/// Active vault session plus the search box state bound to it.
struct Session {
    service: GraphService<SqliteNoteStore>,
    search: SearchDebouncer,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Flat note projection for list rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    pub id: String,
    pub title: String,
    pub is_favorite: bool,
    pub has_content: bool,
    pub selected: bool,
}

/// Everything the graph screen renders for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphView {
    pub center: Option<NoteItem>,
    pub content: Option<String>,
    pub uppers: Vec<NoteItem>,
    pub downers: Vec<NoteItem>,
    pub lefters: Vec<NoteItem>,
    pub righters: Vec<NoteItem>,
    /// Empty when favorites are hidden.
    pub favorites: Vec<NoteItem>,
    /// `center|up|down|left|right|favs|content`.
    pub focused_section: String,
    pub focused_index: u32,
    pub font_size: u16,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Note the action produced or acted on, when there is one.
    pub note_id: Option<String>,
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, note_id: Option<String>) -> Self {
        Self {
            ok: true,
            note_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            note_id: None,
            message: message.into(),
        }
    }
}

/// Opens (or creates) a vault and makes it the active session.
///
/// `dir` defaults to `$NOTEGRAPH_VAULT_DIR`, then a temp-dir fallback.
#[flutter_rust_bridge::frb(sync)]
pub fn vault_open(dir: Option<String>, name: String) -> ActionResponse {
    let dir = dir
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(resolve_vault_dir);

    let opened = Vault::open(&dir, &name)
        .map_err(|err| err.to_string())
        .and_then(|vault| GraphService::open(vault.into_store()).map_err(|err| err.to_string()));
    match opened {
        Ok(service) => {
            let center = service.center_id().map(NoteId::to_string);
            match SESSION.lock() {
                Ok(mut session) => {
                    *session = Some(Session {
                        service,
                        search: SearchDebouncer::default(),
                    });
                    ActionResponse::success("Vault opened.", center)
                }
                Err(_) => ActionResponse::failure("vault_open failed: session lock poisoned"),
            }
        }
        Err(err) => ActionResponse::failure(format!("vault_open failed: {err}")),
    }
}

/// Lists vault names in the default vault directory.
#[flutter_rust_bridge::frb(sync)]
pub fn vault_list() -> Vec<String> {
    notegraph_core::vault::list_vaults(resolve_vault_dir()).unwrap_or_default()
}

/// Closes the active session, if any.
#[flutter_rust_bridge::frb(sync)]
pub fn vault_close() {
    if let Ok(mut session) = SESSION.lock() {
        *session = None;
    }
}

/// Snapshot of the current graph screen.
///
/// Returns `None` when no vault is open.
#[flutter_rust_bridge::frb(sync)]
pub fn graph_view() -> Option<GraphView> {
    let session = SESSION.lock().ok()?;
    session.as_ref().map(|session| build_view(&session.service))
}

/// Feeds one keyboard event to the navigation automaton.
///
/// `key` is `<verb>[_<direction>]`, e.g. `move_up`, `extend_left`, `link_down`,
/// `open`, `return`, `toggle_select`, `clear_selection`, `unlink`, `delete`.
/// `items_per_column` is the wrap height of the rendered side columns.
#[flutter_rust_bridge::frb(sync)]
pub fn graph_key(key: String, items_per_column: u32) -> ActionResponse {
    let Some(event) = parse_nav_event(&key) else {
        return ActionResponse::failure(format!("graph_key failed: unknown key `{key}`"));
    };
    let per_column = usize::try_from(items_per_column.max(1)).unwrap_or(usize::MAX);
    let layout = move |_section: Section| per_column;
    with_session("graph_key", |service| {
        service.apply(event, &layout).map_err(|err| err.to_string())?;
        Ok(ActionResponse::success(
            "ok",
            service.center_id().map(NoteId::to_string),
        ))
    })
}

/// Recenters on a note picked by id.
#[flutter_rust_bridge::frb(sync)]
pub fn graph_recenter(note_id: String) -> ActionResponse {
    with_session("graph_recenter", |service| {
        let id = NoteId::from(note_id.trim());
        service.recenter(&id).map_err(|err| err.to_string())?;
        Ok(ActionResponse::success("Recentered.", Some(id.to_string())))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn graph_go_home() -> ActionResponse {
    with_session("graph_go_home", |service| {
        service.go_home().map_err(|err| err.to_string())?;
        Ok(ActionResponse::success(
            "Recentered on home.",
            service.center_id().map(NoteId::to_string),
        ))
    })
}

/// Creates notes from `;`-separated titles and links them to the center.
///
/// `relation` is `parent|child|lateral`; `unlink` is refused.
#[flutter_rust_bridge::frb(sync)]
pub fn graph_link_titles(titles: String, relation: String) -> ActionResponse {
    let Some(kind) = parse_relation(&relation) else {
        return ActionResponse::failure(format!(
            "graph_link_titles failed: unknown relation `{relation}`"
        ));
    };
    with_session("graph_link_titles", |service| {
        let created = service
            .link_new_titles(&titles, kind)
            .map_err(|err| err.to_string())?;
        Ok(ActionResponse::success(
            format!("Created {} note(s).", created.len()),
            created.first().map(|note| note.id.to_string()),
        ))
    })
}

/// Links existing notes to the center. `relation` also accepts `unlink`.
#[flutter_rust_bridge::frb(sync)]
pub fn graph_link_existing(note_ids: Vec<String>, relation: String) -> ActionResponse {
    let Some(kind) = parse_relation(&relation) else {
        return ActionResponse::failure(format!(
            "graph_link_existing failed: unknown relation `{relation}`"
        ));
    };
    let targets: Vec<NoteId> = note_ids.iter().map(|id| NoteId::from(id.trim())).collect();
    with_session("graph_link_existing", |service| {
        let report = service
            .link_existing(&targets, kind)
            .map_err(|err| err.to_string())?;
        Ok(ActionResponse::success(
            format!(
                "Applied {} link(s), skipped {}.",
                report.applied.len(),
                report.skipped.len()
            ),
            None,
        ))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn note_rename(note_id: String, title: String) -> ActionResponse {
    with_session("note_rename", |service| {
        let note = service
            .rename_note(&NoteId::from(note_id.trim()), &title)
            .map_err(|err| err.to_string())?;
        Ok(ActionResponse::success("Renamed.", Some(note.id.to_string())))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn note_edit_content(note_id: String, content: String) -> ActionResponse {
    with_session("note_edit_content", |service| {
        let note = service
            .edit_content(&NoteId::from(note_id.trim()), &content)
            .map_err(|err| err.to_string())?;
        Ok(ActionResponse::success("Saved.", Some(note.id.to_string())))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn note_toggle_favorite(note_id: String) -> ActionResponse {
    with_session("note_toggle_favorite", |service| {
        let id = NoteId::from(note_id.trim());
        let favorite = service
            .toggle_favorite(&id)
            .map_err(|err| err.to_string())?;
        let message = if favorite {
            "Added to favorites."
        } else {
            "Removed from favorites."
        };
        Ok(ActionResponse::success(message, Some(id.to_string())))
    })
}

/// Ranked title search over the active vault.
#[flutter_rust_bridge::frb(sync)]
pub fn search_titles(query: String, limit: Option<u32>) -> Vec<NoteItem> {
    let limit = normalize_search_limit(limit);
    let Ok(session) = SESSION.lock() else {
        return Vec::new();
    };
    let Some(session) = session.as_ref() else {
        return Vec::new();
    };
    run_title_search(&session.service, &query, limit)
}

/// Records a search-box keystroke. Results arrive through `search_poll`.
///
/// Returns `false` when no vault is open.
#[flutter_rust_bridge::frb(sync)]
pub fn search_input(query: String) -> bool {
    search_input_at(query, Instant::now())
}

/// Runs the latest typed query once input has paused.
///
/// Returns `None` while the user is still typing or when the query has not
/// changed since the last results.
#[flutter_rust_bridge::frb(sync)]
pub fn search_poll(limit: Option<u32>) -> Option<Vec<NoteItem>> {
    search_poll_at(limit, Instant::now())
}

fn search_input_at(query: String, now: Instant) -> bool {
    let Ok(mut session) = SESSION.lock() else {
        return false;
    };
    match session.as_mut() {
        Some(session) => {
            session.search.push(query, now);
            true
        }
        None => false,
    }
}

fn search_poll_at(limit: Option<u32>, now: Instant) -> Option<Vec<NoteItem>> {
    let mut session = SESSION.lock().ok()?;
    let session = session.as_mut()?;
    let query = session.search.poll(now)?;
    Some(run_title_search(
        &session.service,
        &query,
        normalize_search_limit(limit),
    ))
}

fn run_title_search(
    service: &GraphService<SqliteNoteStore>,
    query: &str,
    limit: u32,
) -> Vec<NoteItem> {
    service
        .search_titles(query, limit)
        .map(|hits| hits.into_iter().map(hit_item).collect())
        .unwrap_or_default()
}

/// Exports every note; the JSON payload is carried in `message`.
#[flutter_rust_bridge::frb(sync)]
pub fn vault_export() -> ActionResponse {
    with_session("vault_export", |service| {
        let payload = service.export().map_err(|err| err.to_string())?;
        Ok(ActionResponse::success(payload, None))
    })
}

/// Imports a JSON payload, merging or overwriting.
#[flutter_rust_bridge::frb(sync)]
pub fn vault_import(payload: String, merge: bool) -> ActionResponse {
    let mode = if merge {
        ImportMode::Merge
    } else {
        ImportMode::Overwrite
    };
    with_session("vault_import", |service| {
        let report = service
            .import(&payload, mode)
            .map_err(|err| err.to_string())?;
        Ok(ActionResponse::success(
            format!(
                "Imported {} note(s), renamed {}.",
                report.imported,
                report.renamed.len()
            ),
            report.batch_note.as_ref().map(NoteId::to_string),
        ))
    })
}

fn with_session(
    op: &str,
    f: impl FnOnce(&mut GraphService<SqliteNoteStore>) -> Result<ActionResponse, String>,
) -> ActionResponse {
    let Ok(mut session) = SESSION.lock() else {
        return ActionResponse::failure(format!("{op} failed: session lock poisoned"));
    };
    let Some(session) = session.as_mut() else {
        return ActionResponse::failure(format!("{op} failed: no vault is open"));
    };
    match f(&mut session.service) {
        Ok(response) => response,
        Err(err) => {
            log::warn!("event=ffi_call module=ffi status=error op={op}");
            ActionResponse::failure(format!("{op} failed: {err}"))
        }
    }
}

fn build_view(service: &GraphService<SqliteNoteStore>) -> GraphView {
    let topology = service.topology();
    let focus = service.focus();
    let settings = service.settings();
    let item = |note: &Note| NoteItem {
        id: note.id.to_string(),
        title: note.title.clone(),
        is_favorite: note.is_favorite,
        has_content: note.has_content(),
        selected: focus.is_selected(&note.id),
    };
    let items = |notes: &[Note]| notes.iter().map(item).collect::<Vec<_>>();

    GraphView {
        center: topology.center.as_ref().map(item),
        content: topology
            .center
            .as_ref()
            .filter(|_| settings.show_content)
            .map(|center| center.content.clone()),
        uppers: items(&topology.uppers),
        downers: items(&topology.downers),
        lefters: items(&topology.lefters),
        righters: items(&topology.righters),
        favorites: if settings.show_favorites {
            items(service.favorites())
        } else {
            Vec::new()
        },
        focused_section: focus.focused.as_str().to_string(),
        focused_index: u32::try_from(focus.index).unwrap_or(u32::MAX),
        font_size: settings.font_size,
    }
}

fn hit_item(hit: TitleHit) -> NoteItem {
    NoteItem {
        id: hit.id.to_string(),
        title: hit.title,
        is_favorite: false,
        has_content: false,
        selected: false,
    }
}

fn parse_nav_event(key: &str) -> Option<NavEvent> {
    let key = key.trim().to_ascii_lowercase();
    let (verb, direction) = match key.split_once('_') {
        Some((verb, rest)) => (verb, parse_direction(rest)),
        None => (key.as_str(), None),
    };
    match (verb, direction) {
        ("move", Some(direction)) => Some(NavEvent::Move(direction)),
        ("extend", Some(direction)) => Some(NavEvent::Extend(direction)),
        ("link", Some(direction)) => Some(NavEvent::LinkAs(direction)),
        _ => match key.as_str() {
            "open" => Some(NavEvent::Open),
            "return" => Some(NavEvent::Return),
            "toggle_select" => Some(NavEvent::ToggleSelectAdvance),
            "clear_selection" => Some(NavEvent::ClearSelection),
            "unlink" => Some(NavEvent::Unlink),
            "delete" => Some(NavEvent::Delete),
            _ => None,
        },
    }
}

fn parse_direction(raw: &str) -> Option<Direction> {
    match raw {
        "up" => Some(Direction::Up),
        "down" => Some(Direction::Down),
        "left" => Some(Direction::Left),
        "right" => Some(Direction::Right),
        _ => None,
    }
}

fn parse_relation(raw: &str) -> Option<RelationKind> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "parent" => Some(RelationKind::Parent),
        "child" => Some(RelationKind::Child),
        "lateral" => Some(RelationKind::Lateral),
        "unlink" => Some(RelationKind::Unlink),
        _ => None,
    }
}

fn normalize_search_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => SEARCH_DEFAULT_LIMIT,
        Some(value) => value.min(SEARCH_LIMIT_MAX),
    }
}

fn resolve_vault_dir() -> PathBuf {
    VAULT_DIR
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(VAULT_DIR_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(VAULT_DIR_NAME)
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, graph_key, graph_link_titles, graph_view, init_logging,
        normalize_search_limit, note_toggle_favorite, parse_nav_event, parse_relation, ping,
        search_input_at, search_poll_at, search_titles, vault_close, vault_export, vault_open,
    };
    use notegraph_core::{Direction, NavEvent, RelationKind};
    use std::time::{Duration, Instant};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn parse_nav_event_understands_verbs_and_directions() {
        assert_eq!(parse_nav_event("move_up"), Some(NavEvent::Move(Direction::Up)));
        assert_eq!(
            parse_nav_event(" Extend_Left "),
            Some(NavEvent::Extend(Direction::Left))
        );
        assert_eq!(
            parse_nav_event("link_down"),
            Some(NavEvent::LinkAs(Direction::Down))
        );
        assert_eq!(
            parse_nav_event("toggle_select"),
            Some(NavEvent::ToggleSelectAdvance)
        );
        assert_eq!(parse_nav_event("clear_selection"), Some(NavEvent::ClearSelection));
        assert_eq!(parse_nav_event("move_sideways"), None);
        assert_eq!(parse_nav_event("jump"), None);
    }

    #[test]
    fn parse_relation_and_limits() {
        assert_eq!(parse_relation("Parent"), Some(RelationKind::Parent));
        assert_eq!(parse_relation("sibling"), None);
        assert_eq!(normalize_search_limit(None), 20);
        assert_eq!(normalize_search_limit(Some(0)), 20);
        assert_eq!(normalize_search_limit(Some(500)), 50);
    }

    // The session is process-global, so the whole flow lives in one test.
    #[test]
    fn session_flow_opens_links_navigates_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let opened = vault_open(Some(dir.path().display().to_string()), "work".to_string());
        assert!(opened.ok, "{}", opened.message);
        let home = opened.note_id.clone().expect("seeded center");

        let view = graph_view().expect("session is open");
        assert_eq!(view.center.as_ref().map(|c| c.title.as_str()), Some("Home"));

        let linked = graph_link_titles("Alpha; Beta".to_string(), "child".to_string());
        assert!(linked.ok, "{}", linked.message);
        let view = graph_view().unwrap();
        let titles: Vec<&str> = view.downers.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Beta"]);

        assert!(graph_key("move_down".to_string(), 10).ok);
        let view = graph_view().unwrap();
        assert_eq!(view.focused_section, "down");
        assert_eq!(view.focused_index, 0);

        let opened_alpha = graph_key("open".to_string(), 10);
        assert!(opened_alpha.ok);
        let view = graph_view().unwrap();
        assert_eq!(view.center.as_ref().unwrap().title, "Alpha");
        assert_eq!(view.uppers[0].id, home);
        assert_eq!(view.righters[0].title, "Beta");

        let fav = note_toggle_favorite(view.center.as_ref().unwrap().id.clone());
        assert!(fav.ok, "{}", fav.message);
        assert_eq!(graph_view().unwrap().favorites.len(), 1);

        let hits = search_titles("be".to_string(), None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Beta");

        let typed_at = Instant::now();
        assert!(search_input_at("a".to_string(), typed_at));
        assert!(search_input_at("alp".to_string(), typed_at + Duration::from_millis(40)));
        assert!(search_poll_at(None, typed_at + Duration::from_millis(60)).is_none());
        let debounced = search_poll_at(None, typed_at + Duration::from_secs(1)).unwrap();
        assert_eq!(debounced.len(), 1);
        assert_eq!(debounced[0].title, "Alpha");
        assert!(search_poll_at(None, typed_at + Duration::from_secs(2)).is_none());

        let refused = graph_link_titles("Orphan".to_string(), "unlink".to_string());
        assert!(!refused.ok);

        let exported = vault_export();
        assert!(exported.ok);
        assert!(exported.message.contains("\"linksTo\""));

        assert!(!graph_key("teleport".to_string(), 10).ok);

        vault_close();
        assert!(graph_view().is_none());
        assert!(!search_input_at("x".to_string(), Instant::now()));
        assert!(!graph_key("move_up".to_string(), 10).ok);
    }
}
