use notegraph_core::db::open_db_in_memory;
use notegraph_core::{
    compute_topology, Note, NoteId, NoteStore, SortPolicy, SqliteNoteStore, Topology,
};

fn store() -> SqliteNoteStore {
    SqliteNoteStore::try_new(open_db_in_memory().unwrap()).unwrap()
}

fn note(id: &str, title: &str) -> Note {
    Note::with_id(NoteId::from(id), title)
}

fn ids(notes: &[Note]) -> Vec<&str> {
    notes.iter().map(|note| note.id.as_str()).collect()
}

fn view(store: &SqliteNoteStore, focal: &str) -> Topology {
    compute_topology(store, &NoteId::from(focal))
        .unwrap()
        .sorted(SortPolicy::Title)
}

#[test]
fn hub_children_see_each_other_as_righters() {
    let mut store = store();
    let mut hub = note("hub", "Hub");
    let a = note("a", "A");
    let b = note("b", "B");
    let c = note("c", "C");
    hub.links_to.extend([a.id.clone(), b.id.clone(), c.id.clone()]);
    store.put_many(&[hub, a, b, c]).unwrap();

    let hub_view = view(&store, "hub");
    assert_eq!(ids(&hub_view.downers), vec!["a", "b", "c"]);
    assert!(hub_view.uppers.is_empty());
    assert!(hub_view.righters.is_empty());

    let a_view = view(&store, "a");
    assert_eq!(ids(&a_view.uppers), vec!["hub"]);
    assert_eq!(ids(&a_view.righters), vec!["b", "c"]);
    assert!(a_view.downers.is_empty());
    assert!(a_view.lefters.is_empty());
}

#[test]
fn siblings_shared_by_several_parents_appear_once() {
    let mut store = store();
    let mut a = note("a", "A");
    let mut b = note("b", "B");
    let c = note("c", "C");
    let d = note("d", "D");
    let e = note("e", "E");
    a.links_to.extend([c.id.clone(), d.id.clone()]);
    b.links_to.extend([c.id.clone(), d.id.clone(), e.id.clone()]);
    store.put_many(&[a, b, c, d, e]).unwrap();

    let c_view = view(&store, "c");
    assert_eq!(ids(&c_view.uppers), vec!["a", "b"]);
    assert_eq!(ids(&c_view.righters), vec!["d", "e"]);
    assert!(!c_view.righters.iter().any(|note| note.id.as_str() == "c"));
}

#[test]
fn lateral_edges_show_on_both_sides() {
    let mut store = store();
    let mut a = note("a", "A");
    let mut b = note("b", "B");
    a.related_to.insert(b.id.clone());
    b.related_to.insert(a.id.clone());
    store.put_many(&[a, b]).unwrap();

    assert_eq!(ids(&view(&store, "a").lefters), vec!["b"]);
    assert_eq!(ids(&view(&store, "b").lefters), vec!["a"]);
}

#[test]
fn cycles_are_tolerated() {
    let mut store = store();
    let mut a = note("a", "A");
    let mut b = note("b", "B");
    a.links_to.insert(b.id.clone());
    b.links_to.insert(a.id.clone());
    store.put_many(&[a, b]).unwrap();

    let a_view = view(&store, "a");
    assert_eq!(ids(&a_view.uppers), vec!["b"]);
    assert_eq!(ids(&a_view.downers), vec!["b"]);
    assert!(a_view.righters.is_empty());
}

#[test]
fn unknown_focal_yields_empty_topology() {
    let store = store();
    let topology = view(&store, "missing");
    assert!(topology.is_empty());
    assert!(topology.uppers.is_empty() && topology.downers.is_empty());
}

#[test]
fn dangling_targets_are_dropped_on_write() {
    let mut store = store();
    let mut a = note("a", "A");
    a.links_to.insert(NoteId::from("ghost"));
    store.put(&a).unwrap();

    let stored = store.get(&a.id).unwrap().unwrap();
    assert!(stored.links_to.is_empty());
    assert!(view(&store, "a").downers.is_empty());
}

#[test]
fn sort_policy_orders_every_list() {
    let mut store = store();
    let mut hub = note("hub", "Hub");
    let mut older = note("x", "zeta");
    older.created_at = 1;
    older.modified_at = 50;
    let mut newer = note("y", "Alpha");
    newer.created_at = 2;
    newer.modified_at = 10;
    hub.links_to.extend([older.id.clone(), newer.id.clone()]);
    store.put_many(&[hub, older, newer]).unwrap();

    let by = |policy| {
        compute_topology(&store, &NoteId::from("hub"))
            .unwrap()
            .sorted(policy)
    };
    assert_eq!(ids(&by(SortPolicy::Title).downers), vec!["y", "x"]);
    assert_eq!(ids(&by(SortPolicy::Created).downers), vec!["x", "y"]);
    assert_eq!(ids(&by(SortPolicy::Modified).downers), vec!["x", "y"]);
}

#[test]
fn date_chain_shows_only_adjacent_levels() {
    let mut store = store();
    let mut hub = note("hub", "Hub");
    let mut year = note("2024", "2024");
    let mut month = note("2024-05", "2024-05");
    let day = note("2024-05-10", "2024-05-10");
    hub.links_to.insert(year.id.clone());
    year.links_to.insert(month.id.clone());
    month.links_to.insert(day.id.clone());
    store.put_many(&[hub, year, month, day]).unwrap();

    let month_view = view(&store, "2024-05");
    assert_eq!(ids(&month_view.uppers), vec!["2024"]);
    assert_eq!(ids(&month_view.downers), vec!["2024-05-10"]);
    assert!(month_view.righters.is_empty());
    assert!(month_view.lefters.is_empty());
    assert!(!month_view.contains(&NoteId::from("hub")));
}

#[test]
fn an_upper_is_a_righter_only_when_another_upper_links_it() {
    let mut store = store();
    let mut p = note("p", "P");
    let mut q = note("q", "Q");
    let focal = note("f", "F");
    p.links_to.insert(focal.id.clone());
    q.links_to.insert(focal.id.clone());
    store.put_many(&[p.clone(), q.clone(), focal]).unwrap();

    let before = view(&store, "f");
    assert_eq!(ids(&before.uppers), vec!["p", "q"]);
    assert!(before.righters.is_empty());

    q.links_to.insert(p.id.clone());
    store.put(&q).unwrap();

    let after = view(&store, "f");
    assert_eq!(ids(&after.uppers), vec!["p", "q"]);
    assert_eq!(ids(&after.righters), vec!["p"]);
}

#[test]
fn converging_parents_and_a_rootless_upper() {
    let mut store = store();
    let mut a = note("a", "A");
    let mut b = note("b", "B");
    let c = note("c", "C");
    let d = note("d", "D");
    a.links_to.extend([c.id.clone(), d.id.clone()]);
    b.links_to.insert(c.id.clone());
    store.put_many(&[a, b, c, d]).unwrap();

    assert_eq!(ids(&view(&store, "c").uppers), vec!["a", "b"]);

    let a_view = view(&store, "a");
    assert_eq!(ids(&a_view.downers), vec!["c", "d"]);
    assert!(a_view.uppers.is_empty());
    assert!(a_view.righters.is_empty());
}

