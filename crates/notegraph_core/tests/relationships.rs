use notegraph_core::db::open_db_in_memory;
use notegraph_core::graph::relationship::set_relationship;
use notegraph_core::{
    compute_topology, Note, NoteId, NoteStore, RelationKind, SkipReason, SqliteNoteStore,
    Topology,
};

fn store_with(titles: &[&str]) -> SqliteNoteStore {
    let mut store = SqliteNoteStore::try_new(open_db_in_memory().unwrap()).unwrap();
    let notes: Vec<Note> = titles
        .iter()
        .map(|title| Note::with_id(NoteId::from(title.to_lowercase()), *title))
        .collect();
    store.put_many(&notes).unwrap();
    store
}

fn id(raw: &str) -> NoteId {
    NoteId::from(raw)
}

fn topology(store: &SqliteNoteStore, raw: &str) -> Topology {
    compute_topology(store, &id(raw)).unwrap()
}

fn has(notes: &[Note], raw: &str) -> bool {
    notes.iter().any(|note| note.id.as_str() == raw)
}

fn load(store: &SqliteNoteStore, raw: &str) -> Note {
    store.get(&id(raw)).unwrap().unwrap()
}

#[test]
fn parent_makes_target_link_to_source() {
    let mut store = store_with(&["A", "B"]);
    let report = set_relationship(&mut store, &id("a"), &[id("b")], RelationKind::Parent).unwrap();

    assert_eq!(report.applied, vec![id("b")]);
    assert!(load(&store, "b").links_to.contains(&id("a")));
    assert!(load(&store, "a").links_to.is_empty());
}

#[test]
fn each_pair_holds_at_most_one_relation() {
    let mut store = store_with(&["A", "B"]);
    let (a, b) = (id("a"), id("b"));

    set_relationship(&mut store, &a, &[b.clone()], RelationKind::Parent).unwrap();
    set_relationship(&mut store, &a, &[b.clone()], RelationKind::Child).unwrap();
    assert!(load(&store, "a").links_to.contains(&b));
    assert!(load(&store, "b").links_to.is_empty());

    set_relationship(&mut store, &a, &[b.clone()], RelationKind::Lateral).unwrap();
    let (a_note, b_note) = (load(&store, "a"), load(&store, "b"));
    assert!(a_note.links_to.is_empty() && b_note.links_to.is_empty());
    assert!(a_note.related_to.contains(&b));
    assert!(b_note.related_to.contains(&a));

    set_relationship(&mut store, &a, &[b.clone()], RelationKind::Unlink).unwrap();
    let (a_note, b_note) = (load(&store, "a"), load(&store, "b"));
    assert!(a_note.related_to.is_empty() && b_note.related_to.is_empty());
}

#[test]
fn reapplying_same_kind_is_idempotent() {
    let mut store = store_with(&["A", "B"]);
    set_relationship(&mut store, &id("a"), &[id("b")], RelationKind::Child).unwrap();
    let first = (load(&store, "a"), load(&store, "b"));

    let first_view = topology(&store, "a");

    let report = set_relationship(&mut store, &id("a"), &[id("b")], RelationKind::Child).unwrap();
    assert_eq!(report.applied, vec![id("b")]);
    assert_eq!((load(&store, "a"), load(&store, "b")), first);
    assert_eq!(topology(&store, "a"), first_view);
}

#[test]
fn parent_replaces_an_existing_lateral_edge() {
    let mut store = store_with(&["A", "B"]);
    set_relationship(&mut store, &id("a"), &[id("b")], RelationKind::Lateral).unwrap();
    set_relationship(&mut store, &id("a"), &[id("b")], RelationKind::Parent).unwrap();

    let (a, b) = (load(&store, "a"), load(&store, "b"));
    assert!(a.related_to.is_empty() && b.related_to.is_empty());
    assert!(b.links_to.contains(&id("a")));
    assert!(topology(&store, "a").lefters.is_empty());
    assert!(has(&topology(&store, "a").uppers, "b"));
}

#[test]
fn self_and_missing_targets_are_skipped() {
    let mut store = store_with(&["A", "B"]);
    let report = set_relationship(
        &mut store,
        &id("a"),
        &[id("a"), id("ghost"), id("b"), id("b")],
        RelationKind::Child,
    )
    .unwrap();

    assert_eq!(report.applied, vec![id("b")]);
    assert_eq!(
        report.skipped,
        vec![
            (id("a"), SkipReason::SelfTarget),
            (id("ghost"), SkipReason::NotFound)
        ]
    );
    assert_eq!(
        load(&store, "a").links_to.into_iter().collect::<Vec<_>>(),
        vec![id("b")]
    );
}

#[test]
fn bulk_apply_touches_every_target() {
    let mut store = store_with(&["Hub", "X", "Y", "Z"]);
    let targets = [id("x"), id("y"), id("z")];
    let report = set_relationship(&mut store, &id("hub"), &targets, RelationKind::Child).unwrap();

    assert_eq!(report.applied.len(), 3);
    let hub = load(&store, "hub");
    assert!(targets.iter().all(|target| hub.links_to.contains(target)));
}

#[test]
fn deleting_a_note_removes_edges_and_favorite_entry() {
    let mut store = store_with(&["A", "B"]);
    set_relationship(&mut store, &id("a"), &[id("b")], RelationKind::Lateral).unwrap();
    let mut b = load(&store, "b");
    b.is_favorite = true;
    store.put(&b).unwrap();
    assert_eq!(notegraph_core::repo::meta::load_favorites(&store).unwrap(), vec![id("b")]);

    assert!(store.delete(&id("b")).unwrap());
    assert!(!store.delete(&id("b")).unwrap());

    assert!(load(&store, "a").related_to.is_empty());
    assert!(notegraph_core::repo::meta::load_favorites(&store).unwrap().is_empty());
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn relations_show_up_on_both_topologies() {
    let mut store = store_with(&["A", "B", "C", "D"]);
    set_relationship(&mut store, &id("a"), &[id("b")], RelationKind::Parent).unwrap();
    set_relationship(&mut store, &id("a"), &[id("c")], RelationKind::Child).unwrap();
    set_relationship(&mut store, &id("a"), &[id("d")], RelationKind::Lateral).unwrap();

    let a = topology(&store, "a");
    assert!(has(&a.uppers, "b"));
    assert!(has(&a.downers, "c"));
    assert!(has(&a.lefters, "d"));

    assert!(load(&store, "a").related_to.iter().all(|other| other != &id("b")));
    assert!(load(&store, "b").related_to.is_empty());
    assert!(has(&topology(&store, "b").downers, "a"));
    assert!(has(&topology(&store, "c").uppers, "a"));
    assert!(has(&topology(&store, "d").lefters, "a"));
}

#[test]
fn deleted_note_disappears_from_every_neighbour() {
    let mut store = store_with(&["Parent", "X", "Child", "Peer", "Sibling"]);
    set_relationship(&mut store, &id("x"), &[id("parent")], RelationKind::Parent).unwrap();
    set_relationship(&mut store, &id("x"), &[id("child")], RelationKind::Child).unwrap();
    set_relationship(&mut store, &id("x"), &[id("peer")], RelationKind::Lateral).unwrap();
    set_relationship(&mut store, &id("parent"), &[id("sibling")], RelationKind::Child).unwrap();
    assert!(topology(&store, "sibling").contains(&id("x")));

    assert!(store.delete(&id("x")).unwrap());

    for neighbour in ["parent", "child", "peer", "sibling"] {
        assert!(
            !topology(&store, neighbour).contains(&id("x")),
            "{neighbour} still lists x"
        );
    }
}

