use notegraph_core::db::open_db_in_memory;
use notegraph_core::compute_topology;
use notegraph_core::transfer::{export_json, import_json};
use notegraph_core::{
    GraphService, GraphServiceError, ImportMode, Note, NoteId, NoteStore, RelationKind,
    SqliteNoteStore,
};

fn store() -> SqliteNoteStore {
    SqliteNoteStore::try_new(open_db_in_memory().unwrap()).unwrap()
}

fn session() -> GraphService<SqliteNoteStore> {
    GraphService::open(store()).unwrap()
}

const PAYLOAD: &str = r#"[
  {"id":"hub","title":"Hub","linksTo":["a","b"],"createdAt":1,"modifiedAt":1},
  {"id":"a","title":"A","relatedTo":["b"],"isFavorite":true,"createdAt":2,"modifiedAt":2},
  {"id":"b","title":"B","relatedTo":["a"],"content":"body","createdAt":3,"modifiedAt":3}
]"#;

#[test]
fn export_then_overwrite_reproduces_the_graph() {
    let mut source = store();
    import_json(&mut source, PAYLOAD, ImportMode::Overwrite).unwrap();
    let exported = export_json(&source).unwrap();

    let mut target = store();
    let report = import_json(&mut target, &exported, ImportMode::Overwrite).unwrap();

    assert_eq!(report.imported, 3);
    assert_eq!(target.list_all().unwrap(), source.list_all().unwrap());
    assert!(exported.contains("\"linksTo\""));
    assert!(exported.contains("\"isFavorite\": true"));
}

#[test]
fn overwrite_replaces_everything_and_recenters() {
    let mut service = session();
    service
        .link_new_titles("Old child", RelationKind::Child)
        .unwrap();

    let report = service.import(PAYLOAD, ImportMode::Overwrite).unwrap();

    assert_eq!(report.first_note, Some(NoteId::from("hub")));
    assert_eq!(service.store().count().unwrap(), 3);
    assert_eq!(service.center_id(), Some(&NoteId::from("hub")));
    let downers: Vec<&str> = service
        .topology()
        .downers
        .iter()
        .map(|note| note.id.as_str())
        .collect();
    assert_eq!(downers, vec!["a", "b"]);
    assert_eq!(service.favorites().len(), 1);
}

#[test]
fn merge_renames_collisions_under_a_batch_note() {
    let mut service = session();
    let home = service.center_id().cloned().unwrap();
    let payload = r#"[
      {"id":"x","title":"Home","linksTo":["y"]},
      {"id":"y","title":"Fresh","linksTo":["missing"]}
    ]"#;

    let report = service.import(payload, ImportMode::Merge).unwrap();

    assert_eq!(report.imported, 2);
    assert_eq!(report.renamed.len(), 1);
    assert_eq!(service.center_id(), Some(&home));
    assert_eq!(service.store().count().unwrap(), 4);

    let renamed = service.get_note(&report.renamed[0]).unwrap();
    assert_eq!(renamed.title, "Home (2)");
    assert_ne!(renamed.id, NoteId::from("x"));
    let fresh_id = renamed.links_to.iter().next().cloned().unwrap();
    let fresh = service.get_note(&fresh_id).unwrap();
    assert_eq!(fresh.title, "Fresh");
    assert!(fresh.links_to.is_empty());

    let batch: Note = service.get_note(report.batch_note.as_ref().unwrap()).unwrap();
    assert_eq!(batch.title, "Import");
    assert!(batch.links_to.contains(&renamed.id));
}

#[test]
fn merge_without_collisions_creates_no_batch_note() {
    let mut service = session();
    let report = service
        .import(r#"[{"id":"q","title":"Unique"}]"#, ImportMode::Merge)
        .unwrap();
    assert!(report.renamed.is_empty());
    assert!(report.batch_note.is_none());
    assert_eq!(service.store().count().unwrap(), 2);
}

#[test]
fn malformed_payload_leaves_the_vault_untouched() {
    let mut service = session();
    let before = service.store().list_all().unwrap();

    for payload in [
        "not json",
        r#"{"id":"a","title":"A"}"#,
        r#"[{"id":"a","title":"A","linksTo":["b"],"relatedTo":["b"]}]"#,
        r#"[{"title":"missing id"}]"#,
        r#"[{"id":"c","title":"C","linksTo":["d"]},{"id":"d","title":"D","relatedTo":["c"]}]"#,
        r#"[{"id":"c","title":"C","linksTo":["d"]},{"id":"d","title":"D","linksTo":["c"]}]"#,
    ] {
        for mode in [ImportMode::Overwrite, ImportMode::Merge] {
            let err = service.import(payload, mode).unwrap_err();
            assert!(matches!(err, GraphServiceError::Import(_)), "{payload}");
        }
    }
    assert_eq!(service.store().list_all().unwrap(), before);
}

#[test]
fn one_sided_lateral_edges_are_mirrored_on_import() {
    let payload = r#"[{"id":"a","title":"A","relatedTo":["b"]},{"id":"b","title":"B"}]"#;
    for mode in [ImportMode::Overwrite, ImportMode::Merge] {
        let mut target = store();
        import_json(&mut target, payload, mode).unwrap();

        let notes = target.list_all().unwrap();
        let a = notes.iter().find(|note| note.title == "A").unwrap();
        let b = notes.iter().find(|note| note.title == "B").unwrap();
        assert!(a.related_to.contains(&b.id), "{mode:?}");
        assert!(b.related_to.contains(&a.id), "{mode:?}");

        let b_view = compute_topology(&target, &b.id).unwrap();
        assert_eq!(b_view.lefters.len(), 1, "{mode:?}");
        assert_eq!(b_view.lefters[0].id, a.id);
    }
}

