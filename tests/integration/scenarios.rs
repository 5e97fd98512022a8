//! End-to-end editing scenarios against the in-memory store

use super::support::{labels, layout, options, sample_tree, seeded_store};
use catalog_sync::lists::AssignOutcome;
use catalog_sync::tree::{CategoryTree, SaveOutcome};
use catalog_sync::{AdminSession, Bucket, CategoryTreeEditor, InMemoryStore, Resource, TreeEdit};
use std::sync::Arc;

#[tokio::test]
async fn add_then_edit_writes_the_resource_file_once() {
    let store = Arc::new(InMemoryStore::new());
    let mut session = AdminSession::new(layout(), options(1));
    let uuid = session.add_resource(Resource::named("Dune")).unwrap();
    session
        .edit_resource(&uuid, Resource::named("Dune (1984)"))
        .unwrap();

    let report = session.synchronize(store.clone()).await;

    assert!(report.is_success(), "{}", report.summary());
    assert_eq!(report.records, 2);
    let path = layout().resource_path(&uuid);
    assert_eq!(store.write_count(&path), 1);
    assert_eq!(store.json(&path).unwrap()["name"], "Dune (1984)");
    assert_eq!(store.write_count(&layout().resource_index_path()), 1);
    assert!(!store.contains(&layout().list_path()));
    assert!(session.ledger().is_empty());
}

#[tokio::test]
async fn add_then_delete_leaves_no_file_behind() {
    let store = Arc::new(InMemoryStore::new());
    let mut session = AdminSession::new(layout(), options(1));
    let uuid = session.add_resource(Resource::named("Ephemeral")).unwrap();
    session.delete_resource(&uuid).unwrap();

    let report = session.synchronize(store.clone()).await;

    assert!(report.is_success());
    let path = layout().resource_path(&uuid);
    assert!(!store.contains(&path));
    assert_eq!(store.write_count(&path), 0);
    assert_eq!(
        report.outcome(&path).and_then(|o| o.message.as_deref()),
        Some("already absent")
    );
    let index = store.json(&layout().resource_index_path()).unwrap();
    assert!(index.as_object().unwrap().is_empty());
}

#[test]
fn rename_onto_existing_sibling_replaces_it_in_place() {
    let mut editor = CategoryTreeEditor::new(sample_tree(), None);

    let edit = editor.rename_key(&labels(&["Movies", "Action"]), "动作");

    assert_eq!(
        edit,
        TreeEdit::Overwrote {
            key: "动作".to_string()
        }
    );
    let movies = editor.tree().resolve(&labels(&["Movies"])).unwrap();
    let keys: Vec<&str> = movies.children().map(|(key, _)| key.as_str()).collect();
    assert_eq!(keys, ["动作", "Drama"]);
    let renamed = editor.tree().resolve(&labels(&["Movies", "动作"])).unwrap();
    assert_eq!(renamed.link, "action");
    assert!(editor.is_dirty());
}

#[tokio::test]
async fn renamed_tree_is_saved_with_order_intact() {
    let store = seeded_store();
    let path = layout().category_tree_path();
    let mut editor = CategoryTreeEditor::load(&*store, &path).await.unwrap();
    editor.rename_key(&labels(&["Movies"]), "Films");

    let outcome = editor.save(&*store, &path).await.unwrap();

    assert!(matches!(outcome, SaveOutcome::Saved { .. }));
    let remote: CategoryTree = serde_json::from_slice(&store.content(&path).unwrap()).unwrap();
    let roots: Vec<&str> = remote.roots.keys().map(String::as_str).collect();
    assert_eq!(roots, ["Films", "Books"]);
    assert_eq!(editor.base_sha(), store.sha(&path).as_deref());
    assert!(!editor.is_dirty());
}

#[test]
fn missing_intermediate_label_is_a_no_op() {
    let mut editor = CategoryTreeEditor::new(sample_tree(), None);
    let before = editor.tree().clone();

    let edit = editor.delete(&labels(&["Games", "RPG"]));

    assert!(!edit.is_mutation());
    assert_eq!(editor.tree(), &before);
    assert!(!editor.is_dirty());
}

#[tokio::test]
async fn assigning_twice_keeps_one_entry_per_uuid() {
    let store = Arc::new(InMemoryStore::new());
    let mut session = AdminSession::new(layout(), options(1));
    let u1 = session.add_resource(Resource::named("One")).unwrap();
    let u2 = session.add_resource(Resource::named("Two")).unwrap();

    session.bulk_assign(Bucket::Hot, &[u2.clone()]).unwrap();
    let outcomes = session
        .bulk_assign(Bucket::Hot, &[u1.clone(), u2.clone()])
        .unwrap();

    assert_eq!(outcomes[0].1, AssignOutcome::Inserted);
    assert_eq!(outcomes[1].1, AssignOutcome::AlreadyPresent);
    let hot: Vec<&str> = session
        .lists()
        .bucket(Bucket::Hot)
        .iter()
        .map(|s| s.uuid.as_str())
        .collect();
    assert_eq!(hot, [u2.as_str(), u1.as_str()]);

    let report = session.synchronize(store.clone()).await;
    assert!(report.is_success(), "{}", report.summary());
    assert_eq!(store.write_count(&layout().list_path()), 1);
    let list = store.json(&layout().list_path()).unwrap();
    assert_eq!(list["hot"].as_array().unwrap().len(), 2);
    assert_eq!(list["hot"][0]["uuid"], u2.as_str());
    assert!(!session.lists().is_dirty());
}

#[tokio::test]
async fn pruning_publishes_the_cleaned_list() {
    let store = Arc::new(InMemoryStore::new());
    let mut session = AdminSession::new(layout(), options(1));
    let keep = session.add_resource(Resource::named("Keep")).unwrap();
    let gone = session.add_resource(Resource::named("Gone")).unwrap();
    session
        .bulk_assign(Bucket::Top, &[keep.clone(), gone.clone()])
        .unwrap();
    session.delete_resource(&gone).unwrap();
    assert_eq!(session.stale_list_entries().len(), 1);

    let pruned = session.prune_stale_list_entries().unwrap();
    assert_eq!(pruned.len(), 1);
    assert_eq!(pruned[0].uuid, gone);

    let report = session.synchronize(store.clone()).await;
    assert!(report.is_success());
    let list = store.json(&layout().list_path()).unwrap();
    let top = list["top"].as_array().unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0]["uuid"], keep.as_str());
}

#[tokio::test]
async fn list_entries_with_tag_arrays_load() {
    let store = seeded_store();
    store.seed(
        &layout().list_path(),
        r#"{"hot":[{"uuid":"u1","name":"Dune","tags":["4k","classic"]}],"carousel":[]}"#,
    );

    let session = AdminSession::load(&*store, layout(), options(1)).await.unwrap();
    assert!(session.lists().contains(Bucket::Hot, "u1"));
    let entry = &session.lists().bucket(Bucket::Hot)[0];
    assert_eq!(entry.resource.tags["classic"], serde_json::json!(true));
    assert!(!session.has_unsynced_changes());
}
