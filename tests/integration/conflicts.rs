//! Optimistic concurrency: stale shas, competing editors, partial failure

use super::support::{labels, layout, options, seeded_store, RacingStore};
use catalog_sync::resource::ResourceMap;
use catalog_sync::sync::LedgerRetention;
use catalog_sync::tree::{CategoryTree, NodeData};
use catalog_sync::{
    AdminSession, CategoryTreeEditor, InMemoryStore, RemoteStore, Resource, StoreError, StoreErrorKind,
};
use std::sync::Arc;

fn index_with(uuid: &str, name: &str) -> ResourceMap {
    [(uuid.to_string(), Resource::named(name))].into_iter().collect()
}

#[tokio::test]
async fn second_editor_on_a_stale_tree_gets_a_conflict() {
    let store = seeded_store();
    let path = layout().category_tree_path();
    let s0 = store.sha(&path).unwrap();
    let mut first = CategoryTreeEditor::load(&*store, &path).await.unwrap();
    let mut second = CategoryTreeEditor::load(&*store, &path).await.unwrap();
    assert_eq!(first.base_sha(), Some(s0.as_str()));
    assert_eq!(second.base_sha(), Some(s0.as_str()));

    first.delete(&labels(&["Books"]));
    first.save(&*store, &path).await.unwrap();

    second.insert_child(&labels(&["Books"]), "Fantasy", NodeData::new("", "fantasy"));
    let err = second.save(&*store, &path).await.unwrap_err();

    assert!(err.is_conflict());
    let remote: CategoryTree = serde_json::from_slice(&store.content(&path).unwrap()).unwrap();
    assert_eq!(&remote, first.tree());
    assert_eq!(store.write_count(&path), 1);
    assert!(second.is_dirty());
    assert_eq!(second.base_sha(), Some(s0.as_str()));
}

#[tokio::test]
async fn reloading_after_a_conflict_lets_the_edit_through() {
    let store = seeded_store();
    let path = layout().category_tree_path();
    let mut first = CategoryTreeEditor::load(&*store, &path).await.unwrap();
    let mut second = CategoryTreeEditor::load(&*store, &path).await.unwrap();
    first.rename_key(&labels(&["Books"]), "Novels");
    first.save(&*store, &path).await.unwrap();
    second.delete(&labels(&["Movies"]));
    assert!(second.save(&*store, &path).await.is_err());

    let mut second = CategoryTreeEditor::load(&*store, &path).await.unwrap();
    second.delete(&labels(&["Movies"]));
    second.save(&*store, &path).await.unwrap();

    let remote: CategoryTree = serde_json::from_slice(&store.content(&path).unwrap()).unwrap();
    let roots: Vec<&str> = remote.roots.keys().map(String::as_str).collect();
    assert_eq!(roots, ["Novels"]);
}

#[tokio::test]
async fn resource_write_racing_another_writer_is_reported_not_applied() {
    let inner = Arc::new(InMemoryStore::new());
    inner.seed_json(&layout().resource_index_path(), &index_with("u1", "Dune"));
    let path = layout().resource_path("u1");
    inner.seed_json(&path, &Resource::named("Dune"));

    let mut session = AdminSession::load(&*inner, layout(), options(1)).await.unwrap();
    session.edit_resource("u1", Resource::named("Dune, ours")).unwrap();
    let racing: Arc<dyn RemoteStore> =
        Arc::new(RacingStore::new(inner.clone(), &path, br#"{"name":"Dune, theirs"}"#));

    let report = session.synchronize(racing).await;

    let outcome = report.outcome(&path).unwrap();
    assert_eq!(outcome.error_kind(), Some(StoreErrorKind::Conflict));
    assert_eq!(inner.json(&path).unwrap()["name"], "Dune, theirs");
    assert!(report
        .outcome(&layout().resource_index_path())
        .unwrap()
        .is_success());
    assert_eq!(report.conflicts().count(), 1);
    assert_eq!(report.title(), "Sync partially succeeded");
}

#[tokio::test]
async fn external_change_before_sync_is_overwritten_with_a_fresh_sha() {
    let store = Arc::new(InMemoryStore::new());
    store.seed_json(&layout().resource_index_path(), &index_with("u1", "Dune"));
    let path = layout().resource_path("u1");
    store.seed_json(&path, &Resource::named("Dune"));

    let mut session = AdminSession::load(&*store, layout(), options(1)).await.unwrap();
    store.seed(&path, br#"{"name":"changed elsewhere"}"#.to_vec());
    session.edit_resource("u1", Resource::named("Dune, ours")).unwrap();

    let report = session.synchronize(store.clone()).await;

    assert!(report.is_success(), "{}", report.summary());
    assert_eq!(store.json(&path).unwrap()["name"], "Dune, ours");
}

#[tokio::test]
async fn one_failing_file_does_not_stop_the_round() {
    let store = Arc::new(InMemoryStore::new());
    let mut session = AdminSession::new(layout(), options(3));
    let good = session.add_resource(Resource::named("Good")).unwrap();
    let bad = session.add_resource(Resource::named("Bad")).unwrap();
    store.fail_mutations(
        &layout().resource_path(&bad),
        StoreError::Transport("connection reset".to_string()),
    );

    let report = session.synchronize(store.clone()).await;

    assert!(!report.is_success());
    assert!(store.contains(&layout().resource_path(&good)));
    assert!(!store.contains(&layout().resource_path(&bad)));
    let failed: Vec<&str> = report.failed().map(|o| o.file.as_str()).collect();
    assert_eq!(failed, [layout().resource_path(&bad).as_str()]);
    assert!(report.summary().contains("connection reset"));
    // Default retention drops the failed record.
    assert!(session.ledger().is_empty());
    assert_eq!(report.requeued, 0);
}

#[tokio::test]
async fn requeued_records_succeed_on_the_next_round() {
    let store = Arc::new(InMemoryStore::new());
    let mut opts = options(1);
    opts.retention = LedgerRetention::RequeueFailed;
    let mut session = AdminSession::new(layout(), opts);
    let good = session.add_resource(Resource::named("Good")).unwrap();
    let bad = session.add_resource(Resource::named("Bad")).unwrap();
    let bad_path = layout().resource_path(&bad);
    store.fail_mutations(&bad_path, StoreError::Transport("timeout".to_string()));

    let first = session.synchronize(store.clone()).await;
    assert_eq!(first.requeued, 1);
    assert_eq!(session.ledger().len(), 1);
    assert_eq!(session.ledger().records()[0].uuid(), Some(bad.as_str()));

    store.clear_failures();
    let second = session.synchronize(store.clone()).await;

    assert!(second.is_success(), "{}", second.summary());
    assert!(session.ledger().is_empty());
    assert_eq!(store.write_count(&layout().resource_path(&good)), 1);
    assert_eq!(store.write_count(&bad_path), 1);
}

#[tokio::test]
async fn write_with_current_sha_moves_the_sha() {
    let store = InMemoryStore::new();
    let path = layout().resource_path("u1");
    let before = store.seed(&path, br#"{"name":"old"}"#.to_vec());

    let receipt = store
        .write_file(&path, br#"{"name":"new"}"#, Some(before.as_str()), "edit resource u1")
        .await
        .unwrap();

    assert_ne!(receipt.sha, before);
    assert_eq!(store.sha(&path), Some(receipt.sha));
    let err = store
        .write_file(&path, b"{}", Some(before.as_str()), "edit resource u1")
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(store.json(&path).unwrap()["name"], "new");
}
