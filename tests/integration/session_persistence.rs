//! Session state persisted between invocations

use super::support::{labels, layout, options, seeded_store};
use catalog_sync::store::{SessionStore, SledSessionStore};
use catalog_sync::tree::{CategoryTree, NodeData, SaveOutcome};
use catalog_sync::{AdminSession, Bucket, Resource};
use serde_json::json;

const KEY: &str = "octo/catalog";

#[tokio::test]
async fn unsynced_edits_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store();
    let uuid = {
        let mut session = AdminSession::load(&*store, layout(), options(1)).await.unwrap();
        let uuid = session.add_resource(Resource::named("Dune")).unwrap();
        session.bulk_assign(Bucket::Latest, &[uuid.clone()]).unwrap();
        session.categories_mut().insert_child(
            &labels(&["Books"]),
            "Fantasy",
            NodeData::new("", "fantasy"),
        );
        let state = SledSessionStore::open(dir.path()).unwrap();
        state.save(KEY, &session.snapshot()).unwrap();
        uuid
    };

    let state = SledSessionStore::open(dir.path()).unwrap();
    let snapshot = state.load(KEY).unwrap().unwrap();
    let mut session = AdminSession::from_snapshot(layout(), options(1), snapshot);

    assert!(session.has_unsynced_changes());
    let status = session.status();
    assert_eq!(status.pending_adds, 1);
    assert_eq!(status.pending_bulk, 1);
    assert!(status.categories_dirty);
    assert!(status.lists_dirty);
    assert_eq!(session.resource(&uuid).unwrap().name, "Dune");

    let report = session.synchronize(store.clone()).await;
    assert!(report.is_success(), "{}", report.summary());
    let outcome = session.save_categories(&*store).await.unwrap();
    assert!(matches!(outcome, SaveOutcome::Saved { .. }));
    assert!(!session.has_unsynced_changes());

    let list = store.json(&layout().list_path()).unwrap();
    assert_eq!(list["latest"][0]["uuid"], uuid.as_str());
    let tree: CategoryTree =
        serde_json::from_slice(&store.content(&layout().category_tree_path()).unwrap()).unwrap();
    assert!(tree.resolve(&labels(&["Books", "Fantasy"])).is_some());
}

#[tokio::test]
async fn restored_session_still_detects_a_moved_tree() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store();
    let state = SledSessionStore::open(dir.path()).unwrap();
    let session = AdminSession::load(&*store, layout(), options(1)).await.unwrap();
    state.save(KEY, &session.snapshot()).unwrap();

    // Someone else publishes a tree in the meantime.
    store.seed_json(&layout().category_tree_path(), &json!({"Music": {"icon": "", "link": "music"}}));

    let snapshot = state.load(KEY).unwrap().unwrap();
    let mut session = AdminSession::from_snapshot(layout(), options(1), snapshot);
    session.categories_mut().delete(&labels(&["Books"]));
    let err = session.save_categories(&*store).await.unwrap_err();

    assert!(err.is_conflict());
    assert!(session.status().categories_dirty);
}

#[tokio::test]
async fn load_reads_every_document_and_tolerates_absent_ones() {
    let store = seeded_store();
    store.seed_json(&layout().tags_path(), &json!({"4k": "Ultra HD"}));

    let session = AdminSession::load(&*store, layout(), options(1)).await.unwrap();

    assert!(session.resources().is_empty());
    assert_eq!(session.categories().tree().roots.len(), 2);
    assert!(session.categories().base_sha().is_some());
    assert!(Bucket::ALL
        .iter()
        .all(|&bucket| session.lists().bucket(bucket).is_empty()));
    assert_eq!(session.tags(), Some(&json!({"4k": "Ultra HD"})));
    assert!(!session.has_unsynced_changes());
    assert!(session.status().pulled_at.is_some());
}

#[test]
fn sessions_are_keyed_by_repository() {
    let dir = tempfile::tempdir().unwrap();
    let state = SledSessionStore::open(dir.path()).unwrap();
    let mut session = AdminSession::new(layout(), options(1));
    session.add_resource(Resource::named("Dune")).unwrap();
    state.save(KEY, &session.snapshot()).unwrap();

    assert!(state.load("octo/other").unwrap().is_none());
    assert!(state.clear(KEY).unwrap());
    assert!(state.load(KEY).unwrap().is_none());
}
