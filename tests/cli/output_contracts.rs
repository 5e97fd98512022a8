//! Command execution and output contracts

use super::support::{layout, Harness};
use catalog_sync::ApiError;
use catalog_sync::StoreError;

#[test]
fn local_commands_require_a_pulled_session() {
    let harness = Harness::new();
    let err = harness.run(&["status"]).unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert!(err.to_string().contains("pull"));
}

#[test]
fn pull_reports_what_was_read() {
    let harness = Harness::new();
    let output = harness.ok(&["pull"]);
    assert!(output.contains("0 resource(s)"), "{}", output);
    assert!(output.contains("2 root category(ies)"), "{}", output);
    assert!(output.contains("octo/catalog"));

    let status = harness.json(&["status", "--format", "json"]);
    assert_eq!(status["resources"], 0);
    assert_eq!(status["pending_records"], 0);
    assert_eq!(status["categories_dirty"], false);
    assert!(status["pulled_at"].is_i64());
}

#[test]
fn added_resource_is_pending_until_sync() {
    let harness = Harness::pulled();
    let uuid = harness.add_resource("Dune", "Books>Sci-Fi");

    let status = harness.json(&["status", "--format", "json"]);
    assert_eq!(status["pending_adds"], 1);
    assert!(!harness.store.contains(&layout().resource_path(&uuid)));

    let shown = harness.json(&["resource", "show", &uuid, "--format", "json"]);
    assert_eq!(shown["name"], "Dune");
    assert_eq!(shown["category"], "Books > Sci-Fi");

    let report = harness.json(&["sync", "--format", "json"]);
    assert_eq!(report["records"], 1);
    let files: Vec<&str> = report["outcomes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["file"].as_str().unwrap())
        .collect();
    assert!(files.contains(&layout().resource_path(&uuid).as_str()));
    assert!(files.contains(&layout().resource_index_path().as_str()));
    assert!(harness.store.contains(&layout().resource_path(&uuid)));

    let status = harness.json(&["status", "--format", "json"]);
    assert_eq!(status["pending_records"], 0);
}

#[test]
fn edit_replaces_only_the_given_fields() {
    let harness = Harness::pulled();
    let uuid = harness.add_resource("Dune", "Books");
    harness.ok(&["resource", "edit", &uuid, "--rating", "9"]);

    let shown = harness.json(&["resource", "show", &uuid, "--format", "json"]);
    assert_eq!(shown["name"], "Dune");
    assert_eq!(shown["rating"], 9.0);
    let status = harness.json(&["status", "--format", "json"]);
    assert_eq!(status["pending_adds"], 1);
    assert_eq!(status["pending_edits"], 1);
}

#[test]
fn unknown_resource_is_reported() {
    let harness = Harness::pulled();
    let err = harness.run(&["resource", "delete", "missing"]).unwrap_err();
    assert!(matches!(err, ApiError::ResourceNotFound(ref uuid) if uuid == "missing"));
}

#[test]
fn resource_list_filters_by_category_prefix() {
    let harness = Harness::pulled();
    let dune = harness.add_resource("Dune", "Books > Sci-Fi");
    harness.add_resource("Heat", "Movies > Action");

    let listed = harness.json(&["resource", "list", "--category", "Books", "--format", "json"]);
    let uuids: Vec<&String> = listed.as_object().unwrap().keys().collect();
    assert_eq!(uuids, [&dune]);
}

#[test]
fn pull_refuses_to_discard_unsynced_changes() {
    let harness = Harness::pulled();
    harness.add_resource("Dune", "Books");

    let err = harness.run(&["pull"]).unwrap_err();
    assert!(err.to_string().contains("--force"));

    // Prompts are disabled, so --force alone cancels.
    assert_eq!(harness.ok(&["pull", "--force"]), "Pull cancelled");
    assert_eq!(harness.json(&["status", "--format", "json"])["pending_adds"], 1);

    harness.ok(&["pull", "--force", "--yes"]);
    let status = harness.json(&["status", "--format", "json"]);
    assert_eq!(status["pending_records"], 0);
    assert_eq!(status["resources"], 0);
}

#[test]
fn assigning_twice_reports_the_duplicate() {
    let harness = Harness::pulled();
    let uuid = harness.add_resource("Dune", "Books");

    let first = harness.ok(&["list", "assign", "hot", &uuid]);
    assert!(first.contains(&format!("added {} to hot", uuid)));
    let second = harness.ok(&["list", "assign", "hot", &uuid, "nope"]);
    assert!(second.contains("already in hot, skipped"));
    assert!(second.contains("nope is not a known resource"));

    let hot = harness.json(&["list", "show", "hot", "--format", "json"]);
    assert_eq!(hot.as_array().unwrap().len(), 1);
    assert!(harness.run(&["list", "show", "warm"]).is_err());
}

#[test]
fn prune_removes_entries_of_deleted_resources() {
    let harness = Harness::pulled();
    let keep = harness.add_resource("Keep", "Books");
    let gone = harness.add_resource("Gone", "Books");
    harness.ok(&["list", "assign", "top", &keep, &gone]);
    harness.ok(&["resource", "delete", &gone]);

    let stale = harness.json(&["list", "stale", "--format", "json"]);
    assert_eq!(stale[0]["uuid"], gone.as_str());
    assert_eq!(stale[0]["bucket"], "top");

    let output = harness.ok(&["list", "prune", "--yes"]);
    assert!(output.starts_with("Pruned 1 stale list entry(ies)"));
    assert_eq!(harness.ok(&["list", "stale"]), "No stale list entries.\n");

    harness.ok(&["sync"]);
    let list = harness.store.json(&layout().list_path()).unwrap();
    assert_eq!(list["top"].as_array().unwrap().len(), 1);
    assert_eq!(list["top"][0]["uuid"], keep.as_str());
}

#[test]
fn category_edits_stay_local_until_saved() {
    let harness = Harness::pulled();
    let tree_path = layout().category_tree_path();
    let before = harness.store.sha(&tree_path);

    let output = harness.ok(&["category", "add", "Fantasy", "--parent", "Books", "--link", "fantasy"]);
    assert!(output.contains("category save"));
    assert_eq!(harness.store.sha(&tree_path), before);

    let output = harness.ok(&["category", "rename", "Games > RPG", "Role-playing"]);
    assert_eq!(output, "No change: 'Games' does not exist on the path.");

    let output = harness.ok(&["category", "save"]);
    assert!(output.starts_with("Categories saved"), "{}", output);
    let remote = harness.store.json(&tree_path).unwrap();
    assert_eq!(remote["Books"]["items"]["Fantasy"]["link"], "fantasy");

    assert_eq!(harness.ok(&["category", "save"]), "Categories already up to date.");
    assert_eq!(harness.ok(&["category", "tree"]).lines().count(), 4);
}

#[test]
fn category_save_conflicts_when_the_remote_moved() {
    let harness = Harness::pulled();
    harness.ok(&["category", "delete", "Books"]);
    harness
        .store
        .seed(&layout().category_tree_path(), br#"{"Music":{"icon":"","link":"music"}}"#.to_vec());

    let err = harness.run(&["category", "save"]).unwrap_err();
    assert!(matches!(err, ApiError::Store(StoreError::Conflict { .. })));
    assert_eq!(harness.json(&["status", "--format", "json"])["categories_dirty"], true);
}

#[test]
fn failed_sync_is_an_error_carrying_the_report() {
    let harness = Harness::pulled();
    let uuid = harness.add_resource("Dune", "Books");
    harness.store.fail_mutations(
        &layout().resource_path(&uuid),
        StoreError::Transport("connection reset".to_string()),
    );

    let err = harness.run(&["sync"]).unwrap_err();
    match err {
        ApiError::SyncIncomplete(rendered) => {
            assert!(rendered.contains("Sync partially succeeded"));
            assert!(rendered.contains("connection reset"));
        }
        other => panic!("unexpected error {}", other),
    }
    // The drained ledger was persisted even though the round failed.
    assert_eq!(harness.json(&["status", "--format", "json"])["pending_records"], 0);
}

#[test]
fn config_show_never_prints_the_token() {
    let harness = Harness::new();
    let json = harness.ok(&["config", "show", "--format", "json"]);
    assert!(!json.contains("secret-token"));
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["remote"]["owner"], "octo");

    let toml = harness.ok(&["config", "show"]);
    assert!(toml.contains("[remote]"));
    assert!(!toml.contains("secret-token"));
}
