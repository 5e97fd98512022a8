//! Property tests: a collapsed round ends where sequential replay would

use super::support::{layout, options};
use catalog_sync::concurrency::PathLockManager;
use catalog_sync::lists::ListDocument;
use catalog_sync::resource::ResourceMap;
use catalog_sync::sync::resources::PlannedOp;
use catalog_sync::sync::{SyncPlan, SyncSnapshot};
use catalog_sync::{ChangeLedger, ChangeRecord, InMemoryStore, Resource, ResourceSynchronizer};
use proptest::prelude::*;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

const SLOTS: usize = 3;

/// (slot, is_write, name)
fn ops_strategy() -> impl Strategy<Value = Vec<(usize, bool, String)>> {
    prop::collection::vec((0..SLOTS, any::<bool>(), "[a-z]{1,8}"), 1..24)
}

/// Record `ops` the way a session would and return the expected final names.
fn replay(ops: &[(usize, bool, String)], seeded: &[&str]) -> (Vec<ChangeRecord>, BTreeMap<String, String>) {
    let mut expected: BTreeMap<String, String> = seeded
        .iter()
        .map(|uuid| (uuid.to_string(), "seed".to_string()))
        .collect();
    let mut ledger = ChangeLedger::new();
    for (slot, is_write, name) in ops {
        let uuid = format!("u{}", slot);
        if *is_write {
            let data = Resource::named(name.clone());
            if expected.contains_key(&uuid) {
                ledger.record_edit(&uuid, data).unwrap();
            } else {
                ledger.record_add(&uuid, data).unwrap();
            }
            expected.insert(uuid, name.clone());
        } else {
            ledger.record_delete(&uuid).unwrap();
            expected.remove(&uuid);
        }
    }
    (ledger.drain(), expected)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn collapsed_round_matches_sequential_replay(ops in ops_strategy(), concurrency in 1..4usize) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let layout = layout();
        let store = Arc::new(InMemoryStore::new());
        store.seed_json(&layout.resource_path("u0"), &Resource::named("seed"));
        let (records, expected) = replay(&ops, &["u0"]);

        let resources: ResourceMap = expected
            .iter()
            .map(|(uuid, name)| (uuid.clone(), Resource::named(name.clone())))
            .collect();
        let lists = ListDocument::default();
        let synchronizer = ResourceSynchronizer::new(
            store.clone(),
            layout.clone(),
            Arc::new(PathLockManager::new()),
            options(concurrency),
        );
        let report = rt.block_on(synchronizer.synchronize(
            &records,
            SyncSnapshot { resources: &resources, lists: &lists },
        ));

        prop_assert!(report.is_success(), "{}", report.summary());
        for slot in 0..SLOTS {
            let uuid = format!("u{}", slot);
            let path = layout.resource_path(&uuid);
            prop_assert!(store.write_count(&path) <= 1);
            match expected.get(&uuid) {
                Some(name) => prop_assert_eq!(
                    store.json(&path).map(|doc| doc["name"].clone()),
                    Some(Value::String(name.clone()))
                ),
                None => prop_assert!(!store.contains(&path)),
            }
        }
        let index = store.json(&layout.resource_index_path()).unwrap();
        prop_assert_eq!(index.as_object().unwrap().len(), expected.len());
    }

    #[test]
    fn plan_targets_each_uuid_once_in_first_appearance_order(ops in ops_strategy()) {
        let (records, _) = replay(&ops, &[]);
        let plan = SyncPlan::build(&records);

        let mut first_seen: Vec<String> = Vec::new();
        for (slot, _, _) in &ops {
            let uuid = format!("u{}", slot);
            if !first_seen.contains(&uuid) {
                first_seen.push(uuid);
            }
        }
        let planned: Vec<&str> = plan.file_ops.iter().map(PlannedOp::uuid).collect();
        prop_assert_eq!(planned, first_seen.iter().map(String::as_str).collect::<Vec<_>>());
        prop_assert!(plan.rejected.is_empty());
        prop_assert!(!plan.write_list);
    }
}
