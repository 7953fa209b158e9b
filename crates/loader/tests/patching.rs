//! The array patch language exercised through real documents layered over
//! host-native content.

mod common;

use std::rc::Rc;

use host_model::{Condition, HostCatalog, StatEffect, shared};
use loadstone::Registry;
use serde_json::json;

use common::{package_dir, run_startup, write_doc};

fn host_with_poison() -> Rc<HostCatalog> {
    let host = Rc::new(HostCatalog::default());
    host.conditions.borrow_mut().insert(
        "Poison_0".into(),
        shared(Condition {
            condition_name: "Poison".into(),
            duration: 10.0,
            effects: vec![
                StatEffect {
                    stat: "health".into(),
                    amount: -2.0,
                    multiplier: 1.0,
                },
                StatEffect {
                    stat: "speed".into(),
                    amount: -1.0,
                    multiplier: 1.0,
                },
                StatEffect {
                    stat: "mana".into(),
                    amount: -3.0,
                    multiplier: 1.0,
                },
            ],
            ..Default::default()
        }),
    );
    host
}

#[test]
fn patch_object_edits_the_existing_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let root = package_dir(dir.path(), "patches");
    write_doc(
        &root,
        "Conditions/StatusCondition/Poison.json",
        json!({
            "condition_name": "Poison",
            "effects": {
                // Deliberately listed add-first: application order is fixed
                // remove -> modify -> add regardless of key order.
                "add": [ { "stat": "armor", "amount": -5.0, "multiplier": 1.0 } ],
                "remove": [ { "stat": "speed" } ],
                "modify": [ { "where": { "stat": "health" }, "amount": -4.0 } ]
            }
        }),
    );

    let host = host_with_poison();
    let registry = Registry::new(host.clone());
    registry.register_package("patches", &root);
    run_startup(&registry);

    let poison = host.conditions.borrow().get("Poison_0").cloned().unwrap();
    let poison = poison.borrow();
    let stats: Vec<_> = poison.effects.iter().map(|e| e.stat.as_str()).collect();
    assert_eq!(stats, vec!["health", "mana", "armor"]);
    assert_eq!(poison.effects[0].amount, -4.0);
    assert_eq!(poison.effects[0].multiplier, 1.0);
}

#[test]
fn remove_by_index_and_modify_by_index() {
    let dir = tempfile::tempdir().unwrap();
    let root = package_dir(dir.path(), "indexed");
    write_doc(
        &root,
        "Conditions/StatusCondition/Poison.json",
        json!({
            "condition_name": "Poison",
            "effects": {
                "remove": [ { "index": 2 } ],
                "modify": [ { "index": 0, "multiplier": 2.0 } ]
            }
        }),
    );

    let host = host_with_poison();
    let registry = Registry::new(host.clone());
    registry.register_package("indexed", &root);
    run_startup(&registry);

    let poison = host.conditions.borrow().get("Poison_0").cloned().unwrap();
    let poison = poison.borrow();
    assert_eq!(poison.effects.len(), 2);
    assert_eq!(poison.effects[0].stat, "health");
    assert_eq!(poison.effects[0].multiplier, 2.0);
    assert_eq!(poison.effects[1].stat, "speed");
}

#[test]
fn plain_array_replaces_the_whole_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let root = package_dir(dir.path(), "replace");
    write_doc(
        &root,
        "Conditions/StatusCondition/Poison.json",
        json!({
            "condition_name": "Poison",
            "effects": [ { "stat": "sanity", "amount": -1.0, "multiplier": 1.0 } ]
        }),
    );

    let host = host_with_poison();
    let registry = Registry::new(host.clone());
    registry.register_package("replace", &root);
    run_startup(&registry);

    let poison = host.conditions.borrow().get("Poison_0").cloned().unwrap();
    let poison = poison.borrow();
    assert_eq!(poison.effects.len(), 1);
    assert_eq!(poison.effects[0].stat, "sanity");
    // Non-sequence fields ride along untouched.
    assert_eq!(poison.duration, 10.0);
}

#[test]
fn unmatched_criteria_leave_the_sequence_alone() {
    let dir = tempfile::tempdir().unwrap();
    let root = package_dir(dir.path(), "nomatch");
    write_doc(
        &root,
        "Conditions/StatusCondition/Poison.json",
        json!({
            "condition_name": "Poison",
            "effects": {
                "remove": [ { "stat": "luck" } ],
                "modify": [ { "where": { "stat": "luck" }, "amount": 99.0 } ]
            }
        }),
    );

    let host = host_with_poison();
    let registry = Registry::new(host.clone());
    registry.register_package("nomatch", &root);
    run_startup(&registry);

    let poison = host.conditions.borrow().get("Poison_0").cloned().unwrap();
    assert_eq!(poison.borrow().effects.len(), 3);
}
