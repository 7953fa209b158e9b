//! Lifecycle ordering, duplicate policy, general skills, and unload.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use host_model::{HostCatalog, shared};
use loadstone::{Cache, Category, ContentManager, LoadPhase, LoaderError, Registry};
use serde_json::json;

use common::{package_dir, run_startup, write_archive, write_doc};

#[test]
fn package_delegates_observe_every_phase_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let root = package_dir(dir.path(), "observer");

    let registry = Registry::new(Rc::new(HostCatalog::default()));
    registry.register_package("observer", &root);

    let seen = Rc::new(RefCell::new(Vec::new()));
    for phase in [
        LoadPhase::PreCacheInit,
        LoadPhase::PostCacheInit,
        LoadPhase::PreLibraryInit,
        LoadPhase::PostLibraryInit,
    ] {
        let seen = seen.clone();
        registry
            .register_phase_observer(
                "observer",
                phase,
                Rc::new(move |registry: &Registry| {
                    seen.borrow_mut().push(registry.current_phase().unwrap());
                    Ok(())
                }),
            )
            .unwrap();
    }

    run_startup(&registry);
    assert_eq!(
        *seen.borrow(),
        vec![
            LoadPhase::PreCacheInit,
            LoadPhase::PostCacheInit,
            LoadPhase::PreLibraryInit,
            LoadPhase::PostLibraryInit,
        ]
    );
}

#[test]
fn post_cache_delegates_see_content_already_registered() {
    let dir = tempfile::tempdir().unwrap();
    let root = package_dir(dir.path(), "ordering");
    write_doc(
        &root,
        "Skill/Fireball.json",
        json!({ "skill_name": "Fireball" }),
    );

    let host = Rc::new(HostCatalog::default());
    let registry = Registry::new(host.clone());
    registry.register_package("ordering", &root);

    // Managers broadcast before package delegates, so by the time a
    // PostCacheInit delegate runs the cache-build sweep is complete.
    let seen = Rc::new(RefCell::new(None));
    let sink = seen.clone();
    let catalog = host.clone();
    registry
        .register_phase_observer(
            "ordering",
            LoadPhase::PostCacheInit,
            Rc::new(move |_: &Registry| {
                *sink.borrow_mut() = Some(catalog.locate_skill("Fireball").is_some());
                Ok(())
            }),
        )
        .unwrap();

    registry.advance_phase(LoadPhase::PreCacheInit).unwrap();
    registry.advance_phase(LoadPhase::PostCacheInit).unwrap();
    assert_eq!(*seen.borrow(), Some(true));
}

#[test]
fn backward_and_repeated_transitions_are_rejected() {
    let registry = Registry::new(Rc::new(HostCatalog::default()));
    registry.advance_phase(LoadPhase::PostCacheInit).unwrap();

    let back = registry.advance_phase(LoadPhase::PreCacheInit);
    assert!(matches!(back, Err(LoaderError::PhaseOrder { .. })));

    let repeat = registry.advance_phase(LoadPhase::PostCacheInit);
    assert!(matches!(repeat, Err(LoaderError::PhaseOrder { .. })));

    assert_eq!(registry.current_phase(), Some(LoadPhase::PostCacheInit));
}

#[test]
fn advancing_from_inside_a_broadcast_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let root = package_dir(dir.path(), "reentrant");

    let registry = Registry::new(Rc::new(HostCatalog::default()));
    registry.register_package("reentrant", &root);

    let outcome = Rc::new(RefCell::new(None));
    let sink = outcome.clone();
    registry
        .register_phase_observer(
            "reentrant",
            LoadPhase::PreCacheInit,
            Rc::new(move |registry: &Registry| {
                *sink.borrow_mut() = Some(registry.advance_phase(LoadPhase::PostCacheInit));
                Ok(())
            }),
        )
        .unwrap();

    registry.advance_phase(LoadPhase::PreCacheInit).unwrap();
    assert!(matches!(
        outcome.borrow_mut().take(),
        Some(Err(LoaderError::ReentrantPhase { .. }))
    ));
    // The nested attempt must not have moved the machine.
    assert_eq!(registry.current_phase(), Some(LoadPhase::PreCacheInit));
}

#[test]
fn duplicate_skills_keep_the_first_registration() {
    let dir = tempfile::tempdir().unwrap();
    let first = package_dir(dir.path(), "first");
    let second = package_dir(dir.path(), "second");
    write_doc(
        &first,
        "Skill/Slash.json",
        json!({ "skill_name": "Slash", "range": 1.0 }),
    );
    write_doc(
        &second,
        "Skill/Slash.json",
        json!({ "skill_name": "Slash", "range": 2.0 }),
    );

    let host = Rc::new(HostCatalog::default());
    let registry = Registry::new(host.clone());
    registry.register_package("first", &first);
    registry.register_package("second", &second);
    run_startup(&registry);

    assert_eq!(host.locate_skill("Slash").unwrap().borrow().range, 1.0);
}

#[test]
fn duplicate_conditions_replace_in_place_through_held_handles() {
    let dir = tempfile::tempdir().unwrap();
    let first = package_dir(dir.path(), "first");
    let second = package_dir(dir.path(), "second");
    write_doc(
        &first,
        "Conditions/StatusCondition/Poison.json",
        json!({ "condition_name": "Poison", "duration": 5.0 }),
    );
    write_doc(
        &second,
        "Conditions/StatusCondition/Poison.json",
        json!({ "condition_name": "Poison", "duration": 9.0 }),
    );

    let host = Rc::new(HostCatalog::default());
    let registry = Registry::new(host.clone());
    registry.register_package("first", &first);
    registry.register_package("second", &second);

    registry.advance_phase(LoadPhase::PreCacheInit).unwrap();
    registry.advance_phase(LoadPhase::PostCacheInit).unwrap();

    // The first package's instance won the cache slot, then had the second
    // package's values copied into it.
    let held = host.conditions.borrow().get("Poison_0").cloned().unwrap();
    assert_eq!(held.borrow().duration, 9.0);

    let first_instance = registry
        .load_asset("first:Conditions/StatusCondition/Poison", Category::Condition)
        .unwrap();
    assert!(Rc::ptr_eq(first_instance.as_condition().unwrap(), &held));
}

#[test]
fn partial_documents_overlay_existing_cached_values() {
    let dir = tempfile::tempdir().unwrap();
    let root = package_dir(dir.path(), "overlay");
    write_doc(
        &root,
        "Conditions/StatusCondition/Chill.json",
        json!({ "condition_name": "Chill", "duration": 3.0 }),
    );

    let host = Rc::new(HostCatalog::default());
    // Host-native condition already cached before packages load.
    host.conditions.borrow_mut().insert(
        "Chill_0".into(),
        shared(host_model::Condition {
            condition_name: "Chill".into(),
            duration: 8.0,
            is_refreshable: true,
            ..Default::default()
        }),
    );

    let registry = Registry::new(host.clone());
    registry.register_package("overlay", &root);
    run_startup(&registry);

    let chill = host.conditions.borrow().get("Chill_0").cloned().unwrap();
    let chill = chill.borrow();
    // Overridden by the document.
    assert_eq!(chill.duration, 3.0);
    // Untouched fields keep the host's values.
    assert!(chill.is_refreshable);
}

#[test]
fn general_skills_register_during_library_init_only() {
    let dir = tempfile::tempdir().unwrap();
    let root = package_dir(dir.path(), "generals");
    write_doc(
        &root,
        "Skill/Sprint.json",
        json!({ "skill_name": "Sprint", "general": true }),
    );
    write_doc(
        &root,
        "Skill/Fireball.json",
        json!({ "skill_name": "Fireball", "general": false }),
    );

    let host = Rc::new(HostCatalog::default());
    let registry = Registry::new(host.clone());
    registry.register_package("generals", &root);
    run_startup(&registry);

    {
        let generals = host.general_skills.borrow();
        assert_eq!(generals.len(), 1);
        assert_eq!(generals[0].borrow().skill_name, "Sprint");
    }

    // Too late: the host already consumed the list.
    let late = shared(host_model::Skill {
        skill_name: "Late".into(),
        general: true,
        ..Default::default()
    });
    registry.register_general_skill(&late);
    assert_eq!(host.general_skills.borrow().len(), 1);
}

#[test]
fn shopkeep_cache_snapshots_host_shops_before_packages() {
    let dir = tempfile::tempdir().unwrap();
    let root = package_dir(dir.path(), "market");
    write_doc(
        &root,
        "Shopkeep/Alchemist.json",
        json!({
            "shop_name": "Alchemist",
            "stock": [ { "item": "Potion", "price": 20, "quantity": -1 } ]
        }),
    );
    // Colliding with a host-native shop: the host wins.
    write_doc(
        &root,
        "Shopkeep/Blacksmith.json",
        json!({ "shop_name": "Blacksmith", "greeting": "modded" }),
    );

    let host = Rc::new(HostCatalog::default());
    host.insert_resource(
        "shops/blacksmith",
        host_model::Asset::Shopkeep(shared(host_model::Shopkeep {
            shop_name: "Blacksmith".into(),
            greeting: "native".into(),
            ..Default::default()
        })),
    );

    let registry = Registry::new(host);
    registry.register_package("market", &root);
    run_startup(&registry);

    let cache = registry.manager_for(Category::Shopkeep).unwrap().cache();
    let mut keys = cache.keys();
    keys.sort();
    assert_eq!(keys, vec!["Alchemist".to_string(), "Blacksmith".to_string()]);

    let blacksmith = cache.get("Blacksmith").unwrap();
    assert_eq!(blacksmith.as_shopkeep().unwrap().borrow().greeting, "native");
}

#[test]
fn replace_cached_overlays_one_entry_onto_another() {
    let dir = tempfile::tempdir().unwrap();
    let root = package_dir(dir.path(), "swap");
    write_doc(
        &root,
        "Items/Weapon/Longsword.json",
        json!({ "item_name": "Longsword", "value": 100 }),
    );
    write_doc(
        &root,
        "Items/Weapon/Rustsword.json",
        json!({ "item_name": "Rustsword", "value": 3 }),
    );

    let host = Rc::new(HostCatalog::default());
    let registry = Registry::new(host.clone());
    registry.register_package("swap", &root);
    run_startup(&registry);

    let held = host.items.borrow().get("Rustsword").cloned().unwrap();
    assert!(registry.replace_cached(Category::Item, "Rustsword", "Longsword"));
    assert_eq!(held.borrow().value, 100);

    assert!(!registry.replace_cached(Category::Item, "Rustsword", "Ghost"));
}

#[test]
fn unloading_releases_the_package_but_not_merged_content() {
    let dir = tempfile::tempdir().unwrap();
    let root = package_dir(dir.path(), "gone");
    write_doc(&root, "Skill/Slash.json", json!({ "skill_name": "Slash" }));
    write_archive(&root, "pack.bin", &[("icon", b"x")]);

    let host = Rc::new(HostCatalog::default());
    let registry = Registry::new(host.clone());
    registry.register_package("gone", &root);
    run_startup(&registry);
    assert!(host.locate_skill("Slash").is_some());

    registry.unload_package("GONE").unwrap();
    assert!(registry.package("gone").is_none());
    assert!(registry.load_asset("gone:icon", Category::Binary).is_none());
    assert!(registry.load_asset("gone:Skill/Slash", Category::Skill).is_none());

    // Content already merged into the host stays merged.
    assert!(host.locate_skill("Slash").is_some());

    let missing = registry.unload_package("gone");
    assert!(matches!(missing, Err(LoaderError::PackageNotFound(_))));
}

#[test]
fn registering_a_package_twice_returns_the_same_handle() {
    let dir = tempfile::tempdir().unwrap();
    let root = package_dir(dir.path(), "once");

    let registry = Registry::new(Rc::new(HostCatalog::default()));
    let a = registry.register_package("Once", &root);
    let b = registry.register_package("ONCE", &root);
    assert!(Rc::ptr_eq(&a, &b));
    assert_eq!(registry.packages().len(), 1);
    assert_eq!(a.id(), "once");
}
