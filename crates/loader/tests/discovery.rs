//! Manifest-driven package discovery and the diagnostic dump.

mod common;

use std::rc::Rc;

use host_model::HostCatalog;
use loadstone::{Registry, write_dump};
use serde_json::json;

use common::{package_dir, run_startup, write_archive, write_doc, write_manifest};

#[test]
fn discovery_registers_every_directory_with_a_manifest() {
    let dir = tempfile::tempdir().unwrap();

    let named = package_dir(dir.path(), "named-dir");
    write_manifest(
        &named,
        json!({ "id": "CustomId", "name": "Named Pack", "version": "1.2.0" }),
    );

    let anonymous = package_dir(dir.path(), "anonymous");
    write_manifest(&anonymous, json!({ "name": "No Id Pack" }));

    // No manifest, not a package.
    std::fs::create_dir_all(dir.path().join("stray")).unwrap();

    let registry = Registry::new(Rc::new(HostCatalog::default()));
    let found = registry.discover_packages(dir.path());

    assert_eq!(found.len(), 2);
    assert!(registry.package("customid").is_some());
    assert!(registry.package("anonymous").is_some());
    assert!(registry.package("stray").is_none());

    let named = registry.package("CustomId").unwrap();
    assert_eq!(named.manifest().unwrap().version, "1.2.0");
}

#[test]
fn discovery_of_a_missing_directory_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Registry::new(Rc::new(HostCatalog::default()));
    assert!(registry.discover_packages(&dir.path().join("nowhere")).is_empty());
}

#[test]
fn dump_lists_objects_and_archive_entries_per_package() {
    let dir = tempfile::tempdir().unwrap();
    let root = package_dir(dir.path(), "dumpme");
    write_doc(&root, "Skill/Fireball.json", json!({ "skill_name": "Fireball" }));
    write_doc(
        &root,
        "Conditions/StatusCondition/Burn.json",
        json!({ "condition_name": "Burn", "rank": 2 }),
    );
    write_archive(&root, "pack.bin", &[("icons/fire", b"1234")]);

    let registry = Registry::new(Rc::new(HostCatalog::default()));
    registry.register_package("dumpme", &root);
    run_startup(&registry);

    let mut out = Vec::new();
    write_dump(&registry, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("Package: dumpme"));
    assert!(text.contains("Category: Skill"));
    assert!(text.contains("Fireball"));
    assert!(text.contains("Category: StatusCondition"));
    assert!(text.contains("Burn_2"));
    assert!(text.contains("Archive: pack"));
    assert!(text.contains("icons/fire"));
}
