//! Fixture helpers: on-disk packages built inside a tempdir.
#![allow(dead_code)]

use std::io::Write;

use loadstone::{LoadPhase, Registry};
use std::path::{Path, PathBuf};

use serde_json::{Value, json};

/// Drives the full startup sequence.
pub fn run_startup(registry: &Registry) {
    for phase in [
        LoadPhase::PreCacheInit,
        LoadPhase::PostCacheInit,
        LoadPhase::PreLibraryInit,
        LoadPhase::PostLibraryInit,
    ] {
        registry.advance_phase(phase).unwrap();
    }
}

/// Creates a package skeleton (root + `Assets/`) under `base`.
pub fn package_dir(base: &Path, id: &str) -> PathBuf {
    let root = base.join(id);
    std::fs::create_dir_all(root.join("Assets")).unwrap();
    root
}

/// Writes a `loadstone.json` manifest at the package root.
pub fn write_manifest(root: &Path, manifest: Value) {
    std::fs::write(root.join("loadstone.json"), manifest.to_string()).unwrap();
}

/// Writes one JSON document at a package-relative path.
pub fn write_doc(root: &Path, relative: &str, doc: Value) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, doc.to_string()).unwrap();
}

/// Writes an archive blob plus its manifest index under `Assets/`.
pub fn write_archive(root: &Path, stem: &str, entries: &[(&str, &[u8])]) {
    let archive_path = root.join("Assets").join(stem);
    let mut blob = Vec::new();
    let mut index = Vec::new();
    for (name, bytes) in entries {
        index.push(json!({
            "name": name,
            "offset": blob.len(),
            "len": bytes.len(),
        }));
        blob.extend_from_slice(bytes);
    }
    std::fs::File::create(&archive_path)
        .unwrap()
        .write_all(&blob)
        .unwrap();
    std::fs::write(
        archive_path.with_file_name(format!("{stem}.manifest")),
        json!({ "entries": index }).to_string(),
    )
    .unwrap();
}
