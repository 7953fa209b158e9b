//! Binary archives: opaque keyed blob stores shipped inside packages.
//!
//! Any file under a package's `Assets/` tree with a sibling
//! `<file>.manifest` is an archive; files without the sibling are ignored.
//! The manifest is a JSON index of named entries (offset + length) into the
//! archive file — the archive bytes themselves are never interpreted. The
//! file handle is opened once at package load and held until the package is
//! unloaded.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use host_model::{BinaryAsset, Shared, shared};
use serde::Deserialize;
use tracing::{debug, error};

use crate::error::Result;

/// Extension of the sibling file marking (and indexing) an archive.
pub const MANIFEST_EXT: &str = "manifest";

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    name: String,
    offset: u64,
    len: u64,
}

#[derive(Debug, Deserialize)]
struct ArchiveManifest {
    entries: Vec<ManifestEntry>,
}

/// An opened archive. Reads are by entry name; decoded assets are cached so
/// repeated lookups hand out the same shared instance.
pub struct Archive {
    path: PathBuf,
    file: RefCell<File>,
    entries: HashMap<String, (u64, u64)>,
    order: Vec<String>,
    loaded: RefCell<HashMap<String, Shared<BinaryAsset>>>,
}

impl Archive {
    /// Opens an archive file and its manifest index. The caller has already
    /// checked that the manifest sibling exists.
    pub fn open(path: &Path) -> Result<Self> {
        let manifest_path = manifest_path_for(path);
        let manifest_text = std::fs::read_to_string(&manifest_path)?;
        let manifest: ArchiveManifest = serde_json::from_str(&manifest_text).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("malformed archive manifest {}: {e}", manifest_path.display()),
            )
        })?;

        let file = File::open(path)?;
        let mut entries = HashMap::new();
        let mut order = Vec::new();
        for entry in manifest.entries {
            let name = entry.name.replace('\\', "/");
            if entries
                .insert(name.clone(), (entry.offset, entry.len))
                .is_some()
            {
                error!(
                    target: "loadstone::archive",
                    archive = %path.display(),
                    entry = %name,
                    "duplicate entry name in archive manifest, keeping the later one"
                );
                continue;
            }
            order.push(name);
        }

        debug!(
            target: "loadstone::archive",
            archive = %path.display(),
            entries = order.len(),
            "opened archive"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: RefCell::new(file),
            entries,
            order,
            loaded: RefCell::new(HashMap::new()),
        })
    }

    /// The archive's display name (file stem).
    pub fn name(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("archive")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Entry names in manifest order, for the diagnostic dump.
    pub fn asset_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Reads one entry by name. Read failures are logged and reported as
    /// not-found; a missing blob is never fatal to the caller.
    pub fn load(&self, name: &str) -> Option<Shared<BinaryAsset>> {
        if let Some(asset) = self.loaded.borrow().get(name) {
            return Some(asset.clone());
        }

        let &(offset, len) = self.entries.get(name)?;
        let mut bytes = vec![0u8; len as usize];
        let read = {
            let mut file = self.file.borrow_mut();
            file.seek(SeekFrom::Start(offset))
                .and_then(|_| file.read_exact(&mut bytes))
        };
        if let Err(e) = read {
            error!(
                target: "loadstone::archive",
                archive = %self.path.display(),
                entry = name,
                error = %e,
                "failed to read archive entry"
            );
            return None;
        }

        let asset = shared(BinaryAsset {
            name: name.to_string(),
            bytes,
        });
        self.loaded
            .borrow_mut()
            .insert(name.to_string(), asset.clone());
        Some(asset)
    }
}

/// Path of the manifest sibling for an archive file.
pub fn manifest_path_for(archive: &Path) -> PathBuf {
    let mut name = archive.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(MANIFEST_EXT);
    archive.with_file_name(name)
}

/// Scans an `Assets/` tree for archive files and opens each one. Files that
/// are manifests, lack a manifest sibling, or fail to open are skipped with
/// a log; one bad archive never blocks the rest.
pub fn open_archives(assets_dir: &Path) -> Vec<Archive> {
    let mut archives = Vec::new();
    let mut pending = vec![assets_dir.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!(
                    target: "loadstone::archive",
                    dir = %dir.display(),
                    error = %e,
                    "failed to scan assets directory"
                );
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) == Some(MANIFEST_EXT) {
                continue;
            }
            if !manifest_path_for(&path).is_file() {
                // Not an archive, just a loose file.
                continue;
            }
            match Archive::open(&path) {
                Ok(archive) => archives.push(archive),
                Err(e) => error!(
                    target: "loadstone::archive",
                    archive = %path.display(),
                    error = %e,
                    "failed to open archive, skipping"
                ),
            }
        }
    }

    // Deterministic order regardless of directory iteration order.
    archives.sort_by(|a, b| a.path.cmp(&b.path));
    archives
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_archive(dir: &Path, stem: &str, entries: &[(&str, &[u8])]) -> PathBuf {
        let archive_path = dir.join(stem);
        let mut blob = Vec::new();
        let mut index = Vec::new();
        for (name, bytes) in entries {
            index.push(serde_json::json!({
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
            manifest_path_for(&archive_path),
            serde_json::json!({ "entries": index }).to_string(),
        )
        .unwrap();
        archive_path
    }

    #[test]
    fn loads_entries_by_name_and_caches_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), "pack.bin", &[("icons/hug", b"abcd"), ("snd/pop", b"xy")]);

        let archive = Archive::open(&path).unwrap();
        assert!(archive.contains("icons/hug"));
        let first = archive.load("icons/hug").unwrap();
        assert_eq!(first.borrow().bytes, b"abcd");
        let second = archive.load("icons/hug").unwrap();
        assert!(std::rc::Rc::ptr_eq(&first, &second));
        assert_eq!(archive.load("snd/pop").unwrap().borrow().bytes, b"xy");
        assert!(archive.load("missing").is_none());
    }

    #[test]
    fn files_without_manifest_sibling_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "real.bin", &[("a", b"1")]);
        std::fs::write(dir.path().join("loose.bin"), b"junk").unwrap();

        let archives = open_archives(dir.path());
        assert_eq!(archives.len(), 1);
        assert_eq!(archives[0].name(), "real");
    }
}
