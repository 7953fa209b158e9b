//! Per-package content store.
//!
//! A package is a named, path-rooted content source: opened binary archives
//! under `Assets/`, declarative JSON documents under per-category
//! directories, a path-keyed cache of parsed objects, and four ordered
//! delegate lists the package may populate to run its own code at each
//! lifecycle checkpoint.

use std::cell::{Cell, Ref, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use host_model::Asset;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::archive::{self, Archive};
use crate::category::Category;
use crate::document;
use crate::phase::LoadPhase;
use crate::registry::Registry;

/// Root-level descriptor letting a package with no executable module be
/// discovered and loaded purely for its declarative content.
pub const MANIFEST_FILE: &str = "loadstone.json";

/// Parsed `loadstone.json`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PackageManifest {
    pub id: String,
    pub name: String,
    pub author: String,
    pub description: String,
    pub version: String,
    pub min_host_version: String,
}

/// External code a package runs at a lifecycle checkpoint.
pub type PhaseCallback = Rc<dyn Fn(&Registry) -> anyhow::Result<()>>;

/// One registered content package.
pub struct Package {
    id: String,
    root: PathBuf,
    manifest: Option<PackageManifest>,
    archives: RefCell<Vec<Archive>>,
    /// Parsed declarative objects per concrete category, in load order.
    objects: RefCell<HashMap<Category, Vec<Asset>>>,
    /// Normalized relative path (forward slashes, no extension) → parsed
    /// object, so a document is never parsed twice.
    path_cache: RefCell<HashMap<String, Asset>>,
    delegates: RefCell<[Vec<PhaseCallback>; 4]>,
    unloaded: Cell<bool>,
}

impl Package {
    /// Creates the package store and eagerly opens its archives. A missing
    /// `Assets/` directory or malformed manifest degrades the package and is
    /// logged, never fatal.
    pub(crate) fn new(id: String, root: PathBuf) -> Self {
        let manifest = read_manifest(&id, &root);

        let assets_dir = root.join("Assets");
        let archives = if assets_dir.is_dir() {
            archive::open_archives(&assets_dir)
        } else {
            error!(
                target: "loadstone::package",
                package = %id,
                root = %root.display(),
                "package has no Assets directory"
            );
            Vec::new()
        };

        info!(
            target: "loadstone::package",
            package = %id,
            archives = archives.len(),
            "registered package"
        );

        Self {
            id,
            root,
            manifest,
            archives: RefCell::new(archives),
            objects: RefCell::new(HashMap::new()),
            path_cache: RefCell::new(HashMap::new()),
            delegates: RefCell::new([Vec::new(), Vec::new(), Vec::new(), Vec::new()]),
            unloaded: Cell::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> Option<&PackageManifest> {
        self.manifest.as_ref()
    }

    pub fn is_unloaded(&self) -> bool {
        self.unloaded.get()
    }

    pub fn archives(&self) -> Ref<'_, Vec<Archive>> {
        self.archives.borrow()
    }

    /// Parses every document of one concrete category under the package
    /// root. Bad documents are logged and skipped.
    pub(crate) fn load_category(self: &Rc<Self>, category: Category, registry: &Registry) {
        let Some(dir) = category.storage_dir() else {
            return;
        };
        let base = self.root.join(&dir);
        if !base.is_dir() {
            return;
        }

        for path in json_files_under(&base) {
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");
            if self.load_document(&relative, category, registry).is_none() {
                error!(
                    target: "loadstone::package",
                    package = %self.id,
                    document = %relative,
                    category = category.as_ref(),
                    "failed to load document"
                );
            }
        }
    }

    /// Loads (or returns the cached parse of) one declarative document.
    pub(crate) fn load_document(
        self: &Rc<Self>,
        relative_path: &str,
        category: Category,
        registry: &Registry,
    ) -> Option<Asset> {
        if self.unloaded.get() {
            return None;
        }
        document::load_document(self, registry, relative_path, category)
    }

    /// Package-scoped asset lookup: archives before declarative documents.
    pub(crate) fn load_asset(
        self: &Rc<Self>,
        name: &str,
        category: Category,
        registry: &Registry,
    ) -> Option<Asset> {
        if self.unloaded.get() {
            return None;
        }

        if category == Category::Binary {
            for archive in self.archives.borrow().iter() {
                if let Some(blob) = archive.load(name) {
                    return Some(Asset::Binary(blob));
                }
            }
            return None;
        }

        self.load_document(name, category, registry)
    }

    /// Loaded objects of one category (members summed for abstract groups).
    pub fn objects_of(&self, category: Category) -> Vec<Asset> {
        let objects = self.objects.borrow();
        if category.is_abstract() {
            category
                .concrete_members()
                .iter()
                .flat_map(|member| objects.get(member).into_iter().flatten().cloned())
                .collect()
        } else {
            objects.get(&category).cloned().unwrap_or_default()
        }
    }

    pub(crate) fn record_object(&self, category: Category, asset: Asset) {
        self.objects
            .borrow_mut()
            .entry(category)
            .or_default()
            .push(asset);
    }

    pub(crate) fn cached_path(&self, path: &str) -> Option<Asset> {
        self.path_cache.borrow().get(path).cloned()
    }

    pub(crate) fn cache_path(&self, path: String, asset: Asset) {
        self.path_cache.borrow_mut().insert(path, asset);
    }

    pub(crate) fn add_delegate(&self, phase: LoadPhase, callback: PhaseCallback) {
        self.delegates.borrow_mut()[phase.index()].push(callback);
    }

    pub(crate) fn delegates_for(&self, phase: LoadPhase) -> Vec<PhaseCallback> {
        self.delegates.borrow()[phase.index()].clone()
    }

    /// Releases archives and drops the document cache and delegates. All
    /// archives are released even if one misbehaves; content already merged
    /// into shared caches stays merged.
    pub(crate) fn release(&self) {
        self.unloaded.set(true);
        // Dropping an Archive closes its file handle; drain so each one is
        // released individually.
        for archive in self.archives.borrow_mut().drain(..) {
            drop(archive);
        }
        self.path_cache.borrow_mut().clear();
        self.objects.borrow_mut().clear();
        for list in self.delegates.borrow_mut().iter_mut() {
            list.clear();
        }
        info!(target: "loadstone::package", package = %self.id, "unloaded package");
    }
}

fn read_manifest(id: &str, root: &Path) -> Option<PackageManifest> {
    let path = root.join(MANIFEST_FILE);
    if !path.is_file() {
        return None;
    }
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            error!(
                target: "loadstone::package",
                package = %id,
                error = %e,
                "failed to read package manifest"
            );
            return None;
        }
    };
    match serde_json::from_str::<PackageManifest>(&text) {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            error!(
                target: "loadstone::package",
                package = %id,
                error = %e,
                "malformed package manifest"
            );
            None
        }
    }
}

/// Logs a warning when a manifest requires a newer host than the one
/// running. The check never blocks the package from loading.
pub(crate) fn warn_if_host_too_old(manifest: &PackageManifest, package: &str, host_version: &str) {
    if manifest.min_host_version.is_empty() {
        return;
    }
    if version_key(&manifest.min_host_version) > version_key(host_version) {
        warn!(
            target: "loadstone::package",
            package,
            min_host_version = %manifest.min_host_version,
            host_version,
            "package targets a newer host version"
        );
    }
}

fn version_key(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|part| part.trim().parse::<u64>().unwrap_or(0))
        .collect()
}

fn json_files_under(base: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![base.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}
