//! The registry: package store, manager set, and lifecycle dispatch in one
//! explicit context object.
//!
//! Everything the loader knows hangs off a `Registry` handed down by the
//! embedder; there is no global state. Construction wires the fixed manager
//! set into the state machine ahead of the package broadcaster, so on every
//! phase transition the managers run first and package delegates see their
//! results.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use host_model::{Asset, HostCatalog, Shared, Skill};
use tracing::{error, info, warn};

use crate::category::Category;
use crate::error::{LoaderError, Result};
use crate::manager::{
    ConditionManager, ContentManager, ItemManager, ShopkeepManager, SkillManager, merge_in_place,
};
use crate::package::{self, MANIFEST_FILE, Package, PhaseCallback};
use crate::phase::{LoadPhase, PhaseObserver, StateMachine};

pub struct Registry {
    host: Rc<HostCatalog>,
    packages: RefCell<Vec<Rc<Package>>>,
    managers: Vec<Rc<dyn ContentManager>>,
    machine: StateMachine,
}

impl Registry {
    /// Builds a registry over the given host catalog, with one manager per
    /// concrete declarative category already subscribed to the lifecycle.
    pub fn new(host: Rc<HostCatalog>) -> Self {
        let mut managers: Vec<Rc<dyn ContentManager>> = Vec::new();
        managers.push(Rc::new(SkillManager::new(host.clone())));
        for &concrete in Category::CONDITIONS {
            managers.push(Rc::new(ConditionManager::new(concrete, host.clone())));
        }
        for &concrete in Category::ITEMS {
            managers.push(Rc::new(ItemManager::new(concrete, host.clone())));
        }
        managers.push(Rc::new(ShopkeepManager::new(host.clone())));

        let machine = StateMachine::new();
        for manager in &managers {
            machine.register(Rc::new(ManagerObserver {
                name: format!("manager:{}", manager.category().as_ref()),
                manager: manager.clone(),
            }));
        }
        // Package delegates run after every manager has seen the phase.
        machine.register(Rc::new(PackageBroadcaster));

        Self {
            host,
            packages: RefCell::new(Vec::new()),
            managers,
            machine,
        }
    }

    pub fn host(&self) -> &Rc<HostCatalog> {
        &self.host
    }

    /// Registers a content package rooted at `root`. Idempotent by
    /// case-insensitive id: re-registration returns the existing handle.
    pub fn register_package(&self, id: &str, root: &Path) -> Rc<Package> {
        let id = id.to_lowercase();
        if let Some(existing) = self.package(&id) {
            return existing;
        }

        let package = Rc::new(Package::new(id.clone(), root.to_path_buf()));
        if let Some(manifest) = package.manifest() {
            package::warn_if_host_too_old(manifest, &id, self.host.version());
        }
        self.packages.borrow_mut().push(package.clone());
        package
    }

    /// Scans `dir`'s child directories for a package manifest and registers
    /// each match. The package id comes from the manifest, falling back to
    /// the directory name. Returns the packages in scan order.
    pub fn discover_packages(&self, dir: &Path) -> Vec<Rc<Package>> {
        let mut roots = Vec::new();
        match std::fs::read_dir(dir) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    let root = entry.path();
                    if root.is_dir() && root.join(MANIFEST_FILE).is_file() {
                        roots.push(root);
                    }
                }
            }
            Err(e) => {
                error!(
                    target: "loadstone::registry",
                    dir = %dir.display(),
                    error = %e,
                    "cannot scan package directory"
                );
                return Vec::new();
            }
        }
        roots.sort();

        let mut found = Vec::new();
        for root in roots {
            // The manifest names the package; the directory is the fallback.
            let id = manifest_id(&root).unwrap_or_else(|| {
                root.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
            if id.is_empty() {
                continue;
            }
            found.push(self.register_package(&id, &root));
        }
        info!(
            target: "loadstone::registry",
            dir = %dir.display(),
            packages = found.len(),
            "discovered packages"
        );
        found
    }

    /// Case-insensitive package lookup.
    pub fn package(&self, id: &str) -> Option<Rc<Package>> {
        self.packages
            .borrow()
            .iter()
            .find(|p| p.id().eq_ignore_ascii_case(id))
            .cloned()
    }

    /// Packages in registration order.
    pub fn packages(&self) -> Vec<Rc<Package>> {
        self.packages.borrow().clone()
    }

    /// Releases a package's archives, document cache, and delegates, and
    /// forgets it. Content the package already merged into shared caches
    /// stays merged; unloading is a resource release, not a retraction.
    pub fn unload_package(&self, id: &str) -> Result<()> {
        let mut packages = self.packages.borrow_mut();
        let Some(index) = packages.iter().position(|p| p.id().eq_ignore_ascii_case(id)) else {
            return Err(LoaderError::PackageNotFound(id.to_string()));
        };
        let package = packages.remove(index);
        drop(packages);
        package.release();
        Ok(())
    }

    /// Resolves an asset by qualified name.
    ///
    /// `pkg:name` resolves only in that package. A bare name probes every
    /// package in registration order, then the host's native resource
    /// store. Backslashes normalize to forward slashes. Misses log and
    /// return `None`, never panic.
    pub fn load_asset(&self, name: &str, category: Category) -> Option<Asset> {
        if name.is_empty() {
            return None;
        }
        let name = name.replace('\\', "/");

        if let Some((package_id, rest)) = name.split_once(':') {
            let Some(package) = self.package(package_id) else {
                error!(
                    target: "loadstone::registry",
                    name = %name,
                    package = package_id,
                    "qualified name addresses an unknown package"
                );
                return None;
            };
            let found = package.load_asset(rest, category, self);
            if found.is_none() {
                error!(
                    target: "loadstone::registry",
                    name = %name,
                    category = category.as_ref(),
                    "asset not found in its package"
                );
            }
            return found;
        }

        for package in self.packages() {
            if let Some(asset) = package.load_asset(&name, category, self) {
                return Some(asset);
            }
        }

        if let Some(asset) = self.host.resource(&name) {
            if category.accepts(&asset) {
                return Some(asset);
            }
            warn!(
                target: "loadstone::registry",
                name = %name,
                wanted = category.as_ref(),
                found = asset.kind_name(),
                "host resource has the wrong type"
            );
        }

        error!(
            target: "loadstone::registry",
            name = %name,
            category = category.as_ref(),
            "asset not found in any package or host resource"
        );
        None
    }

    /// Every loaded object of a category across all packages, in package
    /// registration order.
    pub fn get_content_objects(&self, category: Category) -> Vec<Asset> {
        self.packages()
            .iter()
            .flat_map(|p| p.objects_of(category))
            .collect()
    }

    /// Loaded objects of a category in one package.
    pub fn get_package_content_objects(
        &self,
        package_id: &str,
        category: Category,
    ) -> Result<Vec<Asset>> {
        let package = self
            .package(package_id)
            .ok_or_else(|| LoaderError::PackageNotFound(package_id.to_string()))?;
        Ok(package.objects_of(category))
    }

    /// Subscribes a package-scoped callback to one lifecycle phase.
    /// Unloading the package drops the callback.
    pub fn register_phase_observer(
        &self,
        package_id: &str,
        phase: LoadPhase,
        callback: PhaseCallback,
    ) -> Result<()> {
        let package = self
            .package(package_id)
            .ok_or_else(|| LoaderError::PackageNotFound(package_id.to_string()))?;
        package.add_delegate(phase, callback);
        Ok(())
    }

    pub fn current_phase(&self) -> Option<LoadPhase> {
        self.machine.state()
    }

    /// Enters the next lifecycle phase: managers first, then every
    /// package's delegates, all in registration order.
    pub fn advance_phase(&self, next: LoadPhase) -> Result<()> {
        self.machine.advance(next, self)
    }

    /// The manager owning a category. Abstract groups answer with their
    /// first member's manager; the members of a group share a cache, so any
    /// of them can answer a key probe.
    pub fn manager_for(&self, category: Category) -> Option<&Rc<dyn ContentManager>> {
        let concrete = if category.is_abstract() {
            *category.concrete_members().first()?
        } else {
            category
        };
        self.managers.iter().find(|m| m.category() == concrete)
    }

    /// Adds a skill to the host's general-skills list (deduplicated by
    /// handle), ensuring it is also in the skill cache. Only valid through
    /// `PreLibraryInit`: the host consumes the list right after, so later
    /// additions would be silently invisible and are refused with a
    /// warning instead.
    pub fn register_general_skill(&self, skill: &Shared<Skill>) {
        if let Some(phase) = self.current_phase()
            && phase > LoadPhase::PreLibraryInit
        {
            warn!(
                target: "loadstone::registry",
                skill = %skill.borrow().skill_name,
                phase = %phase,
                "general skill registered after the host built its library, ignoring"
            );
            return;
        }

        let name = skill.borrow().skill_name.clone();
        self.host
            .skills
            .borrow_mut()
            .entry(name)
            .or_insert_with(|| skill.clone());

        let mut generals = self.host.general_skills.borrow_mut();
        if !generals.iter().any(|g| Rc::ptr_eq(g, skill)) {
            generals.push(skill.clone());
        }
    }

    /// Overlays the cached object under `src_key` onto the one under
    /// `dest_key`, in place, so handles to the destination observe the
    /// source's values. Returns whether the copy happened.
    pub fn replace_cached(&self, category: Category, dest_key: &str, src_key: &str) -> bool {
        let Some(manager) = self.manager_for(category) else {
            error!(
                target: "loadstone::registry",
                category = category.as_ref(),
                "no manager owns this category"
            );
            return false;
        };
        let cache = manager.cache();
        let (Some(dest), Some(src)) = (cache.get(dest_key), cache.get(src_key)) else {
            error!(
                target: "loadstone::registry",
                category = category.as_ref(),
                dest = dest_key,
                src = src_key,
                "replace requires both keys to be cached"
            );
            return false;
        };
        merge_in_place(&dest, &src)
    }
}

fn manifest_id(root: &Path) -> Option<String> {
    let text = std::fs::read_to_string(root.join(MANIFEST_FILE)).ok()?;
    let value: serde_json::Value = serde_json::from_str(&text).ok()?;
    value
        .get("id")
        .and_then(serde_json::Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Adapts a content manager to the phase observer seam. Manager phase hooks
/// log their own failures and never abort the broadcast.
struct ManagerObserver {
    name: String,
    manager: Rc<dyn ContentManager>,
}

impl PhaseObserver for ManagerObserver {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_phase(&self, phase: LoadPhase, registry: &Registry) -> anyhow::Result<()> {
        self.manager.on_phase(phase, registry);
        Ok(())
    }
}

/// Runs every package's delegates for the phase, after the managers.
/// Delegate failures are contained per callback.
struct PackageBroadcaster;

impl PhaseObserver for PackageBroadcaster {
    fn name(&self) -> &str {
        "packages"
    }

    fn on_phase(&self, phase: LoadPhase, registry: &Registry) -> anyhow::Result<()> {
        for package in registry.packages() {
            for callback in package.delegates_for(phase) {
                if let Err(e) = callback(registry) {
                    error!(
                        target: "loadstone::registry",
                        package = package.id(),
                        phase = %phase,
                        error = %e,
                        "package phase delegate failed"
                    );
                }
            }
        }
        Ok(())
    }
}
