//! Cache shapes behind the manager abstraction.
//!
//! A category's cache is either owned by the loader (the host has no
//! catalog for it) or a view over one of the host's native maps. Managers
//! receive the trait, not the shape, so the rest of the system never
//! branches on which one it got.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use host_model::{Asset, HostCatalog};
use tracing::error;

/// String-keyed asset cache.
pub trait Cache {
    fn get(&self, key: &str) -> Option<Asset>;

    /// Inserts under a key. Returns `false` (and logs) when the asset's
    /// type does not fit the cache; host adapters are typed.
    fn insert(&self, key: &str, asset: Asset) -> bool;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in unspecified order.
    fn keys(&self) -> Vec<String>;
}

/// Loader-owned dictionary for categories with no host-native catalog.
pub struct OwnedCache {
    entries: RefCell<HashMap<String, Asset>>,
}

impl OwnedCache {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
        }
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl Default for OwnedCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache for OwnedCache {
    fn get(&self, key: &str) -> Option<Asset> {
        self.entries.borrow().get(key).cloned()
    }

    fn insert(&self, key: &str, asset: Asset) -> bool {
        self.entries.borrow_mut().insert(key.to_string(), asset);
        true
    }

    fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }
}

fn reject(cache: &str, key: &str, asset: &Asset) -> bool {
    error!(
        target: "loadstone::manager",
        cache,
        key,
        kind = asset.kind_name(),
        "asset type does not fit this cache"
    );
    false
}

/// View over the host's native skill cache.
pub struct SkillCacheAdapter {
    host: Rc<HostCatalog>,
}

impl SkillCacheAdapter {
    pub fn new(host: Rc<HostCatalog>) -> Self {
        Self { host }
    }
}

impl Cache for SkillCacheAdapter {
    fn get(&self, key: &str) -> Option<Asset> {
        self.host.skills.borrow().get(key).cloned().map(Asset::Skill)
    }

    fn insert(&self, key: &str, asset: Asset) -> bool {
        match asset.as_skill() {
            Some(skill) => {
                self.host
                    .skills
                    .borrow_mut()
                    .insert(key.to_string(), skill.clone());
                true
            }
            None => reject("skills", key, &asset),
        }
    }

    fn keys(&self) -> Vec<String> {
        self.host.skills.borrow().keys().cloned().collect()
    }
}

/// View over the host's native condition cache. All three concrete
/// condition categories share it.
pub struct ConditionCacheAdapter {
    host: Rc<HostCatalog>,
}

impl ConditionCacheAdapter {
    pub fn new(host: Rc<HostCatalog>) -> Self {
        Self { host }
    }
}

impl Cache for ConditionCacheAdapter {
    fn get(&self, key: &str) -> Option<Asset> {
        self.host
            .conditions
            .borrow()
            .get(key)
            .cloned()
            .map(Asset::Condition)
    }

    fn insert(&self, key: &str, asset: Asset) -> bool {
        match asset.as_condition() {
            Some(condition) => {
                self.host
                    .conditions
                    .borrow_mut()
                    .insert(key.to_string(), condition.clone());
                true
            }
            None => reject("conditions", key, &asset),
        }
    }

    fn keys(&self) -> Vec<String> {
        self.host.conditions.borrow().keys().cloned().collect()
    }
}

/// View over the host's native item cache, shared by every equipment slot.
pub struct ItemCacheAdapter {
    host: Rc<HostCatalog>,
}

impl ItemCacheAdapter {
    pub fn new(host: Rc<HostCatalog>) -> Self {
        Self { host }
    }
}

impl Cache for ItemCacheAdapter {
    fn get(&self, key: &str) -> Option<Asset> {
        self.host.items.borrow().get(key).cloned().map(Asset::Item)
    }

    fn insert(&self, key: &str, asset: Asset) -> bool {
        match asset.as_item() {
            Some(item) => {
                self.host
                    .items
                    .borrow_mut()
                    .insert(key.to_string(), item.clone());
                true
            }
            None => reject("items", key, &asset),
        }
    }

    fn keys(&self) -> Vec<String> {
        self.host.items.borrow().keys().cloned().collect()
    }
}
