//! The host's own content catalogs and resource store.
//!
//! In the real host these maps are built during its cache-initialization
//! step; the loader merges package content into them and adapts them behind
//! its cache trait. The resource store is the last stop of every bare-name
//! lookup.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::{Asset, Condition, Item, Shared, Skill};

pub struct HostCatalog {
    version: String,
    /// Skill cache, keyed by skill name.
    pub skills: RefCell<HashMap<String, Shared<Skill>>>,
    /// Condition cache, keyed by `<name>_<rank>`.
    pub conditions: RefCell<HashMap<String, Shared<Condition>>>,
    /// Item cache, keyed by item name. All equipment slots share it.
    pub items: RefCell<HashMap<String, Shared<Item>>>,
    /// Skills every player knows; order matters to the host's skill library.
    pub general_skills: RefCell<Vec<Shared<Skill>>>,
    resources: RefCell<HashMap<String, Asset>>,
}

impl HostCatalog {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            skills: RefCell::new(HashMap::new()),
            conditions: RefCell::new(HashMap::new()),
            items: RefCell::new(HashMap::new()),
            general_skills: RefCell::new(Vec::new()),
            resources: RefCell::new(HashMap::new()),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn locate_skill(&self, name: &str) -> Option<Shared<Skill>> {
        self.skills.borrow().get(name).cloned()
    }

    /// Looks up the host-native resource store by asset name.
    pub fn resource(&self, name: &str) -> Option<Asset> {
        self.resources.borrow().get(name).cloned()
    }

    /// Seeds the native resource store. The real host fills this from its
    /// own asset database; tests and the CLI fill it directly.
    pub fn insert_resource(&self, name: impl Into<String>, asset: Asset) {
        self.resources.borrow_mut().insert(name.into(), asset);
    }

    /// Snapshot of every native resource, for managers that bootstrap their
    /// cache from host content.
    pub fn resources(&self) -> Vec<(String, Asset)> {
        self.resources
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Default for HostCatalog {
    fn default() -> Self {
        Self::new("0.0.0")
    }
}
