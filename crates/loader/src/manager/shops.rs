//! Shopkeep manager.
//!
//! The host has no native shopkeep catalog, so this manager owns its own
//! cache and rebuilds it every `PreCacheInit`: first a snapshot of the
//! host's built-in shopkeeps out of the resource store, then the package
//! documents on top. Duplicate names are rejected — two shops with one
//! name would fight over the same stall.

use std::rc::Rc;

use host_model::{Asset, HostCatalog};
use serde_json::Value;
use tracing::error;

use super::{Cache, ContentManager, OwnedCache, document_string};
use crate::category::Category;
use crate::phase::LoadPhase;
use crate::registry::Registry;

pub struct ShopkeepManager {
    host: Rc<HostCatalog>,
    cache: OwnedCache,
}

impl ShopkeepManager {
    pub fn new(host: Rc<HostCatalog>) -> Self {
        Self {
            host,
            cache: OwnedCache::new(),
        }
    }

    /// Drops the previous cache and re-seeds it from the host's built-in
    /// shopkeeps, so package registrations collide against host content.
    fn snapshot_host_shops(&self) {
        self.cache.clear();
        for (_, asset) in self.host.resources() {
            let Some(shop) = asset.as_shopkeep() else {
                continue;
            };
            let name = shop.borrow().shop_name.clone();
            if self.cache.contains(&name) {
                error!(
                    target: "loadstone::manager",
                    shop = %name,
                    "host resource store holds two shopkeeps with one name"
                );
                continue;
            }
            self.cache.insert(&name, asset);
        }
    }
}

impl ContentManager for ShopkeepManager {
    fn category(&self) -> Category {
        Category::Shopkeep
    }

    fn object_identity(&self, asset: &Asset) -> Option<String> {
        asset.as_shopkeep().map(|s| s.borrow().shop_name.clone())
    }

    fn document_key(&self, document: &Value) -> Option<String> {
        document_string(document, "shop_name")
    }

    fn cache(&self) -> &dyn Cache {
        &self.cache
    }

    fn replaces_duplicates(&self) -> bool {
        false
    }

    fn on_phase(&self, phase: LoadPhase, registry: &Registry) {
        match phase {
            LoadPhase::PreCacheInit => {
                self.snapshot_host_shops();
                self.load_package_documents(registry);
            }
            LoadPhase::PostCacheInit => self.load_from_packages(registry),
            LoadPhase::PreLibraryInit | LoadPhase::PostLibraryInit => {}
        }
    }
}
