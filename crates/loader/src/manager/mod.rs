//! Per-category content managers.
//!
//! One manager per concrete content category. A manager owns the category's
//! identity rules (natural-key extraction from objects and from raw
//! documents), its cache shape, and its duplicate policy, and it reacts to
//! lifecycle phases: package documents parse during `PreCacheInit`, the
//! registration sweep into caches runs during `PostCacheInit`.
//!
//! Failure semantics: malformed or duplicate registrations are logged and
//! skipped; they never abort the rest of the category or other categories.

mod cache;
mod conditions;
mod items;
mod shops;
mod skills;

pub use cache::{Cache, ConditionCacheAdapter, ItemCacheAdapter, OwnedCache, SkillCacheAdapter};
pub use conditions::ConditionManager;
pub use items::ItemManager;
pub use shops::ShopkeepManager;
pub use skills::SkillManager;

use host_model::Asset;
use serde_json::Value;
use tracing::{error, info};

use crate::category::Category;
use crate::phase::LoadPhase;
use crate::registry::Registry;

pub trait ContentManager {
    /// The concrete category this manager owns.
    fn category(&self) -> Category;

    /// Natural key of a loaded object; `None` when the asset is the wrong
    /// type or has no usable identity.
    fn object_identity(&self, asset: &Asset) -> Option<String>;

    /// Natural key extracted from a raw document, so duplicates can be
    /// detected before full deserialization.
    fn document_key(&self, document: &Value) -> Option<String>;

    fn cache(&self) -> &dyn Cache;

    /// Duplicate policy: replace the cached object's value in place (the
    /// default) or reject the second registration.
    fn replaces_duplicates(&self) -> bool {
        true
    }

    /// Phase hook. The default wires the two cache-init phases; categories
    /// override selectively and call the helpers for the parts they keep.
    fn on_phase(&self, phase: LoadPhase, registry: &Registry) {
        match phase {
            LoadPhase::PreCacheInit => self.load_package_documents(registry),
            LoadPhase::PostCacheInit => self.load_from_packages(registry),
            LoadPhase::PreLibraryInit | LoadPhase::PostLibraryInit => {}
        }
    }

    /// Parses this category's documents in every registered package.
    fn load_package_documents(&self, registry: &Registry) {
        for package in registry.packages() {
            package.load_category(self.category(), registry);
        }
    }

    /// Registers every package-loaded object of this category into the
    /// cache, applying the duplicate policy.
    fn load_from_packages(&self, registry: &Registry) {
        for asset in registry.get_content_objects(self.category()) {
            self.register(asset);
        }
    }

    /// Attempts one registration. On a natural-key collision the cached
    /// object is either updated in place — preserving its identity for
    /// anyone already holding the handle — or the newcomer is rejected.
    fn register(&self, asset: Asset) {
        let Some(key) = self.object_identity(&asset).filter(|k| !k.is_empty()) else {
            error!(
                target: "loadstone::manager",
                category = self.category().as_ref(),
                "object has no usable natural key, skipping registration"
            );
            return;
        };

        match self.cache().get(&key) {
            None => {
                self.cache().insert(&key, asset);
            }
            Some(existing) if existing.same_instance(&asset) => {}
            Some(existing) => {
                if self.replaces_duplicates() {
                    info!(
                        target: "loadstone::manager",
                        category = self.category().as_ref(),
                        key = %key,
                        "replacing cached object in place"
                    );
                    merge_in_place(&existing, &asset);
                } else {
                    error!(
                        target: "loadstone::manager",
                        category = self.category().as_ref(),
                        key = %key,
                        "duplicate registration rejected"
                    );
                }
            }
        }
    }
}

/// Copies `src`'s value into `dest`'s allocation, so every handle already
/// pointing at `dest` observes the new values. Type mismatches are logged
/// and abort the copy for that one object only.
pub(crate) fn merge_in_place(dest: &Asset, src: &Asset) -> bool {
    if dest.same_instance(src) {
        return true;
    }
    match (dest, src) {
        (Asset::Skill(d), Asset::Skill(s)) => {
            let value = s.borrow().clone();
            *d.borrow_mut() = value;
            true
        }
        (Asset::Condition(d), Asset::Condition(s)) => {
            let value = s.borrow().clone();
            *d.borrow_mut() = value;
            true
        }
        (Asset::Item(d), Asset::Item(s)) => {
            let value = s.borrow().clone();
            *d.borrow_mut() = value;
            true
        }
        (Asset::Shopkeep(d), Asset::Shopkeep(s)) => {
            let value = s.borrow().clone();
            *d.borrow_mut() = value;
            true
        }
        (Asset::Binary(d), Asset::Binary(s)) => {
            let value = s.borrow().clone();
            *d.borrow_mut() = value;
            true
        }
        (dest, src) => {
            error!(
                target: "loadstone::manager",
                dest = dest.kind_name(),
                src = src.kind_name(),
                "cannot merge across asset types"
            );
            false
        }
    }
}

pub(crate) fn document_string(document: &Value, field: &str) -> Option<String> {
    document
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
