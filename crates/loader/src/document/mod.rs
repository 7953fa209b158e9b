//! Declarative document deserialization.
//!
//! A document is a JSON file describing one content object. Loading one:
//! resolve the (possibly abstract) target category from the storage path,
//! check the package's path cache, construct the concrete native type,
//! then populate fields — scalar fields straight from the document,
//! category-typed and binary-typed fields as bare-name references resolved
//! through the registry, and sequence fields through the array patch
//! engine.
//!
//! The freshly constructed handle goes into the path cache *before* field
//! population. A circular reference (skill → condition → same skill)
//! therefore resolves to the in-progress instance instead of re-parsing it,
//! which is what bounds the recursion.

mod patch;
mod populate;

use std::rc::Rc;

use host_model::{
    Asset, Condition, ConditionKind, Item, ItemKind, Shopkeep, Skill, shared,
};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::category::Category;
use crate::package::Package;
use crate::registry::Registry;

pub(crate) use patch::apply_sequence;

/// Resolution context threaded through field population.
pub(crate) struct DocCtx<'a> {
    pub registry: &'a Registry,
    pub package: &'a Rc<Package>,
    /// Normalized document path, for log context.
    pub path: &'a str,
}

/// Normalizes a document path: forward slashes, no `.json` extension.
/// Documents are addressable with and without the extension.
pub(crate) fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let path = path.trim_start_matches("./").trim_matches('/');
    match path.len().checked_sub(5) {
        Some(cut) if path[cut..].eq_ignore_ascii_case(".json") => path[..cut].to_string(),
        _ => path.to_string(),
    }
}

/// Deserializes one document of `category` at `relative_path` inside
/// `package`. Returns the cached instance when the path was parsed before.
/// Empty or unreadable documents are not-found, never half-built objects.
pub(crate) fn load_document(
    package: &Rc<Package>,
    registry: &Registry,
    relative_path: &str,
    category: Category,
) -> Option<Asset> {
    let path = normalize_path(relative_path);
    if path.is_empty() {
        return None;
    }

    let concrete = category.resolve_for_path(&path)?;

    if let Some(asset) = package.cached_path(&path) {
        if concrete.accepts(&asset) {
            return Some(asset);
        }
        // A previous lookup parsed this document under another category
        // (a mistyped reference, usually). Fall through and re-parse under
        // the requested one; the fresh instance overwrites the cache slot.
        warn!(
            target: "loadstone::document",
            package = package.id(),
            document = %path,
            cached = asset.kind_name(),
            requested = concrete.as_ref(),
            "cached object has the wrong category, reparsing"
        );
    }

    let file = package.root().join(format!("{path}.json"));
    let text = match std::fs::read_to_string(&file) {
        Ok(text) => text,
        // Missing files are routine: every package is probed during
        // bare-name resolution.
        Err(_) => return None,
    };
    if text.trim().is_empty() {
        error!(
            target: "loadstone::document",
            package = package.id(),
            document = %path,
            "document is empty"
        );
        return None;
    }

    let value: Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(e) => {
            error!(
                target: "loadstone::document",
                package = package.id(),
                document = %path,
                error = %e,
                "document is not valid JSON"
            );
            return None;
        }
    };
    let Value::Object(fields) = &value else {
        error!(
            target: "loadstone::document",
            package = package.id(),
            document = %path,
            "document root must be an object"
        );
        return None;
    };

    // When the category cache already holds this natural key, seed the new
    // instance from the cached value so a partial document overlays fields
    // and array patches apply against the existing sequences.
    let seed = registry.manager_for(concrete).and_then(|manager| {
        let key = manager.document_key(&value)?;
        let cached = manager.cache().get(&key)?;
        if Category::of_asset(&cached) == concrete {
            Some(cached)
        } else {
            debug!(
                target: "loadstone::document",
                document = %path,
                key = %key,
                cached = cached.kind_name(),
                "cached object under this key has a different concrete type, not seeding"
            );
            None
        }
    });

    let asset = construct(concrete, seed.as_ref())?;

    // Cache before populating: cycle safety.
    package.cache_path(path.clone(), asset.clone());
    package.record_object(concrete, asset.clone());

    let ctx = DocCtx {
        registry,
        package,
        path: &path,
    };
    populate::populate(&asset, fields, &ctx);

    Some(asset)
}

/// Constructs an empty (or cache-seeded) instance of the concrete
/// category's native representation. Construction dispatches on the
/// category tag; abstract categories and `Binary` are not constructible.
fn construct(concrete: Category, seed: Option<&Asset>) -> Option<Asset> {
    let asset = match concrete {
        Category::Skill => {
            let value = seed
                .and_then(Asset::as_skill)
                .map(|s| s.borrow().clone())
                .unwrap_or_else(Skill::default);
            Asset::Skill(shared(value))
        }
        Category::StatusCondition
        | Category::SceneTransferCondition
        | Category::PolymorphCondition => {
            let value = seed
                .and_then(Asset::as_condition)
                .map(|c| c.borrow().clone())
                .unwrap_or_else(|| Condition {
                    kind: condition_kind_for(concrete),
                    ..Condition::default()
                });
            Asset::Condition(shared(value))
        }
        Category::Weapon
        | Category::Chestpiece
        | Category::Helm
        | Category::Ring
        | Category::Shield
        | Category::TradeItem => {
            let value = seed
                .and_then(Asset::as_item)
                .map(|i| i.borrow().clone())
                .unwrap_or_else(|| Item {
                    kind: item_kind_for(concrete),
                    ..Item::default()
                });
            Asset::Item(shared(value))
        }
        Category::Shopkeep => {
            let value = seed
                .and_then(Asset::as_shopkeep)
                .map(|s| s.borrow().clone())
                .unwrap_or_else(Shopkeep::default);
            Asset::Shopkeep(shared(value))
        }
        Category::Binary | Category::Condition | Category::Item => return None,
    };
    Some(asset)
}

fn condition_kind_for(concrete: Category) -> ConditionKind {
    match concrete {
        Category::SceneTransferCondition => ConditionKind::SceneTransfer(Default::default()),
        Category::PolymorphCondition => ConditionKind::Polymorph(Default::default()),
        _ => ConditionKind::Status(Default::default()),
    }
}

fn item_kind_for(concrete: Category) -> ItemKind {
    match concrete {
        Category::Weapon => ItemKind::Weapon(Default::default()),
        Category::Chestpiece => ItemKind::Chestpiece(Default::default()),
        Category::Helm => ItemKind::Helm(Default::default()),
        Category::Ring => ItemKind::Ring(Default::default()),
        Category::Shield => ItemKind::Shield(Default::default()),
        _ => ItemKind::TradeItem(Default::default()),
    }
}
