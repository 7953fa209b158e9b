//! Condition managers.
//!
//! One manager per concrete condition category; all three adapt the host's
//! shared condition cache. The natural key is the name + rank pair, so
//! every rank of a condition caches separately. Duplicates replace in
//! place: packages are expected to override each other's conditions.

use std::rc::Rc;

use host_model::{Asset, HostCatalog};
use serde_json::Value;

use super::{Cache, ConditionCacheAdapter, ContentManager, document_string};
use crate::category::Category;

pub struct ConditionManager {
    concrete: Category,
    cache: ConditionCacheAdapter,
}

impl ConditionManager {
    pub fn new(concrete: Category, host: Rc<HostCatalog>) -> Self {
        debug_assert!(Category::CONDITIONS.contains(&concrete));
        Self {
            concrete,
            cache: ConditionCacheAdapter::new(host),
        }
    }
}

impl ContentManager for ConditionManager {
    fn category(&self) -> Category {
        self.concrete
    }

    fn object_identity(&self, asset: &Asset) -> Option<String> {
        asset.as_condition().map(|c| c.borrow().cache_key())
    }

    fn document_key(&self, document: &Value) -> Option<String> {
        let name = document_string(document, "condition_name")?;
        let rank = document.get("rank").and_then(Value::as_u64).unwrap_or(0);
        Some(format!("{name}_{rank}"))
    }

    fn cache(&self) -> &dyn Cache {
        &self.cache
    }
}
