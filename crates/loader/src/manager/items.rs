//! Item managers.
//!
//! One manager per equipment slot, all adapting the host's shared item
//! cache keyed by item name. Duplicates replace in place.

use std::rc::Rc;

use host_model::{Asset, HostCatalog};
use serde_json::Value;

use super::{Cache, ContentManager, ItemCacheAdapter, document_string};
use crate::category::Category;

pub struct ItemManager {
    concrete: Category,
    cache: ItemCacheAdapter,
}

impl ItemManager {
    pub fn new(concrete: Category, host: Rc<HostCatalog>) -> Self {
        debug_assert!(Category::ITEMS.contains(&concrete));
        Self {
            concrete,
            cache: ItemCacheAdapter::new(host),
        }
    }
}

impl ContentManager for ItemManager {
    fn category(&self) -> Category {
        self.concrete
    }

    fn object_identity(&self, asset: &Asset) -> Option<String> {
        asset.as_item().map(|i| i.borrow().item_name.clone())
    }

    fn document_key(&self, document: &Value) -> Option<String> {
        document_string(document, "item_name")
    }

    fn cache(&self) -> &dyn Cache {
        &self.cache
    }
}
