//! Shopkeeps. The host has no shopkeep catalog of its own, so the loader
//! keeps these in a cache it owns.

use serde::{Deserialize, Serialize};

/// One line of a shop's inventory. Items are referenced by item name so a
/// package can stock items it does not define itself.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockEntry {
    pub item: String,
    pub price: u32,
    /// Negative means unlimited.
    pub quantity: i32,
}

/// A shopkeep. Natural key: `shop_name`.
#[derive(Clone, Debug, Default)]
pub struct Shopkeep {
    pub shop_name: String,
    pub greeting: String,
    pub stock: Vec<StockEntry>,
}
