//! Item objects. One struct per cache entry; the equipment slot lives in
//! [`ItemKind`], chosen by the loader from the document's directory.

use serde::{Deserialize, Serialize};

use crate::{BinaryAsset, Shared};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponData {
    pub damage: f32,
    pub attack_speed: f32,
    pub two_handed: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmorData {
    pub defense: f32,
    pub magic_defense: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrinketData {
    pub stat: String,
    pub bonus: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeData {
    pub stack_value: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ItemKind {
    Weapon(WeaponData),
    Chestpiece(ArmorData),
    Helm(ArmorData),
    Ring(TrinketData),
    Shield(ArmorData),
    TradeItem(TradeData),
}

impl Default for ItemKind {
    fn default() -> Self {
        ItemKind::TradeItem(TradeData::default())
    }
}

/// An inventory item. Natural key: `item_name`.
#[derive(Clone, Debug, Default)]
pub struct Item {
    pub item_name: String,
    pub description: String,
    pub rarity: Rarity,
    pub max_stack: u32,
    pub value: u32,
    pub kind: ItemKind,
    pub icon: Option<Shared<BinaryAsset>>,
}
