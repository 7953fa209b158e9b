//! Native object model of the host application.
//!
//! The loader treats the host as an external collaborator: it never owns the
//! host's content types, it only populates and registers them. This crate is
//! that boundary surface — the content object types with their natural-key
//! identities, the shared-handle [`Asset`] wrapper, and [`HostCatalog`], the
//! host's own content caches plus its native resource store.
//!
//! Everything here is single-threaded by construction: content is loaded once
//! at startup from the host's main thread, so handles are `Rc<RefCell<_>>`
//! rather than locked.

mod asset;
mod catalog;
mod condition;
mod item;
mod shop;
mod skill;

pub use asset::{Asset, BinaryAsset, Shared, shared};
pub use catalog::HostCatalog;
pub use condition::{Condition, ConditionKind, PolymorphData, SceneTransferData, StatEffect, StatusData};
pub use item::{ArmorData, Item, ItemKind, Rarity, TradeData, TrinketData, WeaponData};
pub use shop::{Shopkeep, StockEntry};
pub use skill::{DamageType, Skill, SkillRank};
