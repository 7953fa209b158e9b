//! Shared handles and the asset wrapper the loader passes around.

use std::cell::RefCell;
use std::rc::Rc;

use crate::{Condition, Item, Shopkeep, Skill};

/// Shared, mutable handle to a content object.
///
/// Identity is the allocation: everyone holding a clone of the handle sees
/// in-place replacements, which is what lets a package override an object
/// other code already references.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wraps a value in a fresh [`Shared`] handle.
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// An opaque binary asset pulled out of a package archive or the host's
/// resource store (texture, audio clip, model — the loader never interprets
/// the bytes).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BinaryAsset {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Any loadable asset, content object or binary blob.
#[derive(Clone)]
pub enum Asset {
    Skill(Shared<Skill>),
    Condition(Shared<Condition>),
    Item(Shared<Item>),
    Shopkeep(Shared<Shopkeep>),
    Binary(Shared<BinaryAsset>),
}

impl Asset {
    /// Short label for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Asset::Skill(_) => "skill",
            Asset::Condition(_) => "condition",
            Asset::Item(_) => "item",
            Asset::Shopkeep(_) => "shopkeep",
            Asset::Binary(_) => "binary",
        }
    }

    pub fn as_skill(&self) -> Option<&Shared<Skill>> {
        match self {
            Asset::Skill(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_condition(&self) -> Option<&Shared<Condition>> {
        match self {
            Asset::Condition(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_item(&self) -> Option<&Shared<Item>> {
        match self {
            Asset::Item(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_shopkeep(&self) -> Option<&Shared<Shopkeep>> {
        match self {
            Asset::Shopkeep(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&Shared<BinaryAsset>> {
        match self {
            Asset::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Pointer identity, ignoring which variant the handle sits in.
    pub fn same_instance(&self, other: &Asset) -> bool {
        match (self, other) {
            (Asset::Skill(a), Asset::Skill(b)) => Rc::ptr_eq(a, b),
            (Asset::Condition(a), Asset::Condition(b)) => Rc::ptr_eq(a, b),
            (Asset::Item(a), Asset::Item(b)) => Rc::ptr_eq(a, b),
            (Asset::Shopkeep(a), Asset::Shopkeep(b)) => Rc::ptr_eq(a, b),
            (Asset::Binary(a), Asset::Binary(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Asset::{}", self.kind_name())
    }
}
