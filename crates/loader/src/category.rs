//! Content categories and abstract-category resolution.
//!
//! A category is a named kind of loadable content. Most are concrete
//! (directly instantiable); `Condition` and `Item` are abstract groups
//! resolved to a concrete member from the document's storage path, never
//! from the document body. The mapping is a static table over this enum —
//! construction dispatches on the tag.

use host_model::{Asset, ConditionKind, ItemKind};
use tracing::warn;

/// A kind of loadable content.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Category {
    // Concrete, declarative.
    Skill,
    StatusCondition,
    SceneTransferCondition,
    PolymorphCondition,
    Weapon,
    Chestpiece,
    Helm,
    Ring,
    Shield,
    TradeItem,
    Shopkeep,
    /// Opaque binary assets (textures, audio, models). Served from package
    /// archives and the host resource store, never from documents.
    Binary,
    // Abstract groups. Resolved to a member before construction.
    Condition,
    Item,
}

impl Category {
    /// Concrete members of the `Condition` group.
    pub const CONDITIONS: &'static [Category] = &[
        Category::StatusCondition,
        Category::SceneTransferCondition,
        Category::PolymorphCondition,
    ];

    /// Concrete members of the `Item` group.
    pub const ITEMS: &'static [Category] = &[
        Category::Weapon,
        Category::Chestpiece,
        Category::Helm,
        Category::Ring,
        Category::Shield,
        Category::TradeItem,
    ];

    pub fn is_abstract(self) -> bool {
        matches!(self, Category::Condition | Category::Item)
    }

    /// Members of an abstract group; empty for concrete categories.
    pub fn concrete_members(self) -> &'static [Category] {
        match self {
            Category::Condition => Self::CONDITIONS,
            Category::Item => Self::ITEMS,
            _ => &[],
        }
    }

    /// The abstract group a concrete category belongs to, if any.
    pub fn group(self) -> Option<Category> {
        if Self::CONDITIONS.contains(&self) {
            Some(Category::Condition)
        } else if Self::ITEMS.contains(&self) {
            Some(Category::Item)
        } else {
            None
        }
    }

    /// Package-relative directory a concrete category's documents live in.
    ///
    /// Grouped categories nest under their group directory
    /// (`Conditions/StatusCondition/**`); standalone ones use their own name
    /// (`Skill/**`). `None` for abstract categories and `Binary`.
    pub fn storage_dir(self) -> Option<String> {
        if self.is_abstract() || self == Category::Binary {
            return None;
        }
        match self.group() {
            Some(group) => Some(format!("{}s/{}", group.as_ref(), self.as_ref())),
            None => Some(self.as_ref().to_string()),
        }
    }

    /// Resolves this category against a document storage path.
    ///
    /// Concrete categories resolve to themselves. An abstract category takes
    /// the path's second segment (the first names the group directory) and
    /// matches it case-insensitively against the group's members; paths with
    /// fewer than two segments or an unknown segment fail as not-found.
    pub fn resolve_for_path(self, path: &str) -> Option<Category> {
        if !self.is_abstract() {
            return Some(self);
        }

        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let _group_dir = segments.next()?;
        let concrete_dir = segments.next()?;

        let resolved = concrete_dir
            .parse::<Category>()
            .ok()
            .filter(|c| self.concrete_members().contains(c));
        if resolved.is_none() {
            warn!(
                target: "loadstone::category",
                category = self.as_ref(),
                path,
                "storage path does not name a concrete member of the category"
            );
        }
        resolved
    }

    /// The concrete category of a loaded asset.
    pub fn of_asset(asset: &Asset) -> Category {
        match asset {
            Asset::Skill(_) => Category::Skill,
            Asset::Condition(c) => match c.borrow().kind {
                ConditionKind::Status(_) => Category::StatusCondition,
                ConditionKind::SceneTransfer(_) => Category::SceneTransferCondition,
                ConditionKind::Polymorph(_) => Category::PolymorphCondition,
            },
            Asset::Item(i) => match i.borrow().kind {
                ItemKind::Weapon(_) => Category::Weapon,
                ItemKind::Chestpiece(_) => Category::Chestpiece,
                ItemKind::Helm(_) => Category::Helm,
                ItemKind::Ring(_) => Category::Ring,
                ItemKind::Shield(_) => Category::Shield,
                ItemKind::TradeItem(_) => Category::TradeItem,
            },
            Asset::Shopkeep(_) => Category::Shopkeep,
            Asset::Binary(_) => Category::Binary,
        }
    }

    /// Whether an asset satisfies a query for this category. Abstract
    /// categories accept any of their members.
    pub fn accepts(self, asset: &Asset) -> bool {
        let concrete = Category::of_asset(asset);
        concrete == self || self.concrete_members().contains(&concrete)
    }
}
