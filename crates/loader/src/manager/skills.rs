//! Skill manager.
//!
//! Skills adapt the host's native skill cache and reject duplicate names —
//! the host's skill lookup expects one object per name for the whole
//! session. Skills flagged `general` additionally join the host's
//! general-skills list during `PreLibraryInit`, before the host builds its
//! skill library from that list.

use std::cell::Cell;
use std::rc::Rc;

use host_model::{Asset, HostCatalog};
use serde_json::Value;

use super::{Cache, ContentManager, SkillCacheAdapter, document_string};
use crate::category::Category;
use crate::phase::LoadPhase;
use crate::registry::Registry;

pub struct SkillManager {
    cache: SkillCacheAdapter,
    generals_registered: Cell<bool>,
}

impl SkillManager {
    pub fn new(host: Rc<HostCatalog>) -> Self {
        Self {
            cache: SkillCacheAdapter::new(host),
            generals_registered: Cell::new(false),
        }
    }

    /// Appends every package skill flagged general to the host's
    /// general-skills list. Runs once; the registry enforces the phase
    /// window per skill.
    fn register_general_skills(&self, registry: &Registry) {
        if self.generals_registered.replace(true) {
            return;
        }
        for asset in registry.get_content_objects(Category::Skill) {
            let Some(skill) = asset.as_skill() else {
                continue;
            };
            let general = skill.borrow().general;
            if general {
                registry.register_general_skill(skill);
            }
        }
    }
}

impl ContentManager for SkillManager {
    fn category(&self) -> Category {
        Category::Skill
    }

    fn object_identity(&self, asset: &Asset) -> Option<String> {
        asset.as_skill().map(|s| s.borrow().skill_name.clone())
    }

    fn document_key(&self, document: &Value) -> Option<String> {
        document_string(document, "skill_name")
    }

    fn cache(&self) -> &dyn Cache {
        &self.cache
    }

    fn replaces_duplicates(&self) -> bool {
        false
    }

    fn on_phase(&self, phase: LoadPhase, registry: &Registry) {
        match phase {
            LoadPhase::PreCacheInit => self.load_package_documents(registry),
            LoadPhase::PostCacheInit => self.load_from_packages(registry),
            LoadPhase::PreLibraryInit => self.register_general_skills(registry),
            LoadPhase::PostLibraryInit => {}
        }
    }
}
