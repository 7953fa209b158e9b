//! Skill objects and their host-native sub-structures.

use serde::{Deserialize, Serialize};

use crate::{BinaryAsset, Condition, Shared};

/// Damage school a skill belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    #[default]
    Physical,
    Arcane,
    Fire,
    Frost,
    Holy,
    Shadow,
}

/// Per-rank tuning values. Plain data, patchable as an array field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillRank {
    pub rank: u32,
    pub power: f32,
    pub cost: f32,
    pub level_requirement: u32,
}

/// A castable skill. Natural key: `skill_name`.
#[derive(Clone, Debug, Default)]
pub struct Skill {
    pub skill_name: String,
    pub description: String,
    pub damage_type: DamageType,
    pub cooldown: f32,
    pub cast_time: f32,
    pub range: f32,
    /// Skills flagged general are appended to the host's general-skills list
    /// during library initialization.
    pub general: bool,
    pub ranks: Vec<SkillRank>,
    /// Condition applied on hit. Resolved by name, may point at a condition
    /// that itself references this skill.
    pub applies_condition: Option<Shared<Condition>>,
    pub icon: Option<Shared<BinaryAsset>>,
}
