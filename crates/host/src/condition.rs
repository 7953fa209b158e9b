//! Condition objects: status effects, scene transfers, polymorphs.

use serde::{Deserialize, Serialize};

use crate::{BinaryAsset, Shared, Skill};

/// One stat delta applied while a condition is active. Plain data,
/// patchable as an array field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatEffect {
    pub stat: String,
    pub amount: f32,
    pub multiplier: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusData {
    pub tick_interval: f32,
    pub max_stacks: u32,
    pub is_debuff: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneTransferData {
    pub destination_scene: String,
    pub spawn_point: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolymorphData {
    pub form_name: String,
    pub lock_actions: bool,
}

/// Concrete condition flavor. The loader picks the variant from the
/// document's directory, never from a field inside the document.
#[derive(Clone, Debug, PartialEq)]
pub enum ConditionKind {
    Status(StatusData),
    SceneTransfer(SceneTransferData),
    Polymorph(PolymorphData),
}

impl Default for ConditionKind {
    fn default() -> Self {
        ConditionKind::Status(StatusData::default())
    }
}

/// A condition. Natural key: `<condition_name>_<rank>` — the host caches
/// every rank of a condition as its own entry.
#[derive(Clone, Debug, Default)]
pub struct Condition {
    pub condition_name: String,
    pub rank: u32,
    pub duration: f32,
    pub is_permanent: bool,
    pub is_refreshable: bool,
    pub effects: Vec<StatEffect>,
    pub kind: ConditionKind,
    /// Skill cast when the condition triggers, resolved by name.
    pub triggered_skill: Option<Shared<Skill>>,
    pub visual: Option<Shared<BinaryAsset>>,
}

impl Condition {
    /// The cache key the host uses for conditions.
    pub fn cache_key(&self) -> String {
        format!("{}_{}", self.condition_name, self.rank)
    }
}
