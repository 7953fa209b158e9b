//! Field population for each concrete content type.
//!
//! Population is explicit per category: scalar fields deserialize straight
//! from the document value, sequence fields go through the patch engine,
//! and category- or binary-typed fields hold a bare asset name resolved
//! through the registry at populate time. Resolution happens *before* the
//! target handle is borrowed, because resolving a name can recursively load
//! another document that references back into the one being populated.
//!
//! Unresolvable references and malformed values are logged and leave the
//! field empty; they never abort the document.

use host_model::{Asset, BinaryAsset, Condition, ConditionKind, ItemKind, Shared, Skill};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use super::{DocCtx, apply_sequence};
use crate::category::Category;

pub(crate) fn populate(asset: &Asset, fields: &Map<String, Value>, ctx: &DocCtx<'_>) {
    match asset {
        Asset::Skill(skill) => populate_skill(skill, fields, ctx),
        Asset::Condition(condition) => populate_condition(condition, fields, ctx),
        Asset::Item(item) => populate_item(item, fields, ctx),
        Asset::Shopkeep(shopkeep) => {
            let mut shopkeep = shopkeep.borrow_mut();
            for (key, value) in fields {
                match key.as_str() {
                    "shop_name" => set_field(&mut shopkeep.shop_name, value, key, ctx),
                    "greeting" => set_field(&mut shopkeep.greeting, value, key, ctx),
                    "stock" => apply_sequence(&mut shopkeep.stock, value, key, ctx.path),
                    _ => unknown_field(key, ctx),
                }
            }
        }
        Asset::Binary(_) => {}
    }
}

fn populate_skill(handle: &Shared<Skill>, fields: &Map<String, Value>, ctx: &DocCtx<'_>) {
    for (key, value) in fields {
        match key.as_str() {
            "skill_name" => set_field(&mut handle.borrow_mut().skill_name, value, key, ctx),
            "description" => set_field(&mut handle.borrow_mut().description, value, key, ctx),
            "damage_type" => set_field(&mut handle.borrow_mut().damage_type, value, key, ctx),
            "cooldown" => set_field(&mut handle.borrow_mut().cooldown, value, key, ctx),
            "cast_time" => set_field(&mut handle.borrow_mut().cast_time, value, key, ctx),
            "range" => set_field(&mut handle.borrow_mut().range, value, key, ctx),
            "general" => set_field(&mut handle.borrow_mut().general, value, key, ctx),
            "ranks" => apply_sequence(&mut handle.borrow_mut().ranks, value, key, ctx.path),
            "applies_condition" => {
                // Resolve before borrowing: the condition may reference this
                // skill right back.
                let resolved = resolve_condition(value, key, ctx);
                handle.borrow_mut().applies_condition = resolved;
            }
            "icon" => {
                let resolved = resolve_binary(value, key, ctx);
                handle.borrow_mut().icon = resolved;
            }
            _ => unknown_field(key, ctx),
        }
    }
}

fn populate_condition(handle: &Shared<Condition>, fields: &Map<String, Value>, ctx: &DocCtx<'_>) {
    for (key, value) in fields {
        match key.as_str() {
            "condition_name" => set_field(&mut handle.borrow_mut().condition_name, value, key, ctx),
            "rank" => set_field(&mut handle.borrow_mut().rank, value, key, ctx),
            "duration" => set_field(&mut handle.borrow_mut().duration, value, key, ctx),
            "is_permanent" => set_field(&mut handle.borrow_mut().is_permanent, value, key, ctx),
            "is_refreshable" => set_field(&mut handle.borrow_mut().is_refreshable, value, key, ctx),
            "effects" => apply_sequence(&mut handle.borrow_mut().effects, value, key, ctx.path),
            "triggered_skill" => {
                let resolved = resolve_skill(value, key, ctx);
                handle.borrow_mut().triggered_skill = resolved;
            }
            "visual" => {
                let resolved = resolve_binary(value, key, ctx);
                handle.borrow_mut().visual = resolved;
            }
            // Status-specific.
            "tick_interval" => match &mut handle.borrow_mut().kind {
                ConditionKind::Status(d) => set_field(&mut d.tick_interval, value, key, ctx),
                _ => kind_mismatch(key, ctx),
            },
            "max_stacks" => match &mut handle.borrow_mut().kind {
                ConditionKind::Status(d) => set_field(&mut d.max_stacks, value, key, ctx),
                _ => kind_mismatch(key, ctx),
            },
            "is_debuff" => match &mut handle.borrow_mut().kind {
                ConditionKind::Status(d) => set_field(&mut d.is_debuff, value, key, ctx),
                _ => kind_mismatch(key, ctx),
            },
            // Scene-transfer-specific.
            "destination_scene" => match &mut handle.borrow_mut().kind {
                ConditionKind::SceneTransfer(d) => {
                    set_field(&mut d.destination_scene, value, key, ctx)
                }
                _ => kind_mismatch(key, ctx),
            },
            "spawn_point" => match &mut handle.borrow_mut().kind {
                ConditionKind::SceneTransfer(d) => set_field(&mut d.spawn_point, value, key, ctx),
                _ => kind_mismatch(key, ctx),
            },
            // Polymorph-specific.
            "form_name" => match &mut handle.borrow_mut().kind {
                ConditionKind::Polymorph(d) => set_field(&mut d.form_name, value, key, ctx),
                _ => kind_mismatch(key, ctx),
            },
            "lock_actions" => match &mut handle.borrow_mut().kind {
                ConditionKind::Polymorph(d) => set_field(&mut d.lock_actions, value, key, ctx),
                _ => kind_mismatch(key, ctx),
            },
            _ => unknown_field(key, ctx),
        }
    }
}

fn populate_item(handle: &Shared<host_model::Item>, fields: &Map<String, Value>, ctx: &DocCtx<'_>) {
    for (key, value) in fields {
        match key.as_str() {
            "item_name" => set_field(&mut handle.borrow_mut().item_name, value, key, ctx),
            "description" => set_field(&mut handle.borrow_mut().description, value, key, ctx),
            "rarity" => set_field(&mut handle.borrow_mut().rarity, value, key, ctx),
            "max_stack" => set_field(&mut handle.borrow_mut().max_stack, value, key, ctx),
            "value" => set_field(&mut handle.borrow_mut().value, value, key, ctx),
            "icon" => {
                let resolved = resolve_binary(value, key, ctx);
                handle.borrow_mut().icon = resolved;
            }
            // Weapon-specific.
            "damage" => match &mut handle.borrow_mut().kind {
                ItemKind::Weapon(d) => set_field(&mut d.damage, value, key, ctx),
                _ => kind_mismatch(key, ctx),
            },
            "attack_speed" => match &mut handle.borrow_mut().kind {
                ItemKind::Weapon(d) => set_field(&mut d.attack_speed, value, key, ctx),
                _ => kind_mismatch(key, ctx),
            },
            "two_handed" => match &mut handle.borrow_mut().kind {
                ItemKind::Weapon(d) => set_field(&mut d.two_handed, value, key, ctx),
                _ => kind_mismatch(key, ctx),
            },
            // Armor slots share their data shape.
            "defense" => match &mut handle.borrow_mut().kind {
                ItemKind::Chestpiece(d) | ItemKind::Helm(d) | ItemKind::Shield(d) => {
                    set_field(&mut d.defense, value, key, ctx)
                }
                _ => kind_mismatch(key, ctx),
            },
            "magic_defense" => match &mut handle.borrow_mut().kind {
                ItemKind::Chestpiece(d) | ItemKind::Helm(d) | ItemKind::Shield(d) => {
                    set_field(&mut d.magic_defense, value, key, ctx)
                }
                _ => kind_mismatch(key, ctx),
            },
            // Ring-specific.
            "stat" => match &mut handle.borrow_mut().kind {
                ItemKind::Ring(d) => set_field(&mut d.stat, value, key, ctx),
                _ => kind_mismatch(key, ctx),
            },
            "bonus" => match &mut handle.borrow_mut().kind {
                ItemKind::Ring(d) => set_field(&mut d.bonus, value, key, ctx),
                _ => kind_mismatch(key, ctx),
            },
            // Trade-item-specific.
            "stack_value" => match &mut handle.borrow_mut().kind {
                ItemKind::TradeItem(d) => set_field(&mut d.stack_value, value, key, ctx),
                _ => kind_mismatch(key, ctx),
            },
            _ => unknown_field(key, ctx),
        }
    }
}

/// Deserializes a scalar document value into a field, leaving the field
/// untouched when the value is malformed.
fn set_field<T: DeserializeOwned>(dst: &mut T, value: &Value, field: &str, ctx: &DocCtx<'_>) {
    match serde_json::from_value::<T>(value.clone()) {
        Ok(parsed) => *dst = parsed,
        Err(e) => warn!(
            target: "loadstone::document",
            document = ctx.path,
            field,
            error = %e,
            "malformed field value"
        ),
    }
}

fn ref_name<'v>(value: &'v Value, field: &str, ctx: &DocCtx<'_>) -> Option<&'v str> {
    match value {
        Value::String(name) if !name.is_empty() => Some(name),
        Value::Null => None,
        _ => {
            warn!(
                target: "loadstone::document",
                document = ctx.path,
                field,
                "reference field must be an asset name string"
            );
            None
        }
    }
}

fn resolve_skill(value: &Value, field: &str, ctx: &DocCtx<'_>) -> Option<Shared<Skill>> {
    let name = ref_name(value, field, ctx)?;
    let asset = ctx.registry.load_asset(name, Category::Skill);
    let resolved = asset.as_ref().and_then(Asset::as_skill).cloned();
    if resolved.is_none() {
        unresolved(name, field, ctx);
    }
    resolved
}

fn resolve_condition(value: &Value, field: &str, ctx: &DocCtx<'_>) -> Option<Shared<Condition>> {
    let name = ref_name(value, field, ctx)?;
    let asset = ctx.registry.load_asset(name, Category::Condition);
    let resolved = asset.as_ref().and_then(Asset::as_condition).cloned();
    if resolved.is_none() {
        unresolved(name, field, ctx);
    }
    resolved
}

fn resolve_binary(value: &Value, field: &str, ctx: &DocCtx<'_>) -> Option<Shared<BinaryAsset>> {
    let name = ref_name(value, field, ctx)?;
    let asset = ctx.registry.load_asset(name, Category::Binary);
    let resolved = asset.as_ref().and_then(Asset::as_binary).cloned();
    if resolved.is_none() {
        unresolved(name, field, ctx);
    }
    resolved
}

fn unresolved(name: &str, field: &str, ctx: &DocCtx<'_>) {
    error!(
        target: "loadstone::document",
        document = ctx.path,
        package = ctx.package.id(),
        field,
        asset = name,
        "failed to resolve referenced asset, leaving field empty"
    );
}

fn kind_mismatch(field: &str, ctx: &DocCtx<'_>) {
    warn!(
        target: "loadstone::document",
        document = ctx.path,
        field,
        "field does not apply to this concrete category"
    );
}

fn unknown_field(field: &str, ctx: &DocCtx<'_>) {
    debug!(
        target: "loadstone::document",
        document = ctx.path,
        field,
        "unknown document field"
    );
}
