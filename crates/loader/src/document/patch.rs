//! Array patch engine.
//!
//! A sequence field normally takes a plain JSON array (full replacement).
//! When the document supplies an object instead, it is a patch against the
//! field's current value:
//!
//! - `add`: append newly parsed elements.
//! - `remove`: delete elements matched by a criteria object — an explicit
//!   `index`, or field-by-field equality against every listed field, first
//!   hit wins.
//! - `modify`: locate by `index` or a `where` criteria object, then overlay
//!   the entry's remaining fields onto the found element in place.
//!
//! Application order is fixed — remove, then modify, then add — so the
//! JSON key order of the patch never changes the result. Unmatched criteria
//! are logged and ignored.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

const PATCH_KEYS: [&str; 3] = ["add", "remove", "modify"];

/// Applies a document value to a sequence field: replacement for arrays,
/// patch semantics for objects. Anything else is logged and ignored.
pub(crate) fn apply_sequence<T>(target: &mut Vec<T>, value: &Value, field: &str, path: &str)
where
    T: Serialize + DeserializeOwned,
{
    match value {
        Value::Array(items) => {
            let mut replacement = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                match serde_json::from_value::<T>(item.clone()) {
                    Ok(parsed) => replacement.push(parsed),
                    Err(e) => warn!(
                        target: "loadstone::document",
                        document = path,
                        field,
                        index,
                        error = %e,
                        "skipping malformed sequence element"
                    ),
                }
            }
            *target = replacement;
        }
        Value::Object(map) if PATCH_KEYS.iter().any(|k| map.contains_key(*k)) => {
            for key in map.keys().filter(|k| !PATCH_KEYS.contains(&k.as_str())) {
                warn!(
                    target: "loadstone::document",
                    document = path,
                    field,
                    key = %key,
                    "unrecognized patch key, ignoring"
                );
            }
            apply_patch(target, map, field, path);
        }
        _ => warn!(
            target: "loadstone::document",
            document = path,
            field,
            "sequence field is neither an array nor a patch object"
        ),
    }
}

fn apply_patch<T>(target: &mut Vec<T>, patch: &Map<String, Value>, field: &str, path: &str)
where
    T: Serialize + DeserializeOwned,
{
    if let Some(value) = patch.get("remove") {
        for criteria in patch_entries(value, "remove", field, path) {
            match locate(target, criteria) {
                Some(index) => {
                    target.remove(index);
                }
                None => warn!(
                    target: "loadstone::document",
                    document = path,
                    field,
                    criteria = %serde_json::Value::Object(criteria.clone()),
                    "remove criteria matched nothing"
                ),
            }
        }
    }

    if let Some(value) = patch.get("modify") {
        for entry in patch_entries(value, "modify", field, path) {
            apply_modify(target, entry, field, path);
        }
    }

    if let Some(value) = patch.get("add") {
        let Value::Array(items) = value else {
            warn!(
                target: "loadstone::document",
                document = path,
                field,
                "patch 'add' must be an array"
            );
            return;
        };
        for (index, item) in items.iter().enumerate() {
            match serde_json::from_value::<T>(item.clone()) {
                Ok(parsed) => target.push(parsed),
                Err(e) => warn!(
                    target: "loadstone::document",
                    document = path,
                    field,
                    index,
                    error = %e,
                    "skipping malformed 'add' element"
                ),
            }
        }
    }
}

fn apply_modify<T>(target: &mut Vec<T>, entry: &Map<String, Value>, field: &str, path: &str)
where
    T: Serialize + DeserializeOwned,
{
    // Criteria come from `index` or a `where` object; every other key is an
    // overlay field.
    let criteria: Map<String, Value> = match entry.get("where") {
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            warn!(
                target: "loadstone::document",
                document = path,
                field,
                "'where' must be an object"
            );
            return;
        }
        None => match entry.get("index") {
            Some(index) => {
                let mut map = Map::new();
                map.insert("index".to_string(), index.clone());
                map
            }
            None => {
                warn!(
                    target: "loadstone::document",
                    document = path,
                    field,
                    "modify entry has no 'index' or 'where' criteria"
                );
                return;
            }
        },
    };

    let Some(index) = locate(target, &criteria) else {
        warn!(
            target: "loadstone::document",
            document = path,
            field,
            criteria = %serde_json::Value::Object(criteria),
            "modify criteria matched nothing"
        );
        return;
    };

    let Ok(Value::Object(mut current)) = serde_json::to_value(&target[index]) else {
        warn!(
            target: "loadstone::document",
            document = path,
            field,
            "sequence element did not serialize to an object, cannot modify"
        );
        return;
    };
    for (key, value) in entry {
        if key == "index" || key == "where" {
            continue;
        }
        current.insert(key.clone(), value.clone());
    }
    match serde_json::from_value::<T>(Value::Object(current)) {
        Ok(updated) => target[index] = updated,
        Err(e) => warn!(
            target: "loadstone::document",
            document = path,
            field,
            error = %e,
            "modified element no longer parses, leaving it unchanged"
        ),
    }
}

/// Finds the first element matching a criteria object: explicit `index`,
/// otherwise field-by-field equality on every listed field.
fn locate<T: Serialize>(target: &[T], criteria: &Map<String, Value>) -> Option<usize> {
    if let Some(index) = criteria.get("index") {
        let index = index.as_u64()? as usize;
        return (index < target.len()).then_some(index);
    }

    target.iter().position(|element| {
        let Ok(value) = serde_json::to_value(element) else {
            return false;
        };
        criteria
            .iter()
            .all(|(key, expected)| value.get(key) == Some(expected))
    })
}

fn patch_entries<'a>(
    value: &'a Value,
    op: &str,
    field: &str,
    path: &str,
) -> Vec<&'a Map<String, Value>> {
    let Value::Array(items) = value else {
        warn!(
            target: "loadstone::document",
            document = path,
            field,
            op,
            "patch operation must be an array of objects"
        );
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => {
                warn!(
                    target: "loadstone::document",
                    document = path,
                    field,
                    op,
                    "skipping non-object patch entry"
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Entry {
        id: u32,
        v: String,
    }

    fn base() -> Vec<Entry> {
        vec![
            Entry {
                id: 1,
                v: "a".into(),
            },
            Entry {
                id: 2,
                v: "b".into(),
            },
        ]
    }

    #[test]
    fn plain_array_replaces_wholesale() {
        let mut seq = base();
        apply_sequence(&mut seq, &json!([{"id": 9, "v": "z"}]), "f", "t");
        assert_eq!(
            seq,
            vec![Entry {
                id: 9,
                v: "z".into()
            }]
        );
    }

    #[test]
    fn patch_result_ignores_key_order() {
        let patch_a = json!({"remove": [{"id": 1}], "add": [{"id": 3, "v": "c"}]});
        let patch_b = json!({"add": [{"id": 3, "v": "c"}], "remove": [{"id": 1}]});

        for patch in [patch_a, patch_b] {
            let mut seq = base();
            apply_sequence(&mut seq, &patch, "f", "t");
            assert_eq!(
                seq,
                vec![
                    Entry {
                        id: 2,
                        v: "b".into()
                    },
                    Entry {
                        id: 3,
                        v: "c".into()
                    },
                ]
            );
        }
    }

    #[test]
    fn remove_by_index() {
        let mut seq = base();
        apply_sequence(&mut seq, &json!({"remove": [{"index": 0}]}), "f", "t");
        assert_eq!(seq.len(), 1);
        assert_eq!(seq[0].id, 2);
    }

    #[test]
    fn modify_overlays_fields_in_place() {
        let mut seq = base();
        apply_sequence(
            &mut seq,
            &json!({"modify": [{"where": {"id": 2}, "v": "bb"}]}),
            "f",
            "t",
        );
        assert_eq!(seq[1].v, "bb");
        assert_eq!(seq[1].id, 2);

        let mut seq = base();
        apply_sequence(&mut seq, &json!({"modify": [{"index": 0, "v": "aa"}]}), "f", "t");
        assert_eq!(seq[0].v, "aa");
    }

    #[test]
    fn unmatched_criteria_are_ignored() {
        let mut seq = base();
        apply_sequence(
            &mut seq,
            &json!({"remove": [{"id": 42}], "modify": [{"where": {"id": 42}, "v": "x"}]}),
            "f",
            "t",
        );
        assert_eq!(seq, base());
    }

    #[test]
    fn patch_against_empty_sequence_only_adds() {
        let mut seq: Vec<Entry> = Vec::new();
        apply_sequence(
            &mut seq,
            &json!({"remove": [{"id": 1}], "add": [{"id": 5, "v": "e"}]}),
            "f",
            "t",
        );
        assert_eq!(seq.len(), 1);
        assert_eq!(seq[0].id, 5);
    }
}
