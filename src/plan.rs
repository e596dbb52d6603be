//! Schema-driven planning.
//!
//! The host proposes a state made of the configuration. Planning completes
//! it: on create every computed attribute the configuration left null is
//! marked unknown; on update the prior values of computed attributes are
//! carried forward so they do not show up as drift. The attribute changes
//! and the replacement decision are derived from the schema's `force_new`
//! flags. Write-only attributes never reach state and are left out of the
//! diff.

use serde_json::{Map, Value as Json};

use crate::schema::{Block, BlockNestingMode, Schema};
use crate::types::{AttributeChange, PlanResult};
use crate::value::UNKNOWN_VALUE;

fn unknown() -> Json {
    Json::String(UNKNOWN_VALUE.to_string())
}

fn is_unknown(value: &Json) -> bool {
    value.as_str() == Some(UNKNOWN_VALUE)
}

/// Null and a missing key are the same thing.
fn present(obj: &Map<String, Json>, name: &str) -> Option<Json> {
    obj.get(name).filter(|v| !v.is_null()).cloned()
}

/// Structural equality with null-as-absent and unordered arrays.
pub fn same(a: &Json, b: &Json) -> bool {
    match (a, b) {
        (Json::Object(a), Json::Object(b)) => {
            let keys = a.keys().chain(b.keys());
            keys.into_iter().all(|key| match (present(a, key), present(b, key)) {
                (Some(x), Some(y)) => same(&x, &y),
                (None, None) => true,
                _ => false,
            })
        },
        (Json::Array(a), Json::Array(b)) => {
            a.len() == b.len()
                && a.iter().all(|x| {
                    let left = a.iter().filter(|y| same(x, y)).count();
                    let right = b.iter().filter(|y| same(x, y)).count();
                    left == right
                })
        },
        _ => a == b,
    }
}

fn same_opt(a: Option<&Json>, b: Option<&Json>) -> bool {
    match (a.filter(|v| !v.is_null()), b.filter(|v| !v.is_null())) {
        (Some(a), Some(b)) => !is_unknown(b) && same(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Plan a resource from its prior state (if any) and the proposed state.
pub fn plan_resource(schema: &Schema, prior: Option<&Json>, proposed: Json) -> PlanResult {
    match prior.and_then(Json::as_object) {
        None => plan_create(schema, proposed),
        Some(prior) => plan_update(schema, prior, proposed),
    }
}

fn plan_create(schema: &Schema, proposed: Json) -> PlanResult {
    let mut planned = match proposed {
        Json::Object(obj) => obj,
        other => return PlanResult::no_change(other),
    };
    mark_computed_unknown(&schema.block, &mut planned);

    let changes = planned
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| AttributeChange::added(name.clone(), value.clone()))
        .collect();
    PlanResult::with_changes(Json::Object(planned), changes, false)
}

fn mark_computed_unknown(block: &Block, obj: &mut Map<String, Json>) {
    for (name, attr) in &block.attributes {
        if attr.flags.computed && present(obj, name).is_none() {
            obj.insert(name.clone(), unknown());
        }
    }
    for (name, nested) in &block.blocks {
        match obj.get_mut(name) {
            Some(Json::Object(inner)) if nested.nesting_mode == BlockNestingMode::Single => {
                mark_computed_unknown(&nested.block, inner);
            },
            Some(Json::Array(items)) => {
                for item in items.iter_mut().filter_map(Json::as_object_mut) {
                    mark_computed_unknown(&nested.block, item);
                }
            },
            None | Some(Json::Null) if nested.computed => {
                obj.insert(name.clone(), unknown());
            },
            _ => {},
        }
    }
}

fn plan_update(schema: &Schema, prior: &Map<String, Json>, proposed: Json) -> PlanResult {
    let mut planned = match proposed {
        Json::Object(obj) => obj,
        other => return PlanResult::no_change(other),
    };
    carry_computed(&schema.block, prior, &mut planned);

    let mut changes = Vec::new();
    for (name, attr) in &schema.block.attributes {
        if attr.flags.is_computed_only() || attr.flags.write_only {
            continue;
        }
        diff(name, prior.get(name), planned.get(name), &mut changes);
    }
    for name in schema.block.blocks.keys() {
        diff(name, prior.get(name), planned.get(name), &mut changes);
    }

    let replace = needs_replace(&schema.block, prior, &planned);
    if replace {
        for (name, attr) in &schema.block.attributes {
            if attr.flags.is_computed_only() {
                planned.insert(name.clone(), unknown());
            }
        }
    } else if schema.block.attributes.contains_key("tags_all")
        && changes.iter().any(|c| c.path == "tags")
    {
        planned.insert("tags_all".to_string(), unknown());
    }

    PlanResult::with_changes(Json::Object(planned), changes, replace)
}

fn diff(name: &str, before: Option<&Json>, after: Option<&Json>, changes: &mut Vec<AttributeChange>) {
    if same_opt(before, after) {
        return;
    }
    let before = before.filter(|v| !v.is_null()).cloned();
    let after = after.filter(|v| !v.is_null()).cloned();
    changes.push(AttributeChange::new(name, before, after));
}

/// Copy computed values from prior where the proposal leaves them null.
fn carry_computed(block: &Block, prior: &Map<String, Json>, planned: &mut Map<String, Json>) {
    for (name, attr) in &block.attributes {
        if !attr.flags.computed || present(planned, name).is_some() {
            continue;
        }
        if let Some(value) = present(prior, name) {
            planned.insert(name.clone(), value);
        }
    }
    for (name, nested) in &block.blocks {
        match (planned.get_mut(name), prior.get(name)) {
            (Some(Json::Object(inner)), Some(Json::Object(prior_inner)))
                if nested.nesting_mode == BlockNestingMode::Single =>
            {
                carry_computed(&nested.block, prior_inner, inner);
            },
            (None | Some(Json::Null), Some(prior_value)) if nested.computed => {
                planned.insert(name.clone(), prior_value.clone());
            },
            _ => {},
        }
    }
}

fn needs_replace(block: &Block, prior: &Map<String, Json>, planned: &Map<String, Json>) -> bool {
    let attrs = block
        .attributes
        .iter()
        .filter(|(_, attr)| attr.force_new && !attr.flags.write_only)
        .any(|(name, _)| !same_opt(prior.get(name), planned.get(name)));
    if attrs {
        return true;
    }
    block.blocks.iter().any(|(name, nested)| {
        if nested.force_new {
            return !same_opt(prior.get(name), planned.get(name));
        }
        match (prior.get(name), planned.get(name)) {
            (Some(Json::Object(p)), Some(Json::Object(n)))
                if nested.nesting_mode == BlockNestingMode::Single =>
            {
                needs_replace(&nested.block, p, n)
            },
            _ => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, NestedBlock};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute("arn", Attribute::computed_string())
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("enable_default_internet_access", Attribute::optional_computed_bool())
            .with_block(
                "compute_capacity",
                NestedBlock::single(
                    Block::new()
                        .with_attribute("desired_instances", Attribute::optional_int32())
                        .with_attribute("running", Attribute::computed_int32()),
                ),
            )
            .with_block(
                "vpc_config",
                NestedBlock::single(
                    Block::new().with_attribute(
                        "subnet_ids",
                        Attribute::string_set(crate::schema::AttributeFlags::optional()),
                    ),
                )
                .with_force_new(),
            )
            .with_tags()
    }

    fn prior() -> Json {
        json!({
            "name": "f1",
            "description": "v1",
            "arn": "arn:aws:appstream:us-east-1:1:fleet/f1",
            "id": "f1",
            "enable_default_internet_access": false,
            "compute_capacity": {"desired_instances": 2, "running": 2},
            "vpc_config": {"subnet_ids": ["a", "b"]},
            "tags": null,
            "tags_all": {},
        })
    }

    #[test]
    fn test_create_marks_computed_unknown() {
        let result = plan_resource(
            &schema(),
            None,
            json!({"name": "f1", "compute_capacity": {"desired_instances": 1}}),
        );

        assert!(!result.requires_replace);
        let planned = &result.planned_state;
        assert_eq!(planned["arn"], json!(UNKNOWN_VALUE));
        assert_eq!(planned["enable_default_internet_access"], json!(UNKNOWN_VALUE));
        assert_eq!(planned["tags_all"], json!(UNKNOWN_VALUE));
        assert_eq!(planned["compute_capacity"]["running"], json!(UNKNOWN_VALUE));
        assert!(result.changes.iter().any(|c| c.path == "name"));
    }

    #[test]
    fn test_update_carries_computed_and_reports_no_drift() {
        let mut proposed = prior();
        let obj = proposed.as_object_mut().unwrap();
        for key in ["arn", "id", "enable_default_internet_access", "tags_all"] {
            obj.remove(key);
        }
        obj["compute_capacity"] = json!({"desired_instances": 2});
        obj["vpc_config"] = json!({"subnet_ids": ["b", "a"]});

        let result = plan_resource(&schema(), Some(&prior()), proposed);
        assert!(result.changes.is_empty(), "unexpected changes: {:?}", result.changes);
        assert!(!result.requires_replace);
        assert_eq!(result.planned_state["compute_capacity"]["running"], json!(2));
        assert_eq!(result.planned_state["enable_default_internet_access"], json!(false));
        assert_eq!(result.planned_state["id"], json!("f1"));
    }

    #[test]
    fn test_update_cleared_attribute_is_a_change() {
        let mut proposed = prior();
        proposed["description"] = Json::Null;

        let result = plan_resource(&schema(), Some(&prior()), proposed);
        assert_eq!(
            result.changes,
            vec![AttributeChange::removed("description", json!("v1"))]
        );
        assert!(!result.requires_replace);
    }

    #[test]
    fn test_force_new_change_requires_replace() {
        let mut proposed = prior();
        proposed["name"] = json!("f2");
        let result = plan_resource(&schema(), Some(&prior()), proposed);
        assert!(result.requires_replace);
        assert_eq!(result.planned_state["arn"], json!(UNKNOWN_VALUE));

        let mut proposed = prior();
        proposed["vpc_config"] = json!({"subnet_ids": ["c"]});
        assert!(plan_resource(&schema(), Some(&prior()), proposed).requires_replace);

        let mut proposed = prior();
        proposed["name"] = json!(UNKNOWN_VALUE);
        assert!(plan_resource(&schema(), Some(&prior()), proposed).requires_replace);
    }

    #[test]
    fn test_tag_change_unknowns_tags_all() {
        let mut proposed = prior();
        proposed["tags"] = json!({"env": "dev"});
        let result = plan_resource(&schema(), Some(&prior()), proposed);
        assert_eq!(result.planned_state["tags_all"], json!(UNKNOWN_VALUE));
        assert_eq!(result.changes.len(), 1);
    }

    #[test]
    fn test_write_only_attribute_is_not_drift() {
        let schema = schema().with_attribute(
            "password",
            Attribute::optional_string().sensitive().write_only(),
        );
        let mut proposed = prior();
        proposed["password"] = json!("hunter2");
        let result = plan_resource(&schema, Some(&prior()), proposed);
        assert!(result.changes.is_empty());
        assert_eq!(result.planned_state["password"], json!("hunter2"));
    }

    #[test]
    fn test_same_ignores_order_and_null_keys() {
        assert!(same(&json!({"a": [1, 2], "b": null}), &json!({"a": [2, 1]})));
        assert!(!same(&json!([1, 1, 2]), &json!([1, 2, 2])));
        assert!(!same(&json!({"a": 1}), &json!({"a": 2})));
    }
}
