use crate::error::{CallCenterError, Result};
use serde::Serialize;
use serde_json::{Map, Value};

const DROPPED_KEYWORDS: [&str; 7] = ["$schema", "$id", "title", "default", "examples", "definitions", "$defs"];

// Formats accepted by strict structured outputs; anything else is dropped.
const SUPPORTED_FORMATS: [&str; 9] = [
    "date-time", "time", "date", "duration", "email", "hostname", "ipv4", "ipv6", "uuid",
];

/// Rewrites a schemars schema for OpenAI `json_schema` responses with `strict: true`.
///
/// References are inlined, every object closes with `additionalProperties: false`
/// and lists all of its properties as required. Optional values keep their
/// `["T", "null"]` type union, which is how strict mode expresses optionality.
pub fn strict_schema<T: Serialize>(root: T) -> Result<Value> {
    let mut root = serde_json::to_value(root)?;

    let definitions = root
        .get("definitions")
        .or_else(|| root.get("$defs"))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    tighten(&mut root, &definitions, &mut Vec::new())?;
    Ok(root)
}

fn tighten(node: &mut Value, definitions: &Map<String, Value>, resolving: &mut Vec<String>) -> Result<()> {
    let Value::Object(map) = node else {
        return Ok(());
    };

    // schemars attaches metadata to a reference through a one-branch allOf.
    let single_branch = match map.get("allOf") {
        Some(Value::Array(branches)) if branches.len() == 1 => branches[0].as_object().cloned(),
        _ => None,
    };
    if let Some(branch) = single_branch {
        map.remove("allOf");
        merge_missing(map, branch);
    }

    if let Some(reference) = map.remove("$ref") {
        let name = reference
            .as_str()
            .and_then(|r| r.rsplit('/').next())
            .unwrap_or_default()
            .to_string();
        if resolving.contains(&name) {
            return Err(CallCenterError::InvalidSchema(format!("recursive reference to '{name}'")));
        }
        let mut target = definitions
            .get(&name)
            .cloned()
            .ok_or_else(|| CallCenterError::InvalidSchema(format!("unresolvable reference '{name}'")))?;
        resolving.push(name);
        tighten(&mut target, definitions, resolving)?;
        resolving.pop();
        if let Value::Object(target) = target {
            merge_missing(map, target);
        }
    }

    for keyword in DROPPED_KEYWORDS {
        map.remove(keyword);
    }
    if map
        .get("format")
        .and_then(Value::as_str)
        .is_some_and(|format| !SUPPORTED_FORMATS.contains(&format))
    {
        map.remove("format");
    }
    if let Some(branches) = map.remove("oneOf") {
        map.insert("anyOf".to_string(), branches);
    }

    if map.get("type").and_then(Value::as_str) == Some("object") && !map.contains_key("properties") {
        map.insert("properties".to_string(), Value::Object(Map::new()));
    }
    let required = match map.get_mut("properties") {
        Some(Value::Object(properties)) => {
            for property in properties.values_mut() {
                tighten(property, definitions, resolving)?;
            }
            Some(properties.keys().cloned().map(Value::String).collect::<Vec<_>>())
        }
        _ => None,
    };
    if let Some(required) = required {
        map.insert("required".to_string(), Value::Array(required));
        map.insert("additionalProperties".to_string(), Value::Bool(false));
    }

    if let Some(items) = map.get_mut("items") {
        tighten(items, definitions, resolving)?;
    }
    if let Some(Value::Array(branches)) = map.get_mut("anyOf") {
        for branch in branches.iter_mut() {
            tighten(branch, definitions, resolving)?;
        }
    }
    Ok(())
}

// Keys already on the node win.
fn merge_missing(map: &mut Map<String, Value>, from: Map<String, Value>) {
    for (key, value) in from {
        map.entry(key).or_insert(value);
    }
}
