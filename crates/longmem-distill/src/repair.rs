use serde::Deserialize;

use longmem_core::types::{Action, DistilledMemory, MemoryType};
use tracing::warn;

use crate::error::{DistillError, Result};

#[derive(Debug, Deserialize)]
struct RawDelta {
    actions: Vec<RawAction>,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    action: String,
    id: Option<String>,
    #[serde(rename = "type")]
    mem_type: Option<String>,
    category: Option<String>,
    key: Option<String>,
    value: Option<String>,
    confidence: Option<f64>,
    source_turn: Option<i64>,
}

/// Suffixes tried, in order, to close a response that was truncated
/// mid-array or mid-object: a response cut off inside the trailing action's
/// value string, and one cut off after a complete action but before the
/// enclosing array/object close.
const REPAIR_SUFFIXES: &[&str] = &["\"}]}", "}]}", "]}", "}"];

/// Parses a raw `json_complete` response into a delta, best-effort repairing
/// truncated JSON before giving up. Returns `DistillError::Parse` only when
/// every repair attempt also fails to parse — callers treat that as an empty
/// delta rather than propagating the error.
pub fn parse_delta(raw: &str) -> Result<Vec<DistilledMemory>> {
    if let Ok(delta) = serde_json::from_str::<RawDelta>(raw) {
        return Ok(validate(delta));
    }

    let trimmed = raw.trim_end();
    let base = trimmed.strip_suffix("...").unwrap_or(trimmed);

    for suffix in REPAIR_SUFFIXES {
        let candidate = format!("{base}{suffix}");
        if let Ok(delta) = serde_json::from_str::<RawDelta>(&candidate) {
            warn!(suffix, "distiller: repaired truncated JSON response");
            return Ok(validate(delta));
        }
    }

    Err(DistillError::Parse(format!(
        "unrecoverable JSON after {} repair attempts",
        REPAIR_SUFFIXES.len()
    )))
}

/// Drops individual actions that don't validate (unknown action/type string,
/// or missing fields an action requires) rather than failing the whole
/// delta — one malformed entry shouldn't discard everything else the model
/// got right.
fn validate(delta: RawDelta) -> Vec<DistilledMemory> {
    delta
        .actions
        .into_iter()
        .filter_map(|raw| match validate_one(&raw) {
            Ok(d) => Some(d),
            Err(reason) => {
                warn!(action = %raw.action, reason, "distiller: dropping invalid action");
                None
            }
        })
        .collect()
}

fn validate_one(raw: &RawAction) -> std::result::Result<DistilledMemory, String> {
    use std::str::FromStr;

    let action = Action::from_str(&raw.action).map_err(|e| e.to_string())?;

    let mem_type = raw
        .mem_type
        .as_deref()
        .map(MemoryType::from_str)
        .transpose()
        .map_err(|e| e.to_string())?;

    match action {
        Action::Add => {
            if mem_type.is_none() || raw.key.is_none() || raw.value.is_none() {
                return Err("add requires type, key, and value".to_string());
            }
        }
        Action::Update | Action::Keep | Action::Expire => {
            if raw.id.is_none() {
                return Err(format!("{action} requires a target id"));
            }
        }
    }

    Ok(DistilledMemory {
        action,
        id: raw.id.clone(),
        mem_type,
        category: raw.category.clone(),
        key: raw.key.clone(),
        value: raw.value.clone(),
        confidence: raw.confidence,
        source_turn: raw.source_turn,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_delta() {
        let raw = r#"{"actions":[{"action":"add","type":"fact","category":"identity","key":"name","value":"Alex","confidence":0.9,"source_turn":1}]}"#;
        let delta = parse_delta(raw).unwrap();
        assert_eq!(delta.len(), 1);
        assert_eq!(delta[0].action, Action::Add);
    }

    #[test]
    fn repairs_truncated_with_ellipsis() {
        // The second action's value string was cut off mid-write, trailing
        // off with "..." and no closing quote or enclosing brackets.
        let raw = r#"{"actions":[{"action":"keep","id":"m1"}, {"action":"add","type":"fact","key":"k","value":"v..."#;
        let delta = parse_delta(raw).unwrap();
        assert_eq!(delta.len(), 2);
        assert_eq!(delta[0].action, Action::Keep);
        assert_eq!(delta[1].action, Action::Add);
        assert_eq!(delta[1].value.as_deref(), Some("v"));
    }

    #[test]
    fn repairs_missing_closing_brackets() {
        let raw = r#"{"actions":[{"action":"keep","id":"m1"}"#;
        let delta = parse_delta(raw).unwrap();
        assert_eq!(delta.len(), 1);
        assert_eq!(delta[0].action, Action::Keep);
        assert_eq!(delta[0].id.as_deref(), Some("m1"));
    }

    #[test]
    fn unrecoverable_garbage_errs() {
        let raw = "not json at all {{{";
        assert!(parse_delta(raw).is_err());
    }

    #[test]
    fn invalid_action_name_is_dropped_not_fatal() {
        let raw = r#"{"actions":[{"action":"bogus","id":"m1"},{"action":"keep","id":"m2"}]}"#;
        let delta = parse_delta(raw).unwrap();
        assert_eq!(delta.len(), 1);
        assert_eq!(delta[0].id.as_deref(), Some("m2"));
    }

    #[test]
    fn add_missing_value_is_dropped() {
        let raw = r#"{"actions":[{"action":"add","type":"fact","key":"name"}]}"#;
        let delta = parse_delta(raw).unwrap();
        assert!(delta.is_empty());
    }
}
