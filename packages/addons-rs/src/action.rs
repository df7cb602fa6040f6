//! Registry entries and dispatchable action values.
//!
//! An [`ActionEntry`] is the pair a library or application registers: a
//! human-authored name plus opaque metadata. The metadata is shared behind an
//! `Arc` so every lookup structure built from an entry hands back the very
//! same object that was registered.
//!
//! On the wire an entry is the 2-element array `["name", { ...metadata }]`,
//! which is how registries are authored in JSON.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ContextError, Origin};

/// Shared, immutable action metadata.
pub type ActionMeta = Arc<Value>;

/// A registered action: name plus opaque metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, Value)", into = "(String, Value)")]
pub struct ActionEntry {
    name: String,
    metadata: ActionMeta,
}

impl ActionEntry {
    /// The human-authored action name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The metadata registered with the action.
    pub fn metadata(&self) -> &ActionMeta {
        &self.metadata
    }

    /// Re-keys already shared metadata under another name.
    pub(crate) fn from_shared(name: String, metadata: ActionMeta) -> Self {
        Self { name, metadata }
    }
}

impl From<(String, Value)> for ActionEntry {
    fn from((name, metadata): (String, Value)) -> Self {
        Self {
            name,
            metadata: Arc::new(metadata),
        }
    }
}

impl From<ActionEntry> for (String, Value) {
    fn from(entry: ActionEntry) -> Self {
        let metadata = Arc::try_unwrap(entry.metadata).unwrap_or_else(|shared| (*shared).clone());
        (entry.name, metadata)
    }
}

/// Defines a registry entry.
///
/// This is the constructor for everything a library or application registers.
///
/// ```
/// use addons::define_action;
/// use serde_json::json;
///
/// let entry = define_action("activity", json!({ "idle": false }));
/// assert_eq!(entry.name(), "activity");
/// ```
pub fn define_action(name: impl Into<String>, metadata: Value) -> ActionEntry {
    ActionEntry {
        name: name.into(),
        metadata: Arc::new(metadata),
    }
}

/// Parses a JSON-authored action list, enforcing the registry shape.
///
/// The value must be an array whose items are each `[string, object]`.
pub fn actions_from_json(origin: Origin, value: &Value) -> Result<Vec<ActionEntry>, ContextError> {
    let items = match value {
        Value::Null => return Err(ContextError::ActionsMissing { origin }),
        Value::Array(items) => items,
        _ => return Err(ContextError::ActionsNotArray { origin }),
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let pair = match item.as_array() {
                Some(pair) if pair.len() == 2 => pair,
                _ => return Err(ContextError::ActionNotPair { origin, index }),
            };
            let name = pair[0]
                .as_str()
                .ok_or(ContextError::ActionNameNotString { origin, index })?;
            if !pair[1].is_object() {
                return Err(ContextError::ActionMetadataNotObject {
                    origin,
                    name: name.to_string(),
                });
            }
            Ok(define_action(name, pair[1].clone()))
        })
        .collect()
}

/// Parses a JSON-authored action list without enforcing its shape.
///
/// Items that are not `[string, value]` pairs are skipped. Used when
/// validation is switched off.
pub fn actions_from_json_lenient(value: &Value) -> Vec<ActionEntry> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let pair = item.as_array()?;
            let name = pair.first()?.as_str()?;
            let metadata = pair.get(1).cloned().unwrap_or(Value::Null);
            Some(define_action(name, metadata))
        })
        .collect()
}

/// A dispatchable action: derived type identifier plus payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// The derived type identifier.
    #[serde(rename = "type")]
    pub action_type: String,
    /// Fields folded into state by a reducer.
    #[serde(default)]
    pub payload: Value,
}

impl Action {
    /// Creates an action with the given type and payload.
    pub fn new(action_type: impl Into<String>, payload: Value) -> Self {
        Self {
            action_type: action_type.into(),
            payload,
        }
    }
}
