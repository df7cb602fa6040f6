//! Library and application definitions.
//!
//! Each registry comes in two forms:
//!
//! - a **raw** definition, as authored (fields may be missing when validation
//!   is switched off), and
//! - a **normalized** definition, which adds the name→metadata map and the
//!   ordered name sequence derived from the action list.
//!
//! The library definition additionally owns the three injected functions and
//! the cross-check that keeps application names out of the library namespace.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::action::{actions_from_json_lenient, ActionEntry, ActionMeta};
use crate::context::LibContext;
use crate::error::{ContextError, Origin};
use crate::log::LogLevel;

/// Checks a finished context against the application-context fragment.
pub type ContextValidator<A> = Arc<dyn Fn(&LibContext, &A) -> anyhow::Result<()> + Send + Sync>;

/// Produces the application-context fragment from the context and the
/// normalized application definition.
pub type AppContextFactory<A> =
    Arc<dyn Fn(&LibContext, &ApplicationDefinition) -> anyhow::Result<A> + Send + Sync>;

/// Produces a fresh initial state from the context and the fragment.
pub type InitialStateFactory<A> = Arc<dyn Fn(&LibContext, &A) -> anyhow::Result<Value> + Send + Sync>;

/// Field names of the injected functions, used in error reports.
pub(crate) const CONTEXT_VALIDATOR: &str = "context_validator";
pub(crate) const APP_CONTEXT_FACTORY: &str = "app_context_factory";
pub(crate) const INITIAL_STATE_FACTORY: &str = "initial_state_factory";

// =============================================================================
// Library
// =============================================================================

/// A library registry as authored.
///
/// # Example
///
/// ```ignore
/// let raw = LibraryDefinitionRaw::new("idle-monitor")
///     .with_actions(vec![define_action("activity", json!({}))])
///     .with_context_validator(|_ctx, _app: &IdleConfig| Ok(()))
///     .with_app_context_factory(|_ctx, app| Ok(IdleConfig::from(app)))
///     .with_initial_state_factory(|_ctx, app| Ok(json!({ "idle": app.start_idle })));
/// ```
pub struct LibraryDefinitionRaw<A> {
    pub name: String,
    pub actions: Option<Vec<ActionEntry>>,
    pub context_validator: Option<ContextValidator<A>>,
    pub app_context_factory: Option<AppContextFactory<A>>,
    pub initial_state_factory: Option<InitialStateFactory<A>>,
}

impl<A> LibraryDefinitionRaw<A> {
    /// Starts a definition with no actions and no injected functions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: None,
            context_validator: None,
            app_context_factory: None,
            initial_state_factory: None,
        }
    }

    pub fn with_actions(mut self, actions: Vec<ActionEntry>) -> Self {
        self.actions = Some(actions);
        self
    }

    pub fn with_context_validator(
        mut self,
        f: impl Fn(&LibContext, &A) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.context_validator = Some(Arc::new(f));
        self
    }

    pub fn with_app_context_factory(
        mut self,
        f: impl Fn(&LibContext, &ApplicationDefinition) -> anyhow::Result<A> + Send + Sync + 'static,
    ) -> Self {
        self.app_context_factory = Some(Arc::new(f));
        self
    }

    pub fn with_initial_state_factory(
        mut self,
        f: impl Fn(&LibContext, &A) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.initial_state_factory = Some(Arc::new(f));
        self
    }
}

impl<A> Clone for LibraryDefinitionRaw<A> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            actions: self.actions.clone(),
            context_validator: self.context_validator.clone(),
            app_context_factory: self.app_context_factory.clone(),
            initial_state_factory: self.initial_state_factory.clone(),
        }
    }
}

impl<A> fmt::Debug for LibraryDefinitionRaw<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryDefinitionRaw")
            .field("name", &self.name)
            .field("actions", &self.actions)
            .field("context_validator", &self.context_validator.is_some())
            .field("app_context_factory", &self.app_context_factory.is_some())
            .field("initial_state_factory", &self.initial_state_factory.is_some())
            .finish()
    }
}

/// A validated library registry with its derived lookups.
pub struct LibraryDefinition<A> {
    name: String,
    actions: Vec<ActionEntry>,
    action_map: HashMap<String, ActionMeta>,
    action_names: Vec<String>,
    name_set: HashSet<String>,
    pub(crate) context_validator: Option<ContextValidator<A>>,
    pub(crate) app_context_factory: Option<AppContextFactory<A>>,
    pub(crate) initial_state_factory: Option<InitialStateFactory<A>>,
}

impl<A> LibraryDefinition<A> {
    /// Validates (when `validate` is set) and normalizes a raw library definition.
    ///
    /// Duplicate action names are not rejected: the later entry wins in the
    /// name→metadata map while the ordered name sequence keeps both.
    pub fn normalize(raw: LibraryDefinitionRaw<A>, validate: bool) -> Result<Self, ContextError> {
        if validate {
            validate_library(&raw)?;
        }

        let actions = raw.actions.unwrap_or_default();
        let (action_map, action_names) = index_actions(&actions);
        let name_set = action_names.iter().cloned().collect();

        debug!(lib = %raw.name, actions = actions.len(), "library definition normalized");

        Ok(Self {
            name: raw.name,
            actions,
            action_map,
            action_names,
            name_set,
            context_validator: raw.context_validator,
            app_context_factory: raw.app_context_factory,
            initial_state_factory: raw.initial_state_factory,
        })
    }

    /// Rejects an application whose action names reuse a library action name.
    ///
    /// Inspects the raw application action list directly.
    pub fn validate_against(&self, app: &ApplicationDefinitionRaw) -> Result<(), ContextError> {
        match app.actions.iter().find(|entry| self.name_set.contains(entry.name())) {
            Some(entry) => Err(ContextError::ActionNameCollision {
                name: entry.name().to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn actions(&self) -> &[ActionEntry] {
        &self.actions
    }

    pub fn action_map(&self) -> &HashMap<String, ActionMeta> {
        &self.action_map
    }

    pub fn action_names(&self) -> &[String] {
        &self.action_names
    }

    /// Whether `name` is one of the library's own action names.
    pub fn contains(&self, name: &str) -> bool {
        self.name_set.contains(name)
    }
}

impl<A> fmt::Debug for LibraryDefinition<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryDefinition")
            .field("name", &self.name)
            .field("action_names", &self.action_names)
            .finish_non_exhaustive()
    }
}

fn validate_library<A>(raw: &LibraryDefinitionRaw<A>) -> Result<(), ContextError> {
    let origin = Origin::Library;
    if raw.name.is_empty() {
        return Err(ContextError::NameEmpty { origin });
    }

    let actions = raw
        .actions
        .as_ref()
        .ok_or(ContextError::ActionsMissing { origin })?;
    validate_entries(origin, actions)?;

    if raw.context_validator.is_none() {
        return Err(ContextError::HandlerMissing {
            handler: CONTEXT_VALIDATOR,
        });
    }
    if raw.app_context_factory.is_none() {
        return Err(ContextError::HandlerMissing {
            handler: APP_CONTEXT_FACTORY,
        });
    }
    if raw.initial_state_factory.is_none() {
        return Err(ContextError::HandlerMissing {
            handler: INITIAL_STATE_FACTORY,
        });
    }

    Ok(())
}

/// Checks that every entry has a non-empty name and object metadata.
pub fn validate_entries(origin: Origin, actions: &[ActionEntry]) -> Result<(), ContextError> {
    for (index, entry) in actions.iter().enumerate() {
        if entry.name().is_empty() {
            return Err(ContextError::ActionNameEmpty { origin, index });
        }
        if !entry.metadata().is_object() {
            return Err(ContextError::ActionMetadataNotObject {
                origin,
                name: entry.name().to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Application
// =============================================================================

/// An application registry as authored.
///
/// Fields other than `name`, `actions` and `level` are kept verbatim in
/// `extra` and handed to the library's application-context factory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationDefinitionRaw {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub actions: Vec<ActionEntry>,
    #[serde(default, alias = "logLevel", skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApplicationDefinitionRaw {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_actions(mut self, actions: Vec<ActionEntry>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Adds a pass-through field.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Decodes a JSON-authored application definition.
    pub fn from_json(value: Value) -> Result<Self, ContextError> {
        let origin = Origin::Application;
        if value.is_null() {
            return Err(ContextError::DefinitionMissing { origin });
        }
        serde_json::from_value(value).map_err(|source| ContextError::Malformed { origin, source })
    }

    /// Decodes an application definition without enforcing field shapes.
    ///
    /// Malformed action items are skipped, and a name or level of the wrong
    /// type is dropped. Used when validation is switched off.
    pub fn from_json_lenient(value: Value) -> Result<Self, ContextError> {
        let mut fields = match value {
            Value::Null => {
                return Err(ContextError::DefinitionMissing {
                    origin: Origin::Application,
                })
            }
            Value::Object(fields) => fields,
            other => return Self::from_json(other),
        };

        let actions = fields
            .remove("actions")
            .map(|actions| actions_from_json_lenient(&actions))
            .unwrap_or_default();
        let name = fields
            .remove("name")
            .and_then(|name| name.as_str().map(str::to_string));
        let level = fields
            .remove("level")
            .or_else(|| fields.remove("logLevel"))
            .and_then(|level| level.as_str()?.parse().ok());

        Ok(Self {
            name,
            actions,
            level,
            extra: fields,
        })
    }
}

/// A validated application registry with its derived lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationDefinition {
    name: String,
    actions: Vec<ActionEntry>,
    action_map: HashMap<String, ActionMeta>,
    action_names: Vec<String>,
    level: Option<LogLevel>,
    extra: Map<String, Value>,
}

impl ApplicationDefinition {
    /// Validates (when `validate` is set) and normalizes a raw application
    /// definition.
    ///
    /// Only the name is checked. Repeated action names are tolerated with a
    /// warning; the later entry wins in the name→metadata map.
    pub fn normalize(raw: ApplicationDefinitionRaw, validate: bool) -> Result<Self, ContextError> {
        let origin = Origin::Application;
        if validate {
            match raw.name.as_deref() {
                None => return Err(ContextError::NameMissing { origin }),
                Some("") => return Err(ContextError::NameEmpty { origin }),
                Some(_) => {}
            }
        }

        let name = raw.name.unwrap_or_default();
        let (action_map, action_names) = index_actions(&raw.actions);
        if action_map.len() != action_names.len() {
            warn!(
                app = %name,
                distinct = action_map.len(),
                registered = action_names.len(),
                "application registers duplicate action names, later entries win"
            );
        }

        Ok(Self {
            name,
            actions: raw.actions,
            action_map,
            action_names,
            level: raw.level,
            extra: raw.extra,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn actions(&self) -> &[ActionEntry] {
        &self.actions
    }

    pub fn action_map(&self) -> &HashMap<String, ActionMeta> {
        &self.action_map
    }

    pub fn action_names(&self) -> &[String] {
        &self.action_names
    }

    pub fn level(&self) -> Option<LogLevel> {
        self.level
    }

    /// Pass-through fields from the raw definition.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

/// Builds the name→metadata map (last write wins) and the ordered names.
fn index_actions(actions: &[ActionEntry]) -> (HashMap<String, ActionMeta>, Vec<String>) {
    let mut map = HashMap::with_capacity(actions.len());
    let mut names = Vec::with_capacity(actions.len());
    for entry in actions {
        map.insert(entry.name().to_string(), Arc::clone(entry.metadata()));
        names.push(entry.name().to_string());
    }
    (map, names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::define_action;
    use serde_json::json;

    fn full_library() -> LibraryDefinitionRaw<()> {
        LibraryDefinitionRaw::new("idle-monitor")
            .with_actions(vec![
                define_action("start", json!({ "n": 1 })),
                define_action("stop", json!({ "n": 2 })),
            ])
            .with_context_validator(|_, _| Ok(()))
            .with_app_context_factory(|_, _| Ok(()))
            .with_initial_state_factory(|_, _| Ok(json!({})))
    }

    #[test]
    fn test_library_normalizes() {
        let lib = LibraryDefinition::normalize(full_library(), true).unwrap();
        assert_eq!(lib.name(), "idle-monitor");
        assert_eq!(lib.action_names(), ["start", "stop"]);
        assert_eq!(*lib.action_map()["stop"].as_ref(), json!({ "n": 2 }));
        assert!(lib.contains("start"));
        assert!(!lib.contains("activity"));
    }

    #[test]
    fn test_library_rejects_empty_name() {
        let mut raw = full_library();
        raw.name.clear();
        let err = LibraryDefinition::normalize(raw, true).unwrap_err();
        assert!(matches!(err, ContextError::NameEmpty { origin: Origin::Library }));
    }

    #[test]
    fn test_library_rejects_missing_actions() {
        let mut raw = full_library();
        raw.actions = None;
        let err = LibraryDefinition::normalize(raw, true).unwrap_err();
        assert!(matches!(err, ContextError::ActionsMissing { .. }));
    }

    #[test]
    fn test_library_rejects_bad_entries() {
        let raw = full_library().with_actions(vec![define_action("start", json!("oops"))]);
        let err = LibraryDefinition::normalize(raw, true).unwrap_err();
        assert!(matches!(err, ContextError::ActionMetadataNotObject { .. }));

        let raw = full_library().with_actions(vec![
            define_action("start", json!({})),
            define_action("", json!({})),
        ]);
        let err = LibraryDefinition::normalize(raw, true).unwrap_err();
        assert!(matches!(err, ContextError::ActionNameEmpty { index: 1, .. }));
    }

    #[test]
    fn test_library_requires_each_handler() {
        let mut raw = full_library();
        raw.context_validator = None;
        let err = LibraryDefinition::normalize(raw, true).unwrap_err();
        assert!(matches!(
            err,
            ContextError::HandlerMissing {
                handler: CONTEXT_VALIDATOR
            }
        ));

        let mut raw = full_library();
        raw.app_context_factory = None;
        let err = LibraryDefinition::normalize(raw, true).unwrap_err();
        assert!(matches!(
            err,
            ContextError::HandlerMissing {
                handler: APP_CONTEXT_FACTORY
            }
        ));

        let mut raw = full_library();
        raw.initial_state_factory = None;
        let err = LibraryDefinition::normalize(raw, true).unwrap_err();
        assert!(matches!(
            err,
            ContextError::HandlerMissing {
                handler: INITIAL_STATE_FACTORY
            }
        ));
    }

    #[test]
    fn test_library_skips_checks_when_unvalidated() {
        let raw: LibraryDefinitionRaw<()> = LibraryDefinitionRaw::new("");
        let lib = LibraryDefinition::normalize(raw, false).unwrap();
        assert!(lib.actions().is_empty());
    }

    #[test]
    fn test_library_duplicate_names_last_wins() {
        let raw = full_library().with_actions(vec![
            define_action("start", json!({ "v": 1 })),
            define_action("start", json!({ "v": 2 })),
        ]);
        let lib = LibraryDefinition::normalize(raw, true).unwrap();
        assert_eq!(lib.action_names(), ["start", "start"]);
        assert_eq!(*lib.action_map()["start"].as_ref(), json!({ "v": 2 }));
    }

    #[test]
    fn test_validate_against_reports_collision() {
        let lib = LibraryDefinition::normalize(full_library(), true).unwrap();

        let app = ApplicationDefinitionRaw::new("app").with_actions(vec![
            define_action("refresh", json!({})),
            define_action("stop", json!({})),
        ]);
        match lib.validate_against(&app).unwrap_err() {
            ContextError::ActionNameCollision { name } => assert_eq!(name, "stop"),
            other => panic!("Expected ActionNameCollision, got {other:?}"),
        }

        let app = ApplicationDefinitionRaw::new("app")
            .with_actions(vec![define_action("refresh", json!({}))]);
        assert!(lib.validate_against(&app).is_ok());
    }

    #[test]
    fn test_application_requires_name() {
        let err = ApplicationDefinition::normalize(ApplicationDefinitionRaw::default(), true)
            .unwrap_err();
        assert!(matches!(err, ContextError::NameMissing { origin: Origin::Application }));

        let err = ApplicationDefinition::normalize(ApplicationDefinitionRaw::new(""), true)
            .unwrap_err();
        assert!(matches!(err, ContextError::NameEmpty { origin: Origin::Application }));

        let app = ApplicationDefinition::normalize(ApplicationDefinitionRaw::default(), false)
            .unwrap();
        assert_eq!(app.name(), "");
    }

    #[test]
    fn test_application_does_not_check_action_shape() {
        let raw = ApplicationDefinitionRaw::new("app")
            .with_actions(vec![define_action("odd", json!(42))]);
        let app = ApplicationDefinition::normalize(raw, true).unwrap();
        assert_eq!(app.action_names(), ["odd"]);
    }

    #[test]
    fn test_application_duplicates_last_wins() {
        let raw = ApplicationDefinitionRaw::new("app").with_actions(vec![
            define_action("tick", json!({ "v": 1 })),
            define_action("tick", json!({ "v": 2 })),
        ]);
        let app = ApplicationDefinition::normalize(raw, true).unwrap();
        assert_eq!(app.action_names(), ["tick", "tick"]);
        assert_eq!(*app.action_map()["tick"].as_ref(), json!({ "v": 2 }));
    }

    #[test]
    fn test_application_from_json_keeps_extra_fields() {
        let raw = ApplicationDefinitionRaw::from_json(json!({
            "name": "dashboard",
            "actions": [["refresh", { "every": 5 }]],
            "logLevel": "debug",
            "timeout": 3000
        }))
        .unwrap();
        assert_eq!(raw.name.as_deref(), Some("dashboard"));
        assert_eq!(raw.level, Some(LogLevel::Debug));
        assert_eq!(raw.extra["timeout"], json!(3000));

        let app = ApplicationDefinition::normalize(raw, true).unwrap();
        assert_eq!(app.extra()["timeout"], json!(3000));
        assert_eq!(app.level(), Some(LogLevel::Debug));
    }

    #[test]
    fn test_application_from_json_errors() {
        let err = ApplicationDefinitionRaw::from_json(Value::Null).unwrap_err();
        assert!(matches!(err, ContextError::DefinitionMissing { .. }));

        let err = ApplicationDefinitionRaw::from_json(json!({ "name": "a", "actions": 3 }))
            .unwrap_err();
        assert!(matches!(err, ContextError::Malformed { .. }));
    }

    #[test]
    fn test_application_from_json_level_ignores_case() {
        let raw = ApplicationDefinitionRaw::from_json(json!({ "name": "a", "level": "DEBUG" })).unwrap();
        assert_eq!(raw.level, Some(LogLevel::Debug));

        let raw = ApplicationDefinitionRaw::from_json(json!({ "name": "a", "logLevel": "warning" })).unwrap();
        assert_eq!(raw.level, Some(LogLevel::Warn));

        let err = ApplicationDefinitionRaw::from_json(json!({ "name": "a", "level": "loud" })).unwrap_err();
        assert!(matches!(err, ContextError::Malformed { .. }));
    }

    #[test]
    fn test_application_from_json_lenient_skips_malformed() {
        let raw = ApplicationDefinitionRaw::from_json_lenient(json!({
            "name": "dashboard",
            "actions": [["refresh", { "every": 5 }], ["x"], 4, [7, {}]],
            "level": "Loud",
            "timeout": 3000
        }))
        .unwrap();

        let names: Vec<_> = raw.actions.iter().map(|entry| entry.name()).collect();
        assert_eq!(names, vec!["refresh", "x"]);
        assert_eq!(raw.name.as_deref(), Some("dashboard"));
        assert_eq!(raw.level, None);
        assert_eq!(raw.extra["timeout"], json!(3000));

        let raw = ApplicationDefinitionRaw::from_json_lenient(json!({ "name": 3, "logLevel": "ERROR" })).unwrap();
        assert_eq!(raw.name, None);
        assert!(raw.actions.is_empty());
        assert_eq!(raw.level, Some(LogLevel::Error));

        let err = ApplicationDefinitionRaw::from_json_lenient(Value::Null).unwrap_err();
        assert!(matches!(err, ContextError::DefinitionMissing { .. }));
    }
}
