//! Reducer folding recognised actions into state.
//!
//! The reducer only reacts to the derived type identifiers of the context it
//! was built from. Anything else, including the raw action names, leaves the
//! state untouched (the very same `Arc` is returned).

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::trace;

use crate::action::Action;
use crate::context::Context;
use crate::error::ContextError;

type InitialState = Box<dyn Fn() -> Result<Value, ContextError> + Send + Sync>;

pub struct Reducer {
    recognized: HashSet<String>,
    initial_state: InitialState,
}

impl Reducer {
    /// Builds a reducer for the context's derived types.
    pub fn new<A>(context: Arc<Context<A>>) -> Self
    where
        A: Send + Sync + 'static,
    {
        let recognized = context.action_types().iter().cloned().collect();
        Self {
            recognized,
            initial_state: Box::new(move || context.compute_initial_state()),
        }
    }

    /// Whether `action_type` changes state.
    pub fn handles(&self, action_type: &str) -> bool {
        self.recognized.contains(action_type)
    }

    /// Applies `action` to `state`.
    ///
    /// A missing state is replaced by a freshly computed initial state first.
    /// Payload object fields are shallow-merged into a copy of the state; a
    /// non-object state is replaced by the payload object, and a non-object
    /// payload changes nothing.
    pub fn reduce(&self, state: Option<Arc<Value>>, action: &Action) -> Result<Arc<Value>, ContextError> {
        let state = match state {
            Some(state) => state,
            None => Arc::new((self.initial_state)()?),
        };

        if !self.handles(&action.action_type) {
            trace!(action_type = %action.action_type, "ignoring unrecognised action");
            return Ok(state);
        }

        let Value::Object(fields) = &action.payload else {
            return Ok(state);
        };

        let mut next = match state.as_ref() {
            Value::Object(current) => current.clone(),
            _ => Map::new(),
        };
        for (key, value) in fields {
            next.insert(key.clone(), value.clone());
        }

        Ok(Arc::new(Value::Object(next)))
    }
}

impl fmt::Debug for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reducer")
            .field("recognized", &self.recognized)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::define_action;
    use crate::config::BuildOptions;
    use crate::context::ContextBuilder;
    use crate::definition::{ApplicationDefinitionRaw, LibraryDefinitionRaw};
    use serde_json::json;

    fn context() -> Arc<Context<()>> {
        let lib = LibraryDefinitionRaw::new("idle")
            .with_actions(vec![define_action("A", json!({}))])
            .with_context_validator(|_, _| Ok(()))
            .with_app_context_factory(|_, _| Ok(()))
            .with_initial_state_factory(|_, _| Ok(json!({ "idle": false, "last": 0 })));
        let app = ApplicationDefinitionRaw::new("app").with_actions(vec![define_action("B", json!({}))]);
        Arc::new(
            ContextBuilder::new(lib, BuildOptions::default())
                .unwrap()
                .build(app)
                .unwrap(),
        )
    }

    #[test]
    fn test_unrecognised_type_returns_same_state() {
        let reducer = Reducer::new(context());
        let state = Arc::new(json!({ "idle": true }));

        let next = reducer
            .reduce(Some(Arc::clone(&state)), &Action::new("IDLE_APP_C", json!({ "idle": false })))
            .unwrap();
        assert!(Arc::ptr_eq(&next, &state));

        // Raw names are not types.
        let next = reducer
            .reduce(Some(Arc::clone(&state)), &Action::new("A", json!({ "idle": false })))
            .unwrap();
        assert!(Arc::ptr_eq(&next, &state));
    }

    #[test]
    fn test_recognised_type_merges_payload() {
        let reducer = Reducer::new(context());
        let state = Arc::new(json!({ "idle": true, "last": 3 }));

        let next = reducer
            .reduce(Some(Arc::clone(&state)), &Action::new("IDLE_APP_B", json!({ "idle": false })))
            .unwrap();

        assert_eq!(*next, json!({ "idle": false, "last": 3 }));
        assert_eq!(*state, json!({ "idle": true, "last": 3 }));
    }

    #[test]
    fn test_missing_state_uses_initial_state() {
        let reducer = Reducer::new(context());

        let next = reducer.reduce(None, &Action::new("unknown", Value::Null)).unwrap();
        assert_eq!(*next, json!({ "idle": false, "last": 0 }));

        let next = reducer
            .reduce(None, &Action::new("IDLE_APP_A", json!({ "last": 9 })))
            .unwrap();
        assert_eq!(*next, json!({ "idle": false, "last": 9 }));
    }

    #[test]
    fn test_non_object_payload_and_state() {
        let reducer = Reducer::new(context());

        let state = Arc::new(json!({ "idle": true }));
        let next = reducer
            .reduce(Some(Arc::clone(&state)), &Action::new("IDLE_APP_A", json!(5)))
            .unwrap();
        assert!(Arc::ptr_eq(&next, &state));

        let next = reducer
            .reduce(Some(Arc::new(json!(7))), &Action::new("IDLE_APP_A", json!({ "idle": true })))
            .unwrap();
        assert_eq!(*next, json!({ "idle": true }));
    }

    #[test]
    fn test_initial_state_errors_propagate() {
        let lib = LibraryDefinitionRaw::new("idle")
            .with_actions(vec![])
            .with_context_validator(|_, _| Ok(()))
            .with_app_context_factory(|_, _| Ok(()))
            .with_initial_state_factory(|_, _| anyhow::bail!("state store offline"));
        let context = ContextBuilder::new(lib, BuildOptions::default())
            .unwrap()
            .build(ApplicationDefinitionRaw::new("app"))
            .unwrap();

        let reducer = Reducer::new(Arc::new(context));
        let err = reducer.reduce(None, &Action::new("x", Value::Null)).unwrap_err();
        assert_eq!(err.to_string(), "state store offline");
    }
}
