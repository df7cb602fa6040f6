//! Testing utilities for libraries built on addons.
//!
//! # Feature Flag
//!
//! This module is only available with the `testing` feature:
//!
//! ```toml
//! [dev-dependencies]
//! addons = { version = "0.1", features = ["testing"] }
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use addons::testing::{recording_library, CallLog};
//!
//! let calls = CallLog::new();
//! let builder = ContextBuilder::new(recording_library("idle", vec![], &calls), BuildOptions::default())?;
//!
//! let err = builder.build(colliding_app).unwrap_err();
//! assert!(calls.is_empty()); // nothing ran before the collision check
//! ```

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::action::{define_action, ActionEntry};
use crate::definition::{ApplicationDefinitionRaw, LibraryDefinitionRaw};

/// Which injected function ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    AppContextFactory,
    ContextValidator,
    InitialStateFactory,
}

/// Shared, ordered record of injected-function calls.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: Call) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    /// Snapshot of the calls so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls().into_iter().filter(|c| *c == call).count()
    }

    pub fn is_empty(&self) -> bool {
        self.calls().is_empty()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }
}

/// Application fragment produced by [`recording_library`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppFragment {
    pub app_name: String,
    pub action_count: usize,
}

/// A library whose three injected functions record into `calls`.
///
/// The fragment captures the application name and the number of combined
/// actions; the initial state is `{ "app": <name>, "actions": <count> }`.
pub fn recording_library(
    name: &str,
    actions: Vec<ActionEntry>,
    calls: &CallLog,
) -> LibraryDefinitionRaw<AppFragment> {
    let on_factory = calls.clone();
    let on_validator = calls.clone();
    let on_initial = calls.clone();

    LibraryDefinitionRaw::new(name)
        .with_actions(actions)
        .with_app_context_factory(move |lib, app| {
            on_factory.record(Call::AppContextFactory);
            Ok(AppFragment {
                app_name: app.name().to_string(),
                action_count: lib.action_names().len(),
            })
        })
        .with_context_validator(move |_, _| {
            on_validator.record(Call::ContextValidator);
            Ok(())
        })
        .with_initial_state_factory(move |_, fragment| {
            on_initial.record(Call::InitialStateFactory);
            Ok(json!({ "app": fragment.app_name, "actions": fragment.action_count }))
        })
}

/// A library with no injected functions at all.
///
/// Only buildable with validation disabled, and even then the build fails
/// for lack of an application-context factory.
pub fn bare_library(name: &str, actions: Vec<ActionEntry>) -> LibraryDefinitionRaw<()> {
    LibraryDefinitionRaw::new(name).with_actions(actions)
}

/// Idle-monitor style library: tracks activity and idleness.
pub fn idle_monitor_library(calls: &CallLog) -> LibraryDefinitionRaw<AppFragment> {
    recording_library(
        "Idle Monitor",
        vec![
            define_action("activity", json!({ "idle": false })),
            define_action("idle", json!({ "idle": true })),
        ],
        calls,
    )
}

/// Application definition with the given actions, each with `{ "index": i }`.
pub fn app_with_actions(name: &str, actions: &[&str]) -> ApplicationDefinitionRaw {
    ApplicationDefinitionRaw::new(name).with_actions(
        actions
            .iter()
            .enumerate()
            .map(|(index, action)| define_action(*action, json!({ "index": index })))
            .collect(),
    )
}

/// Metadata-only helper: `{ "tag": tag }`.
pub fn tagged(tag: &str) -> Value {
    json!({ "tag": tag })
}
