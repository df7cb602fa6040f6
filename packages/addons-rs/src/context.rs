//! Context builder: merges a library and an application registry.
//!
//! Construction happens in two stages:
//!
//! 1. [`ContextBuilder::new`] validates and normalizes the library definition
//!    once. The builder is cheap to clone and can be reused for any number of
//!    applications.
//! 2. [`ContextBuilder::build`] cross-checks and normalizes one application
//!    definition, merges both registries (library first), derives the type
//!    identifiers, runs the library's application-context factory and
//!    validator, and returns the finished [`Context`].
//!
//! Any failure aborts the build; no partially built context is returned.
//!
//! # Example
//!
//! ```ignore
//! use addons::{define_action, ApplicationDefinitionRaw, BuildOptions, ContextBuilder};
//!
//! let builder = ContextBuilder::new(idle_monitor_library(), BuildOptions::default())?;
//!
//! let context = builder.build(
//!     ApplicationDefinitionRaw::new("dashboard")
//!         .with_actions(vec![define_action("refresh", json!({ "every": 5 }))]),
//! )?;
//!
//! assert_eq!(context.action_type("refresh"), Some("IDLE_MONITOR_DASHBOARD_REFRESH"));
//! let initial = context.compute_initial_state()?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::action::{Action, ActionEntry, ActionMeta};
use crate::config::BuildOptions;
use crate::definition::{
    ApplicationDefinition, ApplicationDefinitionRaw, InitialStateFactory, LibraryDefinition,
    LibraryDefinitionRaw, APP_CONTEXT_FACTORY, INITIAL_STATE_FACTORY,
};
use crate::error::ContextError;
use crate::log::{Logger, LoggerOptions};
use crate::naming;

// =============================================================================
// Lib Context
// =============================================================================

/// Every lookup structure derived from a library/application pair.
///
/// Sequences are ordered library first, application second. Maps built from
/// them keep the last entry for a repeated name.
#[derive(Debug)]
pub struct LibContext {
    log: Logger,

    lib_name: String,
    lib_actions: Vec<ActionEntry>,
    lib_action_map: HashMap<String, ActionMeta>,
    lib_action_names: Vec<String>,

    app: ApplicationDefinition,
    app_raw: ApplicationDefinitionRaw,

    actions: Vec<ActionEntry>,
    action_map: HashMap<String, ActionMeta>,
    action_names: Vec<String>,

    typed_lib_actions: Vec<ActionEntry>,
    typed_app_actions: Vec<ActionEntry>,
    lib_action_types: Vec<String>,
    app_action_types: Vec<String>,
    typed_actions: Vec<ActionEntry>,
    typed_action_map: HashMap<String, ActionMeta>,
    action_types: Vec<String>,

    type_by_name: HashMap<String, String>,
}

impl LibContext {
    fn assemble<A>(
        library: &LibraryDefinition<A>,
        app: ApplicationDefinition,
        app_raw: ApplicationDefinitionRaw,
        options: &BuildOptions,
    ) -> Result<Self, ContextError> {
        let lib_name = library.name().to_string();
        let app_name = app.name().to_string();
        let derive = |name: &str| naming::action_type(&lib_name, &app_name, name);

        let typed = |entries: &[ActionEntry]| -> Vec<ActionEntry> {
            entries
                .iter()
                .map(|entry| {
                    let action_type = derive(entry.name());
                    trace!(name = entry.name(), %action_type, "derived action type");
                    ActionEntry::from_shared(action_type, Arc::clone(entry.metadata()))
                })
                .collect()
        };
        let typed_lib_actions = typed(library.actions());
        let typed_app_actions = typed(app.actions());

        let actions: Vec<ActionEntry> = library.actions().iter().chain(app.actions()).cloned().collect();
        let typed_actions: Vec<ActionEntry> = typed_lib_actions
            .iter()
            .chain(&typed_app_actions)
            .cloned()
            .collect();

        let action_names = names_of(&actions);
        let action_types = names_of(&typed_actions);

        if options.validate {
            check_type_collisions(&action_names, &action_types)?;
        }

        let mut type_by_name = HashMap::with_capacity(action_names.len());
        for (name, action_type) in action_names.iter().zip(&action_types) {
            type_by_name
                .entry(name.clone())
                .or_insert_with(|| action_type.clone());
        }

        let log = Logger::new(LoggerOptions {
            name: lib_name.clone(),
            level: app.level().or(options.default_level),
        });

        Ok(Self {
            log,
            lib_action_map: library.action_map().clone(),
            lib_action_names: library.action_names().to_vec(),
            lib_actions: library.actions().to_vec(),
            lib_name,
            action_map: map_of(&actions),
            actions,
            action_names,
            lib_action_types: names_of(&typed_lib_actions),
            app_action_types: names_of(&typed_app_actions),
            typed_action_map: map_of(&typed_actions),
            typed_lib_actions,
            typed_app_actions,
            typed_actions,
            action_types,
            type_by_name,
            app,
            app_raw,
        })
    }

    /// Logger namespaced by the library name.
    pub fn log(&self) -> &Logger {
        &self.log
    }

    pub fn lib_name(&self) -> &str {
        &self.lib_name
    }

    pub fn lib_actions(&self) -> &[ActionEntry] {
        &self.lib_actions
    }

    pub fn lib_action_map(&self) -> &HashMap<String, ActionMeta> {
        &self.lib_action_map
    }

    pub fn lib_action_names(&self) -> &[String] {
        &self.lib_action_names
    }

    pub fn app_name(&self) -> &str {
        self.app.name()
    }

    pub fn app_actions(&self) -> &[ActionEntry] {
        self.app.actions()
    }

    pub fn app_action_map(&self) -> &HashMap<String, ActionMeta> {
        self.app.action_map()
    }

    pub fn app_action_names(&self) -> &[String] {
        self.app.action_names()
    }

    /// The normalized application definition.
    pub fn app_definition(&self) -> &ApplicationDefinition {
        &self.app
    }

    /// The application definition exactly as it was passed to `build`.
    pub fn app_definition_raw(&self) -> &ApplicationDefinitionRaw {
        &self.app_raw
    }

    /// Library actions followed by application actions.
    pub fn actions(&self) -> &[ActionEntry] {
        &self.actions
    }

    pub fn action_map(&self) -> &HashMap<String, ActionMeta> {
        &self.action_map
    }

    pub fn action_names(&self) -> &[String] {
        &self.action_names
    }

    /// Library actions keyed by their derived type.
    pub fn typed_lib_actions(&self) -> &[ActionEntry] {
        &self.typed_lib_actions
    }

    /// Application actions keyed by their derived type.
    pub fn typed_app_actions(&self) -> &[ActionEntry] {
        &self.typed_app_actions
    }

    pub fn lib_action_types(&self) -> &[String] {
        &self.lib_action_types
    }

    pub fn app_action_types(&self) -> &[String] {
        &self.app_action_types
    }

    pub fn typed_actions(&self) -> &[ActionEntry] {
        &self.typed_actions
    }

    pub fn typed_action_map(&self) -> &HashMap<String, ActionMeta> {
        &self.typed_action_map
    }

    /// Derived types in the same order as [`action_names`](Self::action_names).
    pub fn action_types(&self) -> &[String] {
        &self.action_types
    }

    /// Derives the type identifier `name` would get in this namespace.
    ///
    /// Works for any name, registered or not.
    pub fn create_action_type(&self, name: &str) -> String {
        naming::action_type(&self.lib_name, self.app.name(), name)
    }

    /// Derived type of a registered action name.
    pub fn action_type(&self, name: &str) -> Option<&str> {
        self.type_by_name.get(name).map(String::as_str)
    }

    pub fn action_context_by_name(&self, name: &str) -> Option<&ActionMeta> {
        self.action_map.get(name)
    }

    pub fn action_context_by_type(&self, action_type: &str) -> Option<&ActionMeta> {
        self.typed_action_map.get(action_type)
    }

    /// Metadata of the library's `ordinal`-th action as registered.
    pub fn lib_action_context_by_ordinal(&self, ordinal: usize) -> Option<&ActionMeta> {
        self.lib_actions.get(ordinal).map(ActionEntry::metadata)
    }

    /// Metadata of the application's `ordinal`-th action as registered.
    pub fn app_action_context_by_ordinal(&self, ordinal: usize) -> Option<&ActionMeta> {
        self.app.actions().get(ordinal).map(ActionEntry::metadata)
    }

    /// Whether `action_type` is one of this context's derived types.
    pub fn recognizes(&self, action_type: &str) -> bool {
        self.typed_action_map.contains_key(action_type)
    }

    /// Builds a dispatchable action for a registered name.
    pub fn create_action(&self, name: &str, payload: Value) -> Option<Action> {
        self.action_type(name)
            .map(|action_type| Action::new(action_type, payload))
    }
}

fn names_of(entries: &[ActionEntry]) -> Vec<String> {
    entries.iter().map(|entry| entry.name().to_string()).collect()
}

fn map_of(entries: &[ActionEntry]) -> HashMap<String, ActionMeta> {
    entries
        .iter()
        .map(|entry| (entry.name().to_string(), Arc::clone(entry.metadata())))
        .collect()
}

/// Rejects two distinct names that clean to the same type identifier.
fn check_type_collisions(names: &[String], types: &[String]) -> Result<(), ContextError> {
    let mut seen: HashMap<&str, &str> = HashMap::with_capacity(names.len());
    for (name, action_type) in names.iter().zip(types) {
        match seen.get(action_type.as_str()) {
            Some(first) if *first != name.as_str() => {
                return Err(ContextError::ActionTypeCollision {
                    action_type: action_type.clone(),
                    first: first.to_string(),
                    second: name.clone(),
                });
            }
            Some(_) => {}
            None => {
                seen.insert(action_type, name);
            }
        }
    }
    Ok(())
}

// =============================================================================
// Context
// =============================================================================

/// A finished context: the merged lookups plus the application fragment.
///
/// Dereferences to [`LibContext`] for every lookup.
pub struct Context<A> {
    lib: LibContext,
    app: A,
    initial_state_factory: Option<InitialStateFactory<A>>,
}

impl<A> Context<A> {
    pub fn lib_context(&self) -> &LibContext {
        &self.lib
    }

    /// The fragment returned by the library's application-context factory.
    pub fn app_context(&self) -> &A {
        &self.app
    }

    /// Runs the library's initial-state factory.
    ///
    /// Nothing is cached: each call invokes the factory again and may observe
    /// a different result if the fragment has interior mutability. Read it
    /// once and keep it if a stable value is needed.
    pub fn compute_initial_state(&self) -> Result<Value, ContextError> {
        let factory = self
            .initial_state_factory
            .as_ref()
            .ok_or(ContextError::HandlerMissing {
                handler: INITIAL_STATE_FACTORY,
            })?;
        Ok(factory(&self.lib, &self.app)?)
    }

    pub fn into_parts(self) -> (LibContext, A) {
        (self.lib, self.app)
    }
}

impl<A> Deref for Context<A> {
    type Target = LibContext;

    fn deref(&self) -> &LibContext {
        &self.lib
    }
}

impl<A: fmt::Debug> fmt::Debug for Context<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("lib", &self.lib)
            .field("app", &self.app)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Holds a validated library definition and builds contexts from it.
pub struct ContextBuilder<A> {
    library: Arc<LibraryDefinition<A>>,
    options: BuildOptions,
}

impl<A> Clone for ContextBuilder<A> {
    fn clone(&self) -> Self {
        Self {
            library: Arc::clone(&self.library),
            options: self.options,
        }
    }
}

impl<A> fmt::Debug for ContextBuilder<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextBuilder")
            .field("library", &self.library)
            .field("options", &self.options)
            .finish()
    }
}

impl<A> ContextBuilder<A> {
    /// Validates and normalizes the library definition.
    pub fn new(raw: LibraryDefinitionRaw<A>, options: BuildOptions) -> Result<Self, ContextError> {
        if !options.validate {
            warn!(lib = %raw.name, "building contexts with validation disabled");
        }
        let library = LibraryDefinition::normalize(raw, options.validate)?;
        Ok(Self {
            library: Arc::new(library),
            options,
        })
    }

    pub fn library(&self) -> &LibraryDefinition<A> {
        &self.library
    }

    pub fn options(&self) -> BuildOptions {
        self.options
    }

    /// Builds a fresh context for one application definition.
    pub fn build(&self, raw: ApplicationDefinitionRaw) -> Result<Context<A>, ContextError> {
        let validate = self.options.validate;
        let library = &*self.library;

        if validate {
            library.validate_against(&raw)?;
        }

        let app = ApplicationDefinition::normalize(raw.clone(), validate)?;
        debug!(
            lib = library.name(),
            app = app.name(),
            lib_actions = library.actions().len(),
            app_actions = app.actions().len(),
            "building context"
        );

        let lib = LibContext::assemble(library, app, raw, &self.options)?;

        let factory = library
            .app_context_factory
            .as_ref()
            .ok_or(ContextError::HandlerMissing {
                handler: APP_CONTEXT_FACTORY,
            })?;
        let app_context = factory(&lib, lib.app_definition())?;

        if validate {
            validate_app_context(&app_context)?;
            if let Some(validator) = &library.context_validator {
                validator(&lib, &app_context)?;
            }
        }

        debug!(
            lib = lib.lib_name(),
            app = lib.app_name(),
            actions = lib.action_names().len(),
            "context built"
        );

        Ok(Context {
            lib,
            app: app_context,
            initial_state_factory: library.initial_state_factory.clone(),
        })
    }
}

/// Checks the application-context fragment before the library's validator
/// sees it. Every fragment is currently accepted.
fn validate_app_context<A>(_app_context: &A) -> Result<(), ContextError> {
    Ok(())
}
