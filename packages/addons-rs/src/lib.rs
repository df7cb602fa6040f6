//! # Addons
//!
//! Builds a single, collision-free action namespace from a reusable
//! **library** registry and a consuming **application** registry.
//!
//! ## Core Concepts
//!
//! - [`ActionEntry`] = a registered action: a name plus opaque metadata
//! - [`LibraryDefinitionRaw`] = the library's registry plus its injected
//!   factories and validator
//! - [`ApplicationDefinitionRaw`] = the application's registry
//! - [`Context`] = every merged lookup plus the application fragment
//!
//! Every action gets a derived **type identifier**:
//! `CLEAN(library)_CLEAN(application)_CLEAN(action)`, where
//! [`naming::clean`] uppercases and turns the first hyphen/whitespace run
//! into `_`. Type identifiers are what reducers and middleware match on.
//!
//! ## Architecture
//!
//! ```text
//! LibraryDefinitionRaw
//!     │
//!     ▼ ContextBuilder::new()      validate + normalize once
//! ContextBuilder ──────────────────────────────────────┐
//!     │                                                │ reused
//!     ▼ build(ApplicationDefinitionRaw)                │
//!     ├─► name collision check (library vs app)        │
//!     ├─► normalize application                        │
//!     ├─► merge: library first, application second     │
//!     ├─► derive type identifiers                      │
//!     ├─► app_context_factory(lib, app) ─► A           │
//!     └─► context_validator(lib, &A)                   │
//!                                                      │
//!     ▼                                                │
//! Context<A> ─► Reducer, Middleware (configure) ◄──────┘
//! ```
//!
//! ## Key Invariants
//!
//! 1. **No shared names** - an application may not reuse a library action name
//! 2. **Library first** - combined sequences list library actions before
//!    application actions, each in registration order
//! 3. **Identity** - every lookup returns the metadata object that was
//!    registered, not a copy
//! 4. **All or nothing** - a failed build returns an error and no context
//!
//! Validation can be switched off with [`BuildOptions::unvalidated`]; shape
//! and uniqueness checks are then skipped.
//!
//! ## Example
//!
//! ```ignore
//! use addons::{define_action, ApplicationDefinitionRaw, BuildOptions, ContextBuilder, LibraryDefinitionRaw};
//! use serde_json::json;
//!
//! let library = LibraryDefinitionRaw::new("Idle Monitor")
//!     .with_actions(vec![define_action("activity", json!({ "idle": false }))])
//!     .with_app_context_factory(|_, app| Ok(IdleConfig::for_app(app.name())))
//!     .with_context_validator(|_, config| config.check())
//!     .with_initial_state_factory(|_, config| Ok(json!({ "idle": false, "after": config.timeout })));
//!
//! let builder = ContextBuilder::new(library, BuildOptions::default())?;
//! let context = builder.build(
//!     ApplicationDefinitionRaw::new("dashboard")
//!         .with_actions(vec![define_action("refresh", json!({}))]),
//! )?;
//!
//! assert_eq!(context.action_type("activity"), Some("IDLE_MONITOR_DASHBOARD_ACTIVITY"));
//! ```

// Core modules
mod action;
mod config;
mod context;
mod definition;
mod error;
mod log;
mod middleware;
mod reducer;

// Name sanitizing and type derivation
pub mod naming;

// Thunk helpers
pub mod creator;

// Testing utilities (feature-gated)
#[cfg(any(test, feature = "testing"))]
pub mod testing;


// Re-export registry and action types
pub use action::{
    actions_from_json, actions_from_json_lenient, define_action, Action, ActionEntry, ActionMeta,
};

// Re-export definition types
pub use definition::{
    validate_entries, AppContextFactory, ApplicationDefinition, ApplicationDefinitionRaw,
    ContextValidator, InitialStateFactory, LibraryDefinition, LibraryDefinitionRaw,
};

// Re-export context types (primary entry point)
pub use context::{Context, ContextBuilder, LibContext};

// Re-export error types
pub use error::{ContextError, ErrorKind, Origin};

// Re-export logging types
pub use log::{LogLevel, Logger, LoggerOptions, ParseLogLevelError};

// Re-export configuration types
pub use config::{BuildOptions, Config};

// Re-export consumer types
pub use middleware::{configure, Addons, Middleware, PassThrough};
pub use reducer::Reducer;

// Re-export creator types
pub use creator::{with_context, with_dispatcher, Dispatch, GetState, Thunk};
