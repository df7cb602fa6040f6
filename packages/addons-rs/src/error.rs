//! Structured error type for context construction.
//!
//! `ContextError` replaces the assertion failures a loosely typed registry
//! would raise with pattern-matchable variants. Every variant falls into one
//! of three kinds:
//!
//! - **Shape**: a required field is missing, empty or has the wrong shape.
//! - **Uniqueness**: two registrations would share a name or a type.
//! - **Consumer**: an injected function (validator, factory) failed.
//!
//! Consumer errors are carried transparently: their `Display` and `source`
//! are those of the injected function's error.
//!
//! # Example
//!
//! ```ignore
//! use addons::{ContextBuilder, ContextError, ErrorKind};
//!
//! match builder.build(app) {
//!     Ok(context) => run(context),
//!     Err(ContextError::ActionNameCollision { name }) => {
//!         eprintln!("rename application action {name}");
//!     }
//!     Err(e) if e.kind() == ErrorKind::Consumer => return Err(e.into()),
//!     Err(e) => panic!("bad registry: {e}"),
//! }
//! ```

use std::fmt;

use thiserror::Error;

/// Which registry a shape error was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The reusable library registry.
    Library,
    /// The consuming application's registry.
    Application,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Library => write!(f, "library"),
            Origin::Application => write!(f, "application"),
        }
    }
}

/// Classification of a [`ContextError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A definition is missing a field or a field has the wrong shape.
    Shape,
    /// An action name or derived type would not be unique.
    Uniqueness,
    /// An injected validator or factory failed.
    Consumer,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Shape => write!(f, "shape_error"),
            ErrorKind::Uniqueness => write!(f, "uniqueness_error"),
            ErrorKind::Consumer => write!(f, "consumer_error"),
        }
    }
}

/// Errors raised while normalizing definitions or building a context.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The definition itself was absent (e.g. a JSON `null`).
    #[error("{origin} definition is required")]
    DefinitionMissing {
        /// Registry the definition belongs to.
        origin: Origin,
    },

    /// The definition has no name.
    #[error("{origin} name must be a string")]
    NameMissing {
        /// Registry the definition belongs to.
        origin: Origin,
    },

    /// The definition name is the empty string.
    #[error("{origin} name must not be empty")]
    NameEmpty {
        /// Registry the definition belongs to.
        origin: Origin,
    },

    /// The definition has no action list.
    #[error("{origin} actions must exist")]
    ActionsMissing {
        /// Registry the definition belongs to.
        origin: Origin,
    },

    /// The action list is not an array.
    #[error("{origin} actions must be an array")]
    ActionsNotArray {
        /// Registry the definition belongs to.
        origin: Origin,
    },

    /// An action entry is not a 2-element array.
    #[error("every item in {origin} actions must be an array of length 2 (item {index})")]
    ActionNotPair {
        /// Registry the definition belongs to.
        origin: Origin,
        /// Position of the offending entry.
        index: usize,
    },

    /// An action entry's first element is not a string.
    #[error("every item in {origin} actions must have a string action name (item {index})")]
    ActionNameNotString {
        /// Registry the definition belongs to.
        origin: Origin,
        /// Position of the offending entry.
        index: usize,
    },

    /// An action entry's name is the empty string.
    #[error("every item in {origin} actions must have a non-empty action name (item {index})")]
    ActionNameEmpty {
        /// Registry the definition belongs to.
        origin: Origin,
        /// Position of the offending entry.
        index: usize,
    },

    /// An action entry's metadata is not an object.
    #[error("action {name:?} in {origin} actions must have object metadata")]
    ActionMetadataNotObject {
        /// Registry the definition belongs to.
        origin: Origin,
        /// Name of the offending action.
        name: String,
    },

    /// One of the library's injected functions was not supplied.
    #[error("{handler} must exist")]
    HandlerMissing {
        /// Field name of the missing function.
        handler: &'static str,
    },

    /// A JSON definition could not be decoded.
    #[error("malformed {origin} definition: {source}")]
    Malformed {
        /// Registry the definition belongs to.
        origin: Origin,
        /// The decode failure.
        #[source]
        source: serde_json::Error,
    },

    /// An application action reuses a library action name.
    #[error("action names must be unique across library and application: {name:?}")]
    ActionNameCollision {
        /// The colliding name.
        name: String,
    },

    /// Two distinct action names derive the same type identifier.
    #[error("actions {first:?} and {second:?} both derive type {action_type}")]
    ActionTypeCollision {
        /// The derived identifier.
        action_type: String,
        /// Name that produced the identifier first.
        first: String,
        /// Name that produced it again.
        second: String,
    },

    /// An injected validator or factory failed.
    #[error(transparent)]
    Consumer(#[from] anyhow::Error),
}

impl ContextError {
    /// Returns the taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ContextError::ActionNameCollision { .. } | ContextError::ActionTypeCollision { .. } => {
                ErrorKind::Uniqueness
            }
            ContextError::Consumer(_) => ErrorKind::Consumer,
            _ => ErrorKind::Shape,
        }
    }

    /// Returns true for errors raised by injected consumer functions.
    pub fn is_consumer(&self) -> bool {
        self.kind() == ErrorKind::Consumer
    }
}
