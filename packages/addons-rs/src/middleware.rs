//! Dispatch-side middleware and the configure bundle.
//!
//! [`configure`] builds one context and hands it to both consumers, the
//! [`Reducer`] and a [`Middleware`] produced by the caller's factory. The
//! resulting [`Addons`] can run an action through the middleware and fold
//! whatever it forwards into state.
//!
//! ```ignore
//! let addons = configure(&builder, app, |ctx| IdleMiddleware::new(ctx))?;
//! let state = addons.initial_state()?;
//! let state = addons.dispatch(state, action)?;
//! ```

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::action::Action;
use crate::context::{Context, ContextBuilder};
use crate::definition::ApplicationDefinitionRaw;
use crate::error::ContextError;
use crate::reducer::Reducer;

/// Intercepts actions on their way to the reducer.
///
/// `next` forwards an action; calling it zero times drops the action and
/// calling it several times re-dispatches.
pub trait Middleware: Send + Sync {
    fn handle(&self, action: Action, next: &dyn Fn(Action));
}

/// Forwards every action unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl Middleware for PassThrough {
    fn handle(&self, action: Action, next: &dyn Fn(Action)) {
        next(action);
    }
}

/// Context, reducer and middleware sharing one build.
pub struct Addons<A> {
    pub context: Arc<Context<A>>,
    pub reducer: Reducer,
    pub middleware: Box<dyn Middleware>,
}

impl<A> Addons<A> {
    /// Computes a fresh initial state from the context.
    pub fn initial_state(&self) -> Result<Arc<Value>, ContextError> {
        Ok(Arc::new(self.context.compute_initial_state()?))
    }

    /// Runs `action` through the middleware and reduces every forwarded
    /// action, in order, starting from `state`.
    pub fn dispatch(&self, state: Arc<Value>, action: Action) -> Result<Arc<Value>, ContextError> {
        let forwarded = RefCell::new(Vec::new());
        self.middleware
            .handle(action, &|next| forwarded.borrow_mut().push(next));

        forwarded
            .into_inner()
            .iter()
            .try_fold(state, |state, action| self.reducer.reduce(Some(state), action))
    }
}

impl<A: fmt::Debug> fmt::Debug for Addons<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Addons")
            .field("context", &self.context)
            .field("reducer", &self.reducer)
            .finish_non_exhaustive()
    }
}

/// Builds a context for `app` and wires the reducer and middleware to it.
pub fn configure<A, M, F>(
    builder: &ContextBuilder<A>,
    app: ApplicationDefinitionRaw,
    middleware: F,
) -> Result<Addons<A>, ContextError>
where
    A: Send + Sync + 'static,
    M: Middleware + 'static,
    F: FnOnce(Arc<Context<A>>) -> M,
{
    let context = Arc::new(builder.build(app)?);
    let reducer = Reducer::new(Arc::clone(&context));
    let middleware = Box::new(middleware(Arc::clone(&context)));

    debug!(
        lib = context.lib_name(),
        app = context.app_name(),
        "addons configured"
    );

    Ok(Addons {
        context,
        reducer,
        middleware,
    })
}
