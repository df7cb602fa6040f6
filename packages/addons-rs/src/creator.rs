//! Helpers for authoring dispatchable units of work.
//!
//! A thunk is a function of the store's `dispatch` and `get_state` handles.
//! These helpers pre-wire a thunk with a finished context (and optionally a
//! dispatcher handle) so handlers only deal with what they need.
//!
//! ```ignore
//! use addons::creator::{with_context, with_dispatcher};
//!
//! // Defined before any context exists, bound to one later.
//! let mark_active = with_context(|dispatch, _get_state, ctx: &Context<IdleConfig>| {
//!     if let Some(action) = ctx.create_action("activity", json!({ "idle": false })) {
//!         dispatch(action);
//!     }
//! });
//! let thunk = mark_active(Arc::clone(&context));
//! thunk(dispatch, get_state);
//!
//! // Handler receives whatever the dispatcher builds from dispatch/get_state.
//! let thunk = with_dispatcher(context, IdleDispatcher::new, |dispatcher, ctx| {
//!     dispatcher.execute("activity", ctx)
//! });
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::action::Action;

/// Sends an action to the store.
pub type Dispatch = Arc<dyn Fn(Action) + Send + Sync>;

/// Reads the store's current state.
pub type GetState = Arc<dyn Fn() -> Arc<Value> + Send + Sync>;

/// A unit of work run against a store.
pub type Thunk<R> = Box<dyn Fn(Dispatch, GetState) -> R + Send + Sync>;

/// Wraps `handler` so it can be bound to a context later.
///
/// The returned function takes the context and yields a thunk that calls
/// `handler(dispatch, get_state, &context)`.
pub fn with_context<C, R, H>(handler: H) -> impl Fn(Arc<C>) -> Thunk<R>
where
    C: Send + Sync + 'static,
    R: 'static,
    H: Fn(Dispatch, GetState, &C) -> R + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    move |context: Arc<C>| -> Thunk<R> {
        let handler = Arc::clone(&handler);
        Box::new(move |dispatch: Dispatch, get_state: GetState| {
            handler(dispatch, get_state, &*context)
        })
    }
}

/// Builds a thunk that first turns `dispatch`/`get_state` into a dispatcher
/// handle, then calls `handler(dispatcher, &context)`.
pub fn with_dispatcher<C, K, R, F, H>(context: Arc<C>, dispatcher: F, handler: H) -> Thunk<R>
where
    C: Send + Sync + 'static,
    R: 'static,
    F: Fn(Dispatch, GetState) -> K + Send + Sync + 'static,
    H: Fn(K, &C) -> R + Send + Sync + 'static,
{
    Box::new(move |dispatch: Dispatch, get_state: GetState| {
        let handle = dispatcher(dispatch, get_state);
        handler(handle, &*context)
    })
}
