//! Queued, re-entrancy safe action dispatch with store wiring.
//!
//! - [`Dispatcher`] owns the action registry, subscribers and queue.
//! - [`Wiring`] connects [`ActionCreator`] methods to [`Store`] listeners
//!   through generated event keys and "done" events.
//! - [`StoreBinding`] subscribes a refresh callback to store done events.
//!
//! ```
//! use fluxwire_core::{ActionCreator, Dispatcher, Store, Wiring};
//! use serde_json::{Value, json};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let todos = Rc::new(RefCell::new(Vec::<Value>::new()));
//!
//! let creator = ActionCreator::new("Todo").method("add", |ctx, args| {
//!     ctx.dispatch(args.first().cloned())?;
//!     Ok(Value::Null)
//! });
//! let store = {
//!     let todos = todos.clone();
//!     Store::new("TodoStore").on("add", move |payload| {
//!         todos.borrow_mut().push(payload.clone());
//!         Ok(())
//!     })
//! };
//!
//! let dispatcher = Dispatcher::new();
//! let wiring = Wiring::build(&dispatcher, vec![creator], [("todos", store)]).unwrap();
//! wiring.call("add", &[json!("write docs")]).unwrap();
//!
//! assert_eq!(*todos.borrow(), vec![json!("write docs")]);
//! assert!(dispatcher.has_action("TODOSTORE_ADD_DONE"));
//! ```
mod binding;
pub mod config;
mod dispatcher;
pub mod event_key;
mod exceptions;
mod macros;
pub mod models;
mod wiring;

pub use binding::StoreBinding;
pub use config::{DispatchMode, DispatcherConfig};
pub use dispatcher::{Dispatcher, Listener, Payload, QueueEntry, WeakDispatcher};
pub use event_key::{ERROR_ACTION, done_key, event_key};
pub use exceptions::{DispatchError, Result};
pub use models::{ActionCreator, ErrorRecord, Method, Store, StoreListener};
pub use wiring::{ActionCaller, ActionCallers, Bridge, CallContext, WIRING_NAME, Wiring};
