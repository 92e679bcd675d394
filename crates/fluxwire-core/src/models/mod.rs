//! Declarative tables that describe what gets wired: action creators list
//! their methods, stores list their listeners.
pub mod action_creator;
pub mod error_record;
pub mod store;

pub use action_creator::{ActionCreator, Method};
pub use error_record::ErrorRecord;
pub use store::{Store, StoreListener};
