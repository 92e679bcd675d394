//! CallContext: what a producer method sees while it runs
use crate::dispatcher::{Dispatcher, Payload};
use crate::event_key::ERROR_ACTION;
use crate::exceptions::Result;
use crate::models::ErrorRecord;
use crate::wiring::ActionCallers;
use log::warn;

/// Handed to every producer method invocation. `dispatch` is pre-bound to
/// the method's own event key, `error` reports onto the `ERROR` channel.
pub struct CallContext {
    dispatcher: Dispatcher,
    type_name: String,
    method: String,
    event_key: String,
    actions: ActionCallers,
}

impl CallContext {
    pub(crate) fn new(
        dispatcher: Dispatcher,
        type_name: &str,
        method: &str,
        event_key: &str,
        actions: ActionCallers,
    ) -> Self {
        Self {
            dispatcher,
            type_name: type_name.to_string(),
            method: method.to_string(),
            event_key: event_key.to_string(),
            actions,
        }
    }

    /// Enqueue this call's `(type, method)` event
    pub fn dispatch(&self, payload: impl Into<Option<Payload>>) -> Result<()> {
        self.dispatcher.enqueue(&self.event_key, payload)
    }

    /// Enqueue an [`ErrorRecord`] for this call on the `ERROR` channel.
    ///
    /// A missing `message` is tolerated (the record carries a placeholder)
    /// but logged, since it usually means the producer forgot one.
    pub fn error(
        &self,
        source: Option<Payload>,
        message: Option<&str>,
        data: Option<Payload>,
    ) -> Result<()> {
        if message.is_none() {
            warn!(
                "{}.{} reported an error without a message",
                self.type_name, self.method
            );
        }
        let record = ErrorRecord::new(&self.event_key, &self.type_name, &self.method)
            .with_source(source)
            .with_message(message)
            .with_data(data);
        self.dispatcher.enqueue(ERROR_ACTION, record.to_payload()?)
    }

    /// Every action caller known to the wiring, for methods that trigger
    /// other methods. Read-only.
    pub fn actions(&self) -> &ActionCallers {
        &self.actions
    }

    pub fn event_key(&self) -> &str {
        &self.event_key
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}
