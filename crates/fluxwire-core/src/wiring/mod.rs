//! Wiring connects action creators to stores through a [`Dispatcher`].
//!
//! For every method an action creator declares, one action is registered
//! per `(type, method)` pair and a single [`ActionCaller`] is exposed per
//! method name. For every store listener a bridge is subscribed to the
//! matching event key: it runs the listener, then enqueues the store's done
//! event with the same payload so refresh subscribers can follow.
//!
//! Generic (`onCreate`) and typed (`onWidgetCreate`) listeners on the same
//! event key both get a bridge and both fire; they finish into different
//! done events.
mod callers;
mod context;

pub use callers::{ActionCaller, ActionCallers};
pub use context::CallContext;

use crate::dispatcher::{Dispatcher, Listener, Payload, WeakDispatcher};
use crate::event_key::{ERROR_ACTION, done_key, listener_name};
use crate::exceptions::Result;
use crate::models::error_record::MANUAL_ERROR_EVENT;
use crate::models::{ActionCreator, ErrorRecord, Store, StoreListener};
use callers::Registry;
use log::{debug, info};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Name reported as the action creator for errors raised through
/// [`Wiring::error`]
pub const WIRING_NAME: &str = "Fluxwire";

/// A dispatcher subscription connecting one event key to one store listener
#[derive(Clone)]
pub struct Bridge {
    id: String,
    store: String,
    listener: String,
    done_key: String,
    callback: Listener,
}

impl Bridge {
    /// Subscriber id on the dispatcher
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn store(&self) -> &str {
        &self.store
    }

    /// Listener name, e.g. `onCreate` or `onWidgetCreate`
    pub fn listener(&self) -> &str {
        &self.listener
    }

    /// Done event enqueued after the listener returns
    pub fn done_key(&self) -> &str {
        &self.done_key
    }

    pub fn callback(&self) -> &Listener {
        &self.callback
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("id", &self.id)
            .field("store", &self.store)
            .field("listener", &self.listener)
            .field("done_key", &self.done_key)
            .finish()
    }
}

/// Result of wiring action creators and stores onto a dispatcher
pub struct Wiring {
    dispatcher: Dispatcher,
    actions: ActionCallers,
    /// event key -> bridges subscribed to it, in subscription order
    subscribers: BTreeMap<String, Vec<Bridge>>,
}

impl Wiring {
    /// Register every action creator method and subscribe every matching
    /// store listener on `dispatcher`.
    ///
    /// Actions already known to the dispatcher keep their subscribers, so
    /// several wirings can share one dispatcher.
    pub fn build<I, K>(
        dispatcher: &Dispatcher,
        action_creators: Vec<ActionCreator>,
        stores: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Store)>,
        K: Into<String>,
    {
        let mut registry = Registry::new(dispatcher.downgrade());
        let mut subscribers: BTreeMap<String, Vec<Bridge>> = BTreeMap::new();
        subscribers.insert(ERROR_ACTION.to_string(), Vec::new());

        for creator in &action_creators {
            for (name, method) in creator.methods() {
                let key = registry.add_method(name, creator.type_name(), method.clone());
                dispatcher.ensure_action(&key);
                subscribers.entry(key).or_default();
            }
        }

        let mut wiring = Self {
            dispatcher: dispatcher.clone(),
            actions: ActionCallers::new(Rc::new(registry)),
            subscribers,
        };

        for (label, store) in stores {
            let label = label.into();
            debug!("Wiring store {} ({})", label, store.name());
            wiring.connect_store(&store)?;
        }

        info!(
            "Wired {} action method(s) and {} bridge(s)",
            wiring.actions.len(),
            wiring.bridge_count()
        );
        Ok(wiring)
    }

    fn connect_store(&mut self, store: &Store) -> Result<()> {
        if let Some(listener) = store.error_listener() {
            let done = done_key(None, "onError", store.name());
            self.bridge(ERROR_ACTION, store, listener_name(None, "error"), done, listener)?;
        }

        let callers = self.actions.clone();
        for (method, variants) in callers.registry().methods() {
            if let Some(listener) = store.generic_listener(method) {
                for variant in variants {
                    let done = done_key(None, method, store.name());
                    let name = listener_name(None, method);
                    self.bridge(&variant.event_key, store, name, done, listener)?;
                }
            }

            for variant in variants {
                let type_name = variant.type_name.as_str();
                if let Some(listener) = store.typed_listener(type_name, method) {
                    let done = done_key(Some(type_name), method, store.name());
                    let name = listener_name(Some(type_name), method);
                    self.bridge(&variant.event_key, store, name, done, listener)?;
                }
            }
        }
        Ok(())
    }

    fn bridge(
        &mut self,
        event_key: &str,
        store: &Store,
        listener_name: String,
        done_key: String,
        listener: &StoreListener,
    ) -> Result<()> {
        self.dispatcher.ensure_action(&done_key);

        let callback = bridge_callback(self.dispatcher.downgrade(), listener.clone(), &done_key);
        let id = self
            .dispatcher
            .subscribe_shared(event_key, callback.clone(), None)?;
        debug!(
            "Bridged {} -> {}.{} (done: {})",
            event_key,
            store.name(),
            listener_name,
            done_key
        );

        self.subscribers
            .entry(event_key.to_string())
            .or_default()
            .push(Bridge {
                id,
                store: store.name().to_string(),
                listener: listener_name,
                done_key,
                callback,
            });
        Ok(())
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The action callers, one per discovered method name
    pub fn actions(&self) -> &ActionCallers {
        &self.actions
    }

    /// Shorthand for `actions().call(name, args)`
    pub fn call(&self, name: &str, args: &[Payload]) -> Result<Vec<Payload>> {
        self.actions.call(name, args)
    }

    /// Event key -> bridges installed on it. Every registered event key is
    /// present, with an empty list when no store listens to it.
    pub fn subscribers(&self) -> &BTreeMap<String, Vec<Bridge>> {
        &self.subscribers
    }

    pub fn bridges(&self, event_key: &str) -> &[Bridge] {
        self.subscribers
            .get(event_key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn bridge_count(&self) -> usize {
        self.subscribers.values().map(Vec::len).sum()
    }

    /// Report an error that did not come from an action call
    pub fn error(
        &self,
        message: &str,
        data: Option<Payload>,
        source: Option<Payload>,
    ) -> Result<()> {
        let record = ErrorRecord::new(MANUAL_ERROR_EVENT, WIRING_NAME, ERROR_ACTION)
            .with_message(Some(message))
            .with_data(data)
            .with_source(source);
        self.dispatcher.enqueue(ERROR_ACTION, record.to_payload()?)
    }

    /// Unsubscribe every bridge. Registered actions stay in place, so the
    /// action callers keep working; they just no longer reach the stores.
    pub fn disconnect(&mut self) -> Result<()> {
        for (event_key, bridges) in self.subscribers.iter_mut() {
            if !self.dispatcher.has_action(event_key) {
                bridges.clear();
                continue;
            }
            for bridge in bridges.drain(..) {
                self.dispatcher.unsubscribe(event_key, &bridge.id)?;
            }
        }
        debug!("Disconnected all bridges");
        Ok(())
    }
}

impl fmt::Debug for Wiring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wiring")
            .field("actions", &self.actions)
            .field("subscribers", &self.subscribers)
            .finish()
    }
}

fn bridge_callback(
    dispatcher: WeakDispatcher,
    listener: StoreListener,
    done_key: &str,
) -> Listener {
    let done_key = done_key.to_string();
    Rc::new(move |payload: &Payload| -> Result<()> {
        listener(payload)?;
        match dispatcher.upgrade() {
            Some(d) => d.enqueue(&done_key, payload.clone()),
            None => Ok(()),
        }
    })
}
