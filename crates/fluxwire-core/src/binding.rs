//! StoreBinding ties a refresh callback to store done events.
//!
//! This is the contract a view layer follows: queue the stores and listeners
//! to watch, `attach` when the view mounts, `detach` when it goes away. The
//! refresh callback is expected to pull fresh state from the stores.
use crate::dispatcher::{Dispatcher, Listener, Payload};
use crate::event_key::{done_key, is_listener_name};
use crate::exceptions::Result;
use crate::models::Store;
use log::debug;
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Watch {
    store: String,
    listener: String,
}

pub struct StoreBinding {
    refresh: Listener,
    watches: Vec<Watch>,
    /// done key -> subscriber id, populated by `attach`
    subscriptions: BTreeMap<String, String>,
    dispatcher: Option<Dispatcher>,
}

impl StoreBinding {
    pub fn new<F>(refresh: F) -> Self
    where
        F: Fn(&Payload) -> Result<()> + 'static,
    {
        Self {
            refresh: Rc::new(refresh),
            watches: Vec::new(),
            subscriptions: BTreeMap::new(),
            dispatcher: None,
        }
    }

    /// Watch every listener `store` declares
    pub fn watch_store(&mut self, store: &Store) -> &mut Self {
        for listener in store.listener_names() {
            self.watch_listener(store.name(), &listener);
        }
        self
    }

    /// Watch a single listener such as `onCreate` or `onWidgetCreate`.
    /// Names that don't start with `on` are not listeners and are ignored.
    pub fn watch_listener(&mut self, store: &str, listener: &str) -> &mut Self {
        if !is_listener_name(listener) {
            debug!("Ignoring {}.{}: not a listener name", store, listener);
            return self;
        }
        let watch = Watch {
            store: store.to_string(),
            listener: listener.to_string(),
        };
        if !self.watches.contains(&watch) {
            self.watches.push(watch);
        }
        self
    }

    /// Done keys this binding would subscribe to, in watch order
    pub fn done_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for w in &self.watches {
            let key = done_key(None, &w.listener, &w.store);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    /// Subscribe the refresh callback to every watched done key, once per
    /// key. Fails with `UnknownAction` if a done key was never wired; keys
    /// subscribed before the failure stay subscribed until `detach`.
    pub fn attach(&mut self, dispatcher: &Dispatcher) -> Result<()> {
        self.dispatcher = Some(dispatcher.clone());
        for key in self.done_keys() {
            if self.subscriptions.contains_key(&key) {
                continue;
            }
            let id = dispatcher.subscribe_shared(&key, self.refresh.clone(), None)?;
            self.subscriptions.insert(key, id);
        }
        debug!("Binding attached to {} done event(s)", self.subscriptions.len());
        Ok(())
    }

    /// Drop every subscription made by `attach`. Safe to call when not
    /// attached.
    pub fn detach(&mut self) -> Result<()> {
        let Some(dispatcher) = self.dispatcher.take() else {
            return Ok(());
        };
        while let Some((key, id)) = self.subscriptions.pop_first() {
            if dispatcher.has_action(&key) {
                dispatcher.unsubscribe(&key, &id)?;
            }
        }
        debug!("Binding detached");
        Ok(())
    }

    pub fn is_attached(&self) -> bool {
        self.dispatcher.is_some()
    }

    /// Done key -> subscriber id for the live subscriptions
    pub fn subscriptions(&self) -> &BTreeMap<String, String> {
        &self.subscriptions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counting_binding() -> (StoreBinding, Rc<Cell<usize>>) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let binding = StoreBinding::new(move |_| {
            c.set(c.get() + 1);
            Ok(())
        });
        (binding, count)
    }

    #[test]
    fn test_done_keys_for_store() {
        let store = Store::new("TodoStore")
            .on("add", |_| Ok(()))
            .on_type("Todo", "remove", |_| Ok(()))
            .on_error(|_| Ok(()));
        let (mut binding, _) = counting_binding();
        binding.watch_store(&store);
        assert_eq!(
            binding.done_keys(),
            vec!["TODOSTORE_ERROR_DONE", "TODOSTORE_ADD_DONE", "TODOSTORE_TODOREMOVE_DONE"]
        );
    }

    #[test]
    fn test_non_listener_names_are_ignored() {
        let (mut binding, _) = counting_binding();
        binding
            .watch_listener("TodoStore", "getState")
            .watch_listener("TodoStore", "onAdd")
            .watch_listener("TodoStore", "onAdd");
        assert_eq!(binding.done_keys(), vec!["TODOSTORE_ADD_DONE"]);
    }

    #[test]
    fn test_attach_and_detach() {
        let d = Dispatcher::new();
        d.add_action("TODOSTORE_ADD_DONE");
        let (mut binding, count) = counting_binding();
        binding.watch_listener("TodoStore", "onAdd");

        binding.attach(&d).unwrap();
        assert!(binding.is_attached());
        d.enqueue("TODOSTORE_ADD_DONE", None).unwrap();
        assert_eq!(count.get(), 1);

        // attaching again does not double subscribe
        binding.attach(&d).unwrap();
        assert_eq!(d.subscriber_count("TODOSTORE_ADD_DONE"), Some(1));

        binding.detach().unwrap();
        assert!(!binding.is_attached());
        assert!(binding.subscriptions().is_empty());
        d.enqueue("TODOSTORE_ADD_DONE", None).unwrap();
        assert_eq!(count.get(), 1);

        binding.detach().unwrap();
    }

    #[test]
    fn test_attach_to_unwired_store_fails() {
        let d = Dispatcher::new();
        let (mut binding, _) = counting_binding();
        binding.watch_listener("Nowhere", "onAdd");
        assert!(binding.attach(&d).unwrap_err().is_unknown_action());
    }
}
