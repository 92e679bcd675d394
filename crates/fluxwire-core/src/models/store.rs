//! Store declares the listeners that react to action creator events
use crate::dispatcher::Payload;
use crate::event_key::listener_name;
use crate::exceptions::Result;
use std::fmt;
use std::rc::Rc;

pub type StoreListener = Rc<dyn Fn(&Payload) -> Result<()>>;

/// A consumer of events. Listeners come in three shapes:
/// - generic (`onCreate`): fires for `create` on every action creator type
/// - typed (`onWidgetCreate`): fires for `create` on `Widget` only
/// - error (`onError`): fires for every record on the `ERROR` channel
#[derive(Clone)]
pub struct Store {
    name: String,
    generic: Vec<(String, StoreListener)>,
    typed: Vec<((String, String), StoreListener)>,
    on_error: Option<StoreListener>,
}

impl Store {
    /// `name` is the store's type name, used to derive its done events
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generic: Vec::new(),
            typed: Vec::new(),
            on_error: None,
        }
    }

    /// Listen to `method` from any action creator
    pub fn on<F>(mut self, method: impl Into<String>, listener: F) -> Self
    where
        F: Fn(&Payload) -> Result<()> + 'static,
    {
        let method = method.into();
        let listener: StoreListener = Rc::new(listener);
        match self.generic.iter_mut().find(|(m, _)| *m == method) {
            Some(slot) => slot.1 = listener,
            None => self.generic.push((method, listener)),
        }
        self
    }

    /// Listen to `method` from action creators of `type_name` only
    pub fn on_type<F>(
        mut self,
        type_name: impl Into<String>,
        method: impl Into<String>,
        listener: F,
    ) -> Self
    where
        F: Fn(&Payload) -> Result<()> + 'static,
    {
        let key = (type_name.into(), method.into());
        let listener: StoreListener = Rc::new(listener);
        match self.typed.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = listener,
            None => self.typed.push((key, listener)),
        }
        self
    }

    pub fn on_error<F>(mut self, listener: F) -> Self
    where
        F: Fn(&Payload) -> Result<()> + 'static,
    {
        self.on_error = Some(Rc::new(listener));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generic_listener(&self, method: &str) -> Option<&StoreListener> {
        self.generic
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, l)| l)
    }

    pub fn typed_listener(&self, type_name: &str, method: &str) -> Option<&StoreListener> {
        self.typed
            .iter()
            .find(|((t, m), _)| t == type_name && m == method)
            .map(|(_, l)| l)
    }

    pub fn error_listener(&self) -> Option<&StoreListener> {
        self.on_error.as_ref()
    }

    /// Every listener name this store declares (`onError`, `onCreate`,
    /// `onWidgetCreate`, ...)
    pub fn listener_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if self.on_error.is_some() {
            names.push(listener_name(None, "error"));
        }
        names.extend(self.generic.iter().map(|(m, _)| listener_name(None, m)));
        names.extend(
            self.typed
                .iter()
                .map(|((t, m), _)| listener_name(Some(t.as_str()), m)),
        );
        names
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name)
            .field("listeners", &self.listener_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_lookup() {
        let store = Store::new("WidgetStore")
            .on("create", |_| Ok(()))
            .on_type("Widget", "remove", |_| Ok(()));

        assert!(store.generic_listener("create").is_some());
        assert!(store.generic_listener("remove").is_none());
        assert!(store.typed_listener("Widget", "remove").is_some());
        assert!(store.typed_listener("Gadget", "remove").is_none());
        assert!(store.error_listener().is_none());
    }

    #[test]
    fn test_listener_names() {
        let store = Store::new("WidgetStore")
            .on("create", |_| Ok(()))
            .on_type("Widget", "remove", |_| Ok(()))
            .on_error(|_| Ok(()));
        assert_eq!(
            store.listener_names(),
            vec!["onError", "onCreate", "onWidgetRemove"]
        );
    }
}
