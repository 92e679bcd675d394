//! Action callers: the entry points that invoke every producer variant of
//! a method name.
use crate::dispatcher::{Payload, WeakDispatcher};
use crate::event_key::event_key;
use crate::exceptions::{DispatchError, Result};
use crate::models::Method;
use crate::wiring::CallContext;
use log::debug;
use std::fmt;
use std::rc::Rc;

/// One action creator's implementation of a method name
pub(crate) struct Variant {
    pub(crate) type_name: String,
    pub(crate) event_key: String,
    method: Method,
}

/// Method name -> producer variants, both in discovery order. Built once
/// during wiring and immutable afterwards.
pub(crate) struct Registry {
    dispatcher: WeakDispatcher,
    methods: Vec<(String, Vec<Variant>)>,
}

impl Registry {
    pub(crate) fn new(dispatcher: WeakDispatcher) -> Self {
        Self {
            dispatcher,
            methods: Vec::new(),
        }
    }

    /// Record `type_name`'s implementation of `name` and return its event
    /// key. A second variant for the same type replaces the first.
    pub(crate) fn add_method(&mut self, name: &str, type_name: &str, method: Method) -> String {
        let key = event_key(type_name, name);
        let variant = Variant {
            type_name: type_name.to_string(),
            event_key: key.clone(),
            method,
        };

        let variants = match self.methods.iter().position(|(m, _)| m == name) {
            Some(i) => &mut self.methods[i].1,
            None => {
                debug!("Discovered action method {}", name);
                self.methods.push((name.to_string(), Vec::new()));
                let last = self.methods.len() - 1;
                &mut self.methods[last].1
            }
        };
        match variants.iter_mut().find(|v| v.type_name == type_name) {
            Some(existing) => *existing = variant,
            None => variants.push(variant),
        }
        key
    }

    pub(crate) fn variants(&self, name: &str) -> &[Variant] {
        self.methods
            .iter()
            .find(|(m, _)| m == name)
            .map(|(_, v)| v.as_slice())
            .unwrap_or_default()
    }

    pub(crate) fn methods(&self) -> impl Iterator<Item = (&str, &[Variant])> {
        self.methods.iter().map(|(m, v)| (m.as_str(), v.as_slice()))
    }
}

/// Read-only table of every action caller produced by a wiring. Cloning
/// is cheap and every clone sees the same callers; nothing can be added or
/// removed after wiring.
#[derive(Clone)]
pub struct ActionCallers {
    registry: Rc<Registry>,
}

impl ActionCallers {
    pub(crate) fn new(registry: Rc<Registry>) -> Self {
        Self { registry }
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn get(&self, name: &str) -> Option<ActionCaller> {
        self.contains(name).then(|| ActionCaller {
            registry: self.registry.clone(),
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.methods().any(|(m, _)| m == name)
    }

    /// Invoke `name` on every action creator that declares it. Unknown
    /// names yield an empty list.
    pub fn call(&self, name: &str, args: &[Payload]) -> Result<Vec<Payload>> {
        call_variants(&self.registry, name, args)
    }

    pub fn names(&self) -> Vec<&str> {
        self.registry.methods().map(|(m, _)| m).collect()
    }

    pub fn len(&self) -> usize {
        self.registry.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.methods.is_empty()
    }
}

impl fmt::Debug for ActionCallers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Callable entry point for one method name
#[derive(Clone)]
pub struct ActionCaller {
    registry: Rc<Registry>,
    name: String,
}

impl ActionCaller {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Action creator types currently implementing this method
    pub fn types(&self) -> Vec<&str> {
        self.registry
            .variants(&self.name)
            .iter()
            .map(|v| v.type_name.as_str())
            .collect()
    }

    /// Call every variant with a fresh [`CallContext`], collecting the
    /// return values in variant order
    pub fn call(&self, args: &[Payload]) -> Result<Vec<Payload>> {
        call_variants(&self.registry, &self.name, args)
    }
}

impl fmt::Debug for ActionCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCaller")
            .field("name", &self.name)
            .field("types", &self.types())
            .finish()
    }
}

fn call_variants(registry: &Rc<Registry>, name: &str, args: &[Payload]) -> Result<Vec<Payload>> {
    let variants = registry.variants(name);
    if variants.is_empty() {
        return Ok(Vec::new());
    }
    let dispatcher = registry.dispatcher.upgrade().ok_or(DispatchError::Closed)?;

    let mut returns = Vec::with_capacity(variants.len());
    for variant in variants {
        debug!("Calling {}.{}", variant.type_name, name);
        let ctx = CallContext::new(
            dispatcher.clone(),
            &variant.type_name,
            name,
            &variant.event_key,
            ActionCallers::new(registry.clone()),
        );
        returns.push((variant.method)(&ctx, args)?);
    }
    Ok(returns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use serde_json::{Value, json};

    fn constant(value: Value) -> Method {
        Rc::new(move |_: &CallContext, _: &[Payload]| -> Result<Payload> { Ok(value.clone()) })
    }

    #[test]
    fn test_registry_groups_variants_by_method() {
        let d = Dispatcher::new();
        let mut registry = Registry::new(d.downgrade());
        assert_eq!(registry.add_method("create", "Widget", constant(json!(1))), "WIDGET_CREATE");
        assert_eq!(registry.add_method("create", "Gadget", constant(json!(2))), "GADGET_CREATE");
        registry.add_method("remove", "Widget", constant(json!(3)));

        let names: Vec<&str> = registry.methods().map(|(m, _)| m).collect();
        assert_eq!(names, vec!["create", "remove"]);
        let types: Vec<&str> = registry
            .variants("create")
            .iter()
            .map(|v| v.type_name.as_str())
            .collect();
        assert_eq!(types, vec!["Widget", "Gadget"]);
        assert!(registry.variants("missing").is_empty());
    }

    #[test]
    fn test_same_type_replaces_variant() {
        let d = Dispatcher::new();
        let mut registry = Registry::new(d.downgrade());
        registry.add_method("create", "Widget", constant(json!("old")));
        registry.add_method("create", "Widget", constant(json!("new")));

        let callers = ActionCallers::new(Rc::new(registry));
        assert_eq!(callers.call("create", &[]).unwrap(), vec![json!("new")]);
        assert_eq!(callers.len(), 1);
    }

    #[test]
    fn test_unknown_name_returns_empty() {
        let d = Dispatcher::new();
        let callers = ActionCallers::new(Rc::new(Registry::new(d.downgrade())));
        assert!(callers.call("anything", &[json!(1)]).unwrap().is_empty());
        assert!(callers.get("anything").is_none());
    }
}
