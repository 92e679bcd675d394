//! ActionCreator declares the methods that originate events
use crate::dispatcher::Payload;
use crate::exceptions::Result;
use crate::wiring::CallContext;
use std::fmt;
use std::rc::Rc;

/// A producer method. Receives the per-call context and the caller's
/// arguments; its return value is collected by the action caller.
pub type Method = Rc<dyn Fn(&CallContext, &[Payload]) -> Result<Payload>>;

/// Named table of producer methods. Every method becomes an event channel
/// keyed by `(type_name, method)`.
#[derive(Clone)]
pub struct ActionCreator {
    type_name: String,
    methods: Vec<(String, Method)>,
}

impl ActionCreator {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            methods: Vec::new(),
        }
    }

    /// Declare `name`. Declaring the same name twice replaces the first
    /// handler but keeps its position.
    pub fn method<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&CallContext, &[Payload]) -> Result<Payload> + 'static,
    {
        let name = name.into();
        let handler: Method = Rc::new(handler);
        match self.methods.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = handler,
            None => self.methods.push((name, handler)),
        }
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn methods(&self) -> impl Iterator<Item = (&str, &Method)> {
        self.methods.iter().map(|(name, m)| (name.as_str(), m))
    }

    pub fn method_names(&self) -> Vec<&str> {
        self.methods.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl fmt::Debug for ActionCreator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCreator")
            .field("type_name", &self.type_name)
            .field("methods", &self.method_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_methods_keep_declaration_order() {
        let creator = ActionCreator::new("Widget")
            .method("create", |_, _| Ok(Value::Null))
            .method("remove", |_, _| Ok(Value::Null));
        assert_eq!(creator.type_name(), "Widget");
        assert_eq!(creator.method_names(), vec!["create", "remove"]);
    }

    #[test]
    fn test_redeclared_method_keeps_position() {
        let creator = ActionCreator::new("Widget")
            .method("create", |_, _| Ok(Value::from(1)))
            .method("remove", |_, _| Ok(Value::Null))
            .method("create", |_, _| Ok(Value::from(2)));
        assert_eq!(creator.method_names(), vec!["create", "remove"]);
    }
}
