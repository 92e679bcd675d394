//! Default values for the fluxwire settings. Each can be overridden by an
//! env var of the same name. These should only be primitive types.
use crate::get_fluxwire_setting;

/// default dispatch mode. `true` batches enqueues until `dispatch()` is called
pub static FLUXWIRE_DISPATCH_ASYNC: bool = false;

/// prefix for generated subscriber ids
pub static FLUXWIRE_SUBSCRIPTION_PREFIX: &'static str = "____dispatch____";

/// When a [`Dispatcher`](crate::Dispatcher) drains its queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// every `enqueue` immediately runs `dispatch`
    #[default]
    Sync,
    /// `enqueue` only appends. The caller runs `dispatch` explicitly
    Deferred,
}

impl DispatchMode {
    pub fn from_async_flag(dispatch_async: bool) -> Self {
        if dispatch_async {
            Self::Deferred
        } else {
            Self::Sync
        }
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Self::Deferred)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub mode: DispatchMode,
    pub id_prefix: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            mode: DispatchMode::from_async_flag(FLUXWIRE_DISPATCH_ASYNC),
            id_prefix: FLUXWIRE_SUBSCRIPTION_PREFIX.to_string(),
        }
    }
}

impl DispatcherConfig {
    /// Read the config from the environment, falling back to the defaults
    /// above for anything unset or unparseable
    pub fn from_env() -> Self {
        let dispatch_async: bool = get_fluxwire_setting!(FLUXWIRE_DISPATCH_ASYNC, bool);
        Self {
            mode: DispatchMode::from_async_flag(dispatch_async),
            id_prefix: get_fluxwire_setting!(FLUXWIRE_SUBSCRIPTION_PREFIX),
        }
    }

    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dispatcher;
    use std::env;

    #[test]
    fn test_default_config() {
        let cfg = DispatcherConfig::default();
        assert_eq!(cfg.mode, DispatchMode::Sync);
        assert_eq!(cfg.id_prefix, "____dispatch____");
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(DispatchMode::from_async_flag(true), DispatchMode::Deferred);
        assert_eq!(DispatchMode::from_async_flag(false), DispatchMode::Sync);
        assert!(DispatchMode::Deferred.is_async());
        assert!(!DispatchMode::Sync.is_async());
    }

    #[test]
    fn test_with_mode() {
        let cfg = DispatcherConfig::default().with_mode(DispatchMode::Deferred);
        assert!(cfg.mode.is_async());
        assert_eq!(cfg.id_prefix, FLUXWIRE_SUBSCRIPTION_PREFIX);
    }

    // one test so the env vars are not raced by a parallel case
    #[test]
    fn test_from_env_overrides_and_fallbacks() {
        env::remove_var("FLUXWIRE_DISPATCH_ASYNC");
        env::remove_var("FLUXWIRE_SUBSCRIPTION_PREFIX");
        assert_eq!(DispatcherConfig::from_env(), DispatcherConfig::default());

        env::set_var("FLUXWIRE_DISPATCH_ASYNC", " TRUE ");
        assert_eq!(DispatcherConfig::from_env().mode, DispatchMode::Deferred);

        env::set_var("FLUXWIRE_DISPATCH_ASYNC", "maybe");
        assert_eq!(DispatcherConfig::from_env().mode, DispatchMode::Sync);

        env::set_var("FLUXWIRE_SUBSCRIPTION_PREFIX", "view-");
        let d = Dispatcher::from_env();
        d.add_action("X");
        let id = d.subscribe("X", |_| Ok(()), None).unwrap();
        assert!(id.starts_with("view-"), "unexpected id {}", id);
        assert!(!d.is_async());

        env::remove_var("FLUXWIRE_DISPATCH_ASYNC");
        env::remove_var("FLUXWIRE_SUBSCRIPTION_PREFIX");
    }
}
