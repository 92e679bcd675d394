//! Canonical event names derived from action creator types, method names and
//! store names.
//!
//! Two distinct (type, method, store) triples are assumed not to collide.
//! That holds for ordinary identifier naming but is not guaranteed: store
//! `A_B` with method `c` and store `A` with method `b_c` both produce
//! `A_B_C_DONE`, and names differing only in case always collide.

/// Reserved channel that every dispatcher registers at construction
pub const ERROR_ACTION: &str = "ERROR";

const LISTENER_PREFIX: &str = "on";

/// `"{type}_{method}"`, uppercased.
pub fn event_key(type_name: &str, method: &str) -> String {
    format!("{type_name}_{method}").to_uppercase()
}

/// Done event fired after `store` finishes handling `method`.
///
/// A leading `on` (any case) is stripped from `method` first, so both the
/// method name (`create`) and the listener name (`onCreate`) map to the same
/// key.
pub fn done_key(type_name: Option<&str>, method: &str, store: &str) -> String {
    let name = strip_listener_prefix(method);
    match type_name {
        Some(t) => format!("{store}_{t}{name}_done").to_uppercase(),
        None => format!("{store}_{name}_done").to_uppercase(),
    }
}

/// Listener name a store uses for `method`: `onCreate` for the generic form,
/// `onWidgetCreate` when bound to a single action creator type.
pub fn listener_name(type_name: Option<&str>, method: &str) -> String {
    format!(
        "{LISTENER_PREFIX}{}{}",
        type_name.unwrap_or_default(),
        capitalize(method)
    )
}

pub fn is_listener_name(name: &str) -> bool {
    name.starts_with(LISTENER_PREFIX)
}

fn strip_listener_prefix(name: &str) -> &str {
    match name.get(..LISTENER_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(LISTENER_PREFIX) => &name[LISTENER_PREFIX.len()..],
        _ => name,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_key() {
        assert_eq!(event_key("Foo", "bar"), "FOO_BAR");
        assert_eq!(event_key("Widget", "create"), "WIDGET_CREATE");
    }

    #[test]
    fn test_done_key_generic() {
        assert_eq!(done_key(None, "onBar", "Store"), "STORE_BAR_DONE");
        assert_eq!(done_key(None, "bar", "Store"), "STORE_BAR_DONE");
        assert_eq!(done_key(None, "onError", "TodoStore"), "TODOSTORE_ERROR_DONE");
    }

    #[test]
    fn test_done_key_typed() {
        assert_eq!(done_key(Some("Foo"), "onBar", "Store"), "STORE_FOOBAR_DONE");
        assert_eq!(
            done_key(Some("Widget"), "create", "WidgetStore"),
            "WIDGETSTORE_WIDGETCREATE_DONE"
        );
    }

    #[test]
    fn test_done_key_prefix_is_case_insensitive() {
        assert_eq!(done_key(None, "ONBAR", "s"), "S_BAR_DONE");
        assert_eq!(done_key(None, "On", "s"), "S__DONE");
        assert_eq!(done_key(None, "o", "s"), "S_O_DONE");
    }

    #[test]
    fn test_listener_name() {
        assert_eq!(listener_name(None, "create"), "onCreate");
        assert_eq!(listener_name(Some("Widget"), "create"), "onWidgetCreate");
        assert_eq!(listener_name(None, ""), "on");
    }

    #[test]
    fn test_listener_name_round_trips_into_done_key() {
        let typed = listener_name(Some("Widget"), "create");
        assert_eq!(
            done_key(None, &typed, "WidgetStore"),
            done_key(Some("Widget"), "create", "WidgetStore")
        );
    }
}
