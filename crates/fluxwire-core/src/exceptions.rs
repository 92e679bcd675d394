/// Error kinds surfaced by the dispatcher and the wiring layer.
///
/// Every failure is returned synchronously to the direct caller. Nothing
/// in this crate retries.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// An action name was used before `add_action` (or after `delete_action`).
    #[error("No such action: {0}")]
    UnknownAction(String),

    /// `dispatch()` was called while a deferred dispatcher was already busy.
    #[error("Can't dispatch while dispatching, use enqueue instead.")]
    Reentrancy,

    /// A subscriber or store listener failed. Propagated untouched out of
    /// `dispatch()` / `enqueue()`.
    #[error("Listener failure: {0}")]
    Listener(String),

    /// An action caller outlived the dispatcher it was wired against.
    #[error("Dispatcher has been dropped")]
    Closed,

    #[error("Failed to encode payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl DispatchError {
    /// Shorthand for listener authors reporting their own failure.
    pub fn listener(msg: impl Into<String>) -> Self {
        Self::Listener(msg.into())
    }

    pub fn is_unknown_action(&self) -> bool {
        matches!(self, Self::UnknownAction(_))
    }

    pub fn is_reentrancy(&self) -> bool {
        matches!(self, Self::Reentrancy)
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_action_message() {
        let err = DispatchError::UnknownAction("FOO_BAR".to_string());
        assert_eq!(err.to_string(), "No such action: FOO_BAR");
        assert!(err.is_unknown_action());
        assert!(!err.is_reentrancy());
    }

    #[test]
    fn test_reentrancy_message() {
        let err = DispatchError::Reentrancy;
        assert_eq!(
            err.to_string(),
            "Can't dispatch while dispatching, use enqueue instead."
        );
        assert!(err.is_reentrancy());
    }

    #[test]
    fn test_listener_helper() {
        let err = DispatchError::listener("store exploded");
        assert_eq!(err.to_string(), "Listener failure: store exploded");
    }
}
