//! Central dispatcher for the flux architecture.
//!
//! Holds the action registry, the subscriber table and the pending queue.
//! Everything runs on the calling thread: `dispatch` invokes subscribers
//! synchronously and returns only once the queue is drained.
use crate::config::{DispatchMode, DispatcherConfig};
use crate::event_key::ERROR_ACTION;
use crate::exceptions::{DispatchError, Result};
use log::{debug, trace, warn};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Opaque value carried by a queued action. `Value::Null` stands in for an
/// absent payload.
pub type Payload = Value;

/// Subscriber callback. An `Err` aborts the running dispatch and is returned
/// to whoever called `dispatch` / `enqueue`.
pub type Listener = Rc<dyn Fn(&Payload) -> Result<()>>;

/// Subscribers of one action, in registration order
type SubscriberSet = Vec<(String, Listener)>;

#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub action: String,
    pub payload: Payload,
}

struct DispatcherInner {
    mode: DispatchMode,
    id_prefix: String,
    next_id: Cell<u64>,
    /// action name -> subscribers. Presence of the key is the registry.
    subscribers: RefCell<HashMap<String, SubscriberSet>>,
    queue: RefCell<Vec<QueueEntry>>,
    busy: Cell<bool>,
}

/// Cheap, cloneable handle onto a single dispatcher instance. Clones share
/// the same registry, subscribers and queue.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Rc<DispatcherInner>,
}

/// Non-owning handle, used by callbacks the dispatcher itself stores so
/// they do not keep it alive.
#[derive(Clone)]
pub struct WeakDispatcher {
    inner: Weak<DispatcherInner>,
}

impl WeakDispatcher {
    pub fn upgrade(&self) -> Option<Dispatcher> {
        self.inner.upgrade().map(|inner| Dispatcher { inner })
    }
}

/// Marks the dispatcher busy for the lifetime of the guard and restores the
/// previous flag on drop, including when a listener fails.
struct BusyGuard<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> BusyGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        Self { flag, previous }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("mode", &self.inner.mode)
            .field("actions", &self.inner.subscribers.borrow().len())
            .field("pending", &self.inner.queue.borrow().len())
            .field("busy", &self.inner.busy.get())
            .finish()
    }
}

impl Dispatcher {
    /// Synchronous dispatcher: every `enqueue` drains the queue immediately.
    pub fn new() -> Self {
        Self::from_config(DispatcherConfig::default())
    }

    /// Deferred dispatcher: `enqueue` only appends, the caller drives
    /// `dispatch`.
    pub fn deferred() -> Self {
        Self::with_mode(DispatchMode::Deferred)
    }

    pub fn with_mode(mode: DispatchMode) -> Self {
        Self::from_config(DispatcherConfig::default().with_mode(mode))
    }

    pub fn from_env() -> Self {
        Self::from_config(DispatcherConfig::from_env())
    }

    pub fn from_config(config: DispatcherConfig) -> Self {
        let mut subscribers = HashMap::new();
        subscribers.insert(ERROR_ACTION.to_string(), SubscriberSet::new());
        Self {
            inner: Rc::new(DispatcherInner {
                mode: config.mode,
                id_prefix: config.id_prefix,
                next_id: Cell::new(0),
                subscribers: RefCell::new(subscribers),
                queue: RefCell::new(Vec::new()),
                busy: Cell::new(false),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakDispatcher {
        WeakDispatcher {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn mode(&self) -> DispatchMode {
        self.inner.mode
    }

    pub fn is_async(&self) -> bool {
        self.inner.mode.is_async()
    }

    pub fn is_busy(&self) -> bool {
        self.inner.busy.get()
    }

    pub fn has_action(&self, action: &str) -> bool {
        self.inner.subscribers.borrow().contains_key(action)
    }

    /// Number of entries waiting in the queue
    pub fn pending(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    /// Copy of the entries waiting in the queue, oldest first
    pub fn queued(&self) -> Vec<QueueEntry> {
        self.inner.queue.borrow().clone()
    }

    /// Number of subscribers for `action`, `None` if it is not registered
    pub fn subscriber_count(&self, action: &str) -> Option<usize> {
        self.inner.subscribers.borrow().get(action).map(Vec::len)
    }

    /// Register `action`. Re-adding an existing action clears its
    /// subscribers.
    pub fn add_action(&self, action: &str) {
        debug!("Registering action {}", action);
        self.inner
            .subscribers
            .borrow_mut()
            .insert(action.to_string(), SubscriberSet::new());
    }

    /// Register `action` unless it is already known, leaving existing
    /// subscribers in place. Returns whether it was added.
    pub fn ensure_action(&self, action: &str) -> bool {
        if self.has_action(action) {
            return false;
        }
        self.add_action(action);
        true
    }

    /// Remove `action` and its subscribers. Unknown names are ignored.
    pub fn delete_action(&self, action: &str) {
        if self.inner.subscribers.borrow_mut().remove(action).is_some() {
            debug!("Deleted action {}", action);
        }
    }

    /// Subscribe `listener` to `action` and return its id. A caller supplied
    /// id that is already subscribed has its listener replaced in place.
    pub fn subscribe<F>(&self, action: &str, listener: F, id: Option<&str>) -> Result<String>
    where
        F: Fn(&Payload) -> Result<()> + 'static,
    {
        self.subscribe_shared(action, Rc::new(listener), id)
    }

    pub fn subscribe_shared(
        &self,
        action: &str,
        listener: Listener,
        id: Option<&str>,
    ) -> Result<String> {
        self.verify(action)?;
        let id = match id {
            Some(id) => id.to_string(),
            None => self.next_subscription_id(),
        };

        let mut subscribers = self.inner.subscribers.borrow_mut();
        let set = subscribers
            .get_mut(action)
            .ok_or_else(|| DispatchError::UnknownAction(action.to_string()))?;
        match set.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = listener,
            None => set.push((id.clone(), listener)),
        }
        debug!("Subscribed {} to {}", id, action);
        Ok(id)
    }

    /// Remove subscriber `id` from `action`. Removing an absent id is a
    /// no-op.
    pub fn unsubscribe(&self, action: &str, id: &str) -> Result<()> {
        self.verify(action)?;
        if let Some(set) = self.inner.subscribers.borrow_mut().get_mut(action) {
            set.retain(|(existing, _)| existing != id);
        }
        Ok(())
    }

    /// Queue `action` with an optional payload. A synchronous dispatcher
    /// drains the queue before returning.
    pub fn enqueue(&self, action: &str, payload: impl Into<Option<Payload>>) -> Result<()> {
        self.verify(action)?;
        let payload = payload.into().unwrap_or(Value::Null);
        self.inner.queue.borrow_mut().push(QueueEntry {
            action: action.to_string(),
            payload,
        });

        if !self.inner.mode.is_async() {
            self.dispatch()?;
        }
        Ok(())
    }

    /// Drain the queue.
    ///
    /// The queue is processed in rounds. Each round snapshots the pending
    /// entries and handles them in their original order; anything enqueued
    /// while an entry is being handled lands behind the rest of the
    /// snapshot, so a round always finishes before the events it produced
    /// are delivered. Entries produced by entry *i* follow those produced
    /// by entry *i - 1*.
    ///
    /// A listener error aborts the drain. The rest of the current snapshot
    /// is dropped, entries already produced stay queued.
    pub fn dispatch(&self) -> Result<()> {
        if self.inner.busy.get() && self.inner.mode.is_async() {
            return Err(DispatchError::Reentrancy);
        }

        loop {
            let batch = self.inner.queue.take();
            if batch.is_empty() {
                return Ok(());
            }
            debug!("Dispatching {} queued action(s)", batch.len());

            let mut entries = batch.into_iter();
            while let Some(entry) = entries.next() {
                // park what earlier entries produced so a nested dispatch
                // only sees this entry's output
                let carried = self.inner.queue.take();
                let outcome = self.dispatch_one(&entry);
                let produced = self.inner.queue.replace(carried);
                self.inner.queue.borrow_mut().extend(produced);

                if let Err(e) = outcome {
                    if entries.len() > 0 {
                        warn!(
                            "Dropping {} queued action(s) after {} failed: {}",
                            entries.len(),
                            entry.action,
                            e
                        );
                    }
                    return Err(e);
                }
            }
        }
    }

    fn dispatch_one(&self, entry: &QueueEntry) -> Result<()> {
        let ids: Vec<String> = match self.inner.subscribers.borrow().get(&entry.action) {
            Some(set) => set.iter().map(|(id, _)| id.clone()).collect(),
            None => return Ok(()),
        };
        debug!("Handling action {} ({} subscriber(s))", entry.action, ids.len());

        let _busy = BusyGuard::enter(&self.inner.busy);
        for id in ids {
            // subscribers removed earlier in this pass are skipped
            let Some(listener) = self.listener(&entry.action, &id) else {
                continue;
            };
            trace!("Delivering {} to {}", entry.action, id);
            listener(&entry.payload)?;
        }
        Ok(())
    }

    fn listener(&self, action: &str, id: &str) -> Option<Listener> {
        self.inner
            .subscribers
            .borrow()
            .get(action)?
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, listener)| listener.clone())
    }

    fn next_subscription_id(&self) -> String {
        let n = self.inner.next_id.get();
        self.inner.next_id.set(n + 1);
        format!("{}{}", self.inner.id_prefix, n)
    }

    fn verify(&self, action: &str) -> Result<()> {
        if self.has_action(action) {
            Ok(())
        } else {
            Err(DispatchError::UnknownAction(action.to_string()))
        }
    }
}
