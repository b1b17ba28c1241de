//! Anonymous listener broadcasts.
//!
//! A broadcast forwards every event to its listeners in registration order.
//! Broadcasts are created by a [`BroadcasterFactory`] from the name of the
//! listener interface they serve.

use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock};

use bramble_common::Object;

/// The factory does not know the requested listener interface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown listener type '{0}'")]
pub struct UnknownListenerType(pub String);

/// A dispatcher that forwards events to an ordered list of listeners.
#[derive(Debug)]
pub struct ListenerBroadcast {
    interface: String,
    listeners: RwLock<Vec<Object>>,
}

impl ListenerBroadcast {
    /// Creates an empty broadcast for the named listener interface.
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// The listener interface this broadcast serves.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Appends a listener.
    pub fn add(&self, listener: Object) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Calls `visitor` with each listener in registration order.
    pub fn visit_listeners(&self, mut visitor: impl FnMut(&Object)) {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        for listener in listeners.iter() {
            visitor(listener);
        }
    }

    /// Delivers an event to every listener of type `L`, in registration order.
    ///
    /// Listeners of other types are skipped.
    pub fn dispatch<L: 'static>(&self, mut event: impl FnMut(&L)) {
        self.visit_listeners(|listener| {
            if let Some(listener) = listener.downcast_ref::<L>() {
                event(listener);
            }
        });
    }

    /// Returns a snapshot of the listeners.
    pub fn listeners(&self) -> Vec<Object> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Creates broadcasts for listener interfaces.
pub trait BroadcasterFactory: Send + Sync {
    /// Creates an empty broadcast for the named interface.
    fn create_anonymous_broadcaster(
        &self,
        interface: &str,
    ) -> Result<ListenerBroadcast, UnknownListenerType>;
}

/// A [`BroadcasterFactory`] that only serves registered interfaces.
#[derive(Debug, Default)]
pub struct ListenerManager {
    interfaces: BTreeSet<String>,
}

impl ListenerManager {
    /// Creates a manager with no registered interfaces.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener interface.
    pub fn register(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.insert(interface.into());
        self
    }

    /// Returns `true` if the interface is registered.
    pub fn knows(&self, interface: &str) -> bool {
        self.interfaces.contains(interface)
    }
}

impl BroadcasterFactory for ListenerManager {
    fn create_anonymous_broadcaster(
        &self,
        interface: &str,
    ) -> Result<ListenerBroadcast, UnknownListenerType> {
        if !self.knows(interface) {
            return Err(UnknownListenerType(interface.to_string()));
        }
        Ok(ListenerBroadcast::new(interface))
    }
}
