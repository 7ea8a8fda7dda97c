//! The event object arena.
//!
//! Every object in a [`Hub`] can fire events (observable side) and subscribe
//! to other objects (observer side). Objects are addressed by [`ObjectId`];
//! a stale id turns every operation into a logged no-op.
//!
//! Handlers receive `&mut Hub`, so they can fire, attach and detach while a
//! dispatch is running. The dispatcher never holds a borrow of the listener
//! list across a handler call.

use std::collections::{HashMap, HashSet};
use std::fmt;

use slotmap::{new_key_type, SlotMap};

use super::error::{EventError, HandlerError};
use super::value::{Callback, Event, EventType, HandlerRef, HandlerResult, MethodName, Value};

new_key_type! {
    /// Identifies an event object inside a [`Hub`]. Copy, lightweight (u64).
    pub struct ObjectId;
}

/// One entry in an observable's listener list.
#[derive(Debug, Clone, PartialEq)]
pub struct Listener {
    pub subscriber: ObjectId,
    pub handler: HandlerRef,
}

/// One entry in an observer's subscription record.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Subscription {
    pub(crate) observable: ObjectId,
    pub(crate) handler: HandlerRef,
}

/// Per-object event state.
#[derive(Default)]
pub(crate) struct ObjectState {
    pub(crate) name: String,
    /// Observable side: listeners in insertion order.
    pub(crate) listeners: HashMap<EventType, Vec<Listener>>,
    /// Observable side: types currently being dispatched.
    pub(crate) active_types: HashSet<EventType>,
    /// Observer side: what this object registered, for symmetric teardown.
    pub(crate) subscriptions: HashMap<EventType, Vec<Subscription>>,
    /// Observer side: constraint pairs keyed by method name.
    pub(crate) constraints: HashMap<MethodName, Vec<(ObjectId, EventType)>>,
    pub(crate) methods: HashMap<MethodName, Callback>,
    pub(crate) attributes: HashMap<EventType, Value>,
    /// Source of unique names for "once" wrapper methods.
    pub(crate) once_counter: u64,
}

/// Arena of event objects.
#[derive(Default)]
pub struct Hub {
    pub(crate) objects: SlotMap<ObjectId, ObjectState>,
}

impl Hub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an anonymous object.
    pub fn create(&mut self) -> ObjectId {
        self.objects.insert(ObjectState::default())
    }

    /// Create an object with a name used in log messages.
    pub fn create_named(&mut self, name: impl Into<String>) -> ObjectId {
        self.objects.insert(ObjectState {
            name: name.into(),
            ..ObjectState::default()
        })
    }

    /// Tear down an object: release its constraints, detach it from every
    /// observable, detach every listener from it, then free the slot.
    pub fn destroy(&mut self, id: ObjectId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.release_all_constraints(id);
        self.detach_from_all_observables(id);
        self.detach_all(id);
        self.objects.remove(id).is_some()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The object's log name, empty when anonymous or stale.
    pub fn name(&self, id: ObjectId) -> &str {
        self.objects.get(id).map_or("", |o| o.name.as_str())
    }

    // -- methods ----------------------------------------------------------

    /// Define (or replace) a named method on an object.
    pub fn define_method(
        &mut self,
        id: ObjectId,
        name: impl Into<MethodName>,
        f: impl Fn(&mut Hub, &Event) -> HandlerResult + 'static,
    ) -> bool {
        self.define_callback(id, name, Callback::new(f))
    }

    /// Define (or replace) a named method from an existing callback.
    pub fn define_callback(&mut self, id: ObjectId, name: impl Into<MethodName>, callback: Callback) -> bool {
        let name = name.into();
        if name.is_empty() {
            warn_invalid("define_method", &EventError::MissingArgument("method name"));
            return false;
        }
        match self.objects.get_mut(id) {
            Some(state) => {
                state.methods.insert(name, callback);
                true
            }
            None => false,
        }
    }

    pub fn remove_method(&mut self, id: ObjectId, name: &str) -> bool {
        self.objects
            .get_mut(id)
            .is_some_and(|state| state.methods.remove(name).is_some())
    }

    pub fn has_method(&self, id: ObjectId, name: &str) -> bool {
        self.objects.get(id).is_some_and(|state| state.methods.contains_key(name))
    }

    /// Run `handler` on behalf of `subscriber`.
    ///
    /// Named methods are resolved on the subscriber at call time; the callback
    /// is cloned out first so the handler may freely mutate the hub.
    pub fn invoke(&mut self, subscriber: ObjectId, handler: &HandlerRef, event: &Event) -> HandlerResult {
        let callback = match handler {
            HandlerRef::Callback(cb) => cb.clone(),
            HandlerRef::Method(name) => {
                let state = self.objects.get(subscriber).ok_or(HandlerError::StaleSubscriber)?;
                state
                    .methods
                    .get(name)
                    .cloned()
                    .ok_or_else(|| HandlerError::MissingMethod(name.to_string()))?
            }
        };
        callback.call(self, event)
    }

    // -- attributes -------------------------------------------------------

    /// Current value of an attribute; `Null` when unset or the object is stale.
    pub fn attribute(&self, id: ObjectId, name: &str) -> Value {
        self.objects
            .get(id)
            .and_then(|state| state.attributes.get(name).cloned())
            .unwrap_or_default()
    }

    /// Store an attribute and fire an event named after it when the value
    /// changed. Returns whether the value changed.
    pub fn set_attribute(&mut self, id: ObjectId, name: impl Into<EventType>, value: impl Into<Value>) -> bool {
        let name = name.into();
        let value = value.into();
        let Some(state) = self.objects.get_mut(id) else {
            return false;
        };
        if state.attributes.get(&name) == Some(&value) {
            return false;
        }
        state.attributes.insert(name.clone(), value.clone());
        self.fire(id, name, value);
        true
    }
}

impl fmt::Debug for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub").field("objects", &self.objects.len()).finish()
    }
}

/// Log a rejected operation.
pub(crate) fn warn_invalid(operation: &str, err: &EventError) {
    tracing::warn!(operation, "{err}");
}
