//! Observable side of the hub: listener lists and dispatch.
//!
//! Dispatch walks the live listener list from the end toward the front. A
//! handler that detaches itself (or anything registered after it) does not
//! shift the entries still to be visited, so "fire once" style handlers
//! neither skip nor repeat their neighbours.

use super::error::{dump_error, EventError};
use super::hub::{warn_invalid, Hub, Listener, ObjectId};
use super::value::{Event, EventType, HandlerRef, Value};

impl Hub {
    /// Append `subscriber`/`handler` to `observable`'s listeners for `kind`.
    ///
    /// Returns `false` (and logs) when any argument is missing or stale.
    pub fn attach(
        &mut self,
        observable: ObjectId,
        subscriber: ObjectId,
        handler: impl Into<HandlerRef>,
        kind: impl Into<EventType>,
    ) -> bool {
        let handler = handler.into();
        let kind = kind.into();
        if let Err(err) = self.check_link(observable, subscriber, &handler, &kind) {
            warn_invalid("attach", &err);
            return false;
        }
        let Some(state) = self.objects.get_mut(observable) else {
            return false;
        };
        state
            .listeners
            .entry(kind)
            .or_default()
            .push(Listener { subscriber, handler });
        true
    }

    /// Remove every matching `subscriber`/`handler` pair for `kind`.
    ///
    /// Returns `true` iff at least one listener was removed.
    pub fn detach(
        &mut self,
        observable: ObjectId,
        subscriber: ObjectId,
        handler: impl Into<HandlerRef>,
        kind: impl Into<EventType>,
    ) -> bool {
        let handler = handler.into();
        let kind = kind.into();
        if handler.is_missing() || kind.is_empty() {
            warn_invalid("detach", &EventError::MissingArgument("handler or event type"));
            return false;
        }
        let Some(state) = self.objects.get_mut(observable) else {
            return false;
        };
        let Some(list) = state.listeners.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|l| !(l.subscriber == subscriber && l.handler == handler));
        let removed = list.len() != before;
        if list.is_empty() {
            state.listeners.remove(&kind);
        }
        removed
    }

    /// Detach every listener from `observable`.
    ///
    /// Subscribers that still exist are detached through their own
    /// [`Hub::detach_from`] so their subscription records stay in sync;
    /// stale subscribers are removed from the list directly.
    pub fn detach_all(&mut self, observable: ObjectId) {
        let Some(state) = self.objects.get(observable) else {
            return;
        };
        let entries: Vec<(EventType, Listener)> = state
            .listeners
            .iter()
            .flat_map(|(kind, list)| list.iter().map(move |l| (kind.clone(), l.clone())))
            .collect();

        for (kind, listener) in entries {
            if self.contains(listener.subscriber) {
                self.detach_from(listener.subscriber, observable, listener.handler, kind);
            } else {
                self.detach(observable, listener.subscriber, listener.handler, kind);
            }
        }
    }

    /// Fire `kind` on `source` to its registered listeners.
    ///
    /// Listeners run newest first. A handler returning `Ok(true)` consumes
    /// the event and stops dispatch. A failing handler is logged and the
    /// walk continues. Firing a type that is already being dispatched on the
    /// same source is dropped with an event-loop warning.
    pub fn fire(&mut self, source: ObjectId, kind: impl Into<EventType>, value: impl Into<Value>) {
        self.dispatch(source, kind.into(), value.into(), None);
    }

    /// Like [`Hub::fire`] but to an explicit listener list instead of the
    /// registered one.
    pub fn fire_to(
        &mut self,
        source: ObjectId,
        kind: impl Into<EventType>,
        value: impl Into<Value>,
        listeners: &[Listener],
    ) {
        self.dispatch(source, kind.into(), value.into(), Some(listeners));
    }

    fn dispatch(&mut self, source: ObjectId, kind: EventType, value: Value, explicit: Option<&[Listener]>) {
        let Some(state) = self.objects.get_mut(source) else {
            return;
        };
        let count = match explicit {
            Some(list) => list.len(),
            None => match state.listeners.get(&kind) {
                Some(list) => list.len(),
                None => return,
            },
        };
        if !state.active_types.insert(kind.clone()) {
            tracing::warn!(source = %state.name, "{}", EventError::EventLoop(kind));
            return;
        }

        let event = Event {
            source,
            kind: kind.clone(),
            value,
        };
        let mut index = count;
        while index > 0 {
            index -= 1;
            let listener = match explicit {
                Some(list) => list.get(index).cloned(),
                None => self.listener_at(source, &kind, index),
            };
            let Some(listener) = listener else {
                continue;
            };
            match self.invoke(listener.subscriber, &listener.handler, &event) {
                Ok(true) => break,
                Ok(false) => {}
                Err(err) => dump_error(&format!("handler `{}` for `{kind}`", listener.handler), &err),
            }
        }

        if let Some(state) = self.objects.get_mut(source) {
            state.active_types.remove(&kind);
        }
    }

    fn listener_at(&self, source: ObjectId, kind: &str, index: usize) -> Option<Listener> {
        self.objects.get(source)?.listeners.get(kind)?.get(index).cloned()
    }

    /// Whether anything listens for `kind` on `observable`.
    pub fn has_listeners(&self, observable: ObjectId, kind: &str) -> bool {
        self.listener_count(observable, kind) > 0
    }

    pub fn listener_count(&self, observable: ObjectId, kind: &str) -> usize {
        self.objects
            .get(observable)
            .and_then(|state| state.listeners.get(kind))
            .map_or(0, Vec::len)
    }

    /// Snapshot of the listeners for `kind`, in registration order.
    pub fn listeners(&self, observable: ObjectId, kind: &str) -> Vec<Listener> {
        self.objects
            .get(observable)
            .and_then(|state| state.listeners.get(kind))
            .cloned()
            .unwrap_or_default()
    }

    /// Whether `kind` is being dispatched on `observable` right now.
    pub fn is_firing(&self, observable: ObjectId, kind: &str) -> bool {
        self.objects
            .get(observable)
            .is_some_and(|state| state.active_types.contains(kind))
    }

    pub(crate) fn check_link(
        &self,
        observable: ObjectId,
        subscriber: ObjectId,
        handler: &HandlerRef,
        kind: &str,
    ) -> Result<(), EventError> {
        if handler.is_missing() {
            return Err(EventError::MissingArgument("handler"));
        }
        if kind.is_empty() {
            return Err(EventError::MissingArgument("event type"));
        }
        if !self.contains(observable) {
            return Err(EventError::StaleObject("observable"));
        }
        if !self.contains(subscriber) {
            return Err(EventError::StaleObject("subscriber"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::error::HandlerError;
    use crate::event::value::Callback;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tracing_test::traced_test;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    /// An observable plus one subscriber with a recording method per label.
    fn setup(labels: &[&'static str]) -> (Hub, ObjectId, ObjectId, Log) {
        let mut hub = Hub::new();
        let obs = hub.create_named("obs");
        let sub = hub.create_named("sub");
        let log: Log = Rc::default();
        for &label in labels {
            let log_c = Rc::clone(&log);
            hub.define_method(sub, label, move |_, _| {
                log_c.borrow_mut().push(label);
                Ok(false)
            });
        }
        (hub, obs, sub, log)
    }

    #[test]
    fn dispatch_runs_in_reverse_registration_order() {
        let (mut hub, obs, sub, log) = setup(&["l1", "l2", "l3"]);
        for h in ["l1", "l2", "l3"] {
            assert!(hub.attach(obs, sub, h, "t"));
        }
        hub.fire(obs, "t", Value::Null);
        assert_eq!(*log.borrow(), vec!["l3", "l2", "l1"]);
    }

    #[test]
    fn truthy_return_consumes_the_event() {
        let (mut hub, obs, sub, log) = setup(&["l1", "l3"]);
        let log_c = Rc::clone(&log);
        hub.define_method(sub, "l2", move |_, _| {
            log_c.borrow_mut().push("l2");
            Ok(true)
        });
        for h in ["l1", "l2", "l3"] {
            hub.attach(obs, sub, h, "t");
        }
        hub.fire(obs, "t", Value::Null);
        assert_eq!(*log.borrow(), vec!["l3", "l2"]);
    }

    #[test]
    #[traced_test]
    fn reentrant_fire_of_same_type_is_dropped() {
        let (mut hub, obs, sub, log) = setup(&["inner"]);
        let log_c = Rc::clone(&log);
        hub.define_method(sub, "outer", move |hub, ev| {
            log_c.borrow_mut().push("outer");
            assert!(hub.is_firing(ev.source, "t"));
            hub.fire(ev.source, "t", Value::Null);
            log_c.borrow_mut().push("outer-done");
            Ok(false)
        });
        hub.attach(obs, sub, "inner", "t");
        hub.attach(obs, sub, "outer", "t");

        hub.fire(obs, "t", Value::Null);
        assert_eq!(*log.borrow(), vec!["outer", "outer-done", "inner"]);
        assert!(!hub.is_firing(obs, "t"));
        assert!(logs_contain("event loop"));
    }

    #[test]
    fn reentrant_fire_of_other_type_runs() {
        let (mut hub, obs, sub, log) = setup(&["on_u"]);
        hub.define_method(sub, "on_t", |hub, ev| {
            hub.fire(ev.source, "u", Value::Null);
            Ok(false)
        });
        hub.attach(obs, sub, "on_t", "t");
        hub.attach(obs, sub, "on_u", "u");
        hub.fire(obs, "t", Value::Null);
        assert_eq!(*log.borrow(), vec!["on_u"]);
    }

    #[test]
    #[traced_test]
    fn failing_handler_does_not_stop_dispatch() {
        let (mut hub, obs, sub, log) = setup(&["l1"]);
        hub.define_method(sub, "broken", |_, _| Err(HandlerError::msg("boom")));
        hub.attach(obs, sub, "l1", "t");
        hub.attach(obs, sub, "broken", "t");
        hub.attach(obs, sub, "missing", "t");
        hub.fire(obs, "t", Value::Null);
        assert_eq!(*log.borrow(), vec!["l1"]);
        assert!(logs_contain("boom"));
        assert!(logs_contain("subscriber has no method `missing`"));
    }

    #[test]
    fn handler_detaching_itself_does_not_skip_neighbours() {
        let (mut hub, obs, sub, log) = setup(&["a", "c"]);
        let log_c = Rc::clone(&log);
        hub.define_method(sub, "b", move |hub, ev| {
            log_c.borrow_mut().push("b");
            hub.detach(ev.source, sub, "b", "t");
            Ok(false)
        });
        hub.attach(obs, sub, "a", "t");
        hub.attach(obs, sub, "b", "t");
        hub.attach(obs, sub, "c", "t");

        hub.fire(obs, "t", Value::Null);
        assert_eq!(*log.borrow(), vec!["c", "b", "a"]);
        assert_eq!(hub.listener_count(obs, "t"), 2);
    }

    #[test]
    fn detach_removes_all_matching_pairs() {
        let (mut hub, obs, sub, _log) = setup(&["h"]);
        hub.attach(obs, sub, "h", "t");
        hub.attach(obs, sub, "h", "t");
        assert_eq!(hub.listener_count(obs, "t"), 2);
        assert!(hub.detach(obs, sub, "h", "t"));
        assert!(!hub.has_listeners(obs, "t"));
        assert!(!hub.detach(obs, sub, "h", "t"));
    }

    #[test]
    fn detach_matches_callbacks_by_identity() {
        let mut hub = Hub::new();
        let obs = hub.create();
        let sub = hub.create();
        let a = Callback::new(|_, _| Ok(false));
        let b = Callback::new(|_, _| Ok(false));
        hub.attach(obs, sub, a.clone(), "t");
        hub.attach(obs, sub, b, "t");
        assert!(hub.detach(obs, sub, a, "t"));
        assert_eq!(hub.listener_count(obs, "t"), 1);
    }

    #[test]
    #[traced_test]
    fn attach_rejects_missing_arguments() {
        let mut hub = Hub::new();
        let obs = hub.create();
        let sub = hub.create();
        assert!(!hub.attach(obs, sub, "", "t"));
        assert!(!hub.attach(obs, sub, "h", ""));
        let gone = hub.create();
        hub.destroy(gone);
        assert!(!hub.attach(gone, sub, "h", "t"));
        assert!(!hub.attach(obs, gone, "h", "t"));
        assert!(!hub.has_listeners(obs, "t"));
        assert!(logs_contain("missing handler"));
    }

    #[test]
    fn fire_without_listeners_is_a_noop() {
        let mut hub = Hub::new();
        let obs = hub.create();
        hub.fire(obs, "nothing", 1);
        assert!(!hub.is_firing(obs, "nothing"));
    }

    #[test]
    fn fire_to_uses_explicit_listeners() {
        let (mut hub, obs, sub, log) = setup(&["registered", "explicit"]);
        hub.attach(obs, sub, "registered", "t");
        let explicit = [Listener {
            subscriber: sub,
            handler: "explicit".into(),
        }];
        hub.fire_to(obs, "t", Value::Null, &explicit);
        assert_eq!(*log.borrow(), vec!["explicit"]);
    }

    #[test]
    fn event_carries_source_type_and_value() {
        let mut hub = Hub::new();
        let obs = hub.create();
        let sub = hub.create();
        let seen = Rc::new(RefCell::new(None));
        let seen_c = Rc::clone(&seen);
        hub.attach(
            obs,
            sub,
            Callback::new(move |_, ev| {
                *seen_c.borrow_mut() = Some(ev.clone());
                Ok(false)
            }),
            "width",
        );
        hub.fire(obs, "width", 42);
        assert_eq!(seen.borrow().clone(), Some(Event::new(obs, "width", 42)));
    }

    #[test]
    fn detach_all_keeps_observer_records_in_sync() {
        let (mut hub, obs, sub, _log) = setup(&["h", "k"]);
        hub.attach_to(sub, obs, "h", "t", false);
        hub.attach_to(sub, obs, "k", "u", false);
        assert!(hub.is_attached_to(sub, obs, "h", "t"));

        hub.detach_all(obs);
        assert!(!hub.has_listeners(obs, "t"));
        assert!(!hub.has_listeners(obs, "u"));
        assert!(!hub.is_attached_to(sub, obs, "h", "t"));
        assert!(!hub.is_attached_to(sub, obs, "k", "u"));
    }
}
