//! Observer side of the hub: subscriptions, "once" handlers, sync, and
//! constraints.
//!
//! Every attachment made through [`Hub::attach_to`] is mirrored in the
//! observer's own record so that [`Hub::detach_from_all_observables`] can
//! undo exactly what was registered.

use std::borrow::Cow;
use std::cell::Cell;
use std::rc::Rc;

use super::error::{dump_error, EventError};
use super::hub::{warn_invalid, Hub, ObjectId, Subscription};
use super::value::{Event, EventType, HandlerRef, MethodName, Value};

impl Hub {
    /// Subscribe `observer`'s `handler` to `kind` on `observable`.
    ///
    /// With `once`, a generated wrapper method is installed instead. It
    /// detaches itself before delegating to `handler`, so the handler runs at
    /// most once even if it fails.
    pub fn attach_to(
        &mut self,
        observer: ObjectId,
        observable: ObjectId,
        handler: impl Into<HandlerRef>,
        kind: impl Into<EventType>,
        once: bool,
    ) -> bool {
        let handler = handler.into();
        let kind = kind.into();
        if let Err(err) = self.check_link(observable, observer, &handler, &kind) {
            warn_invalid("attach_to", &err);
            return false;
        }
        let handler = if once {
            self.install_once(observer, observable, handler, kind.clone())
        } else {
            handler
        };
        if !self.attach(observable, observer, handler.clone(), kind.clone()) {
            return false;
        }
        if let Some(state) = self.objects.get_mut(observer) {
            state
                .subscriptions
                .entry(kind)
                .or_default()
                .push(Subscription { observable, handler });
        }
        true
    }

    fn install_once(
        &mut self,
        observer: ObjectId,
        observable: ObjectId,
        target: HandlerRef,
        kind: EventType,
    ) -> HandlerRef {
        let counter = match self.objects.get_mut(observer) {
            Some(state) => {
                state.once_counter += 1;
                state.once_counter
            }
            None => 0,
        };
        let name: MethodName = Cow::Owned(format!("__once_{counter}"));
        let wrapper = HandlerRef::Method(name.clone());
        let fired = Rc::new(Cell::new(false));
        let own = wrapper.clone();
        self.define_method(observer, name, move |hub, event| {
            if fired.replace(true) {
                return Ok(false);
            }
            hub.detach_from(observer, observable, own.clone(), kind.clone());
            if let Some(name) = own.method_name() {
                hub.remove_method(observer, name);
            }
            hub.invoke(observer, &target, event)
        });
        wrapper
    }

    /// Run `handler` right away with `observable`'s current `attr` value
    /// (defaults to `kind`), then keep it subscribed unless `once`.
    pub fn sync_to(
        &mut self,
        observer: ObjectId,
        observable: ObjectId,
        handler: impl Into<HandlerRef>,
        kind: impl Into<EventType>,
        attr: Option<&str>,
        once: bool,
    ) -> bool {
        let handler = handler.into();
        let kind = kind.into();
        if let Err(err) = self.check_link(observable, observer, &handler, &kind) {
            warn_invalid("sync_to", &err);
            return false;
        }
        let value = self.attribute(observable, attr.unwrap_or(kind.as_ref()));
        let event = Event {
            source: observable,
            kind: kind.clone(),
            value,
        };
        if let Err(err) = self.invoke(observer, &handler, &event) {
            dump_error(&format!("sync of `{handler}` to `{kind}`"), &err);
        }
        if once {
            true
        } else {
            self.attach_to(observer, observable, handler, kind, false)
        }
    }

    /// Undo one [`Hub::attach_to`]. Returns whether a listener was removed
    /// from `observable`.
    pub fn detach_from(
        &mut self,
        observer: ObjectId,
        observable: ObjectId,
        handler: impl Into<HandlerRef>,
        kind: impl Into<EventType>,
    ) -> bool {
        let handler = handler.into();
        let kind = kind.into();
        if handler.is_missing() || kind.is_empty() {
            warn_invalid("detach_from", &EventError::MissingArgument("handler or event type"));
            return false;
        }
        if let Some(state) = self.objects.get_mut(observer) {
            if let Some(subs) = state.subscriptions.get_mut(&kind) {
                subs.retain(|s| !(s.observable == observable && s.handler == handler));
                if subs.is_empty() {
                    state.subscriptions.remove(&kind);
                }
            }
        }
        self.detach(observable, observer, handler, kind)
    }

    /// Undo every subscription `observer` made.
    pub fn detach_from_all_observables(&mut self, observer: ObjectId) {
        let Some(state) = self.objects.get(observer) else {
            return;
        };
        let entries: Vec<(EventType, Subscription)> = state
            .subscriptions
            .iter()
            .flat_map(|(kind, subs)| subs.iter().map(move |s| (kind.clone(), s.clone())))
            .collect();
        for (kind, sub) in entries {
            self.detach_from(observer, sub.observable, sub.handler, kind);
        }
    }

    /// Whether `observer` holds a subscription to `kind` on `observable`
    /// through `handler`.
    pub fn is_attached_to(
        &self,
        observer: ObjectId,
        observable: ObjectId,
        handler: impl Into<HandlerRef>,
        kind: &str,
    ) -> bool {
        let handler = handler.into();
        self.objects
            .get(observer)
            .and_then(|state| state.subscriptions.get(kind))
            .is_some_and(|subs| subs.iter().any(|s| s.observable == observable && s.handler == handler))
    }

    /// Re-run `method` whenever any `(observable, kind)` pair fires, and once
    /// immediately.
    ///
    /// A method may carry at most one constraint; a second definition is
    /// logged and ignored until [`Hub::release_constraint`] is called. The
    /// immediate run receives an event sourced from `observer`, typed with the
    /// method name, with a `Null` value.
    pub fn constrain<I, K>(&mut self, observer: ObjectId, method: impl Into<MethodName>, pairs: I) -> bool
    where
        I: IntoIterator<Item = (ObjectId, K)>,
        K: Into<EventType>,
    {
        let method = method.into();
        let pairs: Vec<(ObjectId, EventType)> = pairs.into_iter().map(|(obs, kind)| (obs, kind.into())).collect();
        if method.is_empty() {
            warn_invalid("constrain", &EventError::MissingArgument("method name"));
            return false;
        }
        if pairs.is_empty() {
            warn_invalid("constrain", &EventError::MissingArgument("observable pairs"));
            return false;
        }
        let Some(state) = self.objects.get_mut(observer) else {
            warn_invalid("constrain", &EventError::StaleObject("observer"));
            return false;
        };
        if state.constraints.contains_key(&method) {
            warn_invalid("constrain", &EventError::ConstraintExists(method.to_string()));
            return false;
        }
        state.constraints.insert(method.clone(), pairs.clone());

        for (observable, kind) in pairs {
            self.attach_to(observer, observable, method.clone(), kind, false);
        }

        let event = Event {
            source: observer,
            kind: method.clone(),
            value: Value::Null,
        };
        if let Err(err) = self.invoke(observer, &HandlerRef::Method(method.clone()), &event) {
            dump_error(&format!("constraint `{method}`"), &err);
        }
        true
    }

    /// Drop the constraint registered under `method`.
    pub fn release_constraint(&mut self, observer: ObjectId, method: &str) -> bool {
        let Some(pairs) = self
            .objects
            .get_mut(observer)
            .and_then(|state| state.constraints.remove(method))
        else {
            return false;
        };
        let handler = HandlerRef::Method(Cow::Owned(method.to_owned()));
        for (observable, kind) in pairs {
            self.detach_from(observer, observable, handler.clone(), kind);
        }
        true
    }

    /// Drop every constraint on `observer`.
    pub fn release_all_constraints(&mut self, observer: ObjectId) {
        let methods: Vec<MethodName> = self
            .objects
            .get(observer)
            .map(|state| state.constraints.keys().cloned().collect())
            .unwrap_or_default();
        for method in methods {
            self.release_constraint(observer, &method);
        }
    }

    pub fn has_constraint(&self, observer: ObjectId, method: &str) -> bool {
        self.objects
            .get(observer)
            .is_some_and(|state| state.constraints.contains_key(method))
    }
}
