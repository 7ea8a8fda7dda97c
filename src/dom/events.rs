//! DOM event adapter: native events on elements to hub handlers.
//!
//! A *DOM observable* is an event object bound to an element and a set of
//! native [`Category`]s. A *DOM observer* subscribes one of its handlers to a
//! native type on a DOM observable with [`DomAdapter::attach_to_dom`]; the
//! adapter installs an element listener that wraps the handler (see
//! [`create_dom_handler`]) and keeps two mirrored records so detaching is
//! exact:
//!
//! - per observable and native type, a flat list of [`DomRegistration`]s
//! - per observer, the list of [`DomSubscription`]s it made
//!
//! The same observer/handler pair may be registered more than once (for
//! example once for capture and once for bubble); detaching removes only
//! registrations that match observer, handler, type and capture flag.
//!
//! # Return value polarity
//!
//! DOM handlers read `Ok(true)` as *let the event continue*. `Ok(false)` or
//! an error stops propagation and, for the types in the category's
//! prevent-default subset, prevents the default action. This is the
//! opposite of [`Hub::fire`], where `Ok(true)` consumes the event.

use std::collections::HashMap;
use std::rc::Rc;

use crate::event::hub::warn_invalid;
use crate::event::{
    dump_error, Category, Event, EventError, HandlerError, HandlerRef, Hub, NativeEvent, NativeType, ObjectId, Phase,
    Value,
};

use super::node::{ListenerId, NativeHandler, NodeId};
use super::tree::Dom;

/// One registration on a DOM observable.
#[derive(Debug, Clone, PartialEq)]
pub struct DomRegistration {
    pub observer: ObjectId,
    pub handler: HandlerRef,
    /// Element the listener was installed on.
    pub element: NodeId,
    pub listener: ListenerId,
    pub capture: bool,
    pub passive: bool,
}

/// One subscription as the observer records it.
#[derive(Debug, Clone, PartialEq)]
pub struct DomSubscription {
    pub observable: ObjectId,
    pub handler: HandlerRef,
    pub kind: NativeType,
    pub capture: bool,
}

#[derive(Debug)]
struct DomObservable {
    element: NodeId,
    categories: Vec<Category>,
    /// Per-type element overrides.
    elements: HashMap<NativeType, NodeId>,
    registrations: HashMap<NativeType, Vec<DomRegistration>>,
}

impl DomObservable {
    fn element_for(&self, kind: NativeType) -> NodeId {
        self.elements.get(&kind).copied().unwrap_or(self.element)
    }
}

/// Bookkeeping for every DOM observable and observer.
#[derive(Debug, Default)]
pub struct DomAdapter {
    observables: HashMap<ObjectId, DomObservable>,
    subscriptions: HashMap<ObjectId, Vec<DomSubscription>>,
}

impl DomAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `object` to `element` for the given categories.
    ///
    /// Re-binding an existing observable replaces its element and categories
    /// but keeps its registrations.
    pub fn make_dom_observable(
        &mut self,
        object: ObjectId,
        element: NodeId,
        categories: impl IntoIterator<Item = Category>,
    ) {
        let categories: Vec<Category> = categories.into_iter().collect();
        match self.observables.get_mut(&object) {
            Some(existing) => {
                existing.element = element;
                existing.categories = categories;
            }
            None => {
                self.observables.insert(
                    object,
                    DomObservable {
                        element,
                        categories,
                        elements: HashMap::new(),
                        registrations: HashMap::new(),
                    },
                );
            }
        }
    }

    pub fn is_dom_observable(&self, object: ObjectId) -> bool {
        self.observables.contains_key(&object)
    }

    /// Route native type `kind` of `object` through a different element.
    /// Affects registrations made afterwards.
    pub fn set_dom_element_for(&mut self, object: ObjectId, kind: NativeType, element: NodeId) -> bool {
        match self.observables.get_mut(&object) {
            Some(observable) => {
                observable.elements.insert(kind, element);
                true
            }
            None => false,
        }
    }

    /// Element that receives native `kind` events for `object`.
    pub fn dom_element_for(&self, object: ObjectId, kind: NativeType) -> Option<NodeId> {
        self.observables.get(&object).map(|o| o.element_for(kind))
    }

    /// Whether `object` accepts native `kind`.
    pub fn supports(&self, object: ObjectId, kind: NativeType) -> bool {
        self.observables
            .get(&object)
            .is_some_and(|o| o.categories.contains(&kind.category()))
    }

    /// Subscribe `observer`'s `handler` to native `kind` on `observable`.
    #[allow(clippy::too_many_arguments)]
    pub fn attach_to_dom(
        &mut self,
        hub: &Hub,
        dom: &mut Dom,
        observer: ObjectId,
        observable: ObjectId,
        handler: impl Into<HandlerRef>,
        kind: NativeType,
        capture: bool,
        passive: bool,
    ) -> bool {
        let handler = handler.into();
        if let Err(err) = self.check_attach(hub, observer, observable, &handler, kind) {
            warn_invalid("attach_to_dom", &err);
            return false;
        }
        let Some(state) = self.observables.get_mut(&observable) else {
            return false;
        };
        let element = state.element_for(kind);
        let closure = create_dom_handler(observable, observer, handler.clone(), kind);
        let Some(listener) = dom.add_listener(element, kind, capture, passive, closure) else {
            warn_invalid("attach_to_dom", &EventError::StaleObject("element"));
            return false;
        };
        state.registrations.entry(kind).or_default().push(DomRegistration {
            observer,
            handler: handler.clone(),
            element,
            listener,
            capture,
            passive,
        });
        self.subscriptions.entry(observer).or_default().push(DomSubscription {
            observable,
            handler,
            kind,
            capture,
        });
        true
    }

    fn check_attach(
        &self,
        hub: &Hub,
        observer: ObjectId,
        observable: ObjectId,
        handler: &HandlerRef,
        kind: NativeType,
    ) -> Result<(), EventError> {
        if handler.is_missing() {
            return Err(EventError::MissingArgument("handler"));
        }
        if !hub.contains(observer) {
            return Err(EventError::StaleObject("observer"));
        }
        if !hub.contains(observable) {
            return Err(EventError::StaleObject("observable"));
        }
        if !self.is_dom_observable(observable) {
            return Err(EventError::NotDomObservable);
        }
        if !self.supports(observable, kind) {
            return Err(EventError::UnsupportedNativeType(kind.as_str()));
        }
        Ok(())
    }

    /// Remove every registration matching observer, handler, type and
    /// capture flag. Returns whether anything was removed.
    pub fn detach_from_dom(
        &mut self,
        dom: &mut Dom,
        observer: ObjectId,
        observable: ObjectId,
        handler: impl Into<HandlerRef>,
        kind: NativeType,
        capture: bool,
    ) -> bool {
        let handler = handler.into();
        if handler.is_missing() {
            warn_invalid("detach_from_dom", &EventError::MissingArgument("handler"));
            return false;
        }
        let matches = |reg: &DomRegistration| reg.observer == observer && reg.handler == handler && reg.capture == capture;

        let mut removed = Vec::new();
        if let Some(list) = self
            .observables
            .get_mut(&observable)
            .and_then(|state| state.registrations.get_mut(&kind))
        {
            list.retain(|reg| {
                if matches(reg) {
                    removed.push((reg.element, reg.listener));
                    false
                } else {
                    true
                }
            });
        }
        for &(element, listener) in &removed {
            dom.remove_listener(element, listener);
        }

        if let Some(subs) = self.subscriptions.get_mut(&observer) {
            subs.retain(|s| {
                !(s.observable == observable && s.handler == handler && s.kind == kind && s.capture == capture)
            });
            if subs.is_empty() {
                self.subscriptions.remove(&observer);
            }
        }
        !removed.is_empty()
    }

    /// Undo every DOM subscription `observer` made.
    pub fn detach_from_all_dom_sources(&mut self, dom: &mut Dom, observer: ObjectId) {
        let subs = self.subscriptions.get(&observer).cloned().unwrap_or_default();
        for sub in subs {
            self.detach_from_dom(dom, observer, sub.observable, sub.handler, sub.kind, sub.capture);
        }
    }

    /// Detach every observer registered on `observable`.
    pub fn detach_all_dom_observers(&mut self, dom: &mut Dom, observable: ObjectId) {
        let regs: Vec<(NativeType, DomRegistration)> = self
            .observables
            .get(&observable)
            .map(|state| {
                state
                    .registrations
                    .iter()
                    .flat_map(|(kind, list)| list.iter().map(move |r| (*kind, r.clone())))
                    .collect()
            })
            .unwrap_or_default();
        for (kind, reg) in regs {
            self.detach_from_dom(dom, reg.observer, observable, reg.handler, kind, reg.capture);
        }
    }

    /// Tear down both sides of `object` and forget it.
    pub fn forget(&mut self, dom: &mut Dom, object: ObjectId) {
        self.detach_from_all_dom_sources(dom, object);
        self.detach_all_dom_observers(dom, object);
        self.observables.remove(&object);
    }

    pub fn is_attached_to_dom(
        &self,
        observer: ObjectId,
        observable: ObjectId,
        handler: impl Into<HandlerRef>,
        kind: NativeType,
        capture: bool,
    ) -> bool {
        let handler = handler.into();
        self.subscriptions.get(&observer).is_some_and(|subs| {
            subs.iter().any(|s| {
                s.observable == observable && s.handler == handler && s.kind == kind && s.capture == capture
            })
        })
    }

    /// Registrations for native `kind` on `observable`, in registration order.
    pub fn registrations(&self, observable: ObjectId, kind: NativeType) -> &[DomRegistration] {
        self.observables
            .get(&observable)
            .and_then(|state| state.registrations.get(&kind))
            .map_or(&[], Vec::as_slice)
    }

    pub fn subscriptions(&self, observer: ObjectId) -> &[DomSubscription] {
        self.subscriptions.get(&observer).map_or(&[], Vec::as_slice)
    }
}

/// Wrap `observer`'s `handler` as an element listener for `observable`.
///
/// The listener builds an [`Event`] sourced from `observable` whose value
/// shares the native event, invokes the handler, and stops the event unless
/// the handler returned `Ok(true)`. Failures are dumped and treated as a
/// stop. A destroyed observer is skipped and the event proceeds.
pub fn create_dom_handler(
    observable: ObjectId,
    observer: ObjectId,
    handler: HandlerRef,
    kind: NativeType,
) -> NativeHandler {
    Rc::new(move |hub: &mut Hub, native: &Rc<NativeEvent>| {
        let event = Event {
            source: observable,
            kind: kind.as_str().into(),
            value: Value::Native(Rc::clone(native)),
        };
        let proceed = match hub.invoke(observer, &handler, &event) {
            Ok(proceed) => proceed,
            Err(HandlerError::StaleSubscriber) => {
                tracing::debug!(handler = %handler, kind = %kind, "DOM listener for a destroyed observer");
                true
            }
            Err(err) => {
                dump_error(&format!("DOM handler `{handler}` for `{kind}`"), &err);
                false
            }
        };
        if !proceed {
            native.stop_propagation();
            if kind.prevents_default() {
                native.prevent_default();
            }
        }
    })
}

/// Deliver `native` to `target` through capture, target and bubble phases.
///
/// Capture listeners on the ancestors run root first, then every listener on
/// the target (capture before bubble), then, for bubbling types, bubble
/// listeners on the ancestors nearest first. After the element whose listener stopped
/// propagation, no further element is visited. Returns the event so callers
/// can inspect `is_default_prevented`.
pub fn dispatch_native(hub: &mut Hub, dom: &Dom, target: NodeId, native: NativeEvent) -> Rc<NativeEvent> {
    let native = Rc::new(native);
    let Some(target_data) = dom.get(target) else {
        return native;
    };
    native.set_target(target_data.object);
    let kind = native.kind();
    let ancestors = dom.ancestors(target);

    'dispatch: {
        for &node in ancestors.iter().rev() {
            run_listeners(hub, dom, &native, node, Phase::Capturing, true);
            if native.is_propagation_stopped() {
                break 'dispatch;
            }
        }
        run_listeners(hub, dom, &native, target, Phase::AtTarget, true);
        run_listeners(hub, dom, &native, target, Phase::AtTarget, false);
        if native.is_propagation_stopped() || !kind.bubbles() {
            break 'dispatch;
        }
        for &node in &ancestors {
            run_listeners(hub, dom, &native, node, Phase::Bubbling, false);
            if native.is_propagation_stopped() {
                break 'dispatch;
            }
        }
    }

    native.set_phase(Phase::None);
    native.set_current_target(None);
    tracing::trace!(kind = %kind, stopped = native.is_propagation_stopped(), "native dispatch");
    native
}

/// Run the capture (or bubble) listeners for the event's type on `node`.
fn run_listeners(hub: &mut Hub, dom: &Dom, native: &Rc<NativeEvent>, node: NodeId, phase: Phase, capture: bool) {
    let Some(data) = dom.get(node) else {
        return;
    };
    native.set_phase(phase);
    native.set_current_target(Some(data.object));
    for listener in dom.listeners_for(node, native.kind()) {
        if listener.capture != capture {
            continue;
        }
        native.set_passive(listener.passive);
        (listener.handler)(&mut *hub, native);
        native.set_passive(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::node::ElementData;
    use crate::event::{HandlerError, NativePayload};
    use crate::geometry::Rect;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use tracing_test::traced_test;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Fixture {
        hub: Hub,
        dom: Dom,
        adapter: DomAdapter,
        root: NodeId,
        child: NodeId,
        observer: ObjectId,
        log: Log,
    }

    impl Fixture {
        fn new() -> Self {
            let mut hub = Hub::new();
            let mut dom = Dom::new();
            let mut adapter = DomAdapter::new();
            let root_obj = hub.create_named("root");
            let child_obj = hub.create_named("child");
            let root = dom.insert(ElementData::new("root", root_obj).with_frame(Rect::new(0.0, 0.0, 10.0, 10.0)));
            let child = dom
                .insert_child(root, ElementData::new("child", child_obj).with_frame(Rect::new(0.0, 0.0, 5.0, 5.0)))
                .unwrap();
            adapter.make_dom_observable(root_obj, root, Category::ALL);
            adapter.make_dom_observable(child_obj, child, [Category::Mouse, Category::Key]);
            let observer = hub.create_named("observer");
            Self {
                hub,
                dom,
                adapter,
                root,
                child,
                observer,
                log: Rc::default(),
            }
        }

        fn object(&self, node: NodeId) -> ObjectId {
            self.dom.get(node).unwrap().object
        }

        /// Define a logging method returning `result`.
        fn method(&mut self, name: &'static str, result: bool) {
            let log = Rc::clone(&self.log);
            self.hub.define_method(self.observer, name, move |hub, ev| {
                let native = ev.value.as_native().unwrap();
                log.borrow_mut()
                    .push(format!("{name}:{}:{:?}", hub.name(ev.source), native.phase()));
                Ok(result)
            });
        }

        fn attach(&mut self, node: NodeId, name: &'static str, kind: NativeType, capture: bool) -> bool {
            let obs = self.object(node);
            self.adapter
                .attach_to_dom(&self.hub, &mut self.dom, self.observer, obs, name, kind, capture, false)
        }

        fn click(&mut self, target: NodeId) -> Rc<NativeEvent> {
            let native = NativeEvent::pointer(NativeType::Click, 1.0, 1.0, None);
            dispatch_native(&mut self.hub, &self.dom, target, native)
        }

        fn log(&self) -> Vec<String> {
            self.log.borrow().clone()
        }
    }

    #[test]
    fn capture_target_bubble_order() {
        let mut f = Fixture::new();
        f.method("cap", true);
        f.method("bub", true);
        f.method("tgt", true);
        let (root, child) = (f.root, f.child);
        assert!(f.attach(root, "bub", NativeType::Click, false));
        assert!(f.attach(root, "cap", NativeType::Click, true));
        assert!(f.attach(child, "tgt", NativeType::Click, false));

        let native = f.click(child);
        assert_eq!(f.log(), vec!["cap:root:Capturing", "tgt:child:AtTarget", "bub:root:Bubbling"]);
        assert!(!native.is_propagation_stopped());
        assert_eq!(native.phase(), Phase::None);
        assert_eq!(native.target(), Some(f.object(child)));
    }

    #[test]
    fn falsy_return_stops_bubbling() {
        let mut f = Fixture::new();
        f.method("tgt", false);
        f.method("bub", true);
        let (root, child) = (f.root, f.child);
        f.attach(root, "bub", NativeType::Click, false);
        f.attach(child, "tgt", NativeType::Click, false);

        let native = f.click(child);
        assert_eq!(f.log(), vec!["tgt:child:AtTarget"]);
        assert!(native.is_propagation_stopped());
        // click is not in the mouse prevent-default subset.
        assert!(!native.is_default_prevented());
    }

    #[test]
    fn falsy_return_prevents_default_for_subset() {
        let mut f = Fixture::new();
        f.method("menu", false);
        let child = f.child;
        f.attach(child, "menu", NativeType::ContextMenu, false);
        let native = NativeEvent::pointer(NativeType::ContextMenu, 1.0, 1.0, None);
        let native = dispatch_native(&mut f.hub, &f.dom, child, native);
        assert!(native.is_default_prevented());
    }

    #[test]
    fn passive_listener_cannot_prevent_default() {
        let mut f = Fixture::new();
        f.method("key", false);
        let child_obj = f.object(f.child);
        assert!(f.adapter.attach_to_dom(
            &f.hub,
            &mut f.dom,
            f.observer,
            child_obj,
            "key",
            NativeType::KeyDown,
            false,
            true,
        ));
        let native = NativeEvent::key(crate::event::Key::Enter, crate::event::Modifiers::NONE, NativeType::KeyDown);
        let native = dispatch_native(&mut f.hub, &f.dom, f.child, native);
        assert!(native.is_propagation_stopped());
        assert!(!native.is_default_prevented());
    }

    #[test]
    #[traced_test]
    fn failing_handler_is_dumped_and_stops() {
        let mut f = Fixture::new();
        f.hub
            .define_method(f.observer, "boom", |_, _| Err(HandlerError::msg("exploded")));
        f.method("bub", true);
        let (root, child) = (f.root, f.child);
        f.attach(root, "bub", NativeType::KeyPress, false);
        f.attach(child, "boom", NativeType::KeyPress, false);
        let native = NativeEvent::new(NativeType::KeyPress, NativePayload::None);
        let native = dispatch_native(&mut f.hub, &f.dom, child, native);
        assert!(native.is_propagation_stopped());
        assert!(native.is_default_prevented());
        assert!(f.log().is_empty());
        assert!(logs_contain("DOM handler `boom` for `keypress`: exploded"));
    }

    #[test]
    fn capture_stop_skips_target() {
        let mut f = Fixture::new();
        f.method("cap", false);
        f.method("tgt", true);
        let (root, child) = (f.root, f.child);
        f.attach(root, "cap", NativeType::Click, true);
        f.attach(child, "tgt", NativeType::Click, false);
        f.click(child);
        assert_eq!(f.log(), vec!["cap:root:Capturing"]);
    }

    #[test]
    fn same_pair_capture_and_bubble_detach_independently() {
        let mut f = Fixture::new();
        f.method("h", true);
        let root = f.root;
        let root_obj = f.object(root);
        let child = f.child;
        f.attach(root, "h", NativeType::Click, true);
        f.attach(root, "h", NativeType::Click, false);
        assert_eq!(f.adapter.registrations(root_obj, NativeType::Click).len(), 2);

        assert!(f
            .adapter
            .detach_from_dom(&mut f.dom, f.observer, root_obj, "h", NativeType::Click, true));
        assert_eq!(f.adapter.registrations(root_obj, NativeType::Click).len(), 1);
        assert!(!f.adapter.is_attached_to_dom(f.observer, root_obj, "h", NativeType::Click, true));
        assert!(f.adapter.is_attached_to_dom(f.observer, root_obj, "h", NativeType::Click, false));

        f.click(child);
        assert_eq!(f.log(), vec!["h:root:Bubbling"]);
    }

    #[test]
    #[traced_test]
    fn unsupported_type_is_rejected() {
        let mut f = Fixture::new();
        f.method("h", true);
        let child = f.child;
        assert!(!f.attach(child, "h", NativeType::Wheel, false));
        assert!(logs_contain("native event type `wheel` is not supported"));
        assert!(f.dom.get(child).unwrap().listeners().is_empty());
    }

    #[test]
    #[traced_test]
    fn missing_handler_and_non_dom_observable_are_rejected() {
        let mut f = Fixture::new();
        let child = f.child;
        assert!(!f.attach(child, "", NativeType::Click, false));
        let plain = f.hub.create();
        assert!(!f
            .adapter
            .attach_to_dom(&f.hub, &mut f.dom, f.observer, plain, "h", NativeType::Click, false, false));
        assert!(logs_contain("object is not a DOM observable"));
    }

    #[test]
    fn detach_from_all_dom_sources_removes_element_listeners() {
        let mut f = Fixture::new();
        f.method("h", true);
        let (root, child) = (f.root, f.child);
        f.attach(root, "h", NativeType::Click, false);
        f.attach(child, "h", NativeType::KeyDown, true);
        f.adapter.detach_from_all_dom_sources(&mut f.dom, f.observer);
        assert!(f.adapter.subscriptions(f.observer).is_empty());
        assert!(f.dom.get(root).unwrap().listeners().is_empty());
        assert!(f.dom.get(child).unwrap().listeners().is_empty());
        f.click(child);
        assert!(f.log().is_empty());
    }

    #[test]
    fn detach_all_dom_observers_clears_observer_records() {
        let mut f = Fixture::new();
        f.method("h", true);
        let root = f.root;
        let root_obj = f.object(root);
        f.attach(root, "h", NativeType::Click, false);
        f.attach(root, "h", NativeType::Focus, false);
        f.adapter.detach_all_dom_observers(&mut f.dom, root_obj);
        assert!(f.adapter.subscriptions(f.observer).is_empty());
        assert!(f.adapter.registrations(root_obj, NativeType::Focus).is_empty());
    }

    #[test]
    fn element_override_routes_listener() {
        let mut f = Fixture::new();
        f.method("h", true);
        let (root, child) = (f.root, f.child);
        let root_obj = f.object(root);
        assert!(f.adapter.set_dom_element_for(root_obj, NativeType::KeyDown, child));
        assert_eq!(f.adapter.dom_element_for(root_obj, NativeType::KeyDown), Some(child));
        f.attach(root, "h", NativeType::KeyDown, false);
        assert_eq!(f.dom.listeners_for(child, NativeType::KeyDown).len(), 1);
        assert!(f.dom.listeners_for(root, NativeType::KeyDown).is_empty());
    }

    #[test]
    fn handler_sees_observable_as_source() {
        let mut f = Fixture::new();
        let seen = Rc::new(RefCell::new(None));
        let seen_c = Rc::clone(&seen);
        f.hub.define_method(f.observer, "h", move |_, ev| {
            *seen_c.borrow_mut() = Some((ev.source, ev.kind.to_string()));
            Ok(true)
        });
        let child = f.child;
        f.attach(child, "h", NativeType::MouseDown, false);
        let native = NativeEvent::pointer(NativeType::MouseDown, 0.0, 0.0, None);
        dispatch_native(&mut f.hub, &f.dom, child, native);
        assert_eq!(*seen.borrow(), Some((f.object(child), "mousedown".to_string())));
    }
}
