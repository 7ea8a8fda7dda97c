//! Scene: the hub, the element tree and the DOM adapter wired together.
//!
//! [`Scene`] is the geometry collaborator the layout engine expects. Every
//! element owns an event object in the hub; setters store the value, fire
//! the attribute event on that object, and request whatever re-layout the
//! change implies:
//!
//! - container style changes re-lay out the container itself
//! - child changes (size, visibility, grow, align-self, ignore-flex) re-lay
//!   out the parent, unless the layout itself is resizing the child
//!
//! Terminal input enters through [`Scene::handle_terminal_event`]: keys go
//! to the focused element, pointer events to the element under the pointer.

use std::rc::Rc;

use crate::dom::{dispatch_native, DomAdapter, Dom, ElementData, NodeId};
use crate::event::{
    from_crossterm, Category, HandlerRef, Hub, Key, NativeEvent, NativePayload, NativeType, ObjectId, Value,
};
use crate::geometry::{Axis, Point, Rect};
use crate::layout::engine::{self, FlexHost, FlexMetrics};
use crate::layout::{
    parse_flex_item_style, parse_flex_style, AlignContent, AlignItems, AlignSelf, DeclarationError, Direction,
    FlexContainer, FlexItem, FlexStyle, JustifyContent, Wrap,
};

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// Elements, their event objects, and input routing.
#[derive(Debug, Default)]
pub struct Scene {
    pub hub: Hub,
    pub dom: Dom,
    pub adapter: DomAdapter,
    focused: Option<NodeId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    // -- elements ---------------------------------------------------------

    /// Create a detached element. The first element created becomes the
    /// root.
    pub fn create_element(&mut self, name: &str, frame: Rect) -> NodeId {
        let object = self.hub.create_named(name);
        let node = self.dom.insert(ElementData::new(name, object).with_frame(frame));
        self.register(node, object, frame);
        node
    }

    /// Create an element as the last child of `parent` and re-lay out the
    /// parent.
    pub fn create_child(&mut self, parent: NodeId, name: &str, frame: Rect) -> Option<NodeId> {
        if !self.dom.contains(parent) {
            return None;
        }
        let object = self.hub.create_named(name);
        let node = self.dom.insert_child(parent, ElementData::new(name, object).with_frame(frame))?;
        self.register(node, object, frame);
        self.update_flexbox_layout(parent);
        Some(node)
    }

    fn register(&mut self, node: NodeId, object: ObjectId, frame: Rect) {
        self.adapter.make_dom_observable(object, node, Category::ALL);
        self.hub.set_attribute(object, "x", frame.x);
        self.hub.set_attribute(object, "y", frame.y);
        self.hub.set_attribute(object, "width", frame.width);
        self.hub.set_attribute(object, "height", frame.height);
        self.hub.set_attribute(object, "visible", true);
    }

    /// Move `child` under `parent` (as its last child) and re-lay out both
    /// the old and the new parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let old_parent = self.dom.parent(child);
        if !self.dom.reparent(child, parent) {
            return false;
        }
        if let Some(old) = old_parent.filter(|&old| old != parent) {
            self.update_flexbox_layout(old);
        }
        self.update_flexbox_layout(parent);
        true
    }

    /// Remove `node` and its subtree. Each removed element loses its DOM
    /// registrations and its event object.
    pub fn remove_element(&mut self, node: NodeId) -> bool {
        let parent = self.dom.parent(node);
        let removed = self.dom.remove(node);
        if removed.is_empty() {
            return false;
        }
        for (id, data) in &removed {
            self.destroy_object(data.object);
            if self.focused == Some(*id) {
                self.focused = None;
            }
        }
        tracing::debug!(removed = removed.len(), "element removed");
        if let Some(parent) = parent {
            self.update_flexbox_layout(parent);
        }
        true
    }

    /// Destroy an event object: drop its DOM registrations on both sides,
    /// then tear it down in the hub.
    pub fn destroy_object(&mut self, object: ObjectId) -> bool {
        self.adapter.forget(&mut self.dom, object);
        self.hub.destroy(object)
    }

    /// Reorder `child` within `parent`.
    pub fn move_child(&mut self, parent: NodeId, child: NodeId, index: usize) -> bool {
        if !self.dom.move_child(parent, child, index) {
            return false;
        }
        self.update_flexbox_layout(parent);
        true
    }

    pub fn object(&self, node: NodeId) -> Option<ObjectId> {
        self.dom.get(node).map(|data| data.object)
    }

    pub fn frame(&self, node: NodeId) -> Option<Rect> {
        self.dom.get(node).map(|data| data.frame)
    }

    // -- geometry ---------------------------------------------------------

    pub fn set_x(&mut self, node: NodeId, x: f64) -> bool {
        self.apply_position(node, Axis::Horizontal, x)
    }

    pub fn set_y(&mut self, node: NodeId, y: f64) -> bool {
        self.apply_position(node, Axis::Vertical, y)
    }

    /// Explicit resize: forgets the cached basis and re-lays out the parent.
    pub fn set_width(&mut self, node: NodeId, width: f64) -> bool {
        self.resize(node, Axis::Horizontal, width)
    }

    /// See [`Scene::set_width`].
    pub fn set_height(&mut self, node: NodeId, height: f64) -> bool {
        self.resize(node, Axis::Vertical, height)
    }

    pub fn set_visible(&mut self, node: NodeId, visible: bool) -> bool {
        let Some(data) = self.dom.get_mut(node) else {
            return false;
        };
        if data.visible == visible {
            return false;
        }
        data.visible = visible;
        let object = data.object;
        self.hub.set_attribute(object, "visible", visible);
        self.notify_parent(node);
        true
    }

    fn apply_position(&mut self, node: NodeId, axis: Axis, value: f64) -> bool {
        let Some(data) = self.dom.get_mut(node) else {
            return false;
        };
        if data.frame.position_along(axis) == value {
            return false;
        }
        data.frame.set_position_along(axis, value);
        let object = data.object;
        self.hub.set_attribute(object, axis.position_attribute(), value);
        true
    }

    fn resize(&mut self, node: NodeId, axis: Axis, value: f64) -> bool {
        let Some(data) = self.dom.get_mut(node) else {
            return false;
        };
        if data.frame.size_along(axis) == value.max(0.0) {
            return false;
        }
        if !data.flex_item.is_flex_updating() {
            data.flex_item.clear_basis(axis);
        }
        let changed = self.apply_size(node, axis, value);
        if changed {
            self.notify_parent(node);
        }
        changed
    }

    /// Store a size, fire its attribute, and re-lay out `node`'s own
    /// children.
    fn apply_size(&mut self, node: NodeId, axis: Axis, value: f64) -> bool {
        let value = value.max(0.0);
        let Some(data) = self.dom.get_mut(node) else {
            return false;
        };
        if data.frame.size_along(axis) == value {
            return false;
        }
        data.frame.set_size_along(axis, value);
        let object = data.object;
        self.hub.set_attribute(object, axis.size_attribute(), value);
        self.update_flexbox_layout(node);
        true
    }

    /// Ask the parent container for a pass. While the parent's own pass is
    /// resizing `node` (a compact child shrinking back to its content), the
    /// request becomes that pass's single re-run.
    fn notify_parent(&mut self, node: NodeId) {
        if let Some(parent) = self.dom.parent(node) {
            self.update_flexbox_layout(parent);
        }
    }

    // -- flex container ---------------------------------------------------

    /// Make `node` a flex container with `style`, publish the style and lay
    /// it out.
    pub fn set_flex_container(&mut self, node: NodeId, style: FlexStyle) -> bool {
        let Some(data) = self.dom.get_mut(node) else {
            return false;
        };
        if data.flex.is_none() {
            data.flex = Some(FlexContainer::default());
        }
        self.set_flex_style(node, style);
        self.update_flexbox_layout(node);
        true
    }

    pub fn flex_style(&self, node: NodeId) -> Option<FlexStyle> {
        self.dom.get(node)?.flex.as_ref().map(|c| c.style)
    }

    /// Apply every field of `style` through the individual setters.
    pub fn set_flex_style(&mut self, node: NodeId, style: FlexStyle) -> bool {
        let mut changed = false;
        changed |= self.set_direction(node, style.direction);
        changed |= self.set_wrap(node, style.wrap);
        changed |= self.set_justify_content(node, style.justify_content);
        changed |= self.set_align_items(node, style.align_items);
        changed |= self.set_align_content(node, style.align_content);
        changed |= self.set_row_gap(node, style.row_gap);
        changed |= self.set_column_gap(node, style.column_gap);
        changed
    }

    /// Parse `input` on top of the current style and apply it. Nothing
    /// changes when parsing fails.
    pub fn apply_flex_declaration(&mut self, node: NodeId, input: &str) -> Result<bool, DeclarationError> {
        let base = self.flex_style(node).unwrap_or_default();
        let style = parse_flex_style(input, base)?;
        if self.flex_style(node).is_none() {
            return Ok(self.set_flex_container(node, style));
        }
        Ok(self.set_flex_style(node, style))
    }

    pub fn set_direction(&mut self, node: NodeId, direction: Direction) -> bool {
        self.update_container(node, "direction", direction.as_str(), |s| s.direction = direction)
    }

    pub fn set_wrap(&mut self, node: NodeId, wrap: Wrap) -> bool {
        self.update_container(node, "wrap", wrap.as_str(), |s| s.wrap = wrap)
    }

    pub fn set_justify_content(&mut self, node: NodeId, justify: JustifyContent) -> bool {
        self.update_container(node, "justifyContent", justify.as_str(), |s| s.justify_content = justify)
    }

    pub fn set_align_items(&mut self, node: NodeId, align: AlignItems) -> bool {
        self.update_container(node, "alignItems", align.as_str(), |s| s.align_items = align)
    }

    pub fn set_align_content(&mut self, node: NodeId, align: AlignContent) -> bool {
        self.update_container(node, "alignContent", align.as_str(), |s| s.align_content = align)
    }

    /// Negative gaps are clamped to 0.
    pub fn set_row_gap(&mut self, node: NodeId, gap: f64) -> bool {
        let gap = gap.max(0.0);
        self.update_container(node, "rowGap", gap, |s| s.row_gap = gap)
    }

    pub fn set_column_gap(&mut self, node: NodeId, gap: f64) -> bool {
        let gap = gap.max(0.0);
        self.update_container(node, "columnGap", gap, |s| s.column_gap = gap)
    }

    fn update_container(
        &mut self,
        node: NodeId,
        attribute: &'static str,
        value: impl Into<Value>,
        apply: impl FnOnce(&mut FlexStyle),
    ) -> bool {
        let Some(data) = self.dom.get_mut(node) else {
            return false;
        };
        let object = data.object;
        let Some(container) = data.flex.as_mut() else {
            return false;
        };
        let before = container.style;
        apply(&mut container.style);
        if container.style == before {
            return false;
        }
        self.hub.set_attribute(object, attribute, value);
        self.update_flexbox_layout(node);
        true
    }

    /// Pause or resume layout. Resuming runs a pass.
    pub fn set_flexbox_paused(&mut self, node: NodeId, paused: bool) -> bool {
        let Some(container) = self.dom.get_mut(node).and_then(|d| d.flex.as_mut()) else {
            return false;
        };
        if container.paused == paused {
            return false;
        }
        container.paused = paused;
        if !paused {
            self.update_flexbox_layout(node);
        }
        true
    }

    /// Shrink-wrap `node` to its content along `axis` after each pass.
    pub fn set_flex_compact(&mut self, node: NodeId, axis: Axis, compact: bool) -> bool {
        let Some(data) = self.dom.get_mut(node) else {
            return false;
        };
        if data.is_compact(axis) == compact {
            return false;
        }
        data.set_compact(axis, compact);
        self.update_flexbox_layout(node);
        true
    }

    pub fn set_baseline_offset(&mut self, node: NodeId, offset: f64) -> bool {
        let Some(data) = self.dom.get_mut(node) else {
            return false;
        };
        data.baseline_offset = offset;
        self.notify_parent(node);
        true
    }

    /// Run a layout pass on `node`, publish the totals and apply
    /// shrink-wrapping.
    pub fn update_flexbox_layout(&mut self, node: NodeId) -> Option<FlexMetrics> {
        let metrics = engine::update_flexbox_layout(self, node)?;
        let object = self.object(node)?;
        self.hub.set_attribute(object, "totalBasisWidth", metrics.total_basis_width);
        self.hub.set_attribute(object, "totalBasisHeight", metrics.total_basis_height);
        if self.is_compact(node, Axis::Horizontal) {
            self.resize(node, Axis::Horizontal, metrics.total_basis_width);
        }
        if self.is_compact(node, Axis::Vertical) {
            self.resize(node, Axis::Vertical, metrics.total_basis_height);
        }
        Some(metrics)
    }

    // -- flex child -------------------------------------------------------

    pub fn flex_item_of(&self, node: NodeId) -> Option<&FlexItem> {
        self.dom.get(node).map(|d| &d.flex_item)
    }

    pub fn set_grow(&mut self, node: NodeId, grow: f64) -> bool {
        self.update_item(node, |item| {
            item.set_grow(grow);
            ("grow", item.grow().into())
        })
    }

    pub fn set_align_self(&mut self, node: NodeId, align: AlignSelf) -> bool {
        self.update_item(node, |item| {
            item.set_align_self(align);
            ("alignSelf", align.as_str().into())
        })
    }

    pub fn set_ignore_flex(&mut self, node: NodeId, ignore: bool) -> bool {
        self.update_item(node, |item| {
            item.set_ignore_flex(ignore);
            ("ignoreFlex", ignore.into())
        })
    }

    /// Parse `input` on top of the current item style and apply it.
    pub fn apply_flex_item_declaration(&mut self, node: NodeId, input: &str) -> Result<bool, DeclarationError> {
        let Some(base) = self.flex_item_of(node).map(FlexItem::style) else {
            return Ok(false);
        };
        let style = parse_flex_item_style(input, base)?;
        let mut changed = self.set_grow(node, style.grow);
        changed |= self.set_align_self(node, style.align_self);
        changed |= self.set_ignore_flex(node, style.ignore_flex);
        Ok(changed)
    }

    fn update_item(&mut self, node: NodeId, apply: impl FnOnce(&mut FlexItem) -> (&'static str, Value)) -> bool {
        let Some(data) = self.dom.get_mut(node) else {
            return false;
        };
        let before = data.flex_item.style();
        let (attribute, value) = apply(&mut data.flex_item);
        if data.flex_item.style() == before {
            return false;
        }
        let object = data.object;
        self.hub.set_attribute(object, attribute, value);
        self.notify_parent(node);
        true
    }

    // -- DOM events -------------------------------------------------------

    /// Subscribe `observer`'s `handler` to native `kind` on `element`.
    pub fn attach_to_dom(
        &mut self,
        observer: ObjectId,
        element: NodeId,
        handler: impl Into<HandlerRef>,
        kind: NativeType,
        capture: bool,
        passive: bool,
    ) -> bool {
        let Some(observable) = self.object(element) else {
            return false;
        };
        self.adapter
            .attach_to_dom(&self.hub, &mut self.dom, observer, observable, handler, kind, capture, passive)
    }

    pub fn detach_from_dom(
        &mut self,
        observer: ObjectId,
        element: NodeId,
        handler: impl Into<HandlerRef>,
        kind: NativeType,
        capture: bool,
    ) -> bool {
        let Some(observable) = self.object(element) else {
            return false;
        };
        self.adapter
            .detach_from_dom(&mut self.dom, observer, observable, handler, kind, capture)
    }

    /// Dispatch `native` at `target` through capture, target and bubble.
    pub fn dispatch_native(&mut self, target: NodeId, native: NativeEvent) -> Rc<NativeEvent> {
        dispatch_native(&mut self.hub, &self.dom, target, native)
    }

    // -- focus ------------------------------------------------------------

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Move focus to `node`: `blur` on the previous element, then `focus` on
    /// the new one. Only visible, focusable elements accept focus.
    pub fn focus(&mut self, node: NodeId) -> bool {
        let accepts = self.dom.get(node).is_some_and(|d| d.focusable && d.visible);
        if !accepts || self.focused == Some(node) {
            return false;
        }
        self.blur();
        self.focused = Some(node);
        if let Some(object) = self.object(node) {
            self.hub.set_attribute(object, "focused", true);
        }
        self.dispatch_native(node, NativeEvent::new(NativeType::Focus, NativePayload::None));
        true
    }

    /// Drop focus, dispatching `blur` on the element that had it.
    pub fn blur(&mut self) -> bool {
        let Some(previous) = self.focused.take() else {
            return false;
        };
        if let Some(object) = self.object(previous) {
            self.hub.set_attribute(object, "focused", false);
        }
        self.dispatch_native(previous, NativeEvent::new(NativeType::Blur, NativePayload::None));
        true
    }

    /// Visible, focusable elements in depth-first order.
    pub fn focus_chain(&self) -> Vec<NodeId> {
        let Some(root) = self.dom.root() else {
            return Vec::new();
        };
        self.dom
            .walk_depth_first(root)
            .into_iter()
            .filter(|&id| self.dom.get(id).is_some_and(|d| d.focusable && d.visible))
            .collect()
    }

    /// Focus the next element in the chain. Wraps around.
    pub fn focus_next(&mut self) -> Option<NodeId> {
        self.step_focus(true)
    }

    /// Focus the previous element in the chain. Wraps around.
    pub fn focus_previous(&mut self) -> Option<NodeId> {
        self.step_focus(false)
    }

    fn step_focus(&mut self, forward: bool) -> Option<NodeId> {
        let chain = self.focus_chain();
        if chain.is_empty() {
            return None;
        }
        let len = chain.len();
        let current = self.focused.and_then(|f| chain.iter().position(|&n| n == f));
        let index = match (current, forward) {
            (Some(i), true) => (i + 1) % len,
            (Some(0), false) | (None, false) => len - 1,
            (Some(i), false) => i - 1,
            (None, true) => 0,
        };
        let next = chain[index];
        self.focus(next);
        Some(next)
    }

    // -- terminal input ---------------------------------------------------

    /// Route a terminal event into the tree.
    ///
    /// Keys, paste and terminal focus go to the focused element (the root
    /// when nothing is focused); pointer and wheel events go to the deepest
    /// element under the pointer. An unhandled Tab / BackTab moves focus.
    /// A resize sets the root's size.
    pub fn handle_terminal_event(&mut self, event: &crossterm::event::Event) -> Vec<Rc<NativeEvent>> {
        if let crossterm::event::Event::Resize(width, height) = *event {
            if let Some(root) = self.dom.root() {
                self.set_width(root, f64::from(width));
                self.set_height(root, f64::from(height));
            }
            return Vec::new();
        }

        let mut dispatched = Vec::new();
        let mut keydown_prevented = false;
        for native in from_crossterm(event) {
            if keydown_prevented && native.kind() == NativeType::KeyPress {
                continue;
            }
            let target = match native.position() {
                Some((x, y)) => self.dom.hit_test(Point::new(x, y)),
                None => self.focused.or_else(|| self.dom.root()),
            };
            let Some(target) = target else {
                tracing::trace!(kind = %native.kind(), "no target for terminal event");
                continue;
            };
            let tab = match native.payload() {
                NativePayload::Key { key: Key::Tab, .. } => Some(true),
                NativePayload::Key { key: Key::BackTab, .. } => Some(false),
                _ => None,
            };
            let kind = native.kind();
            let native = self.dispatch_native(target, native);
            if kind == NativeType::KeyDown {
                keydown_prevented = native.is_default_prevented();
            }
            if kind == NativeType::KeyDown && !keydown_prevented {
                match tab {
                    Some(true) => {
                        self.focus_next();
                    }
                    Some(false) => {
                        self.focus_previous();
                    }
                    None => {}
                }
            }
            dispatched.push(native);
        }
        dispatched
    }
}

// ---------------------------------------------------------------------------
// FlexHost
// ---------------------------------------------------------------------------

impl FlexHost for Scene {
    type Node = NodeId;

    fn flex_container(&self, node: NodeId) -> Option<&FlexContainer> {
        self.dom.get(node)?.flex.as_ref()
    }

    fn flex_container_mut(&mut self, node: NodeId) -> Option<&mut FlexContainer> {
        self.dom.get_mut(node)?.flex.as_mut()
    }

    fn flex_item(&self, node: NodeId) -> Option<&FlexItem> {
        self.flex_item_of(node)
    }

    fn flex_children(&self, node: NodeId) -> Vec<NodeId> {
        self.dom.children(node).to_vec()
    }

    fn is_visible(&self, node: NodeId) -> bool {
        self.dom.get(node).is_some_and(|d| d.visible)
    }

    fn size_for_flexbox_layout(&self, node: NodeId, axis: Axis) -> f64 {
        self.frame(node).map_or(0.0, |f| f.size_along(axis))
    }

    fn set_position_via_flex(&mut self, node: NodeId, axis: Axis, value: f64) {
        self.apply_position(node, axis, value);
    }

    /// Cache the basis, then resize while marked as flex-updating so the
    /// child does not ask its parent for another pass.
    fn set_size_via_flex(&mut self, node: NodeId, axis: Axis, value: f64) {
        let Some(data) = self.dom.get_mut(node) else {
            return;
        };
        let current = data.frame.size_along(axis);
        if current == value {
            return;
        }
        data.flex_item.cache_basis(axis, current);
        data.flex_item.set_flex_updating(true);
        self.apply_size(node, axis, value);
        if let Some(data) = self.dom.get_mut(node) {
            data.flex_item.set_flex_updating(false);
        }
    }

    fn is_compact(&self, node: NodeId, axis: Axis) -> bool {
        self.dom.get(node).is_some_and(|d| d.is_compact(axis))
    }

    fn baseline_offset(&self, node: NodeId) -> f64 {
        self.dom.get(node).map_or(0.0, |d| d.baseline_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{
        Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers, MouseEvent, MouseEventKind,
    };
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    fn row_scene(width: f64, children: &[f64]) -> (Scene, NodeId, Vec<NodeId>) {
        let mut scene = Scene::new();
        let root = scene.create_element("root", Rect::new(0.0, 0.0, width, 10.0));
        scene.set_flex_container(root, FlexStyle::new());
        let kids = children
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                scene
                    .create_child(root, &format!("c{i}"), Rect::new(0.0, 0.0, w, 10.0))
                    .unwrap()
            })
            .collect();
        (scene, root, kids)
    }

    fn xs(scene: &Scene, nodes: &[NodeId]) -> Vec<f64> {
        nodes.iter().map(|&n| scene.frame(n).unwrap().x).collect()
    }

    fn widths(scene: &Scene, nodes: &[NodeId]) -> Vec<f64> {
        nodes.iter().map(|&n| scene.frame(n).unwrap().width).collect()
    }

    // ── layout on tree edits ────────────────────────────────────────────

    #[test]
    fn children_are_laid_out_as_they_are_added() {
        let (scene, _, kids) = row_scene(100.0, &[10.0, 20.0, 30.0]);
        assert_eq!(xs(&scene, &kids), vec![0.0, 10.0, 30.0]);
    }

    #[test]
    fn setters_fire_attribute_events_and_relayout() {
        let (mut scene, root, kids) = row_scene(100.0, &[10.0, 10.0]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let observer = scene.hub.create();
        let log = Rc::clone(&seen);
        scene.hub.define_method(observer, "onJustify", move |_, ev| {
            log.borrow_mut().push(ev.value.as_str().unwrap_or_default().to_owned());
            Ok(false)
        });
        let root_obj = scene.object(root).unwrap();
        scene.hub.attach_to(observer, root_obj, "onJustify", "justifyContent", false);

        assert!(scene.set_justify_content(root, JustifyContent::End));
        assert!(!scene.set_justify_content(root, JustifyContent::End));
        assert_eq!(*seen.borrow(), vec!["end"]);
        assert_eq!(xs(&scene, &kids), vec![80.0, 90.0]);
    }

    #[test]
    fn position_setters_fire_axis_attributes() {
        let mut scene = Scene::new();
        let root = scene.create_element("root", Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(scene.set_x(root, 3.0));
        assert!(!scene.set_x(root, 3.0));
        assert!(scene.set_y(root, 4.0));
        let obj = scene.object(root).unwrap();
        assert_eq!(scene.hub.attribute(obj, "x").as_number(), Some(3.0));
        assert_eq!(scene.hub.attribute(obj, "y").as_number(), Some(4.0));
        let frame = scene.frame(root).unwrap();
        assert_eq!((frame.x, frame.y), (3.0, 4.0));
    }

    #[test]
    fn append_child_relayouts_old_and_new_parent() {
        let mut scene = Scene::new();
        let root = scene.create_element("root", Rect::new(0.0, 0.0, 100.0, 40.0));
        let left = scene.create_child(root, "left", Rect::new(0.0, 0.0, 100.0, 10.0)).unwrap();
        let right = scene.create_child(root, "right", Rect::new(0.0, 20.0, 100.0, 10.0)).unwrap();
        scene.set_flex_container(left, FlexStyle::new());
        scene.set_flex_container(right, FlexStyle::new().justify_content(JustifyContent::End));
        let a = scene.create_child(left, "a", Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let b = scene.create_child(left, "b", Rect::new(0.0, 0.0, 20.0, 10.0)).unwrap();
        assert_eq!(xs(&scene, &[a, b]), vec![0.0, 10.0]);

        assert!(scene.append_child(right, a));
        assert_eq!(scene.frame(b).unwrap().x, 0.0);
        assert_eq!(scene.frame(a).unwrap().x, 90.0);
    }

    #[test]
    fn explicit_resize_clears_basis_and_relayouts_parent() {
        let (mut scene, _, kids) = row_scene(100.0, &[10.0, 10.0]);
        scene.set_grow(kids[0], 1.0);
        assert_eq!(widths(&scene, &kids), vec![90.0, 10.0]);
        assert_eq!(scene.flex_item_of(kids[0]).unwrap().cached_basis(Axis::Horizontal), Some(10.0));

        scene.set_width(kids[1], 30.0);
        assert_eq!(widths(&scene, &kids), vec![70.0, 30.0]);
        assert_eq!(scene.flex_item_of(kids[1]).unwrap().cached_basis(Axis::Horizontal), None);
    }

    #[test]
    fn resize_to_the_current_size_keeps_the_basis() {
        let (mut scene, _, kids) = row_scene(100.0, &[10.0, 10.0]);
        scene.set_grow(kids[0], 1.0);
        assert_eq!(widths(&scene, &kids), vec![90.0, 10.0]);

        assert!(!scene.set_width(kids[0], 90.0));
        assert_eq!(scene.flex_item_of(kids[0]).unwrap().cached_basis(Axis::Horizontal), Some(10.0));
        scene.set_width(kids[1], 30.0);
        assert_eq!(widths(&scene, &kids), vec![70.0, 30.0]);
        assert_eq!(xs(&scene, &kids), vec![0.0, 70.0]);
    }

    #[test]
    fn compact_child_resized_mid_pass_reruns_the_parent() {
        let mut scene = Scene::new();
        let root = scene.create_element("root", Rect::new(0.0, 0.0, 100.0, 100.0));
        let column = FlexStyle::new().direction(Direction::Column).align_items(AlignItems::Stretch);
        scene.set_flex_container(root, column);
        let panel = scene.create_child(root, "panel", Rect::new(0.0, 0.0, 40.0, 20.0)).unwrap();
        scene.set_flex_container(panel, FlexStyle::new().wrap(Wrap::Wrap));
        scene.set_flex_compact(panel, Axis::Vertical, true);
        scene.create_child(panel, "a", Rect::new(0.0, 0.0, 30.0, 10.0));
        scene.create_child(panel, "b", Rect::new(0.0, 0.0, 30.0, 10.0));
        assert_eq!(scene.frame(panel).unwrap().height, 20.0);

        // Stretching the panel to 100 lets its items share one flow, so it
        // shrinks to 10 while the root's pass is running.
        let footer = scene.create_child(root, "footer", Rect::new(0.0, 0.0, 100.0, 10.0)).unwrap();
        assert_eq!(scene.frame(panel).unwrap().size(), crate::geometry::Size::new(100.0, 10.0));
        assert_eq!(scene.frame(footer).unwrap().y, 10.0);
        assert_eq!(scene.update_flexbox_layout(root).map(|m| m.passes), Some(1));
    }

    #[test]
    fn hidden_and_ignored_children_do_not_participate() {
        let (mut scene, _, kids) = row_scene(100.0, &[10.0, 20.0, 30.0]);
        scene.set_visible(kids[0], false);
        assert_eq!(xs(&scene, &kids[1..]), vec![0.0, 20.0]);
        scene.set_ignore_flex(kids[1], true);
        assert_eq!(scene.frame(kids[2]).unwrap().x, 0.0);
    }

    #[test]
    fn move_and_remove_relayout() {
        let (mut scene, root, kids) = row_scene(100.0, &[10.0, 20.0, 30.0]);
        assert!(scene.move_child(root, kids[2], 0));
        assert_eq!(xs(&scene, &kids), vec![30.0, 40.0, 0.0]);
        let obj = scene.object(kids[2]).unwrap();
        assert!(scene.remove_element(kids[2]));
        assert!(!scene.hub.contains(obj));
        assert!(!scene.adapter.is_dom_observable(obj));
        assert_eq!(xs(&scene, &kids[..2]), vec![0.0, 10.0]);
    }

    #[test]
    fn paused_container_lays_out_on_resume() {
        let (mut scene, root, kids) = row_scene(100.0, &[10.0, 10.0]);
        assert!(scene.set_flexbox_paused(root, true));
        scene.set_justify_content(root, JustifyContent::Center);
        assert_eq!(xs(&scene, &kids), vec![0.0, 10.0]);
        assert!(scene.set_flexbox_paused(root, false));
        assert_eq!(xs(&scene, &kids), vec![40.0, 50.0]);
    }

    #[test]
    fn compact_container_shrinks_to_content() {
        let mut scene = Scene::new();
        let root = scene.create_element("root", Rect::new(0.0, 0.0, 200.0, 50.0));
        scene.set_flex_container(root, FlexStyle::new());
        let row = scene.create_child(root, "row", Rect::new(0.0, 0.0, 100.0, 10.0)).unwrap();
        scene.set_flex_container(row, FlexStyle::new().gap(2.0));
        scene.set_flex_compact(row, Axis::Horizontal, true);
        scene.create_child(row, "a", Rect::new(0.0, 0.0, 5.0, 4.0));
        scene.create_child(row, "b", Rect::new(0.0, 0.0, 7.0, 6.0));
        assert_eq!(scene.frame(row).unwrap().width, 14.0);
        let row_obj = scene.object(row).unwrap();
        assert_eq!(scene.hub.attribute(row_obj, "totalBasisWidth").as_number(), Some(14.0));
        assert_eq!(scene.hub.attribute(row_obj, "totalBasisHeight").as_number(), Some(6.0));
    }

    #[test]
    fn declarations_apply_through_setters() {
        let (mut scene, root, kids) = row_scene(100.0, &[10.0, 10.0]);
        assert_eq!(scene.apply_flex_declaration(root, "justify-content: space-between; gap: 5"), Ok(true));
        assert_eq!(xs(&scene, &kids), vec![0.0, 90.0]);
        assert_eq!(scene.apply_flex_item_declaration(kids[0], "flex-grow: 1"), Ok(true));
        assert_eq!(widths(&scene, &kids), vec![85.0, 10.0]);
        assert!(scene.apply_flex_declaration(root, "bogus: 1").is_err());
        let root_obj = scene.object(root).unwrap();
        assert_eq!(scene.hub.attribute(root_obj, "columnGap").as_number(), Some(5.0));
    }

    // ── focus and terminal input ────────────────────────────────────────

    fn key(code: KeyCode) -> TermEvent {
        TermEvent::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn tab_walks_the_focus_chain() {
        let (mut scene, root, kids) = row_scene(100.0, &[10.0, 10.0, 10.0]);
        for &k in &[kids[0], kids[2]] {
            scene.dom.get_mut(k).unwrap().focusable = true;
        }
        assert_eq!(scene.focus_chain(), vec![kids[0], kids[2]]);
        scene.handle_terminal_event(&key(KeyCode::Tab));
        assert_eq!(scene.focused(), Some(kids[0]));
        scene.handle_terminal_event(&key(KeyCode::Tab));
        assert_eq!(scene.focused(), Some(kids[2]));
        scene.handle_terminal_event(&key(KeyCode::BackTab));
        assert_eq!(scene.focused(), Some(kids[0]));
        assert!(!scene.focus(root));
    }

    #[test]
    fn keys_go_to_focused_and_clicks_to_hit_element() {
        let (mut scene, root, kids) = row_scene(100.0, &[10.0, 10.0]);
        scene.dom.get_mut(kids[1]).unwrap().focusable = true;
        scene.focus(kids[1]);
        let observer = scene.hub.create();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        scene.hub.define_method(observer, "h", move |hub, ev| {
            log.borrow_mut().push(format!("{}:{}", ev.kind, hub.name(ev.source)));
            Ok(true)
        });
        scene.attach_to_dom(observer, root, "h", NativeType::KeyDown, false, false);
        scene.attach_to_dom(observer, root, "h", NativeType::MouseDown, false, false);

        scene.handle_terminal_event(&key(KeyCode::Char('x')));
        scene.handle_terminal_event(&TermEvent::Mouse(MouseEvent {
            kind: MouseEventKind::Down(crossterm::event::MouseButton::Left),
            column: 3,
            row: 1,
            modifiers: KeyModifiers::NONE,
        }));
        assert_eq!(*seen.borrow(), vec!["keydown:root", "mousedown:root"]);

        let natives = scene.handle_terminal_event(&TermEvent::Mouse(MouseEvent {
            kind: MouseEventKind::Up(crossterm::event::MouseButton::Left),
            column: 12,
            row: 1,
            modifiers: KeyModifiers::NONE,
        }));
        let targets: Vec<_> = natives.iter().map(|n| n.target()).collect();
        assert_eq!(targets, vec![scene.object(kids[1]); 2]);
    }

    #[test]
    fn prevented_keydown_suppresses_keypress() {
        let (mut scene, root, _) = row_scene(100.0, &[10.0]);
        let observer = scene.hub.create();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for (name, proceed) in [("down", false), ("press", true)] {
            let log = Rc::clone(&seen);
            scene.hub.define_method(observer, name, move |_, ev| {
                log.borrow_mut().push(ev.kind.to_string());
                Ok(proceed)
            });
        }
        scene.attach_to_dom(observer, root, "down", NativeType::KeyDown, false, false);
        scene.attach_to_dom(observer, root, "press", NativeType::KeyPress, false, false);

        let natives = scene.handle_terminal_event(&key(KeyCode::Char('q')));
        assert_eq!(*seen.borrow(), vec!["keydown"]);
        assert_eq!(natives.len(), 1);
        assert!(natives[0].is_default_prevented());

        scene.detach_from_dom(observer, root, "down", NativeType::KeyDown, false);
        scene.handle_terminal_event(&key(KeyCode::Char('q')));
        assert_eq!(*seen.borrow(), vec!["keydown", "keypress"]);
    }

    #[test]
    fn resize_sets_root_size() {
        let (mut scene, root, _) = row_scene(100.0, &[10.0]);
        scene.handle_terminal_event(&TermEvent::Resize(80, 24));
        assert_eq!(scene.frame(root).unwrap().size(), crate::geometry::Size::new(80.0, 24.0));
    }
}
