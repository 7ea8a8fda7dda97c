//! Tree operations: insert, remove, reparent, reorder, walk, hit testing,
//! native listener storage.

use std::collections::{HashMap, VecDeque};

use slotmap::{SecondaryMap, SlotMap};

use crate::event::{NativeType, ObjectId};
use crate::geometry::{Point, Rect};

use super::node::{ElementData, ElementListener, ListenerId, NativeHandler, NodeId};

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

/// The element tree, backed by a slotmap arena.
///
/// All elements live in a single `SlotMap`. Parent/child relationships are
/// stored in secondary maps so that removal is O(subtree size) and lookup is
/// O(1).
#[derive(Debug)]
pub struct Dom {
    pub(crate) nodes: SlotMap<NodeId, ElementData>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
    by_object: HashMap<ObjectId, NodeId>,
    root: Option<NodeId>,
    next_listener: u64,
}

impl Dom {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            by_object: HashMap::new(),
            root: None,
            next_listener: 0,
        }
    }

    /// Insert a root-level element (no parent).
    ///
    /// If no root has been set yet, this element becomes the root.
    pub fn insert(&mut self, data: ElementData) -> NodeId {
        let object = data.object;
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        self.by_object.insert(object, id);
        if self.root.is_none() {
            self.root = Some(id);
        }
        id
    }

    /// Insert an element as the last child of `parent`.
    ///
    /// Returns `None` (and inserts nothing) if `parent` does not exist.
    pub fn insert_child(&mut self, parent: NodeId, data: ElementData) -> Option<NodeId> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        let object = data.object;
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        self.parent.insert(id, parent);
        self.by_object.insert(object, id);
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.push(id);
        }
        Some(id)
    }

    /// Remove an element and all its descendants.
    ///
    /// Returns the removed elements, the subtree root first.
    pub fn remove(&mut self, id: NodeId) -> Vec<(NodeId, ElementData)> {
        if !self.nodes.contains_key(id) {
            return Vec::new();
        }

        if let Some(parent_id) = self.parent.remove(id) {
            if let Some(siblings) = self.children.get_mut(parent_id) {
                siblings.retain(|&child| child != id);
            }
        }
        if self.root == Some(id) {
            self.root = None;
        }

        let mut to_remove = VecDeque::new();
        to_remove.push_back(id);
        let mut removed = Vec::new();
        while let Some(current) = to_remove.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                to_remove.extend(kids);
            }
            self.parent.remove(current);
            if let Some(data) = self.nodes.remove(current) {
                self.by_object.remove(&data.object);
                removed.push((current, data));
            }
        }
        removed
    }

    /// Move `node` to become the last child of `new_parent`.
    ///
    /// Returns `false` if either element is missing or `new_parent` lies
    /// inside `node`'s subtree.
    pub fn reparent(&mut self, node: NodeId, new_parent: NodeId) -> bool {
        if !self.contains(node) || !self.contains(new_parent) {
            return false;
        }
        if node == new_parent || self.ancestors(new_parent).contains(&node) {
            return false;
        }
        if let Some(old_parent) = self.parent.remove(node) {
            if let Some(siblings) = self.children.get_mut(old_parent) {
                siblings.retain(|&child| child != node);
            }
        }
        if self.root == Some(node) {
            self.root = None;
        }
        self.parent.insert(node, new_parent);
        if let Some(siblings) = self.children.get_mut(new_parent) {
            siblings.push(node);
        }
        true
    }

    /// Move `child` to position `index` among its siblings (clamped).
    pub fn move_child(&mut self, parent: NodeId, child: NodeId, index: usize) -> bool {
        let Some(siblings) = self.children.get_mut(parent) else {
            return false;
        };
        let Some(from) = siblings.iter().position(|&c| c == child) else {
            return false;
        };
        siblings.remove(from);
        let to = index.min(siblings.len());
        siblings.insert(to, child);
        from != to
    }

    /// Position of `child` among its siblings.
    pub fn index_of(&self, child: NodeId) -> Option<usize> {
        let parent = self.parent(child)?;
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Get the parent of an element, if it has one.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Children in document order. Empty if the element has none or does not
    /// exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(EMPTY_CHILDREN)
    }

    /// Ancestors of `id`, starting with the immediate parent and ending at
    /// the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    pub fn get(&self, id: NodeId) -> Option<&ElementData> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.nodes.get_mut(id)
    }

    /// The element represented by an event object.
    pub fn node_for_object(&self, object: ObjectId) -> Option<NodeId> {
        self.by_object.get(&object).copied()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            // Push children in reverse so the first child is visited first.
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    // -- geometry ---------------------------------------------------------

    /// Frame of `id` in root coordinates.
    pub fn absolute_frame(&self, id: NodeId) -> Option<Rect> {
        let frame = self.get(id)?.frame;
        let offset = self
            .ancestors(id)
            .iter()
            .filter_map(|&a| self.get(a))
            .fold(Point::ZERO, |acc, data| acc + data.frame.origin());
        Some(frame.translate(offset))
    }

    /// Deepest visible element under `point` (root coordinates). Later
    /// siblings are on top.
    pub fn hit_test(&self, point: Point) -> Option<NodeId> {
        let root = self.root?;
        self.hit_test_from(root, point)
    }

    fn hit_test_from(&self, node: NodeId, point: Point) -> Option<NodeId> {
        let data = self.get(node)?;
        if !data.visible || !data.frame.contains(point) {
            return None;
        }
        let local = point - data.frame.origin();
        self.children(node)
            .iter()
            .rev()
            .find_map(|&child| self.hit_test_from(child, local))
            .or(Some(node))
    }

    // -- native listeners -------------------------------------------------

    /// Register a native listener on an element.
    pub fn add_listener(
        &mut self,
        id: NodeId,
        kind: NativeType,
        capture: bool,
        passive: bool,
        handler: NativeHandler,
    ) -> Option<ListenerId> {
        let data = self.nodes.get_mut(id)?;
        self.next_listener += 1;
        let listener = ListenerId(self.next_listener);
        data.listeners.push(ElementListener {
            id: listener,
            kind,
            capture,
            passive,
            handler,
        });
        Some(listener)
    }

    pub fn remove_listener(&mut self, id: NodeId, listener: ListenerId) -> bool {
        let Some(data) = self.nodes.get_mut(id) else {
            return false;
        };
        let before = data.listeners.len();
        data.listeners.retain(|l| l.id != listener);
        data.listeners.len() != before
    }

    /// Snapshot of the listeners for `kind` on `id`, in registration order.
    pub fn listeners_for(&self, id: NodeId, kind: NativeType) -> Vec<ElementListener> {
        self.get(id)
            .map(|data| data.listeners.iter().filter(|l| l.kind == kind).cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}
