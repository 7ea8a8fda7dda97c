//! Element types: NodeId, ElementData, native listeners.

use std::fmt;
use std::rc::Rc;

use slotmap::new_key_type;

use crate::event::{Hub, NativeEvent, NativeType, ObjectId};
use crate::geometry::{Axis, Rect};
use crate::layout::{FlexContainer, FlexItem, FlexItemStyle, FlexStyle};

new_key_type! {
    /// Unique identifier for an element. Copy, lightweight (u64).
    pub struct NodeId;
}

/// Identifies one native listener registered on an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

/// Closure run when a native event reaches an element.
pub type NativeHandler = Rc<dyn Fn(&mut Hub, &Rc<NativeEvent>)>;

/// A native listener as the element stores it.
#[derive(Clone)]
pub struct ElementListener {
    pub id: ListenerId,
    pub kind: NativeType,
    pub capture: bool,
    pub passive: bool,
    pub handler: NativeHandler,
}

impl fmt::Debug for ElementListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementListener")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("capture", &self.capture)
            .field("passive", &self.passive)
            .finish_non_exhaustive()
    }
}

/// Data associated with a single element.
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Element name, used in logs and snapshots.
    pub name: String,
    /// The event object that represents this element in the hub.
    pub object: ObjectId,
    pub visible: bool,
    pub focusable: bool,
    /// Position relative to the parent, and size.
    pub frame: Rect,
    /// Present when the element lays out its children.
    pub flex: Option<FlexContainer>,
    pub flex_item: FlexItem,
    /// Shrink-wrap to content after a layout pass.
    pub compact_width: bool,
    pub compact_height: bool,
    pub baseline_offset: f64,
    pub(crate) listeners: Vec<ElementListener>,
}

impl ElementData {
    pub fn new(name: impl Into<String>, object: ObjectId) -> Self {
        Self {
            name: name.into(),
            object,
            visible: true,
            focusable: false,
            frame: Rect::EMPTY,
            flex: None,
            flex_item: FlexItem::default(),
            compact_width: false,
            compact_height: false,
            baseline_offset: 0.0,
            listeners: Vec::new(),
        }
    }

    pub fn with_frame(mut self, frame: Rect) -> Self {
        self.frame = frame;
        self
    }

    /// Make this element a flex container (builder).
    pub fn with_flex(mut self, style: FlexStyle) -> Self {
        self.flex = Some(FlexContainer::new(style));
        self
    }

    pub fn with_item(mut self, style: FlexItemStyle) -> Self {
        self.flex_item = FlexItem::new(style);
        self
    }

    pub fn focusable(mut self, focusable: bool) -> Self {
        self.focusable = focusable;
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn is_compact(&self, axis: Axis) -> bool {
        match axis {
            Axis::Horizontal => self.compact_width,
            Axis::Vertical => self.compact_height,
        }
    }

    pub fn set_compact(&mut self, axis: Axis, compact: bool) {
        match axis {
            Axis::Horizontal => self.compact_width = compact,
            Axis::Vertical => self.compact_height = compact,
        }
    }

    /// Listeners registered on this element, in registration order.
    pub fn listeners(&self) -> &[ElementListener] {
        &self.listeners
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object() -> ObjectId {
        Hub::new().create()
    }

    #[test]
    fn new_defaults() {
        let data = ElementData::new("button", object());
        assert_eq!(data.name, "button");
        assert!(data.visible);
        assert!(!data.focusable);
        assert!(data.flex.is_none());
        assert_eq!(data.frame, Rect::EMPTY);
        assert!(data.listeners().is_empty());
    }

    #[test]
    fn builders() {
        let data = ElementData::new("row", object())
            .with_frame(Rect::new(1.0, 2.0, 30.0, 4.0))
            .with_flex(FlexStyle::new().gap(2.0))
            .with_item(FlexItemStyle::new().grow(1.0))
            .focusable(true)
            .visible(false);
        assert_eq!(data.frame.width, 30.0);
        assert_eq!(data.flex.map(|c| c.style.row_gap), Some(2.0));
        assert_eq!(data.flex_item.grow(), 1.0);
        assert!(data.focusable);
        assert!(!data.visible);
    }

    #[test]
    fn compact_flags_per_axis() {
        let mut data = ElementData::new("x", object());
        data.set_compact(Axis::Vertical, true);
        assert!(data.is_compact(Axis::Vertical));
        assert!(!data.is_compact(Axis::Horizontal));
    }

    #[test]
    fn node_id_is_copy() {
        fn assert_copy<T: Copy>() {}
        assert_copy::<NodeId>();
    }
}
