//! Item-side flexbox state.
//!
//! An item remembers its pre-flex ("basis") size the first time the layout
//! resizes it, so later passes grow from the natural size rather than from
//! an already-grown one. Any resize not driven by the layout clears the
//! cache.

use crate::geometry::Axis;

use super::style::{clamp_grow, AlignSelf, FlexItemStyle};

/// Flexbox state carried by every element that can be laid out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlexItem {
    style: FlexItemStyle,
    basis_width: Option<f64>,
    basis_height: Option<f64>,
    flex_updating: bool,
}

impl FlexItem {
    pub fn new(style: FlexItemStyle) -> Self {
        Self {
            style: FlexItemStyle {
                grow: clamp_grow(style.grow),
                ..style
            },
            ..Self::default()
        }
    }

    pub fn style(&self) -> FlexItemStyle {
        self.style
    }

    pub fn grow(&self) -> f64 {
        self.style.grow
    }

    pub fn set_grow(&mut self, grow: f64) {
        self.style.grow = clamp_grow(grow);
    }

    pub fn align_self(&self) -> AlignSelf {
        self.style.align_self
    }

    pub fn set_align_self(&mut self, align: AlignSelf) {
        self.style.align_self = align;
    }

    pub fn ignore_flex(&self) -> bool {
        self.style.ignore_flex
    }

    pub fn set_ignore_flex(&mut self, ignore: bool) {
        self.style.ignore_flex = ignore;
    }

    /// Whether the layout is currently resizing this item.
    pub fn is_flex_updating(&self) -> bool {
        self.flex_updating
    }

    pub(crate) fn set_flex_updating(&mut self, updating: bool) {
        self.flex_updating = updating;
    }

    /// Remember `current` as the basis along `axis` unless one is cached.
    pub fn cache_basis(&mut self, axis: Axis, current: f64) {
        let slot = self.slot(axis);
        if slot.is_none() {
            *slot = Some(current);
        }
    }

    /// Forget the cached basis along `axis`.
    pub fn clear_basis(&mut self, axis: Axis) {
        *self.slot(axis) = None;
    }

    pub fn cached_basis(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::Horizontal => self.basis_width,
            Axis::Vertical => self.basis_height,
        }
    }

    /// The cached basis along `axis`, or `current` when none is cached.
    pub fn flex_basis(&self, axis: Axis, current: f64) -> f64 {
        self.cached_basis(axis).unwrap_or(current)
    }

    pub fn flex_basis_width(&self, current: f64) -> f64 {
        self.flex_basis(Axis::Horizontal, current)
    }

    pub fn flex_basis_height(&self, current: f64) -> f64 {
        self.flex_basis(Axis::Vertical, current)
    }

    fn slot(&mut self, axis: Axis) -> &mut Option<f64> {
        match axis {
            Axis::Horizontal => &mut self.basis_width,
            Axis::Vertical => &mut self.basis_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basis_is_cached_once() {
        let mut item = FlexItem::default();
        assert_eq!(item.flex_basis_width(40.0), 40.0);
        item.cache_basis(Axis::Horizontal, 40.0);
        item.cache_basis(Axis::Horizontal, 90.0);
        assert_eq!(item.flex_basis_width(90.0), 40.0);
        assert_eq!(item.flex_basis_height(7.0), 7.0);
    }

    #[test]
    fn clearing_restores_current_size() {
        let mut item = FlexItem::default();
        item.cache_basis(Axis::Vertical, 10.0);
        item.clear_basis(Axis::Vertical);
        assert_eq!(item.cached_basis(Axis::Vertical), None);
        assert_eq!(item.flex_basis_height(25.0), 25.0);
    }

    #[test]
    fn grow_is_clamped() {
        let mut item = FlexItem::new(FlexItemStyle { grow: -2.0, ..FlexItemStyle::default() });
        assert_eq!(item.grow(), 0.0);
        item.set_grow(3.0);
        assert_eq!(item.grow(), 3.0);
        item.set_grow(-1.0);
        assert_eq!(item.grow(), 0.0);
    }
}
