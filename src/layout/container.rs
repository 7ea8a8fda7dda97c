//! Container-side flexbox state.

use super::style::FlexStyle;

/// Flexbox state carried by an element that lays out its children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlexContainer {
    pub style: FlexStyle,
    /// Layout requests are ignored while paused.
    pub paused: bool,
    pub(crate) updating: bool,
    pub(crate) update_again: bool,
    pub(crate) total_basis_width: f64,
    pub(crate) total_basis_height: f64,
}

impl FlexContainer {
    pub fn new(style: FlexStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    /// Whether a layout pass may start now.
    pub fn is_ok_to_update_layout(&self) -> bool {
        !self.paused && !self.updating
    }

    /// Whether a pass is running.
    pub fn is_updating(&self) -> bool {
        self.updating
    }

    /// Horizontal extent consumed by the last pass.
    pub fn total_basis_width(&self) -> f64 {
        self.total_basis_width
    }

    /// Vertical extent consumed by the last pass.
    pub fn total_basis_height(&self) -> f64 {
        self.total_basis_height
    }
}
