//! Flexbox layout: style keywords, container/item state, the layout pass,
//! and declaration parsing.

pub mod child;
pub mod container;
pub mod declaration;
pub mod engine;
pub mod style;

pub use child::FlexItem;
pub use container::FlexContainer;
pub use declaration::{parse_flex_item_style, parse_flex_style, DeclarationError};
pub use engine::{update_flexbox_layout, FlexHost, FlexMetrics};
pub use style::{
    AlignContent, AlignItems, AlignSelf, Direction, FlexItemStyle, FlexStyle, JustifyContent, KeywordError, Wrap,
};
