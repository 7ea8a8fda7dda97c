//! # myt-core
//!
//! The event core and box layout of the myt widget toolkit.
//!
//! Every element is backed by an event object in a [`Hub`](event::Hub).
//! Objects observe each other through typed events, react to native input
//! dispatched through the element tree, and lay out their children with a
//! flexbox engine.
//!
//! ## Core Systems
//!
//! - **[`event`]**: observable/observer hub, event values, constraints, native input
//! - **[`dom`]**: slotmap-backed element tree and the DOM event adapter
//! - **[`layout`]**: flexbox style, container/item state, the layout pass, declarations
//! - **[`scene`]**: hub, tree and adapter wired together; focus and terminal input
//! - **[`geometry`]**: Point, Size, Rect, Axis primitives
//!
//! ## Example
//!
//! ```
//! use myt_core::geometry::Rect;
//! use myt_core::layout::{FlexStyle, JustifyContent};
//! use myt_core::scene::Scene;
//!
//! let mut scene = Scene::new();
//! let root = scene.create_element("root", Rect::new(0.0, 0.0, 300.0, 20.0));
//! scene.set_flex_container(root, FlexStyle::new().justify_content(JustifyContent::SpaceBetween));
//! let a = scene.create_child(root, "a", Rect::new(0.0, 0.0, 100.0, 20.0)).unwrap();
//! let b = scene.create_child(root, "b", Rect::new(0.0, 0.0, 50.0, 20.0)).unwrap();
//! assert_eq!(scene.frame(a).unwrap().x, 0.0);
//! assert_eq!(scene.frame(b).unwrap().x, 250.0);
//! ```

// Foundation
pub mod geometry;

// Events
pub mod event;

// Tree and layout
pub mod dom;
pub mod layout;

// Integration
pub mod scene;
