//! Element arena and the DOM event adapter.
//!
//! The [`Dom`] is a slotmap-backed element tree; each element is paired with
//! an event object in the [`Hub`](crate::event::Hub). [`DomAdapter`] wires
//! native events dispatched through the tree to hub handlers.

pub mod events;
pub mod node;
pub mod tree;

pub use events::{create_dom_handler, dispatch_native, DomAdapter, DomRegistration, DomSubscription};
pub use node::{ElementData, ElementListener, ListenerId, NativeHandler, NodeId};
pub use tree::Dom;
