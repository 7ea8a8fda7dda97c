//! Event core: observable/observer objects, values, and native input.
//!
//! All state lives in a [`Hub`]. Any object can be observed (it owns
//! listener lists and fires events) and can observe others (it records its
//! subscriptions and constraints so teardown is symmetric).
//!
//! Invalid arguments never panic or return an error to the caller: the
//! operation logs a warning and returns `false`. Handler failures are logged
//! with their cause chain and dispatch continues.

pub mod error;
pub mod hub;
pub mod native;
pub mod observable;
pub mod observer;
pub mod value;

pub use error::{dump_error, EventError, HandlerError};
pub use hub::{Hub, Listener, ObjectId};
pub use native::{
    from_crossterm, Category, Key, Modifiers, MouseButton, NativeEvent, NativePayload, NativeType, Phase, Pointer,
};
pub use value::{Callback, Event, EventType, HandlerRef, HandlerResult, MethodName, Value};
