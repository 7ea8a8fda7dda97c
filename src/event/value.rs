//! Event payloads: [`Value`], [`Event`], and handler references.
//!
//! A handler is either a named method resolved on the subscriber when the
//! event fires ([`HandlerRef::Method`]) or a callback compared by pointer
//! identity ([`HandlerRef::Callback`]).
//!
//! # Return value polarity
//!
//! Handlers return `Ok(bool)`, and the two dispatchers read that bool in
//! opposite directions:
//!
//! - [`Hub::fire`]: `Ok(true)` means the event was *consumed*; dispatch stops.
//! - DOM handlers (see [`crate::dom::events`]): `Ok(true)` means *allow
//!   bubbling*; `Ok(false)` stops propagation and may prevent the default
//!   action.
//!
//! Call sites rely on each polarity. Do not unify them.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use super::error::HandlerError;
use super::hub::{Hub, ObjectId};
use super::native::NativeEvent;

/// Name of an event type (`"width"`, `"keydown"`, ...).
pub type EventType = Cow<'static, str>;

/// Name of a method defined on an event object.
pub type MethodName = Cow<'static, str>;

/// What a handler returns. See the module docs for the meaning of the bool.
pub type HandlerResult = Result<bool, HandlerError>;

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// Dynamic payload carried by events and stored as object attributes.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Reference to another event object.
    Object(ObjectId),
    /// A native input event, shared with the dispatcher that owns it.
    Native(Rc<NativeEvent>),
}

impl Value {
    /// Truthiness in the toolkit's sense: null, false, 0, NaN and the empty
    /// string are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
            Value::Object(_) | Value::Native(_) => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_native(&self) -> Option<&NativeEvent> {
        match self {
            Value::Native(ev) => Some(ev),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(f64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Value::Object(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// The value passed to handlers: who fired, what type, and the payload.
///
/// A fresh `Event` is built for every dispatch; handlers receive it by
/// reference and must clone what they want to keep.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub source: ObjectId,
    pub kind: EventType,
    pub value: Value,
}

impl Event {
    pub fn new(source: ObjectId, kind: impl Into<EventType>, value: impl Into<Value>) -> Self {
        Self {
            source,
            kind: kind.into(),
            value: value.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Callback / HandlerRef
// ---------------------------------------------------------------------------

/// A shareable handler closure. Equality is pointer identity.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&mut Hub, &Event) -> HandlerResult>);

impl Callback {
    pub fn new(f: impl Fn(&mut Hub, &Event) -> HandlerResult + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub(crate) fn call(&self, hub: &mut Hub, event: &Event) -> HandlerResult {
        (self.0)(hub, event)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

/// How a subscription names its handler.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerRef {
    /// A method defined on the subscriber, looked up when the event fires.
    Method(MethodName),
    /// A closure invoked directly.
    Callback(Callback),
}

impl HandlerRef {
    /// An empty method name is treated as a missing handler.
    pub fn is_missing(&self) -> bool {
        matches!(self, HandlerRef::Method(name) if name.is_empty())
    }

    pub fn method_name(&self) -> Option<&str> {
        match self {
            HandlerRef::Method(name) => Some(name),
            HandlerRef::Callback(_) => None,
        }
    }
}

impl From<&'static str> for HandlerRef {
    fn from(name: &'static str) -> Self {
        HandlerRef::Method(Cow::Borrowed(name))
    }
}

impl From<String> for HandlerRef {
    fn from(name: String) -> Self {
        HandlerRef::Method(Cow::Owned(name))
    }
}

impl From<MethodName> for HandlerRef {
    fn from(name: MethodName) -> Self {
        HandlerRef::Method(name)
    }
}

impl From<Callback> for HandlerRef {
    fn from(cb: Callback) -> Self {
        HandlerRef::Callback(cb)
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerRef::Method(name) => f.write_str(name),
            HandlerRef::Callback(cb) => write!(f, "{cb:?}"),
        }
    }
}
