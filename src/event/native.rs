//! Native input events.
//!
//! [`NativeType`] names every native event type the DOM adapter understands,
//! grouped into [`Category`]s. [`NativeEvent`] is the payload handed to DOM
//! handlers inside [`Value::Native`](super::Value::Native); its dispatch
//! state lives in `Cell`s so handlers can stop propagation through a shared
//! reference.
//!
//! Terminal input arrives as crossterm events and is converted with
//! [`from_crossterm`] so nothing else in the crate depends on crossterm.

use std::cell::Cell;
use std::fmt;
use std::ops::{BitAnd, BitOr};
use std::str::FromStr;

use super::error::EventError;
use super::hub::ObjectId;

// ---------------------------------------------------------------------------
// Category / NativeType
// ---------------------------------------------------------------------------

/// Families of native events a DOM observable can opt into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Key,
    Mouse,
    Scroll,
    Touch,
    Focus,
    Input,
    DragDrop,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Key,
        Category::Mouse,
        Category::Scroll,
        Category::Touch,
        Category::Focus,
        Category::Input,
        Category::DragDrop,
    ];

    /// Every native type in this category.
    pub fn event_types(self) -> &'static [NativeType] {
        use NativeType::*;
        match self {
            Category::Key => &[KeyDown, KeyUp, KeyPress],
            Category::Mouse => &[MouseOver, MouseOut, MouseDown, MouseUp, MouseMove, Click, DblClick, ContextMenu],
            Category::Scroll => &[Scroll, Wheel],
            Category::Touch => &[TouchStart, TouchEnd, TouchMove, TouchCancel],
            Category::Focus => &[Focus, Blur, FocusIn, FocusOut],
            Category::Input => &[Input, Select, Change, Paste],
            Category::DragDrop => &[DragStart, Drag, DragEnd, DragEnter, DragOver, DragLeave, Drop],
        }
    }

    /// Types whose default action is prevented when a handler stops them.
    pub fn prevent_default_types(self) -> &'static [NativeType] {
        use NativeType::*;
        match self {
            Category::Key => &[KeyDown, KeyPress],
            Category::Mouse => &[ContextMenu],
            Category::Scroll => &[Wheel],
            Category::Touch => &[TouchMove],
            Category::Focus | Category::Input => &[],
            Category::DragDrop => &[DragEnter, DragOver, Drop],
        }
    }
}

/// A native event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    KeyDown,
    KeyUp,
    KeyPress,
    MouseOver,
    MouseOut,
    MouseDown,
    MouseUp,
    MouseMove,
    Click,
    DblClick,
    ContextMenu,
    Scroll,
    Wheel,
    TouchStart,
    TouchEnd,
    TouchMove,
    TouchCancel,
    Focus,
    Blur,
    FocusIn,
    FocusOut,
    Input,
    Select,
    Change,
    Paste,
    DragStart,
    Drag,
    DragEnd,
    DragEnter,
    DragOver,
    DragLeave,
    Drop,
}

impl NativeType {
    /// The lowercase DOM name, also used as the hub event type.
    pub fn as_str(self) -> &'static str {
        use NativeType::*;
        match self {
            KeyDown => "keydown",
            KeyUp => "keyup",
            KeyPress => "keypress",
            MouseOver => "mouseover",
            MouseOut => "mouseout",
            MouseDown => "mousedown",
            MouseUp => "mouseup",
            MouseMove => "mousemove",
            Click => "click",
            DblClick => "dblclick",
            ContextMenu => "contextmenu",
            Scroll => "scroll",
            Wheel => "wheel",
            TouchStart => "touchstart",
            TouchEnd => "touchend",
            TouchMove => "touchmove",
            TouchCancel => "touchcancel",
            Focus => "focus",
            Blur => "blur",
            FocusIn => "focusin",
            FocusOut => "focusout",
            Input => "input",
            Select => "select",
            Change => "change",
            Paste => "paste",
            DragStart => "dragstart",
            Drag => "drag",
            DragEnd => "dragend",
            DragEnter => "dragenter",
            DragOver => "dragover",
            DragLeave => "dragleave",
            Drop => "drop",
        }
    }

    pub fn category(self) -> Category {
        Category::ALL
            .into_iter()
            .find(|c| c.event_types().contains(&self))
            .unwrap_or(Category::Input)
    }

    /// Whether a stopping handler also prevents the default action.
    pub fn prevents_default(self) -> bool {
        self.category().prevent_default_types().contains(&self)
    }

    /// Whether dispatch continues past the target to its ancestors.
    /// `focus`, `blur` and `scroll` stop at the target; `focusin` and
    /// `focusout` are their bubbling counterparts.
    pub fn bubbles(self) -> bool {
        !matches!(self, NativeType::Focus | NativeType::Blur | NativeType::Scroll)
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NativeType {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .flat_map(|c| c.event_types())
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| EventError::UnknownNativeType(s.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Key / Modifiers
// ---------------------------------------------------------------------------

/// Keyboard key, decoupled from crossterm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Tab,
    BackTab,
    Backspace,
    Delete,
    Insert,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
    Unidentified,
}

impl Key {
    /// Whether the key produces a character (and hence a `keypress`).
    pub fn is_character(self) -> bool {
        matches!(self, Key::Char(_))
    }

    /// DOM `key` name: the character itself, or a named key such as
    /// `"ArrowLeft"`.
    pub fn name(self) -> String {
        match self {
            Key::Char(c) => c.to_string(),
            Key::F(n) => format!("F{n}"),
            other => {
                let name = match other {
                    Key::Enter => "Enter",
                    Key::Escape => "Escape",
                    Key::Tab | Key::BackTab => "Tab",
                    Key::Backspace => "Backspace",
                    Key::Delete => "Delete",
                    Key::Insert => "Insert",
                    Key::Left => "ArrowLeft",
                    Key::Right => "ArrowRight",
                    Key::Up => "ArrowUp",
                    Key::Down => "ArrowDown",
                    Key::Home => "Home",
                    Key::End => "End",
                    Key::PageUp => "PageUp",
                    Key::PageDown => "PageDown",
                    _ => "Unidentified",
                };
                name.to_owned()
            }
        }
    }
}

/// Modifier key bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(pub u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const SHIFT: Modifiers = Modifiers(1);
    pub const CTRL: Modifiers = Modifiers(2);
    pub const ALT: Modifiers = Modifiers(4);
    pub const META: Modifiers = Modifiers(8);

    /// Check whether `self` contains all the bits in `other`.
    pub fn contains(self, other: Modifiers) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;
    fn bitor(self, rhs: Self) -> Self::Output {
        Modifiers(self.0 | rhs.0)
    }
}

impl BitAnd for Modifiers {
    type Output = Modifiers;
    fn bitand(self, rhs: Self) -> Self::Output {
        Modifiers(self.0 & rhs.0)
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Pointer position in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
    pub button: Option<MouseButton>,
    pub modifiers: Modifiers,
}

/// Type-specific data of a native event.
#[derive(Debug, Clone, PartialEq)]
pub enum NativePayload {
    None,
    Key { key: Key, modifiers: Modifiers },
    Pointer(Pointer),
    Wheel { pointer: Pointer, delta_x: f64, delta_y: f64 },
    Text(String),
}

/// Dispatch phase of a native event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

// ---------------------------------------------------------------------------
// NativeEvent
// ---------------------------------------------------------------------------

/// One native event travelling through capture and bubble.
#[derive(Debug, Clone)]
pub struct NativeEvent {
    kind: NativeType,
    payload: NativePayload,
    target: Cell<Option<ObjectId>>,
    current_target: Cell<Option<ObjectId>>,
    phase: Cell<Phase>,
    propagation_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
    passive: Cell<bool>,
}

impl NativeEvent {
    pub fn new(kind: NativeType, payload: NativePayload) -> Self {
        Self {
            kind,
            payload,
            target: Cell::new(None),
            current_target: Cell::new(None),
            phase: Cell::new(Phase::None),
            propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
            passive: Cell::new(false),
        }
    }

    pub fn key(key: Key, modifiers: Modifiers, kind: NativeType) -> Self {
        Self::new(kind, NativePayload::Key { key, modifiers })
    }

    pub fn pointer(kind: NativeType, x: f64, y: f64, button: Option<MouseButton>) -> Self {
        Self::new(
            kind,
            NativePayload::Pointer(Pointer {
                x,
                y,
                button,
                modifiers: Modifiers::NONE,
            }),
        )
    }

    pub fn kind(&self) -> NativeType {
        self.kind
    }

    pub fn payload(&self) -> &NativePayload {
        &self.payload
    }

    /// Position of pointer and wheel events.
    pub fn position(&self) -> Option<(f64, f64)> {
        match &self.payload {
            NativePayload::Pointer(p) | NativePayload::Wheel { pointer: p, .. } => Some((p.x, p.y)),
            _ => None,
        }
    }

    /// The event object of the element the event was dispatched to.
    pub fn target(&self) -> Option<ObjectId> {
        self.target.get()
    }

    /// The event object whose listeners are running.
    pub fn current_target(&self) -> Option<ObjectId> {
        self.current_target.get()
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    /// No-op while a passive listener runs.
    pub fn prevent_default(&self) {
        if !self.passive.get() {
            self.default_prevented.set(true);
        }
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub(crate) fn set_target(&self, target: ObjectId) {
        self.target.set(Some(target));
    }

    pub(crate) fn set_current_target(&self, current: Option<ObjectId>) {
        self.current_target.set(current);
    }

    pub(crate) fn set_phase(&self, phase: Phase) {
        self.phase.set(phase);
    }

    pub(crate) fn set_passive(&self, passive: bool) {
        self.passive.set(passive);
    }
}

// ---------------------------------------------------------------------------
// From<crossterm> conversions
// ---------------------------------------------------------------------------

fn convert_modifiers(m: crossterm::event::KeyModifiers) -> Modifiers {
    use crossterm::event::KeyModifiers;
    let mut out = Modifiers::NONE;
    if m.contains(KeyModifiers::SHIFT) {
        out = out | Modifiers::SHIFT;
    }
    if m.contains(KeyModifiers::CONTROL) {
        out = out | Modifiers::CTRL;
    }
    if m.contains(KeyModifiers::ALT) {
        out = out | Modifiers::ALT;
    }
    if m.contains(KeyModifiers::SUPER) || m.contains(KeyModifiers::META) {
        out = out | Modifiers::META;
    }
    out
}

fn convert_key(code: crossterm::event::KeyCode) -> Key {
    use crossterm::event::KeyCode;
    match code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => Key::BackTab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Insert => Key::Insert,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::F(n) => Key::F(n),
        _ => Key::Unidentified,
    }
}

fn convert_mouse_button(b: crossterm::event::MouseButton) -> MouseButton {
    match b {
        crossterm::event::MouseButton::Left => MouseButton::Left,
        crossterm::event::MouseButton::Right => MouseButton::Right,
        crossterm::event::MouseButton::Middle => MouseButton::Middle,
    }
}

/// Convert one crossterm event into the native events it produces, in
/// dispatch order.
///
/// A key press yields `keydown` plus `keypress` for character keys; a left
/// button release yields `mouseup` then `click`; a right button press yields
/// `mousedown` then `contextmenu`. Resizes produce nothing.
pub fn from_crossterm(event: &crossterm::event::Event) -> Vec<NativeEvent> {
    use crossterm::event::{Event as CtEvent, KeyEventKind, MouseEventKind};

    match event {
        CtEvent::Key(ke) => {
            let key = convert_key(ke.code);
            let modifiers = convert_modifiers(ke.modifiers);
            match ke.kind {
                KeyEventKind::Release => vec![NativeEvent::key(key, modifiers, NativeType::KeyUp)],
                KeyEventKind::Press | KeyEventKind::Repeat => {
                    let mut out = vec![NativeEvent::key(key, modifiers, NativeType::KeyDown)];
                    if key.is_character() {
                        out.push(NativeEvent::key(key, modifiers, NativeType::KeyPress));
                    }
                    out
                }
            }
        }
        CtEvent::Mouse(me) => {
            let base = Pointer {
                x: f64::from(me.column),
                y: f64::from(me.row),
                button: None,
                modifiers: convert_modifiers(me.modifiers),
            };
            let with = |button| Pointer {
                button: Some(convert_mouse_button(button)),
                ..base
            };
            let wheel = |delta_x: f64, delta_y: f64| {
                vec![NativeEvent::new(
                    NativeType::Wheel,
                    NativePayload::Wheel {
                        pointer: base,
                        delta_x,
                        delta_y,
                    },
                )]
            };
            match me.kind {
                MouseEventKind::Down(b) => {
                    let mut out = vec![NativeEvent::new(NativeType::MouseDown, NativePayload::Pointer(with(b)))];
                    if b == crossterm::event::MouseButton::Right {
                        out.push(NativeEvent::new(NativeType::ContextMenu, NativePayload::Pointer(with(b))));
                    }
                    out
                }
                MouseEventKind::Up(b) => {
                    let mut out = vec![NativeEvent::new(NativeType::MouseUp, NativePayload::Pointer(with(b)))];
                    if b == crossterm::event::MouseButton::Left {
                        out.push(NativeEvent::new(NativeType::Click, NativePayload::Pointer(with(b))));
                    }
                    out
                }
                MouseEventKind::Drag(b) => {
                    vec![NativeEvent::new(NativeType::MouseMove, NativePayload::Pointer(with(b)))]
                }
                MouseEventKind::Moved => vec![NativeEvent::new(NativeType::MouseMove, NativePayload::Pointer(base))],
                MouseEventKind::ScrollUp => wheel(0.0, -1.0),
                MouseEventKind::ScrollDown => wheel(0.0, 1.0),
                MouseEventKind::ScrollLeft => wheel(-1.0, 0.0),
                MouseEventKind::ScrollRight => wheel(1.0, 0.0),
            }
        }
        CtEvent::FocusGained => vec![NativeEvent::new(NativeType::Focus, NativePayload::None)],
        CtEvent::FocusLost => vec![NativeEvent::new(NativeType::Blur, NativePayload::None)],
        CtEvent::Paste(text) => vec![NativeEvent::new(NativeType::Paste, NativePayload::Text(text.clone()))],
        CtEvent::Resize(..) => Vec::new(),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
