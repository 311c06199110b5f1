/// Keyboard key identifier.
///
/// Only the keys the viewer reacts to are named; everything else maps to
/// `Key::Unknown` with the platform code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Space,
    F11,

    /// Platform-dependent key not represented here.
    Unknown(u32),
}

/// Press/release state shared by keys and buttons.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ElementState {
    Pressed,
    Released,
}

/// Mouse button identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

/// Touch lifecycle phase.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TouchPhase {
    Started,
    Moved,
    Ended,
    Cancelled,
}

/// Pointer move event in physical pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerMoveEvent {
    pub x: f32,
    pub y: f32,
}

/// Pointer button event, carrying the pointer position at the time of the press.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerButtonEvent {
    pub button: MouseButton,
    pub state: ElementState,
    pub x: f32,
    pub y: f32,
}

/// Platform-agnostic input events emitted by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key {
        key: Key,
        state: ElementState,
        /// True when the event is a key-repeat.
        repeat: bool,
    },

    PointerMoved(PointerMoveEvent),
    PointerButton(PointerButtonEvent),

    Touch {
        id: u64,
        phase: TouchPhase,
        x: f32,
        y: f32,
    },

    /// Pointer left the window surface.
    PointerLeft,

    /// Window focus change.
    Focused(bool),
}

impl InputEvent {
    /// Whether this event counts as a deliberate user activation.
    ///
    /// Mirrors what browsers accept as a "user gesture" for permission
    /// prompts: a primary click, a touch start, or an activation key press.
    /// Key repeats and releases never count.
    pub fn is_user_gesture(&self) -> bool {
        match self {
            InputEvent::PointerButton(PointerButtonEvent {
                button: MouseButton::Left,
                state: ElementState::Pressed,
                ..
            }) => true,
            InputEvent::Touch { phase: TouchPhase::Started, .. } => true,
            InputEvent::Key {
                key: Key::Enter | Key::Space,
                state: ElementState::Pressed,
                repeat: false,
            } => true,
            _ => false,
        }
    }

    /// Where a pointer or an active touch now sits, in physical pixels.
    ///
    /// Touch start and move both count; ended or cancelled touches do not.
    pub fn pointer_position(&self) -> Option<(f32, f32)> {
        match *self {
            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => Some((x, y)),
            InputEvent::Touch { phase: TouchPhase::Started | TouchPhase::Moved, x, y, .. } => {
                Some((x, y))
            }
            _ => None,
        }
    }
}
