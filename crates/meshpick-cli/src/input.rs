//! Platform-agnostic input events.
//!
//! A windowing backend translates its native events into these and feeds
//! them to [`AppState::handle_event`](crate::app::AppState::handle_event).

use meshpick_mesh::Mesh;

/// One input event.
#[derive(Debug, Clone)]
pub enum InputEvent {
    /// The window was closed.
    Quit,
    /// A mesh file was dropped on the window and parsed by the loader.
    MeshDropped(Mesh),
    /// A key was pressed.
    KeyDown(Key),
    /// Mouse button pressed or released.
    MouseButton {
        /// Which button changed.
        button: MouseButton,
        /// `true` for press, `false` for release.
        pressed: bool,
    },
    /// Cursor moved.
    MouseMotion {
        /// Horizontal position in window pixels.
        x: f64,
        /// Vertical position in window pixels, from the top.
        y: f64,
        /// Horizontal movement since the previous event.
        dx: f64,
        /// Vertical movement since the previous event.
        dy: f64,
    },
    /// The drawable area changed size.
    Resized {
        /// New width in pixels.
        width: u32,
        /// New height in pixels.
        height: u32,
    },
}

/// Keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Move forward.
    Up,
    /// Move backward.
    Down,
    /// Strafe along the camera's right vector.
    Right,
    /// Strafe against the camera's right vector.
    Left,
    /// Look along the X axis.
    X,
    /// Look down the Y axis.
    Y,
    /// Look along the Z axis.
    Z,
    /// Clear highlights.
    Q,
    /// Anything else.
    Other,
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button: drag to pick.
    Left,
    /// Any other button: drag to orbit.
    Right,
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        match c.to_ascii_lowercase() {
            'x' => Self::X,
            'y' => Self::Y,
            'z' => Self::Z,
            'q' => Self::Q,
            _ => Self::Other,
        }
    }
}
