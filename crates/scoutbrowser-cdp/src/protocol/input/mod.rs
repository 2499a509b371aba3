//! Input domain types.
//!
//! The Input domain dispatches synthetic input events.

use serde::Serialize;

/// Mouse event type for `Input.dispatchMouseEvent`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MouseEventType {
    /// Mouse pressed event.
    MousePressed,
    /// Mouse released event.
    MouseReleased,
    /// Mouse moved event.
    MouseMoved,
    /// Mouse wheel event.
    MouseWheel,
}

/// Mouse button for `Input.dispatchMouseEvent`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    /// No button.
    None,
    /// Left button.
    Left,
    /// Middle button.
    Middle,
    /// Right button.
    Right,
}

/// Parameters for `Input.dispatchMouseEvent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchMouseEventParams {
    /// Type of the mouse event.
    #[serde(rename = "type")]
    pub event_type: MouseEventType,
    /// X coordinate of the event relative to the main frame's viewport.
    pub x: f64,
    /// Y coordinate of the event relative to the main frame's viewport.
    pub y: f64,
    /// Bit field representing pressed modifier keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<i32>,
    /// Mouse button (default: "none").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button: Option<MouseButton>,
    /// Number of times the mouse button was clicked (default: 0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_count: Option<i32>,
}

/// Key event type for `Input.dispatchKeyEvent`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyEventType {
    /// A key was pressed down.
    KeyDown,
    /// A key was released.
    KeyUp,
    /// A system key was pressed down.
    RawKeyDown,
    /// A key was typed (generates input).
    Char,
}

/// Parameters for `Input.dispatchKeyEvent`.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DispatchKeyEventParams {
    /// Type of the key event.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<KeyEventType>,
    /// Bit field representing pressed modifier keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<i32>,
    /// Text as generated by processing a virtual key code with a keyboard
    /// layout. Not needed for for `keyUp` and `rawKeyDown` events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Unique key identifier (e.g., 'U+0041').
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Unique DOM defined string value for each physical key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Windows virtual key code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub windows_virtual_key_code: Option<i32>,
}

#[cfg(test)]
mod tests;
