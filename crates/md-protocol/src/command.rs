//! Typed remote-input commands
//!
//! The agent accepts a loosely typed `{type, data}` envelope where every
//! value is a string. [`RemoteCommand`] gives the commands the client
//! actually issues a typed shape and renders them into that envelope.

use std::collections::HashMap;
use std::fmt;

use crate::error::ProtocolError;
use crate::message::CommandRequest;

/// A point normalised to the visible screen image, both axes in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPoint {
    x: f32,
    y: f32,
}

impl NormalizedPoint {
    /// Create a point, rejecting coordinates outside `[0, 1]` or NaN
    pub fn new(x: f32, y: f32) -> Result<Self, ProtocolError> {
        if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
            return Err(ProtocolError::InvalidCommand(format!(
                "point ({}, {}) outside [0, 1]",
                x, y
            )));
        }
        Ok(Self { x, y })
    }

    /// Create a point, clamping each axis into `[0, 1]`
    pub fn clamped(x: f32, y: f32) -> Self {
        let clamp = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Self {
            x: clamp(x),
            y: clamp(y),
        }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    fn write_into(&self, data: &mut HashMap<String, String>) {
        data.insert("x".to_string(), self.x.to_string());
        data.insert("y".to_string(), self.y.to_string());
    }
}

/// Mouse button names understood by the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn as_str(&self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MouseButton {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" => Ok(MouseButton::Middle),
            other => Err(ProtocolError::InvalidCommand(format!(
                "unknown mouse button '{}'",
                other
            ))),
        }
    }
}

/// Commands the client sends to the agent
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCommand {
    /// Click, optionally moving to an absolute position first
    MouseClick {
        button: MouseButton,
        at: Option<NormalizedPoint>,
    },
    MouseDoubleClick { at: Option<NormalizedPoint> },
    /// Move the cursor to an absolute position
    MouseMove { at: NormalizedPoint },
    /// Move the cursor by a delta in screen pixels
    MouseMoveRelative { dx: i32, dy: i32 },
    MouseScroll { dx: i32, dy: i32 },
    /// Key combination such as `ctrl+c` or `alt+tab`
    KeyboardShortcut(String),
    /// Agent-defined system command such as `lock` or `shutdown`
    SystemCommand(String),
    OpenApp(String),
    /// Anything the agent understands that has no typed variant
    Custom {
        kind: String,
        data: HashMap<String, String>,
    },
}

impl RemoteCommand {
    /// Wire name of the command (`type` field of the envelope)
    pub fn kind(&self) -> &str {
        match self {
            RemoteCommand::MouseClick { .. } => "mouse_click",
            RemoteCommand::MouseDoubleClick { .. } => "mouse_double_click",
            RemoteCommand::MouseMove { .. } => "mouse_move",
            RemoteCommand::MouseMoveRelative { .. } => "mouse_move_relative",
            RemoteCommand::MouseScroll { .. } => "mouse_scroll",
            RemoteCommand::KeyboardShortcut(_) => "keyboard_shortcut",
            RemoteCommand::SystemCommand(_) => "system_command",
            RemoteCommand::OpenApp(_) => "open_app",
            RemoteCommand::Custom { kind, .. } => kind,
        }
    }

    /// String map sent as the envelope's `data` field
    pub fn data(&self) -> HashMap<String, String> {
        let mut data = HashMap::new();
        match self {
            RemoteCommand::MouseClick { button, at } => {
                data.insert("button".to_string(), button.as_str().to_string());
                if let Some(point) = at {
                    point.write_into(&mut data);
                }
            }
            RemoteCommand::MouseDoubleClick { at } => {
                if let Some(point) = at {
                    point.write_into(&mut data);
                }
            }
            RemoteCommand::MouseMove { at } => at.write_into(&mut data),
            RemoteCommand::MouseMoveRelative { dx, dy } | RemoteCommand::MouseScroll { dx, dy } => {
                data.insert("dx".to_string(), dx.to_string());
                data.insert("dy".to_string(), dy.to_string());
            }
            RemoteCommand::KeyboardShortcut(shortcut) => {
                data.insert("shortcut".to_string(), shortcut.clone());
            }
            RemoteCommand::SystemCommand(command) => {
                data.insert("command".to_string(), command.clone());
            }
            RemoteCommand::OpenApp(name) => {
                data.insert("app_name".to_string(), name.clone());
            }
            RemoteCommand::Custom { data: custom, .. } => return custom.clone(),
        }
        data
    }

    /// Render into the `{type, data}` envelope
    pub fn to_request(&self) -> CommandRequest {
        CommandRequest::new(self.kind(), self.data())
    }
}

impl From<RemoteCommand> for CommandRequest {
    fn from(command: RemoteCommand) -> Self {
        command.to_request()
    }
}
