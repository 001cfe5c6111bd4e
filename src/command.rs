//! Commands and messages used throughout hyprws.
//!
//! This module defines the vocabulary shared between the transports and the
//! engine: [`Message`] is what travels over the engine's channel, either a
//! compositor [`Event`] or a user [`Command`] coming from the bar surface
//! or the command socket.
//!
//! Commands arrive as JSON lines on the command socket, for example
//!
//! ```json
//! {"Click": {"target": {"Workspace": {"name": "3"}}, "button": "left"}}
//! {"Click": {"target": {"GroupLabel": {"prefix": ".web"}}, "button": 3}}
//! "Refresh"
//! ```

use crate::event::Event;
use crate::window::WindowAddress;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Mouse button of a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MouseButton::Left => write!(f, "left"),
            MouseButton::Middle => write!(f, "middle"),
            MouseButton::Right => write!(f, "right"),
        }
    }
}

impl MouseButton {
    /// X11/GDK button numbering: 1 left, 2 middle, 3 right.
    pub fn from_number(n: u64) -> Option<Self> {
        match n {
            1 => Some(Self::Left),
            2 => Some(Self::Middle),
            3 => Some(Self::Right),
            _ => None,
        }
    }
}

/// Parse a button name (case-insensitive) or its number as a string.
fn parse_button(s: &str) -> Option<MouseButton> {
    match s.trim().to_lowercase().as_str() {
        "left" | "1" => Some(MouseButton::Left),
        "middle" | "2" => Some(MouseButton::Middle),
        "right" | "3" => Some(MouseButton::Right),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for MouseButton {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Visitor;
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = MouseButton;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "button number 1-3 or \"left\" / \"middle\" / \"right\"")
            }
            fn visit_u64<E>(self, n: u64) -> Result<MouseButton, E>
            where
                E: DeError,
            {
                MouseButton::from_number(n).ok_or_else(|| DeError::custom(format!("invalid button: {n}")))
            }
            fn visit_i64<E>(self, n: i64) -> Result<MouseButton, E>
            where
                E: DeError,
            {
                u64::try_from(n)
                    .ok()
                    .and_then(MouseButton::from_number)
                    .ok_or_else(|| DeError::custom(format!("invalid button: {n}")))
            }
            fn visit_str<E>(self, s: &str) -> Result<MouseButton, E>
            where
                E: DeError,
            {
                parse_button(s).ok_or_else(|| DeError::custom(format!("invalid button: {s:?}")))
            }
        }
        deserializer.deserialize_any(V)
    }
}

/// What was clicked on the bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickTarget {
    /// A single workspace button.
    Workspace { name: String },
    /// The label of a collapsed group.
    GroupLabel { prefix: String },
    /// The start piece of an expanded group; `project` is the clean prefix.
    ProjectLabel { project: String },
    /// A window icon standing for one or more windows.  `group` is set when
    /// the icon sits on a collapsed group row.
    Icon {
        addresses: Vec<WindowAddress>,
        #[serde(default)]
        group: Option<String>,
    },
}

/// Every user action the engine handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// A click on a bar element.
    Click {
        target: ClickTarget,
        button: MouseButton,
    },
    /// Drop all state and rebuild from fresh compositor snapshots.
    Refresh,
}

/// What travels over the engine's channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Compositor(Event),
    Command(Command),
}

impl From<Event> for Message {
    fn from(event: Event) -> Self {
        Message::Compositor(event)
    }
}

impl From<Command> for Message {
    fn from(cmd: Command) -> Self {
        Message::Command(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_display() {
        assert_eq!(MouseButton::Left.to_string(), "left");
        assert_eq!(MouseButton::Middle.to_string(), "middle");
        assert_eq!(MouseButton::Right.to_string(), "right");
    }

    #[test]
    fn button_from_number_or_name() {
        let b: MouseButton = serde_json::from_str("3").unwrap();
        assert_eq!(b, MouseButton::Right);
        let b: MouseButton = serde_json::from_str(r#""Left""#).unwrap();
        assert_eq!(b, MouseButton::Left);
        let b: MouseButton = serde_json::from_str(r#""2""#).unwrap();
        assert_eq!(b, MouseButton::Middle);
        assert!(serde_json::from_str::<MouseButton>("7").is_err());
        assert!(serde_json::from_str::<MouseButton>(r#""wheel""#).is_err());
    }

    #[test]
    fn click_command_from_json() {
        let cmd: Command = serde_json::from_str(
            r#"{"Click": {"target": {"Workspace": {"name": "3"}}, "button": "left"}}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::Click {
                target: ClickTarget::Workspace { name: "3".into() },
                button: MouseButton::Left,
            }
        );
    }

    #[test]
    fn icon_target_normalises_addresses() {
        let cmd: Command = serde_json::from_str(
            r#"{"Click": {"target": {"Icon": {"addresses": ["0xa", "b"]}}, "button": 1}}"#,
        )
        .unwrap();
        let Command::Click { target: ClickTarget::Icon { addresses, group }, .. } = cmd else {
            panic!("expected icon click");
        };
        assert_eq!(addresses, vec![WindowAddress::new("a"), WindowAddress::new("b")]);
        assert_eq!(group, None);
    }

    #[test]
    fn refresh_is_a_bare_string() {
        let cmd: Command = serde_json::from_str(r#""Refresh""#).unwrap();
        assert_eq!(cmd, Command::Refresh);
    }

    #[test]
    fn messages_convert() {
        assert_eq!(Message::from(Command::Refresh), Message::Command(Command::Refresh));
        assert_eq!(
            Message::from(Event::ConfigReloaded),
            Message::Compositor(Event::ConfigReloaded)
        );
    }
}
