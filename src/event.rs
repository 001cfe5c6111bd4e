//! Typed Hyprland events.
//!
//! The event socket emits one `EVENT>>payload` line per event.  Each event
//! the engine reacts to is parsed into an [`Event`] variant here, so
//! handlers never split strings themselves.

use crate::window::WindowAddress;
use crate::workspace::parse_workspace_id;

/// A compositor event the engine handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `workspacev2>>ID,NAME`
    WorkspaceActivated { id: i32, name: String },
    /// `activespecial>>NAME,MONITOR`
    SpecialActivated { name: String, monitor: String },
    /// `destroyworkspacev2>>ID,NAME`
    WorkspaceDestroyed { id: i32, name: String },
    /// `createworkspacev2>>ID,NAME`
    WorkspaceCreated { id: i32, name: String },
    /// `moveworkspacev2>>ID,NAME,MONITOR`
    WorkspaceMoved { id: i32, name: String, monitor: String },
    /// `renameworkspace>>ID,NAME`
    WorkspaceRenamed { id: i32, name: String },
    /// `focusedmonv2>>MONITOR,ID`
    MonitorFocused { monitor: String, workspace_id: i32 },
    /// `openwindow>>ADDR,WORKSPACE,CLASS,TITLE`
    WindowOpened {
        address: WindowAddress,
        workspace: String,
        class: String,
        title: String,
    },
    /// `closewindow>>ADDR`
    WindowClosed { address: WindowAddress },
    /// `movewindowv2>>ADDR,WSID,WORKSPACE`
    WindowMoved { address: WindowAddress, workspace: String },
    /// `windowtitlev2>>ADDR,TITLE`
    WindowTitleChanged { address: WindowAddress, title: String },
    /// `activewindowv2>>ADDR`; empty when no window has focus.
    ActiveWindowChanged { address: Option<WindowAddress> },
    /// `urgent>>ADDR`
    Urgent { address: WindowAddress },
    /// `configreloaded>>`
    ConfigReloaded,
}

/// Malformed event line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventParseError {
    #[error("event line without `>>`: {0:?}")]
    MissingDelimiter(String),
    #[error("{event}: missing field `{field}` in {payload:?}")]
    MissingField {
        event: &'static str,
        field: &'static str,
        payload: String,
    },
    #[error("{event}: invalid workspace id {value:?}")]
    BadId { event: &'static str, value: String },
}

struct Payload<'a> {
    event: &'static str,
    raw: &'a str,
}

impl<'a> Payload<'a> {
    fn missing(&self, field: &'static str) -> EventParseError {
        EventParseError::MissingField {
            event: self.event,
            field,
            payload: self.raw.to_string(),
        }
    }

    fn id(&self, value: &str) -> Result<i32, EventParseError> {
        parse_workspace_id(value).ok_or_else(|| EventParseError::BadId {
            event: self.event,
            value: value.to_string(),
        })
    }

    /// `A,B` where B may itself contain commas.
    fn pair(&self, first: &'static str, second: &'static str) -> Result<(&'a str, &'a str), EventParseError> {
        let (a, b) = self.raw.split_once(',').ok_or_else(|| self.missing(second))?;
        if a.is_empty() {
            return Err(self.missing(first));
        }
        Ok((a, b))
    }

    fn id_and_name(&self) -> Result<(i32, String), EventParseError> {
        let (id, name) = self.pair("id", "name")?;
        Ok((self.id(id)?, name.to_string()))
    }
}

impl Event {
    /// Parse one event line.  Events the engine does not handle yield
    /// `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, EventParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (name, raw) = line
            .split_once(">>")
            .ok_or_else(|| EventParseError::MissingDelimiter(line.to_string()))?;

        let event = match name {
            "workspacev2" => {
                let p = Payload { event: "workspacev2", raw };
                let (id, name) = p.id_and_name()?;
                Self::WorkspaceActivated { id, name }
            }
            "activespecial" => {
                let p = Payload { event: "activespecial", raw };
                let (name, monitor) = raw.rsplit_once(',').ok_or_else(|| p.missing("monitor"))?;
                Self::SpecialActivated {
                    name: name.to_string(),
                    monitor: monitor.to_string(),
                }
            }
            "destroyworkspacev2" => {
                let p = Payload { event: "destroyworkspacev2", raw };
                let (id, name) = p.id_and_name()?;
                Self::WorkspaceDestroyed { id, name }
            }
            "createworkspacev2" => {
                let p = Payload { event: "createworkspacev2", raw };
                let (id, name) = p.id_and_name()?;
                Self::WorkspaceCreated { id, name }
            }
            "moveworkspacev2" => {
                let p = Payload { event: "moveworkspacev2", raw };
                let (id, rest) = p.pair("id", "name")?;
                let (name, monitor) = rest.rsplit_once(',').ok_or_else(|| p.missing("monitor"))?;
                Self::WorkspaceMoved {
                    id: p.id(id)?,
                    name: name.to_string(),
                    monitor: monitor.to_string(),
                }
            }
            "renameworkspace" => {
                let p = Payload { event: "renameworkspace", raw };
                let (id, name) = p.id_and_name()?;
                Self::WorkspaceRenamed { id, name }
            }
            "focusedmonv2" => {
                let p = Payload { event: "focusedmonv2", raw };
                let (monitor, id) = raw.rsplit_once(',').ok_or_else(|| p.missing("workspace id"))?;
                Self::MonitorFocused {
                    monitor: monitor.to_string(),
                    workspace_id: p.id(id)?,
                }
            }
            "openwindow" => {
                let p = Payload { event: "openwindow", raw };
                let mut parts = raw.splitn(4, ',');
                let address = parts.next().filter(|a| !a.is_empty()).ok_or_else(|| p.missing("address"))?;
                let workspace = parts.next().ok_or_else(|| p.missing("workspace"))?;
                let class = parts.next().ok_or_else(|| p.missing("class"))?;
                let title = parts.next().unwrap_or_default();
                Self::WindowOpened {
                    address: WindowAddress::new(address),
                    workspace: workspace.to_string(),
                    class: class.to_string(),
                    title: title.to_string(),
                }
            }
            "closewindow" => {
                let p = Payload { event: "closewindow", raw };
                if raw.is_empty() {
                    return Err(p.missing("address"));
                }
                Self::WindowClosed {
                    address: WindowAddress::new(raw),
                }
            }
            "movewindowv2" => {
                let p = Payload { event: "movewindowv2", raw };
                let mut parts = raw.splitn(3, ',');
                let address = parts.next().filter(|a| !a.is_empty()).ok_or_else(|| p.missing("address"))?;
                let _id = parts.next().ok_or_else(|| p.missing("workspace id"))?;
                let workspace = parts.next().ok_or_else(|| p.missing("workspace"))?;
                Self::WindowMoved {
                    address: WindowAddress::new(address),
                    workspace: workspace.to_string(),
                }
            }
            "windowtitlev2" => {
                let p = Payload { event: "windowtitlev2", raw };
                let (address, title) = p.pair("address", "title")?;
                Self::WindowTitleChanged {
                    address: WindowAddress::new(address),
                    title: title.to_string(),
                }
            }
            "activewindowv2" => Self::ActiveWindowChanged {
                address: Some(raw.trim())
                    .filter(|a| !a.is_empty() && *a != ",")
                    .map(WindowAddress::new),
            },
            "urgent" => {
                let p = Payload { event: "urgent", raw };
                if raw.is_empty() {
                    return Err(p.missing("address"));
                }
                Self::Urgent {
                    address: WindowAddress::new(raw),
                }
            }
            "configreloaded" => Self::ConfigReloaded,
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    /// Event name as it appears on the socket, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::WorkspaceActivated { .. } => "workspacev2",
            Self::SpecialActivated { .. } => "activespecial",
            Self::WorkspaceDestroyed { .. } => "destroyworkspacev2",
            Self::WorkspaceCreated { .. } => "createworkspacev2",
            Self::WorkspaceMoved { .. } => "moveworkspacev2",
            Self::WorkspaceRenamed { .. } => "renameworkspace",
            Self::MonitorFocused { .. } => "focusedmonv2",
            Self::WindowOpened { .. } => "openwindow",
            Self::WindowClosed { .. } => "closewindow",
            Self::WindowMoved { .. } => "movewindowv2",
            Self::WindowTitleChanged { .. } => "windowtitlev2",
            Self::ActiveWindowChanged { .. } => "activewindowv2",
            Self::Urgent { .. } => "urgent",
            Self::ConfigReloaded => "configreloaded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Event {
        Event::parse(line).unwrap().unwrap()
    }

    #[test]
    fn workspace_events() {
        assert_eq!(
            parse("workspacev2>>3,3"),
            Event::WorkspaceActivated { id: 3, name: "3".into() }
        );
        assert_eq!(
            parse("createworkspacev2>>-1337,name,with,commas"),
            Event::WorkspaceCreated { id: -1337, name: "name,with,commas".into() }
        );
        assert_eq!(
            parse("destroyworkspacev2>>-98,special:term"),
            Event::WorkspaceDestroyed { id: -98, name: "special:term".into() }
        );
        assert_eq!(
            parse("renameworkspace>>4,.ab4"),
            Event::WorkspaceRenamed { id: 4, name: ".ab4".into() }
        );
    }

    #[test]
    fn move_workspace_takes_monitor_from_last_field() {
        assert_eq!(
            parse("moveworkspacev2>>5,a,b,DP-2"),
            Event::WorkspaceMoved { id: 5, name: "a,b".into(), monitor: "DP-2".into() }
        );
    }

    #[test]
    fn monitor_and_special_events() {
        assert_eq!(
            parse("focusedmonv2>>DP-1,7"),
            Event::MonitorFocused { monitor: "DP-1".into(), workspace_id: 7 }
        );
        assert_eq!(
            parse("activespecial>>special:term,DP-1"),
            Event::SpecialActivated { name: "special:term".into(), monitor: "DP-1".into() }
        );
        assert_eq!(
            parse("activespecial>>,DP-1"),
            Event::SpecialActivated { name: "".into(), monitor: "DP-1".into() }
        );
    }

    #[test]
    fn window_events() {
        assert_eq!(
            parse("openwindow>>55aa,3,kitty,zsh, with commas"),
            Event::WindowOpened {
                address: "55aa".into(),
                workspace: "3".into(),
                class: "kitty".into(),
                title: "zsh, with commas".into(),
            }
        );
        assert_eq!(parse("closewindow>>55aa"), Event::WindowClosed { address: "55aa".into() });
        assert_eq!(
            parse("movewindowv2>>55aa,-98,special:term"),
            Event::WindowMoved { address: "55aa".into(), workspace: "special:term".into() }
        );
        assert_eq!(
            parse("windowtitlev2>>55aa,a, b"),
            Event::WindowTitleChanged { address: "55aa".into(), title: "a, b".into() }
        );
        assert_eq!(parse("urgent>>55aa"), Event::Urgent { address: "55aa".into() });
    }

    #[test]
    fn empty_active_window_means_none() {
        assert_eq!(parse("activewindowv2>>"), Event::ActiveWindowChanged { address: None });
        assert_eq!(
            parse("activewindowv2>>55aa"),
            Event::ActiveWindowChanged { address: Some("55aa".into()) }
        );
    }

    #[test]
    fn unknown_events_are_ignored() {
        assert_eq!(Event::parse("fullscreen>>1").unwrap(), None);
        assert_eq!(parse("configreloaded>>"), Event::ConfigReloaded);
    }

    #[test]
    fn malformed_payloads_are_errors() {
        assert!(matches!(Event::parse("garbage"), Err(EventParseError::MissingDelimiter(_))));
        assert!(matches!(
            Event::parse("workspacev2>>x,web"),
            Err(EventParseError::BadId { event: "workspacev2", .. })
        ));
        assert!(matches!(
            Event::parse("workspacev2>>3"),
            Err(EventParseError::MissingField { field: "name", .. })
        ));
        assert!(matches!(
            Event::parse("openwindow>>55aa,3"),
            Err(EventParseError::MissingField { field: "class", .. })
        ));
    }

    #[test]
    fn trailing_newline_is_ignored() {
        assert_eq!(parse("closewindow>>55aa\n"), Event::WindowClosed { address: "55aa".into() });
    }
}
