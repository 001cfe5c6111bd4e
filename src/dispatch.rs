//! Compositor dispatch targets.
//!
//! Every dispatch the bar sends is built here.  A workspace that has no
//! compositor id ([`WorkspaceKind::Unassigned`]) has no dispatch form:
//! [`DispatchTarget::for_workspace`] refuses it with [`UnassignedWorkspace`].

use crate::window::WindowAddress;
use crate::workspace::{Workspace, WorkspaceKind};
use std::fmt;

/// How a workspace is addressed in a `workspace` dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceSelector {
    Id(i32),
    Name(String),
}

impl fmt::Display for WorkspaceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => write!(f, "name:{name}"),
        }
    }
}

/// A single `dispatch` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchTarget {
    /// `workspace <selector>`
    Workspace(WorkspaceSelector),
    /// `focusworkspaceoncurrentmonitor <selector>`
    WorkspaceOnCurrentMonitor(WorkspaceSelector),
    /// `togglespecialworkspace [name]`
    ToggleSpecial(Option<String>),
    /// `focuswindow address:0x<addr>`
    FocusWindow(WindowAddress),
}

/// Refused dispatch to a workspace the compositor has not created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "workspace {name:?} has no compositor id \
     (persistent-config: {persistent_config}, persistent-rule: {persistent_rule})"
)]
pub struct UnassignedWorkspace {
    pub name: String,
    pub persistent_config: bool,
    pub persistent_rule: bool,
}

impl DispatchTarget {
    /// The dispatch that focuses `ws`.
    pub fn for_workspace(ws: &Workspace, on_current_monitor: bool) -> Result<Self, UnassignedWorkspace> {
        let selector = match ws.kind() {
            WorkspaceKind::Normal(id) => WorkspaceSelector::Id(id),
            WorkspaceKind::Named(_) => WorkspaceSelector::Name(ws.name().to_string()),
            WorkspaceKind::NamedSpecial(_) => {
                return Ok(Self::ToggleSpecial(Some(ws.name().to_string())))
            }
            WorkspaceKind::Special => return Ok(Self::ToggleSpecial(None)),
            WorkspaceKind::Unassigned => {
                return Err(UnassignedWorkspace {
                    name: ws.name().to_string(),
                    persistent_config: ws.is_persistent_config(),
                    persistent_rule: ws.is_persistent_rule(),
                })
            }
        };
        Ok(Self::workspace(selector, on_current_monitor))
    }

    /// Focus a workspace by name; Hyprland creates it if needed.
    pub fn workspace_by_name(name: &str, on_current_monitor: bool) -> Self {
        Self::workspace(WorkspaceSelector::Name(name.to_string()), on_current_monitor)
    }

    fn workspace(selector: WorkspaceSelector, on_current_monitor: bool) -> Self {
        if on_current_monitor {
            Self::WorkspaceOnCurrentMonitor(selector)
        } else {
            Self::Workspace(selector)
        }
    }
}

impl fmt::Display for DispatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Workspace(sel) => write!(f, "workspace {sel}"),
            Self::WorkspaceOnCurrentMonitor(sel) => write!(f, "focusworkspaceoncurrentmonitor {sel}"),
            Self::ToggleSpecial(None) => write!(f, "togglespecialworkspace"),
            Self::ToggleSpecial(Some(name)) => write!(f, "togglespecialworkspace {name}"),
            Self::FocusWindow(addr) => write!(f, "focuswindow address:{}", addr.prefixed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::RewriteRules;
    use crate::workspace::WorkspaceRecord;

    fn ws(id: i32, name: &str) -> Workspace {
        let record = WorkspaceRecord {
            id,
            name: name.to_string(),
            persistent_config: Some(true),
            ..Default::default()
        };
        Workspace::new(&record, &[], &RewriteRules::default())
    }

    #[test]
    fn numbered_dispatches_by_id() {
        let t = DispatchTarget::for_workspace(&ws(4, "4"), false).unwrap();
        assert_eq!(t.to_string(), "workspace 4");
        let t = DispatchTarget::for_workspace(&ws(4, "4"), true).unwrap();
        assert_eq!(t.to_string(), "focusworkspaceoncurrentmonitor 4");
    }

    #[test]
    fn named_dispatches_by_name() {
        let t = DispatchTarget::for_workspace(&ws(-1337, "name:web"), false).unwrap();
        assert_eq!(t.to_string(), "workspace name:web");
    }

    #[test]
    fn specials_toggle() {
        let t = DispatchTarget::for_workspace(&ws(-99, "special"), false).unwrap();
        assert_eq!(t.to_string(), "togglespecialworkspace");
        let t = DispatchTarget::for_workspace(&ws(-98, "special:term"), true).unwrap();
        assert_eq!(t.to_string(), "togglespecialworkspace term");
    }

    #[test]
    fn unassigned_is_refused() {
        let err = DispatchTarget::for_workspace(&ws(0, "notes"), false).unwrap_err();
        assert_eq!(err.name, "notes");
        assert!(err.persistent_config);
        assert!(!err.persistent_rule);
        assert!(err.to_string().contains("no compositor id"));
    }

    #[test]
    fn focus_window_uses_prefixed_address() {
        let t = DispatchTarget::FocusWindow("55aa".into());
        assert_eq!(t.to_string(), "focuswindow address:0x55aa");
    }
}
