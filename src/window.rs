//! Window entities and the pending-creation payload.
//!
//! A window is identified by its compositor address.  Hyprland reports
//! addresses with a `0x` prefix in JSON snapshots and without it in event
//! payloads; [`WindowAddress`] normalises both forms so they compare equal.

use crate::rewrite::RewriteRules;
use crate::snapshot::ClientInfo;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque compositor handle of a window, stored without the `0x` prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct WindowAddress(String);

impl WindowAddress {
    pub fn new(raw: &str) -> Self {
        let raw = raw.trim();
        Self(raw.strip_prefix("0x").unwrap_or(raw).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The form Hyprland expects in `address:` selectors.
    pub fn prefixed(&self) -> String {
        format!("0x{}", self.0)
    }
}

impl From<String> for WindowAddress {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&str> for WindowAddress {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for WindowAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.0)
    }
}

/// Strip the `special:` qualifier some events put in front of workspace names.
///
/// Workspaces are stored without it, so every name coming from the
/// compositor goes through here before it is compared.
pub fn normalize_workspace_name(raw: &str) -> &str {
    raw.strip_prefix("special:").unwrap_or(raw)
}

/// A window as displayed inside a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRepr {
    pub address: WindowAddress,
    pub class: String,
    pub title: String,
    /// Result of the window-rewrite rules for `(class, title)`.
    pub rewrite: String,
    pub active: bool,
}

impl WindowRepr {
    pub fn is_empty(&self) -> bool {
        self.address.is_empty()
    }

    /// Apply a title change, recomputing the rewritten representation.
    pub fn retitle(&mut self, title: &str, rules: &RewriteRules) {
        self.title = title.to_string();
        self.rewrite = rules.rewrite(&self.class, &self.title);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Shape {
    Ready(WindowRepr),
    ClassAndTitle { class: String, title: String },
}

/// A window waiting for its destination workspace to exist locally.
///
/// Payloads that stay unmatched for too many ticks are demoted to orphans
/// by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWindow {
    workspace_name: String,
    address: WindowAddress,
    shape: Shape,
    active: bool,
    ticks_uncreated: u32,
}

impl PendingWindow {
    /// Build from an `openwindow` event.
    pub fn opened(
        workspace_name: &str,
        address: WindowAddress,
        class: &str,
        title: &str,
        active: bool,
    ) -> Self {
        Self {
            workspace_name: normalize_workspace_name(workspace_name).to_string(),
            address,
            shape: Shape::ClassAndTitle {
                class: class.to_string(),
                title: title.to_string(),
            },
            active,
            ticks_uncreated: 0,
        }
    }

    /// Re-queue an already rendered window for a different workspace.
    pub fn from_repr(workspace_name: &str, repr: WindowRepr) -> Self {
        Self {
            workspace_name: normalize_workspace_name(workspace_name).to_string(),
            address: repr.address.clone(),
            active: repr.active,
            shape: Shape::Ready(repr),
            ticks_uncreated: 0,
        }
    }

    pub fn from_client(client: &ClientInfo) -> Self {
        Self::opened(
            &client.workspace.name,
            client.address.clone(),
            &client.class,
            &client.title,
            false,
        )
    }

    pub fn workspace_name(&self) -> &str {
        &self.workspace_name
    }

    pub fn address(&self) -> &WindowAddress {
        &self.address
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn move_to_workspace(&mut self, workspace_name: &str) {
        self.workspace_name = normalize_workspace_name(workspace_name).to_string();
    }

    /// Count one more tick spent without a matching workspace and return
    /// the new total.
    pub fn tick_uncreated(&mut self) -> u32 {
        self.ticks_uncreated += 1;
        self.ticks_uncreated
    }

    pub fn retitle(&mut self, title: &str, rules: &RewriteRules) {
        match &mut self.shape {
            Shape::Ready(repr) => repr.retitle(title, rules),
            Shape::ClassAndTitle { title: t, .. } => *t = title.to_string(),
        }
    }

    /// Whether the payload carries nothing worth displaying.
    pub fn is_empty(&self, rules: &RewriteRules) -> bool {
        if self.address.is_empty() {
            return true;
        }
        match &self.shape {
            Shape::Ready(repr) => repr.is_empty(),
            Shape::ClassAndTitle { class, title } => {
                class.is_empty() && (!rules.uses_title() || title.is_empty())
            }
        }
    }

    pub fn repr(&self, rules: &RewriteRules) -> WindowRepr {
        match &self.shape {
            Shape::Ready(repr) => WindowRepr {
                active: self.active,
                ..repr.clone()
            },
            Shape::ClassAndTitle { class, title } => WindowRepr {
                address: self.address.clone(),
                class: class.clone(),
                title: title.clone(),
                rewrite: rules.rewrite(class, title),
                active: self.active,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::WorkspaceRef;

    #[test]
    fn address_forms_compare_equal() {
        assert_eq!(WindowAddress::new("0xabc"), WindowAddress::new("abc"));
        assert_eq!(WindowAddress::new("abc").prefixed(), "0xabc");
        assert_eq!(WindowAddress::new("0xabc").to_string(), "0xabc");
    }

    #[test]
    fn address_deserializes_from_prefixed_string() {
        let a: WindowAddress = serde_json::from_str(r#""0x55aa""#).unwrap();
        assert_eq!(a.as_str(), "55aa");
    }

    #[test]
    fn special_qualifier_is_stripped() {
        let p = PendingWindow::opened("special:scratch", "1".into(), "kitty", "sh", false);
        assert_eq!(p.workspace_name(), "scratch");
    }

    #[test]
    fn tick_counter_increments() {
        let mut p = PendingWindow::opened("1", "1".into(), "kitty", "sh", false);
        assert_eq!(p.tick_uncreated(), 1);
        assert_eq!(p.tick_uncreated(), 2);
    }

    #[test]
    fn empty_class_is_empty_without_title_rules() {
        let rules = RewriteRules::default();
        let p = PendingWindow::opened("1", "1".into(), "", "title", false);
        assert!(p.is_empty(&rules));
        let p = PendingWindow::opened("1", "1".into(), "kitty", "", false);
        assert!(!p.is_empty(&rules));
    }

    #[test]
    fn repr_carries_active_flag_and_rewrite() {
        let rules = RewriteRules::default();
        let mut p = PendingWindow::opened("1", "1".into(), "kitty", "sh", false);
        p.set_active(true);
        let repr = p.repr(&rules);
        assert!(repr.active);
        assert_eq!(repr.class, "kitty");
        assert_eq!(repr.rewrite, "?");
    }

    #[test]
    fn from_client_uses_client_workspace() {
        let client = ClientInfo {
            address: "0xfeed".into(),
            class: "firefox".into(),
            title: "web".into(),
            workspace: WorkspaceRef {
                id: -98,
                name: "special:web".into(),
            },
            ..Default::default()
        };
        let p = PendingWindow::from_client(&client);
        assert_eq!(p.workspace_name(), "web");
        assert_eq!(p.address().as_str(), "feed");
    }

    #[test]
    fn retitle_updates_ready_repr() {
        let rules = RewriteRules::default();
        let repr = PendingWindow::opened("1", "1".into(), "kitty", "old", false).repr(&rules);
        let mut p = PendingWindow::from_repr("2", repr);
        p.retitle("new", &rules);
        assert_eq!(p.repr(&rules).title, "new");
        assert_eq!(p.workspace_name(), "2");
    }
}
