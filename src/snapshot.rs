//! Typed views of the JSON replies from Hyprland's command socket.
//!
//! Only the fields the engine reads are modelled; everything else in the
//! replies is ignored by serde.

use crate::window::WindowAddress;
use serde::Deserialize;

/// One entry of `j/workspaces`, also the shape of `j/activeworkspace`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkspaceInfo {
    pub id: i32,
    pub name: String,
    pub monitor: String,
    pub windows: u32,
}

/// `{id, name}` pair embedded in client and monitor entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkspaceRef {
    pub id: i32,
    pub name: String,
}

/// One entry of `j/clients`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientInfo {
    pub address: WindowAddress,
    pub class: String,
    pub title: String,
    pub workspace: WorkspaceRef,
    pub at: [i32; 2],
    pub size: [i32; 2],
}

/// One entry of `j/monitors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonitorInfo {
    pub id: i32,
    pub name: String,
    pub active_workspace: WorkspaceRef,
    pub special_workspace: WorkspaceRef,
    pub focused: bool,
}

/// One entry of `j/workspacerules`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkspaceRule {
    pub workspace_string: Option<String>,
    pub default_name: Option<String>,
    pub monitor: String,
    pub persistent: bool,
}

impl WorkspaceRule {
    /// The name the rule applies to: `defaultName` wins over the selector.
    pub fn target_name(&self) -> Option<&str> {
        self.default_name
            .as_deref()
            .or(self.workspace_string.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_reply_parses() {
        let raw = r#"[{
            "address": "0x5f2a", "mapped": true, "at": [10, 20], "size": [800, 600],
            "workspace": {"id": 3, "name": "3"}, "floating": false,
            "class": "kitty", "title": "zsh", "pid": 42
        }]"#;
        let clients: Vec<ClientInfo> = serde_json::from_str(raw).unwrap();
        assert_eq!(clients[0].address.as_str(), "5f2a");
        assert_eq!(clients[0].workspace.id, 3);
        assert_eq!(clients[0].size, [800, 600]);
    }

    #[test]
    fn monitor_reply_parses() {
        let raw = r#"[{"id": 1, "name": "DP-2", "focused": true,
            "activeWorkspace": {"id": 4, "name": "4"},
            "specialWorkspace": {"id": -98, "name": "special:term"}}]"#;
        let monitors: Vec<MonitorInfo> = serde_json::from_str(raw).unwrap();
        assert_eq!(monitors[0].active_workspace.id, 4);
        assert_eq!(monitors[0].special_workspace.name, "special:term");
    }

    #[test]
    fn rule_default_name_wins() {
        let raw = r#"[{"workspaceString": "5", "defaultName": "mail", "persistent": true},
                      {"workspaceString": "name:web"}]"#;
        let rules: Vec<WorkspaceRule> = serde_json::from_str(raw).unwrap();
        assert_eq!(rules[0].target_name(), Some("mail"));
        assert_eq!(rules[1].target_name(), Some("name:web"));
        assert!(!rules[1].persistent);
        assert_eq!(rules[1].monitor, "");
    }
}
