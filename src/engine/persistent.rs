//! Persistent workspaces from the config and from compositor rules.

use super::{PendingCreate, RemovalKey, WorkspaceManager};
use crate::snapshot::ClientInfo;
use crate::traits::Compositor;
use crate::workspace::WorkspaceRecord;
use log::{debug, trace};
use serde_json::{Map, Value};
use std::rc::Rc;

/// Workspace names `persistent-workspaces` asks for on `monitor`.
///
/// Keys are monitor names (`"*"` for every monitor without its own key) or
/// workspace names:
///
/// * monitor → count: `count` numbered workspaces, offset by `monitor_id`
/// * monitor → array: those workspace names
/// * workspace → array: that workspace on each listed monitor
/// * workspace → anything else: that workspace on every monitor
pub fn persistent_names_from_config(config: &Map<String, Value>, monitor: &str, monitor_id: i32) -> Vec<String> {
    let has_own_key = config.contains_key(monitor);
    let mut names = Vec::new();

    for (key, value) in config {
        let for_this_monitor = key == monitor || (key == "*" && !has_own_key);
        match value {
            Value::Number(count) if count.is_i64() => {
                if !for_this_monitor {
                    continue;
                }
                let count = count.as_i64().unwrap_or(0).max(0);
                let base = i64::from(monitor_id) * count;
                names.extend((0..count).map(|i| (base + i + 1).to_string()));
            }
            Value::Array(items) if !items.is_empty() => {
                if for_this_monitor {
                    names.extend(items.iter().filter_map(|item| match item {
                        Value::Number(n) if n.is_i64() => Some(n.to_string()),
                        Value::String(s) => Some(s.clone()),
                        _ => None,
                    }));
                } else if key != "*" && items.iter().any(|m| m.as_str() == Some(monitor)) {
                    names.push(key.clone());
                }
            }
            _ if key == "*" => {}
            _ => names.push(key.clone()),
        }
    }
    names
}

impl<C: Compositor> WorkspaceManager<C> {
    pub(super) fn load_persistent_from_config(&mut self, config: &Map<String, Value>, clients: &Rc<Vec<ClientInfo>>) {
        for name in persistent_names_from_config(config, &self.bar_output, self.monitor_id) {
            if self.options.ignore_workspaces.is_match(&name) {
                trace!("ignoring persistent workspace {name}");
                continue;
            }
            debug!("persistent workspace {name} from config");
            let mut record = WorkspaceRecord::persistent(&name, &self.bar_output);
            record.persistent_config = Some(true);
            self.to_create.push(PendingCreate {
                record,
                clients: Rc::clone(clients),
            });
        }
    }

    pub(super) fn load_persistent_from_rules(&mut self, clients: &Rc<Vec<ClientInfo>>) {
        let Some(rules) = self.fetch("workspacerules", self.compositor.workspace_rules()) else {
            return;
        };
        for rule in rules.iter().filter(|r| r.persistent) {
            let Some(target) = rule.target_name() else {
                continue;
            };
            let name = target.strip_prefix("name:").unwrap_or(target);
            if name.is_empty() || (name.starts_with("special:") && !self.options.show_special) {
                continue;
            }
            if self.options.ignore_workspaces.is_match(name) {
                continue;
            }

            if rule.monitor.is_empty() || rule.monitor == self.bar_output || self.options.all_outputs {
                let monitor = if rule.monitor.is_empty() { &self.bar_output } else { &rule.monitor };
                debug!("persistent workspace {name} from rule on {monitor}");
                let mut record = WorkspaceRecord::persistent(name, monitor);
                record.persistent_rule = Some(true);
                self.to_create.push(PendingCreate {
                    record,
                    clients: Rc::clone(clients),
                });
            } else {
                trace!("rule puts {name} on {}, not here", rule.monitor);
                self.to_remove.push(RemovalKey::parse(name));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(config: Value, monitor: &str, id: i32) -> Vec<String> {
        let Value::Object(map) = config else { panic!("not an object") };
        persistent_names_from_config(&map, monitor, id)
    }

    #[test]
    fn count_is_offset_by_monitor_id() {
        assert_eq!(names(json!({"DP-1": 3}), "DP-1", 0), ["1", "2", "3"]);
        assert_eq!(names(json!({"DP-2": 3}), "DP-2", 1), ["4", "5", "6"]);
        assert!(names(json!({"DP-2": 3}), "DP-1", 0).is_empty());
    }

    #[test]
    fn star_applies_without_own_key() {
        assert_eq!(names(json!({"*": 2}), "DP-1", 0), ["1", "2"]);
        assert_eq!(names(json!({"*": 2, "DP-1": [7]}), "DP-1", 0), ["7"]);
    }

    #[test]
    fn monitor_array_lists_names() {
        assert_eq!(names(json!({"DP-1": [1, ".web1", 3]}), "DP-1", 0), ["1", ".web1", "3"]);
    }

    #[test]
    fn workspace_array_lists_monitors() {
        let config = json!({".notes1": ["DP-1", "HDMI-A-1"]});
        assert_eq!(names(config.clone(), "DP-1", 0), [".notes1"]);
        assert!(names(config, "DP-2", 1).is_empty());
    }

    #[test]
    fn other_values_mean_every_monitor() {
        assert_eq!(names(json!({"mail": {}, "chat": []}), "DP-9", 4), ["mail", "chat"]);
    }
}
