//! Project grouping.
//!
//! Workspaces named like `.<project><n>` (for example `.web1`, `.web2`,
//! `.2d3`) belong to project `.<project>`.  Groups are derived from the
//! workspace list on every tick; the only durable state is the
//! [`LastActiveTable`] remembering which member of each group was focused
//! last.

use crate::window::WindowAddress;
use crate::workspace::Workspace;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\.(\d*[a-zA-Z]+)\d+").expect("static regex")
});

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d*[a-zA-Z]+)(\d+)").expect("static regex")
});

/// Group prefix of a workspace name, `.` included: `.web2` → `.web`.
pub fn project_prefix(name: &str) -> Option<String> {
    PREFIX_RE
        .captures(name)
        .and_then(|c| c.get(1))
        .map(|m| format!(".{}", m.as_str()))
}

/// Trailing member number of a grouped name: `.web12` → `12`.
pub fn trailing_number(name: &str) -> Option<&str> {
    NUMBER_RE
        .captures(name)
        .and_then(|c| c.get(2))
        .map(|m| m.as_str())
}

/// Prefix without the leading dot, used for display.
pub fn clean_prefix(prefix: &str) -> &str {
    prefix.strip_prefix('.').unwrap_or(prefix)
}

/// Order group members by trailing number, falling back to the name.
pub fn compare_members(a: &str, b: &str) -> Ordering {
    let num = |s: &str| trailing_number(s).and_then(|n| n.parse::<u64>().ok());
    match (num(a), num(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

/// Identity of a group: its prefix on one monitor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub prefix: String,
    pub monitor: String,
}

impl GroupKey {
    pub fn new(prefix: &str, monitor: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            monitor: monitor.to_string(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.prefix, self.monitor)
    }
}

/// Last focused workspace per group.  Entries are never invalidated; a
/// stale name simply makes navigation create or focus that workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LastActiveTable {
    entries: HashMap<GroupKey, String>,
}

impl LastActiveTable {
    pub fn record(&mut self, key: GroupKey, workspace: &str) {
        log::debug!("last active for {key} is now {workspace}");
        self.entries.insert(key, workspace.to_string());
    }

    pub fn get(&self, key: &GroupKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Workspace to focus when a group label is clicked: the last active
    /// member, else the first member.
    pub fn navigation_target<'a>(&'a self, key: &GroupKey, members: &[&'a Workspace]) -> Option<&'a str> {
        self.get(key).or_else(|| members.first().map(|w| w.name()))
    }

    /// Window to focus when a group icon standing for several windows is
    /// clicked.  Prefers a window on an urgent workspace, then one on the
    /// group's last active workspace, then the first candidate.
    pub fn select_best_window<'c>(
        &self,
        candidates: &'c [WindowAddress],
        workspace_of: &HashMap<WindowAddress, String>,
        key: &GroupKey,
        is_urgent: impl Fn(&str) -> bool,
    ) -> Option<&'c WindowAddress> {
        let on = |pred: &dyn Fn(&str) -> bool| {
            candidates
                .iter()
                .find(|a| workspace_of.get(*a).is_some_and(|ws| pred(ws)))
        };
        on(&is_urgent)
            .or_else(|| {
                let last = self.get(key)?;
                on(&|ws: &str| ws == last)
            })
            .or_else(|| candidates.first())
    }
}

/// How a group is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupDisplay {
    /// One row for the whole group.
    Collapsed,
    /// A lone member labelled with the clean prefix.
    Single,
    /// Bracketed members labelled by number.
    Expanded,
    /// No grouping applies; members render as plain workspaces.
    Plain,
}

/// Workspaces on one monitor sharing a prefix.
#[derive(Debug, Clone)]
pub struct ProjectGroup<'a> {
    pub prefix: String,
    /// Sorted by [`compare_members`].
    pub members: Vec<&'a Workspace>,
    /// Index of the first member in the workspace list.
    pub first_position: usize,
    pub has_active: bool,
    pub has_windows: bool,
    pub has_urgent: bool,
}

impl ProjectGroup<'_> {
    pub fn key(&self, monitor: &str) -> GroupKey {
        GroupKey::new(&self.prefix, monitor)
    }

    pub fn clean_prefix(&self) -> &str {
        clean_prefix(&self.prefix)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.iter().any(|w| w.name() == name)
    }

    pub fn display(&self, collapse_inactive: bool, transform_names: bool) -> GroupDisplay {
        if collapse_inactive && self.members.len() >= 2 && !self.has_active {
            GroupDisplay::Collapsed
        } else if transform_names && self.members.len() == 1 {
            GroupDisplay::Single
        } else if transform_names {
            GroupDisplay::Expanded
        } else {
            GroupDisplay::Plain
        }
    }
}

/// Group the workspaces on `monitor` by prefix, in order of first
/// appearance.
pub fn build_groups<'a>(
    workspaces: &'a [Workspace],
    monitor: &str,
    is_empty: impl Fn(&Workspace) -> bool,
) -> Vec<ProjectGroup<'a>> {
    let mut groups: Vec<ProjectGroup<'a>> = Vec::new();
    for (position, ws) in workspaces.iter().enumerate() {
        if ws.output() != monitor {
            continue;
        }
        let Some(prefix) = project_prefix(ws.name()) else {
            continue;
        };
        let idx = match groups.iter().position(|g| g.prefix == prefix) {
            Some(idx) => idx,
            None => {
                groups.push(ProjectGroup {
                    prefix,
                    members: Vec::new(),
                    first_position: position,
                    has_active: false,
                    has_windows: false,
                    has_urgent: false,
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[idx];
        group.members.push(ws);
        group.has_active |= ws.is_active();
        group.has_windows |= !is_empty(ws);
        group.has_urgent |= ws.is_urgent();
    }
    for group in &mut groups {
        group.members.sort_by(|a, b| compare_members(a.name(), b.name()));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::RewriteRules;
    use crate::workspace::WorkspaceRecord;

    fn ws(id: i32, name: &str, monitor: &str, windows: u32) -> Workspace {
        let record = WorkspaceRecord {
            id,
            name: name.to_string(),
            monitor: monitor.to_string(),
            windows,
            ..Default::default()
        };
        Workspace::new(&record, &[], &RewriteRules::default())
    }

    #[test]
    fn prefix_extraction() {
        assert_eq!(project_prefix(".web2").as_deref(), Some(".web"));
        assert_eq!(project_prefix(".2d3").as_deref(), Some(".2d"));
        assert_eq!(project_prefix(".web"), None);
        assert_eq!(project_prefix("web2"), None);
        assert_eq!(project_prefix("3"), None);
    }

    #[test]
    fn number_extraction() {
        assert_eq!(trailing_number(".web12"), Some("12"));
        assert_eq!(trailing_number(".2d3"), Some("3"));
        assert_eq!(trailing_number("3"), None);
    }

    #[test]
    fn prefix_and_number_rebuild_the_name() {
        for name in [".web1", ".api12", ".2d3"] {
            let prefix = project_prefix(name).unwrap();
            let number = trailing_number(name).unwrap();
            assert_eq!(format!("{prefix}{number}"), name);
        }
    }

    #[test]
    fn members_sort_numerically() {
        let mut names = vec![".web10", ".web2", ".web1"];
        names.sort_by(|a, b| compare_members(a, b));
        assert_eq!(names, [".web1", ".web2", ".web10"]);
    }

    #[test]
    fn groups_are_per_monitor_and_sorted() {
        let list = vec![
            ws(12, ".web10", "DP-1", 0),
            ws(1, "1", "DP-1", 1),
            ws(11, ".web2", "DP-1", 1),
            ws(13, ".web3", "DP-2", 0),
            ws(14, ".api1", "DP-1", 0),
        ];
        let groups = build_groups(&list, "DP-1", |w| w.window_count() == 0);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].prefix, ".web");
        assert_eq!(groups[0].first_position, 0);
        let names: Vec<_> = groups[0].members.iter().map(|w| w.name()).collect();
        assert_eq!(names, [".web2", ".web10"]);
        assert!(groups[0].has_windows);
        assert!(!groups[1].has_windows);
        assert_eq!(groups[0].key("DP-1").to_string(), ".web@DP-1");
    }

    #[test]
    fn display_decision() {
        let mut a = ws(11, ".web1", "DP-1", 0);
        let b = ws(12, ".web2", "DP-1", 0);
        let list = vec![a.clone(), b.clone()];
        let groups = build_groups(&list, "DP-1", |_| true);
        assert_eq!(groups[0].display(true, false), GroupDisplay::Collapsed);
        assert_eq!(groups[0].display(false, true), GroupDisplay::Expanded);
        assert_eq!(groups[0].display(false, false), GroupDisplay::Plain);

        a.set_active(true);
        let list = vec![a, b];
        let groups = build_groups(&list, "DP-1", |_| true);
        assert_eq!(groups[0].display(true, true), GroupDisplay::Expanded);

        let single = vec![ws(11, ".web1", "DP-1", 0)];
        let groups = build_groups(&single, "DP-1", |_| true);
        assert_eq!(groups[0].display(true, true), GroupDisplay::Single);
    }

    #[test]
    fn navigation_prefers_history() {
        let list = vec![ws(11, ".web1", "DP-1", 0), ws(12, ".web2", "DP-1", 0)];
        let groups = build_groups(&list, "DP-1", |_| true);
        let key = groups[0].key("DP-1");
        let mut table = LastActiveTable::default();
        assert_eq!(table.navigation_target(&key, &groups[0].members), Some(".web1"));
        table.record(key.clone(), ".web2");
        assert_eq!(table.navigation_target(&key, &groups[0].members), Some(".web2"));
        // other monitor has its own history
        assert_eq!(table.get(&GroupKey::new(".web", "DP-2")), None);
    }

    #[test]
    fn best_window_selection_order() {
        let a = WindowAddress::new("a");
        let b = WindowAddress::new("b");
        let c = WindowAddress::new("c");
        let candidates = vec![a.clone(), b.clone(), c.clone()];
        let workspace_of: HashMap<_, _> = [
            (a.clone(), ".web1".to_string()),
            (b.clone(), ".web2".to_string()),
            (c.clone(), ".web3".to_string()),
        ]
        .into();
        let key = GroupKey::new(".web", "DP-1");
        let mut table = LastActiveTable::default();

        let pick = table.select_best_window(&candidates, &workspace_of, &key, |_| false);
        assert_eq!(pick, Some(&a));

        table.record(key.clone(), ".web2");
        let pick = table.select_best_window(&candidates, &workspace_of, &key, |_| false);
        assert_eq!(pick, Some(&b));

        let pick = table.select_best_window(&candidates, &workspace_of, &key, |ws| ws == ".web3");
        assert_eq!(pick, Some(&c));

        assert_eq!(table.select_best_window(&[], &workspace_of, &key, |_| true), None);
    }
}
