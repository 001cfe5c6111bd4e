//! Render projection: engine state → [`Frame`].
//!
//! A frame is a flat list of bar items in display order.  It is a pure
//! function of the workspace list, the options and a few lookups, which
//! keeps every sink (JSON lines, GTK) dumb and lets the service skip
//! rendering when nothing changed.

use crate::command::ClickTarget;
use crate::config::{IconMode, Options};
use crate::grouping::{build_groups, project_prefix, trailing_number, GroupDisplay, ProjectGroup};
use crate::icons::IconResolver;
use crate::thumbnail::ThumbnailCache;
use crate::window::WindowAddress;
use crate::workspace::Workspace;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// CSS-style state of a bar element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StyleFlags {
    pub active: bool,
    pub special: bool,
    pub empty: bool,
    pub persistent: bool,
    pub urgent: bool,
    pub visible: bool,
    pub hosting_monitor: bool,
    pub grouped: bool,
    pub active_group: bool,
}

impl StyleFlags {
    /// Class names of the set flags.
    pub fn classes(&self) -> Vec<&'static str> {
        [
            (self.active, "active"),
            (self.special, "special"),
            (self.empty, "empty"),
            (self.persistent, "persistent"),
            (self.urgent, "urgent"),
            (self.visible, "visible"),
            (self.hosting_monitor, "hosting-monitor"),
            (self.grouped, "grouped"),
            (self.active_group, "active-group"),
        ]
        .into_iter()
        .filter_map(|(on, class)| on.then_some(class))
        .collect()
    }
}

/// A window on the bar, behind an icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IconWindow {
    pub address: WindowAddress,
    pub workspace: String,
    pub title: String,
    pub thumbnail: Option<PathBuf>,
}

/// One deduplicated icon standing for every window sharing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IconView {
    /// Theme icon name or absolute path.
    pub icon: String,
    pub tooltip: String,
    pub urgent: bool,
    pub windows: Vec<IconWindow>,
    pub click: ClickTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceView {
    pub name: String,
    pub id: i32,
    /// `false` when a visibility filter hides the workspace.
    pub shown: bool,
    pub label: String,
    pub style: StyleFlags,
    pub icons: Vec<IconView>,
    pub click: ClickTarget,
}

/// A collapsed project drawn as one row: `open`, label, icons, `close`.
///
/// The brackets mirror the start and end pieces of an expanded project so
/// both forms can share styling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRow {
    pub prefix: String,
    pub open: String,
    pub label: String,
    pub close: String,
    pub members: Vec<String>,
    pub style: StyleFlags,
    pub icons: Vec<IconView>,
    pub click: ClickTarget,
}

/// Opening piece of an expanded project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupStart {
    pub project: String,
    pub label: String,
    pub style: StyleFlags,
    pub click: ClickTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Item {
    Workspace(WorkspaceView),
    CollapsedGroup(GroupRow),
    GroupStart(GroupStart),
    GroupEnd { style: StyleFlags },
}

/// Everything a sink needs to draw the bar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub items: Vec<Item>,
    /// Requested icon size in pixels.
    pub icon_size: i32,
}

/// Inputs of [`project`].
pub struct ProjectionInput<'a> {
    pub workspaces: &'a [Workspace],
    pub options: &'a Options,
    pub bar_output: &'a str,
    pub urgent_windows: &'a HashSet<WindowAddress>,
    pub icons: &'a dyn IconResolver,
    pub thumbnails: Option<&'a ThumbnailCache>,
}

/// Pick the `{icon}` for a workspace from `format-icons`.
pub fn select_icon(ws: &Workspace, options: &Options) -> String {
    let icons = &options.format_icons;
    let states = [
        (ws.is_urgent(), "urgent"),
        (ws.is_active(), "active"),
        (ws.is_special(), "special"),
    ];
    if let Some(icon) = states
        .iter()
        .filter(|(on, _)| *on)
        .find_map(|(_, key)| icons.get(*key))
    {
        return icon.clone();
    }
    if let Some(icon) = icons.get(ws.name()) {
        return icon.clone();
    }
    let states = [
        (ws.is_visible(), "visible"),
        (ws.is_empty(options), "empty"),
        (ws.is_persistent(), "persistent"),
        (true, "default"),
    ];
    states
        .iter()
        .filter(|(on, _)| *on)
        .find_map(|(_, key)| icons.get(*key))
        .cloned()
        .unwrap_or_else(|| ws.name().to_string())
}

/// Expand the `format` template for a workspace.
pub fn format_label(ws: &Workspace, options: &Options) -> String {
    let mut label = options
        .format
        .replace("{id}", &ws.id().to_string())
        .replace("{name}", ws.name());
    if options.with_icon {
        label = label.replace("{icon}", &select_icon(ws, options));
    }
    if label.contains("{windows}") {
        label = label.replace("{windows}", &ws.windows_label(&options.window_separator));
    }
    label
}

fn tooltip(icon: &str, titles: &[&str]) -> String {
    match titles {
        [single] => single.to_string(),
        _ => {
            let mut out = format!("{icon}:");
            for title in titles {
                out.push_str("\n• ");
                out.push_str(title);
            }
            out
        }
    }
}

impl ProjectionInput<'_> {
    fn style(&self, ws: &Workspace) -> StyleFlags {
        StyleFlags {
            active: ws.is_active(),
            special: ws.is_special(),
            empty: ws.is_empty(self.options),
            persistent: ws.is_persistent(),
            urgent: ws.is_urgent(),
            visible: ws.is_visible(),
            hosting_monitor: ws.output() == self.bar_output,
            ..Default::default()
        }
    }

    /// Deduplicated icons over the windows of `members`, in first-seen
    /// order.  Windows without a resolvable icon are left out.
    fn icon_strip(&self, members: &[&Workspace], group: Option<&str>) -> Vec<IconView> {
        let mut order: Vec<String> = Vec::new();
        let mut by_icon: HashMap<String, Vec<IconWindow>> = HashMap::new();
        for ws in members {
            for window in ws.visible_windows(self.options) {
                let Some(icon) = self.icons.icon_for_class(&window.class) else {
                    continue;
                };
                let entry = by_icon.entry(icon.clone()).or_insert_with(|| {
                    order.push(icon);
                    Vec::new()
                });
                entry.push(IconWindow {
                    address: window.address.clone(),
                    workspace: ws.name().to_string(),
                    title: window.title.clone(),
                    thumbnail: self.thumbnails.and_then(|t| t.thumbnail_path(&window.address)),
                });
            }
        }

        order
            .into_iter()
            .filter_map(|icon| {
                let windows = by_icon.remove(&icon)?;
                let titles: Vec<&str> = windows.iter().map(|w| w.title.as_str()).collect();
                Some(IconView {
                    tooltip: tooltip(&icon, &titles),
                    urgent: windows.iter().any(|w| self.urgent_windows.contains(&w.address)),
                    click: ClickTarget::Icon {
                        addresses: windows.iter().map(|w| w.address.clone()).collect(),
                        group: group.map(str::to_string),
                    },
                    icon,
                    windows,
                })
            })
            .collect()
    }

    /// Whether `ws` shares a project with the active workspace, or is it.
    fn in_active_group(&self, ws: &Workspace) -> bool {
        let Some(active) = self.workspaces.iter().find(|w| w.is_active()) else {
            return false;
        };
        match (project_prefix(ws.name()), project_prefix(active.name())) {
            (Some(a), Some(b)) => a == b,
            _ => ws.name() == active.name(),
        }
    }

    fn workspace_icons(&self, ws: &Workspace) -> Vec<IconView> {
        match self.options.icon_mode {
            IconMode::None => Vec::new(),
            IconMode::CurrentGroup if !self.in_active_group(ws) => Vec::new(),
            IconMode::CurrentGroup | IconMode::All => self.icon_strip(&[ws], None),
        }
    }

    fn workspace_view(&self, ws: &Workspace, label: String, style: StyleFlags, shown: bool) -> WorkspaceView {
        WorkspaceView {
            name: ws.name().to_string(),
            id: ws.id(),
            shown,
            label,
            style,
            icons: self.workspace_icons(ws),
            click: ClickTarget::Workspace {
                name: ws.name().to_string(),
            },
        }
    }

    fn plain(&self, ws: &Workspace) -> Item {
        Item::Workspace(self.workspace_view(
            ws,
            format_label(ws, self.options),
            self.style(ws),
            ws.is_shown(self.options),
        ))
    }

    fn collapsed(&self, group: &ProjectGroup) -> Item {
        let label = if self.options.transform_workspace_names {
            group.clean_prefix().to_string()
        } else {
            group.prefix.clone()
        };
        let icons = if self.options.icon_mode == IconMode::All {
            self.icon_strip(&group.members, Some(group.prefix.as_str()))
        } else {
            Vec::new()
        };
        Item::CollapsedGroup(GroupRow {
            prefix: group.prefix.clone(),
            open: "[".to_string(),
            label,
            close: "]".to_string(),
            members: group.members.iter().map(|w| w.name().to_string()).collect(),
            style: StyleFlags {
                empty: !group.has_windows,
                urgent: group.has_urgent,
                grouped: true,
                ..Default::default()
            },
            icons,
            click: ClickTarget::GroupLabel {
                prefix: group.prefix.clone(),
            },
        })
    }

    fn expanded(&self, group: &ProjectGroup, items: &mut Vec<Item>) {
        let group_style = StyleFlags {
            grouped: true,
            active_group: group.has_active,
            ..Default::default()
        };
        items.push(Item::GroupStart(GroupStart {
            project: group.clean_prefix().to_string(),
            label: format!("[{}", group.clean_prefix()),
            style: group_style.clone(),
            click: ClickTarget::ProjectLabel {
                project: group.clean_prefix().to_string(),
            },
        }));
        for ws in &group.members {
            let label = trailing_number(ws.name()).unwrap_or("?").to_string();
            let style = StyleFlags {
                grouped: true,
                active_group: group.has_active,
                ..self.style(ws)
            };
            items.push(Item::Workspace(self.workspace_view(ws, label, style, true)));
        }
        items.push(Item::GroupEnd { style: group_style });
    }
}

/// Project the workspace list into a frame.
///
/// Groups are emitted at the position of their first member.  Members of a
/// collapsed group appear only inside its row.
pub fn project(input: &ProjectionInput) -> Frame {
    let options = input.options;
    let grouping = options.collapse_inactive_projects || options.transform_workspace_names;
    let groups = if grouping {
        build_groups(input.workspaces, input.bar_output, |w| w.is_empty(options))
    } else {
        Vec::new()
    };
    let membership: HashMap<&str, usize> = groups
        .iter()
        .enumerate()
        .flat_map(|(i, g)| g.members.iter().map(move |w| (w.name(), i)))
        .collect();

    let mut items = Vec::with_capacity(input.workspaces.len());
    let mut emitted = vec![false; groups.len()];
    for ws in input.workspaces {
        let Some(&gi) = membership.get(ws.name()) else {
            items.push(input.plain(ws));
            continue;
        };
        let group = &groups[gi];
        match group.display(options.collapse_inactive_projects, options.transform_workspace_names) {
            GroupDisplay::Plain => items.push(input.plain(ws)),
            GroupDisplay::Single => {
                let label = group.clean_prefix().to_string();
                items.push(Item::Workspace(input.workspace_view(ws, label, input.style(ws), true)));
            }
            GroupDisplay::Collapsed if !emitted[gi] => {
                emitted[gi] = true;
                items.push(input.collapsed(group));
            }
            GroupDisplay::Expanded if !emitted[gi] => {
                emitted[gi] = true;
                input.expanded(group, &mut items);
            }
            GroupDisplay::Collapsed | GroupDisplay::Expanded => {}
        }
    }

    Frame {
        items,
        icon_size: options.icon_size,
    }
}
