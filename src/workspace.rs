//! Workspace entities.
//!
//! A workspace's identity comes from the compositor id, which Hyprland
//! overloads: positive ids are numbered workspaces, negative ids are named
//! workspaces, `-99` is the anonymous special workspace and other negative
//! ids with a `special` name are named specials.  `0` never comes from the
//! compositor; it marks a persistent workspace that has not been created yet.
//! [`WorkspaceKind`] makes those cases explicit.

use crate::config::{ActiveWindowPosition, Options};
use crate::rewrite::RewriteRules;
use crate::snapshot::{ClientInfo, WorkspaceInfo};
use crate::window::{PendingWindow, WindowAddress, WindowRepr};

/// Id Hyprland uses for the anonymous special workspace.
pub const SPECIAL_WORKSPACE_ID: i32 = -99;

/// Parse a workspace id the way Hyprland's selectors do: leading
/// whitespace, optional sign and leading digits; trailing text is ignored.
/// `"special"` maps to the anonymous special workspace.
pub fn parse_workspace_id(raw: &str) -> Option<i32> {
    if raw == "special" {
        return Some(SPECIAL_WORKSPACE_ID);
    }
    let s = raw.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1i64, &s[1..]),
        Some(b'+') => (1i64, &s[1..]),
        _ => (1i64, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude: i64 = digits[..end].parse().ok()?;
    i32::try_from(sign * magnitude).ok()
}

/// Tagged workspace identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkspaceKind {
    /// Numbered workspace, id > 0.
    Normal(i32),
    /// Named workspace, negative non-special id.
    Named(i32),
    /// The anonymous special workspace (`-99`).
    Special,
    /// A named special workspace.
    NamedSpecial(i32),
    /// Not created by the compositor yet.
    Unassigned,
}

impl WorkspaceKind {
    pub fn classify(id: i32, special: bool) -> Self {
        match id {
            0 => Self::Unassigned,
            SPECIAL_WORKSPACE_ID => Self::Special,
            id if special => Self::NamedSpecial(id),
            id if id < 0 => Self::Named(id),
            id => Self::Normal(id),
        }
    }

    pub fn id(&self) -> i32 {
        match *self {
            Self::Normal(id) | Self::Named(id) | Self::NamedSpecial(id) => id,
            Self::Special => SPECIAL_WORKSPACE_ID,
            Self::Unassigned => 0,
        }
    }

    pub fn is_special(&self) -> bool {
        matches!(self, Self::Special | Self::NamedSpecial(_))
    }

    /// Sort rank used by the default order: numbered, named, named
    /// specials, then the anonymous special.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Normal(_) => 0,
            Self::Named(_) => 1,
            Self::NamedSpecial(_) => 2,
            Self::Special => 3,
            Self::Unassigned => 4,
        }
    }
}

/// Everything needed to create a [`Workspace`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceRecord {
    pub id: i32,
    pub name: String,
    pub monitor: String,
    pub windows: u32,
    /// `None` when the source says nothing about rule persistence.
    pub persistent_rule: Option<bool>,
    pub persistent_config: Option<bool>,
}

impl From<&WorkspaceInfo> for WorkspaceRecord {
    fn from(info: &WorkspaceInfo) -> Self {
        Self {
            id: info.id,
            name: info.name.clone(),
            monitor: info.monitor.clone(),
            windows: info.windows,
            ..Default::default()
        }
    }
}

impl WorkspaceRecord {
    /// A persistent workspace the compositor has not reported; its id is
    /// only known when the name is numeric.
    pub fn persistent(name: &str, monitor: &str) -> Self {
        Self {
            id: parse_workspace_id(name).unwrap_or(0),
            name: name.to_string(),
            monitor: monitor.to_string(),
            ..Default::default()
        }
    }
}

/// A workspace shown on the bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    kind: WorkspaceKind,
    name: String,
    output: String,
    window_count: u32,
    active: bool,
    visible: bool,
    urgent: bool,
    persistent_rule: bool,
    persistent_config: bool,
    windows: Vec<WindowRepr>,
}

impl Workspace {
    /// Build from a record, attaching the clients that live on it.
    pub fn new(record: &WorkspaceRecord, clients: &[ClientInfo], rules: &RewriteRules) -> Self {
        let special = record.name.starts_with("special");
        let kind = WorkspaceKind::classify(record.id, special);
        let name = if let Some(stripped) = record.name.strip_prefix("name:") {
            stripped.to_string()
        } else if special && kind != WorkspaceKind::Special {
            record
                .name
                .strip_prefix("special:")
                .unwrap_or(&record.name)
                .to_string()
        } else {
            record.name.clone()
        };

        let windows = if kind == WorkspaceKind::Unassigned {
            Vec::new()
        } else {
            clients
                .iter()
                .filter(|c| c.workspace.id == record.id)
                .map(PendingWindow::from_client)
                .filter(|p| !p.is_empty(rules))
                .map(|p| p.repr(rules))
                .collect()
        };

        Self {
            kind,
            name,
            output: record.monitor.clone(),
            window_count: record.windows,
            active: false,
            visible: false,
            urgent: false,
            persistent_rule: record.persistent_rule.unwrap_or(false),
            persistent_config: record.persistent_config.unwrap_or(false),
            windows,
        }
    }

    pub fn kind(&self) -> WorkspaceKind {
        self.kind
    }

    pub fn id(&self) -> i32 {
        self.kind.id()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn window_count(&self) -> u32 {
        self.window_count
    }

    pub fn is_special(&self) -> bool {
        self.kind.is_special()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_urgent(&self) -> bool {
        self.urgent
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent_rule || self.persistent_config
    }

    pub fn is_persistent_rule(&self) -> bool {
        self.persistent_rule
    }

    pub fn is_persistent_config(&self) -> bool {
        self.persistent_config
    }

    pub fn windows(&self) -> &[WindowRepr] {
        &self.windows
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn set_output(&mut self, output: &str) {
        self.output = output.to_string();
    }

    pub fn set_window_count(&mut self, count: u32) {
        self.window_count = count;
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn set_urgent(&mut self, urgent: bool) {
        self.urgent = urgent;
    }

    pub fn set_persistent_rule(&mut self, value: bool) {
        self.persistent_rule = value;
    }

    pub fn set_persistent_config(&mut self, value: bool) {
        self.persistent_config = value;
    }

    pub fn contains_window(&self, address: &WindowAddress) -> bool {
        self.windows.iter().any(|w| &w.address == address)
    }

    /// Insert a window, replacing an existing entry for the same address in
    /// place.
    pub fn insert_window(&mut self, repr: WindowRepr) {
        match self.windows.iter_mut().find(|w| w.address == repr.address) {
            Some(existing) => *existing = repr,
            None => self.windows.push(repr),
        }
    }

    pub fn close_window(&mut self, address: &WindowAddress) -> Option<WindowRepr> {
        let idx = self.windows.iter().position(|w| &w.address == address)?;
        Some(self.windows.remove(idx))
    }

    pub fn window_mut(&mut self, address: &WindowAddress) -> Option<&mut WindowRepr> {
        self.windows.iter_mut().find(|w| &w.address == address)
    }

    /// Mark `address` as the active window and reposition it per `position`.
    pub fn set_active_window(&mut self, address: Option<&WindowAddress>, position: ActiveWindowPosition) {
        for w in &mut self.windows {
            w.active = Some(&w.address) == address;
        }
        let Some(idx) = self.windows.iter().position(|w| w.active) else {
            return;
        };
        match position {
            ActiveWindowPosition::None => {}
            ActiveWindowPosition::First => {
                let w = self.windows.remove(idx);
                self.windows.insert(0, w);
            }
            ActiveWindowPosition::Last => {
                let w = self.windows.remove(idx);
                self.windows.push(w);
            }
        }
    }

    /// Windows not hidden by `ignore-windows`.
    pub fn visible_windows<'a>(&'a self, options: &'a Options) -> impl Iterator<Item = &'a WindowRepr> {
        self.windows
            .iter()
            .filter(move |w| !options.is_window_ignored(&w.class, &w.title))
    }

    /// A workspace whose windows are all ignored counts as empty.
    pub fn is_empty(&self, options: &Options) -> bool {
        if options.ignore_windows.is_empty() {
            return self.window_count == 0;
        }
        self.visible_windows(options).next().is_none()
    }

    /// Whether the visibility filters let this workspace appear.
    pub fn is_shown(&self, options: &Options) -> bool {
        if options.persistent_only && !self.is_persistent() {
            return false;
        }
        if options.active_only
            && !self.active
            && !self.is_persistent()
            && !self.visible
            && !self.is_special()
        {
            return false;
        }
        !(options.special_visible_only && self.is_special() && !self.visible)
    }

    /// `{windows}` substitution: rewritten reprs joined by `separator`.
    pub fn windows_label(&self, separator: &str) -> String {
        self.windows
            .iter()
            .map(|w| w.rewrite.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }
}
