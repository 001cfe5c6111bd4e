//! The render tick.

use super::{Orphan, PendingCreate, WorkspaceManager, WINDOW_CREATION_TIMEOUT};
use crate::config::SortMethod;
use crate::traits::Compositor;
use crate::window::{normalize_workspace_name, PendingWindow, WindowAddress};
use crate::workspace::{parse_workspace_id, Workspace, WorkspaceKind};
use log::{debug, trace};
use std::cmp::Ordering;
use std::collections::HashSet;

impl<C: Compositor> WorkspaceManager<C> {
    /// Apply everything queued since the last tick.  Returns whether the
    /// set of workspaces changed.
    pub fn do_update(&mut self) -> bool {
        let before: Vec<(i32, String)> = self.workspaces.iter().map(|w| (w.id(), w.name().to_string())).collect();

        self.remove_scheduled();
        self.create_scheduled();
        self.refresh_states();
        self.sweep_pending_windows();
        self.sort_workspaces();

        self.workspaces.len() != before.len()
            || self
                .workspaces
                .iter()
                .zip(&before)
                .any(|(w, (id, name))| w.id() != *id || w.name() != name)
    }

    fn remove_scheduled(&mut self) {
        for key in std::mem::take(&mut self.to_remove) {
            let Some(idx) = self.workspaces.iter().position(|w| key.matches(w)) else {
                continue;
            };
            if self.workspaces[idx].is_persistent_config() {
                trace!("keeping persistent workspace {}", self.workspaces[idx].name());
                continue;
            }
            let ws = self.workspaces.remove(idx);
            debug!("removed workspace {} ({})", ws.name(), ws.id());
            let name = ws.name().to_string();
            for window in ws.windows().iter().cloned() {
                self.orphans.insert(
                    window.address.clone(),
                    Orphan {
                        workspace: name.clone(),
                        window,
                    },
                );
            }
        }
    }

    fn create_scheduled(&mut self) {
        for pending in std::mem::take(&mut self.to_create) {
            self.create_workspace(pending);
        }
    }

    /// Create or patch one workspace.  Creation is idempotent: an existing
    /// workspace only picks up the record's persistence flags.
    fn create_workspace(&mut self, pending: PendingCreate) {
        let PendingCreate { record, clients } = pending;
        let kind = WorkspaceKind::classify(record.id, record.name.starts_with("special"));
        if kind == WorkspaceKind::Unassigned {
            debug!("skipping workspace {:?}: no id yet", record.name);
            return;
        }

        let probe = Workspace::new(&record, &[], &self.options.rewrite);
        let existing = self.workspaces.iter_mut().find(|w| {
            if record.id > 0 {
                w.id() == record.id
            } else {
                w.name() == probe.name()
            }
        });
        if let Some(ws) = existing {
            if let Some(value) = record.persistent_rule {
                ws.set_persistent_rule(value);
            }
            if let Some(value) = record.persistent_config {
                ws.set_persistent_config(value);
            }
            trace!("workspace {} already exists", ws.name());
            return;
        }

        let mut ws = Workspace::new(&record, &clients, &self.options.rewrite);
        let claimed: Vec<WindowAddress> = ws.windows().iter().map(|w| w.address.clone()).collect();
        for address in &claimed {
            self.claim_address(address);
            self.pending_windows.retain(|p| p.address() != address);
        }

        let adopted: Vec<WindowAddress> = self
            .orphans
            .iter()
            .filter(|(_, o)| o.workspace == ws.name())
            .map(|(a, _)| a.clone())
            .collect();
        for address in adopted {
            if let Some(orphan) = self.orphans.remove(&address) {
                ws.insert_window(orphan.window);
            }
        }
        ws.set_active_window(self.active_window.as_ref(), self.options.active_window_position);

        debug!("created workspace {} ({}) on {}", ws.name(), ws.id(), ws.output());
        self.workspaces.push(ws);
    }

    /// Active, visible, urgent, output and window count from fresh
    /// snapshots.
    fn refresh_states(&mut self) {
        let monitors = self.fetch("monitors", self.compositor.monitors()).unwrap_or_default();
        let visible: HashSet<i32> = monitors
            .iter()
            .flat_map(|m| [m.active_workspace.id, m.special_workspace.id])
            .filter(|id| *id != 0)
            .collect();
        let active_name = self
            .fetch("activeworkspace", self.compositor.active_workspace())
            .flatten()
            .map(|w| w.name)
            .unwrap_or_default();
        let snapshot = self.fetch("workspaces", self.compositor.workspaces()).unwrap_or_default();

        for ws in &mut self.workspaces {
            let active = (ws.id() != 0 && ws.id() == self.active_workspace_id)
                || (!active_name.is_empty() && ws.name() == active_name)
                || (ws.is_special() && !self.active_special.is_empty() && ws.name() == self.active_special);
            ws.set_active(active);
            if active && ws.is_urgent() {
                ws.set_urgent(false);
                for window in ws.windows() {
                    self.urgent_windows.remove(&window.address);
                }
            }
            ws.set_visible(visible.contains(&ws.id()));

            let entry = snapshot
                .iter()
                .find(|info| normalize_workspace_name(&info.name) == ws.name() || info.name == ws.name());
            if let Some(info) = entry {
                ws.set_output(&info.monitor);
            }
            ws.set_window_count(entry.map_or(0, |info| info.windows));
        }
    }

    /// Attach pending windows whose workspace exists; park the ones that
    /// waited too long.
    fn sweep_pending_windows(&mut self) {
        let mut still_pending = Vec::new();
        for mut pending in std::mem::take(&mut self.pending_windows) {
            let target = normalize_workspace_name(pending.workspace_name()).to_string();
            if self.workspaces.iter().any(|w| w.name() == target) {
                self.attach(pending, &target);
            } else if pending.tick_uncreated() >= WINDOW_CREATION_TIMEOUT {
                self.register_orphan(pending);
            } else {
                still_pending.push(pending);
            }
        }
        self.pending_windows = still_pending;
    }

    fn attach(&mut self, pending: PendingWindow, workspace: &str) {
        if pending.is_empty(&self.options.rewrite) {
            return;
        }
        let address = pending.address().clone();
        self.claim_address(&address);
        let repr = pending.repr(&self.options.rewrite);
        let position = self.options.active_window_position;
        let active = self.active_window.clone();
        if let Some(ws) = self.workspaces.iter_mut().find(|w| w.name() == workspace) {
            trace!("window {address} attached to {workspace}");
            ws.insert_window(repr);
            ws.set_active_window(active.as_ref(), position);
        }
    }

    /// Order the workspaces by the configured method.
    pub(super) fn sort_workspaces(&mut self) {
        match self.options.sort_by {
            SortMethod::Id => self.workspaces.sort_by(|a, b| a.id().cmp(&b.id()).then_with(|| a.name().cmp(b.name()))),
            SortMethod::Name => self.workspaces.sort_by(|a, b| a.name().cmp(b.name())),
            SortMethod::Number => self.workspaces.sort_by(|a, b| number_key(a).cmp(&number_key(b))),
            SortMethod::Default => self.workspaces.sort_by(default_order),
            SortMethod::SpecialCentered => {
                self.workspaces.sort_by(default_order);
                let all = std::mem::take(&mut self.workspaces);
                let (special, normal): (Vec<_>, Vec<_>) = all.into_iter().partition(|w| w.is_special());
                let (shown, hidden): (Vec<_>, Vec<_>) = normal.into_iter().partition(|w| w.is_shown(&self.options));
                let middle = shown.len() / 2;
                let mut shown = shown.into_iter();
                self.workspaces.extend(shown.by_ref().take(middle));
                self.workspaces.extend(special);
                self.workspaces.extend(shown);
                self.workspaces.extend(hidden);
            }
        }
    }
}

/// Numbered workspaces by id, then named ones, named specials and the
/// anonymous special, each by name.
fn default_order(a: &Workspace, b: &Workspace) -> Ordering {
    a.kind()
        .rank()
        .cmp(&b.kind().rank())
        .then_with(|| match (a.kind(), b.kind()) {
            (WorkspaceKind::Normal(x), WorkspaceKind::Normal(y)) => x.cmp(&y),
            _ => a.name().cmp(b.name()),
        })
}

/// Names that parse as a number first, in numeric order; the rest by name.
fn number_key(ws: &Workspace) -> (bool, i32, &str) {
    match parse_workspace_id(ws.name()) {
        Some(n) if ws.name() != "special" => (false, n, ws.name()),
        _ => (true, 0, ws.name()),
    }
}
