//! Per-event handlers.

use super::{EngineError, PendingCreate, RemovalKey, WorkspaceManager};
use crate::event::Event;
use crate::grouping::{project_prefix, GroupKey};
use crate::snapshot::ClientInfo;
use crate::thumbnail::CaptureJob;
use crate::traits::Compositor;
use crate::window::{normalize_workspace_name, PendingWindow, WindowAddress};
use crate::workspace::WorkspaceRecord;
use log::{debug, trace, warn};
use std::collections::HashSet;
use std::rc::Rc;

impl<C: Compositor> WorkspaceManager<C> {
    /// Apply one compositor event.
    pub fn handle_event(&mut self, event: Event) -> Result<(), EngineError> {
        trace!("event {}", event.name());
        match event {
            Event::WorkspaceActivated { id, name } => self.on_workspace_activated(id, &name),
            Event::SpecialActivated { name, .. } => {
                self.active_special = normalize_workspace_name(&name).to_string();
                Ok(())
            }
            Event::WorkspaceDestroyed { id, name } => self.on_workspace_destroyed(id, &name),
            Event::WorkspaceCreated { id, .. } => self.on_workspace_created(id),
            Event::WorkspaceMoved { id, monitor, .. } => self.on_workspace_moved(id, &monitor),
            Event::WorkspaceRenamed { id, name } => {
                if let Some(ws) = self.workspaces.iter_mut().find(|w| w.id() == id) {
                    debug!("renaming workspace {} to {name}", ws.name());
                    ws.set_name(&name);
                }
                self.sort_workspaces();
                Ok(())
            }
            Event::MonitorFocused { monitor, workspace_id } => self.on_monitor_focused(&monitor, workspace_id),
            Event::WindowOpened { address, workspace, class, title } => {
                self.on_window_opened(address, &workspace, &class, &title);
                Ok(())
            }
            Event::WindowClosed { address } => {
                self.on_window_closed(&address);
                Ok(())
            }
            Event::WindowMoved { address, workspace } => {
                self.on_window_moved(&address, &workspace);
                Ok(())
            }
            Event::WindowTitleChanged { address, title } => self.on_window_title_changed(&address, title),
            Event::ActiveWindowChanged { address } => {
                self.on_active_window_changed(address);
                Ok(())
            }
            Event::Urgent { address } => self.on_urgent(&address),
            Event::ConfigReloaded => self.init(),
        }
    }

    //  Workspaces

    fn on_workspace_activated(&mut self, id: i32, name: &str) -> Result<(), EngineError> {
        self.active_workspace_id = id;
        let Some(output) = self.workspace_by_name(name).map(|w| w.output().to_string()) else {
            return Ok(());
        };
        self.capture_workspace(name);
        if output == self.bar_output {
            if let Some(prefix) = project_prefix(name) {
                self.history.record(GroupKey::new(&prefix, &self.bar_output), name);
            }
        }
        Ok(())
    }

    fn on_workspace_destroyed(&mut self, id: i32, name: &str) -> Result<(), EngineError> {
        if name.contains("special:special:") {
            return Ok(());
        }
        let monitor = self
            .workspaces
            .iter()
            .find(|w| w.id() == id)
            .map(|w| w.output().to_string())
            .unwrap_or_default();
        self.to_remove.push(RemovalKey::Id(id));
        self.run_hook(
            &self.options.on_workspace_destroyed,
            name,
            &monitor,
            id,
            "on-workspace-destroyed",
        );
        Ok(())
    }

    fn on_workspace_created(&mut self, id: i32) -> Result<(), EngineError> {
        if let Some(record) = self.enqueue_creation(id)? {
            self.run_hook(
                &self.options.on_workspace_created,
                &record.name,
                &record.monitor,
                record.id,
                "on-workspace-created",
            );
        }
        Ok(())
    }

    /// Resolve `id` in a fresh snapshot and queue it for creation when it
    /// belongs on this bar.  Returns the queued record.
    fn enqueue_creation(&mut self, id: i32) -> Result<Option<WorkspaceRecord>, EngineError> {
        let rules = self
            .compositor
            .workspace_rules()
            .unwrap_or_else(|e| {
                warn!("workspacerules snapshot unavailable: {e}");
                Vec::new()
            });
        let snapshot = self.compositor.workspaces().map_err(EngineError::compositor)?;
        let clients: Rc<Vec<ClientInfo>> =
            Rc::new(self.compositor.clients().map_err(EngineError::compositor)?);

        let Some(info) = snapshot.iter().find(|w| w.id == id) else {
            debug!("workspace {id} is not in the snapshot");
            self.extend_orphans(id, &clients);
            return Ok(None);
        };
        if self.options.ignore_workspaces.is_match(&info.name) || info.name.contains("special:special:") {
            trace!("ignoring workspace {}", info.name);
            return Ok(None);
        }
        let special = info.name.starts_with("special");
        if !self.is_on_this_bar(&info.monitor) || (special && !self.options.show_special) {
            self.extend_orphans(id, &clients);
            return Ok(None);
        }

        let mut record = WorkspaceRecord::from(info);
        let rule = rules.iter().find(|r| {
            r.target_name()
                .map(|n| n.strip_prefix("name:").unwrap_or(n))
                == Some(info.name.as_str())
        });
        if let Some(rule) = rule {
            record.persistent_rule = Some(rule.persistent);
        }
        debug!("queueing workspace {} ({id}) on {}", record.name, record.monitor);
        self.to_create.push(PendingCreate {
            record: record.clone(),
            clients,
        });
        Ok(Some(record))
    }

    fn on_workspace_moved(&mut self, id: i32, monitor: &str) -> Result<(), EngineError> {
        if let Some(Some(active)) = self.fetch("activeworkspace", self.compositor.active_workspace()) {
            self.active_workspace_id = active.id;
        }
        if self.options.all_outputs {
            return Ok(());
        }
        if monitor == self.bar_output {
            self.enqueue_creation(id)?;
        } else {
            self.to_remove.push(RemovalKey::Id(id));
        }
        Ok(())
    }

    fn on_monitor_focused(&mut self, monitor: &str, workspace_id: i32) -> Result<(), EngineError> {
        self.active_workspace_id = workspace_id;
        let monitors = self.compositor.monitors().map_err(EngineError::compositor)?;
        if let Some(m) = monitors.iter().find(|m| m.name == monitor) {
            self.active_special = normalize_workspace_name(&m.special_workspace.name).to_string();
        }
        Ok(())
    }

    //  Windows

    fn on_window_opened(&mut self, address: WindowAddress, workspace: &str, class: &str, title: &str) {
        let active = self.active_window.as_ref() == Some(&address);
        self.claim_address(&address);
        self.pending_windows.retain(|p| p.address() != &address);
        trace!("window {address} opened on {workspace}");
        self.pending_windows
            .push(PendingWindow::opened(workspace, address, class, title, active));
    }

    fn on_window_closed(&mut self, address: &WindowAddress) {
        self.claim_address(address);
        self.pending_windows.retain(|p| p.address() != address);
        self.urgent_windows.remove(address);
    }

    fn on_window_moved(&mut self, address: &WindowAddress, workspace: &str) {
        if let Some(pending) = self.pending_windows.iter_mut().find(|p| p.address() == address) {
            pending.move_to_workspace(workspace);
            return;
        }
        if let Some(repr) = self.detach_window(address) {
            trace!("window {address} moved to {workspace}");
            self.pending_windows.push(PendingWindow::from_repr(workspace, repr));
        }
    }

    fn on_window_title_changed(&mut self, address: &WindowAddress, title: String) -> Result<(), EngineError> {
        if !self.options.needs_titles() {
            return Ok(());
        }
        let clients = self.compositor.clients().map_err(EngineError::compositor)?;
        let title = clients
            .iter()
            .find(|c| &c.address == address)
            .map_or(title, |c| c.title.clone());

        let rules = &self.options.rewrite;
        if let Some(orphan) = self.orphans.get_mut(address) {
            orphan.window.retitle(&title, rules);
            return Ok(());
        }
        for ws in &mut self.workspaces {
            if let Some(window) = ws.window_mut(address) {
                window.retitle(&title, rules);
                return Ok(());
            }
        }
        if let Some(pending) = self.pending_windows.iter_mut().find(|p| p.address() == address) {
            pending.retitle(&title, rules);
        }
        Ok(())
    }

    fn on_active_window_changed(&mut self, address: Option<WindowAddress>) {
        let position = self.options.active_window_position;
        for orphan in self.orphans.values_mut() {
            orphan.window.active = Some(&orphan.window.address) == address.as_ref();
        }
        for ws in &mut self.workspaces {
            ws.set_active_window(address.as_ref(), position);
        }
        for pending in &mut self.pending_windows {
            let active = Some(pending.address()) == address.as_ref();
            pending.set_active(active);
        }
        if let Some(address) = &address {
            self.capture_window(address);
        }
        self.active_window = address;
    }

    fn on_urgent(&mut self, address: &WindowAddress) -> Result<(), EngineError> {
        let clients = self.compositor.clients().map_err(EngineError::compositor)?;
        let Some(client) = clients.iter().find(|c| &c.address == address) else {
            debug!("urgent window {address} not found");
            return Ok(());
        };
        self.urgent_windows.insert(client.address.clone());
        if let Some(ws) = self.workspaces.iter_mut().find(|w| w.id() == client.workspace.id) {
            debug!("workspace {} is urgent", ws.name());
            ws.set_urgent(true);
        }
        Ok(())
    }

    //  Thumbnails

    fn capture_workspace(&self, name: &str) {
        let Some(cache) = self.thumbnails.as_ref().filter(|c| c.is_available()) else {
            return;
        };
        let Some(ws) = self.workspace_by_name(name) else {
            return;
        };
        let wanted: HashSet<&WindowAddress> = ws.visible_windows(&self.options).map(|w| &w.address).collect();
        if wanted.is_empty() {
            return;
        }
        let Some(clients) = self.fetch("clients", self.compositor.clients()) else {
            return;
        };
        let jobs = clients
            .iter()
            .filter(|c| wanted.contains(&c.address))
            .map(CaptureJob::from_client)
            .collect();
        cache.capture(jobs);
    }

    fn capture_window(&self, address: &WindowAddress) {
        let Some(cache) = self.thumbnails.as_ref().filter(|c| c.is_available()) else {
            return;
        };
        let Some(clients) = self.fetch("clients", self.compositor.clients()) else {
            return;
        };
        if let Some(client) = clients.iter().find(|c| &c.address == address) {
            cache.capture(vec![CaptureJob::from_client(client)]);
        }
    }
}
