//! Commands from the bar: clicks and refreshes.

use super::{EngineError, WorkspaceManager};
use crate::command::{ClickTarget, Command, MouseButton};
use crate::dispatch::DispatchTarget;
use crate::grouping::{compare_members, project_prefix, GroupKey};
use crate::tasks::script_command;
use crate::traits::Compositor;
use crate::window::WindowAddress;
use crate::workspace::Workspace;
use log::debug;
use std::collections::HashMap;

impl<C: Compositor> WorkspaceManager<C> {
    /// Apply one bar command.
    pub fn handle_command(&mut self, command: Command) -> Result<(), EngineError> {
        match command {
            Command::Click { target, button } => self.on_click(target, button),
            Command::Refresh => self.init(),
        }
    }

    fn on_click(&mut self, target: ClickTarget, button: MouseButton) -> Result<(), EngineError> {
        debug!("{button} click on {target:?}");
        match (target, button) {
            (ClickTarget::Workspace { name }, MouseButton::Left) => self.click_workspace(&name),
            (ClickTarget::Workspace { name }, MouseButton::Right) => {
                if self.workspace_by_name(&name).is_some_and(|w| w.is_empty(&self.options)) {
                    self.remove_workspace(&name);
                }
                Ok(())
            }
            (ClickTarget::GroupLabel { prefix }, MouseButton::Left) => self.navigate_group(&prefix),
            (ClickTarget::GroupLabel { prefix }, MouseButton::Right) => {
                self.remove_empty_members(&prefix);
                Ok(())
            }
            (ClickTarget::ProjectLabel { project }, MouseButton::Left) => {
                self.launcher
                    .launch(&script_command(&self.options.scripts.create, &project), "create-script");
                Ok(())
            }
            (ClickTarget::ProjectLabel { project }, MouseButton::Right) => {
                self.remove_empty_members(&format!(".{project}"));
                Ok(())
            }
            (ClickTarget::Icon { addresses, group }, MouseButton::Left) => {
                self.focus_icon(&addresses, group.as_deref())
            }
            _ => Ok(()),
        }
    }

    fn click_workspace(&mut self, name: &str) -> Result<(), EngineError> {
        let Some(ws) = self.workspace_by_name(name) else {
            debug!("click on unknown workspace {name}");
            return Ok(());
        };
        if ws.is_active() {
            self.launcher
                .launch(&self.options.scripts.create_current, "create-current-script");
            return Ok(());
        }
        let target = DispatchTarget::for_workspace(ws, self.options.move_to_monitor)?;
        self.dispatch(&target)
    }

    fn remove_workspace(&self, name: &str) {
        self.launcher
            .launch(&script_command(&self.options.scripts.remove, name), "remove-script");
    }

    /// Members of the group `prefix` on this bar, in display order.
    fn group_members(&self, prefix: &str) -> Vec<&Workspace> {
        let mut members: Vec<&Workspace> = self
            .workspaces
            .iter()
            .filter(|w| w.output() == self.bar_output)
            .filter(|w| project_prefix(w.name()).as_deref() == Some(prefix))
            .collect();
        members.sort_by(|a, b| compare_members(a.name(), b.name()));
        members
    }

    fn remove_empty_members(&self, prefix: &str) {
        for ws in self.group_members(prefix) {
            if ws.is_empty(&self.options) {
                self.remove_workspace(ws.name());
            }
        }
    }

    fn navigate_group(&mut self, prefix: &str) -> Result<(), EngineError> {
        let key = GroupKey::new(prefix, &self.bar_output);
        let members = self.group_members(prefix);
        let Some(name) = self.history.navigation_target(&key, &members) else {
            debug!("group {key} has no members");
            return Ok(());
        };
        let target = match self.workspace_by_name(name) {
            Some(ws) => DispatchTarget::for_workspace(ws, self.options.move_to_monitor)?,
            None => DispatchTarget::workspace_by_name(name, self.options.move_to_monitor),
        };
        self.dispatch(&target)
    }

    fn focus_icon(&mut self, addresses: &[WindowAddress], group: Option<&str>) -> Result<(), EngineError> {
        let chosen = match group {
            Some(prefix) => {
                let workspace_of: HashMap<WindowAddress, String> = self
                    .workspaces
                    .iter()
                    .flat_map(|ws| {
                        ws.windows()
                            .iter()
                            .map(move |w| (w.address.clone(), ws.name().to_string()))
                    })
                    .collect();
                let key = GroupKey::new(prefix, &self.bar_output);
                self.history.select_best_window(addresses, &workspace_of, &key, |name| {
                    self.workspace_by_name(name).is_some_and(|w| w.is_urgent())
                })
            }
            None => addresses.first(),
        };
        let Some(address) = chosen else {
            return Ok(());
        };
        self.dispatch(&DispatchTarget::FocusWindow(address.clone()))
    }
}
