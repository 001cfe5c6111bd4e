//! The reconciliation engine.
//!
//! [`WorkspaceManager`] owns the bar's model of workspaces and windows and
//! keeps it in step with the compositor.  Events and commands mutate it
//! incrementally; [`do_update`](WorkspaceManager::do_update) drains the
//! queued creations and removals, refreshes per-workspace state from fresh
//! snapshots and attaches pending windows.  [`frame`](WorkspaceManager::frame)
//! projects the result for a sink.
//!
//! Every window address is owned by exactly one of: a workspace's window
//! list, the pending-window queue or the orphan map.

mod click;
mod events;
mod persistent;
mod update;


pub use persistent::persistent_names_from_config;

use crate::config::Options;
use crate::dispatch::{DispatchTarget, UnassignedWorkspace};
use crate::icons::IconResolver;
use crate::grouping::LastActiveTable;
use crate::render::{project, Frame, ProjectionInput};
use crate::snapshot::ClientInfo;
use crate::tasks::render_hook;
use crate::thumbnail::ThumbnailCache;
use crate::traits::{Compositor, Launcher};
use crate::window::{PendingWindow, WindowAddress, WindowRepr};
use crate::workspace::{parse_workspace_id, Workspace, WorkspaceRecord};
use log::{debug, error, info, trace, warn};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// Ticks a pending window may wait for its workspace before it is parked
/// as an orphan.
pub const WINDOW_CREATION_TIMEOUT: u32 = 2;

/// Errors surfaced by event and command handlers.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("compositor request failed: {0}")]
    Compositor(String),
    #[error("refusing dispatch: {0}")]
    Unassigned(#[from] UnassignedWorkspace),
}

impl EngineError {
    fn compositor(e: impl fmt::Display) -> Self {
        EngineError::Compositor(e.to_string())
    }
}

/// A window whose workspace is not on this bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orphan {
    /// Last known workspace name, without `special:`.
    pub workspace: String,
    pub window: WindowRepr,
}

#[derive(Debug, Clone)]
struct PendingCreate {
    record: WorkspaceRecord,
    clients: Rc<Vec<ClientInfo>>,
}

/// Which workspace a queued removal refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RemovalKey {
    Id(i32),
    Name(String),
}

impl RemovalKey {
    /// Numeric selectors remove by id, anything else by name.
    fn parse(selector: &str) -> Self {
        match parse_workspace_id(selector) {
            Some(id) => RemovalKey::Id(id),
            None => RemovalKey::Name(
                selector
                    .strip_prefix("name:")
                    .or_else(|| selector.strip_prefix("special:"))
                    .unwrap_or(selector)
                    .to_string(),
            ),
        }
    }

    fn matches(&self, ws: &Workspace) -> bool {
        match self {
            RemovalKey::Id(id) => ws.id() == *id,
            RemovalKey::Name(name) => ws.name() == name,
        }
    }
}

/// Workspace state for one bar.
pub struct WorkspaceManager<C: Compositor> {
    compositor: C,
    options: Options,
    bar_output: String,
    monitor_id: i32,

    workspaces: Vec<Workspace>,
    to_create: Vec<PendingCreate>,
    to_remove: Vec<RemovalKey>,
    pending_windows: Vec<PendingWindow>,
    orphans: HashMap<WindowAddress, Orphan>,

    active_workspace_id: i32,
    active_special: String,
    active_window: Option<WindowAddress>,
    urgent_windows: HashSet<WindowAddress>,
    history: LastActiveTable,

    launcher: Box<dyn Launcher>,
    icons: Box<dyn IconResolver>,
    thumbnails: Option<ThumbnailCache>,
}

impl<C: Compositor> WorkspaceManager<C> {
    pub fn new(
        compositor: C,
        options: Options,
        bar_output: &str,
        launcher: Box<dyn Launcher>,
        icons: Box<dyn IconResolver>,
    ) -> Self {
        Self {
            compositor,
            options,
            bar_output: bar_output.to_string(),
            monitor_id: 0,
            workspaces: Vec::new(),
            to_create: Vec::new(),
            to_remove: Vec::new(),
            pending_windows: Vec::new(),
            orphans: HashMap::new(),
            active_workspace_id: 0,
            active_special: String::new(),
            active_window: None,
            urgent_windows: HashSet::new(),
            history: LastActiveTable::default(),
            launcher,
            icons,
            thumbnails: None,
        }
    }

    /// Enable window thumbnails.
    pub fn with_thumbnails(mut self, cache: ThumbnailCache) -> Self {
        self.thumbnails = Some(cache);
        self
    }

    /// One-time startup: resolve the bar monitor's id, clear stale
    /// thumbnails, then load everything.
    pub fn start(&mut self) -> Result<(), EngineError> {
        let monitors = self.compositor.monitors().map_err(EngineError::compositor)?;
        self.monitor_id = match monitors.iter().find(|m| m.name == self.bar_output) {
            Some(m) => m.id,
            None => {
                error!("monitor {:?} not found, assuming id 0", self.bar_output);
                0
            }
        };
        if let Some(cache) = &self.thumbnails {
            cache.clear();
        }
        info!("managing workspaces on {} (id {})", self.bar_output, self.monitor_id);
        self.init()
    }

    /// Full reset from fresh snapshots.
    pub fn init(&mut self) -> Result<(), EngineError> {
        if let Some(active) = self
            .compositor
            .active_workspace()
            .map_err(EngineError::compositor)?
        {
            self.active_workspace_id = active.id;
        }
        self.initialize_workspaces()
    }

    fn initialize_workspaces(&mut self) -> Result<(), EngineError> {
        debug!("initializing workspaces");
        let scheduled: Vec<RemovalKey> = self.workspaces.iter().map(|w| RemovalKey::Id(w.id())).collect();
        self.to_remove.extend(scheduled);

        let workspaces = self.compositor.workspaces().map_err(EngineError::compositor)?;
        let clients = Rc::new(self.compositor.clients().map_err(EngineError::compositor)?);

        for info in &workspaces {
            let special = info.name.starts_with("special");
            if self.is_on_this_bar(&info.monitor)
                && (!special || self.options.show_special)
                && !self.options.ignore_workspaces.is_match(&info.name)
            {
                self.to_create.push(PendingCreate {
                    record: WorkspaceRecord::from(info),
                    clients: Rc::clone(&clients),
                });
            } else {
                self.extend_orphans(info.id, &clients);
            }
        }

        debug!("initializing persistent workspaces");
        if let Some(config) = self.options.persistent_workspaces.clone() {
            self.load_persistent_from_config(&config, &clients);
        }
        self.load_persistent_from_rules(&clients);
        Ok(())
    }

    //  Accessors

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn workspace_by_name(&self, name: &str) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| w.name() == name)
    }

    pub fn orphans(&self) -> &HashMap<WindowAddress, Orphan> {
        &self.orphans
    }

    pub fn pending_windows(&self) -> &[PendingWindow] {
        &self.pending_windows
    }

    pub fn history(&self) -> &LastActiveTable {
        &self.history
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn bar_output(&self) -> &str {
        &self.bar_output
    }

    pub fn active_workspace_id(&self) -> i32 {
        self.active_workspace_id
    }

    pub fn compositor(&self) -> &C {
        &self.compositor
    }

    /// Project the current state for a sink.
    pub fn frame(&self) -> Frame {
        project(&ProjectionInput {
            workspaces: &self.workspaces,
            options: &self.options,
            bar_output: &self.bar_output,
            urgent_windows: &self.urgent_windows,
            icons: self.icons.as_ref(),
            thumbnails: self.thumbnails.as_ref(),
        })
    }

    //  Shared helpers

    fn is_on_this_bar(&self, monitor: &str) -> bool {
        self.options.all_outputs || monitor == self.bar_output
    }

    /// Unwrap a snapshot, logging a failure.  The caller proceeds without
    /// the data.
    fn fetch<T>(&self, what: &str, result: Result<T, C::Error>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("{what} snapshot unavailable: {e}");
                None
            }
        }
    }

    fn dispatch(&self, target: &DispatchTarget) -> Result<(), EngineError> {
        debug!("dispatch {target}");
        self.compositor.dispatch(target).map_err(EngineError::compositor)
    }

    /// Remove `address` from every workspace and the orphan map.
    fn claim_address(&mut self, address: &WindowAddress) {
        for ws in &mut self.workspaces {
            ws.close_window(address);
        }
        self.orphans.remove(address);
    }

    /// Take a window out of whichever workspace or orphan entry holds it.
    fn detach_window(&mut self, address: &WindowAddress) -> Option<WindowRepr> {
        let from_workspace = self.workspaces.iter_mut().find_map(|ws| ws.close_window(address));
        let from_orphans = self.orphans.remove(address).map(|o| o.window);
        from_workspace.or(from_orphans)
    }

    fn register_orphan(&mut self, pending: PendingWindow) {
        if pending.is_empty(&self.options.rewrite) {
            return;
        }
        let address = pending.address().clone();
        self.claim_address(&address);
        trace!("orphaned window {address} on {}", pending.workspace_name());
        self.orphans.insert(
            address,
            Orphan {
                workspace: pending.workspace_name().to_string(),
                window: pending.repr(&self.options.rewrite),
            },
        );
    }

    /// Park the clients of workspace `id` as orphans.
    fn extend_orphans(&mut self, id: i32, clients: &[ClientInfo]) {
        for client in clients.iter().filter(|c| c.workspace.id == id) {
            self.register_orphan(PendingWindow::from_client(client));
        }
    }

    fn run_hook(&self, template: &str, name: &str, monitor: &str, id: i32, label: &str) {
        if template.is_empty() {
            return;
        }
        self.launcher.launch(&render_hook(template, name, monitor, id), label);
    }
}
