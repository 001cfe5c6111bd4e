//! Core traits that decouple hyprws from the compositor, the transports
//! that feed it and the surface that draws it.
//!
//! Every concrete backend (Hyprland IPC, a Unix-socket listener, a test
//! harness, …) implements one of these traits.  The
//! [`WorkspaceManager`](crate::engine::WorkspaceManager) only depends on
//! these abstractions.

use crate::command::Message;
use crate::dispatch::DispatchTarget;
use crate::render::Frame;
use crate::snapshot::{ClientInfo, MonitorInfo, WorkspaceInfo, WorkspaceRule};
use std::sync::mpsc;

/// Abstraction over the compositor's request/reply channel.
///
/// An implementation might talk to Hyprland via IPC, or it might serve
/// canned snapshots in tests.  Every call is a fresh snapshot; nothing is
/// cached between calls.
pub trait Compositor {
    /// The error type produced by this compositor.
    type Error: std::error::Error + Send + 'static;

    /// All workspaces the compositor knows about.
    fn workspaces(&self) -> Result<Vec<WorkspaceInfo>, Self::Error>;

    /// All mapped client windows.
    fn clients(&self) -> Result<Vec<ClientInfo>, Self::Error>;

    fn monitors(&self) -> Result<Vec<MonitorInfo>, Self::Error>;

    /// Configured workspace rules, persistent or not.
    fn workspace_rules(&self) -> Result<Vec<WorkspaceRule>, Self::Error>;

    /// The focused workspace, or `None` when the compositor reports none.
    fn active_workspace(&self) -> Result<Option<WorkspaceInfo>, Self::Error>;

    /// Send a dispatch.  The compositor must acknowledge it.
    fn dispatch(&self, target: &DispatchTarget) -> Result<(), Self::Error>;
}

//  Message Source

/// A source of [`Message`]s for the engine.
///
/// Implementations listen on some transport (the compositor event socket,
/// the bar's command socket, an in-memory channel) and forward parsed
/// messages into the provided [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](MessageSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received message must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait MessageSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Message`] into `sink`.
    fn run(&mut self, sink: mpsc::Sender<Message>) -> Result<(), Self::Error>;
}

//  Render Sink

/// Whatever draws the bar.  Receives a new [`Frame`] whenever the projected
/// state changes.
pub trait RenderSink {
    fn render(&mut self, frame: &Frame);
}

//  Launcher

/// Runs external commands (hooks and helper scripts) without blocking the
/// caller.  Failures are reported by the implementation, never returned.
pub trait Launcher {
    /// Run `command` through the shell.  `label` names it in logs.
    fn launch(&self, command: &str, label: &str);
}
