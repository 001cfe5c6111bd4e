//! [`Compositor`] implementation backed by Hyprland IPC.
//!
//! Talks to Hyprland through its command socket at
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket.sock`.
//! Every request opens a short-lived connection, writes one command and
//! reads the reply until the compositor closes the stream.

use crate::dispatch::DispatchTarget;
use crate::snapshot::{ClientInfo, MonitorInfo, WorkspaceInfo, WorkspaceRule};
use crate::traits::Compositor;
use crate::window::{normalize_workspace_name, WindowAddress};
use log::trace;
use serde::de::DeserializeOwned;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

/// Errors that can occur when talking to Hyprland.
#[derive(Debug, thiserror::Error)]
#[error("hyprland IPC error: {0}")]
pub struct IpcError(String);

/// Directory holding this Hyprland instance's sockets.
pub fn instance_dir() -> Result<PathBuf, IpcError> {
    let runtime_dir =
        std::env::var("XDG_RUNTIME_DIR").map_err(|_| IpcError("XDG_RUNTIME_DIR not set".into()))?;
    let his = std::env::var("HYPRLAND_INSTANCE_SIGNATURE")
        .map_err(|_| IpcError("HYPRLAND_INSTANCE_SIGNATURE not set".into()))?;
    Ok(PathBuf::from(runtime_dir).join("hypr").join(his))
}

/// Hyprland-backed compositor.
#[derive(Debug, Clone)]
pub struct HyprlandIpc {
    socket: PathBuf,
}

impl HyprlandIpc {
    /// Use the command socket of the running instance.
    pub fn from_env() -> Result<Self, IpcError> {
        Ok(Self::with_socket(instance_dir()?.join(".socket.sock")))
    }

    /// Use an explicit socket path.
    pub fn with_socket(socket: impl AsRef<Path>) -> Self {
        Self {
            socket: socket.as_ref().to_path_buf(),
        }
    }

    pub fn socket(&self) -> &Path {
        &self.socket
    }

    /// Send a raw command and return the reply.
    fn request(&self, command: &str) -> Result<String, IpcError> {
        let mut stream = UnixStream::connect(&self.socket)
            .map_err(|e| IpcError(format!("connect to {}: {}", self.socket.display(), e)))?;
        stream
            .write_all(command.as_bytes())
            .map_err(|e| IpcError(format!("write: {}", e)))?;

        let mut response = Vec::new();
        stream
            .read_to_end(&mut response)
            .map_err(|e| IpcError(format!("read: {}", e)))?;
        String::from_utf8(response).map_err(|e| IpcError(format!("utf-8: {}", e)))
    }

    /// Send a JSON query (`j/<what>`) and decode the reply.
    fn query<T: DeserializeOwned>(&self, what: &str) -> Result<T, IpcError> {
        let json = self.request(&format!("j/{}", what))?;
        trace!("j/{what}: {} bytes", json.len());
        serde_json::from_str(&json).map_err(|e| IpcError(format!("parse {}: {}", what, e)))
    }

    /// Current workspace of `address`, or `None` when the window is gone.
    pub fn workspace_of(&self, address: &WindowAddress) -> Result<Option<String>, IpcError> {
        Ok(self
            .clients()?
            .into_iter()
            .find(|c| &c.address == address)
            .map(|c| normalize_workspace_name(&c.workspace.name).to_string()))
    }
}

impl Compositor for HyprlandIpc {
    type Error = IpcError;

    fn workspaces(&self) -> Result<Vec<WorkspaceInfo>, IpcError> {
        self.query("workspaces")
    }

    fn clients(&self) -> Result<Vec<ClientInfo>, IpcError> {
        self.query("clients")
    }

    fn monitors(&self) -> Result<Vec<MonitorInfo>, IpcError> {
        self.query("monitors")
    }

    fn workspace_rules(&self) -> Result<Vec<WorkspaceRule>, IpcError> {
        self.query("workspacerules")
    }

    fn active_workspace(&self) -> Result<Option<WorkspaceInfo>, IpcError> {
        // An empty object comes back while no workspace is focused.
        let active: WorkspaceInfo = self.query("activeworkspace")?;
        Ok((active.id != 0 || !active.name.is_empty()).then_some(active))
    }

    fn dispatch(&self, target: &DispatchTarget) -> Result<(), IpcError> {
        let response = self.request(&format!("/dispatch {}", target))?;
        if response.trim() == "ok" {
            Ok(())
        } else {
            Err(IpcError(format!("dispatch {}: {}", target, response.trim())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;
    use std::sync::mpsc;

    /// Serve one canned reply per expected request and report what was
    /// asked.
    fn serve(dir: &Path, replies: Vec<&'static str>) -> (HyprlandIpc, mpsc::Receiver<String>) {
        let path = dir.join(".socket.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            for reply in replies {
                let (mut stream, _) = listener.accept().unwrap();
                let mut buf = [0u8; 512];
                let n = stream.read(&mut buf).unwrap();
                // the test may not care what was asked
                let _ = tx.send(String::from_utf8_lossy(&buf[..n]).into_owned());
                stream.write_all(reply.as_bytes()).unwrap();
            }
        });
        (HyprlandIpc::with_socket(path), rx)
    }

    #[test]
    fn queries_decode_replies() {
        let dir = tempfile::tempdir().unwrap();
        let (ipc, asked) = serve(
            dir.path(),
            vec![r#"[{"id": 3, "name": "3", "monitor": "DP-1", "windows": 2, "hasfullscreen": false}]"#],
        );
        let workspaces = ipc.workspaces().unwrap();
        assert_eq!(asked.recv().unwrap(), "j/workspaces");
        assert_eq!(workspaces[0].monitor, "DP-1");
        assert_eq!(workspaces[0].windows, 2);
    }

    #[test]
    fn empty_active_workspace_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let (ipc, asked) = serve(dir.path(), vec!["{}"]);
        assert!(ipc.active_workspace().unwrap().is_none());
        assert_eq!(asked.recv().unwrap(), "j/activeworkspace");
    }

    #[test]
    fn dispatch_requires_ok() {
        let dir = tempfile::tempdir().unwrap();
        let (ipc, asked) = serve(dir.path(), vec!["ok", "Invalid dispatcher"]);
        let target = DispatchTarget::FocusWindow("5f2a".into());

        ipc.dispatch(&target).unwrap();
        assert_eq!(asked.recv().unwrap(), "/dispatch focuswindow address:0x5f2a");
        assert!(ipc.dispatch(&target).is_err());
    }

    #[test]
    fn workspace_lookup_strips_special() {
        let dir = tempfile::tempdir().unwrap();
        let (ipc, asked) = serve(
            dir.path(),
            vec![r#"[{"address": "0xbeef", "workspace": {"id": -98, "name": "special:term"}}]"#],
        );
        assert_eq!(ipc.workspace_of(&"beef".into()).unwrap().as_deref(), Some("term"));
        assert_eq!(asked.recv().unwrap(), "j/clients");
    }

    #[test]
    fn missing_socket_is_an_error() {
        let ipc = HyprlandIpc::with_socket("/nonexistent/hyprws.sock");
        assert!(ipc.monitors().is_err());
    }
}
