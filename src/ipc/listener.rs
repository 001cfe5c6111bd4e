//! Unix-socket [`MessageSource`] for bar commands.
//!
//! Binds a Unix stream socket and accepts one connection at a time.
//! Each line received is parsed as a JSON-encoded [`Command`].
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`:
//!
//! ```json
//! {"Click":{"target":{"Workspace":{"name":"3"}},"button":"left"}}
//! {"Click":{"target":{"GroupLabel":{"prefix":".web"}},"button":3}}
//! {"Click":{"target":{"Icon":{"addresses":["0x5f2a"],"group":".web"}},"button":1}}
//! "Refresh"
//! ```

use crate::command::{Command, Message};
use crate::traits::MessageSource;
use log::{debug, error, info};
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// A [`MessageSource`] that listens on a Unix stream socket for
/// JSON-encoded commands.
///
/// Each accepted connection can send multiple newline-delimited JSON
/// commands.  When the connection closes, the listener waits for the
/// next one.
pub struct CommandListener {
    path: PathBuf,
}

/// Errors produced by the command listener.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandListener {
    /// Create a new listener bound to `path`.
    ///
    /// The socket file is created when [`run`](MessageSource::run) is called.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `$XDG_RUNTIME_DIR/hyprws-<output>.sock`, one socket per bar.
    pub fn default_path(output: &str) -> PathBuf {
        let runtime = std::env::var_os("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        runtime.join(format!("hyprws-{}.sock", output))
    }

    /// The filesystem path of the socket.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MessageSource for CommandListener {
    type Error = ListenerError;

    /// Bind the socket and start accepting connections.
    ///
    /// This method **blocks** indefinitely.  Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Message>) -> Result<(), Self::Error> {
        // Remove stale socket if present.
        let _ = std::fs::remove_file(&self.path);

        let listener = UnixListener::bind(&self.path)?;
        info!("listening on {}", self.path.display());

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    error!("accept error: {}", e);
                    continue;
                }
            };
            debug!("client connected");
            for line in BufReader::new(stream).lines() {
                let text = match line {
                    Ok(text) => text,
                    Err(e) => {
                        error!("read error: {}", e);
                        break;
                    }
                };
                if text.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Command>(&text) {
                    Ok(cmd) => {
                        debug!("received {:?}", cmd);
                        if sink.send(cmd.into()).is_err() {
                            info!("sink closed, shutting down");
                            return Ok(());
                        }
                    }
                    Err(e) => error!("bad command {:?}: {}", text, e),
                }
            }
            debug!("client disconnected");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{ClickTarget, MouseButton};
    use std::io::Write;
    use std::os::unix::net::UnixStream;
    use std::time::Duration;

    fn spawn_listener(path: &Path) -> mpsc::Receiver<Message> {
        let (tx, rx) = mpsc::channel();
        let path = path.to_path_buf();
        std::thread::spawn(move || {
            let _ = CommandListener::new(&path).run(tx);
        });
        // Give the listener a moment to bind.
        std::thread::sleep(Duration::from_millis(150));
        rx
    }

    #[test]
    fn commands_arrive_as_messages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bar.sock");
        let rx = spawn_listener(&path);

        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            writeln!(stream, r#"{{"Click":{{"target":{{"Workspace":{{"name":"3"}}}},"button":"left"}}}}"#).unwrap();
            writeln!(stream).unwrap();
            writeln!(stream, r#""Refresh""#).unwrap();
            stream.shutdown(std::net::Shutdown::Write).unwrap();
        }

        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(
            first,
            Message::Command(Command::Click {
                target: ClickTarget::Workspace { name: "3".into() },
                button: MouseButton::Left,
            })
        );
        assert_eq!(second, Message::Command(Command::Refresh));
    }

    #[test]
    fn malformed_json_does_not_crash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bar.sock");
        let rx = spawn_listener(&path);

        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            writeln!(stream, "not json at all").unwrap();
            writeln!(stream, r#""Refresh""#).unwrap();
            stream.shutdown(std::net::Shutdown::Write).unwrap();
        }

        // Only the valid command should arrive.
        let msg = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(msg, Message::Command(Command::Refresh));
        assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());
    }

    #[test]
    fn default_path_is_per_output() {
        let a = CommandListener::default_path("DP-1");
        let b = CommandListener::default_path("HDMI-A-1");
        assert_ne!(a, b);
        assert!(a.to_string_lossy().ends_with("hyprws-DP-1.sock"));
    }
}
