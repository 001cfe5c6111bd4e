//! [`MessageSource`] reading Hyprland's event socket.
//!
//! Hyprland broadcasts one `EVENT>>payload` line per event on
//! `.socket2.sock`.  Lines are parsed into typed [`Event`]s here; events the
//! engine does not handle are dropped and malformed ones are logged and
//! skipped.  Payloads are not guaranteed to be UTF-8 (window titles carry
//! whatever the client set), so invalid bytes are replaced rather than
//! ending the reader.

use super::ipc::{instance_dir, IpcError};
use crate::command::Message;
use crate::event::Event;
use crate::traits::MessageSource;
use log::{debug, info, trace, warn};
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Errors produced by the event reader.
#[derive(Debug, thiserror::Error)]
pub enum EventSourceError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Ipc(#[from] IpcError),
}

/// Reads compositor events from a Unix stream socket.
pub struct HyprlandEvents {
    path: PathBuf,
}

impl HyprlandEvents {
    /// Use the event socket of the running instance.
    pub fn from_env() -> Result<Self, EventSourceError> {
        Ok(Self::new(instance_dir()?.join(".socket2.sock")))
    }

    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> EventSourceError {
        EventSourceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl MessageSource for HyprlandEvents {
    type Error = EventSourceError;

    /// Connect and forward events until the compositor closes the socket or
    /// the receiver goes away.
    fn run(&mut self, sink: mpsc::Sender<Message>) -> Result<(), Self::Error> {
        let stream = UnixStream::connect(&self.path).map_err(|e| self.io_error(e))?;
        info!("reading events from {}", self.path.display());

        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf).map_err(|e| self.io_error(e))?;
            if read == 0 {
                break;
            }
            let decoded = String::from_utf8_lossy(&buf);
            let line = decoded.trim_end_matches(|c: char| c == '\n' || c == '\r');
            if line.is_empty() {
                continue;
            }
            match Event::parse(line) {
                Ok(Some(event)) => {
                    if sink.send(event.into()).is_err() {
                        debug!("sink closed, stopping event reader");
                        return Ok(());
                    }
                }
                Ok(None) => trace!("unhandled event {line:?}"),
                Err(e) => warn!("skipping event: {e}"),
            }
        }
        info!("event socket closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WindowAddress;
    use std::io::Write;
    use std::os::unix::net::UnixListener;

    #[test]
    fn forwards_parsed_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".socket2.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream
                .write_all(
                    b"workspacev2>>3,3\n\
                      fullscreen>>1\n\
                      openwindow>>\n\
                      closewindow>>5f2a\n",
                )
                .unwrap();
        });

        let (tx, rx) = mpsc::channel();
        HyprlandEvents::new(&path).run(tx).unwrap();
        server.join().unwrap();

        let messages: Vec<Message> = rx.try_iter().collect();
        assert_eq!(
            messages,
            [
                Message::Compositor(Event::WorkspaceActivated {
                    id: 3,
                    name: "3".into()
                }),
                Message::Compositor(Event::WindowClosed {
                    address: WindowAddress::new("5f2a")
                }),
            ]
        );
    }

    #[test]
    fn invalid_utf8_does_not_stop_the_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".socket2.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream
                .write_all(b"windowtitlev2>>5f2a,caf\xe9 title\nclosewindow>>5f2a\n")
                .unwrap();
        });

        let (tx, rx) = mpsc::channel();
        HyprlandEvents::new(&path).run(tx).unwrap();
        server.join().unwrap();

        let messages: Vec<Message> = rx.try_iter().collect();
        assert_eq!(
            messages,
            [
                Message::Compositor(Event::WindowTitleChanged {
                    address: WindowAddress::new("5f2a"),
                    title: "caf\u{fffd} title".into(),
                }),
                Message::Compositor(Event::WindowClosed {
                    address: WindowAddress::new("5f2a")
                }),
            ]
        );
    }

    #[test]
    fn missing_socket_is_an_error() {
        let (tx, _rx) = mpsc::channel();
        let err = HyprlandEvents::new("/nonexistent/.socket2.sock").run(tx).unwrap_err();
        assert!(matches!(err, EventSourceError::Io { .. }));
    }
}
