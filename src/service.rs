//! The owner loop.
//!
//! [`Service`] owns the engine and the sink.  Message sources run on their
//! own threads and send into one channel; the service drains it in arrival
//! order, refreshes after every batch and on every interval tick, and hands
//! the sink a new frame only when the projection changed.

use crate::command::Message;
use crate::engine::{EngineError, WorkspaceManager};
use crate::render::Frame;
use crate::traits::{Compositor, RenderSink};
use log::{debug, error, info, warn};
use std::sync::mpsc;
use std::time::{Duration, Instant};

pub struct Service<C: Compositor, S: RenderSink> {
    engine: WorkspaceManager<C>,
    sink: S,
    last_frame: Option<Frame>,
}

impl<C: Compositor, S: RenderSink> Service<C, S> {
    pub fn new(engine: WorkspaceManager<C>, sink: S) -> Self {
        Self {
            engine,
            sink,
            last_frame: None,
        }
    }

    pub fn engine(&self) -> &WorkspaceManager<C> {
        &self.engine
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Apply one message.  Handler errors are logged here and go no
    /// further.
    pub fn handle(&mut self, message: Message) {
        let result = match message {
            Message::Compositor(event) => self.engine.handle_event(event),
            Message::Command(command) => {
                debug!("command: {:?}", command);
                self.engine.handle_command(command)
            }
        };
        match result {
            Ok(()) => {}
            Err(EngineError::Unassigned(e)) => error!("{e}"),
            Err(e) => warn!("{e}"),
        }
    }

    /// Run a tick and render if the frame changed.  Returns whether the
    /// sink was called.
    pub fn refresh(&mut self) -> bool {
        self.engine.do_update();
        let frame = self.engine.frame();
        if self.last_frame.as_ref() == Some(&frame) {
            return false;
        }
        self.sink.render(&frame);
        self.last_frame = Some(frame);
        true
    }

    /// Handle everything already queued without blocking.  Returns `false`
    /// once every sender is gone.
    pub fn pump(&mut self, rx: &mpsc::Receiver<Message>) -> bool {
        let mut handled = false;
        let connected = loop {
            match rx.try_recv() {
                Ok(message) => {
                    self.handle(message);
                    handled = true;
                }
                Err(mpsc::TryRecvError::Empty) => break true,
                Err(mpsc::TryRecvError::Disconnected) => break false,
            }
        };
        if handled {
            self.refresh();
        }
        connected
    }

    /// Block on `rx`, refreshing after each batch of messages and every
    /// `interval`.  Returns when every sender is gone.
    pub fn run(&mut self, rx: mpsc::Receiver<Message>, interval: Duration) {
        self.refresh();
        let mut next_tick = Instant::now() + interval;
        loop {
            let timeout = next_tick.saturating_duration_since(Instant::now());
            match rx.recv_timeout(timeout) {
                Ok(message) => {
                    self.handle(message);
                    if !self.pump(&rx) {
                        break;
                    }
                    self.refresh();
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    self.refresh();
                    next_tick = Instant::now() + interval;
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
        info!("all message sources closed, exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::config::Options;
    use crate::dispatch::DispatchTarget;
    use crate::event::Event;
    use crate::icons::IconResolver;
    use crate::snapshot::{ClientInfo, MonitorInfo, WorkspaceInfo, WorkspaceRule};
    use crate::tasks::ShellLauncher;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, thiserror::Error)]
    #[error("unused")]
    struct Never;

    /// One monitor and whatever workspaces the test puts in.
    #[derive(Default, Clone)]
    struct Stub(Rc<RefCell<Vec<WorkspaceInfo>>>);

    impl Compositor for Stub {
        type Error = Never;

        fn workspaces(&self) -> Result<Vec<WorkspaceInfo>, Never> {
            Ok(self.0.borrow().clone())
        }

        fn clients(&self) -> Result<Vec<ClientInfo>, Never> {
            Ok(Vec::new())
        }

        fn monitors(&self) -> Result<Vec<MonitorInfo>, Never> {
            Ok(vec![MonitorInfo {
                name: "DP-1".into(),
                ..Default::default()
            }])
        }

        fn workspace_rules(&self) -> Result<Vec<WorkspaceRule>, Never> {
            Ok(Vec::new())
        }

        fn active_workspace(&self) -> Result<Option<WorkspaceInfo>, Never> {
            Ok(None)
        }

        fn dispatch(&self, _: &DispatchTarget) -> Result<(), Never> {
            Ok(())
        }
    }

    struct NoIcons;

    impl IconResolver for NoIcons {
        fn icon_for_class(&self, _: &str) -> Option<String> {
            None
        }
    }

    #[derive(Default)]
    struct CountingSink(Vec<Frame>);

    impl RenderSink for CountingSink {
        fn render(&mut self, frame: &Frame) {
            self.0.push(frame.clone());
        }
    }

    fn info(id: i32) -> WorkspaceInfo {
        WorkspaceInfo {
            id,
            name: id.to_string(),
            monitor: "DP-1".into(),
            windows: 0,
        }
    }

    fn service(stub: &Stub) -> Service<Stub, CountingSink> {
        let mut engine = WorkspaceManager::new(
            stub.clone(),
            Options::default(),
            "DP-1",
            Box::new(ShellLauncher),
            Box::new(NoIcons),
        );
        engine.start().unwrap();
        Service::new(engine, CountingSink::default())
    }

    #[test]
    fn renders_only_on_change() {
        let stub = Stub::default();
        stub.0.borrow_mut().push(info(1));
        let mut svc = service(&stub);

        assert!(svc.refresh());
        assert!(!svc.refresh());

        stub.0.borrow_mut().push(info(2));
        svc.handle(Event::WorkspaceCreated { id: 2, name: "2".into() }.into());
        assert!(svc.refresh());
        assert_eq!(svc.sink().0.len(), 2);
        assert_eq!(svc.engine().workspaces().len(), 2);
    }

    #[test]
    fn run_drains_until_senders_are_gone() {
        let stub = Stub::default();
        stub.0.borrow_mut().push(info(1));
        let mut svc = service(&stub);

        let (tx, rx) = mpsc::channel();
        tx.send(Message::Command(Command::Refresh)).unwrap();
        drop(tx);
        svc.run(rx, Duration::from_secs(60));

        assert_eq!(svc.sink().0.len(), 1);
        assert_eq!(svc.engine().workspaces().len(), 1);
    }

    #[test]
    fn pump_reports_disconnect() {
        let stub = Stub::default();
        let mut svc = service(&stub);
        let (tx, rx) = mpsc::channel::<Message>();
        assert!(svc.pump(&rx));
        drop(tx);
        assert!(!svc.pump(&rx));
    }
}
