//! Entry point for the **hyprws** bar module.
//!
//! Spawns the compositor event reader and the command listener on
//! background threads and runs the [`Service`](hyprws::service::Service) on
//! the main thread.
//!
//! When the `sink-gtk` feature is enabled the main thread runs the GLib
//! main loop (GTK4 requires it) and polls the message channel from there.
//! Without the feature, frames are written to stdout as JSON lines.
//!
//! ```text
//! hyprws [--output <monitor>] [--config <path>] [--socket <path>]
//! ```

use hyprws::command::Message;
use hyprws::config::{Config, Options};
use hyprws::engine::WorkspaceManager;
use hyprws::hyprland::events::HyprlandEvents;
use hyprws::hyprland::ipc::HyprlandIpc;
use hyprws::icons::DesktopEntryIcons;
use hyprws::ipc::listener::CommandListener;
use hyprws::tasks::ShellLauncher;
use hyprws::thumbnail::{ThumbnailCache, WorkspaceLookup};
use hyprws::traits::{Compositor, MessageSource};
use hyprws::window::WindowAddress;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::time::Duration;

/// Command-line overrides.
#[derive(Default)]
struct Args {
    output: Option<String>,
    config: Option<PathBuf>,
    socket: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = Self::default();
        let mut it = std::env::args().skip(1);
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--output" => args.output = it.next(),
                "--config" => args.config = it.next().map(PathBuf::from),
                "--socket" => args.socket = it.next().map(PathBuf::from),
                other => warn!("ignoring unknown argument {:?}", other),
            }
        }
        args
    }
}

/// Load the config from `path` or the default location, falling back to
/// compiled-in defaults.
fn load_config(path: Option<PathBuf>) -> (Config, Option<PathBuf>) {
    let Some(path) = path.or_else(Config::default_path) else {
        info!("no config location, using defaults");
        return (Config::default(), None);
    };
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            (cfg, Some(path))
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            (Config::default(), Some(path))
        }
    }
}

/// The bar's monitor: explicit, else the focused one, else the first.
fn resolve_output(ipc: &HyprlandIpc, wanted: Option<String>) -> Option<String> {
    if wanted.is_some() {
        return wanted;
    }
    let monitors = match ipc.monitors() {
        Ok(m) => m,
        Err(e) => {
            error!("failed to query monitors: {}", e);
            return None;
        }
    };
    info!("found {} monitor(s)", monitors.len());
    monitors
        .iter()
        .find(|m| m.focused)
        .or(monitors.first())
        .map(|m| m.name.clone())
}

//  Main

fn main() {
    env_logger::init();

    let args = Args::parse();
    let (config, config_path) = load_config(args.config);
    let options = Options::from_config(&config);
    let interval = options.interval;

    let ipc = match HyprlandIpc::from_env() {
        Ok(ipc) => ipc,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    let Some(output) = resolve_output(&ipc, args.output.or(config.output.clone())) else {
        error!("no monitor to attach to");
        std::process::exit(1);
    };

    let mut engine = WorkspaceManager::new(
        ipc.clone(),
        options,
        &output,
        Box::new(ShellLauncher),
        Box::new(DesktopEntryIcons::from_env()),
    );
    if config.thumbnails {
        let lookup_ipc = ipc.clone();
        let lookup: WorkspaceLookup =
            Arc::new(move |address: &WindowAddress| match lookup_ipc.workspace_of(address) {
                Ok(workspace) => workspace,
                Err(e) => {
                    warn!("thumbnail check failed: {}", e);
                    None
                }
            });
        let dir = ThumbnailCache::default_dir().join(&output);
        engine = engine.with_thumbnails(ThumbnailCache::new(dir, lookup));
    }
    if let Err(e) = engine.start() {
        error!("startup failed: {}", e);
        std::process::exit(1);
    }

    let (tx, rx) = mpsc::channel::<Message>();
    match HyprlandEvents::from_env() {
        Ok(events) => spawn_source("events", events, tx.clone()),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
    let socket = args.socket.unwrap_or_else(|| CommandListener::default_path(&output));
    spawn_source("commands", CommandListener::new(socket), tx.clone());

    let css_path = config_path.and_then(|p| p.parent().map(|d| d.join("style.css")));
    start_event_loop(engine, &output, tx, rx, interval, css_path);
}

//  Event loops

#[cfg(feature = "sink-gtk")]
fn start_event_loop<C: Compositor + 'static>(
    engine: WorkspaceManager<C>,
    output: &str,
    tx: mpsc::Sender<Message>,
    rx: mpsc::Receiver<Message>,
    interval: Duration,
    css_path: Option<PathBuf>,
) {
    use hyprws::service::Service;

    let result = hyprws::sink::gtk::run_main_loop(output, tx, rx, css_path, interval, |bar| {
        Service::new(engine, bar)
    });
    if let Err(e) = result {
        error!("failed to initialise GTK4: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "sink-gtk"))]
fn start_event_loop<C: Compositor>(
    engine: WorkspaceManager<C>,
    output: &str,
    tx: mpsc::Sender<Message>,
    rx: mpsc::Receiver<Message>,
    interval: Duration,
    _css_path: Option<PathBuf>,
) {
    use hyprws::service::Service;
    use hyprws::sink::json::JsonLineSink;

    // Only the sources may keep the channel open.
    drop(tx);
    info!("hyprws running on {}", output);
    Service::new(engine, JsonLineSink::new(std::io::stdout())).run(rx, interval);
}

//  Helpers

fn spawn_source<S>(name: &str, mut source: S, tx: mpsc::Sender<Message>)
where
    S: MessageSource + 'static,
{
    let label = name.to_string();
    let spawned = std::thread::Builder::new()
        .name(label.clone())
        .spawn(move || {
            if let Err(e) = source.run(tx) {
                error!("{} source error: {}", label, e);
            }
        });
    if let Err(e) = spawned {
        error!("cannot spawn {} thread: {}", name, e);
    }
}
