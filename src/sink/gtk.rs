//! GTK4 + layer-shell bar that runs on the **main thread**.
//!
//! # Widget tree
//!
//! ```text
//! window                         (layer-shell, anchored top)
//! └ .workspaces                  (horizontal box)
//!     ├ .workspace               (one per shown workspace)
//!     │   ├ label
//!     │   └ .window-icon …
//!     ├ .group                   (collapsed project)
//!     │   ├ .group-open / .group-label
//!     │   ├ .window-icon …
//!     │   └ .group-close
//!     ├ .group-start / .group-end
//!     └ …
//! ```
//!
//! # CSS selectors
//!
//! | Selector                      | Targets                              |
//! |-------------------------------|--------------------------------------|
//! | `.workspace`                  | Every workspace button               |
//! | `.group`                      | A collapsed project row              |
//! | `.group-open`, `.group-close` | Brackets around a collapsed project  |
//! | `.group-label`                | Label of a collapsed project         |
//! | `.group-start`                | Opening piece of an expanded project |
//! | `.group-end`                  | Closing piece of an expanded project |
//! | `.window-icon`                | Window icons                         |
//! | `.active`, `.urgent` …        | State flags, one class each          |
//!
//! Clicks are sent back into the service's channel as
//! [`Command::Click`]s.

use crate::command::{ClickTarget, Command, Message, MouseButton};
use crate::render::{Frame, IconView, Item, StyleFlags};
use crate::service::Service;
use crate::traits::{Compositor, RenderSink};
use gtk4::prelude::*;
use gtk4::{gdk, glib};
use gtk4_layer_shell::LayerShell;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

//  Default CSS

const DEFAULT_CSS: &str = r#"
.workspaces > * {
    padding: 0 6px;
    margin: 0 2px;
    border-radius: 4px;
}

.workspace.active,
.group.active-group {
    background-color: rgba(255, 255, 255, 0.2);
}

.workspace.urgent,
.group.urgent,
.window-icon.urgent {
    background-color: rgba(235, 77, 75, 0.6);
}

.workspace.empty {
    opacity: 0.5;
}
"#;

/// Draws frames into a horizontal box.
pub struct GtkBar {
    container: gtk4::Box,
    commands: mpsc::Sender<Message>,
}

impl GtkBar {
    pub fn new(container: gtk4::Box, commands: mpsc::Sender<Message>) -> Self {
        Self { container, commands }
    }

    fn item_widget(&self, item: &Item, icon_size: i32) -> gtk4::Box {
        match item {
            Item::Workspace(view) => {
                let widget = self.piece("workspace", &view.label, &view.style, &view.click);
                self.append_icons(&widget, &view.icons, icon_size);
                widget.set_visible(view.shown);
                widget
            }
            Item::CollapsedGroup(row) => {
                let widget = gtk4::Box::new(gtk4::Orientation::Horizontal, 4);
                widget.add_css_class("group");
                apply_style(&widget, &row.style);
                widget.append(&bracket("group-open", &row.open));
                widget.append(&self.piece("group-label", &row.label, &StyleFlags::default(), &row.click));
                self.append_icons(&widget, &row.icons, icon_size);
                widget.append(&bracket("group-close", &row.close));
                widget.set_tooltip_text(Some(row.members.join(", ").as_str()));
                widget
            }
            Item::GroupStart(start) => self.piece("group-start", &start.label, &start.style, &start.click),
            Item::GroupEnd { style } => {
                let widget = gtk4::Box::new(gtk4::Orientation::Horizontal, 0);
                widget.add_css_class("group-end");
                apply_style(&widget, style);
                widget.append(&gtk4::Label::new(Some("]")));
                widget
            }
        }
    }

    fn piece(&self, class: &str, label: &str, style: &StyleFlags, click: &ClickTarget) -> gtk4::Box {
        let widget = gtk4::Box::new(gtk4::Orientation::Horizontal, 4);
        widget.add_css_class(class);
        apply_style(&widget, style);
        widget.append(&gtk4::Label::new(Some(label)));
        self.on_click(&widget, click.clone());
        widget
    }

    fn append_icons(&self, container: &gtk4::Box, icons: &[IconView], size: i32) {
        for icon in icons {
            let image = if Path::new(&icon.icon).is_absolute() {
                gtk4::Image::from_file(&icon.icon)
            } else {
                gtk4::Image::from_icon_name(&icon.icon)
            };
            image.set_pixel_size(size);
            image.add_css_class("window-icon");
            if icon.urgent {
                image.add_css_class("urgent");
            }
            image.set_tooltip_text(Some(icon.tooltip.as_str()));
            self.on_click(&image, icon.click.clone());
            container.append(&image);
        }
    }

    fn on_click(&self, widget: &impl IsA<gtk4::Widget>, target: ClickTarget) {
        let gesture = gtk4::GestureClick::new();
        gesture.set_button(0);
        let tx = self.commands.clone();
        gesture.connect_pressed(move |gesture, _, _, _| {
            let Some(button) = MouseButton::from_number(u64::from(gesture.current_button())) else {
                return;
            };
            gesture.set_state(gtk4::EventSequenceState::Claimed);
            let command = Command::Click {
                target: target.clone(),
                button,
            };
            if tx.send(command.into()).is_err() {
                warn!("service gone, dropping click");
            }
        });
        widget.add_controller(gesture);
    }
}

fn bracket(class: &str, text: &str) -> gtk4::Label {
    let label = gtk4::Label::new(Some(text));
    label.add_css_class(class);
    label
}

fn apply_style(widget: &impl IsA<gtk4::Widget>, style: &StyleFlags) {
    for class in style.classes() {
        widget.add_css_class(class);
    }
}

impl RenderSink for GtkBar {
    fn render(&mut self, frame: &Frame) {
        while let Some(child) = self.container.first_child() {
            self.container.remove(&child);
        }
        for item in &frame.items {
            self.container.append(&self.item_widget(item, frame.icon_size));
        }
        debug!("drew {} items", frame.items.len());
    }
}

//  Public API

/// Build the bar window on `output` and run the GLib main loop on the
/// **current** (main) thread.  `build` receives the bar sink and returns
/// the service that will own it.
pub fn run_main_loop<C, F>(
    output: &str,
    commands: mpsc::Sender<Message>,
    rx: mpsc::Receiver<Message>,
    css_path: Option<PathBuf>,
    interval: Duration,
    build: F,
) -> Result<(), glib::BoolError>
where
    C: Compositor + 'static,
    F: FnOnce(GtkBar) -> Service<C, GtkBar>,
{
    gtk4::init()?;
    info!("GTK4 initialised on main thread");
    load_css(&css_path);

    let window = gtk4::Window::new();
    window.init_layer_shell();
    window.set_layer(gtk4_layer_shell::Layer::Top);
    window.set_namespace("hyprws");
    window.set_anchor(gtk4_layer_shell::Edge::Top, true);
    window.set_anchor(gtk4_layer_shell::Edge::Left, true);
    window.set_anchor(gtk4_layer_shell::Edge::Right, true);
    window.auto_exclusive_zone_enable();
    window.set_keyboard_mode(gtk4_layer_shell::KeyboardMode::None);
    window.set_decorated(false);
    if let Some(monitor) = find_monitor(output) {
        window.set_monitor(Some(&monitor));
    }

    let container = gtk4::Box::new(gtk4::Orientation::Horizontal, 0);
    container.add_css_class("workspaces");
    window.set_child(Some(&container));

    let mut service = build(GtkBar::new(container, commands));
    service.refresh();
    window.present();

    let mut next_tick = Instant::now() + interval;
    glib::timeout_add_local(Duration::from_millis(16), move || {
        if !service.pump(&rx) {
            info!("all sources closed, exiting");
            return glib::ControlFlow::Break;
        }
        if Instant::now() >= next_tick {
            service.refresh();
            next_tick = Instant::now() + interval;
        }
        glib::ControlFlow::Continue
    });

    info!("entering GLib main loop");
    let main_loop = glib::MainLoop::new(None, false);
    main_loop.run();
    info!("GLib main loop exited");
    Ok(())
}

fn find_monitor(output: &str) -> Option<gdk::Monitor> {
    let display = gdk::Display::default()?;
    let monitors = display.monitors();
    (0..monitors.n_items())
        .filter_map(|i| monitors.item(i)?.downcast::<gdk::Monitor>().ok())
        .find(|m| m.connector().is_some_and(|c| c.as_str() == output))
}

//  CSS loading

fn load_css(css_path: &Option<PathBuf>) {
    let provider = gtk4::CssProvider::new();

    let css_content = match css_path.as_ref().filter(|p| p.exists()) {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(content) => {
                info!("user CSS: {} ({} bytes)", p.display(), content.len());
                content
            }
            Err(e) => {
                warn!("CSS read failed ({}): {}, using built-in", p.display(), e);
                DEFAULT_CSS.to_string()
            }
        },
        None => DEFAULT_CSS.to_string(),
    };

    #[allow(deprecated)]
    provider.load_from_data(&css_content);

    match gdk::Display::default() {
        Some(display) => gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        ),
        None => warn!("no GDK display, CSS will not be applied"),
    }
}
