//! **hyprws**: a Hyprland workspace module for status bars.
//!
//! Mirrors the compositor's workspaces and windows for one bar, groups
//! workspaces named `.<project><n>` into collapsible projects, remembers the
//! last active member of each project and projects everything into a
//! [`render::Frame`] for a sink to draw.
//!
//! # Architecture
//!
//! The crate is organised around a few core traits:
//!
//! * [`traits::Compositor`]: snapshot queries and dispatches, so the engine
//!   is not coupled to Hyprland's sockets.
//! * [`traits::MessageSource`]: anything that feeds the engine (the
//!   compositor event socket, the bar's command socket).
//! * [`traits::RenderSink`]: whatever draws the frame.
//! * [`traits::Launcher`]: hooks and helper scripts.
//!
//! [`engine::WorkspaceManager`] holds all state.  [`service::Service`] owns
//! it on the main thread and drains one channel that every source sends
//! into.  Concrete Hyprland backends live in [`hyprland`], the command
//! socket in [`ipc`] and the sinks in [`sink`].

pub mod command;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod event;
pub mod grouping;
pub mod hyprland;
pub mod icons;
pub mod ipc;
pub mod render;
pub mod rewrite;
pub mod service;
pub mod sink;
pub mod snapshot;
pub mod tasks;
pub mod thumbnail;
pub mod traits;
pub mod window;
pub mod workspace;
