//! Hyprland-specific implementations.
//!
//! This module provides the concrete [`Compositor`](crate::traits::Compositor)
//! and the event-socket [`MessageSource`](crate::traits::MessageSource),
//! both speaking Hyprland's IPC protocol.
//!
//! Nothing outside this module should reference Hyprland's sockets directly.

pub mod events;
pub mod ipc;
