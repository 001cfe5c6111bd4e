//! Render sinks.
//!
//! [`json::JsonLineSink`] writes one JSON document per frame and is what
//! script-driven bars consume.  With the `sink-gtk` feature enabled,
//! [`gtk::run_main_loop`] draws the frame as a GTK4 layer-shell bar and
//! drives the service from the GLib main loop.

pub mod json;

#[cfg(feature = "sink-gtk")]
pub mod gtk;
