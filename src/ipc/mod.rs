//! Command socket for the bar.
//!
//! The bar (or any script) connects and sends newline-delimited JSON
//! [`Command`](crate::command::Command)s such as clicks and refreshes.

pub mod listener;
