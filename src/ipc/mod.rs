//! IPC listener that accepts UI commands over a Unix socket.
//!
//! The UI (or a script) connects to the socket and sends
//! newline-delimited JSON [`Command`](crate::command::Command)s.

pub mod listener;
