//! Core traits that decouple the synchronization logic from any specific
//! transport.
//!
//! The [`SyncChannel`](crate::sync::SyncChannel) only depends on these
//! abstractions: it pushes frames through a [`Transport`] and is fed by
//! [`EventSource`]s.  The WebSocket connection and the Unix-socket command
//! listener are the concrete implementations; tests use in-memory doubles.

use crate::command::Event;
use std::sync::mpsc;

/// Outbound half of the duplex connection to the authority.
///
/// Sends are fire-and-forget: there is no acknowledgment, and a failed
/// send is not retried.
pub trait Transport {
    /// The error type produced by this transport.
    type Error: std::error::Error + Send + 'static;

    /// Queue one text frame for delivery.
    fn send_text(&self, text: String) -> Result<(), Self::Error>;
}

/// A source of [`Event`]s.
///
/// Implementations listen on some transport (a Unix socket, a WebSocket,
/// an in-memory channel, …) and forward what they receive into the
/// provided [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](EventSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received item must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait EventSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Event`] into `sink`.
    ///
    /// This method blocks the calling thread.  To run multiple sources
    /// concurrently, spawn each one on its own thread.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Self::Error>;
}
