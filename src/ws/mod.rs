//! WebSocket connection to the layout authority.
//!
//! This module provides the concrete [`Transport`](crate::traits::Transport)
//! and [`EventSource`](crate::traits::EventSource) backed by a
//! `tungstenite` client socket.
//!
//! Nothing outside this module should reference tungstenite directly.

pub mod connection;
