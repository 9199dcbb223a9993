//! **layout-remote**: a remote control client for a compositor's
//! workspace / output / view layout.
//!
//! The client mirrors the layout held by an external authority, lets a UI
//! rearrange views and workspaces by drag-and-drop, adjust per-output and
//! per-workspace limits, and tag views, and pushes every resulting layout
//! back to the authority.  The authority's snapshots always win.
//!
//! # Architecture
//!
//! The crate is organised around two core traits:
//!
//! * [`traits::Transport`]: abstracts the outbound half of the connection
//!   so [`sync::SyncChannel`] is not coupled to WebSockets.
//! * [`traits::EventSource`]: abstracts anything that produces
//!   [`command::Event`]s (the UI command socket, the authority connection)
//!   so the main loop is not coupled to any specific IPC mechanism.
//!
//! The edits themselves are pure functions over [`layout::LayoutState`]:
//! [`bounds`] for numeric limits, [`tags`] for view tags, and [`reorder`]
//! (fed by [`drag`]) for moving views and workspaces.  [`protocol`] owns
//! the wire format.  Concrete sources live in [`ipc`] (Unix socket) and
//! [`ws`] (WebSocket).

pub mod bounds;
pub mod command;
pub mod config;
pub mod drag;
pub mod ipc;
pub mod layout;
pub mod protocol;
pub mod reorder;
pub mod sync;
pub mod tags;
pub mod traits;
pub mod ws;
