//! The synchronization channel: the orchestrator that ties the layout
//! model, the edit engines and the connection to the authority together.
//!
//! [`SyncChannel`] owns the single [`ClientState`] value.  Local edits are
//! applied optimistically: the new state is installed first and then the
//! canonical [`LayoutState`] is pushed to the authority.  Whenever the
//! authority sends a snapshot, it replaces the local state wholesale.
//!
//! There is no merge.  A snapshot that was already in flight when a local
//! edit was sent will overwrite that edit, and the edit reappears only if
//! the authority accepted it and sends a later snapshot.  The authority
//! always wins.

use crate::bounds::{step_max_views, step_top_k};
use crate::command::{Command, Event};
use crate::drag::DragError;
use crate::layout::{ClientState, EditError, LayoutState};
use crate::protocol::{decode_inbound, encode_set_layout_state, ProtocolError};
use crate::reorder::apply_move;
use crate::tags::{add_tag, edit_view, remove_tag};
use crate::traits::Transport;
use log::{debug, error, info, warn};
use std::sync::{mpsc, Arc};

/// Possible errors from the channel.
///
/// None of them leave the state half-updated: a rejected command keeps
/// the previous state, a rejected frame is dropped.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("edit rejected: {0}")]
    Edit(#[from] EditError),
    #[error("drag rejected: {0}")]
    Drag(#[from] DragError),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Who produced a newly installed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateOrigin {
    /// An optimistic local edit.
    Local,
    /// A snapshot from the authority.
    Authoritative,
}

/// Notification sent to the observer after every install.
#[derive(Debug, Clone)]
pub struct StateEvent {
    pub origin: StateOrigin,
    pub state: Arc<ClientState>,
}

/// Why [`SyncChannel::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// The connection to the authority ended or never came up.
    ConnectionEnded,
    /// Every event source hung up.
    SourcesClosed,
}

/// Owns the client state and the outbound half of the connection.
///
/// The channel starts **closed** with an empty state.  Sends attempted
/// while closed are dropped, not queued: the authority pushes a full
/// snapshot once the connection opens, and a queued layout would only
/// overwrite it with stale data.
pub struct SyncChannel<T: Transport> {
    transport: T,
    state: Arc<ClientState>,
    open: bool,
    observer: Option<mpsc::Sender<StateEvent>>,
}

impl<T: Transport> SyncChannel<T> {
    /// Create a channel that sends through `transport`.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: Arc::new(ClientState::default()),
            open: false,
            observer: None,
        }
    }

    /// Attach an observer that receives every newly installed state.
    ///
    /// A renderer, a debug logger, etc. can own the receiving end.  If the
    /// receiver is dropped the observer is detached.
    pub fn set_observer(&mut self, tx: mpsc::Sender<StateEvent>) {
        self.observer = Some(tx);
    }

    /// The current state.  The returned snapshot never changes; later
    /// transitions install a new value instead.
    pub fn state(&self) -> Arc<ClientState> {
        Arc::clone(&self.state)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The connection is ready for sends.
    pub fn on_open(&mut self) {
        info!("connection to authority open");
        self.open = true;
    }

    /// The connection is gone; later sends are dropped.
    pub fn on_close(&mut self) {
        info!("connection to authority closed");
        self.open = false;
    }

    /// Process one event from the main loop.  Errors are logged and the
    /// state is left unchanged.
    pub fn dispatch(&mut self, event: Event) {
        match event {
            Event::Command(cmd) => {
                info!("{}", cmd);
                if let Err(e) = self.handle(cmd) {
                    error!("command error: {}", e);
                }
            }
            Event::Inbound(text) => {
                if let Err(e) = self.handle_inbound(&text) {
                    error!("bad frame from authority: {}", e);
                }
            }
            Event::ConnectionOpened => self.on_open(),
            Event::ConnectionClosed => self.on_close(),
        }
    }

    /// Dispatch events until the connection ends.
    ///
    /// Without a connection every edit would be dropped, so the loop does
    /// not outlive it even though the command socket is still listening.
    pub fn run(&mut self, events: &mpsc::Receiver<Event>) -> Shutdown {
        for event in events.iter() {
            let ended = event == Event::ConnectionClosed;
            self.dispatch(event);
            if ended {
                return Shutdown::ConnectionEnded;
            }
        }
        Shutdown::SourcesClosed
    }

    /// Apply a user command optimistically and push the result.
    ///
    /// Precondition violations (unknown ids, bad indices, unusable drag
    /// targets) reject the command without touching the state.
    pub fn handle(&mut self, cmd: Command) -> Result<(), SyncError> {
        let current = &self.state.state;
        let next = match cmd {
            Command::Drag(drag) => match drag.to_move()? {
                Some(mv) => apply_move(current, &mv)?,
                None => {
                    debug!("drop cancelled, nothing to apply");
                    return Ok(());
                }
            },
            Command::StepMaxViews { output, delta } => step_max_views(current, &output, delta.0)?,
            Command::StepTopK { workspace, delta } => step_top_k(current, &workspace, delta.0)?,
            Command::AddTag { view, text } => edit_view(current, &view, |v| add_tag(v, &text))?,
            Command::RemoveTag { view, tag } => edit_view(current, &view, |v| remove_tag(v, &tag))?,
        };
        self.commit_local(next)
    }

    /// Install a locally edited layout and push it to the authority.
    /// A layout equal to the current one is neither installed nor sent.
    pub fn commit_local(&mut self, layout: LayoutState) -> Result<(), SyncError> {
        if layout == self.state.state {
            debug!("edit left the layout unchanged");
            return Ok(());
        }
        let next = ClientState {
            state: layout,
            aux: Arc::clone(&self.state.aux),
        };
        self.install(next, StateOrigin::Local);
        self.send_state(&self.state.state)
    }

    /// Push `layout` to the authority.  Fire-and-forget; dropped while the
    /// connection is not open.
    pub fn send_state(&self, layout: &LayoutState) -> Result<(), SyncError> {
        if !self.open {
            debug!("connection not open, dropping layout update");
            return Ok(());
        }
        let text = encode_set_layout_state(layout)?;
        debug!("sending state: {}", text);
        self.transport
            .send_text(text)
            .map_err(|e| SyncError::Transport(e.to_string()))
    }

    /// Handle one text frame from the authority.
    pub fn handle_inbound(&mut self, text: &str) -> Result<(), SyncError> {
        match decode_inbound(text)? {
            Some(snapshot) => {
                debug!("recv state: {}", text);
                self.install_authoritative(snapshot);
            }
            None => debug!("ignoring message: {}", text),
        }
        Ok(())
    }

    /// Replace the whole local state with an authoritative snapshot,
    /// discarding any optimistic edits.
    pub fn install_authoritative(&mut self, snapshot: ClientState) {
        let orphans = snapshot.orphaned_views();
        if !orphans.is_empty() {
            warn!("views without metadata: {}", orphans.join(", "));
        }
        if let Err(e) = snapshot.state.check_invariants() {
            debug!("authoritative layout breaks an invariant: {}", e);
        }
        self.install(snapshot, StateOrigin::Authoritative);
    }

    fn install(&mut self, next: ClientState, origin: StateOrigin) {
        self.state = Arc::new(next);
        if let Some(tx) = &self.observer {
            let event = StateEvent {
                origin,
                state: Arc::clone(&self.state),
            };
            if tx.send(event).is_err() {
                debug!("state observer gone, detaching");
                self.observer = None;
            }
        }
    }
}

//  Tests
