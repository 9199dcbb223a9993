//! Drag-driven reorder engine.
//!
//! [`apply_move`] computes a new [`LayoutState`] from the current one and
//! a discrete [`Move`].  Two rules hold for every move:
//!
//! * The moved item is removed **before** it is reinserted, and the
//!   insertion index refers to the already-shortened sequence.  Reordering
//!   within one workspace (or within the workspace list) depends on this.
//! * A workspace never survives a move with zero views: if the source
//!   workspace is emptied it is dropped within the same call.
//!
//! Dropping a view onto the "new workspace" target creates a workspace
//! with the first unused numeric id, `top_k = -1`, appended at the end.

use crate::layout::{EditError, LayoutState, Workspace, NEW_WORKSPACE_TOP_K};
use std::sync::Arc;

/// Where a dragged view lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewDestination {
    /// Insert at `index` in the workspace `id`.  `index` may equal the
    /// length of the workspace's views to append.
    Workspace { id: String, index: usize },
    /// Create a fresh workspace holding just the moved view.
    NewWorkspace,
}

/// Move the view at `source_index` of `source_workspace`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewMove {
    pub source_workspace: String,
    pub source_index: usize,
    pub destination: ViewDestination,
}

/// Move a workspace within the workspace list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkspaceMove {
    pub source_index: usize,
    pub destination_index: usize,
}

/// A completed drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Move {
    View(ViewMove),
    Workspace(WorkspaceMove),
}

/// Apply `mv` to `state`, returning the new layout.
///
/// Out-of-range indices and unknown workspace ids are precondition
/// violations: the move is rejected and `state` is left untouched.
pub fn apply_move(state: &LayoutState, mv: &Move) -> Result<LayoutState, EditError> {
    match mv {
        Move::View(m) => move_view(state, m),
        Move::Workspace(m) => move_workspace(state, m),
    }
}

fn move_view(state: &LayoutState, m: &ViewMove) -> Result<LayoutState, EditError> {
    let mut next = state.clone();

    let source_idx = next
        .workspace_index(&m.source_workspace)
        .ok_or_else(|| EditError::UnknownWorkspace(m.source_workspace.clone()))?;
    let source = Arc::make_mut(&mut next.workspaces[source_idx]);
    if m.source_index >= source.views.len() {
        return Err(EditError::IndexOutOfRange {
            what: "view",
            index: m.source_index,
            len: source.views.len(),
        });
    }
    let view = source.views.remove(m.source_index);

    match &m.destination {
        ViewDestination::NewWorkspace => {
            // The emptied source (if any) is still present while probing,
            // so its id is never handed out again in the same move.
            let id = fresh_workspace_id(&next.workspaces);
            next.workspaces
                .push(Arc::new(Workspace::new(id, vec![view], NEW_WORKSPACE_TOP_K)));
        }
        ViewDestination::Workspace { id, index } => {
            let dest_idx = next
                .workspace_index(id)
                .ok_or_else(|| EditError::UnknownWorkspace(id.clone()))?;
            let dest = Arc::make_mut(&mut next.workspaces[dest_idx]);
            if *index > dest.views.len() {
                return Err(EditError::IndexOutOfRange {
                    what: "view",
                    index: *index,
                    len: dest.views.len(),
                });
            }
            dest.views.insert(*index, view);
        }
    }

    if next.workspaces[source_idx].views.is_empty() {
        next.workspaces.remove(source_idx);
    }
    Ok(next)
}

fn move_workspace(state: &LayoutState, m: &WorkspaceMove) -> Result<LayoutState, EditError> {
    let len = state.workspaces.len();
    if m.source_index >= len {
        return Err(EditError::IndexOutOfRange {
            what: "workspace",
            index: m.source_index,
            len,
        });
    }
    let mut next = state.clone();
    let ws = next.workspaces.remove(m.source_index);
    if m.destination_index > next.workspaces.len() {
        return Err(EditError::IndexOutOfRange {
            what: "workspace",
            index: m.destination_index,
            len: next.workspaces.len(),
        });
    }
    next.workspaces.insert(m.destination_index, ws);
    Ok(next)
}

/// First id in `1, 2, 3, …` not used by any workspace.  Ids of deleted
/// workspaces become available again.
pub fn fresh_workspace_id(workspaces: &[Arc<Workspace>]) -> String {
    let mut n: u64 = 1;
    loop {
        let candidate = n.to_string();
        if !workspaces.iter().any(|ws| ws.id == candidate) {
            return candidate;
        }
        n += 1;
    }
}

//  Tests
