//! Drag results produced by the UI's drag-and-drop layer.
//!
//! A drag result names its source and destination by *droppable id*:
//!
//! | Droppable id        | Meaning                                 |
//! |---------------------|-----------------------------------------|
//! | `droppable-ws-<id>` | the view list of workspace `<id>`       |
//! | `new-ws`            | the "new workspace" drop target         |
//! | `workspaces`        | the horizontal list of workspaces       |
//!
//! [`DragResult::to_move`] turns a result into a [`Move`] for the
//! [reorder engine](crate::reorder), or `None` when the drop was cancelled.

use crate::reorder::{Move, ViewDestination, ViewMove, WorkspaceMove};
use serde::{Deserialize, Serialize};

pub const WORKSPACE_DROPPABLE_PREFIX: &str = "droppable-ws-";
pub const NEW_WORKSPACE_DROPPABLE: &str = "new-ws";
pub const WORKSPACES_DROPPABLE: &str = "workspaces";

/// What was dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragKind {
    View,
    Workspace,
}

/// A position inside a droppable container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragLocation {
    #[serde(rename = "droppableId")]
    pub droppable_id: String,
    pub index: usize,
}

/// The outcome of one drag gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragResult {
    #[serde(rename = "type")]
    pub kind: DragKind,
    pub source: DragLocation,
    /// `None` when the item was dropped outside any target.
    #[serde(default)]
    pub destination: Option<DragLocation>,
}

/// A drag result that does not describe a valid move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DragError {
    #[error("{0:?} is not a workspace drop target")]
    NotAWorkspace(String),
    #[error("{0:?} is not the workspace list")]
    NotTheWorkspaceList(String),
}

/// Workspace id encoded in a `droppable-ws-<id>` droppable id.
pub fn workspace_droppable(droppable_id: &str) -> Option<&str> {
    droppable_id.strip_prefix(WORKSPACE_DROPPABLE_PREFIX)
}

impl DragResult {
    /// Decode the drag into a move.  Returns `Ok(None)` for a cancelled
    /// drop, in which case nothing should be applied.
    pub fn to_move(&self) -> Result<Option<Move>, DragError> {
        let Some(destination) = &self.destination else {
            return Ok(None);
        };
        let mv = match self.kind {
            DragKind::View => {
                let source_workspace = workspace_droppable(&self.source.droppable_id)
                    .ok_or_else(|| DragError::NotAWorkspace(self.source.droppable_id.clone()))?;
                let destination = if destination.droppable_id == NEW_WORKSPACE_DROPPABLE {
                    ViewDestination::NewWorkspace
                } else {
                    let id = workspace_droppable(&destination.droppable_id).ok_or_else(|| {
                        DragError::NotAWorkspace(destination.droppable_id.clone())
                    })?;
                    ViewDestination::Workspace {
                        id: id.to_string(),
                        index: destination.index,
                    }
                };
                Move::View(ViewMove {
                    source_workspace: source_workspace.to_string(),
                    source_index: self.source.index,
                    destination,
                })
            }
            DragKind::Workspace => {
                for loc in [&self.source, destination] {
                    if loc.droppable_id != WORKSPACES_DROPPABLE {
                        return Err(DragError::NotTheWorkspaceList(loc.droppable_id.clone()));
                    }
                }
                Move::Workspace(WorkspaceMove {
                    source_index: self.source.index,
                    destination_index: destination.index,
                })
            }
        };
        Ok(Some(mv))
    }
}
