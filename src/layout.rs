//! Layout state model.
//!
//! The authority owns three kinds of objects: **outputs** (display-like
//! sinks), **workspaces** (ordered groups of views) and **views**
//! (window-like items carrying a tag set).  [`LayoutState`] is the
//! canonical portion that is transmitted back to the authority;
//! [`ClientState`] adds presentation metadata ([`ViewAux`]) that only ever
//! flows from the authority to us.
//!
//! Every mutation produces a new state value.  Workspaces and views are
//! held behind [`Arc`], so cloning a [`LayoutState`] only copies pointers
//! and an edit copies just the branch it touches (via [`Arc::make_mut`]).
//! Untouched branches stay shared with the previous value, and value
//! equality (`==`) tells consumers whether anything changed at all.

use crate::bounds::{MAX_VIEWS, TOP_K};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

/// `top_k` given to workspaces created by the client.  `-1` means
/// "unlimited".
pub const NEW_WORKSPACE_TOP_K: i32 = -1;

fn default_top_k() -> i32 {
    NEW_WORKSPACE_TOP_K
}

//  Views

/// The tag set of a view.
///
/// On the wire a tag set is an object whose keys are the tags and whose
/// values are all `1` (`{"web":1,"work":1}`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(BTreeSet<String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    /// Tags in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn insert(&mut self, tag: String) -> bool {
        self.0.insert(tag)
    }

    pub(crate) fn remove(&mut self, tag: &str) -> bool {
        self.0.remove(tag)
    }
}

impl<S: Into<String>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Serialize for Tags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for tag in &self.0 {
            map.serialize_entry(tag, &1)?;
        }
        map.end()
    }
}

/// A window-like item.  Views are created and destroyed by the authority;
/// the client only edits their tags and moves their ids between
/// workspaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct View {
    pub tags: Tags,
}

impl View {
    pub fn with_tags<S: Into<String>>(tags: impl IntoIterator<Item = S>) -> Self {
        Self {
            tags: tags.into_iter().collect(),
        }
    }

    /// Tags in display order.
    pub fn sorted_tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter()
    }
}

/// Presentation metadata for a view, owned by the authority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewAux {
    #[serde(default)]
    pub title: String,
}

//  Workspaces and outputs

/// An ordered group of view ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    #[serde(default)]
    pub views: Vec<String>,
    /// Result limit, domain `[-1, 3]`.
    #[serde(default = "default_top_k")]
    pub top_k: i32,
}

impl Workspace {
    pub fn new(id: impl Into<String>, views: Vec<String>, top_k: i32) -> Self {
        Self {
            id: id.into(),
            views,
            top_k,
        }
    }
}

/// A display-like sink.  Only its capacity is editable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub name: String,
    /// View capacity, domain `[1, 8]`.
    pub max_views: i32,
}

//  States

/// The canonical, transmitted portion of the layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayoutState {
    pub workspaces: Vec<Arc<Workspace>>,
    pub outputs: Vec<Arc<Output>>,
    pub views: BTreeMap<String, Arc<View>>,
}

impl LayoutState {
    /// Look up a workspace by id.
    pub fn find_workspace(&self, id: &str) -> Option<&Workspace> {
        self.workspaces.iter().find(|ws| ws.id == id).map(|ws| &**ws)
    }

    /// Position of the workspace with the given id.
    pub fn workspace_index(&self, id: &str) -> Option<usize> {
        self.workspaces.iter().position(|ws| ws.id == id)
    }

    /// Look up an output by name.
    pub fn find_output(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.name == name).map(|o| &**o)
    }

    pub fn find_view(&self, id: &str) -> Option<&View> {
        self.views.get(id).map(|v| &**v)
    }

    /// Every view id placed in a workspace, in workspace order.
    pub fn placed_views(&self) -> impl Iterator<Item = &str> {
        self.workspaces
            .iter()
            .flat_map(|ws| ws.views.iter().map(String::as_str))
    }

    /// Check the structural invariants of the layout.
    ///
    /// Snapshots from the authority are installed whether or not they pass;
    /// this is a diagnostic used by tests and debug logging.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut workspace_ids = HashSet::new();
        let mut seen = HashSet::new();
        for ws in &self.workspaces {
            if !workspace_ids.insert(ws.id.as_str()) {
                return Err(InvariantViolation::DuplicateWorkspace(ws.id.clone()));
            }
            if ws.views.is_empty() {
                return Err(InvariantViolation::EmptyWorkspace(ws.id.clone()));
            }
            if !TOP_K.contains(ws.top_k) {
                return Err(InvariantViolation::TopKOutOfRange {
                    workspace: ws.id.clone(),
                    value: ws.top_k,
                });
            }
            for view in &ws.views {
                if !seen.insert(view.as_str()) {
                    return Err(InvariantViolation::DuplicateView(view.clone()));
                }
            }
        }
        for output in &self.outputs {
            if !MAX_VIEWS.contains(output.max_views) {
                return Err(InvariantViolation::MaxViewsOutOfRange {
                    output: output.name.clone(),
                    value: output.max_views,
                });
            }
        }
        for (id, view) in &self.views {
            if view.tags.iter().any(|t| t.trim().is_empty()) {
                return Err(InvariantViolation::BlankTag(id.clone()));
            }
        }
        Ok(())
    }
}

/// A broken structural invariant, as reported by
/// [`LayoutState::check_invariants`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("workspace id {0} appears more than once")]
    DuplicateWorkspace(String),
    #[error("view {0} is placed in more than one slot")]
    DuplicateView(String),
    #[error("workspace {0} has no views")]
    EmptyWorkspace(String),
    #[error("workspace {workspace} has top_k {value} outside [-1, 3]")]
    TopKOutOfRange { workspace: String, value: i32 },
    #[error("output {output} has max_views {value} outside [1, 8]")]
    MaxViewsOutOfRange { output: String, value: i32 },
    #[error("view {0} carries a blank tag")]
    BlankTag(String),
}

/// Metadata the authority attaches alongside the layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Aux {
    pub views: BTreeMap<String, ViewAux>,
}

/// Everything the client keeps locally: the layout plus [`Aux`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientState {
    pub state: LayoutState,
    pub aux: Arc<Aux>,
}

impl ClientState {
    /// Display title of a view.  Orphaned views (no [`ViewAux`]) fall back
    /// to their id.
    pub fn title<'a>(&'a self, view_id: &'a str) -> &'a str {
        self.aux
            .views
            .get(view_id)
            .map(|aux| aux.title.as_str())
            .unwrap_or(view_id)
    }

    /// View ids placed in a workspace that have no [`ViewAux`].
    pub fn orphaned_views(&self) -> Vec<&str> {
        self.state
            .placed_views()
            .filter(|id| !self.aux.views.contains_key(*id))
            .collect()
    }
}

/// A precondition violation while editing a layout.
///
/// The edit is abandoned and the state stays as it was; the next
/// authoritative snapshot corrects any divergence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("unknown workspace: {0}")]
    UnknownWorkspace(String),
    #[error("unknown output: {0}")]
    UnknownOutput(String),
    #[error("unknown view: {0}")]
    UnknownView(String),
    #[error("{what} index {index} out of range (length {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
}
