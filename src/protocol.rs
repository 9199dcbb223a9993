//! JSON wire protocol spoken with the layout authority.
//!
//! # Client → authority
//!
//! ```json
//! {"kind":"set_layout_state","state":{"workspaces":[...],"outputs":[...],"views":{...}}}
//! ```
//!
//! # Authority → client
//!
//! ```json
//! {"kind":"layout_state","data":{"state":{...},"aux":{"views":{"<id>":{"title":"..."}}}}}
//! ```
//!
//! Any other `kind` is ignored.
//!
//! The authority serialises an empty associative table as `[]`, so an
//! empty tag set, an empty `views` map and an empty `aux.views` map may
//! all arrive as arrays.  Inbound payloads are decoded into raw types that
//! admit both shapes and then [normalised](normalize) into a
//! [`ClientState`] before anyone sees them.

use crate::layout::{Aux, ClientState, LayoutState, Output, Tags, View, ViewAux, Workspace};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Errors from encoding or decoding protocol messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

//  Outbound

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Outbound<'a> {
    SetLayoutState { state: &'a LayoutState },
}

/// Encode a `set_layout_state` message.  Only the canonical layout is
/// sent; [`Aux`] never leaves the client.
pub fn encode_set_layout_state(state: &LayoutState) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(&Outbound::SetLayoutState { state })?)
}

//  Inbound

/// An associative structure as the authority may send it: either a proper
/// object, or an array standing in for an empty one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawMap<V> {
    Map(BTreeMap<String, V>),
    Sequence(Vec<serde_json::Value>),
}

impl<V> Default for RawMap<V> {
    fn default() -> Self {
        RawMap::Map(BTreeMap::new())
    }
}

impl<V> RawMap<V> {
    /// The map, with the array form replaced by an empty map.
    fn into_map(self, what: &str) -> BTreeMap<String, V> {
        match self {
            RawMap::Map(map) => map,
            RawMap::Sequence(items) => {
                debug!(
                    "{} arrived as an array of {} item(s), treating as empty",
                    what,
                    items.len()
                );
                BTreeMap::new()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawView {
    #[serde(default)]
    pub tags: RawMap<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawLayoutState {
    #[serde(default)]
    pub workspaces: Vec<Workspace>,
    #[serde(default)]
    pub outputs: Vec<Output>,
    #[serde(default)]
    pub views: RawMap<RawView>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawAux {
    #[serde(default)]
    pub views: RawMap<ViewAux>,
}

/// A `layout_state` payload before normalisation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawClientState {
    pub state: RawLayoutState,
    #[serde(default)]
    pub aux: RawAux,
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Inbound {
    LayoutState { data: RawClientState },
    #[serde(other)]
    Other,
}

/// Repair the empty-table anomaly and build the client model.
///
/// Applying this to a snapshot that is already well-formed changes
/// nothing.
pub fn normalize(raw: RawClientState) -> ClientState {
    let views = raw
        .state
        .views
        .into_map("views")
        .into_iter()
        .map(|(id, view)| {
            let tags: Tags = view.tags.into_map("tags").into_keys().collect();
            (id, Arc::new(View { tags }))
        })
        .collect();
    ClientState {
        state: LayoutState {
            workspaces: raw.state.workspaces.into_iter().map(Arc::new).collect(),
            outputs: raw.state.outputs.into_iter().map(Arc::new).collect(),
            views,
        },
        aux: Arc::new(Aux {
            views: raw.aux.views.into_map("aux.views"),
        }),
    }
}

/// Decode one inbound text frame.
///
/// Returns `Ok(None)` for messages of any kind other than `layout_state`.
pub fn decode_inbound(text: &str) -> Result<Option<ClientState>, ProtocolError> {
    match serde_json::from_str::<Inbound>(text)? {
        Inbound::LayoutState { data } => Ok(Some(normalize(data))),
        Inbound::Other => Ok(None),
    }
}
