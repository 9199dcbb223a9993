//! Tag editing.
//!
//! [`add_tag`] and [`remove_tag`] are pure functions over a single
//! [`View`]; [`edit_view`] locates a view by id and swaps the edited copy
//! into a new [`LayoutState`].

use crate::layout::{EditError, LayoutState, View};
use std::sync::Arc;

/// Add the trimmed `raw` text as a tag.  Blank input leaves the view
/// unchanged; adding an existing tag is idempotent.
pub fn add_tag(view: &View, raw: &str) -> View {
    let tag = raw.trim();
    if tag.is_empty() || view.tags.contains(tag) {
        return view.clone();
    }
    let mut next = view.clone();
    next.tags.insert(tag.to_string());
    next
}

/// Remove `tag` if present.
pub fn remove_tag(view: &View, tag: &str) -> View {
    let mut next = view.clone();
    next.tags.remove(tag);
    next
}

/// Apply `edit` to the view with the given id.
///
/// The view's slot is only replaced when the edit actually changes it, so
/// a no-op edit yields a layout that shares every branch with `state`.
pub fn edit_view(
    state: &LayoutState,
    view_id: &str,
    edit: impl FnOnce(&View) -> View,
) -> Result<LayoutState, EditError> {
    let current = state
        .views
        .get(view_id)
        .ok_or_else(|| EditError::UnknownView(view_id.to_string()))?;
    let edited = edit(current);
    let mut next = state.clone();
    if edited != **current {
        next.views.insert(view_id.to_string(), Arc::new(edited));
    }
    Ok(next)
}
