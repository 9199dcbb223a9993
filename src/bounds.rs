//! Bounded integer controls.
//!
//! Two small controls are edited by stepping: an output's `max_views`
//! (`[1, 8]`) and a workspace's `top_k` (`[-1, 3]`).  Steps come from
//! buttons (`±1`) or from a scroll wheel, where only the sign of the
//! wheel delta matters.

use crate::layout::{EditError, LayoutState};
use std::sync::Arc;

/// An inclusive integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    pub min: i32,
    pub max: i32,
}

/// Output view capacity.
pub const MAX_VIEWS: Bound = Bound { min: 1, max: 8 };

/// Workspace result limit; `-1` means unlimited.
pub const TOP_K: Bound = Bound { min: -1, max: 3 };

impl Bound {
    pub fn step(self, current: i32, delta: i32) -> i32 {
        clamp_step(current, delta, self.min, self.max)
    }

    pub fn contains(self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// `min(max(current + delta, min), max)`, total over all `i32` inputs.
pub fn clamp_step(current: i32, delta: i32, min: i32, max: i32) -> i32 {
    let next = i64::from(current) + i64::from(delta);
    // The result lies in [min, max] (or equals max when min > max), so it
    // always fits back into an i32.
    next.max(i64::from(min)).min(i64::from(max)) as i32
}

/// Step derived from a wheel delta: scrolling down (`delta_y > 0`)
/// decrements, scrolling up increments.
pub fn wheel_step(delta_y: f64) -> i32 {
    if delta_y > 0.0 {
        -1
    } else if delta_y < 0.0 {
        1
    } else {
        0
    }
}

/// Step `max_views` of the named output.
pub fn step_max_views(
    state: &LayoutState,
    output: &str,
    delta: i32,
) -> Result<LayoutState, EditError> {
    let mut next = state.clone();
    let slot = next
        .outputs
        .iter_mut()
        .find(|o| o.name == output)
        .ok_or_else(|| EditError::UnknownOutput(output.to_string()))?;
    let value = MAX_VIEWS.step(slot.max_views, delta);
    if value != slot.max_views {
        Arc::make_mut(slot).max_views = value;
    }
    Ok(next)
}

/// Step `top_k` of the workspace with the given id.
pub fn step_top_k(
    state: &LayoutState,
    workspace: &str,
    delta: i32,
) -> Result<LayoutState, EditError> {
    let mut next = state.clone();
    let slot = next
        .workspaces
        .iter_mut()
        .find(|ws| ws.id == workspace)
        .ok_or_else(|| EditError::UnknownWorkspace(workspace.to_string()))?;
    let value = TOP_K.step(slot.top_k, delta);
    if value != slot.top_k {
        Arc::make_mut(slot).top_k = value;
    }
    Ok(next)
}
