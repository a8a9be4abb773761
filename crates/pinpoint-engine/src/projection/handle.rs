//! Live tile handles and their lifecycle.

use std::fmt;

use pinpoint_common::{InstanceId, LayoutId, Point, Size, TileId};

use super::WidgetRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Unmounted,
    Mounting,
    Active,
    Unmounting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal handle transition {from:?} -> {to:?}")]
pub struct IllegalTransition {
    pub from: HandleState,
    pub to: HandleState,
}

impl HandleState {
    /// `Unmounted -> Mounting -> Active -> Unmounting -> Unmounted`, plus
    /// `Active -> Active` for in-place updates.
    pub fn can_transition(self, to: HandleState) -> bool {
        use HandleState::*;
        matches!(
            (self, to),
            (Unmounted, Mounting)
                | (Mounting, Active)
                | (Active, Active)
                | (Active, Unmounting)
                | (Unmounting, Unmounted)
        )
    }

    pub fn transition(&mut self, to: HandleState) -> Result<(), IllegalTransition> {
        if !self.can_transition(to) {
            return Err(IllegalTransition { from: *self, to });
        }
        *self = to;
        Ok(())
    }

    pub fn accepts_updates(self) -> bool {
        self == HandleState::Active
    }
}

impl fmt::Display for HandleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandleState::Unmounted => "unmounted",
            HandleState::Mounting => "mounting",
            HandleState::Active => "active",
            HandleState::Unmounting => "unmounting",
        };
        f.write_str(name)
    }
}

/// A currently projected tile instance. Process memory only.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveTileHandle {
    pub instance_id: InstanceId,
    pub layout_id: LayoutId,
    pub tile_id: TileId,
    pub display_index: usize,
    pub widget: Option<WidgetRef>,
    pub state: HandleState,
    /// Screen coordinates.
    pub position: Point,
    pub size: Size,
    /// An update arrived while mounting; resync once active.
    pub(crate) stale: bool,
    /// Distinguishes this mount from a later one for the same instance.
    pub(crate) generation: u64,
}

impl LiveTileHandle {
    pub(crate) fn mounting(
        instance_id: InstanceId,
        layout_id: LayoutId,
        tile_id: TileId,
        display_index: usize,
        position: Point,
        size: Size,
        generation: u64,
    ) -> Self {
        let mut state = HandleState::Unmounted;
        // Unmounted -> Mounting is always legal.
        let _ = state.transition(HandleState::Mounting);
        Self {
            instance_id,
            layout_id,
            tile_id,
            display_index,
            widget: None,
            state,
            position,
            size,
            stale: false,
            generation,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == HandleState::Active
    }
}
