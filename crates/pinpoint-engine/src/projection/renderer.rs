//! The contract with whatever draws tiles on screen.

use std::fmt;

use pinpoint_common::{
    ConfigMap, InstanceId, LayoutId, Point, RenderError, Size, TileDefinition, TileId,
};

use super::LiveEditSink;

/// Renderer-assigned identity of a mounted widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetRef(pub u64);

impl fmt::Display for WidgetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "widget#{}", self.0)
    }
}

/// Where and how big a widget should be, in screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenPlacement {
    pub layout_id: LayoutId,
    pub instance_id: InstanceId,
    pub tile_id: TileId,
    pub display_index: usize,
    pub position: Point,
    pub size: Size,
    pub scale: f64,
}

/// An in-place change to a mounted widget.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPatch {
    /// Config keys that changed; `null` means removed.
    Content(ConfigMap),
    /// New top-left corner, screen coordinates.
    Position(Point),
    Size(Size),
}

/// Mounts, updates and unmounts tile widgets.
///
/// Calls arrive on the engine's thread. A renderer may call back into the
/// sink it was given, including from inside `mount`.
pub trait Renderer {
    fn mount(
        &self,
        placement: &ScreenPlacement,
        tile: &TileDefinition,
        sink: LiveEditSink,
    ) -> Result<WidgetRef, RenderError>;

    fn update(&self, widget: WidgetRef, patch: &RenderPatch) -> Result<(), RenderError>;

    fn unmount(&self, widget: WidgetRef);
}
