//! The path from a live widget back into the synchronizer.

use std::fmt;
use std::rc::Weak;

use pinpoint_common::{
    ConfigMap, InstanceId, LayoutId, PinpointError, Point, Size, Source, SyncError,
    TileDefinition, TileInstance, Validated,
};
use tracing::debug;

use super::{ProjectionController, RenderPatch};

/// Handed to the renderer at mount time. Every edit made through it is
/// tagged with the instance's live source, so the originating widget does
/// not get its own change echoed back.
#[derive(Clone)]
pub struct LiveEditSink {
    controller: Weak<ProjectionController>,
    layout_id: LayoutId,
    instance_id: InstanceId,
}

impl LiveEditSink {
    pub(crate) fn new(
        controller: Weak<ProjectionController>,
        layout_id: LayoutId,
        instance_id: InstanceId,
    ) -> Self {
        Self {
            controller,
            layout_id,
            instance_id,
        }
    }

    pub fn instance_id(&self) -> &InstanceId {
        &self.instance_id
    }

    pub fn layout_id(&self) -> &LayoutId {
        &self.layout_id
    }

    pub fn source(&self) -> Source {
        Source::live(&self.instance_id)
    }

    /// The user edited the tile's content in place.
    pub fn edit(&self, patch: ConfigMap) -> Result<Validated<TileDefinition>, PinpointError> {
        self.controller()?.live_edit(&self.instance_id, patch)
    }

    /// The widget was dragged to `screen`.
    pub fn moved(&self, screen: Point) -> Result<TileInstance, PinpointError> {
        self.controller()?.live_move(&self.instance_id, screen)
    }

    /// The widget was resized.
    pub fn resized(&self, size: Size) -> Result<Validated<TileInstance>, PinpointError> {
        self.controller()?.live_resize(&self.instance_id, size)
    }

    fn controller(&self) -> Result<std::rc::Rc<ProjectionController>, PinpointError> {
        self.controller
            .upgrade()
            .ok_or_else(|| PinpointError::Other("projection controller is gone".into()))
    }
}

impl fmt::Debug for LiveEditSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveEditSink")
            .field("layout_id", &self.layout_id)
            .field("instance_id", &self.instance_id)
            .finish()
    }
}

impl ProjectionController {
    fn live_tile(&self, instance_id: &InstanceId) -> Result<pinpoint_common::TileId, SyncError> {
        let state = self.state.borrow();
        state
            .handles
            .get(instance_id)
            .map(|h| h.tile_id.clone())
            .ok_or_else(|| SyncError::InstanceNotFound(instance_id.clone()))
    }

    pub(super) fn live_edit(
        &self,
        instance_id: &InstanceId,
        patch: ConfigMap,
    ) -> Result<Validated<TileDefinition>, PinpointError> {
        let tile_id = self.live_tile(instance_id)?;
        debug!(instance = %instance_id, tile = %tile_id, "live edit");
        Ok(self
            .sync
            .update_tile(&tile_id, patch, Source::live(instance_id))?)
    }

    pub(super) fn live_move(
        &self,
        instance_id: &InstanceId,
        screen: Point,
    ) -> Result<TileInstance, PinpointError> {
        let display_index = {
            let mut state = self.state.borrow_mut();
            let handle = state
                .handles
                .get_mut(instance_id)
                .ok_or_else(|| SyncError::InstanceNotFound(instance_id.clone()))?;
            handle.position = screen;
            handle.display_index
        };
        let editor = self.displays.to_editor(screen, display_index)?;
        Ok(self
            .sync
            .move_instance(instance_id, editor, Source::live(instance_id))?)
    }

    pub(super) fn live_resize(
        &self,
        instance_id: &InstanceId,
        size: Size,
    ) -> Result<Validated<TileInstance>, PinpointError> {
        self.live_tile(instance_id)?;
        let result = self
            .sync
            .resize_instance(instance_id, size, Source::live(instance_id))?;
        let applied = result.value.size;

        let widget = {
            let mut state = self.state.borrow_mut();
            match state.handles.get_mut(instance_id) {
                Some(handle) => {
                    handle.size = applied;
                    handle.widget.filter(|_| handle.state.accepts_updates())
                }
                None => None,
            }
        };
        // The widget asked for a size outside the bounds; snap it back.
        if applied != size {
            if let Some(widget) = widget {
                self.apply(instance_id, widget, &RenderPatch::Size(applied));
            }
        }
        Ok(result)
    }
}
