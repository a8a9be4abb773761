//! Headless renderer: every widget is a line in the log.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use pinpoint_common::{InstanceId, RenderError, TileDefinition};
use pinpoint_engine::{LiveEditSink, RenderPatch, Renderer, ScreenPlacement, WidgetRef};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
struct Widget {
    instance_id: InstanceId,
    tile_type: String,
    placement: ScreenPlacement,
}

/// Keeps track of what would be on screen and logs every change. Live
/// edits never originate here, so mount-time sinks are dropped.
#[derive(Debug, Default)]
pub struct LogRenderer {
    next: Cell<u64>,
    widgets: RefCell<BTreeMap<WidgetRef, Widget>>,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mounted(&self) -> usize {
        self.widgets.borrow().len()
    }
}

impl Renderer for LogRenderer {
    fn mount(
        &self,
        placement: &ScreenPlacement,
        tile: &TileDefinition,
        _sink: LiveEditSink,
    ) -> Result<WidgetRef, RenderError> {
        let widget = WidgetRef(self.next.get() + 1);
        self.next.set(widget.0);
        info!(
            %widget,
            instance = %placement.instance_id,
            tile = %tile.id,
            tile_type = %tile.tile_type,
            display = placement.display_index,
            position = %placement.position,
            size = %placement.size,
            content = tile.content().unwrap_or(""),
            "mount"
        );
        self.widgets.borrow_mut().insert(
            widget,
            Widget {
                instance_id: placement.instance_id.clone(),
                tile_type: tile.tile_type.clone(),
                placement: placement.clone(),
            },
        );
        Ok(widget)
    }

    fn update(&self, widget: WidgetRef, patch: &RenderPatch) -> Result<(), RenderError> {
        let mut widgets = self.widgets.borrow_mut();
        let entry = widgets
            .get_mut(&widget)
            .ok_or(RenderError::UnknownWidget(widget.0))?;
        match patch {
            RenderPatch::Content(changes) => {
                let keys: Vec<&str> = changes.keys().map(String::as_str).collect();
                info!(%widget, instance = %entry.instance_id, ?keys, "update content");
            }
            RenderPatch::Position(position) => {
                let from = std::mem::replace(&mut entry.placement.position, *position);
                info!(%widget, instance = %entry.instance_id, %from, to = %position, "move");
            }
            RenderPatch::Size(size) => {
                let from = std::mem::replace(&mut entry.placement.size, *size);
                info!(%widget, instance = %entry.instance_id, %from, to = %size, "resize");
            }
        }
        Ok(())
    }

    fn unmount(&self, widget: WidgetRef) {
        let removed = self.widgets.borrow_mut().remove(&widget);
        if let Some(w) = removed {
            info!(%widget, instance = %w.instance_id, tile_type = %w.tile_type, "unmount");
        }
    }
}
