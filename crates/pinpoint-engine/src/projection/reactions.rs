//! Keeping projected widgets in step with the synchronizer.

use std::collections::HashSet;

use pinpoint_common::{
    ConfigMap, Event, InstanceId, Layout, LayoutId, Point, Size, Source, TileId,
};
use tracing::{debug, warn};

use super::{HandleState, ProjectionController, RenderPatch, WidgetRef};

impl ProjectionController {
    pub(super) fn on_event(&self, event: &Event) -> pinpoint_common::Result<()> {
        match event {
            Event::TileUpdated {
                tile_id,
                patch,
                source,
                ..
            } => self.on_tile_updated(tile_id, patch, source),
            Event::TileDeleted { tile_id, .. } => self.on_tile_deleted(tile_id),
            Event::LayoutUpdated { layout_id, layout, .. } => self.on_layout_updated(layout_id, layout),
            Event::LayoutDeleting { layout_id } => {
                self.unproject(layout_id);
            }
            Event::InstanceMoved {
                instance_id,
                position,
                source,
                ..
            } => self.on_instance_moved(instance_id, *position, source),
            Event::InstanceResized {
                instance_id,
                size,
                source,
                ..
            } => self.on_instance_resized(instance_id, *size, source),
            Event::DisplayChanged { .. } => {
                self.reconcile_displays();
            }
            _ => {}
        }
        Ok(())
    }

    fn on_tile_updated(&self, tile_id: &TileId, patch: &ConfigMap, source: &Source) {
        let targets: Vec<(InstanceId, WidgetRef)> = {
            let mut state = self.state.borrow_mut();
            state
                .handles
                .values_mut()
                .filter(|h| &h.tile_id == tile_id)
                .filter_map(|h| {
                    if is_origin(source, &h.instance_id) {
                        debug!(instance = %h.instance_id, "suppressed circular update");
                        return None;
                    }
                    mark_or_target(h.state, &mut h.stale, h.widget)
                        .map(|w| (h.instance_id.clone(), w))
                })
                .collect()
        };
        let patch = RenderPatch::Content(patch.clone());
        for (instance_id, widget) in targets {
            self.apply(&instance_id, widget, &patch);
        }
    }

    fn on_instance_moved(&self, instance_id: &InstanceId, position: Point, source: &Source) {
        if is_origin(source, instance_id) {
            debug!(instance = %instance_id, "suppressed circular move");
            return;
        }
        let target = {
            let mut state = self.state.borrow_mut();
            let Some(handle) = state.handles.get_mut(instance_id) else {
                return;
            };
            let screen = match self.displays.to_screen(position, handle.display_index) {
                Ok(p) => p,
                Err(e) => {
                    warn!(instance = %instance_id, "cannot place moved instance: {e}");
                    return;
                }
            };
            handle.position = screen;
            mark_or_target(handle.state, &mut handle.stale, handle.widget).map(|w| (w, screen))
        };
        if let Some((widget, screen)) = target {
            self.apply(instance_id, widget, &RenderPatch::Position(screen));
        }
    }

    fn on_instance_resized(&self, instance_id: &InstanceId, size: Size, source: &Source) {
        if is_origin(source, instance_id) {
            debug!(instance = %instance_id, "suppressed circular resize");
            return;
        }
        let widget = {
            let mut state = self.state.borrow_mut();
            let Some(handle) = state.handles.get_mut(instance_id) else {
                return;
            };
            handle.size = size;
            mark_or_target(handle.state, &mut handle.stale, handle.widget)
        };
        if let Some(widget) = widget {
            self.apply(instance_id, widget, &RenderPatch::Size(size));
        }
    }

    fn on_tile_deleted(&self, tile_id: &TileId) {
        let doomed: Vec<InstanceId> = self
            .state
            .borrow()
            .handles
            .values()
            .filter(|h| &h.tile_id == tile_id)
            .map(|h| h.instance_id.clone())
            .collect();
        for id in &doomed {
            self.teardown_instance(id);
        }
        if !doomed.is_empty() {
            debug!(tile = %tile_id, unmounted = doomed.len(), "tile deleted, handles removed");
        }
    }

    /// Bring a projected layout's handles in line with its instances.
    fn on_layout_updated(&self, layout_id: &LayoutId, layout: &Layout) {
        let projection = self.state.borrow().projected.get(layout_id).cloned();
        let Some(projection) = projection else {
            return;
        };

        let target = layout.display_settings.target_display;
        if target != projection.requested {
            debug!(layout = %layout_id, from = projection.requested, to = target, "target display changed");
            if let Err(e) = self.project(layout_id, None) {
                warn!(layout = %layout_id, "re-projection failed: {e}");
            }
            return;
        }

        let wanted: HashSet<&InstanceId> =
            layout.tile_instances.iter().map(|i| &i.instance_id).collect();
        for id in projection.instances.iter().filter(|id| !wanted.contains(id)) {
            self.teardown_instance(id);
        }

        let missing: Vec<_> = layout
            .tile_instances
            .iter()
            .filter(|i| !self.state.borrow().handles.contains_key(&i.instance_id))
            .cloned()
            .collect();
        for instance in &missing {
            if let Err(e) = self.mount_instance(layout_id, instance, &projection.display) {
                warn!(layout = %layout_id, instance = %instance.instance_id, "mount failed: {e}");
            }
        }
    }
}

fn is_origin(source: &Source, instance_id: &InstanceId) -> bool {
    matches!(source, Source::Live(origin) if origin == instance_id)
}

/// Active handles are updated now; mounting ones are flagged for a resync.
fn mark_or_target(
    state: HandleState,
    stale: &mut bool,
    widget: Option<WidgetRef>,
) -> Option<WidgetRef> {
    match state {
        HandleState::Active => widget,
        HandleState::Mounting => {
            *stale = true;
            None
        }
        HandleState::Unmounting | HandleState::Unmounted => None,
    }
}
