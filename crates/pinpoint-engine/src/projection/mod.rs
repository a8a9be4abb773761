//! Materializes layouts onto displays as live tile handles.
//!
//! The controller owns every [`LiveTileHandle`] and is the only caller of
//! the [`Renderer`]. It never holds its own state borrowed while calling
//! out, since renderers and bus handlers may call straight back in.

mod handle;
mod reactions;
mod reconcile;
mod renderer;
mod sink;


pub use handle::{HandleState, IllegalTransition, LiveTileHandle};
pub use reconcile::DisplayOutcome;
pub use renderer::{RenderPatch, Renderer, ScreenPlacement, WidgetRef};
pub use sink::LiveEditSink;

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::{Rc, Weak};

use pinpoint_common::{
    DisplayInfo, Event, EventBus, InstanceId, LayoutId, PinpointError, RenderError, Source,
    SubscriptionToken, SyncError, TileInstance, Topic,
};
use tracing::{debug, info, warn};

use crate::display::DisplayRegistry;
use crate::sync::TileSynchronizer;

/// A layout currently shown on a display.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedLayout {
    pub layout_id: LayoutId,
    /// The display index the layout asked for.
    pub requested: usize,
    /// The display actually used, as it was when the layout was projected.
    pub display: DisplayInfo,
    pub instances: Vec<InstanceId>,
}

#[derive(Debug)]
pub struct ProjectionReport {
    pub layout_id: LayoutId,
    pub display: DisplayInfo,
    pub mounted: usize,
    pub failed: Vec<(InstanceId, RenderError)>,
}

#[derive(Debug, Default)]
struct ProjectionState {
    handles: HashMap<InstanceId, LiveTileHandle>,
    projected: BTreeMap<LayoutId, ProjectedLayout>,
}

pub struct ProjectionController {
    sync: Rc<TileSynchronizer>,
    displays: Rc<DisplayRegistry>,
    renderer: Rc<dyn Renderer>,
    state: RefCell<ProjectionState>,
    subscriptions: RefCell<Vec<SubscriptionToken>>,
    next_generation: Cell<u64>,
    me: Weak<ProjectionController>,
}

impl ProjectionController {
    /// Build the controller and subscribe it to the bus.
    pub fn new(
        sync: Rc<TileSynchronizer>,
        displays: Rc<DisplayRegistry>,
        renderer: Rc<dyn Renderer>,
    ) -> Rc<Self> {
        let controller = Rc::new_cyclic(|me| Self {
            sync,
            displays,
            renderer,
            state: RefCell::new(ProjectionState::default()),
            subscriptions: RefCell::new(Vec::new()),
            next_generation: Cell::new(1),
            me: me.clone(),
        });
        controller.attach();
        controller
    }

    /// The controller writes as `Source::System`; the bus keeps those writes
    /// from coming back to it.
    fn attach(&self) {
        let bus = self.bus().clone();
        let topics = [
            Topic::TileUpdated,
            Topic::TileDeleted,
            Topic::LayoutUpdated,
            Topic::LayoutDeleting,
            Topic::InstanceMoved,
            Topic::InstanceResized,
            Topic::DisplayChanged,
        ];
        let tokens = topics
            .into_iter()
            .map(|topic| {
                let me = self.me.clone();
                bus.subscribe_as(topic, Source::System, move |event| match me.upgrade() {
                    Some(controller) => controller.on_event(event),
                    None => Ok(()),
                })
            })
            .collect();
        *self.subscriptions.borrow_mut() = tokens;
    }

    fn bus(&self) -> &Rc<EventBus> {
        self.sync.bus()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn handle(&self, instance: &InstanceId) -> Option<LiveTileHandle> {
        self.state.borrow().handles.get(instance).cloned()
    }

    /// Every handle, by instance id.
    pub fn handles(&self) -> Vec<LiveTileHandle> {
        let mut handles: Vec<LiveTileHandle> =
            self.state.borrow().handles.values().cloned().collect();
        handles.sort_by(|a, b| a.instance_id.cmp(&b.instance_id));
        handles
    }

    pub fn handles_for(&self, layout_id: &LayoutId) -> Vec<LiveTileHandle> {
        self.handles()
            .into_iter()
            .filter(|h| &h.layout_id == layout_id)
            .collect()
    }

    pub fn handle_count(&self) -> usize {
        self.state.borrow().handles.len()
    }

    pub fn is_projected(&self, layout_id: &LayoutId) -> bool {
        self.state.borrow().projected.contains_key(layout_id)
    }

    pub fn projected_layouts(&self) -> Vec<ProjectedLayout> {
        self.state.borrow().projected.values().cloned().collect()
    }

    // =========================================================================
    // Project / unproject
    // =========================================================================

    /// Show a layout on a display, replacing any previous projection of it.
    ///
    /// `display` defaults to the layout's stored target; either way the
    /// registry's fallback policy picks the display actually used. An
    /// explicit `display` becomes the layout's new target. A fallback only
    /// updates the display snapshot, so the layout returns to its target
    /// once that display is back.
    pub fn project(
        &self,
        layout_id: &LayoutId,
        display: Option<usize>,
    ) -> Result<ProjectionReport, PinpointError> {
        let layout = self
            .sync
            .layout(layout_id)
            .ok_or_else(|| SyncError::LayoutNotFound(layout_id.clone()))?;
        let requested = display.unwrap_or(layout.display_settings.target_display);
        let target = self.displays.resolve(requested)?;
        if target.index != requested {
            warn!(
                layout = %layout_id,
                requested,
                fallback = target.index,
                "requested display missing, using fallback"
            );
        }

        self.teardown(layout_id);
        let layout = self.sync.set_layout_display(
            layout_id,
            requested,
            Some(target.clone()),
            Source::System,
        )?;
        self.state.borrow_mut().projected.insert(
            layout_id.clone(),
            ProjectedLayout {
                layout_id: layout_id.clone(),
                requested,
                display: target.clone(),
                instances: Vec::new(),
            },
        );

        let mut report = ProjectionReport {
            layout_id: layout_id.clone(),
            display: target.clone(),
            mounted: 0,
            failed: Vec::new(),
        };
        for instance in &layout.tile_instances {
            match self.mount_instance(layout_id, instance, &target) {
                Ok(true) => report.mounted += 1,
                Ok(false) => {}
                Err(e) => report.failed.push((instance.instance_id.clone(), e)),
            }
        }

        info!(
            layout = %layout_id,
            display = target.index,
            mounted = report.mounted,
            failed = report.failed.len(),
            "layout projected"
        );
        self.bus().emit(Event::LayoutProjected {
            layout_id: layout_id.clone(),
            display_index: target.index,
            handles: report.mounted,
        });
        Ok(report)
    }

    /// Unmount every handle of a layout. Returns how many were removed.
    pub fn unproject(&self, layout_id: &LayoutId) -> usize {
        if !self.is_projected(layout_id) {
            return 0;
        }
        let removed = self.teardown(layout_id);
        info!(layout = %layout_id, removed, "layout unprojected");
        self.bus().emit(Event::LayoutUnprojected {
            layout_id: layout_id.clone(),
        });
        removed
    }

    /// Unproject everything and detach from the bus.
    pub fn shutdown(&self) {
        let layouts: Vec<LayoutId> = self.state.borrow().projected.keys().cloned().collect();
        for layout_id in &layouts {
            self.unproject(layout_id);
        }
        let tokens: Vec<SubscriptionToken> = self.subscriptions.borrow_mut().drain(..).collect();
        let bus = self.bus().clone();
        for token in tokens {
            bus.unsubscribe(token);
        }
        info!(layouts = layouts.len(), "projection controller shut down");
    }

    // =========================================================================
    // Handle lifecycle
    // =========================================================================

    /// Mount one instance. `Ok(false)` means it was skipped or discarded
    /// while mounting.
    fn mount_instance(
        &self,
        layout_id: &LayoutId,
        instance: &TileInstance,
        display: &DisplayInfo,
    ) -> Result<bool, RenderError> {
        let Some(tile) = self.sync.tile(&instance.tile_id) else {
            warn!(instance = %instance.instance_id, tile = %instance.tile_id, "tile missing, not mounting");
            return Ok(false);
        };
        let position = self
            .displays
            .to_screen(instance.position, display.index)
            .map_err(|e| RenderError::Other(e.to_string()))?;

        // At most one handle per instance.
        self.teardown_instance(&instance.instance_id);

        let generation = self.next_generation.get();
        self.next_generation.set(generation + 1);
        {
            let mut state = self.state.borrow_mut();
            state.handles.insert(
                instance.instance_id.clone(),
                LiveTileHandle::mounting(
                    instance.instance_id.clone(),
                    layout_id.clone(),
                    instance.tile_id.clone(),
                    display.index,
                    position,
                    instance.size,
                    generation,
                ),
            );
            if let Some(projection) = state.projected.get_mut(layout_id) {
                projection.instances.push(instance.instance_id.clone());
            }
        }

        let placement = ScreenPlacement {
            layout_id: layout_id.clone(),
            instance_id: instance.instance_id.clone(),
            tile_id: instance.tile_id.clone(),
            display_index: display.index,
            position,
            size: instance.size,
            scale: display.scale,
        };
        let sink = LiveEditSink::new(
            self.me.clone(),
            layout_id.clone(),
            instance.instance_id.clone(),
        );

        match self.renderer.mount(&placement, &tile, sink) {
            Ok(widget) => {
                let adopted = {
                    let mut state = self.state.borrow_mut();
                    match state.handles.get_mut(&instance.instance_id) {
                        Some(h) if h.generation == generation && h.state == HandleState::Mounting => {
                            h.widget = Some(widget);
                            let _ = h.state.transition(HandleState::Active);
                            Some(std::mem::take(&mut h.stale))
                        }
                        _ => None,
                    }
                };
                match adopted {
                    None => {
                        debug!(instance = %instance.instance_id, %widget, "handle dropped while mounting");
                        self.renderer.unmount(widget);
                        Ok(false)
                    }
                    Some(stale) => {
                        debug!(instance = %instance.instance_id, %widget, "handle active");
                        if stale {
                            self.resync(&instance.instance_id);
                        }
                        Ok(true)
                    }
                }
            }
            Err(e) => {
                warn!(instance = %instance.instance_id, "mount failed: {e}");
                let mut state = self.state.borrow_mut();
                let ours = state
                    .handles
                    .get(&instance.instance_id)
                    .is_some_and(|h| h.generation == generation);
                if ours {
                    state.handles.remove(&instance.instance_id);
                    for projection in state.projected.values_mut() {
                        projection.instances.retain(|i| i != &instance.instance_id);
                    }
                }
                Err(e)
            }
        }
    }

    /// Unmount and forget one handle. Returns `false` if there was none.
    fn teardown_instance(&self, id: &InstanceId) -> bool {
        let widget = {
            let mut state = self.state.borrow_mut();
            let current = match state.handles.get(id) {
                Some(h) => h.state,
                None => return false,
            };
            match current {
                HandleState::Mounting => {
                    // The widget is unmounted when its mount call returns.
                    state.handles.remove(id);
                    forget_instance(&mut state, id);
                    return true;
                }
                HandleState::Active => match state.handles.get_mut(id) {
                    Some(h) => {
                        let _ = h.state.transition(HandleState::Unmounting);
                        h.widget
                    }
                    None => None,
                },
                HandleState::Unmounting | HandleState::Unmounted => return false,
            }
        };

        if let Some(widget) = widget {
            self.renderer.unmount(widget);
        }

        let mut state = self.state.borrow_mut();
        if let Some(mut handle) = state.handles.remove(id) {
            let _ = handle.state.transition(HandleState::Unmounted);
            debug!(instance = %id, "handle unmounted");
        }
        forget_instance(&mut state, id);
        true
    }

    /// Unmount every handle of a layout and forget the projection.
    fn teardown(&self, layout_id: &LayoutId) -> usize {
        let projection = self.state.borrow_mut().projected.remove(layout_id);
        let Some(projection) = projection else {
            return 0;
        };
        projection
            .instances
            .iter()
            .filter(|id| self.teardown_instance(id))
            .count()
    }

    /// Push the full current state to a handle that missed updates.
    fn resync(&self, instance_id: &InstanceId) {
        let Some((_, instance)) = self.sync.instance(instance_id) else {
            return;
        };
        let Some(tile) = self.sync.tile(&instance.tile_id) else {
            return;
        };
        let target = {
            let mut state = self.state.borrow_mut();
            let Some(handle) = state.handles.get_mut(instance_id) else {
                return;
            };
            let Ok(position) = self.displays.to_screen(instance.position, handle.display_index)
            else {
                return;
            };
            handle.position = position;
            handle.size = instance.size;
            handle.widget.map(|w| (w, position))
        };
        let Some((widget, position)) = target else {
            return;
        };
        debug!(instance = %instance_id, "resyncing handle");
        for patch in [
            RenderPatch::Content(tile.config.clone()),
            RenderPatch::Position(position),
            RenderPatch::Size(instance.size),
        ] {
            self.apply(instance_id, widget, &patch);
        }
    }

    /// Send an in-place update to an active widget.
    fn apply(&self, instance_id: &InstanceId, widget: WidgetRef, patch: &RenderPatch) {
        if let Err(e) = self.renderer.update(widget, patch) {
            warn!(instance = %instance_id, %widget, "render update failed: {e}");
        }
    }
}

fn forget_instance(state: &mut ProjectionState, id: &InstanceId) {
    for projection in state.projected.values_mut() {
        projection.instances.retain(|i| i != id);
    }
}

impl std::fmt::Debug for ProjectionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ProjectionController")
            .field("handles", &state.handles.len())
            .field("projected", &state.projected.len())
            .finish()
    }
}
