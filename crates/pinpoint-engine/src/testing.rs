//! Shared fixtures: an engine over memory stores, a manual clock, static
//! displays and a renderer that records every call.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use pinpoint_common::{
    ConfigMap, DisplayInfo, Event, InstanceId, Layout, LayoutId, Rect, RenderError, Source,
    TileDefinition, TileId, Topic,
};
use pinpoint_config::PinpointConfig;
use pinpoint_store::{MemoryStore, Stores};
use serde_json::json;

use crate::clock::ManualClock;
use crate::display::StaticDisplays;
use crate::engine::Engine;
use crate::projection::{LiveEditSink, ProjectionController, RenderPatch, Renderer, ScreenPlacement, WidgetRef};
use crate::sync::{FlushSummary, TileSynchronizer};

pub(crate) fn display(index: usize, x: i32, primary: bool) -> DisplayInfo {
    DisplayInfo {
        index,
        name: format!("Display {}", index + 1),
        geometry: Rect::new(x, 0, 1920, 1080),
        scale: 1.0,
        is_primary: primary,
    }
}

pub(crate) fn patch(value: serde_json::Value) -> ConfigMap {
    value.as_object().cloned().unwrap()
}

pub(crate) fn content(text: &str) -> ConfigMap {
    patch(json!({ "content": text }))
}

type MountHook = Box<dyn Fn(&ScreenPlacement, &LiveEditSink)>;

#[derive(Default)]
pub(crate) struct RecordingRenderer {
    next: Cell<u64>,
    pub mounts: RefCell<Vec<(WidgetRef, ScreenPlacement)>>,
    pub updates: RefCell<Vec<(WidgetRef, RenderPatch)>>,
    pub unmounts: RefCell<Vec<WidgetRef>>,
    pub sinks: RefCell<HashMap<InstanceId, LiveEditSink>>,
    fail_mounts: Cell<usize>,
    on_mount: RefCell<Option<MountHook>>,
}

impl RecordingRenderer {
    pub fn fail_next_mounts(&self, n: usize) {
        self.fail_mounts.set(n);
    }

    /// Run `hook` inside every subsequent `mount` call.
    pub fn on_mount(&self, hook: impl Fn(&ScreenPlacement, &LiveEditSink) + 'static) {
        *self.on_mount.borrow_mut() = Some(Box::new(hook));
    }

    pub fn sink(&self, instance: &InstanceId) -> LiveEditSink {
        self.sinks.borrow()[instance].clone()
    }

    pub fn widget_for(&self, instance: &InstanceId) -> Option<WidgetRef> {
        self.mounts
            .borrow()
            .iter()
            .rev()
            .find(|(_, p)| &p.instance_id == instance)
            .map(|(w, _)| *w)
    }

    pub fn updates_for(&self, widget: WidgetRef) -> Vec<RenderPatch> {
        self.updates
            .borrow()
            .iter()
            .filter(|(w, _)| *w == widget)
            .map(|(_, p)| p.clone())
            .collect()
    }

    /// Mounted and not yet unmounted.
    pub fn live_widgets(&self) -> usize {
        let unmounts = self.unmounts.borrow();
        self.mounts
            .borrow()
            .iter()
            .filter(|(w, _)| !unmounts.contains(w))
            .count()
    }
}

impl Renderer for RecordingRenderer {
    fn mount(
        &self,
        placement: &ScreenPlacement,
        _tile: &TileDefinition,
        sink: LiveEditSink,
    ) -> Result<WidgetRef, RenderError> {
        if self.fail_mounts.get() > 0 {
            self.fail_mounts.set(self.fail_mounts.get() - 1);
            return Err(RenderError::MountFailed {
                instance: placement.instance_id.clone(),
                message: "injected".into(),
            });
        }
        let widget = WidgetRef(self.next.get() + 1);
        self.next.set(widget.0);
        self.mounts.borrow_mut().push((widget, placement.clone()));
        self.sinks
            .borrow_mut()
            .insert(placement.instance_id.clone(), sink.clone());
        if let Some(hook) = self.on_mount.borrow().as_ref() {
            hook(placement, &sink);
        }
        Ok(widget)
    }

    fn update(&self, widget: WidgetRef, patch: &RenderPatch) -> Result<(), RenderError> {
        self.updates.borrow_mut().push((widget, patch.clone()));
        Ok(())
    }

    fn unmount(&self, widget: WidgetRef) {
        self.unmounts.borrow_mut().push(widget);
    }
}

pub(crate) struct Harness {
    pub engine: Engine,
    pub clock: Rc<ManualClock>,
    pub tiles: Rc<MemoryStore<TileDefinition>>,
    pub layouts: Rc<MemoryStore<Layout>>,
    pub screens: Rc<StaticDisplays>,
    pub renderer: Rc<RecordingRenderer>,
    pub events: Rc<RefCell<Vec<Event>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_displays(vec![display(0, 0, true)])
    }

    pub fn with_displays(displays: Vec<DisplayInfo>) -> Self {
        let (stores, tiles, layouts) = Stores::memory();
        let clock = Rc::new(ManualClock::new());
        let screens = Rc::new(StaticDisplays::new(displays));
        let renderer = Rc::new(RecordingRenderer::default());
        let engine = Engine::new(
            &PinpointConfig::default(),
            stores,
            screens.clone(),
            renderer.clone(),
            clock.clone(),
        );

        let events = Rc::new(RefCell::new(Vec::new()));
        for topic in Topic::ALL {
            let log = Rc::clone(&events);
            engine.bus().subscribe(topic, move |e| {
                log.borrow_mut().push(e.clone());
                Ok(())
            });
        }

        Self {
            engine,
            clock,
            tiles,
            layouts,
            screens,
            renderer,
            events,
        }
    }

    pub fn sync(&self) -> &TileSynchronizer {
        self.engine.sync()
    }

    pub fn projection(&self) -> &ProjectionController {
        self.engine.projection()
    }

    pub fn topics(&self) -> Vec<Topic> {
        self.events.borrow().iter().map(Event::topic).collect()
    }

    pub fn count(&self, topic: Topic) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.topic() == topic)
            .count()
    }

    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }

    /// Move the clock forward and run due writes.
    pub fn advance(&self, ms: u64) -> FlushSummary {
        self.clock.advance_ms(ms);
        self.engine.poll()
    }

    pub fn note(&self, id: &str, text: &str) -> TileId {
        self.sync()
            .create_tile_with_id(TileId::from(id), "note", content(text), Source::Editor)
            .unwrap()
            .value
            .id
    }

    pub fn layout(&self, id: &str, display: usize) -> LayoutId {
        self.sync()
            .create_layout_with_id(LayoutId::from(id), Some(id), display, Source::Editor)
            .unwrap()
            .id
    }

    pub fn place(&self, layout: &LayoutId, tile: &TileId, x: i32, y: i32) -> InstanceId {
        self.sync()
            .add_instance(
                layout,
                tile,
                pinpoint_common::Point::new(x, y),
                None,
                Source::Editor,
            )
            .unwrap()
            .value
            .instance_id
    }
}
