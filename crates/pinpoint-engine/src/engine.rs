//! Wiring the engine's parts together.

use std::rc::Rc;
use std::time::Instant;

use pinpoint_common::{EventBus, PinpointError, StorageError};
use pinpoint_config::PinpointConfig;
use pinpoint_store::Stores;
use tracing::info;

use crate::cache::{LoadReport, TileCache, WritePolicy};
use crate::clock::{Clock, SystemClock};
use crate::display::{DisplayProvider, DisplayRegistry, StaticDisplays};
use crate::projection::{ProjectionController, Renderer};
use crate::registry::TileTypeRegistry;
use crate::sync::{FlushSummary, TileSynchronizer};

/// One bus, one cache, one display registry and one projection controller.
pub struct Engine {
    bus: Rc<EventBus>,
    displays: Rc<DisplayRegistry>,
    sync: Rc<TileSynchronizer>,
    projection: Rc<ProjectionController>,
}

impl Engine {
    pub fn new(
        config: &PinpointConfig,
        stores: Stores,
        provider: Rc<dyn DisplayProvider>,
        renderer: Rc<dyn Renderer>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let bus = Rc::new(EventBus::new());
        let cache = TileCache::new(stores, WritePolicy::from(&config.sync), clock);
        let sync = Rc::new(TileSynchronizer::new(
            cache,
            Rc::clone(&bus),
            TileTypeRegistry::with_builtins(),
            config.tiles.clone(),
        ));
        let displays = Rc::new(DisplayRegistry::new(provider, Rc::clone(&bus)));
        let projection =
            ProjectionController::new(Rc::clone(&sync), Rc::clone(&displays), renderer);
        Self {
            bus,
            displays,
            sync,
            projection,
        }
    }

    /// JSON stores under the configured data directory, configured
    /// displays and the wall clock. Records are loaded before returning.
    pub fn open(config: &PinpointConfig, renderer: Rc<dyn Renderer>) -> Result<Self, PinpointError> {
        let data_dir = pinpoint_config::resolve_data_dir(config)?;
        info!(path = %data_dir.display(), "opening data directory");
        let engine = Self::new(
            config,
            Stores::json_dir(&data_dir),
            Rc::new(StaticDisplays::from_config(&config.displays)),
            renderer,
            Rc::new(SystemClock),
        );
        let report = engine.load()?;
        info!(
            tiles = report.tiles,
            layouts = report.layouts,
            repaired = report.repaired.len(),
            "records loaded"
        );
        Ok(engine)
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    pub fn displays(&self) -> &Rc<DisplayRegistry> {
        &self.displays
    }

    pub fn sync(&self) -> &Rc<TileSynchronizer> {
        &self.sync
    }

    pub fn projection(&self) -> &Rc<ProjectionController> {
        &self.projection
    }

    pub fn load(&self) -> Result<LoadReport, StorageError> {
        self.sync.load()
    }

    pub fn poll(&self) -> FlushSummary {
        self.sync.poll()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.sync.next_deadline()
    }

    /// Unproject everything, then force every pending write.
    pub fn shutdown(&self) -> FlushSummary {
        self.projection.shutdown();
        let summary = self.sync.flush();
        info!(
            written = summary.written,
            failed = summary.failed,
            "engine shut down"
        );
        summary
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("displays", &self.displays.count())
            .field("pending_writes", &self.sync.pending_writes())
            .field("projection", &self.projection)
            .finish()
    }
}
