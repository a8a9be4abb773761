pub mod cache;
pub mod clock;
pub mod display;
pub mod engine;
pub mod projection;
pub mod registry;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{
    DebounceKey, FlushReport, LoadReport, RecordKey, StorageFailure, TileCache, Window,
    WritePolicy,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use display::{DisplayProvider, DisplayRegistry, StaticDisplays};
pub use engine::Engine;
pub use projection::{
    DisplayOutcome, HandleState, LiveEditSink, LiveTileHandle, ProjectedLayout,
    ProjectionController, ProjectionReport, RenderPatch, Renderer, ScreenPlacement, WidgetRef,
};
pub use registry::{TileTypeDescriptor, TileTypeProvider, TileTypeRegistry, CORE_API_VERSION};
pub use sync::{FlushSummary, LayoutPatch, TileSynchronizer};
