pub mod errors;
pub mod events;
pub mod id;
pub mod model;
pub mod source;
pub mod types;
pub mod validated;

pub use errors::{
    ConfigError, DisplayError, PinpointError, RegistryError, RenderError, StorageError, SyncError,
};
pub use events::{Event, EventBus, SubscriptionToken, Topic};
pub use id::{new_id, InstanceId, LayoutId, TileId};
pub use model::{
    ConfigMap, DisplayInfo, DisplaySettings, Layout, Record, TileDefinition, TileInstance,
};
pub use source::Source;
pub use types::{Point, Rect, Size, SizeBounds};
pub use validated::{Validated, ValidationWarning};

pub type Result<T> = std::result::Result<T, PinpointError>;
