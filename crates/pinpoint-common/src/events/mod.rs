//! Topic-addressed events and the in-process bus that carries them.

mod bus;

pub use bus::{EventBus, Handler, SubscriptionToken};

use std::fmt;

use crate::errors::DisplayError;
use crate::id::{InstanceId, LayoutId, TileId};
use crate::model::{ConfigMap, DisplayInfo, Layout, TileDefinition};
use crate::source::Source;
use crate::types::{Point, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    TileCreated,
    TileUpdated,
    TileDeleted,
    LayoutCreated,
    LayoutUpdated,
    LayoutDeleting,
    LayoutDeleted,
    LayoutProjected,
    LayoutUnprojected,
    InstanceMoved,
    InstanceResized,
    DisplayChanged,
    StorageError,
    DisplayError,
}

impl Topic {
    pub const ALL: [Topic; 14] = [
        Topic::TileCreated,
        Topic::TileUpdated,
        Topic::TileDeleted,
        Topic::LayoutCreated,
        Topic::LayoutUpdated,
        Topic::LayoutDeleting,
        Topic::LayoutDeleted,
        Topic::LayoutProjected,
        Topic::LayoutUnprojected,
        Topic::InstanceMoved,
        Topic::InstanceResized,
        Topic::DisplayChanged,
        Topic::StorageError,
        Topic::DisplayError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::TileCreated => "tile:created",
            Topic::TileUpdated => "tile:updated",
            Topic::TileDeleted => "tile:deleted",
            Topic::LayoutCreated => "layout:created",
            Topic::LayoutUpdated => "layout:updated",
            Topic::LayoutDeleting => "layout:deleting",
            Topic::LayoutDeleted => "layout:deleted",
            Topic::LayoutProjected => "layout:projected",
            Topic::LayoutUnprojected => "layout:unprojected",
            Topic::InstanceMoved => "instance:moved",
            Topic::InstanceResized => "instance:resized",
            Topic::DisplayChanged => "display:changed",
            Topic::StorageError => "error:storage",
            Topic::DisplayError => "error:display",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    TileCreated {
        tile: TileDefinition,
        source: Source,
    },
    TileUpdated {
        tile_id: TileId,
        patch: ConfigMap,
        tile: TileDefinition,
        source: Source,
    },
    TileDeleted {
        tile_id: TileId,
        source: Source,
    },
    LayoutCreated {
        layout: Layout,
        source: Source,
    },
    LayoutUpdated {
        layout_id: LayoutId,
        layout: Layout,
        source: Source,
    },
    /// Sent before a layout's persisted state is removed.
    LayoutDeleting {
        layout_id: LayoutId,
    },
    LayoutDeleted {
        layout_id: LayoutId,
        source: Source,
    },
    LayoutProjected {
        layout_id: LayoutId,
        display_index: usize,
        handles: usize,
    },
    LayoutUnprojected {
        layout_id: LayoutId,
    },
    InstanceMoved {
        layout_id: LayoutId,
        instance_id: InstanceId,
        position: Point,
        source: Source,
    },
    InstanceResized {
        layout_id: LayoutId,
        instance_id: InstanceId,
        size: Size,
        source: Source,
    },
    DisplayChanged {
        displays: Vec<DisplayInfo>,
    },
    StorageFailed {
        kind: &'static str,
        record_id: String,
        attempts: u32,
        message: String,
    },
    DisplayFailed {
        layout_id: Option<LayoutId>,
        error: DisplayError,
    },
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::TileCreated { .. } => Topic::TileCreated,
            Event::TileUpdated { .. } => Topic::TileUpdated,
            Event::TileDeleted { .. } => Topic::TileDeleted,
            Event::LayoutCreated { .. } => Topic::LayoutCreated,
            Event::LayoutUpdated { .. } => Topic::LayoutUpdated,
            Event::LayoutDeleting { .. } => Topic::LayoutDeleting,
            Event::LayoutDeleted { .. } => Topic::LayoutDeleted,
            Event::LayoutProjected { .. } => Topic::LayoutProjected,
            Event::LayoutUnprojected { .. } => Topic::LayoutUnprojected,
            Event::InstanceMoved { .. } => Topic::InstanceMoved,
            Event::InstanceResized { .. } => Topic::InstanceResized,
            Event::DisplayChanged { .. } => Topic::DisplayChanged,
            Event::StorageFailed { .. } => Topic::StorageError,
            Event::DisplayFailed { .. } => Topic::DisplayError,
        }
    }

    /// The origin of the mutation this event reports, if it has one.
    pub fn source(&self) -> Option<&Source> {
        match self {
            Event::TileCreated { source, .. }
            | Event::TileUpdated { source, .. }
            | Event::TileDeleted { source, .. }
            | Event::LayoutCreated { source, .. }
            | Event::LayoutUpdated { source, .. }
            | Event::LayoutDeleted { source, .. }
            | Event::InstanceMoved { source, .. }
            | Event::InstanceResized { source, .. } => Some(source),
            _ => None,
        }
    }
}
