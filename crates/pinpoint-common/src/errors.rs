use std::path::PathBuf;

use crate::id::{InstanceId, LayoutId, TileId};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Errors returned synchronously from mutation requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("tile not found: {0}")]
    TileNotFound(TileId),

    #[error("layout not found: {0}")]
    LayoutNotFound(LayoutId),

    #[error("instance not found: {0}")]
    InstanceNotFound(InstanceId),

    #[error("instance {instance} references missing tile {tile}")]
    ReferentialIntegrity { instance: InstanceId, tile: TileId },

    #[error("validation failed for {field}: {message}")]
    Validation { field: String, message: String },
}

impl SyncError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {kind} {id}: {message}")]
    Serialize {
        kind: &'static str,
        id: String,
        message: String,
    },

    #[error("corrupt record at {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DisplayError {
    #[error("no display available (requested index {requested})")]
    DisplayUnavailable { requested: usize },

    #[error("display enumeration failed: {0}")]
    Platform(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("mount failed for instance {instance}: {message}")]
    MountFailed {
        instance: InstanceId,
        message: String,
    },

    #[error("widget {0} is not mounted")]
    UnknownWidget(u64),

    #[error("renderer error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("tile type already registered: {0}")]
    Duplicate(String),

    #[error("tile type {tile_type} requires core {required}, running {running}")]
    Incompatible {
        tile_type: String,
        required: String,
        running: String,
    },

    #[error("unknown tile type: {0}")]
    UnknownType(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PinpointError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Display(#[from] DisplayError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
