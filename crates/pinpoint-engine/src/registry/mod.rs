//! Registry of tile types the engine will accept.
//!
//! Providers are registered explicitly and checked against the engine's
//! API version at registration time.

mod builtin;

pub use builtin::{builtin_types, BuiltinTileType};

use std::collections::BTreeMap;

use pinpoint_common::{ConfigMap, RegistryError};
use semver::{Version, VersionReq};
use tracing::{info, warn};

/// Version of the tile-type contract this engine implements.
pub const CORE_API_VERSION: Version = Version::new(1, 0, 0);

#[derive(Debug, Clone, PartialEq)]
pub struct TileTypeDescriptor {
    /// Discriminant stored in each tile's `type` field.
    pub tile_type: String,
    pub name: String,
    pub category: String,
    pub version: Version,
    pub requires_core: VersionReq,
    /// Merged beneath the caller's config when a tile is created.
    pub default_config: ConfigMap,
    pub capabilities: Vec<String>,
}

impl TileTypeDescriptor {
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

pub trait TileTypeProvider {
    fn descriptor(&self) -> TileTypeDescriptor;
}

#[derive(Debug)]
pub struct TileTypeRegistry {
    types: BTreeMap<String, TileTypeDescriptor>,
    core: Version,
}

impl TileTypeRegistry {
    /// An empty registry for the current core version.
    pub fn new() -> Self {
        Self::for_core(CORE_API_VERSION)
    }

    pub fn for_core(core: Version) -> Self {
        Self {
            types: BTreeMap::new(),
            core,
        }
    }

    /// A registry holding `note`, `clock`, `weather` and `todo`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for provider in builtin_types() {
            if let Err(e) = registry.register(&provider) {
                warn!("built-in tile type rejected: {e}");
            }
        }
        info!(count = registry.len(), "registered built-in tile types");
        registry
    }

    pub fn register(&mut self, provider: &dyn TileTypeProvider) -> Result<(), RegistryError> {
        let descriptor = provider.descriptor();
        if self.types.contains_key(&descriptor.tile_type) {
            return Err(RegistryError::Duplicate(descriptor.tile_type));
        }
        if !descriptor.requires_core.matches(&self.core) {
            return Err(RegistryError::Incompatible {
                tile_type: descriptor.tile_type,
                required: descriptor.requires_core.to_string(),
                running: self.core.to_string(),
            });
        }
        info!(
            tile_type = %descriptor.tile_type,
            version = %descriptor.version,
            "tile type registered"
        );
        self.types.insert(descriptor.tile_type.clone(), descriptor);
        Ok(())
    }

    pub fn get(&self, tile_type: &str) -> Option<&TileTypeDescriptor> {
        self.types.get(tile_type)
    }

    pub fn contains(&self, tile_type: &str) -> bool {
        self.types.contains_key(tile_type)
    }

    pub fn defaults_for(&self, tile_type: &str) -> Result<ConfigMap, RegistryError> {
        self.get(tile_type)
            .map(|d| d.default_config.clone())
            .ok_or_else(|| RegistryError::UnknownType(tile_type.to_string()))
    }

    pub fn types(&self) -> impl Iterator<Item = &TileTypeDescriptor> {
        self.types.values()
    }

    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a TileTypeDescriptor> {
        self.types.values().filter(move |d| d.category == category)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TileTypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Custom {
        tile_type: &'static str,
        requires: &'static str,
    }

    impl TileTypeProvider for Custom {
        fn descriptor(&self) -> TileTypeDescriptor {
            TileTypeDescriptor {
                tile_type: self.tile_type.into(),
                name: "Custom".into(),
                category: "Utility".into(),
                version: Version::new(0, 3, 0),
                requires_core: VersionReq::parse(self.requires).unwrap(),
                default_config: ConfigMap::new(),
                capabilities: vec!["resizable".into()],
            }
        }
    }

    #[test]
    fn builtins_are_registered() {
        let registry = TileTypeRegistry::with_builtins();
        assert_eq!(registry.len(), 4);
        for t in ["note", "clock", "weather", "todo"] {
            assert!(registry.contains(t), "missing {t}");
        }
        let note = registry.get("note").unwrap();
        assert_eq!(note.default_config["font_size"], 14);
        assert!(note.has_capability("editable"));
        assert!(!registry.get("clock").unwrap().has_capability("editable"));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = TileTypeRegistry::with_builtins();
        let err = registry
            .register(&Custom {
                tile_type: "note",
                requires: "^1",
            })
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("note".into()));
    }

    #[test]
    fn incompatible_core_requirement_is_rejected() {
        let mut registry = TileTypeRegistry::new();
        let err = registry
            .register(&Custom {
                tile_type: "stocks",
                requires: ">=2.0",
            })
            .unwrap_err();
        assert!(matches!(err, RegistryError::Incompatible { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn compatible_provider_is_accepted() {
        let mut registry = TileTypeRegistry::new();
        registry
            .register(&Custom {
                tile_type: "stocks",
                requires: ">=1.0, <2.0",
            })
            .unwrap();
        assert!(registry.contains("stocks"));
        assert_eq!(registry.by_category("Utility").count(), 1);
    }

    #[test]
    fn defaults_for_unknown_type() {
        let registry = TileTypeRegistry::with_builtins();
        assert_eq!(
            registry.defaults_for("nope"),
            Err(RegistryError::UnknownType("nope".into()))
        );
        assert_eq!(registry.defaults_for("weather").unwrap()["units"], "metric");
    }
}
