use serde::{Deserialize, Serialize};
use std::fmt;

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh, globally unique id.
            pub fn generate() -> Self {
                Self(format!(concat!($prefix, "_{}"), new_id()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// `true` for ids that cannot name a record (empty or whitespace only).
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Identifies a tile definition.
    TileId,
    "tile"
);
string_id!(
    /// Identifies a layout.
    LayoutId,
    "layout"
);
string_id!(
    /// Identifies one placement of a tile inside a layout. Unique across all layouts.
    InstanceId,
    "inst"
);
