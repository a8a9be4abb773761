//! Origin tags carried by every mutation.
//!
//! A subscriber that receives an event whose source equals its own identity
//! must not re-issue the change; that comparison is what keeps a live tile
//! and its editor from bouncing the same edit back and forth.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::id::InstanceId;

const LIVE_PREFIX: &str = "live:";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    /// The layout/tile editor UI.
    Editor,
    /// A projected widget, identified by the instance it renders.
    Live(InstanceId),
    /// The engine itself (cascades, startup repair, display fallback).
    System,
    /// Any other named collaborator.
    Named(String),
}

impl Source {
    pub fn live(instance: &InstanceId) -> Self {
        Self::Live(instance.clone())
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Editor => f.write_str("editor"),
            Self::Live(id) => write!(f, "{LIVE_PREFIX}{id}"),
            Self::System => f.write_str("system"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl FromStr for Source {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "editor" => Self::Editor,
            "system" => Self::System,
            _ => match s.strip_prefix(LIVE_PREFIX) {
                Some(id) => Self::Live(InstanceId::from(id)),
                None => Self::Named(s.to_owned()),
            },
        })
    }
}

impl Serialize for Source {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Source {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        // Infallible: every string names some source.
        Ok(s.parse().unwrap_or(Source::System))
    }
}
