//! Sources of display topology.

use std::cell::RefCell;

use pinpoint_common::{DisplayError, DisplayInfo};
use pinpoint_config::{to_display_infos, DisplayConfig};

/// Platform-agnostic display enumeration.
pub trait DisplayProvider {
    fn enumerate(&self) -> Result<Vec<DisplayInfo>, DisplayError>;
}

/// A fixed display list that can be swapped at runtime to model hot-plug.
#[derive(Debug, Default)]
pub struct StaticDisplays {
    displays: RefCell<Vec<DisplayInfo>>,
}

impl StaticDisplays {
    pub fn new(displays: Vec<DisplayInfo>) -> Self {
        Self {
            displays: RefCell::new(displays),
        }
    }

    pub fn from_config(displays: &[DisplayConfig]) -> Self {
        Self::new(to_display_infos(displays))
    }

    /// Replace the topology. Takes effect on the next registry refresh.
    pub fn set(&self, displays: Vec<DisplayInfo>) {
        *self.displays.borrow_mut() = displays;
    }
}

impl DisplayProvider for StaticDisplays {
    fn enumerate(&self) -> Result<Vec<DisplayInfo>, DisplayError> {
        Ok(self.displays.borrow().clone())
    }
}
