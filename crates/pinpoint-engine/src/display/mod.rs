//! Display topology and editor/screen coordinate math.

mod provider;

pub use provider::{DisplayProvider, StaticDisplays};

use std::cell::RefCell;
use std::rc::Rc;

use pinpoint_common::{DisplayError, DisplayInfo, Event, EventBus, Point, Rect};
use tracing::{info, warn};

/// Single source of truth for the connected displays.
///
/// The registry reports changes; deciding what to do with layouts on a
/// vanished display is the projection controller's job.
pub struct DisplayRegistry {
    provider: Rc<dyn DisplayProvider>,
    displays: RefCell<Vec<DisplayInfo>>,
    bus: Rc<EventBus>,
}

impl DisplayRegistry {
    /// Enumerate once. An enumeration failure leaves the registry empty.
    pub fn new(provider: Rc<dyn DisplayProvider>, bus: Rc<EventBus>) -> Self {
        let displays = match provider.enumerate() {
            Ok(displays) => displays,
            Err(e) => {
                warn!("initial display enumeration failed: {e}");
                Vec::new()
            }
        };
        info!(count = displays.len(), "displays enumerated");
        Self {
            provider,
            displays: RefCell::new(displays),
            bus,
        }
    }

    pub fn list_displays(&self) -> Vec<DisplayInfo> {
        self.displays.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.displays.borrow().len()
    }

    pub fn display(&self, index: usize) -> Option<DisplayInfo> {
        self.displays
            .borrow()
            .iter()
            .find(|d| d.index == index)
            .cloned()
    }

    pub fn primary(&self) -> Option<DisplayInfo> {
        self.displays
            .borrow()
            .iter()
            .find(|d| d.is_primary)
            .cloned()
    }

    /// The display whose geometry contains `point` (screen space).
    pub fn display_at(&self, point: Point) -> Option<DisplayInfo> {
        self.displays
            .borrow()
            .iter()
            .find(|d| d.geometry.contains(point))
            .cloned()
    }

    /// Smallest rectangle covering every display.
    pub fn combined_bounds(&self) -> Option<Rect> {
        let displays = self.displays.borrow();
        let first = displays.first()?.geometry;
        let (mut left, mut top) = (first.x, first.y);
        let (mut right, mut bottom) = (first.right(), first.bottom());
        for d in displays.iter().skip(1) {
            left = left.min(d.geometry.x);
            top = top.min(d.geometry.y);
            right = right.max(d.geometry.right());
            bottom = bottom.max(d.geometry.bottom());
        }
        Some(Rect::new(
            left,
            top,
            right.saturating_sub(left),
            bottom.saturating_sub(top),
        ))
    }

    /// The display to use for `requested`: that display if present, else
    /// the primary, else index 0, else the first one reported.
    pub fn resolve(&self, requested: usize) -> Result<DisplayInfo, DisplayError> {
        let displays = self.displays.borrow();
        displays
            .iter()
            .find(|d| d.index == requested)
            .or_else(|| displays.iter().find(|d| d.is_primary))
            .or_else(|| displays.iter().find(|d| d.index == 0))
            .or_else(|| displays.first())
            .cloned()
            .ok_or(DisplayError::DisplayUnavailable { requested })
    }

    /// Editor coordinates are relative to the display's origin.
    pub fn to_screen(&self, editor: Point, index: usize) -> Result<Point, DisplayError> {
        let display = self
            .display(index)
            .ok_or(DisplayError::DisplayUnavailable { requested: index })?;
        Ok(editor + display.origin())
    }

    pub fn to_editor(&self, screen: Point, index: usize) -> Result<Point, DisplayError> {
        let display = self
            .display(index)
            .ok_or(DisplayError::DisplayUnavailable { requested: index })?;
        Ok(screen - display.origin())
    }

    /// Re-enumerate and announce the new topology on `display:changed`.
    ///
    /// On failure the previous list is kept and `error:display` is emitted.
    pub fn refresh(&self) -> Result<Vec<DisplayInfo>, DisplayError> {
        let displays = match self.provider.enumerate() {
            Ok(displays) => displays,
            Err(error) => {
                warn!("display enumeration failed: {error}");
                self.bus.emit(Event::DisplayFailed {
                    layout_id: None,
                    error: error.clone(),
                });
                return Err(error);
            }
        };

        *self.displays.borrow_mut() = displays.clone();
        info!(count = displays.len(), "display configuration changed");
        self.bus.emit(Event::DisplayChanged {
            displays: displays.clone(),
        });
        Ok(displays)
    }
}
