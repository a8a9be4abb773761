//! Responding to display topology changes.

use pinpoint_common::{DisplayError, Event, LayoutId};
use tracing::{info, warn};

use super::ProjectionController;

/// What happened to one projected layout after the displays changed.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayOutcome {
    Unchanged {
        layout_id: LayoutId,
        display_index: usize,
    },
    Reprojected {
        layout_id: LayoutId,
        from: usize,
        to: usize,
    },
    Unprojected {
        layout_id: LayoutId,
        error: DisplayError,
    },
}

impl ProjectionController {
    /// Re-check every projected layout against the current display list.
    ///
    /// A layout whose display is gone, or whose display moved or changed
    /// scale, is re-projected through the fallback policy. So is a layout
    /// sitting on a fallback once its own target is back. When no display
    /// is left it is unprojected and `error:display` is emitted.
    pub fn reconcile_displays(&self) -> Vec<DisplayOutcome> {
        let projected = self.projected_layouts();
        let mut outcomes = Vec::with_capacity(projected.len());

        for projection in projected {
            let layout_id = projection.layout_id.clone();
            let was = projection.display;
            let requested = self
                .sync
                .layout(&layout_id)
                .map(|l| l.display_settings.target_display)
                .unwrap_or(projection.requested);
            let resolved = self.displays.resolve(requested);
            if resolved.as_ref().is_ok_and(|d| {
                d.index == was.index && d.geometry == was.geometry && d.scale == was.scale
            }) {
                outcomes.push(DisplayOutcome::Unchanged {
                    layout_id,
                    display_index: was.index,
                });
                continue;
            }

            let outcome = match resolved {
                Ok(_) => match self.project(&layout_id, None) {
                    Ok(report) => {
                        info!(layout = %layout_id, from = was.index, to = report.display.index, "layout re-projected");
                        DisplayOutcome::Reprojected {
                            layout_id,
                            from: was.index,
                            to: report.display.index,
                        }
                    }
                    Err(e) => {
                        let error = DisplayError::Platform(e.to_string());
                        self.lose(&layout_id, error)
                    }
                },
                Err(error) => self.lose(&layout_id, error),
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    fn lose(&self, layout_id: &LayoutId, error: DisplayError) -> DisplayOutcome {
        warn!(layout = %layout_id, "display lost: {error}");
        self.unproject(layout_id);
        self.bus().emit(Event::DisplayFailed {
            layout_id: Some(layout_id.clone()),
            error: error.clone(),
        });
        DisplayOutcome::Unprojected {
            layout_id: layout_id.clone(),
            error,
        }
    }
}
