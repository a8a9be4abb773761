//! Layout create, update, display targeting and delete.

use pinpoint_common::model::merge_patch;
use pinpoint_common::{ConfigMap, DisplayInfo, Event, Layout, LayoutId, Source, SyncError};
use tracing::{debug, info};

use super::{check_id, TileSynchronizer};
use crate::cache::{DebounceKey, RecordKey, TileCache};

/// Editable layout fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutPatch {
    pub name: Option<String>,
    /// Shallow-merged into the layout's settings; `null` removes a key.
    pub settings: Option<ConfigMap>,
}

impl LayoutPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            settings: None,
        }
    }
}

impl TileSynchronizer {
    /// Create an empty layout. A blank or missing name becomes "Layout N".
    pub fn create_layout(
        &self,
        name: Option<&str>,
        target_display: usize,
        source: Source,
    ) -> Result<Layout, SyncError> {
        self.create_layout_with_id(LayoutId::generate(), name, target_display, source)
    }

    pub fn create_layout_with_id(
        &self,
        id: LayoutId,
        name: Option<&str>,
        target_display: usize,
        source: Source,
    ) -> Result<Layout, SyncError> {
        check_id("id", id.as_str())?;

        let layout = {
            let mut cache = self.cache.borrow_mut();
            if cache.contains_layout(&id) {
                return Err(SyncError::validation(
                    "id",
                    format!("layout {id} already exists"),
                ));
            }
            let name = match name.map(str::trim) {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => next_layout_name(&cache),
            };
            let layout = Layout::new(id, name, target_display);
            cache.insert_layout(layout.clone());
            layout
        };
        info!(layout = %layout.id, name = %layout.name, %source, "layout created");

        self.emit(Event::LayoutCreated {
            layout: layout.clone(),
            source,
        });
        self.commit([RecordKey::Layout(layout.id.clone())]);
        Ok(layout)
    }

    /// Rename a layout or merge its settings. Debounced like tile edits.
    pub fn update_layout(
        &self,
        id: &LayoutId,
        patch: LayoutPatch,
        source: Source,
    ) -> Result<Layout, SyncError> {
        if id.is_blank() {
            return Err(SyncError::validation("id", "must not be blank"));
        }
        let name = match patch.name.as_deref().map(str::trim) {
            Some("") => return Err(SyncError::validation("name", "must not be blank")),
            other => other.map(str::to_string),
        };

        let (changed, layout) = {
            let mut cache = self.cache.borrow_mut();
            let (changed, layout) = cache
                .update_layout_with(id, |layout| {
                    let mut changed = false;
                    if let Some(name) = name {
                        if layout.name != name {
                            layout.name = name;
                            changed = true;
                        }
                    }
                    if let Some(settings) = &patch.settings {
                        changed |= merge_patch(&mut layout.settings, settings);
                    }
                    (changed, (changed, layout.clone()))
                })
                .ok_or_else(|| SyncError::LayoutNotFound(id.clone()))?;
            if changed {
                cache.schedule(DebounceKey::Layout(id.clone()));
            }
            (changed, layout)
        };

        if changed {
            debug!(layout = %id, %source, "layout updated");
            self.emit(Event::LayoutUpdated {
                layout_id: id.clone(),
                layout: layout.clone(),
                source,
            });
        }
        Ok(layout)
    }

    /// Record which display a layout targets, with an informational
    /// snapshot of that display. Written at once.
    pub fn set_layout_display(
        &self,
        id: &LayoutId,
        target_display: usize,
        snapshot: Option<DisplayInfo>,
        source: Source,
    ) -> Result<Layout, SyncError> {
        let (changed, layout) = self
            .cache
            .borrow_mut()
            .update_layout_with(id, |layout| {
                let settings = &mut layout.display_settings;
                let changed =
                    settings.target_display != target_display || settings.display_info != snapshot;
                settings.target_display = target_display;
                settings.display_info = snapshot;
                (changed, (changed, layout.clone()))
            })
            .ok_or_else(|| SyncError::LayoutNotFound(id.clone()))?;

        if changed {
            info!(layout = %id, target_display, %source, "layout display set");
            self.emit(Event::LayoutUpdated {
                layout_id: id.clone(),
                layout: layout.clone(),
                source,
            });
            self.commit([RecordKey::Layout(id.clone())]);
        }
        Ok(layout)
    }

    /// Delete a layout.
    ///
    /// `layout:deleting` is emitted first, while the layout still exists, so
    /// anything projecting it can tear down before the record goes away.
    pub fn delete_layout(&self, id: &LayoutId, source: Source) -> Result<Layout, SyncError> {
        if id.is_blank() {
            return Err(SyncError::validation("id", "must not be blank"));
        }
        if !self.cache.borrow().contains_layout(id) {
            return Err(SyncError::LayoutNotFound(id.clone()));
        }

        self.emit(Event::LayoutDeleting {
            layout_id: id.clone(),
        });

        let layout = self
            .cache
            .borrow_mut()
            .remove_layout(id)
            .ok_or_else(|| SyncError::LayoutNotFound(id.clone()))?;
        info!(layout = %id, instances = layout.tile_instances.len(), %source, "layout deleted");

        self.emit(Event::LayoutDeleted {
            layout_id: id.clone(),
            source,
        });
        self.commit([RecordKey::Layout(id.clone())]);
        Ok(layout)
    }
}

fn next_layout_name(cache: &TileCache) -> String {
    let mut n = cache.layout_count() + 1;
    loop {
        let name = format!("Layout {n}");
        if !cache.layouts().any(|l| l.name == name) {
            return name;
        }
        n += 1;
    }
}
