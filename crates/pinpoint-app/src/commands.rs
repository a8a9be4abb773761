//! One-shot subcommands. Each opens the engine, does its work and flushes.

use std::rc::Rc;

use pinpoint_common::{
    ConfigMap, LayoutId, PinpointError, Point, Source, TileId,
};
use pinpoint_config::PinpointConfig;
use pinpoint_engine::Engine;
use serde_json::Value;

use crate::renderer::LogRenderer;

fn open(config: &PinpointConfig) -> Result<Engine, PinpointError> {
    Engine::open(config, Rc::new(LogRenderer::new()))
}

/// Flush before reporting, so a command never exits with writes pending.
fn finish(engine: &Engine) -> Result<(), PinpointError> {
    let summary = engine.shutdown();
    if summary.failed > 0 {
        return Err(PinpointError::Other(format!(
            "{} record(s) could not be written",
            summary.failed
        )));
    }
    Ok(())
}

pub fn list_tiles(config: &PinpointConfig) -> Result<(), PinpointError> {
    let engine = open(config)?;
    let tiles = engine.sync().tiles();
    if tiles.is_empty() {
        println!("No tiles.");
    }
    for tile in tiles {
        let content = tile.content().unwrap_or("");
        println!(
            "{:<38} {:<8} {}",
            tile.id.as_str(),
            tile.tile_type,
            preview(content, 40)
        );
    }
    Ok(())
}

pub fn list_layouts(config: &PinpointConfig) -> Result<(), PinpointError> {
    let engine = open(config)?;
    let layouts = engine.sync().layouts();
    if layouts.is_empty() {
        println!("No layouts.");
    }
    for layout in layouts {
        println!(
            "{} \"{}\" display {} ({} tile(s))",
            layout.id,
            layout.name,
            layout.display_settings.target_display,
            layout.tile_instances.len()
        );
        for instance in &layout.tile_instances {
            println!(
                "    {} -> {} at {} size {}",
                instance.instance_id, instance.tile_id, instance.position, instance.size
            );
        }
    }
    Ok(())
}

pub fn list_displays(config: &PinpointConfig) -> Result<(), PinpointError> {
    let engine = open(config)?;
    for display in engine.displays().list_displays() {
        println!(
            "{}: {} {} at {} scale {}{}",
            display.index,
            display.name,
            display.geometry.size(),
            display.origin(),
            display.scale,
            if display.is_primary { " (primary)" } else { "" }
        );
    }
    Ok(())
}

pub fn new_tile(
    config: &PinpointConfig,
    tile_type: &str,
    content: Option<String>,
    id: Option<String>,
) -> Result<(), PinpointError> {
    let engine = open(config)?;
    let mut fields = ConfigMap::new();
    if let Some(content) = content {
        fields.insert("content".into(), Value::from(content));
    }
    let created = match id {
        Some(id) => engine
            .sync()
            .create_tile_with_id(TileId::from(id), tile_type, fields, Source::Editor)?,
        None => engine.sync().create_tile(tile_type, fields, Source::Editor)?,
    };
    for warning in &created.warnings {
        eprintln!("warning: {warning}");
    }
    println!("{}", created.value.id);
    finish(&engine)
}

pub fn new_layout(
    config: &PinpointConfig,
    name: Option<&str>,
    display: usize,
) -> Result<(), PinpointError> {
    let engine = open(config)?;
    let layout = engine
        .sync()
        .create_layout(name, display, Source::Editor)?;
    println!("{} \"{}\"", layout.id, layout.name);
    finish(&engine)
}

pub fn place(
    config: &PinpointConfig,
    layout: &str,
    tile: &str,
    position: Point,
) -> Result<(), PinpointError> {
    let engine = open(config)?;
    let placed = engine.sync().add_instance(
        &LayoutId::from(layout),
        &TileId::from(tile),
        position,
        None,
        Source::Editor,
    )?;
    for warning in &placed.warnings {
        eprintln!("warning: {warning}");
    }
    println!("{}", placed.value.instance_id);
    finish(&engine)
}

pub fn delete_tile(config: &PinpointConfig, id: &str) -> Result<(), PinpointError> {
    let engine = open(config)?;
    engine
        .sync()
        .delete_tile(&TileId::from(id), Source::Editor)?;
    finish(&engine)
}

pub fn delete_layout(config: &PinpointConfig, id: &str) -> Result<(), PinpointError> {
    let engine = open(config)?;
    engine
        .sync()
        .delete_layout(&LayoutId::from(id), Source::Editor)?;
    finish(&engine)
}

fn preview(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() > max {
        let cut: String = line.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}
