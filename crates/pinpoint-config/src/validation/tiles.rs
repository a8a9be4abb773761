//! Tile size bounds validation.

use crate::schema::PinpointConfig;

use super::helpers::validate_range;

pub(crate) fn validate_tiles(errors: &mut Vec<String>, config: &PinpointConfig) {
    let tiles = &config.tiles;
    if tiles.min_width < 1 || tiles.min_height < 1 {
        errors.push("tiles.min_width and tiles.min_height must be positive".into());
    }
    if tiles.min_width > tiles.max_width {
        errors.push(format!(
            "tiles.min_width = {} exceeds tiles.max_width = {}",
            tiles.min_width, tiles.max_width
        ));
    }
    if tiles.min_height > tiles.max_height {
        errors.push(format!(
            "tiles.min_height = {} exceeds tiles.max_height = {}",
            tiles.min_height, tiles.max_height
        ));
    }
    validate_range(
        errors,
        "tiles.default_width",
        tiles.default_width,
        tiles.min_width,
        tiles.max_width,
    );
    validate_range(
        errors,
        "tiles.default_height",
        tiles.default_height,
        tiles.min_height,
        tiles.max_height,
    );
}
