//! Configured display validation.

use crate::schema::PinpointConfig;

use super::helpers::validate_range_f64;

pub(crate) fn validate_displays(errors: &mut Vec<String>, config: &PinpointConfig) {
    for (i, d) in config.displays.iter().enumerate() {
        if d.width <= 0 || d.height <= 0 {
            errors.push(format!(
                "displays[{i}] size {}x{} must be positive",
                d.width, d.height
            ));
        }
        validate_range_f64(errors, &format!("displays[{i}].scale"), d.scale, 0.5, 4.0);
    }
    let primaries = config.displays.iter().filter(|d| d.primary).count();
    if primaries > 1 {
        errors.push(format!("{primaries} displays are marked primary; at most one allowed"));
    }
}
