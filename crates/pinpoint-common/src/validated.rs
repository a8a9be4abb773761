//! Results that succeeded after local correction of the input.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Size, SizeBounds};

/// A non-fatal validation finding: the requested value was replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub field: String,
    pub requested: i64,
    pub applied: i64,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {} clamped to {}",
            self.field, self.requested, self.applied
        )
    }
}

/// A successful result plus any clamps applied on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T> {
    pub value: T,
    pub warnings: Vec<ValidationWarning>,
}

impl<T> Validated<T> {
    pub fn with_warnings(value: T, warnings: Vec<ValidationWarning>) -> Self {
        Self { value, warnings }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Validated<U> {
        Validated {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Clamp `size` into `bounds`, recording a warning per adjusted dimension.
pub fn clamp_size(size: Size, bounds: &SizeBounds) -> (Size, Vec<ValidationWarning>) {
    let clamped = bounds.clamp(size);
    let mut warnings = Vec::new();
    if clamped.width != size.width {
        warnings.push(ValidationWarning {
            field: "width".into(),
            requested: size.width.into(),
            applied: clamped.width.into(),
        });
    }
    if clamped.height != size.height {
        warnings.push(ValidationWarning {
            field: "height".into(),
            requested: size.height.into(),
            applied: clamped.height.into(),
        });
    }
    (clamped, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_within_bounds_has_no_warnings() {
        let (size, warnings) = clamp_size(Size::new(250, 150), &SizeBounds::default());
        assert_eq!(size, Size::new(250, 150));
        assert!(warnings.is_empty());
    }

    #[test]
    fn clamp_reports_each_dimension() {
        let (size, warnings) = clamp_size(Size::new(5, 9000), &SizeBounds::default());
        assert_eq!(size, Size::new(100, 800));
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].field, "width");
        assert_eq!(warnings[0].requested, 5);
        assert_eq!(warnings[0].applied, 100);
        assert_eq!(warnings[1].to_string(), "height = 9000 clamped to 800");
    }

    #[test]
    fn validated_map_keeps_warnings() {
        let (_, warnings) = clamp_size(Size::new(1, 100), &SizeBounds::default());
        let v = Validated::with_warnings(2, warnings).map(|n| n * 2);
        assert_eq!(v.value, 4);
        assert!(!v.is_clean());
    }
}
