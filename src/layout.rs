use crate::foundation::core::{CanvasSpec, OrientationClass, Size};

/// Where and how large the foreground lands on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Placement {
    pub class: OrientationClass,
    /// Canvas size selected for `class`.
    pub canvas: Size,
    pub scale: f64,
    pub new_width: u32,
    pub new_height: u32,
    /// Negative when the foreground overflows the canvas; the paste is clipped.
    pub x_offset: i64,
    pub y_offset: i64,
}

impl Placement {
    /// Columns/rows of the foreground hidden past each canvas edge, `(left, top)`.
    pub fn overflow(&self) -> (u32, u32) {
        (
            u32::try_from(-self.x_offset.min(0)).unwrap_or(0),
            u32::try_from(-self.y_offset.min(0)).unwrap_or(0),
        )
    }
}

/// Compute the placement of a `width` x `height` source on its orientation's canvas.
///
/// Landscape fits the width, Portrait fits the height. The free dimension is
/// `floor(dim * target / fitted_dim)` in exact integer arithmetic, clamped to at least 1.
/// The centering offset on the free axis truncates toward zero.
pub fn plan_placement(width: u32, height: u32, spec: &CanvasSpec) -> Placement {
    let class = OrientationClass::classify(width, height);
    let canvas = spec.for_class(class);

    let (scale, new_width, new_height) = match class {
        OrientationClass::Landscape => (
            f64::from(canvas.width) / f64::from(width),
            canvas.width,
            scaled_floor(height, canvas.width, width),
        ),
        OrientationClass::Portrait => (
            f64::from(canvas.height) / f64::from(height),
            scaled_floor(width, canvas.height, height),
            canvas.height,
        ),
    };

    let (x_offset, y_offset) = match class {
        OrientationClass::Landscape => (0, centered(canvas.height, new_height)),
        OrientationClass::Portrait => (centered(canvas.width, new_width), 0),
    };

    Placement {
        class,
        canvas,
        scale,
        new_width,
        new_height,
        x_offset,
        y_offset,
    }
}

fn scaled_floor(dim: u32, target: u32, fitted: u32) -> u32 {
    let v = u64::from(dim) * u64::from(target) / u64::from(fitted.max(1));
    u32::try_from(v).unwrap_or(u32::MAX).max(1)
}

fn centered(canvas: u32, content: u32) -> i64 {
    (i64::from(canvas) - i64::from(content)) / 2
}
