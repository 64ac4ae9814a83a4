use image::{RgbImage, imageops::FilterType};

use crate::{
    UncropResult,
    config::ComposeConfig,
    layout::{Placement, plan_placement},
    normalize::SourceImage,
};

/// Resampling filter for both the foreground and the background stretch.
pub const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

/// A finished canvas and the placement used to build it.
#[derive(Clone, Debug)]
pub struct CompositedCanvas {
    pub image: RgbImage,
    pub placement: Placement,
}

impl CompositedCanvas {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Compose `source` onto the canvas for its orientation class.
///
/// The background is the source stretched to the full canvas and blurred by
/// `cfg.blur_radius`; the aspect-preserving foreground is pasted over it, centered on the
/// free axis and clipped when it overflows. Output is always exactly the canvas size and
/// depends only on `source` and `cfg`.
#[tracing::instrument(skip_all, fields(width = source.width(), height = source.height()))]
pub fn compose(source: &SourceImage, cfg: &ComposeConfig) -> UncropResult<CompositedCanvas> {
    let placement = plan_placement(source.width(), source.height(), &cfg.canvas);
    tracing::debug!(?placement, "planned placement");

    let pixels = source.pixels();
    let foreground = image::imageops::resize(
        pixels,
        placement.new_width,
        placement.new_height,
        RESAMPLE_FILTER,
    );
    let stretched = image::imageops::resize(
        pixels,
        placement.canvas.width,
        placement.canvas.height,
        RESAMPLE_FILTER,
    );
    let mut canvas = blur_background(stretched, cfg.blur_radius);

    // Destructive overwrite; whatever falls outside the canvas is dropped.
    image::imageops::replace(
        &mut canvas,
        &foreground,
        placement.x_offset,
        placement.y_offset,
    );

    Ok(CompositedCanvas {
        image: canvas,
        placement,
    })
}

/// Approximate Gaussian blur with sigma `blur_radius`. `0` returns the input untouched.
///
/// Sigma is capped at the larger image dimension, which bounds the box windows however
/// large the configured radius is.
pub fn blur_background(img: RgbImage, blur_radius: f32) -> RgbImage {
    if blur_radius.is_nan() || blur_radius <= 0.0 {
        return img;
    }
    let max_dim = img.width().max(img.height()) as f32;
    image::imageops::fast_blur(&img, blur_radius.min(max_dim))
}
