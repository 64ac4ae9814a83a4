use image::RgbImage;

use crate::{UncropError, UncropResult, assets::RawImage, foundation::core::OrientationClass};

/// An upright, opaque RGB8 image with no metadata attached. Width and height are >= 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceImage {
    pixels: RgbImage,
}

impl SourceImage {
    pub fn from_rgb(pixels: RgbImage) -> UncropResult<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(UncropError::decode("image has zero width or height"));
        }
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn class(&self) -> OrientationClass {
        OrientationClass::classify(self.width(), self.height())
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}

/// Rotate/mirror `raw` upright and flatten it to opaque RGB8.
///
/// Orientation that was missing or unreadable at decode time leaves the pixels as they are.
/// Alpha is dropped, not composited. The result is a freshly allocated buffer holding visible
/// pixel data only, so nothing the decoder knew about the file (EXIF, ICC, XMP) survives.
pub fn normalize(raw: RawImage) -> UncropResult<SourceImage> {
    let RawImage {
        mut image,
        orientation,
    } = raw;
    if let Some(orientation) = orientation {
        image.apply_orientation(orientation);
    }
    SourceImage::from_rgb(image.to_rgb8())
}
