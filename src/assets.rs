pub mod decode;
pub mod formats;

use image::{DynamicImage, metadata::Orientation};

/// A decoded image as handed over by the decode step, before normalization.
#[derive(Clone, Debug)]
pub struct RawImage {
    pub image: DynamicImage,
    /// Orientation surfaced by the decoder, if any could be read.
    pub orientation: Option<Orientation>,
}

impl RawImage {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image,
            orientation: None,
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }
}
