use crate::foundation::error::{UncropError, UncropResult};

/// Pixel dimensions of a buffer or canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> UncropResult<Self> {
        if width == 0 || height == 0 {
            return Err(UncropError::config("size width/height must be >= 1"));
        }
        Ok(Self { width, height })
    }

    pub fn transposed(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

/// Landscape when strictly wider than tall; everything else (squares included) is Portrait.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationClass {
    Landscape,
    Portrait,
}

impl OrientationClass {
    pub fn classify(width: u32, height: u32) -> Self {
        if width > height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }
}

/// The pair of target canvases, one per orientation class.
///
/// Built from the portrait size; the landscape canvas is always its transpose.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CanvasSpec {
    portrait: Size,
}

impl CanvasSpec {
    pub fn from_portrait(portrait: Size) -> Self {
        Self { portrait }
    }

    pub fn from_landscape(landscape: Size) -> Self {
        Self {
            portrait: landscape.transposed(),
        }
    }

    pub fn portrait(&self) -> Size {
        self.portrait
    }

    pub fn landscape(&self) -> Size {
        self.portrait.transposed()
    }

    pub fn for_class(&self, class: OrientationClass) -> Size {
        match class {
            OrientationClass::Landscape => self.landscape(),
            OrientationClass::Portrait => self.portrait(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_ties_to_portrait() {
        assert_eq!(OrientationClass::classify(3000, 3000), OrientationClass::Portrait);
        assert_eq!(OrientationClass::classify(3001, 3000), OrientationClass::Landscape);
        assert_eq!(OrientationClass::classify(1, 2), OrientationClass::Portrait);
    }

    #[test]
    fn canvas_spec_is_transposed_pair() {
        let spec = CanvasSpec::from_landscape(Size::new(4096, 3277).unwrap());
        assert_eq!(spec.landscape(), Size { width: 4096, height: 3277 });
        assert_eq!(spec.portrait(), Size { width: 3277, height: 4096 });
        assert_eq!(spec.landscape().width, spec.portrait().height);
        assert_eq!(spec.landscape().height, spec.portrait().width);
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(Size::new(0, 10).is_err());
        assert!(Size::new(10, 0).is_err());
    }
}
