use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context as _;

use crate::foundation::{
    core::{CanvasSpec, Size},
    error::{UncropError, UncropResult},
};

/// Extension of every written file, independent of the input's extension.
pub const OUTPUT_EXTENSION: &str = "jpg";

/// What to do when two inputs derive the same output file name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Process every input; the last writer silently wins.
    Overwrite,
    /// Like `Overwrite`, but log a warning per colliding name before dispatch.
    #[default]
    Warn,
    /// Keep the first input per name; record the rest as failed without processing them.
    Fail,
}

/// Process-wide configuration, built once at startup and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UncropConfig {
    /// Portrait canvas width; the landscape canvas is the transpose.
    pub portrait_width: u32,
    /// Portrait canvas height.
    pub portrait_height: u32,
    /// Gaussian sigma applied to the background fill. `0` disables blurring.
    pub blur_radius: f32,
    /// JPEG quality, 1..=100.
    pub jpeg_quality: u8,
    /// Appended to the input's file stem to form the output name.
    pub output_suffix: String,
    /// Worker threads; `None` uses the host's available parallelism.
    pub workers: Option<usize>,
    pub collisions: CollisionPolicy,
    /// External program used to decode HEIF/HEIC inputs.
    pub heif_decoder: String,
}

impl Default for UncropConfig {
    fn default() -> Self {
        Self {
            portrait_width: 1080,
            portrait_height: 1350,
            blur_radius: 100.0,
            jpeg_quality: 75,
            output_suffix: "_uncropped".to_string(),
            workers: None,
            collisions: CollisionPolicy::default(),
            heif_decoder: "heif-convert".to_string(),
        }
    }
}

impl UncropConfig {
    /// Load a JSON config file. Missing fields fall back to [`UncropConfig::default`].
    pub fn from_path(path: &Path) -> UncropResult<Self> {
        let f = File::open(path)
            .with_context(|| format!("open config '{}'", path.display()))
            .map_err(|e| UncropError::config(format!("{e:#}")))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            UncropError::config(format!("parse config '{}': {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> UncropResult<()> {
        Size::new(self.portrait_width, self.portrait_height)?;
        if !self.blur_radius.is_finite() || self.blur_radius < 0.0 {
            return Err(UncropError::config("blur_radius must be finite and >= 0"));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(UncropError::config("jpeg_quality must be in 1..=100"));
        }
        if self.output_suffix.contains(['/', '\\']) {
            return Err(UncropError::config(
                "output_suffix must not contain path separators",
            ));
        }
        if self.workers == Some(0) {
            return Err(UncropError::config("workers must be >= 1 when set"));
        }
        if self.heif_decoder.trim().is_empty() {
            return Err(UncropError::config("heif_decoder must not be empty"));
        }
        Ok(())
    }

    pub fn canvas_spec(&self) -> UncropResult<CanvasSpec> {
        Ok(CanvasSpec::from_portrait(Size::new(
            self.portrait_width,
            self.portrait_height,
        )?))
    }

    pub fn compose_config(&self) -> UncropResult<ComposeConfig> {
        self.validate()?;
        Ok(ComposeConfig {
            canvas: self.canvas_spec()?,
            blur_radius: self.blur_radius,
        })
    }
}

/// The subset of configuration the composer needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComposeConfig {
    pub canvas: CanvasSpec,
    pub blur_radius: f32,
}
