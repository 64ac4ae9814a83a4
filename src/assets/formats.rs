use std::path::Path;

use crate::config::UncropConfig;

/// Input containers the pipeline knows how to read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputFormat {
    Jpeg,
    Png,
    /// HEIF/HEIC, decoded through an external converter when one is installed.
    Heif,
}

impl InputFormat {
    /// Case-insensitive extension lookup. Unknown extensions map to `None`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "heic" | "heif" => Some(Self::Heif),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Baseline formats are always decodable through the `image` crate.
    pub fn is_baseline(self) -> bool {
        !matches!(self, Self::Heif)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Heif => "heif",
        }
    }
}

/// Decoder capabilities, resolved once at startup and injected into the filter step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormatSupport {
    heif_decoder: Option<String>,
}

impl FormatSupport {
    /// Baseline formats only.
    pub fn baseline() -> Self {
        Self { heif_decoder: None }
    }

    /// Assume `program` is a working HEIF converter without probing for it.
    pub fn with_heif_decoder(program: impl Into<String>) -> Self {
        Self {
            heif_decoder: Some(program.into()),
        }
    }

    /// Probe for the configured HEIF converter.
    pub fn detect(cfg: &UncropConfig) -> Self {
        if is_program_on_path(&cfg.heif_decoder) {
            tracing::debug!(program = %cfg.heif_decoder, "heif decoder available");
            Self::with_heif_decoder(cfg.heif_decoder.clone())
        } else {
            tracing::debug!(program = %cfg.heif_decoder, "heif decoder not found");
            Self::baseline()
        }
    }

    pub fn heif_decoder(&self) -> Option<&str> {
        self.heif_decoder.as_deref()
    }

    pub fn supports(&self, format: InputFormat) -> bool {
        format.is_baseline() || self.heif_decoder.is_some()
    }
}

/// True when `program` can be spawned. The exit status is ignored because converters
/// disagree on what `--version` returns.
pub fn is_program_on_path(program: &str) -> bool {
    std::process::Command::new(program)
        .arg("--version")
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok()
}
