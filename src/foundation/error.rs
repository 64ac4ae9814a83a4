/// Convenience result type used across uncrop.
pub type UncropResult<T> = Result<T, UncropError>;

/// Top-level error taxonomy.
///
/// Only [`UncropError::Config`] is fatal to a batch run; every other variant is caught at
/// the item boundary and recorded in the [`RunReport`](crate::RunReport).
#[derive(thiserror::Error, Debug)]
pub enum UncropError {
    /// Invalid run configuration (missing input directory, zero-sized canvas, ...).
    #[error("config error: {0}")]
    Config(String),

    /// Input bytes could not be interpreted as a raster image.
    #[error("decode error: {0}")]
    Decode(String),

    /// Extension is not in the currently supported format set.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Composited canvas could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),

    /// Encoded bytes could not be persisted.
    #[error("write error: {0}")]
    Write(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl UncropError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }
}
