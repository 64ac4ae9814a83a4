//! uncrop places photographs, uncropped, on a fixed-aspect social canvas and fills the
//! leftover bands with a blurred, full-bleed copy of the same photo.
//!
//! # Pipeline
//!
//! 1. **Decode** ([`decode_path`]): baseline formats through `image`, HEIF through an
//!    external converter when one was detected at startup ([`FormatSupport`]).
//! 2. **Normalize** ([`normalize`]): apply EXIF orientation, flatten to opaque RGB8,
//!    drop all metadata.
//! 3. **Compose** ([`compose`]): pick the landscape or portrait canvas, scale the
//!    foreground to fit, stretch and blur a background, paste (clipping any overflow).
//! 4. **Encode + write** ([`encode_jpeg`], [`write_atomic`]).
//!
//! [`run`] fans this out over a directory on a bounded rayon pool. Per-item failures
//! (and panics) are recorded in the [`RunReport`] and never abort the batch.
#![forbid(unsafe_code)]

mod assets;
mod batch;
mod compose;
mod config;
mod encode;
mod foundation;
mod layout;
mod normalize;
mod scratch;

pub use assets::RawImage;
pub use assets::decode::{decode_image, decode_path};
pub use assets::formats::{FormatSupport, InputFormat, is_program_on_path};
pub use batch::discover::{Filtered, discover, filter_supported, find_collisions, output_path_for};
pub use batch::report::{
    FailureStage, ItemFailure, ItemOutcome, ItemSuccess, RunReport, SkipReason, SkippedFile,
};
pub use batch::runner::{BatchJob, process_file, run, run_batch, run_with_observer};
pub use compose::{CompositedCanvas, RESAMPLE_FILTER, blur_background, compose};
pub use config::{CollisionPolicy, ComposeConfig, OUTPUT_EXTENSION, UncropConfig};
pub use encode::{encode_jpeg, write_atomic};
pub use foundation::core::{CanvasSpec, OrientationClass, Size};
pub use foundation::error::{UncropError, UncropResult};
pub use layout::{Placement, plan_placement};
pub use normalize::{SourceImage, normalize};
