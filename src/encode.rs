use std::{io::Write as _, path::Path};

use image::{ImageEncoder as _, codecs::jpeg::JpegEncoder};

use crate::{
    UncropError, UncropResult,
    compose::CompositedCanvas,
    scratch::{TempFileGuard, sibling_scratch_path},
};

/// Serialize the canvas as baseline JPEG. Nothing but pixel data is written.
pub fn encode_jpeg(canvas: &CompositedCanvas, quality: u8) -> UncropResult<Vec<u8>> {
    if !(1..=100).contains(&quality) {
        return Err(UncropError::encode("jpeg quality must be in 1..=100"));
    }
    let mut buf = Vec::with_capacity(canvas.image.as_raw().len() / 8);
    JpegEncoder::new_with_quality(&mut buf, quality)
        .write_image(
            canvas.image.as_raw(),
            canvas.width(),
            canvas.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| UncropError::encode(e.to_string()))?;
    Ok(buf)
}

/// Write `bytes` to `path` through a scratch file in the same directory, renamed into
/// place only after a successful flush. A failed write leaves no file at `path` (and
/// does not touch an existing one).
pub fn write_atomic(bytes: &[u8], path: &Path) -> UncropResult<()> {
    let mut guard = TempFileGuard::new(sibling_scratch_path(path));
    let Some(tmp) = guard.path().map(Path::to_path_buf) else {
        return Err(UncropError::write("scratch path missing"));
    };

    let mut f = std::fs::File::create(&tmp)
        .map_err(|e| UncropError::write(format!("create '{}': {e}", tmp.display())))?;
    f.write_all(bytes)
        .and_then(|_| f.sync_all())
        .map_err(|e| UncropError::write(format!("write '{}': {e}", tmp.display())))?;
    drop(f);

    std::fs::rename(&tmp, path).map_err(|e| {
        UncropError::write(format!(
            "rename '{}' -> '{}': {e}",
            tmp.display(),
            path.display()
        ))
    })?;
    guard.disarm();
    Ok(())
}
