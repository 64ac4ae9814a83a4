use std::{io::Cursor, path::Path};

use image::{DynamicImage, ImageDecoder as _};

use crate::{
    UncropError, UncropResult,
    assets::{
        RawImage,
        formats::{FormatSupport, InputFormat},
    },
    scratch::{TempFileGuard, scratch_name},
};

/// Read and decode `path`, surfacing its orientation metadata when present.
pub fn decode_path(path: &Path, support: &FormatSupport) -> UncropResult<RawImage> {
    let format = InputFormat::from_path(path).ok_or_else(|| {
        UncropError::unsupported_format(format!("'{}' has no known image extension", path.display()))
    })?;
    if !support.supports(format) {
        return Err(UncropError::unsupported_format(format!(
            "'{}': {} decoding is not available",
            path.display(),
            format.name()
        )));
    }

    match (format, support.heif_decoder()) {
        (InputFormat::Heif, Some(program)) => decode_heif_external(path, program),
        _ => {
            let bytes = std::fs::read(path).map_err(|e| {
                UncropError::decode(format!("read '{}': {e}", path.display()))
            })?;
            decode_image(&bytes)
                .map_err(|e| UncropError::decode(format!("'{}': {e}", path.display())))
        }
    }
}

/// Decode encoded image bytes. The container is sniffed from the content, not an extension.
pub fn decode_image(bytes: &[u8]) -> UncropResult<RawImage> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| UncropError::decode(format!("sniff format: {e}")))?;
    let mut decoder = reader
        .into_decoder()
        .map_err(|e| UncropError::decode(e.to_string()))?;
    // Unreadable orientation metadata is treated as absent.
    let orientation = decoder.orientation().ok();
    let image = DynamicImage::from_decoder(decoder).map_err(|e| UncropError::decode(e.to_string()))?;

    Ok(RawImage { image, orientation })
}

fn decode_heif_external(path: &Path, program: &str) -> UncropResult<RawImage> {
    let tmp = std::env::temp_dir().join(scratch_name("heif", "png"));
    let guard = TempFileGuard::new(tmp);
    let Some(tmp) = guard.path() else {
        return Err(UncropError::decode("heif scratch path missing"));
    };

    let out = std::process::Command::new(program)
        .arg(path)
        .arg(tmp)
        .stdin(std::process::Stdio::null())
        .output()
        .map_err(|e| UncropError::decode(format!("failed to run {program}: {e}")))?;
    if !out.status.success() {
        return Err(UncropError::decode(format!(
            "{program} failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let bytes = std::fs::read(tmp)
        .map_err(|e| UncropError::decode(format!("read {program} output: {e}")))?;
    let mut raw = decode_image(&bytes)?;
    // The converter applies the container's rotation/mirroring itself.
    raw.orientation = None;
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use image::{RgbaImage, metadata::Orientation};

    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 128]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decode_png_dimensions_without_orientation_transform() {
        let raw = decode_image(&png_bytes(3, 2)).unwrap();
        assert_eq!((raw.image.width(), raw.image.height()), (3, 2));
        assert!(matches!(
            raw.orientation,
            None | Some(Orientation::NoTransforms)
        ));
    }

    /// Baseline JPEG with an EXIF APP1 segment carrying only an Orientation tag.
    fn jpeg_with_orientation(width: u32, height: u32, orientation: u8) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([90, 140, 200]));
        let mut plain = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut plain), image::ImageFormat::Jpeg)
            .unwrap();

        let mut tiff = b"MM\x00\x2a\x00\x00\x00\x08".to_vec();
        tiff.extend_from_slice(&[0x00, 0x01]);
        tiff.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        tiff.extend_from_slice(&[0x00, orientation, 0x00, 0x00]);
        tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        let mut payload = b"Exif\x00\x00".to_vec();
        payload.extend_from_slice(&tiff);
        let len = u16::try_from(payload.len() + 2).unwrap();

        let mut out = plain[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&plain[2..]);
        out
    }

    #[test]
    fn decode_jpeg_surfaces_exif_orientation() {
        let raw = decode_image(&jpeg_with_orientation(40, 20, 6)).unwrap();
        assert_eq!((raw.image.width(), raw.image.height()), (40, 20));
        assert_eq!(raw.orientation, Some(Orientation::Rotate90));

        let raw = decode_image(&jpeg_with_orientation(8, 8, 3)).unwrap();
        assert_eq!(raw.orientation, Some(Orientation::Rotate180));
    }

    #[test]
    fn empty_and_garbage_bytes_are_decode_errors() {
        assert!(matches!(decode_image(&[]), Err(UncropError::Decode(_))));
        assert!(matches!(
            decode_image(b"definitely not an image"),
            Err(UncropError::Decode(_))
        ));
    }

    #[test]
    fn decode_path_sniffs_content_not_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actually_png.jpg");
        std::fs::write(&path, png_bytes(4, 5)).unwrap();

        let raw = decode_path(&path, &FormatSupport::baseline()).unwrap();
        assert_eq!((raw.image.width(), raw.image.height()), (4, 5));
    }

    #[test]
    fn decode_path_rejects_gated_and_unknown_formats() {
        let dir = tempfile::tempdir().unwrap();
        let heic = dir.path().join("a.heic");
        let txt = dir.path().join("a.txt");
        std::fs::write(&heic, b"x").unwrap();
        std::fs::write(&txt, b"x").unwrap();

        assert!(matches!(
            decode_path(&heic, &FormatSupport::baseline()),
            Err(UncropError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            decode_path(&txt, &FormatSupport::baseline()),
            Err(UncropError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn missing_heif_converter_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let heic = dir.path().join("a.heic");
        std::fs::write(&heic, b"x").unwrap();

        let support = FormatSupport::with_heif_decoder("uncrop-definitely-missing-decoder");
        assert!(matches!(
            decode_path(&heic, &support),
            Err(UncropError::Decode(_))
        ));
    }
}
