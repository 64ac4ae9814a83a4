use std::{
    io::Cursor,
    path::{Path, PathBuf},
    sync::Mutex,
};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use uncrop::{
    CollisionPolicy, FailureStage, FormatSupport, InputFormat, ItemOutcome, OrientationClass,
    SkipReason, UncropConfig, UncropError,
};

fn small_config() -> UncropConfig {
    UncropConfig {
        portrait_width: 24,
        portrait_height: 30,
        blur_radius: 2.0,
        workers: Some(2),
        ..UncropConfig::default()
    }
}

fn photo(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, 128])
    })
}

fn write_encoded(path: &Path, img: DynamicImage, format: ImageFormat) {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    std::fs::write(path, buf).unwrap();
}

fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    write_encoded(&path, DynamicImage::ImageRgb8(photo(width, height)), ImageFormat::Png);
    path
}

fn write_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    write_encoded(&path, DynamicImage::ImageRgb8(photo(width, height)), ImageFormat::Jpeg);
    path
}

/// `write_jpeg`, plus an EXIF APP1 segment holding a single Orientation tag.
fn write_jpeg_with_orientation(
    dir: &Path,
    name: &str,
    width: u32,
    height: u32,
    orientation: u8,
) -> PathBuf {
    let path = write_jpeg(dir, name, width, height);
    let plain = std::fs::read(&path).unwrap();

    let mut tiff = b"MM\x00\x2a\x00\x00\x00\x08".to_vec();
    tiff.extend_from_slice(&[0x00, 0x01]);
    tiff.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
    tiff.extend_from_slice(&[0x00, orientation, 0x00, 0x00]);
    tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    let mut payload = b"Exif\x00\x00".to_vec();
    payload.extend_from_slice(&tiff);
    let len = u16::try_from(payload.len() + 2).unwrap();

    let mut bytes = plain[..2].to_vec();
    bytes.extend_from_slice(&[0xFF, 0xE1]);
    bytes.extend_from_slice(&len.to_be_bytes());
    bytes.extend_from_slice(&payload);
    bytes.extend_from_slice(&plain[2..]);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn output_dims(path: &Path) -> (u32, u32) {
    let img = image::open(path).unwrap();
    (img.width(), img.height())
}

#[test]
fn zero_byte_file_fails_alone() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    write_png(input.path(), "1.png", 40, 20);
    write_jpeg(input.path(), "2.jpg", 20, 40);
    std::fs::write(input.path().join("3.jpg"), b"").unwrap();
    write_png(input.path(), "4.png", 30, 30);
    write_jpeg(input.path(), "5.jpeg", 50, 21);

    let report = uncrop::run_batch(
        input.path(),
        output.path(),
        small_config(),
        &FormatSupport::baseline(),
    )
    .unwrap();

    assert_eq!(report.succeeded_count(), 4);
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.skipped_count(), 0);
    assert!(report.failed[0].source.ends_with("3.jpg"));
    assert_eq!(report.failed[0].stage, FailureStage::Decode);
    assert!(!output.path().join("3_uncropped.jpg").exists());

    assert_eq!(output_dims(&output.path().join("1_uncropped.jpg")), (30, 24));
    assert_eq!(output_dims(&output.path().join("2_uncropped.jpg")), (24, 30));
    assert_eq!(output_dims(&output.path().join("4_uncropped.jpg")), (24, 30));
    assert_eq!(output_dims(&output.path().join("5_uncropped.jpg")), (30, 24));
}

#[test]
fn corrupt_file_does_not_stop_the_others() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    for i in 0..5 {
        write_png(input.path(), &format!("ok{i}.png"), 16 + i, 12);
    }
    std::fs::write(input.path().join("broken.jpg"), b"\xFF\xD8\xFF\xE0 truncated").unwrap();

    let report = uncrop::run_batch(
        input.path(),
        output.path(),
        small_config(),
        &FormatSupport::baseline(),
    )
    .unwrap();
    assert_eq!(report.succeeded_count(), 5);
    assert_eq!(report.failed_count(), 1);
    assert!(report.failed[0].source.ends_with("broken.jpg"));
}

#[test]
fn heif_without_decoder_is_skipped_not_failed() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    write_png(input.path(), "a.png", 20, 10);
    std::fs::write(input.path().join("b.HEIC"), b"not really heif").unwrap();
    std::fs::write(input.path().join("notes.txt"), b"hello").unwrap();

    let report = uncrop::run_batch(
        input.path(),
        output.path(),
        small_config(),
        &FormatSupport::baseline(),
    )
    .unwrap();
    assert_eq!(report.succeeded_count(), 1);
    assert_eq!(report.failed_count(), 0);
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(
        report.skipped[0].reason,
        SkipReason::DecoderUnavailable(InputFormat::Heif)
    );
}

#[test]
fn missing_input_dir_is_fatal_config_error() {
    let root = tempfile::tempdir().unwrap();
    let res = uncrop::run_batch(
        root.path().join("nope"),
        root.path().join("out"),
        small_config(),
        &FormatSupport::baseline(),
    );
    assert!(matches!(res, Err(UncropError::Config(_))));
    assert!(!root.path().join("out").exists());
}

#[test]
fn output_dir_creation_is_idempotent() {
    let input = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let out = root.path().join("nested").join("out");
    write_png(input.path(), "a.png", 10, 20);

    let first =
        uncrop::run_batch(input.path(), &out, small_config(), &FormatSupport::baseline()).unwrap();
    let second =
        uncrop::run_batch(input.path(), &out, small_config(), &FormatSupport::baseline()).unwrap();
    assert_eq!(first.succeeded_count(), 1);
    assert_eq!(second.succeeded_count(), 1);
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 1);
}

#[test]
fn worker_count_does_not_change_output_bytes() {
    let input = tempfile::tempdir().unwrap();
    let out_a = tempfile::tempdir().unwrap();
    let out_b = tempfile::tempdir().unwrap();
    for (i, (w, h)) in [(40, 20), (20, 40), (25, 25), (33, 17)].into_iter().enumerate() {
        write_png(input.path(), &format!("img{i}.png"), w, h);
    }

    let one = UncropConfig {
        workers: Some(1),
        ..small_config()
    };
    let four = UncropConfig {
        workers: Some(4),
        ..small_config()
    };
    uncrop::run_batch(input.path(), out_a.path(), one, &FormatSupport::baseline()).unwrap();
    let report =
        uncrop::run_batch(input.path(), out_b.path(), four, &FormatSupport::baseline()).unwrap();
    assert_eq!(report.workers, 4);

    for i in 0..4 {
        let name = format!("img{i}_uncropped.jpg");
        assert_eq!(
            std::fs::read(out_a.path().join(&name)).unwrap(),
            std::fs::read(out_b.path().join(&name)).unwrap(),
            "{name}"
        );
    }
}

#[test]
fn outputs_carry_no_metadata_or_alpha() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let rgba = RgbaImage::from_pixel(12, 8, Rgba([200, 100, 50, 10]));
    write_encoded(
        &input.path().join("alpha.png"),
        DynamicImage::ImageRgba8(rgba),
        ImageFormat::Png,
    );

    uncrop::run_batch(
        input.path(),
        output.path(),
        small_config(),
        &FormatSupport::baseline(),
    )
    .unwrap();

    let bytes = std::fs::read(output.path().join("alpha_uncropped.jpg")).unwrap();
    assert!(!bytes.windows(4).any(|w| w == b"Exif"));
    assert!(!bytes.windows(11).any(|w| w == b"ICC_PROFILE"));
    let img = image::load_from_memory(&bytes).unwrap();
    assert!(!img.color().has_alpha());
}

#[test]
fn exif_rotated_jpeg_is_uprighted_and_stripped() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    // Stored landscape, displayed portrait (orientation 6 = rotate 90 CW).
    let src = write_jpeg_with_orientation(input.path(), "phone.jpg", 40, 20, 6);
    assert!(std::fs::read(&src).unwrap().windows(4).any(|w| w == b"Exif"));

    let report = uncrop::run_batch(
        input.path(),
        output.path(),
        small_config(),
        &FormatSupport::baseline(),
    )
    .unwrap();
    assert_eq!(report.succeeded_count(), 1);

    let placement = report.succeeded[0].placement;
    assert_eq!(placement.class, OrientationClass::Portrait);
    assert_eq!((placement.new_width, placement.new_height), (15, 30));
    assert_eq!(placement.x_offset, 4);

    let out_path = output.path().join("phone_uncropped.jpg");
    assert_eq!(output_dims(&out_path), (24, 30));
    let bytes = std::fs::read(&out_path).unwrap();
    assert!(!bytes.windows(4).any(|w| w == b"Exif"));
    assert!(!bytes.windows(11).any(|w| w == b"ICC_PROFILE"));
}

#[test]
fn observer_sees_every_terminal_item_once() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_png(input.path(), "a.png", 10, 10);
    write_png(input.path(), "b.png", 12, 10);
    std::fs::write(input.path().join("c.jpg"), b"").unwrap();
    std::fs::write(input.path().join("d.heif"), b"").unwrap();

    let job = uncrop::BatchJob::plan(
        input.path(),
        output.path(),
        small_config(),
        &FormatSupport::baseline(),
    )
    .unwrap();

    let seen = Mutex::new(Vec::new());
    let report = uncrop::run_with_observer(&job, &|outcome: &ItemOutcome| {
        seen.lock().unwrap().push(outcome.source().to_path_buf());
    })
    .unwrap();

    let mut seen = seen.into_inner().unwrap();
    seen.sort();
    assert_eq!(seen.len(), report.total());
    assert_eq!(report.total(), 4);
    seen.dedup();
    assert_eq!(seen.len(), 4);
}

#[test]
fn fail_policy_records_collision_and_writes_first() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_jpeg(input.path(), "same.jpg", 20, 10);
    write_png(input.path(), "same.png", 10, 20);

    let cfg = UncropConfig {
        collisions: CollisionPolicy::Fail,
        ..small_config()
    };
    let report =
        uncrop::run_batch(input.path(), output.path(), cfg, &FormatSupport::baseline()).unwrap();

    assert_eq!(report.succeeded_count(), 1);
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.failed[0].stage, FailureStage::Collision);
    assert!(report.failed[0].source.ends_with("same.png"));
    // the landscape input won, so the output is a landscape canvas
    assert_eq!(output_dims(&output.path().join("same_uncropped.jpg")), (30, 24));
}
