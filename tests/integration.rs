use std::fs;
use std::path::Path;

use glint_mask::mask::clean_pixel_count;
use glint_mask::reflectance::IntensityStats;
use glint_mask::{
    build_mask, estimate_specular_reflection_component, BatchPolicy, Error, MaskEngine,
    MaskOptions, MASK_CLEAN, MASK_GLINT,
};
use image::{GrayImage, Rgb, RgbImage};

/// Dark blue-green water with a bright, nearly white glint patch.
fn water_with_glint(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if (8..14).contains(&x) && (4..10).contains(&y) {
            Rgb([250, 252, 255])
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let ripple = ((x + 2 * y) % 7) as u8;
            Rgb([20 + ripple, 60 + ripple, 90 + 2 * ripple])
        }
    })
}

fn write_png(path: &Path, img: &RgbImage) {
    img.save(path).unwrap();
}

#[test]
fn white_pixel_in_gray_is_masked_as_glint() {
    let mut img = RgbImage::from_pixel(4, 4, Rgb([128, 128, 128]));
    img.put_pixel(2, 1, Rgb([255, 255, 255]));

    let reflectance = estimate_specular_reflection_component(&img, 0.2).unwrap();
    let mask = build_mask(&reflectance, 0.5, 0).unwrap();

    assert_eq!(mask.dimensions(), (4, 4));
    for (x, y, p) in mask.enumerate_pixels() {
        if (x, y) == (2, 1) {
            assert_eq!(p[0], MASK_GLINT);
        } else {
            assert_eq!(p[0], MASK_CLEAN, "gray pixel ({x},{y})");
        }
    }
}

#[test]
fn glint_patch_is_masked_and_water_is_clean() {
    let engine = MaskEngine::new(MaskOptions::default()).unwrap();
    let mask = engine.mask(&water_with_glint(24, 16)).unwrap();

    for y in 4..10 {
        for x in 8..14 {
            assert_eq!(mask.get_pixel(x, y)[0], MASK_GLINT, "glint ({x},{y})");
        }
    }
    // Interior water well away from the patch and the border.
    assert_eq!(mask.get_pixel(3, 12)[0], MASK_CLEAN);
    assert_eq!(mask.get_pixel(19, 3)[0], MASK_CLEAN);
}

#[test]
fn masking_is_deterministic() {
    let engine = MaskEngine::new(MaskOptions::default()).unwrap();
    let img = water_with_glint(32, 20);
    let first = engine.mask(&img).unwrap();
    let second = engine.mask(&img).unwrap();
    assert_eq!(first.as_raw(), second.as_raw());
}

#[test]
fn clean_count_never_drops_as_threshold_rises() {
    let img = water_with_glint(30, 20);
    let mut previous = 0;
    for step in 0..=20u8 {
        let opts = MaskOptions {
            mask_thresh: f32::from(step) / 20.0,
            ..MaskOptions::default()
        };
        let mask = MaskEngine::new(opts).unwrap().mask(&img).unwrap();
        let count = clean_pixel_count(&mask);
        assert!(count >= previous, "clean count dropped at step {step}");
        previous = count;
    }
}

#[test]
fn default_percent_diffuse_selects_exact_rank() {
    // Ten pixels (a multiple of 5) with strictly increasing ratios 100 / (100 - 10k).
    let img = RgbImage::from_fn(10, 1, |x, _| {
        #[allow(clippy::cast_possible_truncation)]
        let base = (10 * x) as u8;
        Rgb([base, base, 100])
    });
    let stats = IntensityStats::from_image(&img);
    let q_hat = stats.diffuse_ratio(MaskOptions::default().percent_diffuse);
    // ceil(0.2 * 10) = 2: the second smallest ratio.
    assert!((q_hat - 100.0 / 90.0).abs() < 1e-12, "q_hat = {q_hat}");

    // Pixels at or below the selected ratio carry no specular component.
    let reflectance = estimate_specular_reflection_component(&img, 0.2).unwrap();
    assert!(reflectance.get(0, 0).abs() < f32::EPSILON);
    assert!(reflectance.get(1, 0).abs() < f32::EPSILON);
    assert!(reflectance.get(2, 0) > 0.0);
}

#[test]
fn uniform_image_reports_degenerate_input() {
    let engine = MaskEngine::new(MaskOptions::default()).unwrap();
    let img = RgbImage::from_pixel(10, 10, Rgb([40, 80, 120]));
    assert!(matches!(engine.mask(&img), Err(Error::DegenerateInput)));
}

#[test]
fn process_file_writes_mask() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("frame.png");
    let output = dir.path().join("nested/frame_mask.png");
    write_png(&input, &water_with_glint(24, 16));

    let engine = MaskEngine::new(MaskOptions::default()).unwrap();
    let mask = engine.process_file(&input, &output).unwrap();

    let saved: GrayImage = image::open(&output).unwrap().to_luma8();
    assert_eq!(saved.as_raw(), mask.as_raw());
}

#[test]
fn directory_batch_processes_only_images() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    for name in ["a.png", "b.png", "c.png"] {
        write_png(&input_dir.path().join(name), &water_with_glint(24, 16));
    }
    fs::write(input_dir.path().join("notes.txt"), "not an image").unwrap();

    let engine = MaskEngine::new(MaskOptions::default()).unwrap();
    let summary = engine
        .process_path(input_dir.path(), output_dir.path(), BatchPolicy::Abort)
        .unwrap();

    assert_eq!(summary.written.len(), 3);
    assert!(summary.failed.is_empty());

    let mut produced: Vec<String> = fs::read_dir(output_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    produced.sort();
    assert_eq!(produced, ["a_mask.png", "b_mask.png", "c_mask.png"]);
}

#[test]
fn directory_input_with_file_output_is_rejected() {
    let input_dir = tempfile::tempdir().unwrap();
    write_png(&input_dir.path().join("a.png"), &water_with_glint(24, 16));
    let out_dir = tempfile::tempdir().unwrap();
    let output = out_dir.path().join("mask.png");

    let engine = MaskEngine::new(MaskOptions::default()).unwrap();
    let err = engine
        .process_path(input_dir.path(), &output, BatchPolicy::Abort)
        .unwrap_err();
    assert!(matches!(err, Error::PathMismatch { .. }));
    assert!(fs::read_dir(out_dir.path()).unwrap().next().is_none());
}

#[test]
fn file_input_with_directory_output_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("a.png");
    write_png(&input, &water_with_glint(24, 16));

    let engine = MaskEngine::new(MaskOptions::default()).unwrap();
    let err = engine
        .process_path(&input, dir.path(), BatchPolicy::Abort)
        .unwrap_err();
    assert!(matches!(err, Error::PathMismatch { .. }));
}

#[test]
fn batch_failure_aborts_by_default_and_is_skipped_on_request() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    write_png(&input_dir.path().join("good.png"), &water_with_glint(24, 16));
    fs::write(input_dir.path().join("broken.png"), b"not a png").unwrap();

    let engine = MaskEngine::new(MaskOptions::default()).unwrap();
    assert!(engine
        .process_directory(input_dir.path(), output_dir.path(), BatchPolicy::Abort)
        .is_err());

    let summary = engine
        .process_directory(
            input_dir.path(),
            output_dir.path(),
            BatchPolicy::SkipFailures,
        )
        .unwrap();
    assert_eq!(summary.written, [output_dir.path().join("good_mask.png")]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, input_dir.path().join("broken.png"));
}
