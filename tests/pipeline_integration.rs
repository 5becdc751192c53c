//! End-to-end tests for the library pipeline
//!
//! Scans are generated on the fly, written to a temp dir and run through
//! detection, splitting and batch processing.

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use photo_splitter::{
    collect_image_files, BatchProcessor, BoundingBox, Config, DetectionOptions, FileStatus,
    ImageSplitter, OutputFormat, RegionDetector, SplitConfig,
};
use std::path::Path;
use tempfile::TempDir;

const PAPER: Rgb<u8> = Rgb([250, 250, 250]);

fn scan(width: u32, height: u32, photos: &[(u32, u32, u32, u32, Rgb<u8>)]) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, PAPER);
    for &(x, y, w, h, color) in photos {
        for yy in y..y + h {
            for xx in x..x + w {
                img.put_pixel(xx, yy, color);
            }
        }
    }
    img
}

fn two_photo_scan(path: &Path) {
    scan(
        240,
        180,
        &[
            (10, 10, 90, 70, Rgb([200, 30, 30])),
            (130, 60, 100, 110, Rgb([30, 30, 200])),
        ],
    )
    .save(path)
    .unwrap();
}

// Two photos on one sheet come out as two files with the photo colors
#[test]
fn test_split_two_photos_png() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("album.png");
    let output = dir.path().join("out");
    two_photo_scan(&input);

    let splitter = ImageSplitter::new(SplitConfig {
        format: OutputFormat::Png,
        ..Default::default()
    });
    let outcome = splitter.process_file(&input, &output).unwrap();

    assert_eq!(
        outcome.regions,
        vec![BoundingBox::new(10, 10, 99, 79), BoundingBox::new(130, 60, 229, 169)]
    );
    assert_eq!(outcome.outputs.len(), 2);
    assert_eq!(outcome.outputs[0], output.join("album_0.png"));
    assert_eq!(outcome.outputs[1], output.join("album_1.png"));

    let first = image::open(&outcome.outputs[0]).unwrap().to_rgb8();
    assert_eq!(first.dimensions(), (90, 70));
    assert_eq!(*first.get_pixel(45, 35), Rgb([200, 30, 30]));

    let second = image::open(&outcome.outputs[1]).unwrap().to_rgb8();
    assert_eq!(second.dimensions(), (100, 110));
    assert_eq!(*second.get_pixel(0, 0), Rgb([30, 30, 200]));
}

#[test]
fn test_split_jpeg_with_debug_overlay() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("page.png");
    let output = dir.path().join("out");
    two_photo_scan(&input);

    let splitter = ImageSplitter::new(SplitConfig {
        save_debug: true,
        ..Default::default()
    });
    let outcome = splitter.process_file(&input, &output).unwrap();

    assert_eq!(outcome.outputs[0], output.join("page_0.jpg"));
    assert!(outcome.output_size > 0);
    let decoded = image::open(&outcome.outputs[1]).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (100, 110));

    let overlay_path = outcome.debug_image.unwrap();
    assert_eq!(overlay_path, output.join("page_regions.png"));
    let overlay = image::open(&overlay_path).unwrap().to_rgb8();
    assert_eq!(overlay.dimensions(), (240, 180));
    assert_eq!(*overlay.get_pixel(10, 10), Rgb([255, 0, 0]));
}

// A blank sheet is a success with no outputs
#[test]
fn test_blank_scan_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("blank.png");
    let output = dir.path().join("out");
    scan(120, 120, &[]).save(&input).unwrap();

    let outcome = ImageSplitter::default()
        .process_file(&input, &output)
        .unwrap();
    assert!(outcome.regions.is_empty());
    assert!(outcome.outputs.is_empty());
}

#[test]
fn test_photos_closer_than_margin_merge() {
    // 4px gap, below the 5px dilation margin
    let img = scan(
        200,
        120,
        &[
            (20, 20, 60, 80, Rgb([0, 0, 0])),
            (84, 20, 60, 80, Rgb([0, 0, 0])),
        ],
    );
    let gray = DynamicImage::ImageRgb8(img).to_luma8();

    let result = RegionDetector::detect_from_image(&gray, &DetectionOptions::default()).unwrap();
    assert_eq!(result.regions, vec![BoundingBox::new(20, 20, 143, 99)]);

    let exact = RegionDetector::detect_from_image(&gray, &DetectionOptions::exact()).unwrap();
    assert_eq!(exact.regions, result.regions);
}

#[test]
fn test_small_specks_are_dropped() {
    let mut gray = GrayImage::from_pixel(200, 200, Luma([255]));
    for (x, y) in [(5, 5), (150, 20), (30, 170)] {
        for yy in y..y + 10 {
            for xx in x..x + 10 {
                gray.put_pixel(xx, yy, Luma([0]));
            }
        }
    }
    for yy in 60..140 {
        for xx in 60..140 {
            gray.put_pixel(xx, yy, Luma([90]));
        }
    }

    let result = RegionDetector::detect_from_image(&gray, &DetectionOptions::default()).unwrap();
    assert_eq!(result.regions, vec![BoundingBox::new(60, 60, 139, 139)]);
    assert_eq!(result.discarded_count(), 3);
}

#[test]
fn test_config_file_drives_batch() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    std::fs::create_dir(&input).unwrap();
    two_photo_scan(&input.join("one.png"));
    two_photo_scan(&input.join("two.png"));
    std::fs::write(input.join("readme.txt"), "not an image").unwrap();

    let config_path = dir.path().join("photo-splitter.toml");
    std::fs::write(
        &config_path,
        r#"
[detection]
min_region_width = 95

[output]
format = "png"

[processing]
threads = 2
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&config_path)
        .unwrap()
        .merge_with_cli(&Default::default());
    assert_eq!(config.format, OutputFormat::Png);

    let files = collect_image_files(&input).unwrap();
    assert_eq!(files.len(), 2);

    let summary = BatchProcessor::new(config).run(&files, &output).unwrap();
    assert!(summary.is_success());
    // Only the 100px wide photo passes a 95px minimum width
    assert_eq!(summary.region_count(), 2);
    for report in &summary.reports {
        assert!(matches!(report.status, FileStatus::Split { regions: 1, .. }));
    }
    assert!(output.join("one_0.png").exists());
    assert!(!output.join("one_1.png").exists());
}
