//! Image splitting
//!
//! Decodes an image, detects its photo regions on the luminance channel and
//! writes each region, cropped from the original color image, to its own file
//! named `<stem>_<index>.<ext>`.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{OutputFormat, SplitConfig};
use crate::progress::{ProcessingStage, ProgressCallback, SilentProgress};
use crate::segment::{BoundingBox, DetectionResult, RegionDetector, SegmentError};

/// Outline color of the debug overlay
const OVERLAY_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Suffix of the debug overlay file stem
const OVERLAY_SUFFIX: &str = "regions";

/// Split error types
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("Image not found: {0}")]
    ImageNotFound(PathBuf),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Segmentation failed: {0}")]
    Segment(#[from] SegmentError),

    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SplitError>;

/// Result of splitting one image
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    /// Source image
    pub input: PathBuf,
    /// Regions found, in output order
    pub regions: Vec<BoundingBox>,
    /// Written region files, one per region
    pub outputs: Vec<PathBuf>,
    /// Debug overlay, when enabled
    pub debug_image: Option<PathBuf>,
    /// Total bytes written for region files
    pub output_size: u64,
    pub elapsed_seconds: f64,
}

/// Splits scanned sheets into one file per photo
#[derive(Debug, Clone, Default)]
pub struct ImageSplitter {
    config: SplitConfig,
}

impl ImageSplitter {
    pub fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Decode an image file
    pub fn open(path: &Path) -> Result<DynamicImage> {
        if !path.exists() {
            return Err(SplitError::ImageNotFound(path.to_path_buf()));
        }
        image::open(path)
            .map_err(|e| SplitError::InvalidImage(format!("{}: {}", path.display(), e)))
    }

    /// Detect regions of a decoded image
    pub fn detect_image(&self, img: &DynamicImage) -> Result<DetectionResult> {
        let gray = img.to_luma8();
        Ok(RegionDetector::detect_from_image(&gray, &self.config.detection)?)
    }

    /// Detect regions of an image file without writing anything
    pub fn detect_file(&self, path: &Path) -> Result<DetectionResult> {
        let img = Self::open(path)?;
        self.detect_image(&img)
    }

    /// Default output name for `input`: its file stem
    pub fn output_name(input: &Path) -> String {
        input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string())
    }

    /// Output path of region `index` for output name `name`
    pub fn output_path(&self, name: &str, output_dir: &Path, index: usize) -> PathBuf {
        output_dir.join(format!(
            "{}_{}.{}",
            name,
            index,
            self.config.format.extension()
        ))
    }

    /// Path of the debug overlay for output name `name`
    pub fn debug_path(&self, name: &str, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}_{}.png", name, OVERLAY_SUFFIX))
    }

    /// Split an image file into `output_dir`
    pub fn process_file(&self, input: &Path, output_dir: &Path) -> Result<SplitOutcome> {
        self.process_file_with_progress(input, output_dir, &SilentProgress)
    }

    /// Split an image file, reporting each stage
    pub fn process_file_with_progress(
        &self,
        input: &Path,
        output_dir: &Path,
        progress: &dyn ProgressCallback,
    ) -> Result<SplitOutcome> {
        self.process_named(input, &Self::output_name(input), output_dir, progress)
    }

    /// Split an image file, naming outputs `<name>_<index>.<ext>`
    pub fn process_named(
        &self,
        input: &Path,
        name: &str,
        output_dir: &Path,
        progress: &dyn ProgressCallback,
    ) -> Result<SplitOutcome> {
        let start = Instant::now();

        progress.on_step_start(ProcessingStage::Decoding);
        let img = Self::open(input)?;
        progress.on_step_complete(
            ProcessingStage::Decoding,
            &format!("{}x{}", img.width(), img.height()),
        );

        progress.on_step_start(ProcessingStage::Segmenting);
        let detection = self.detect_image(&img)?;
        progress.on_debug(&format!(
            "{} labels, {} merged regions after {} passes, {} too small",
            detection.label_count,
            detection.merged_count,
            detection.merge_passes,
            detection.discarded_count()
        ));
        progress.on_step_complete(
            ProcessingStage::Segmenting,
            &format!("{} region(s)", detection.regions.len()),
        );

        std::fs::create_dir_all(output_dir)?;

        let total = detection.regions.len();
        let mut outputs = Vec::with_capacity(total);
        let mut output_size = 0u64;

        progress.on_step_start(ProcessingStage::Writing);
        for (index, region) in detection.regions.iter().enumerate() {
            let cropped = crop_region(&img, region);
            let path = self.output_path(name, output_dir, index);
            output_size += self.write_region(&cropped, &path)?;
            debug!(output = %path.display(), ?region, "wrote region");
            outputs.push(path);
            progress.on_step_progress(index + 1, total);
        }
        progress.on_step_complete(ProcessingStage::Writing, &format!("{} file(s)", total));

        let debug_image = if self.config.save_debug {
            let path = self.debug_path(name, output_dir);
            render_overlay(&img, &detection.regions)
                .save_with_format(&path, ImageFormat::Png)
                .map_err(|e| SplitError::Encode(e.to_string()))?;
            Some(path)
        } else {
            None
        };

        let elapsed_seconds = start.elapsed().as_secs_f64();
        info!(
            input = %input.display(),
            regions = total,
            elapsed = elapsed_seconds,
            "split image"
        );
        progress.on_step_complete(
            ProcessingStage::Completed,
            &format!("{:.2}s", elapsed_seconds),
        );

        Ok(SplitOutcome {
            input: input.to_path_buf(),
            regions: detection.regions,
            outputs,
            debug_image,
            output_size,
            elapsed_seconds,
        })
    }

    /// Encode one cropped region, returning the written size
    fn write_region(&self, region: &DynamicImage, path: &Path) -> Result<u64> {
        match self.config.format {
            OutputFormat::Jpeg => {
                let rgb = region.to_rgb8();
                let mut writer = BufWriter::new(File::create(path)?);
                JpegEncoder::new_with_quality(&mut writer, self.config.jpeg_quality)
                    .encode_image(&rgb)
                    .map_err(|e| SplitError::Encode(e.to_string()))?;
                writer.flush()?;
            }
            OutputFormat::Png => {
                region
                    .save_with_format(path, ImageFormat::Png)
                    .map_err(|e| SplitError::Encode(e.to_string()))?;
            }
        }
        Ok(std::fs::metadata(path)?.len())
    }
}

/// Crop an inclusive region out of an image
pub fn crop_region(img: &DynamicImage, region: &BoundingBox) -> DynamicImage {
    img.crop_imm(region.x1, region.y1, region.width(), region.height())
}

/// Copy of `img` with every region outlined
pub fn render_overlay(img: &DynamicImage, regions: &[BoundingBox]) -> RgbImage {
    let mut canvas = img.to_rgb8();
    for region in regions {
        let rect = Rect::at(region.x1 as i32, region.y1 as i32)
            .of_size(region.width(), region.height());
        draw_hollow_rect_mut(&mut canvas, rect, OVERLAY_COLOR);
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;
    use tempfile::TempDir;

    /// White sheet with two colored photos far apart
    fn two_photo_sheet() -> DynamicImage {
        let mut img = RgbImage::from_pixel(200, 120, Rgb([255, 255, 255]));
        for y in 10..80 {
            for x in 10..90 {
                img.put_pixel(x, y, Rgb([200, 20, 20]));
            }
            for x in 120..190 {
                img.put_pixel(x, y, Rgb([20, 20, 200]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_image_not_found() {
        let splitter = ImageSplitter::default();
        let result = splitter.detect_file(Path::new("/nonexistent/scan.png"));
        assert!(matches!(result, Err(SplitError::ImageNotFound(_))));
    }

    #[test]
    fn test_invalid_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        let result = ImageSplitter::default().detect_file(&path);
        assert!(matches!(result, Err(SplitError::InvalidImage(_))));
    }

    #[test]
    fn test_output_naming() {
        let splitter = ImageSplitter::default();
        let out = Path::new("/tmp/out");
        let name = ImageSplitter::output_name(Path::new("in/scan 01.tiff"));
        assert_eq!(name, "scan 01");
        assert_eq!(
            splitter.output_path(&name, out, 2),
            PathBuf::from("/tmp/out/scan 01_2.jpg")
        );
        assert_eq!(
            splitter.debug_path("scan", out),
            PathBuf::from("/tmp/out/scan_regions.png")
        );

        let png = ImageSplitter::new(SplitConfig {
            format: OutputFormat::Png,
            ..Default::default()
        });
        assert_eq!(
            png.output_path("a", out, 0),
            PathBuf::from("/tmp/out/a_0.png")
        );
    }

    #[test]
    fn test_crop_region_is_inclusive() {
        let img = two_photo_sheet();
        let cropped = crop_region(&img, &BoundingBox::new(10, 10, 89, 79));
        assert_eq!(cropped.dimensions(), (80, 70));
        assert_eq!(cropped.to_rgb8().get_pixel(0, 0), &Rgb([200, 20, 20]));
    }

    #[test]
    fn test_detect_image_uses_luminance() {
        let detection = ImageSplitter::default().detect_image(&two_photo_sheet()).unwrap();
        assert_eq!(
            detection.regions,
            vec![BoundingBox::new(10, 10, 89, 79), BoundingBox::new(120, 10, 189, 79)]
        );
    }

    #[test]
    fn test_process_file_writes_regions() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("sheet.png");
        two_photo_sheet().save(&input).unwrap();
        let out_dir = dir.path().join("out");

        let outcome = ImageSplitter::default()
            .process_file(&input, &out_dir)
            .unwrap();

        assert_eq!(outcome.regions.len(), 2);
        assert_eq!(
            outcome.outputs,
            vec![out_dir.join("sheet_0.jpg"), out_dir.join("sheet_1.jpg")]
        );
        assert!(outcome.debug_image.is_none());
        assert!(outcome.output_size > 0);

        let first = image::open(&outcome.outputs[0]).unwrap();
        assert_eq!(first.dimensions(), (80, 70));
        let second = image::open(&outcome.outputs[1]).unwrap();
        assert_eq!(second.dimensions(), (70, 70));
    }

    #[test]
    fn test_process_file_png_and_debug_overlay() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("sheet.png");
        two_photo_sheet().save(&input).unwrap();

        let splitter = ImageSplitter::new(SplitConfig {
            format: OutputFormat::Png,
            save_debug: true,
            ..Default::default()
        });
        let outcome = splitter.process_file(&input, dir.path()).unwrap();

        let overlay_path = outcome.debug_image.expect("overlay written");
        let overlay = image::open(&overlay_path).unwrap().to_rgb8();
        assert_eq!(overlay.get_pixel(10, 10), &OVERLAY_COLOR);
        assert_eq!(overlay.get_pixel(0, 0), &Rgb([255, 255, 255]));

        // PNG output is lossless
        let first = image::open(&outcome.outputs[0]).unwrap().to_rgb8();
        assert_eq!(first.get_pixel(5, 5), &Rgb([200, 20, 20]));
    }

    #[test]
    fn test_blank_sheet_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("blank.png");
        RgbImage::from_pixel(100, 100, Rgb([250, 250, 250]))
            .save(&input)
            .unwrap();

        let outcome = ImageSplitter::default()
            .process_file(&input, dir.path())
            .unwrap();
        assert!(outcome.regions.is_empty());
        assert!(outcome.outputs.is_empty());
        assert_eq!(outcome.output_size, 0);
    }

    #[test]
    fn test_render_overlay_outlines_region() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 20, Rgb([0, 0, 0])));
        let overlay = render_overlay(&img, &[BoundingBox::new(2, 2, 10, 10)]);
        assert_eq!(overlay.get_pixel(2, 2), &OVERLAY_COLOR);
        assert_eq!(overlay.get_pixel(10, 10), &OVERLAY_COLOR);
        assert_eq!(overlay.get_pixel(6, 6), &Rgb([0, 0, 0]));
        assert_eq!(overlay.get_pixel(11, 11), &Rgb([0, 0, 0]));
    }
}
