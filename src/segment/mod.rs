//! Region Segmentation module
//!
//! Locates the rectangular content regions (e.g. photographs scanned
//! together on one sheet) of a grayscale raster.
//!
//! # Pipeline
//!
//! 1. [`Binarizer`] splits samples into foreground and paper background
//! 2. A [`RegionLabeler`] labels foreground pixels in one raster pass and
//!    keeps a bounding box per label
//! 3. [`RegionMerger`] unions boxes whose dilated forms overlap, repeating
//!    until the region count is stable
//! 4. [`SizeFilter`] drops regions that are too small to be a photo
//!
//! # Example
//!
//! ```rust,no_run
//! use photo_splitter::{DetectionOptions, GrayRaster, RegionDetector};
//!
//! # fn samples() -> Vec<u8> { vec![255; 640 * 480] }
//! let samples = samples();
//! let raster = GrayRaster::new(640, 480, &samples).unwrap();
//! let options = DetectionOptions::builder().tolerance_percentage(0.15).build();
//!
//! let result = RegionDetector::detect(&raster, &options);
//! for region in &result.regions {
//!     println!("{:?}", region);
//! }
//! ```

// Submodules
mod binarize;
mod filter;
mod label;
mod merge;
mod types;
mod union_find;

// Re-export public API
pub use binarize::Binarizer;
pub use filter::SizeFilter;
pub use label::{
    search_radius, ApproximateLabeler, BoxTable, LabelGrid, Labeling, RegionLabeler,
    UnionFindLabeler,
};
pub use merge::{MergeOutcome, MergeStrategy, RegionMerger};
pub use types::{BoundingBox, GrayRaster, Result, SegmentError};
pub use union_find::UnionFind;

use image::GrayImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================
// Constants
// ============================================================

/// Default foreground/background tolerance (fraction of full scale)
pub const DEFAULT_TOLERANCE_PERCENTAGE: f64 = 0.2;

/// Default minimum region extent in pixels, both axes
pub const DEFAULT_MIN_REGION_SIZE: u32 = 50;

/// Default merge dilation margin in pixels
pub const DEFAULT_DILATION_MARGIN: u32 = 5;

/// Default labeler search radius as a fraction of min(width, height)
pub const DEFAULT_SEARCH_MARGIN_FACTOR: f64 = 0.002;

/// Tolerance used by [`DetectionOptions::strict`]
const STRICT_TOLERANCE_PERCENTAGE: f64 = 0.05;

/// Tolerance used by [`DetectionOptions::lenient`]
const LENIENT_TOLERANCE_PERCENTAGE: f64 = 0.35;

// ============================================================
// Options
// ============================================================

/// Labeling algorithm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelingStrategy {
    /// Bounded backward search, see [`ApproximateLabeler`]
    #[default]
    Approximate,
    /// Exact 8-connected labeling, see [`UnionFindLabeler`]
    UnionFind,
}

/// Region detection options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionOptions {
    /// Foreground/background tolerance (0.0-1.0)
    pub tolerance_percentage: f64,
    /// Regions must be strictly wider than this (x2 - x1)
    pub min_region_width: u32,
    /// Regions must be strictly taller than this (y2 - y1)
    pub min_region_height: u32,
    /// Merge adjacency slack in pixels
    pub dilation_margin: u32,
    /// Labeler search radius as a fraction of min(width, height)
    pub search_margin_factor: f64,
    pub labeling: LabelingStrategy,
    pub merge: MergeStrategy,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            tolerance_percentage: DEFAULT_TOLERANCE_PERCENTAGE,
            min_region_width: DEFAULT_MIN_REGION_SIZE,
            min_region_height: DEFAULT_MIN_REGION_SIZE,
            dilation_margin: DEFAULT_DILATION_MARGIN,
            search_margin_factor: DEFAULT_SEARCH_MARGIN_FACTOR,
            labeling: LabelingStrategy::default(),
            merge: MergeStrategy::default(),
        }
    }
}

impl DetectionOptions {
    /// Create a new options builder
    pub fn builder() -> DetectionOptionsBuilder {
        DetectionOptionsBuilder::default()
    }

    /// Only near-white samples count as paper (light photos on clean scans)
    pub fn strict() -> Self {
        Self {
            tolerance_percentage: STRICT_TOLERANCE_PERCENTAGE,
            ..Default::default()
        }
    }

    /// Treat light gray as paper too (yellowed or noisy scans)
    pub fn lenient() -> Self {
        Self {
            tolerance_percentage: LENIENT_TOLERANCE_PERCENTAGE,
            ..Default::default()
        }
    }

    /// Exact labeling and order-independent merging
    pub fn exact() -> Self {
        Self {
            labeling: LabelingStrategy::UnionFind,
            merge: MergeStrategy::Transitive,
            ..Default::default()
        }
    }

    /// Size filter built from the minimum extents
    pub fn size_filter(&self) -> SizeFilter {
        SizeFilter::new(self.min_region_width, self.min_region_height)
    }
}

/// Builder for DetectionOptions
#[derive(Debug, Default)]
pub struct DetectionOptionsBuilder {
    options: DetectionOptions,
}

impl DetectionOptionsBuilder {
    /// Set tolerance (0.0-1.0)
    #[must_use]
    pub fn tolerance_percentage(mut self, tolerance: f64) -> Self {
        self.options.tolerance_percentage = tolerance.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn min_region_width(mut self, width: u32) -> Self {
        self.options.min_region_width = width;
        self
    }

    #[must_use]
    pub fn min_region_height(mut self, height: u32) -> Self {
        self.options.min_region_height = height;
        self
    }

    #[must_use]
    pub fn dilation_margin(mut self, margin: u32) -> Self {
        self.options.dilation_margin = margin;
        self
    }

    /// Set search radius factor (negative values become 0)
    #[must_use]
    pub fn search_margin_factor(mut self, factor: f64) -> Self {
        self.options.search_margin_factor = factor.max(0.0);
        self
    }

    #[must_use]
    pub fn labeling(mut self, strategy: LabelingStrategy) -> Self {
        self.options.labeling = strategy;
        self
    }

    #[must_use]
    pub fn merge(mut self, strategy: MergeStrategy) -> Self {
        self.options.merge = strategy;
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> DetectionOptions {
        self.options
    }
}

// ============================================================
// Detector
// ============================================================

/// Region detection result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionResult {
    /// Final regions, in merge order
    pub regions: Vec<BoundingBox>,
    /// Image dimensions
    pub image_size: (u32, u32),
    /// Labels assigned by the labeling pass
    pub label_count: usize,
    /// Regions left after merging, before the size filter
    pub merged_count: usize,
    /// Merge passes until the fixpoint
    pub merge_passes: usize,
}

impl DetectionResult {
    /// Regions removed by the size filter
    pub fn discarded_count(&self) -> usize {
        self.merged_count - self.regions.len()
    }
}

/// Photo region detector
pub struct RegionDetector;

impl RegionDetector {
    /// Detect regions in a validated raster
    pub fn detect(raster: &GrayRaster<'_>, options: &DetectionOptions) -> DetectionResult {
        let (width, height) = (raster.width(), raster.height());
        let binarizer = Binarizer::new(options.tolerance_percentage);

        let labeling = match options.labeling {
            LabelingStrategy::Approximate => {
                ApproximateLabeler::new(options.search_margin_factor).label(raster, &binarizer)
            }
            LabelingStrategy::UnionFind => UnionFindLabeler.label(raster, &binarizer),
        };
        let label_count = labeling.label_count();

        let merger = RegionMerger::new(options.dilation_margin, width, height)
            .with_strategy(options.merge);
        let outcome = merger.merge_all(labeling.into_boxes());
        let merged_count = outcome.regions.len();

        let regions = options.size_filter().apply(outcome.regions);
        debug_assert!(regions.iter().all(|r| r.is_within(width, height)));

        debug!(
            width,
            height,
            labels = label_count,
            merged = merged_count,
            passes = outcome.passes,
            regions = regions.len(),
            "region detection finished"
        );

        DetectionResult {
            regions,
            image_size: (width, height),
            label_count,
            merged_count,
            merge_passes: outcome.passes,
        }
    }

    /// Detect regions in a raw row-major sample buffer
    pub fn detect_samples(
        width: u32,
        height: u32,
        samples: &[u8],
        options: &DetectionOptions,
    ) -> Result<DetectionResult> {
        let raster = GrayRaster::new(width, height, samples)?;
        Ok(Self::detect(&raster, options))
    }

    /// Detect regions in a grayscale image
    pub fn detect_from_image(
        gray: &GrayImage,
        options: &DetectionOptions,
    ) -> Result<DetectionResult> {
        let raster = GrayRaster::from_image(gray)?;
        Ok(Self::detect(&raster, options))
    }
}
