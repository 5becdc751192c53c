//! photo-splitter - Detect and export individual photographs from multi-photo scans
//!
//! Several photographs scanned together on one sheet are located as
//! axis-aligned regions on the luminance channel and written out as separate
//! files.
//!
//! # Modules
//!
//! - [`segment`] - binarization, labeling, region merging and size filtering
//! - [`split`] - decoding, cropping and encoding of a single image
//! - [`batch`] - parallel processing of input directories
//! - [`config`] - TOML configuration and CLI overrides
//! - [`progress`] - progress callbacks and summaries
//!
//! # Example
//!
//! ```rust,no_run
//! use photo_splitter::{ImageSplitter, SplitConfig};
//! use std::path::Path;
//!
//! let splitter = ImageSplitter::new(SplitConfig::default());
//! let outcome = splitter
//!     .process_file(Path::new("in/album_page.jpg"), Path::new("out"))
//!     .unwrap();
//! println!("{} photo(s) written", outcome.outputs.len());
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod progress;
pub mod segment;
pub mod split;

pub use batch::{
    collect_image_files, output_names, BatchError, BatchProcessor, BatchSummary, FileReport,
    FileStatus,
};
pub use cli::{Cli, Commands, RegionsArgs, SplitArgs};
pub use config::{CliOverrides, Config, ConfigError, OutputFormat, SplitConfig};
pub use progress::{OutputMode, ProcessingStage, ProgressCallback, ProgressTracker, SilentProgress};
pub use segment::{
    BoundingBox, DetectionOptions, DetectionOptionsBuilder, DetectionResult, GrayRaster,
    LabelingStrategy, MergeStrategy, RegionDetector, SegmentError,
};
pub use split::{crop_region, render_overlay, ImageSplitter, SplitError, SplitOutcome};

/// Process exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INVALID_ARGS: i32 = 2;
    pub const INPUT_NOT_FOUND: i32 = 3;
    pub const PROCESSING_ERROR: i32 = 4;
}
