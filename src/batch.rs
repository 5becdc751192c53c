//! Batch processing of input directories
//!
//! Files are split in parallel on a dedicated rayon pool. A failing file is
//! recorded in the summary and never stops the rest of the batch.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info_span, warn};

use crate::config::SplitConfig;
use crate::progress::{ProgressCallback, SilentProgress};
use crate::split::ImageSplitter;

/// Extensions accepted as input images (compared case-insensitively)
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "tif", "tiff", "bmp", "webp", "gif"];

const PROGRESS_TEMPLATE: &str = "{bar:40.cyan/blue} {pos}/{len} {wide_msg}";

/// Batch error types
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(String),

    #[error("{failed} of {total} file(s) failed to process")]
    FilesFailed { failed: usize, total: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BatchError>;

/// Check whether a path has a supported image extension
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Collect image files from a file or a directory (not recursive), sorted
pub fn collect_image_files(input: &Path) -> Result<Vec<PathBuf>> {
    if !input.exists() {
        return Err(BatchError::InputNotFound(input.to_path_buf()));
    }

    if input.is_file() {
        return Ok(if is_supported_image(input) {
            vec![input.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(input)? {
        let path = entry?.path();
        if path.is_file() && is_supported_image(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Output names for a batch, one per file, unique ignoring case.
///
/// A file keeps its stem unless another input shares that stem (e.g.
/// `scan.png` and `scan.bmp`), in which case the extension is appended
/// (`scan_png`, `scan_bmp`). Any clash left after that gets a `_2`, `_3`, ...
/// suffix in input order.
pub fn output_names(files: &[PathBuf]) -> Vec<String> {
    let stems: Vec<String> = files.iter().map(|f| ImageSplitter::output_name(f)).collect();

    let mut stem_counts: HashMap<String, usize> = HashMap::new();
    for stem in &stems {
        *stem_counts.entry(stem.to_lowercase()).or_default() += 1;
    }

    let mut used = HashSet::new();
    files
        .iter()
        .zip(stems)
        .map(|(file, stem)| {
            let base = match file.extension() {
                Some(ext) if stem_counts[&stem.to_lowercase()] > 1 => {
                    format!("{}_{}", stem, ext.to_string_lossy())
                }
                _ => stem,
            };
            let mut name = base.clone();
            let mut n = 2;
            while !used.insert(name.to_lowercase()) {
                name = format!("{}_{}", base, n);
                n += 1;
            }
            name
        })
        .collect()
}

/// What happened to one input file
#[derive(Debug, Clone, PartialEq)]
pub enum FileStatus {
    Split {
        regions: usize,
        outputs: Vec<PathBuf>,
    },
    Skipped,
    Failed(String),
}

/// Per-file batch result
#[derive(Debug, Clone)]
pub struct FileReport {
    pub input: PathBuf,
    pub status: FileStatus,
}

/// Batch result, reports in input order
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub reports: Vec<FileReport>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.reports.len()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Split { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Failed(_)))
    }

    /// Regions written across all files
    pub fn region_count(&self) -> usize {
        self.reports
            .iter()
            .map(|r| match &r.status {
                FileStatus::Split { regions, .. } => *regions,
                _ => 0,
            })
            .sum()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// `Err(FilesFailed)` when any file failed
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        Err(BatchError::FilesFailed {
            failed: self.failed(),
            total: self.total(),
        })
    }

    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.status)).count()
    }
}

/// Runs an [`ImageSplitter`] over many files
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    splitter: ImageSplitter,
    show_progress: bool,
}

impl BatchProcessor {
    pub fn new(config: SplitConfig) -> Self {
        Self {
            splitter: ImageSplitter::new(config),
            show_progress: false,
        }
    }

    /// Show a terminal progress bar while running
    #[must_use]
    pub fn with_progress_bar(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Split every file into `output_dir`
    pub fn run(&self, files: &[PathBuf], output_dir: &Path) -> Result<BatchSummary> {
        self.run_with_progress(files, output_dir, &SilentProgress)
    }

    /// Split every file, forwarding per-file stage events to `progress`
    pub fn run_with_progress(
        &self,
        files: &[PathBuf],
        output_dir: &Path,
        progress: &dyn ProgressCallback,
    ) -> Result<BatchSummary> {
        std::fs::create_dir_all(output_dir)?;

        let threads = self.splitter.config().effective_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| BatchError::ThreadPool(e.to_string()))?;
        debug!(files = files.len(), threads, "starting batch");

        let names = output_names(files);
        let bar = self.progress_bar(files.len());
        let reports = pool.install(|| {
            files
                .par_iter()
                .zip(names.par_iter())
                .map(|(input, name)| {
                    let report = self.process_one(input, name, output_dir, progress);
                    bar.set_message(display_name(input));
                    bar.inc(1);
                    report
                })
                .collect::<Vec<_>>()
        });
        bar.finish_and_clear();

        Ok(BatchSummary { reports })
    }

    fn process_one(
        &self,
        input: &Path,
        name: &str,
        output_dir: &Path,
        progress: &dyn ProgressCallback,
    ) -> FileReport {
        // Workers interleave, so events logged while splitting carry the file
        let _span = info_span!("file", name = %display_name(input)).entered();

        let first_output = self.splitter.output_path(name, output_dir, 0);
        let status = if self.splitter.config().skip_existing && first_output.exists() {
            debug!(input = %input.display(), "skipping, output exists");
            FileStatus::Skipped
        } else {
            match self
                .splitter
                .process_named(input, name, output_dir, progress)
            {
                Ok(outcome) => FileStatus::Split {
                    regions: outcome.regions.len(),
                    outputs: outcome.outputs,
                },
                Err(e) => {
                    warn!(input = %input.display(), error = %e, "failed to split image");
                    FileStatus::Failed(e.to_string())
                }
            }
        };

        FileReport {
            input: input.to_path_buf(),
            status,
        }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        ProgressBar::new(len as u64).with_style(style)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
