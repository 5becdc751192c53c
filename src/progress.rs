//! Progress reporting for image splitting.
//!
//! Library code reports through [`ProgressCallback`]; the CLI decides what
//! to show based on [`OutputMode`].

use std::fmt;

/// Processing stages for a single image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingStage {
    #[default]
    Decoding,
    /// Binarize, label, merge and filter
    Segmenting,
    /// Crop and encode each region
    Writing,
    Completed,
}

impl ProcessingStage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Decoding => "Decoding",
            Self::Segmenting => "Segmenting",
            Self::Writing => "Writing",
            Self::Completed => "Completed",
        }
    }

    /// Short lowercase description shown next to the name
    pub fn description(&self) -> &'static str {
        match self {
            Self::Decoding => "reading image",
            Self::Segmenting => "finding photo regions",
            Self::Writing => "cropping and encoding regions",
            Self::Completed => "done",
        }
    }
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.description())
    }
}

/// Console verbosity, ordered from least to most output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum OutputMode {
    /// Errors only
    Quiet,
    /// Progress bar and summary
    #[default]
    Normal,
    /// Adds one line per file
    Verbose,
    /// Adds one line per stage
    VeryVerbose,
}

impl OutputMode {
    /// Mode for a `-v` count
    pub fn from_verbosity(level: u8) -> Self {
        match level {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::VeryVerbose,
        }
    }

    /// Whether output meant for `required` is shown in this mode
    pub fn should_show(&self, required: OutputMode) -> bool {
        *self != Self::Quiet && *self >= required
    }
}

/// Receives progress events while an image is processed.
///
/// Implementations must be shareable across batch worker threads.
pub trait ProgressCallback: Sync {
    fn on_step_start(&self, stage: ProcessingStage);

    fn on_step_progress(&self, current: usize, total: usize);

    fn on_step_complete(&self, stage: ProcessingStage, message: &str);

    fn on_debug(&self, _message: &str) {}
}

/// Progress callback that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_step_start(&self, _stage: ProcessingStage) {}

    fn on_step_progress(&self, _current: usize, _total: usize) {}

    fn on_step_complete(&self, _stage: ProcessingStage, _message: &str) {}
}

/// Batch summary printing
pub struct ProgressTracker;

impl ProgressTracker {
    /// Format the final summary block
    pub fn format_summary(
        total_files: usize,
        ok_count: usize,
        skip_count: usize,
        error_count: usize,
        region_count: usize,
    ) -> String {
        let rule = "=".repeat(60);
        [
            rule.clone(),
            "Processing Summary".to_string(),
            rule.clone(),
            format!("  Total files:  {}", total_files),
            format!("  Succeeded:    {}", ok_count),
            format!("  Skipped:      {}", skip_count),
            format!("  Errors:       {}", error_count),
            format!("  Regions:      {}", region_count),
            rule,
        ]
        .join("\n")
    }

    /// Print the final summary
    pub fn print_summary(
        total_files: usize,
        ok_count: usize,
        skip_count: usize,
        error_count: usize,
        region_count: usize,
    ) {
        println!();
        println!(
            "{}",
            Self::format_summary(total_files, ok_count, skip_count, error_count, region_count)
        );
        println!();
    }
}
