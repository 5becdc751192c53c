//! Command-line interface definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{CliOverrides, OutputFormat};
use crate::segment::{LabelingStrategy, MergeStrategy};

/// Split multi-photo scans into one file per photo
#[derive(Debug, Parser)]
#[command(name = "photo-splitter", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Split every image of a file or directory
    Split(SplitArgs),
    /// Print the regions detected in one image as JSON
    Regions(RegionsArgs),
    /// Show version, CPU and config file information
    Info,
}

/// Detection settings shared by `split` and `regions`
#[derive(Debug, Clone, Default, Args)]
pub struct DetectionArgs {
    /// Config file (default: ./photo-splitter.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Background tolerance, 0.0-1.0 (default 0.2)
    #[arg(short, long)]
    pub tolerance: Option<f64>,

    /// Minimum region width in pixels (default 50)
    #[arg(long)]
    pub min_width: Option<u32>,

    /// Minimum region height in pixels (default 50)
    #[arg(long)]
    pub min_height: Option<u32>,

    /// Merge margin in pixels (default 5)
    #[arg(long)]
    pub dilation: Option<u32>,

    /// Labeler search radius as a fraction of the shorter side (default 0.002)
    #[arg(long)]
    pub search_factor: Option<f64>,

    /// Use exact connected-component labeling
    #[arg(long)]
    pub exact_labels: bool,

    /// Merge all touching regions per pass, independent of order
    #[arg(long)]
    pub transitive_merge: bool,
}

impl DetectionArgs {
    /// Overrides for the values given on the command line
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            tolerance_percentage: self.tolerance,
            min_region_width: self.min_width,
            min_region_height: self.min_height,
            dilation_margin: self.dilation,
            search_margin_factor: self.search_factor,
            labeling: self.exact_labels.then_some(LabelingStrategy::UnionFind),
            merge: self.transitive_merge.then_some(MergeStrategy::Transitive),
            ..CliOverrides::new()
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct SplitArgs {
    /// Input image or directory
    #[arg(default_value = "./in")]
    pub input: PathBuf,

    /// Output directory
    #[arg(default_value = "./out")]
    pub output: PathBuf,

    #[command(flatten)]
    pub detection: DetectionArgs,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// JPEG quality, 1-100 (default 85)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub jpeg_quality: Option<u8>,

    /// Worker threads (default: number of CPUs)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Skip inputs whose first output already exists
    #[arg(long)]
    pub skip_existing: bool,

    /// Also write <name>_regions.png with detected regions outlined
    #[arg(long)]
    pub save_debug: bool,

    /// Show what would be processed without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl SplitArgs {
    /// Overrides for the values given on the command line
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            format: self.format,
            jpeg_quality: self.jpeg_quality,
            threads: self.threads,
            save_debug: self.save_debug.then_some(true),
            skip_existing: self.skip_existing.then_some(true),
            ..self.detection.overrides()
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct RegionsArgs {
    /// Image to analyze
    pub image: PathBuf,

    #[command(flatten)]
    pub detection: DetectionArgs,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
