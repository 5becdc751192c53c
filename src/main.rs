//! photo-splitter - Split multi-photo scans into individual photos
//!
//! CLI entry point

use anyhow::Context;
use clap::Parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, trace, Level};

use photo_splitter::cli::DetectionArgs;
use photo_splitter::{
    collect_image_files, exit_codes, output_names, BatchError, BatchProcessor, Cli,
    CliOverrides, Commands, Config, FileStatus, ImageSplitter, OutputMode, ProcessingStage,
    ProgressCallback, ProgressTracker, RegionsArgs, SplitArgs, SplitConfig, SplitError,
};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Split(args) => {
            init_logging(args.verbose, args.quiet);
            run_split(&args)
        }
        Commands::Regions(args) => {
            init_logging(args.verbose, false);
            run_regions(&args)
        }
        Commands::Info => {
            init_logging(0, false);
            run_info()
        }
    };

    std::process::exit(match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for(&e)
        }
    });
}

/// Map an error chain to a process exit code
fn exit_code_for(error: &anyhow::Error) -> i32 {
    for cause in error.chain() {
        match cause.downcast_ref::<BatchError>() {
            Some(BatchError::InputNotFound(_)) => return exit_codes::INPUT_NOT_FOUND,
            Some(BatchError::FilesFailed { .. }) => return exit_codes::PROCESSING_ERROR,
            _ => {}
        }
        if let Some(SplitError::ImageNotFound(_)) = cause.downcast_ref::<SplitError>() {
            return exit_codes::INPUT_NOT_FOUND;
        }
        if cause.is::<photo_splitter::ConfigError>() {
            return exit_codes::INVALID_ARGS;
        }
        if cause.is::<SplitError>() {
            return exit_codes::PROCESSING_ERROR;
        }
    }
    exit_codes::GENERAL_ERROR
}

/// Install the stderr log subscriber
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}

// ============ Progress Callback Implementation ============

/// Stage events as debug logs.
///
/// Batch workers log inside a per-file span, so each line names its input
/// even when several files are split at once. Shown from `-vv` on.
struct LogProgress;

impl ProgressCallback for LogProgress {
    fn on_step_start(&self, stage: ProcessingStage) {
        debug!("{}", stage);
    }

    fn on_step_progress(&self, current: usize, total: usize) {
        trace!(current, total, "progress");
    }

    fn on_step_complete(&self, stage: ProcessingStage, message: &str) {
        debug!("{}: {}", stage.name(), message);
    }

    fn on_debug(&self, message: &str) {
        debug!("{}", message);
    }
}

// ============ Split Command ============

fn run_split(args: &SplitArgs) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let mode = if args.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::from_verbosity(args.verbose)
    };

    let files = collect_image_files(&args.input)?;
    if files.is_empty() {
        return Err(BatchError::InputNotFound(args.input.clone()))
            .context("no supported images found");
    }

    let config = load_config(&args.detection, &args.overrides())?;

    if args.dry_run {
        print_execution_plan(args, &files, &config);
        return Ok(());
    }

    let processor = BatchProcessor::new(config).with_progress_bar(mode == OutputMode::Normal);
    let summary = processor.run_with_progress(&files, &args.output, &LogProgress)?;

    if mode.should_show(OutputMode::Verbose) {
        for report in &summary.reports {
            match &report.status {
                FileStatus::Split { regions, .. } => {
                    println!("{}: {} region(s)", report.input.display(), regions)
                }
                FileStatus::Skipped => println!("{}: skipped", report.input.display()),
                FileStatus::Failed(e) => println!("{}: FAILED ({})", report.input.display(), e),
            }
        }
    }

    if mode.should_show(OutputMode::Normal) {
        ProgressTracker::print_summary(
            summary.total(),
            summary.succeeded(),
            summary.skipped(),
            summary.failed(),
            summary.region_count(),
        );
        println!("Total time: {:.2}s", start_time.elapsed().as_secs_f64());
    }

    summary.into_result()?;
    Ok(())
}

/// Load the config file (explicit or discovered) and apply CLI overrides
fn load_config(detection: &DetectionArgs, overrides: &CliOverrides) -> anyhow::Result<SplitConfig> {
    let file_config = match &detection.config {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load()?,
    };
    Ok(file_config.merge_with_cli(overrides))
}

/// Print execution plan for dry-run mode
fn print_execution_plan(args: &SplitArgs, files: &[PathBuf], config: &SplitConfig) {
    let d = &config.detection;
    println!("=== Dry Run - Execution Plan ===");
    println!();
    println!("Input: {}", args.input.display());
    println!("Output: {}", args.output.display());
    println!("Files to process: {}", files.len());
    println!();
    println!("Detection:");
    println!("  Tolerance: {}", d.tolerance_percentage);
    println!("  Labeling: {:?} (search factor {})", d.labeling, d.search_margin_factor);
    println!("  Merge: {:?} (dilation {}px)", d.merge, d.dilation_margin);
    println!(
        "  Minimum region: {}x{}px",
        d.min_region_width, d.min_region_height
    );
    println!();
    println!("Output:");
    println!("  Format: {:?}", config.format);
    println!("  JPEG quality: {}", config.jpeg_quality);
    println!("  Debug overlay: {}", if config.save_debug { "YES" } else { "NO" });
    println!("  Skip existing: {}", if config.skip_existing { "YES" } else { "NO" });
    println!("  Threads: {}", config.effective_threads());
    println!();
    println!("Effective config: {}", config.to_json());
    println!();
    println!("Files:");
    let splitter = ImageSplitter::new(config.clone());
    for (i, (file, name)) in files.iter().zip(output_names(files)).enumerate() {
        println!(
            "  {}. {} -> {}",
            i + 1,
            file.display(),
            splitter.output_path(&name, &args.output, 0).display()
        );
    }
}

// ============ Regions Command ============

fn run_regions(args: &RegionsArgs) -> anyhow::Result<()> {
    let config = load_config(&args.detection, &args.detection.overrides())?;
    let splitter = ImageSplitter::new(config);
    let detection = splitter.detect_file(&args.image)?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&detection)?
    } else {
        serde_json::to_string(&detection)?
    };
    println!("{}", json);
    Ok(())
}

// ============ Info Command ============

fn run_info() -> anyhow::Result<()> {
    println!("photo-splitter v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("System Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);
    println!("  CPUs: {}", num_cpus::get());
    println!();
    println!("Supported input extensions:");
    println!("  {}", photo_splitter::batch::SUPPORTED_EXTENSIONS.join(", "));
    println!();
    println!("Config File Locations:");
    for path in Config::search_paths() {
        println!("  {} {}", path.display(), config_marker(&path));
    }
    Ok(())
}

fn config_marker(path: &Path) -> &'static str {
    if path.is_file() {
        "(found)"
    } else {
        "(not found)"
    }
}
