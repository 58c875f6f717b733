//! Speech Dataset Preparation CLI Application

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use cv_prep::output::{format_duration, percent, preview};
use cv_prep::{
    Config, ConversionSummary, JoinOutcome, JoinStrategy, Pipeline, SplitOutcome,
    SymphoniaTranscoder, UnifiedRecord, VerificationReport,
};

/// Speech Dataset Preparation
#[derive(Parser)]
#[command(name = "cv-prep")]
#[command(about = "Convert speech clips to WAV, attach transcripts and split train/validation sets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert clips to WAV and build the complete metadata
    Convert {
        #[command(flatten)]
        join: JoinArgs,

        /// Worker threads for conversion
        #[arg(short, long)]
        threads: Option<usize>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Build the complete metadata from the clip duration table
    Metadata {
        #[command(flatten)]
        join: JoinArgs,
    },

    /// Split the complete metadata into train and validation sets
    Split {
        #[command(flatten)]
        split: SplitArgs,
    },

    /// Check the prepared dataset for missing files and split consistency
    Verify,

    /// Convert, split and verify in one go
    Run {
        #[command(flatten)]
        join: JoinArgs,

        #[command(flatten)]
        split: SplitArgs,

        /// Worker threads for conversion
        #[arg(short, long)]
        threads: Option<usize>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },
}

#[derive(Args)]
struct JoinArgs {
    /// Join strategy (auto, exact, substring)
    #[arg(short, long)]
    strategy: Option<String>,

    /// Take the first substring match without flagging ambiguity
    #[arg(long)]
    legacy_first_match: bool,
}

#[derive(Args)]
struct SplitArgs {
    /// Fraction of records assigned to train
    #[arg(short, long)]
    ratio: Option<f64>,

    /// Shuffle seed
    #[arg(long)]
    seed: Option<u64>,
}

impl JoinArgs {
    fn apply(self, config: &mut Config) -> Result<()> {
        if let Some(strategy) = self.strategy {
            config.join.strategy = strategy.parse::<JoinStrategy>()?;
        }
        if self.legacy_first_match {
            config.join.legacy_first_match = true;
        }
        Ok(())
    }
}

impl SplitArgs {
    fn apply(self, config: &mut Config) {
        if let Some(ratio) = self.ratio {
            config.split.ratio = ratio;
        }
        if let Some(seed) = self.seed {
            config.split.seed = seed;
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Per-file failures are warnings, so show those by default
    let log_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    // Load configuration
    let mut config = if let Some(ref config_path) = cli.config {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        Config::default()
    };

    match cli.command {
        Commands::Convert {
            join,
            threads,
            no_progress,
        } => {
            join.apply(&mut config)?;
            apply_convert_overrides(&mut config, threads, no_progress);
            let pipeline = Pipeline::new(config)?;
            convert(&pipeline)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Metadata { join } => {
            join.apply(&mut config)?;
            let pipeline = Pipeline::new(config)?;
            build_metadata(&pipeline)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Split { split } => {
            split.apply(&mut config);
            let pipeline = Pipeline::new(config)?;
            split_dataset(&pipeline)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Verify => {
            let pipeline = Pipeline::new(config)?;
            verify_dataset(&pipeline)
        }
        Commands::Run {
            join,
            split,
            threads,
            no_progress,
        } => {
            join.apply(&mut config)?;
            split.apply(&mut config);
            apply_convert_overrides(&mut config, threads, no_progress);
            let pipeline = Pipeline::new(config)?;

            println!("Step 1: Converting clips and building metadata...");
            convert(&pipeline)?;
            println!("\nStep 2: Splitting dataset...");
            split_dataset(&pipeline)?;
            println!("\nStep 3: Verifying dataset...");
            verify_dataset(&pipeline)
        }
    }
}

fn apply_convert_overrides(config: &mut Config, threads: Option<usize>, no_progress: bool) {
    if let Some(threads) = threads {
        config.convert.threads = threads;
    }
    if no_progress {
        config.convert.show_progress = false;
    }
}

/// Transcode clips and write the complete metadata
fn convert(pipeline: &Pipeline) -> Result<()> {
    let paths = &pipeline.config().paths;
    let transcoder = SymphoniaTranscoder::new(pipeline.config().convert.encoding);
    let outcome = pipeline.convert(&transcoder).with_context(|| {
        format!(
            "Failed to convert clips from {}",
            paths.audio_input_dir.display()
        )
    })?;

    print_conversion(&outcome.conversion);
    print_join(&outcome.join);
    println!("Converted files are in: {}", paths.audio_output_dir.display());
    println!(
        "Metadata files are in: {}",
        pipeline.store().dir().display()
    );
    Ok(())
}

/// Build the complete metadata from the duration table
fn build_metadata(pipeline: &Pipeline) -> Result<()> {
    let outcome = pipeline
        .metadata_from_durations()
        .context("Failed to build complete metadata")?;
    print_join(&outcome);
    Ok(())
}

fn split_dataset(pipeline: &Pipeline) -> Result<()> {
    let SplitOutcome { split, summary } = pipeline
        .split()
        .context("Failed to split dataset")?;

    println!("Total samples: {}", summary.total_files);
    println!(
        "Training samples: {} ({:.1}%)",
        summary.train_files,
        percent(summary.train_files, summary.total_files)
    );
    println!(
        "Validation samples: {} ({:.1}%)",
        summary.val_files,
        percent(summary.val_files, summary.total_files)
    );

    println!("\nSample training entries:");
    print_samples(&split.train, 3);
    println!("\nSample validation entries:");
    print_samples(&split.val, 3);
    Ok(())
}

fn verify_dataset(pipeline: &Pipeline) -> Result<ExitCode> {
    let report = pipeline
        .verify()
        .context("Failed to verify dataset")?;
    print_report(&report);

    if report.is_ok() {
        println!("\nDataset is ready for use!");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("\nDataset verification failed!");
        Ok(ExitCode::FAILURE)
    }
}

fn print_conversion(summary: &ConversionSummary) {
    let total_ms: u64 = summary.records.iter().map(|r| r.duration_ms).sum();
    println!(
        "Successfully converted {} of {} files ({} audio)",
        summary.records.len(),
        summary.attempted(),
        format_duration(total_ms)
    );
    for failure in &summary.failures {
        println!("  Error converting {}: {}", failure.file, failure.reason);
    }
}

fn print_join(outcome: &JoinOutcome) {
    println!(
        "Created complete metadata for {} audio files",
        outcome.records.len()
    );
    println!(
        "Found text for {} files ({:.1}%)",
        outcome.matched,
        outcome.coverage_percent()
    );
    if !outcome.ambiguous.is_empty() {
        println!(
            "Warning: {} files matched more than one transcript (first match used)",
            outcome.ambiguous.len()
        );
    }
    if !outcome.duplicates.is_empty() {
        println!(
            "Warning: {} duplicate audio entries ignored",
            outcome.duplicates.len()
        );
    }

    println!("\nSample entries:");
    print_samples(&outcome.records, 5);
}

fn print_samples(records: &[UnifiedRecord], count: usize) {
    for record in records.iter().take(count) {
        println!("  {}: {}", record.file_name, preview(&record.text, 50));
    }
}

fn print_report(report: &VerificationReport) {
    println!("Found {} audio files", report.audio_files_found);
    println!("Complete metadata contains {} entries", report.total_records);

    if report.missing_text() > 0 {
        println!(
            "Warning: {} entries missing text content",
            report.missing_text()
        );
    } else {
        println!("All entries have text content");
    }

    println!("Training set: {} samples", report.train_count);
    println!("Validation set: {} samples", report.val_count);
    println!("Total: {} samples", report.train_count + report.val_count);

    if report.missing_files.is_empty() {
        println!("All audio files present");
    } else {
        println!("Error: {} audio files missing", report.missing_files.len());
        for name in report.missing_files.iter().take(10) {
            println!("  {}", name);
        }
    }
    if !report.duplicate_records.is_empty() {
        println!(
            "Error: {} duplicate entries in complete metadata",
            report.duplicate_records.len()
        );
    }
    if !report.split_consistent {
        println!(
            "Error: train/validation split inconsistent ({} overlapping, {} unknown)",
            report.overlapping.len(),
            report.unknown.len()
        );
    }

    println!("\nSummary:");
    println!(
        "- Training samples: {} ({:.1}%)",
        report.train_count,
        percent(report.train_count, report.total_records)
    );
    println!(
        "- Validation samples: {} ({:.1}%)",
        report.val_count,
        percent(report.val_count, report.total_records)
    );
    println!("- Text coverage: {:.1}%", report.coverage_percent);
}
