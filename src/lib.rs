//! facerecords: face annotations to sharded TFRecord files.
//!
//! Reads a directory of JPEG images and a directory of per-image JSON
//! annotations (one face box plus five landmarks each), validates and
//! normalizes every annotation, and writes the results as `tf.Example`
//! records spread over a fixed number of shard files.
//!
//! # Modules
//!
//! - [`ir`]: typed geometry, annotations and records
//! - [`validation`]: annotation checks and normalization
//! - [`tfrecord`]: TFRecord framing and `tf.Example` encoding
//! - [`shard`]: shard planning and the shard writer
//! - [`pipeline`]: the end-to-end conversion run
//! - [`inspect`]: reading a shard directory back
//! - [`error`]: error types

pub mod error;
pub mod inspect;
pub mod ir;
pub mod pipeline;
pub mod shard;
pub mod tfrecord;
pub mod validation;

mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

pub use error::{ErrorKind, FacerecordsError};

/// The facerecords CLI application.
#[derive(Parser)]
#[command(name = "facerecords")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace). `RUST_LOG` takes precedence.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Validate annotations and write them as sharded TFRecord files.
    ///
    /// The output directory is deleted and recreated on every run.
    Convert(ConvertArgs),
    /// Check every annotation without writing anything; report all failures.
    Validate(ValidateArgs),
    /// Read a shard directory back and verify every record.
    Inspect(InspectArgs),
}

/// Arguments for the convert subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Directory containing the JPEG images.
    #[arg(short = 'i', long, env = "FACERECORDS_IMAGE_DIR")]
    image_dir: PathBuf,

    /// Directory containing one JSON annotation per image.
    #[arg(short = 'a', long, env = "FACERECORDS_ANNOTATIONS_DIR")]
    annotations_dir: PathBuf,

    /// Output directory for the shards (replaced destructively).
    #[arg(short = 'o', long, env = "FACERECORDS_OUTPUT")]
    output: PathBuf,

    /// Number of shards to split the records into.
    #[arg(
        short = 's',
        long,
        default_value_t = 1,
        env = "FACERECORDS_NUM_SHARDS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    num_shards: u64,

    /// Seed for the record order. Omit for a different order on every run.
    #[arg(long, env = "FACERECORDS_SEED")]
    seed: Option<u64>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    /// Directory containing the JPEG images.
    #[arg(short = 'i', long, env = "FACERECORDS_IMAGE_DIR")]
    image_dir: PathBuf,

    /// Directory containing one JSON annotation per image.
    #[arg(short = 'a', long, env = "FACERECORDS_ANNOTATIONS_DIR")]
    annotations_dir: PathBuf,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

/// Arguments for the inspect subcommand.
#[derive(clap::Args)]
struct InspectArgs {
    /// Directory containing `shard-NNNN.tfrecords` files.
    dir: PathBuf,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Run the facerecords CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), FacerecordsError> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    match cli.command {
        Commands::Convert(args) => run_convert(args),
        Commands::Validate(args) => run_validate(args),
        Commands::Inspect(args) => run_inspect(args),
    }
}

fn run_convert(args: ConvertArgs) -> Result<(), FacerecordsError> {
    let opts = pipeline::PipelineOptions {
        image_dir: args.image_dir,
        annotations_dir: args.annotations_dir,
        output_dir: args.output,
        num_shards: usize::try_from(args.num_shards).unwrap_or(usize::MAX),
        seed: args.seed,
    };

    let report = pipeline::run_pipeline(&opts)?;
    emit(&report, args.report)
}

fn run_validate(args: ValidateArgs) -> Result<(), FacerecordsError> {
    let files = pipeline::list_annotation_files(&args.annotations_dir)?;
    let report = validation::validate_annotations(&files, &args.image_dir);
    emit(&report, args.report)?;

    if report.is_ok() {
        Ok(())
    } else {
        Err(FacerecordsError::ValidationFailed {
            failed: report.failed_count(),
            total: report.total,
            report,
        })
    }
}

fn run_inspect(args: InspectArgs) -> Result<(), FacerecordsError> {
    let report = inspect::inspect_shards(&args.dir)?;
    emit(&report, args.report)
}

fn emit<T>(report: &T, format: ReportFormat) -> Result<(), FacerecordsError>
where
    T: Serialize + std::fmt::Display,
{
    match format {
        ReportFormat::Text => print!("{}", report),
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(report)
                .map_err(|err| FacerecordsError::Io(std::io::Error::other(err)))?;
            println!("{}", json);
        }
    }
    Ok(())
}
