//! The conversion pipeline.
//!
//! Enumerates annotation files, puts them in random order, validates each
//! one and streams the resulting records into shard files. The run is
//! fail-fast: the first rejected annotation aborts it, leaving the output
//! directory incomplete.

mod report;

pub use report::PipelineReport;

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};
use walkdir::WalkDir;

use crate::error::FacerecordsError;
use crate::ir::io_annotation_json::read_annotation;
use crate::shard::{reset_output_directory, ShardPlan, ShardWriter};
use crate::validation::validate_and_normalize;

const ANNOTATION_EXTENSION: &str = "json";

/// Options for one conversion run.
#[derive(Clone, Debug)]
pub struct PipelineOptions {
    /// Directory the annotation `filename` fields are resolved against.
    pub image_dir: PathBuf,
    /// Directory holding one JSON annotation per image.
    pub annotations_dir: PathBuf,
    /// Output directory. Deleted and recreated by every run.
    pub output_dir: PathBuf,
    /// Requested number of shards (at least 1).
    pub num_shards: usize,
    /// Seed for the processing order. `None` gives a different order on
    /// every run.
    pub seed: Option<u64>,
}

/// Lists the annotation files directly inside `dir`, sorted by path.
///
/// Only regular files with a `.json` extension are returned; subdirectories
/// are not descended into.
pub fn list_annotation_files(dir: &Path) -> Result<Vec<PathBuf>, FacerecordsError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry.map_err(|source| FacerecordsError::ListDirectory {
            path: dir.to_path_buf(),
            message: source.to_string(),
        })?;

        let is_json = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(ANNOTATION_EXTENSION));

        if entry.file_type().is_file() && is_json {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Applies a uniform random permutation to `entries`.
pub fn shuffle_entries<T, R: Rng + ?Sized>(entries: &mut [T], rng: &mut R) {
    entries.shuffle(rng);
}

/// Fails if `output` is, contains, or is inside one of the input directories.
///
/// The output directory is deleted at the start of every run, so pointing it
/// at the inputs would destroy them.
pub fn check_output_location(opts: &PipelineOptions) -> Result<(), FacerecordsError> {
    let output = comparable_path(&opts.output_dir);

    for input in [&opts.image_dir, &opts.annotations_dir] {
        let candidate = comparable_path(input);
        if output.starts_with(&candidate) || candidate.starts_with(&output) {
            return Err(FacerecordsError::OutputOverlapsInput {
                output: opts.output_dir.clone(),
                input: input.clone(),
            });
        }
    }

    Ok(())
}

/// Runs the pipeline, drawing the processing order from `opts.seed`.
///
/// With a seed the run is reproducible: same inputs and seed give
/// byte-identical shards. Without one the thread RNG is used.
pub fn run_pipeline(opts: &PipelineOptions) -> Result<PipelineReport, FacerecordsError> {
    match opts.seed {
        Some(seed) => run_pipeline_with_rng(opts, &mut StdRng::seed_from_u64(seed)),
        None => run_pipeline_with_rng(opts, &mut rand::rng()),
    }
}

/// Runs the pipeline with a caller-supplied random source.
///
/// **Destructive:** `opts.output_dir` is removed and recreated before any
/// record is written.
pub fn run_pipeline_with_rng<R: Rng + ?Sized>(
    opts: &PipelineOptions,
    rng: &mut R,
) -> Result<PipelineReport, FacerecordsError> {
    tracing::info!(path = %opts.image_dir.display(), "reading images");
    tracing::info!(path = %opts.annotations_dir.display(), "reading annotations");

    let mut entries = list_annotation_files(&opts.annotations_dir)?;
    let plan = ShardPlan::new(entries.len(), opts.num_shards)?;
    check_output_location(opts)?;

    shuffle_entries(&mut entries, rng);
    tracing::info!(
        images = plan.total,
        per_shard = plan.capacity,
        shards = plan.shard_count(),
        "planned shards"
    );

    reset_output_directory(&opts.output_dir)?;
    let mut writer = ShardWriter::new(&opts.output_dir, plan);

    for path in &entries {
        let record = read_annotation(path)
            .and_then(|annotation| validate_and_normalize(&annotation, &opts.image_dir))
            .map_err(|err| err.in_annotation(path))?;

        writer
            .write(&record)
            .map_err(|err| err.in_annotation(path))?;
    }

    let shards = writer.finish()?;
    tracing::info!(path = %opts.output_dir.display(), "result written");

    Ok(PipelineReport {
        total_records: plan.total,
        requested_shards: plan.requested_shards,
        capacity: plan.capacity,
        seed: opts.seed,
        output_dir: opts.output_dir.clone(),
        shards,
    })
}

// Canonicalizes the longest existing prefix so a not-yet-created output
// directory still compares correctly against existing inputs.
fn comparable_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();

    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, part| acc.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return absolute,
        }
    }
}
