use std::{
    panic::AssertUnwindSafe,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use rayon::prelude::*;

use crate::{
    UncropError, UncropResult,
    assets::{decode::decode_path, formats::FormatSupport},
    batch::{
        discover::{discover, filter_supported, find_collisions, output_path_for},
        report::{
            FailureStage, ItemFailure, ItemOutcome, ItemSuccess, RunReport, SkipReason,
            SkippedFile,
        },
    },
    compose::compose,
    config::{CollisionPolicy, ComposeConfig, UncropConfig},
    encode::{encode_jpeg, write_atomic},
    normalize::normalize,
};

#[derive(Clone, Debug, PartialEq, Eq)]
struct WorkItem {
    source: PathBuf,
    output: PathBuf,
}

/// A planned batch: inputs discovered and filtered, outputs named, collisions resolved.
///
/// Nothing has been written yet; [`run`] creates the output directory and dispatches.
#[derive(Clone, Debug)]
pub struct BatchJob {
    input_dir: PathBuf,
    output_dir: PathBuf,
    config: UncropConfig,
    compose: ComposeConfig,
    support: FormatSupport,
    items: Vec<WorkItem>,
    skipped: Vec<SkippedFile>,
    rejected: Vec<ItemFailure>,
    cancel: Option<Arc<AtomicBool>>,
}

impl BatchJob {
    /// Discover and filter `input_dir`. Fails only on invalid configuration.
    pub fn plan(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        config: UncropConfig,
        support: &FormatSupport,
    ) -> UncropResult<Self> {
        let input_dir = input_dir.into();
        let output_dir = output_dir.into();
        let compose = config.compose_config()?;

        let filtered = filter_supported(discover(&input_dir)?, support);
        if !filtered.skipped.is_empty() {
            tracing::warn!(
                count = filtered.skipped.len(),
                "skipping HEIF/HEIC inputs: no decoder available (install '{}')",
                config.heif_decoder
            );
        }
        if !filtered.ignored.is_empty() {
            tracing::debug!(count = filtered.ignored.len(), "ignored non-image files");
        }

        let mut pairs = Vec::with_capacity(filtered.accepted.len());
        for source in filtered.accepted {
            let output = output_path_for(&source, &output_dir, &config.output_suffix)?;
            pairs.push((source, output));
        }

        let mut rejected = Vec::new();
        let collisions = find_collisions(&pairs);
        for (output, inputs) in &collisions {
            match config.collisions {
                CollisionPolicy::Overwrite => {}
                CollisionPolicy::Warn => tracing::warn!(
                    output = %output.display(),
                    inputs = inputs.len(),
                    "several inputs map to the same output; last writer wins"
                ),
                CollisionPolicy::Fail => {
                    for input in inputs.iter().skip(1) {
                        rejected.push(ItemFailure {
                            source: input.clone(),
                            stage: FailureStage::Collision,
                            detail: format!(
                                "output '{}' already claimed by '{}'",
                                output.display(),
                                inputs[0].display()
                            ),
                        });
                    }
                }
            }
        }

        let items = pairs
            .into_iter()
            .filter(|(source, _)| !rejected.iter().any(|r| &r.source == source))
            .map(|(source, output)| WorkItem { source, output })
            .collect();

        Ok(Self {
            input_dir,
            output_dir,
            config,
            compose,
            support: support.clone(),
            items,
            skipped: filtered.skipped,
            rejected,
            cancel: None,
        })
    }

    /// Items not yet started are skipped once `flag` is set. In-flight items finish.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn config(&self) -> &UncropConfig {
        &self.config
    }

    pub fn support(&self) -> &FormatSupport {
        &self.support
    }

    /// Inputs that will be dispatched, in discovery order.
    pub fn inputs(&self) -> impl Iterator<Item = &Path> {
        self.items.iter().map(|i| i.source.as_path())
    }

    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    /// Inputs refused before dispatch (output-name collisions under the `fail` policy).
    pub fn rejected(&self) -> &[ItemFailure] {
        &self.rejected
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Plan and run a batch in one call.
pub fn run_batch(
    input_dir: impl Into<PathBuf>,
    output_dir: impl Into<PathBuf>,
    config: UncropConfig,
    support: &FormatSupport,
) -> UncropResult<RunReport> {
    let job = BatchJob::plan(input_dir, output_dir, config, support)?;
    run(&job)
}

pub fn run(job: &BatchJob) -> UncropResult<RunReport> {
    run_with_observer(job, &ignore_outcome)
}

fn ignore_outcome(_: &ItemOutcome) {}

/// Run `job`, calling `observer` from the worker threads as each item reaches a terminal
/// state. Blocks until every item is terminal.
///
/// Only configuration problems (including an output directory that cannot be created)
/// return `Err`; per-item errors and panics are recorded in the report.
pub fn run_with_observer(
    job: &BatchJob,
    observer: &(dyn Fn(&ItemOutcome) + Sync),
) -> UncropResult<RunReport> {
    std::fs::create_dir_all(&job.output_dir).map_err(|e| {
        UncropError::config(format!(
            "create output directory '{}': {e}",
            job.output_dir.display()
        ))
    })?;

    let pool = build_thread_pool(job.config.workers)?;
    let mut report = RunReport::new(pool.current_num_threads());
    tracing::info!(
        input = %job.input_dir.display(),
        output = %job.output_dir.display(),
        items = job.items.len(),
        workers = report.workers,
        "starting batch"
    );

    for skipped in &job.skipped {
        let outcome = ItemOutcome::Skipped(skipped.clone());
        observer(&outcome);
        report.push(outcome);
    }
    for rejected in &job.rejected {
        tracing::warn!(source = %rejected.source.display(), detail = %rejected.detail, "rejected");
        let outcome = ItemOutcome::Failed(rejected.clone());
        observer(&outcome);
        report.push(outcome);
    }

    let outcomes: Vec<ItemOutcome> = pool.install(|| {
        job.items
            .par_iter()
            .with_max_len(1)
            .map(|item| {
                let outcome = run_item(job, item);
                observer(&outcome);
                outcome
            })
            .collect()
    });
    for outcome in outcomes {
        report.push(outcome);
    }

    tracing::info!(
        succeeded = report.succeeded_count(),
        failed = report.failed_count(),
        skipped = report.skipped_count(),
        "batch finished"
    );
    Ok(report)
}

fn run_item(job: &BatchJob, item: &WorkItem) -> ItemOutcome {
    if job.is_cancelled() {
        return ItemOutcome::Skipped(SkippedFile {
            path: item.source.clone(),
            reason: SkipReason::Cancelled,
        });
    }

    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
        process_file(
            &item.source,
            &item.output,
            &job.compose,
            job.config.jpeg_quality,
            &job.support,
        )
    }));

    match result {
        Ok(Ok(success)) => {
            tracing::info!(
                source = %success.source.display(),
                output = %success.output.display(),
                "wrote"
            );
            ItemOutcome::Succeeded(success)
        }
        Ok(Err(err)) => {
            tracing::warn!(source = %item.source.display(), error = %err, "item failed");
            ItemOutcome::Failed(ItemFailure::from_error(item.source.clone(), &err))
        }
        Err(payload) => {
            let detail = panic_message(payload.as_ref());
            tracing::error!(source = %item.source.display(), %detail, "item panicked");
            ItemOutcome::Failed(ItemFailure {
                source: item.source.clone(),
                stage: FailureStage::Panic,
                detail,
            })
        }
    }
}

/// Decode, normalize, compose, encode and atomically write one image.
#[tracing::instrument(skip_all, fields(source = %source.display()))]
pub fn process_file(
    source: &Path,
    output: &Path,
    compose_cfg: &ComposeConfig,
    jpeg_quality: u8,
    support: &FormatSupport,
) -> UncropResult<ItemSuccess> {
    let raw = decode_path(source, support)?;
    let normalized = normalize(raw)?;
    let canvas = compose(&normalized, compose_cfg)?;
    drop(normalized);
    let bytes = encode_jpeg(&canvas, jpeg_quality)?;
    write_atomic(&bytes, output)?;

    Ok(ItemSuccess {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        placement: canvas.placement,
    })
}

fn build_thread_pool(threads: Option<usize>) -> UncropResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(UncropError::config("workers must be >= 1 when set"));
    }

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("uncrop-worker-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| UncropError::config(format!("failed to build worker pool: {e}")))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
