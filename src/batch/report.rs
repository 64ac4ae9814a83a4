use std::{fmt, path::PathBuf};

use crate::{UncropError, assets::formats::InputFormat, layout::Placement};

/// Pipeline stage an item failed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Decode,
    Encode,
    Write,
    /// Another input already claimed the same output name.
    Collision,
    /// The item's worker panicked; the batch carried on.
    Panic,
    Internal,
}

impl FailureStage {
    pub fn of(err: &UncropError) -> Self {
        match err {
            UncropError::Decode(_) | UncropError::UnsupportedFormat(_) => Self::Decode,
            UncropError::Encode(_) => Self::Encode,
            UncropError::Write(_) => Self::Write,
            UncropError::Config(_) | UncropError::Other(_) => Self::Internal,
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Decode => "decode",
            Self::Encode => "encode",
            Self::Write => "write",
            Self::Collision => "collision",
            Self::Panic => "panic",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct ItemSuccess {
    pub source: PathBuf,
    pub output: PathBuf,
    pub placement: Placement,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct ItemFailure {
    pub source: PathBuf,
    pub stage: FailureStage,
    pub detail: String,
}

impl ItemFailure {
    pub fn from_error(source: PathBuf, err: &UncropError) -> Self {
        Self {
            source,
            stage: FailureStage::of(err),
            detail: err.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Recognized format whose optional decoder is not installed.
    DecoderUnavailable(#[serde(serialize_with = "serialize_format")] InputFormat),
    /// The batch was cancelled before this item started.
    Cancelled,
}

fn serialize_format<S: serde::Serializer>(f: &InputFormat, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(f.name())
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DecoderUnavailable(format) => write!(f, "no {} decoder available", format.name()),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Terminal state of one input.
#[derive(Clone, Debug)]
pub enum ItemOutcome {
    Succeeded(ItemSuccess),
    Failed(ItemFailure),
    Skipped(SkippedFile),
}

impl ItemOutcome {
    pub fn source(&self) -> &std::path::Path {
        match self {
            Self::Succeeded(s) => &s.source,
            Self::Failed(f) => &f.source,
            Self::Skipped(s) => &s.path,
        }
    }
}

/// Aggregated result of a batch run. Item order follows completion collection, not
/// discovery, and carries no meaning.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct RunReport {
    pub workers: usize,
    pub succeeded: Vec<ItemSuccess>,
    pub failed: Vec<ItemFailure>,
    pub skipped: Vec<SkippedFile>,
}

impl RunReport {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    pub fn push(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Succeeded(s) => self.succeeded.push(s),
            ItemOutcome::Failed(f) => self.failed.push(f),
            ItemOutcome::Skipped(s) => self.skipped.push(s),
        }
    }

    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn total(&self) -> usize {
        self.succeeded_count() + self.failed_count() + self.skipped_count()
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{} succeeded, {} failed, {} skipped",
            self.succeeded_count(),
            self.failed_count(),
            self.skipped_count()
        )
    }
}
