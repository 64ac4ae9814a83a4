use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::{
    UncropError, UncropResult,
    assets::formats::{FormatSupport, InputFormat},
    batch::report::{SkipReason, SkippedFile},
    config::OUTPUT_EXTENSION,
};

/// Regular files directly under `input_dir`, sorted by name. Subdirectories are not entered.
pub fn discover(input_dir: &Path) -> UncropResult<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        return Err(UncropError::config(format!(
            "input directory '{}' does not exist or is not a directory",
            input_dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Split discovered files by format capability.
#[derive(Clone, Debug, Default)]
pub struct Filtered {
    pub accepted: Vec<PathBuf>,
    /// Recognized images whose optional decoder is missing.
    pub skipped: Vec<SkippedFile>,
    /// Files that are not images at all; not reported.
    pub ignored: Vec<PathBuf>,
}

pub fn filter_supported(paths: Vec<PathBuf>, support: &FormatSupport) -> Filtered {
    let mut out = Filtered::default();
    for path in paths {
        match InputFormat::from_path(&path) {
            Some(format) if support.supports(format) => out.accepted.push(path),
            Some(format) => out.skipped.push(SkippedFile {
                path,
                reason: SkipReason::DecoderUnavailable(format),
            }),
            None => out.ignored.push(path),
        }
    }
    out
}

/// `<output_dir>/<input stem><suffix>.jpg`, whatever the input's own extension.
pub fn output_path_for(input: &Path, output_dir: &Path, suffix: &str) -> UncropResult<PathBuf> {
    let stem = input.file_stem().ok_or_else(|| {
        UncropError::config(format!("'{}' has no file name", input.display()))
    })?;
    Ok(output_dir.join(format!(
        "{}{suffix}.{OUTPUT_EXTENSION}",
        stem.to_string_lossy()
    )))
}

/// Output paths claimed by more than one input, each with its inputs in discovery order.
pub fn find_collisions(pairs: &[(PathBuf, PathBuf)]) -> Vec<(PathBuf, Vec<PathBuf>)> {
    let mut by_output: HashMap<&Path, Vec<&Path>> = HashMap::new();
    for (input, output) in pairs {
        by_output.entry(output.as_path()).or_default().push(input.as_path());
    }
    let mut out: Vec<(PathBuf, Vec<PathBuf>)> = by_output
        .into_iter()
        .filter(|(_, inputs)| inputs.len() > 1)
        .map(|(output, inputs)| {
            (
                output.to_path_buf(),
                inputs.into_iter().map(Path::to_path_buf).collect(),
            )
        })
        .collect();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}
