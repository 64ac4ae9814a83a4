use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

static SEQ: AtomicU64 = AtomicU64::new(0);

/// A file name unique within this process, suitable for scratch files shared by
/// concurrent workers.
pub(crate) fn scratch_name(stem: &str, ext: &str) -> String {
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    format!(".{stem}.uncrop-{}-{seq}.{ext}", std::process::id())
}

/// Scratch path placed next to `target`, so a rename onto `target` stays on one filesystem.
pub(crate) fn sibling_scratch_path(target: &Path) -> PathBuf {
    let stem = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string());
    let name = scratch_name(&stem, "tmp");
    match target.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Removes the wrapped path on drop unless disarmed.
pub(crate) struct TempFileGuard(pub(crate) Option<PathBuf>);

impl TempFileGuard {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self(Some(path))
    }

    pub(crate) fn path(&self) -> Option<&Path> {
        self.0.as_deref()
    }

    /// Keep the file; used once it has been renamed into place.
    pub(crate) fn disarm(&mut self) {
        self.0 = None;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}
