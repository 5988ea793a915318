/// Scanner module: builds a [`StoryIndex`] from a story root.
///
/// Two entry points share one walker:
/// - [`scan_blocking`] runs on the caller's thread and returns the index.
/// - [`start_scan`] runs on a background thread and reports through a
///   bounded channel, so the UI can keep painting and offer a cancel button.
///
/// The `read_*` helpers are the plain "root in, sorted list out" functions
/// the browse views are defined in terms of. Each call is a full rescan.
pub mod progress;
mod walk;

use crate::error::{CoreError, Result};
use crate::model::StoryIndex;
use progress::ScanProgress;
use walk::WalkOutcome;

use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

/// What the walker visits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ScanOptions {
    /// Skip dot-files and dot-directories (`.svn`, `.git`).
    pub skip_hidden: bool,
    pub follow_links: bool,
    /// Only parse files with a `.story` extension. When off, every file is
    /// parsed and badly named ones are flagged instead.
    pub story_files_only: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            skip_hidden: true,
            follow_links: false,
            story_files_only: false,
        }
    }
}

/// Handle to a running or completed scan. Allows cancellation and
/// receiving progress updates.
pub struct ScanHandle {
    /// Receiver for progress updates from the scan thread.
    pub progress_rx: Receiver<ScanProgress>,
    /// The root being scanned.
    pub root: PathBuf,
    cancel_flag: Arc<AtomicBool>,
    _thread: Option<thread::JoinHandle<()>>,
}

impl ScanHandle {
    /// Request the scan to stop as soon as possible.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }
}

/// Maximum number of progress messages that may queue up in the channel.
///
/// The UI drains this channel once per frame. If it falls behind (hidden
/// window, resizing) the scanner stalls briefly rather than consuming
/// unbounded heap.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// Start a new scan on a background thread.
///
/// The final message is always one of `Complete`, `Cancelled`, or (for a
/// root that is not a directory) an `Error` followed by `Complete` with an
/// empty index.
pub fn start_scan(root: PathBuf, options: ScanOptions) -> ScanHandle {
    let (progress_tx, progress_rx) =
        crossbeam_channel::bounded::<ScanProgress>(PROGRESS_CHANNEL_CAPACITY);
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let cancel_clone = cancel_flag.clone();
    let root_clone = root.clone();

    let thread = thread::Builder::new()
        .name("storysleuth-scanner".into())
        .spawn(move || {
            info!("Starting scan of {}", root_clone.display());

            if !root_clone.is_dir() {
                let err = CoreError::NotADirectory(root_clone.clone());
                warn!("{err}");
                let _ = progress_tx.send(ScanProgress::Error {
                    path: root_clone.display().to_string(),
                    message: err.to_string(),
                });
                let _ = progress_tx.send(ScanProgress::Complete(Arc::new(StoryIndex::empty(
                    root_clone,
                ))));
                return;
            }

            match walk::scan_tree(&root_clone, &options, &cancel_clone, Some(&progress_tx)) {
                WalkOutcome::Finished(index) => {
                    info!(
                        "Scan complete: {} files, {} metatags, {} unreadable in {:?}",
                        index.stories.len(),
                        index.total_metatags(),
                        index.unreadable.len(),
                        index.duration
                    );
                    let _ = progress_tx.send(ScanProgress::Complete(Arc::new(index)));
                }
                WalkOutcome::Cancelled => {
                    info!("Scan of {} cancelled", root_clone.display());
                    let _ = progress_tx.send(ScanProgress::Cancelled);
                }
            }
        })
        .expect("failed to spawn scanner thread");

    ScanHandle {
        progress_rx,
        root,
        cancel_flag,
        _thread: Some(thread),
    }
}

/// Scan `root` on the calling thread.
pub fn scan_blocking(root: &Path, options: &ScanOptions) -> Result<StoryIndex> {
    if !root.is_dir() {
        return Err(CoreError::NotADirectory(root.to_path_buf()));
    }
    let never = AtomicBool::new(false);
    match walk::scan_tree(root, options, &never, None) {
        WalkOutcome::Finished(index) => Ok(index),
        // Unreachable with a flag nobody can set; treat as empty.
        WalkOutcome::Cancelled => Ok(StoryIndex::empty(root.to_path_buf())),
    }
}

/// Scan with default options, falling back to an empty index when the root
/// is missing so callers get placeholders rather than errors.
fn scan_or_empty(root: &Path) -> StoryIndex {
    scan_blocking(root, &ScanOptions::default()).unwrap_or_else(|err| {
        warn!("{err}");
        StoryIndex::empty(root.to_path_buf())
    })
}

/// Unique metatag lines under `root`, sorted, or `["No @metatags found"]`.
pub fn read_metatags(root: &Path) -> Vec<String> {
    scan_or_empty(root).metatag_lines()
}

/// Unique metatag keys under `root`, sorted, or
/// `["No key / value metatags found"]`.
pub fn read_metatag_keys(root: &Path) -> Vec<String> {
    scan_or_empty(root).metatag_keys()
}

/// Values of `key` under `root`. See [`StoryIndex::metatag_values`].
pub fn read_metatag_values(root: &Path, key: &str, with_stories: bool) -> Vec<String> {
    scan_or_empty(root).metatag_values(key, with_stories)
}
