/// Scan progress reporting: lightweight messages sent from the scan
/// thread to the UI thread via a crossbeam channel.
use crate::model::StoryIndex;
use std::sync::Arc;

/// Progress updates sent from the scan thread to the UI.
#[derive(Debug)]
pub enum ScanProgress {
    /// Periodic update with running totals.
    Update {
        /// Files discovered by the walk so far.
        files_found: u64,
        /// Files read and parsed so far.
        files_parsed: u64,
        current_path: String,
    },
    /// A non-fatal error (unreadable directory or file).
    Error { path: String, message: String },
    /// Scanning completed; the index is final and immutable.
    Complete(Arc<StoryIndex>),
    /// Scan was cancelled by the user.
    Cancelled,
}
