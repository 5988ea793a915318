/// Story tree walker: `jwalk` traversal followed by `rayon`-parallel parsing.
///
/// The walk runs first and only collects file paths, so cancellation and
/// progress are cheap to check. Parsing is embarrassingly parallel: each file
/// is read and parsed on its own with no shared state beyond two counters.
use crate::model::{StoryFile, StoryIndex, UnreadableFile};
use crate::scanner::progress::ScanProgress;
use crate::scanner::ScanOptions;
use crossbeam_channel::Sender;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;
use tracing::debug;

/// Send an `Update` every this many files, during both walk and parse.
const UPDATE_INTERVAL: u64 = 64;

/// How a walk ended.
pub(crate) enum WalkOutcome {
    Finished(StoryIndex),
    Cancelled,
}

/// Walk `root` and parse every matching file.
///
/// `progress` is `None` for blocking scans that nobody is watching.
pub(crate) fn scan_tree(
    root: &Path,
    options: &ScanOptions,
    cancel_flag: &AtomicBool,
    progress: Option<&Sender<ScanProgress>>,
) -> WalkOutcome {
    let start = Instant::now();
    let mut unreadable = Vec::new();
    let mut files: Vec<PathBuf> = Vec::new();

    let walker = jwalk::WalkDir::new(root)
        .skip_hidden(options.skip_hidden)
        .follow_links(options.follow_links)
        .sort(true)
        .parallelism(jwalk::Parallelism::RayonNewPool(num_cpus::get()));

    for entry_result in walker {
        if cancel_flag.load(Ordering::Relaxed) {
            return WalkOutcome::Cancelled;
        }

        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                let message = err.to_string();
                debug!("walk error at {}: {message}", path.display());
                report_error(progress, &path, &message);
                unreadable.push(UnreadableFile { path, message });
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if options.story_files_only && !is_story_file(&path) {
            continue;
        }
        files.push(path);

        let found = files.len() as u64;
        if found.is_multiple_of(UPDATE_INTERVAL) {
            if let Some(tx) = progress {
                let _ = tx.send(ScanProgress::Update {
                    files_found: found,
                    files_parsed: 0,
                    current_path: files[files.len() - 1].display().to_string(),
                });
            }
        }
    }

    let files_found = files.len() as u64;
    let parsed = AtomicU64::new(0);

    let results: Vec<Option<Result<StoryFile, UnreadableFile>>> = files
        .into_par_iter()
        .map(|path| {
            if cancel_flag.load(Ordering::Relaxed) {
                return None;
            }
            let result = parse_file(root, path);
            let done = parsed.fetch_add(1, Ordering::Relaxed) + 1;
            if done.is_multiple_of(UPDATE_INTERVAL) {
                if let Some(tx) = progress {
                    let current_path = match &result {
                        Ok(story) => story.relative.clone(),
                        Err(bad) => bad.path.display().to_string(),
                    };
                    let _ = tx.send(ScanProgress::Update {
                        files_found,
                        files_parsed: done,
                        current_path,
                    });
                }
            }
            Some(result)
        })
        .collect();

    if cancel_flag.load(Ordering::Relaxed) {
        return WalkOutcome::Cancelled;
    }

    let mut stories = Vec::with_capacity(results.len());
    for result in results.into_iter().flatten() {
        match result {
            Ok(story) => stories.push(story),
            Err(bad) => {
                report_error(progress, &bad.path, &bad.message);
                unreadable.push(bad);
            }
        }
    }

    stories.sort_by(|a, b| a.relative.cmp(&b.relative));
    unreadable.sort_by(|a, b| a.path.cmp(&b.path));

    let mut index = StoryIndex::empty(root.to_path_buf());
    index.stories = stories;
    index.unreadable = unreadable;
    index.duration = start.elapsed();
    WalkOutcome::Finished(index)
}

/// Read and parse one file. Bytes that are not valid UTF-8 are replaced,
/// so legacy-encoded stories still yield their ASCII metatags.
fn parse_file(root: &Path, path: PathBuf) -> Result<StoryFile, UnreadableFile> {
    match std::fs::read(&path) {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes);
            let relative = relative_path(root, &path);
            Ok(StoryFile::parse(path, relative, &text))
        }
        Err(err) => Err(UnreadableFile {
            message: err.to_string(),
            path,
        }),
    }
}

/// `/`-separated path of `path` below `root`.
pub(crate) fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_story_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("story"))
}

fn report_error(progress: Option<&Sender<ScanProgress>>, path: &Path, message: &str) {
    if let Some(tx) = progress {
        let _ = tx.send(ScanProgress::Error {
            path: path.display().to_string(),
            message: message.to_string(),
        });
    }
}
