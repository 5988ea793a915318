/// Application state management.
///
/// Centralises all mutable state that the UI reads and writes.
/// The scan thread and the child-process runner communicate via channels;
/// state updates happen in `process_scan_messages()` and
/// `process_run_messages()`, which run once per frame.
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use storysleuth_core::analysis::{
    build_report, coverage_matrix, render_outline, write_lines, CoverageMatrix, CoverageReport,
    OutlineKind, ReportColumn,
};
use storysleuth_core::editing::{self, BulkReport, BulkTagOp};
use storysleuth_core::model::{StoryFile, StoryIndex};
use storysleuth_core::requirements::RequirementSet;
use storysleuth_core::runner::{
    build_selenium_command, build_test_command, resolve_working_dir, start_run, CommandLine,
    Credentials, OutputStream, RunEvent, RunHandle, RunStatus, TestRunRequest,
};
use storysleuth_core::scanner::progress::ScanProgress;
use storysleuth_core::scanner::ScanHandle;
use storysleuth_core::settings::{Browser, Settings};
use tracing::{info, warn};

/// Maximum channel messages drained per frame, per channel.
pub const MAX_MESSAGES_PER_FRAME: usize = 300;

/// Console lines kept before the oldest are dropped.
pub const MAX_CONSOLE_LINES: usize = 10_000;

/// Scan errors kept for display; the count keeps going past this.
pub const MAX_SCAN_ERRORS: usize = 1_000;

/// Lines kept in the Tag tab's log.
pub const MAX_TAG_LOG_LINES: usize = 500;

/// Editor font size bounds, in points.
pub const MIN_EDITOR_FONT: f32 = 8.0;
pub const MAX_EDITOR_FONT: f32 = 32.0;

/// The current phase of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppPhase {
    /// Idle -- no scan in progress and no index yet.
    Idle,
    /// Scanning -- spinner and live counters.
    Scanning,
    /// Scan complete -- an index is available.
    Results,
}

/// The four main tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Requirements,
    Browse,
    Tag,
    Execute,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Self::Requirements, Self::Browse, Self::Tag, Self::Execute];

    pub fn label(self) -> &'static str {
        match self {
            Self::Requirements => "📋 Requirements",
            Self::Browse => "📂 Browse",
            Self::Tag => "🏷 Tag",
            Self::Execute => "▶ Execute",
        }
    }
}

/// Where a console line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleKind {
    /// Lifecycle messages written by StorySleuth itself.
    Info,
    Stdout,
    Stderr,
    Error,
}

#[derive(Debug, Clone)]
pub struct ConsoleLine {
    pub timestamp: DateTime<Local>,
    pub kind: ConsoleKind,
    pub text: String,
}

/// Test-run lifecycle as shown on the Execute tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
    Finished(RunStatus),
    /// The child could not be started.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A dismissible message shown under the toolbar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// An open story in the editor window.
#[derive(Debug, Clone)]
pub struct EditorState {
    pub path: PathBuf,
    pub title: String,
    pub text: String,
    /// Text as last loaded or saved, for the dirty check.
    saved_text: String,
    pub font_size: f32,
    pub monospace: bool,
}

impl EditorState {
    pub fn is_dirty(&self) -> bool {
        self.text != self.saved_text
    }
}

/// The settings window's working copy. List-valued fields are edited as
/// whitespace-separated text and split again on save.
#[derive(Debug, Clone)]
pub struct SettingsForm {
    pub settings: Settings,
    pub goals: String,
    pub extra_args: String,
    /// Name typed into the "new requirement category" field.
    pub new_category: String,
    /// Key typed into the "new coverage binding" field.
    pub new_binding: String,
}

impl SettingsForm {
    pub fn new(settings: Settings) -> Self {
        Self {
            goals: settings.runner.goals.join(" "),
            extra_args: settings.runner.extra_args.join(" "),
            settings,
            new_category: String::new(),
            new_binding: String::new(),
        }
    }

    pub fn into_settings(self) -> Settings {
        let mut settings = self.settings;
        settings.runner.goals = self.goals.split_whitespace().map(str::to_string).collect();
        settings.runner.extra_args = self
            .extra_args
            .split_whitespace()
            .map(str::to_string)
            .collect();
        settings
    }
}

/// Top-level application state.
pub struct AppState {
    // ── Configuration ──
    pub settings: Settings,
    pub settings_path: PathBuf,
    /// Working copy edited by the settings window; `Some` while it is open.
    pub settings_form: Option<SettingsForm>,
    pub requirements: RequirementSet,

    // ── Scan ──
    pub phase: AppPhase,
    pub scan_handle: Option<ScanHandle>,
    pub scan_files_found: u64,
    pub scan_files_parsed: u64,
    pub scan_current_path: String,
    pub scan_error_count: u64,
    pub scan_errors: Vec<(String, String)>,
    pub scan_duration: Option<Duration>,
    /// Whether the last scan was stopped; the previous index is kept.
    pub scan_was_cancelled: bool,
    pub index: Option<Arc<StoryIndex>>,

    // ── Browse ──
    pub tab: Tab,
    pub story_root_input: String,
    pub report: CoverageReport,
    pub sort_column: ReportColumn,
    pub sort_ascending: bool,
    pub selected_key: Option<String>,
    /// Show the story next to each value in the values list.
    pub values_with_stories: bool,
    pub matrix: Option<CoverageMatrix>,

    // ── Requirements ──
    pub selected_category: Option<String>,

    // ── Tag ──
    /// Relative paths queued for bulk tagging, in queue order.
    pub tag_queue: Vec<String>,
    pub tag_filter: String,
    pub tag_input: String,
    pub tag_log: VecDeque<String>,
    pub last_bulk: Option<BulkReport>,

    // ── Execute ──
    pub metafilter: String,
    pub run_user: String,
    pub run_password: String,
    pub run_browser: Browser,
    /// Restrict the run to the stories in the tag queue.
    pub run_queued_only: bool,
    /// Command preview text; edits are honoured when the run starts.
    pub command_text: String,
    pub command_edited: bool,
    pub run_phase: RunPhase,
    pub run_handle: Option<RunHandle>,
    pub run_working_dir: Option<PathBuf>,
    pub selenium_handle: Option<RunHandle>,
    pub console: VecDeque<ConsoleLine>,
    pub console_autoscroll: bool,

    // ── Windows and chrome ──
    pub editor: Option<EditorState>,
    pub notices: Vec<Notice>,
    pub show_about: bool,
    pub show_scan_errors: bool,
    pub dark_mode: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// State with default settings and no requirement files.
    pub fn new() -> Self {
        Self::with_settings(Settings::default(), Settings::default_path())
    }

    /// State for `settings`, which were read from (or will be saved to)
    /// `settings_path`. Requirement files are loaded here; no scan is started.
    pub fn with_settings(settings: Settings, settings_path: PathBuf) -> Self {
        let requirements = RequirementSet::load(&settings);
        let selected_category = requirements.categories().next().map(str::to_string);
        let run_browser = settings.runner.browser;
        let story_root_input = settings.stories_root().to_string_lossy().into_owned();

        let mut state = Self {
            settings,
            settings_path,
            settings_form: None,
            requirements,
            phase: AppPhase::Idle,
            scan_handle: None,
            scan_files_found: 0,
            scan_files_parsed: 0,
            scan_current_path: String::new(),
            scan_error_count: 0,
            scan_errors: Vec::new(),
            scan_duration: None,
            scan_was_cancelled: false,
            index: None,
            tab: Tab::Browse,
            story_root_input,
            report: CoverageReport::default(),
            sort_column: ReportColumn::Key,
            sort_ascending: true,
            selected_key: None,
            values_with_stories: false,
            matrix: None,
            selected_category,
            tag_queue: Vec::new(),
            tag_filter: String::new(),
            tag_input: String::new(),
            tag_log: VecDeque::new(),
            last_bulk: None,
            metafilter: String::new(),
            run_user: String::new(),
            run_password: String::new(),
            run_browser,
            run_queued_only: false,
            command_text: String::new(),
            command_edited: false,
            run_phase: RunPhase::Idle,
            run_handle: None,
            run_working_dir: None,
            selenium_handle: None,
            console: VecDeque::new(),
            console_autoscroll: true,
            editor: None,
            notices: Vec::new(),
            show_about: false,
            show_scan_errors: false,
            dark_mode: true,
        };
        state.refresh_command_preview();
        state
    }

    // ── Notices ─────────────────────────────────────────────────

    pub fn push_notice(&mut self, level: NoticeLevel, text: impl Into<String>) {
        let text = text.into();
        match level {
            NoticeLevel::Info => info!("{text}"),
            NoticeLevel::Warning | NoticeLevel::Error => warn!("{text}"),
        }
        self.notices.push(Notice { level, text });
    }

    pub fn dismiss_notice(&mut self, index: usize) {
        if index < self.notices.len() {
            self.notices.remove(index);
        }
    }

    // ── Scan ────────────────────────────────────────────────────

    /// Scan the configured story root.
    pub fn rescan(&mut self) {
        let root = self.settings.stories_root();
        self.start_scan(root);
    }

    /// Start a background scan of `root`, cancelling any scan in flight.
    /// The previous index stays visible until the new one arrives.
    pub fn start_scan(&mut self, root: PathBuf) {
        self.cancel_scan();
        self.phase = AppPhase::Scanning;
        self.scan_files_found = 0;
        self.scan_files_parsed = 0;
        self.scan_current_path = root.to_string_lossy().into_owned();
        self.scan_error_count = 0;
        self.scan_errors.clear();
        self.scan_duration = None;
        self.scan_was_cancelled = false;

        let handle = storysleuth_core::scanner::start_scan(root, self.settings.scan.clone());
        self.scan_handle = Some(handle);
    }

    pub fn cancel_scan(&mut self) {
        if let Some(ref handle) = self.scan_handle {
            handle.cancel();
        }
    }

    /// Point the application at a new story root and scan it.
    pub fn set_story_root(&mut self, root: PathBuf) {
        self.story_root_input = root.to_string_lossy().into_owned();
        self.settings.stories = root.clone();
        self.start_scan(self.settings.stories_root());
    }

    /// Process pending scan progress messages. Called once per frame.
    ///
    /// Returns `true` if the UI should repaint (new data arrived).
    pub fn process_scan_messages(&mut self) -> bool {
        let handle = match &self.scan_handle {
            Some(h) => h,
            None => return false,
        };

        let mut repaint = false;
        let mut messages_this_frame = 0usize;
        while messages_this_frame < MAX_MESSAGES_PER_FRAME {
            let msg = match handle.progress_rx.try_recv() {
                Ok(m) => m,
                Err(_) => break,
            };
            messages_this_frame += 1;
            repaint = true;
            match msg {
                ScanProgress::Update {
                    files_found,
                    files_parsed,
                    current_path,
                } => {
                    self.scan_files_found = files_found;
                    self.scan_files_parsed = files_parsed;
                    self.scan_current_path = current_path;
                }
                ScanProgress::Error { path, message } => {
                    self.scan_error_count += 1;
                    if self.scan_errors.len() < MAX_SCAN_ERRORS {
                        self.scan_errors.push((path, message));
                    }
                }
                ScanProgress::Complete(index) => {
                    self.scan_duration = Some(index.duration);
                    self.scan_files_found = index.stories.len() as u64;
                    self.scan_files_parsed = index.stories.len() as u64;
                    self.phase = AppPhase::Results;
                    self.install_index(index);
                    self.scan_handle = None;
                    return true;
                }
                ScanProgress::Cancelled => {
                    self.scan_was_cancelled = true;
                    self.phase = if self.index.is_some() {
                        AppPhase::Results
                    } else {
                        AppPhase::Idle
                    };
                    self.scan_handle = None;
                    return true;
                }
            }
        }
        repaint
    }

    fn install_index(&mut self, index: Arc<StoryIndex>) {
        // Drop queued stories that vanished from the tree.
        self.tag_queue
            .retain(|rel| index.stories.iter().any(|s| &s.relative == rel));
        self.index = Some(index);
        self.rebuild_report();
        if let Some(key) = &self.selected_key {
            if self.report.row(key).is_none() {
                self.selected_key = None;
            }
        }
        self.matrix = None;
        self.refresh_command_preview();
    }

    /// Recompute the coverage report from the current index, settings and
    /// requirement totals, keeping the chosen sort order.
    pub fn rebuild_report(&mut self) {
        let Some(index) = &self.index else {
            self.report = CoverageReport::default();
            return;
        };
        let mut report = build_report(
            index,
            &self.settings.coverage_bindings(),
            &self.requirements.totals(),
        );
        report.sort_by(self.sort_column, self.sort_ascending);
        self.report = report;
    }

    /// Sort the key table. Clicking the active column flips the direction.
    pub fn sort_report(&mut self, column: ReportColumn) {
        if self.sort_column == column {
            self.sort_ascending = !self.sort_ascending;
        } else {
            self.sort_column = column;
            self.sort_ascending = true;
        }
        self.report.sort_by(self.sort_column, self.sort_ascending);
    }

    // ── Browse ──────────────────────────────────────────────────

    pub fn select_key(&mut self, key: Option<String>) {
        self.selected_key = key;
    }

    /// Values of the selected key, or an empty list with no selection.
    pub fn selected_values(&self) -> Vec<String> {
        match (&self.index, &self.selected_key) {
            (Some(index), Some(key)) => index.metatag_values(key, self.values_with_stories),
            _ => Vec::new(),
        }
    }

    /// Build the coverage matrix for `key` against its bound category.
    pub fn open_matrix(&mut self, key: &str) {
        let Some(index) = self.index.clone() else {
            return;
        };
        let bindings = self.settings.coverage_bindings();
        let Some(category) = bindings.category_for(key) else {
            self.push_notice(
                NoticeLevel::Warning,
                format!("{key} is not bound to a requirement category"),
            );
            return;
        };
        match self.requirements.table(category) {
            Some(table) => self.matrix = Some(coverage_matrix(&index, key, table)),
            None => {
                let category = category.to_string();
                self.push_notice(
                    NoticeLevel::Warning,
                    format!("Requirement file for '{category}' is not loaded"),
                );
            }
        }
    }

    // ── Requirements ────────────────────────────────────────────

    /// Load a category from a user-chosen file and remember it in settings.
    pub fn reload_requirement(&mut self, category: &str, path: PathBuf) {
        if self.requirements.reload(category, path.clone()) {
            self.settings.requirements.insert(category.to_string(), path);
            self.push_notice(
                NoticeLevel::Info,
                format!("Loaded requirement file for '{category}'"),
            );
        } else if let Some(err) = self.requirements.error(category).map(str::to_string) {
            self.push_notice(NoticeLevel::Error, err);
        }
        self.rebuild_report();
    }

    // ── Exports ─────────────────────────────────────────────────

    pub fn export_outline(&mut self, kind: OutlineKind, path: &Path) {
        let Some(index) = &self.index else {
            return;
        };
        let lines = render_outline(kind, index);
        match write_lines(path, &lines) {
            Ok(()) => self.push_notice(
                NoticeLevel::Info,
                format!("Saved {} lines to {}", lines.len(), path.display()),
            ),
            Err(err) => self.push_notice(NoticeLevel::Error, err.to_string()),
        }
    }

    pub fn export_report(&mut self, path: &Path) {
        match self.report.write_csv(path) {
            Ok(()) => self.push_notice(
                NoticeLevel::Info,
                format!("Coverage report saved to {}", path.display()),
            ),
            Err(err) => self.push_notice(NoticeLevel::Error, err.to_string()),
        }
    }

    pub fn export_matrix(&mut self, path: &Path) {
        let result = match &self.matrix {
            Some(matrix) => matrix.write_csv(path),
            None => return,
        };
        match result {
            Ok(()) => self.push_notice(
                NoticeLevel::Info,
                format!("Coverage matrix saved to {}", path.display()),
            ),
            Err(err) => self.push_notice(NoticeLevel::Error, err.to_string()),
        }
    }

    // ── Tag queue ───────────────────────────────────────────────

    /// Stories not in the queue that match the filter, in index order.
    pub fn available_stories(&self) -> Vec<&StoryFile> {
        let Some(index) = &self.index else {
            return Vec::new();
        };
        let filter = self.tag_filter.trim().to_lowercase();
        index
            .stories
            .iter()
            .filter(|s| !self.tag_queue.contains(&s.relative))
            .filter(|s| filter.is_empty() || s.relative.to_lowercase().contains(&filter))
            .collect()
    }

    /// Queued stories, in queue order.
    pub fn queued_stories(&self) -> Vec<&StoryFile> {
        let Some(index) = &self.index else {
            return Vec::new();
        };
        self.tag_queue
            .iter()
            .filter_map(|rel| index.stories.iter().find(|s| &s.relative == rel))
            .collect()
    }

    pub fn queue_story(&mut self, relative: &str) {
        if !self.tag_queue.iter().any(|r| r == relative) {
            self.tag_queue.push(relative.to_string());
            self.refresh_command_preview();
        }
    }

    pub fn unqueue_story(&mut self, relative: &str) {
        self.tag_queue.retain(|r| r != relative);
        self.refresh_command_preview();
    }

    /// Queue every story currently passing the filter.
    pub fn queue_all_available(&mut self) {
        let picked: Vec<String> = self
            .available_stories()
            .into_iter()
            .map(|s| s.relative.clone())
            .collect();
        self.tag_queue.extend(picked);
        self.refresh_command_preview();
    }

    pub fn clear_queue(&mut self) {
        self.tag_queue.clear();
        self.refresh_command_preview();
    }

    fn push_tag_log(&mut self, line: String) {
        if self.tag_log.len() >= MAX_TAG_LOG_LINES {
            self.tag_log.pop_front();
        }
        self.tag_log.push_back(line);
    }

    /// Add or remove the tag typed in the Tag tab on every queued story,
    /// then rescan so the key table reflects the edit.
    pub fn bulk_tag(&mut self, add: bool) {
        let Some(tag) = editing::normalize_tag(&self.tag_input) else {
            self.push_notice(NoticeLevel::Warning, "Enter a metatag first");
            return;
        };
        let paths: Vec<PathBuf> = self.queued_stories().iter().map(|s| s.path.clone()).collect();
        if paths.is_empty() {
            self.push_notice(NoticeLevel::Warning, "No stories are queued for tagging");
            return;
        }

        let op = if add {
            BulkTagOp::Add(tag.clone())
        } else {
            BulkTagOp::Remove(tag.clone())
        };
        let report = editing::apply_bulk(&paths, &op);

        let verb = if add { "Added" } else { "Removed" };
        let stamp = Local::now().format("%H:%M:%S");
        self.push_tag_log(format!("[{stamp}] {verb} {tag}: {}", report.summary()));
        for (path, err) in &report.failed {
            self.push_tag_log(format!("[{stamp}]   {}: {err}", path.display()));
        }
        if !report.changed.is_empty() {
            self.rescan();
        }
        self.last_bulk = Some(report);
    }

    // ── Test run ────────────────────────────────────────────────

    pub fn run_request(&self) -> TestRunRequest {
        let stories = if self.run_queued_only {
            self.queued_stories()
                .iter()
                .map(|s| s.name.to_string())
                .collect()
        } else {
            Vec::new()
        };
        let credentials = (!self.run_user.trim().is_empty()).then(|| Credentials {
            user: self.run_user.trim().to_string(),
            password: self.run_password.clone(),
        });
        TestRunRequest {
            metafilter: self.metafilter.clone(),
            stories,
            credentials,
            browser: Some(self.run_browser),
        }
    }

    /// The command built from the current Execute-tab inputs.
    pub fn built_command(&self) -> CommandLine {
        build_test_command(&self.settings.runner, &self.run_request())
    }

    /// Regenerate the preview text unless the user has edited it.
    pub fn refresh_command_preview(&mut self) {
        if !self.command_edited {
            self.command_text = self.built_command().display_masked();
        }
    }

    /// Throw away manual edits to the command preview.
    pub fn reset_command(&mut self) {
        self.command_edited = false;
        self.refresh_command_preview();
    }

    pub fn working_dir(&self) -> PathBuf {
        resolve_working_dir(
            &self.settings.stories_root(),
            self.settings.runner_working_dir().as_deref(),
        )
    }

    pub fn is_running(&self) -> bool {
        self.run_handle.is_some()
    }

    pub fn start_test_run(&mut self) {
        if self.is_running() {
            return;
        }
        let built = self.built_command();
        let command = if self.command_edited {
            match CommandLine::parse_edited(&self.command_text, &built) {
                Ok(cmd) => cmd,
                Err(err) => {
                    self.push_notice(NoticeLevel::Error, format!("Cannot run: {err}"));
                    return;
                }
            }
        } else {
            built
        };

        let working_dir = self.working_dir();
        let timeout = self.settings.runner.timeout_secs.map(Duration::from_secs);
        self.push_console(
            ConsoleKind::Info,
            format!("Working directory: {}", working_dir.display()),
        );
        self.run_handle = Some(start_run(command, working_dir.clone(), timeout));
        self.run_working_dir = Some(working_dir);
        self.run_phase = RunPhase::Running;
    }

    pub fn cancel_run(&mut self) {
        if let Some(ref handle) = self.run_handle {
            handle.cancel();
        }
    }

    /// Start the standalone Selenium server used by the remote WebDriver.
    pub fn start_selenium(&mut self) {
        if self.selenium_handle.is_some() {
            self.push_notice(NoticeLevel::Info, "Selenium server is already running");
            return;
        }
        let command = build_selenium_command(&self.settings.resolved_selenium());
        self.push_console(ConsoleKind::Info, "Starting Selenium server".to_string());
        self.selenium_handle = Some(start_run(command, self.settings.base_dir(), None));
    }

    pub fn stop_selenium(&mut self) {
        if let Some(ref handle) = self.selenium_handle {
            handle.cancel();
        }
    }

    /// The Serenity report of the last run, if it exists on disk.
    pub fn report_file(&self) -> Option<PathBuf> {
        let working_dir = self
            .run_working_dir
            .clone()
            .unwrap_or_else(|| self.working_dir());
        Some(self.settings.report_path(&working_dir)).filter(|p| p.is_file())
    }

    pub fn push_console(&mut self, kind: ConsoleKind, text: String) {
        while self.console.len() >= MAX_CONSOLE_LINES {
            self.console.pop_front();
        }
        self.console.push_back(ConsoleLine {
            timestamp: Local::now(),
            kind,
            text,
        });
    }

    pub fn clear_console(&mut self) {
        self.console.clear();
    }

    /// Drain test-run and Selenium events into the console. Called once per
    /// frame; returns `true` if the UI should repaint.
    pub fn process_run_messages(&mut self) -> bool {
        let mut repaint = false;

        if let Some(handle) = self.run_handle.take() {
            let (events, finished) = drain_events(&handle);
            repaint |= !events.is_empty();
            for event in events {
                match event {
                    RunEvent::Started { pid, command } => {
                        self.push_console(ConsoleKind::Info, format!("Started pid {pid}: {command}"));
                    }
                    RunEvent::Line { stream, text } => {
                        let kind = match stream {
                            OutputStream::Stdout => ConsoleKind::Stdout,
                            OutputStream::Stderr => ConsoleKind::Stderr,
                        };
                        self.push_console(kind, text);
                    }
                    RunEvent::Finished { status, duration } => {
                        let kind = if status.success() {
                            ConsoleKind::Info
                        } else {
                            ConsoleKind::Error
                        };
                        self.push_console(
                            kind,
                            format!(
                                "Run {} in {}",
                                status.describe(),
                                storysleuth_core::model::format::format_duration(duration)
                            ),
                        );
                        self.run_phase = RunPhase::Finished(status);
                    }
                    RunEvent::Failed(message) => {
                        self.push_console(ConsoleKind::Error, message.clone());
                        self.push_notice(NoticeLevel::Error, message);
                        self.run_phase = RunPhase::Failed;
                    }
                }
            }
            if !finished {
                self.run_handle = Some(handle);
            }
        }

        if let Some(handle) = self.selenium_handle.take() {
            let (events, finished) = drain_events(&handle);
            repaint |= !events.is_empty();
            for event in events {
                match event {
                    RunEvent::Started { pid, .. } => self.push_console(
                        ConsoleKind::Info,
                        format!("[selenium] started pid {pid}"),
                    ),
                    RunEvent::Line { stream, text } => {
                        let kind = match stream {
                            OutputStream::Stdout => ConsoleKind::Stdout,
                            OutputStream::Stderr => ConsoleKind::Stderr,
                        };
                        self.push_console(kind, format!("[selenium] {text}"));
                    }
                    RunEvent::Finished { status, .. } => self.push_console(
                        ConsoleKind::Info,
                        format!("[selenium] server {}", status.describe()),
                    ),
                    RunEvent::Failed(message) => {
                        self.push_console(ConsoleKind::Error, format!("[selenium] {message}"));
                        self.push_notice(NoticeLevel::Error, message);
                    }
                }
            }
            if !finished {
                self.selenium_handle = Some(handle);
            }
        }

        repaint
    }

    // ── Editor ──────────────────────────────────────────────────

    pub fn open_editor(&mut self, path: &Path) {
        let blocked = self
            .editor
            .as_ref()
            .filter(|e| e.is_dirty() && e.path != path)
            .map(|e| format!("Save or close {} first", e.title));
        if let Some(message) = blocked {
            self.push_notice(NoticeLevel::Warning, message);
            return;
        }
        match editing::read_story(path) {
            Ok(text) => {
                let title = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                let (font_size, monospace) = self
                    .editor
                    .as_ref()
                    .map(|e| (e.font_size, e.monospace))
                    .unwrap_or((14.0, true));
                self.editor = Some(EditorState {
                    path: path.to_path_buf(),
                    title,
                    saved_text: text.clone(),
                    text,
                    font_size,
                    monospace,
                });
            }
            Err(err) => self.push_notice(NoticeLevel::Error, err.to_string()),
        }
    }

    /// Save the editor and rescan so metatag edits show up.
    pub fn save_editor(&mut self) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        match editing::save_story(&editor.path, &editor.text) {
            Ok(()) => {
                editor.saved_text = editor.text.clone();
                let title = editor.title.clone();
                self.push_notice(NoticeLevel::Info, format!("Saved {title}"));
                self.rescan();
            }
            Err(err) => self.push_notice(NoticeLevel::Error, err.to_string()),
        }
    }

    pub fn close_editor(&mut self) {
        self.editor = None;
    }

    pub fn change_editor_font(&mut self, delta: f32) {
        if let Some(editor) = self.editor.as_mut() {
            editor.font_size = (editor.font_size + delta).clamp(MIN_EDITOR_FONT, MAX_EDITOR_FONT);
        }
    }

    // ── Settings ────────────────────────────────────────────────

    pub fn open_settings(&mut self) {
        self.settings_form = Some(SettingsForm::new(self.settings.clone()));
    }

    /// Adopt `draft`, save it to the settings file, reload requirement files
    /// and rescan when the story root or scan options changed.
    pub fn apply_settings(&mut self, mut draft: Settings) {
        draft.source = Some(self.settings_path.clone());
        let rescan =
            draft.stories != self.settings.stories || draft.scan != self.settings.scan;
        if let Err(err) = draft.save(&self.settings_path) {
            self.push_notice(NoticeLevel::Error, err.to_string());
        }
        self.settings = draft;
        self.requirements = RequirementSet::load(&self.settings);
        if self
            .selected_category
            .as_deref()
            .map_or(true, |c| self.requirements.path(c).is_none())
        {
            self.selected_category = self.requirements.categories().next().map(str::to_string);
        }
        self.run_browser = self.settings.runner.browser;
        self.story_root_input = self.settings.stories_root().to_string_lossy().into_owned();
        self.rebuild_report();
        self.refresh_command_preview();
        if rescan {
            self.rescan();
        }
    }
}

/// Take up to one frame's worth of events. The flag is set once the terminal
/// event has been seen or the channel has closed.
fn drain_events(handle: &RunHandle) -> (Vec<RunEvent>, bool) {
    let mut events = Vec::new();
    let mut finished = false;
    while events.len() < MAX_MESSAGES_PER_FRAME {
        match handle.events_rx.try_recv() {
            Ok(event) => {
                finished |= matches!(event, RunEvent::Finished { .. } | RunEvent::Failed(_));
                events.push(event);
                if finished {
                    break;
                }
            }
            Err(crossbeam_channel::TryRecvError::Empty) => break,
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                finished = true;
                break;
            }
        }
    }
    (events, finished)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::with_settings(Settings::default(), PathBuf::from("settings.json"))
    }

    #[test]
    fn console_is_capped() {
        let mut s = state();
        for i in 0..MAX_CONSOLE_LINES + 25 {
            s.push_console(ConsoleKind::Stdout, format!("line {i}"));
        }
        assert_eq!(s.console.len(), MAX_CONSOLE_LINES);
        assert_eq!(s.console.front().map(|l| l.text.as_str()), Some("line 25"));
    }

    #[test]
    fn command_preview_follows_inputs_until_edited() {
        let mut s = state();
        s.metafilter = "+smoke".into();
        s.refresh_command_preview();
        assert!(s.command_text.contains("-Dmetafilter=+smoke"));

        s.command_text = "mvn verify".into();
        s.command_edited = true;
        s.metafilter = "+wip".into();
        s.refresh_command_preview();
        assert_eq!(s.command_text, "mvn verify");

        s.reset_command();
        assert!(s.command_text.contains("-Dmetafilter=+wip"));
    }

    #[test]
    fn password_never_reaches_the_preview() {
        let mut s = state();
        s.run_user = "alice".into();
        s.run_password = "hunter2".into();
        s.refresh_command_preview();
        assert!(!s.command_text.contains("hunter2"));
        assert!(!s.command_text.contains("alice"));
        assert!(s.built_command().display().contains("hunter2"));
    }

    #[test]
    fn notices_can_be_dismissed() {
        let mut s = state();
        s.push_notice(NoticeLevel::Info, "one");
        s.push_notice(NoticeLevel::Error, "two");
        s.dismiss_notice(0);
        s.dismiss_notice(5);
        assert_eq!(s.notices.len(), 1);
        assert_eq!(s.notices[0].text, "two");
    }

    #[test]
    fn sorting_same_column_flips_direction() {
        let mut s = state();
        s.sort_report(ReportColumn::Count);
        assert_eq!((s.sort_column, s.sort_ascending), (ReportColumn::Count, true));
        s.sort_report(ReportColumn::Count);
        assert!(!s.sort_ascending);
        s.sort_report(ReportColumn::Key);
        assert!(s.sort_ascending);
    }

    #[test]
    fn settings_form_splits_list_fields() {
        let mut form = SettingsForm::new(Settings::default());
        assert_eq!(form.goals, "verify serenity:aggregate");
        form.goals = "  clean   verify ".into();
        form.extra_args = "-Pci".into();
        let settings = form.into_settings();
        assert_eq!(settings.runner.goals, vec!["clean", "verify"]);
        assert_eq!(settings.runner.extra_args, vec!["-Pci"]);
    }

    #[test]
    fn editor_font_is_clamped() {
        let mut s = state();
        s.editor = Some(EditorState {
            path: PathBuf::from("a.story"),
            title: "a.story".into(),
            text: String::new(),
            saved_text: String::new(),
            font_size: 14.0,
            monospace: true,
        });
        s.change_editor_font(100.0);
        assert_eq!(s.editor.as_ref().map(|e| e.font_size), Some(MAX_EDITOR_FONT));
        s.change_editor_font(-100.0);
        assert_eq!(s.editor.as_ref().map(|e| e.font_size), Some(MIN_EDITOR_FONT));
    }
}
