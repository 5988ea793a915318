/// End-to-end tests for `AppState` -- the GUI application state machine.
///
/// These tests exercise the real business-logic paths of `AppState` without
/// spinning up an egui window, keeping them fast and deterministic.
///
/// **Scope:** the user-visible state transitions:
///   - Scan lifecycle (start, completion, cancellation, rescan)
///   - Key selection and the values list
///   - Tag queue and bulk tagging (files really change on disk)
///   - Outline export and settings save
///   - Test-run streaming into the console (Unix)
///
/// The real scanner and process runner are used so no mocking is needed.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use storysleuth_core::analysis::{Coverage, OutlineKind};
use storysleuth_core::settings::Settings;
use storysleuth_gui::state::{AppPhase, AppState, NoticeLevel};
use tempfile::TempDir;

// ── Helpers ───────────────────────────────────────────────────────────────────

/// A story tree plus a usecase CSV with four rows, and state pointing at it.
/// The root is a plain-named child because temp dirs are dot-prefixed and
/// hidden entries are skipped.
fn make_state() -> (TempDir, AppState) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("stories");
    fs::create_dir_all(root.join("login")).unwrap();
    fs::write(
        root.join("login/login.story"),
        "Meta:\n@usecase 1\n\nScenario: valid login\nGiven a user\nThen they see the dashboard\n",
    )
    .unwrap();
    fs::write(
        root.join("pay.story"),
        "Meta:\n@usecase 2\n@wip\n\nScenario: pay\nGiven a basket\n",
    )
    .unwrap();
    fs::write(root.join("refund.story"), "Scenario: refund\nGiven an order\n").unwrap();
    fs::write(
        tmp.path().join("usecases.csv"),
        "Id,Title\n1,Login\n2,Pay\n3,Refund\n4,Report\n",
    )
    .unwrap();

    let settings_path = tmp.path().join("settings.json");
    fs::write(
        &settings_path,
        r#"{ "Stories": "stories", "Requirements": { "Usecases": "usecases.csv" } }"#,
    )
    .unwrap();
    let settings = Settings::load(&settings_path).unwrap();
    let state = AppState::with_settings(settings, settings_path);
    (tmp, state)
}

/// Pump `process_scan_messages()` until the phase leaves `Scanning` or the
/// deadline expires.
fn pump_until_done(state: &mut AppState) {
    let deadline = Instant::now() + Duration::from_secs(30);
    while state.phase == AppPhase::Scanning {
        assert!(
            Instant::now() < deadline,
            "scan did not complete within 30 seconds"
        );
        state.process_scan_messages();
        std::thread::sleep(Duration::from_millis(10));
    }
}

fn scanned_state() -> (TempDir, AppState) {
    let (tmp, mut state) = make_state();
    state.rescan();
    pump_until_done(&mut state);
    (tmp, state)
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

// ── Scan lifecycle ────────────────────────────────────────────────────────────

#[test]
fn start_scan_sets_scanning_phase() {
    let (_tmp, mut state) = make_state();
    assert_eq!(state.phase, AppPhase::Idle);
    state.rescan();
    assert_eq!(state.phase, AppPhase::Scanning);
    assert!(state.scan_handle.is_some());
}

#[test]
fn scan_completes_with_index_and_report() {
    let (_tmp, state) = scanned_state();

    assert_eq!(state.phase, AppPhase::Results);
    assert!(state.scan_handle.is_none());
    let index = state.index.as_ref().expect("index after scan");
    assert_eq!(index.stories.len(), 3);

    assert_eq!(state.report.key_count, 2);
    let usecase = state.report.row("@usecase").unwrap();
    assert_eq!(usecase.count, 2);
    // Two distinct values against four requirements.
    assert_eq!(usecase.coverage, Coverage::Percent(50.0));
    assert_eq!(
        state.report.row("@wip").map(|r| r.coverage),
        Some(Coverage::Untracked)
    );
}

#[test]
fn cancelled_first_scan_returns_to_idle() {
    let (_tmp, mut state) = make_state();
    state.rescan();
    state.cancel_scan();
    pump_until_done(&mut state);
    // A tiny tree may finish before the flag is seen; both are fine.
    match state.phase {
        AppPhase::Idle => {
            assert!(state.scan_was_cancelled);
            assert!(state.index.is_none());
        }
        AppPhase::Results => assert!(state.index.is_some()),
        AppPhase::Scanning => unreachable!(),
    }
}

#[test]
fn missing_root_yields_empty_index_and_error() {
    let (tmp, mut state) = make_state();
    state.set_story_root(tmp.path().join("nowhere"));
    pump_until_done(&mut state);
    assert_eq!(state.phase, AppPhase::Results);
    assert!(state.index.as_ref().unwrap().is_empty());
    assert_eq!(state.scan_error_count, 1);
    assert!(state.report.rows.is_empty());
}

// ── Browse ────────────────────────────────────────────────────────────────────

#[test]
fn selecting_a_key_lists_its_values() {
    let (_tmp, mut state) = scanned_state();
    assert!(state.selected_values().is_empty());

    state.select_key(Some("@usecase".into()));
    assert_eq!(state.selected_values(), vec!["1", "2"]);

    state.values_with_stories = true;
    assert_eq!(
        state.selected_values(),
        vec!["login.story 1", "pay.story 2"]
    );
}

#[test]
fn selection_of_vanished_key_is_cleared_on_rescan() {
    let (tmp, mut state) = scanned_state();
    state.select_key(Some("@wip".into()));

    fs::write(
        tmp.path().join("stories/pay.story"),
        "Meta:\n@usecase 2\n\nScenario: pay\n",
    )
    .unwrap();
    state.rescan();
    pump_until_done(&mut state);
    assert_eq!(state.selected_key, None);
}

#[test]
fn coverage_matrix_opens_for_bound_key_only() {
    let (_tmp, mut state) = scanned_state();
    state.open_matrix("@usecase");
    let matrix = state.matrix.as_ref().expect("matrix for bound key");
    assert_eq!(matrix.total(), 4);
    assert_eq!(matrix.covered(), 2);

    state.matrix = None;
    state.open_matrix("@wip");
    assert!(state.matrix.is_none());
    assert_eq!(state.notices.last().map(|n| n.level), Some(NoticeLevel::Warning));
}

// ── Tag queue ─────────────────────────────────────────────────────────────────

#[test]
fn queue_moves_stories_between_lists() {
    let (_tmp, mut state) = scanned_state();
    assert_eq!(state.available_stories().len(), 3);

    state.queue_story("pay.story");
    state.queue_story("pay.story");
    assert_eq!(state.tag_queue, vec!["pay.story"]);
    assert_eq!(state.available_stories().len(), 2);

    state.tag_filter = "LOGIN".into();
    let filtered: Vec<_> = state
        .available_stories()
        .iter()
        .map(|s| s.relative.clone())
        .collect();
    assert_eq!(filtered, vec!["login/login.story"]);

    state.queue_all_available();
    assert_eq!(state.tag_queue, vec!["pay.story", "login/login.story"]);

    state.unqueue_story("pay.story");
    assert_eq!(state.tag_queue, vec!["login/login.story"]);
    state.clear_queue();
    assert!(state.tag_queue.is_empty());
}

#[test]
fn bulk_add_then_remove_edits_files_and_rescans() {
    let (tmp, mut state) = scanned_state();
    let refund = tmp.path().join("stories/refund.story");
    let pay = tmp.path().join("stories/pay.story");

    state.queue_story("refund.story");
    state.queue_story("pay.story");
    state.tag_input = "smoke".into();
    state.bulk_tag(true);

    let report = state.last_bulk.clone().unwrap();
    assert_eq!(report.changed.len(), 2);
    assert!(read(&refund).starts_with("Meta:\n@smoke\n\n"));
    assert!(read(&pay).contains("@wip\n@smoke\n"));
    assert_eq!(state.phase, AppPhase::Scanning);
    pump_until_done(&mut state);
    assert_eq!(state.report.row("@smoke").map(|r| r.count), Some(2));

    state.bulk_tag(false);
    pump_until_done(&mut state);
    assert!(state.report.row("@smoke").is_none());
    assert!(!read(&pay).contains("@smoke"));
    assert_eq!(state.tag_log.len(), 2);
    assert!(state.tag_log[0].contains("2 changed"));
}

#[test]
fn bulk_tag_without_input_or_queue_only_warns() {
    let (_tmp, mut state) = scanned_state();
    state.bulk_tag(true);
    state.tag_input = "@smoke".into();
    state.bulk_tag(true);
    assert_eq!(state.notices.len(), 2);
    assert!(state.last_bulk.is_none());
    assert_eq!(state.phase, AppPhase::Results);
}

// ── Editor ────────────────────────────────────────────────────────────────────

#[test]
fn editor_saves_and_rescans() {
    let (tmp, mut state) = scanned_state();
    let path = tmp.path().join("stories/refund.story");

    state.open_editor(&path);
    let editor = state.editor.as_mut().unwrap();
    assert_eq!(editor.title, "refund.story");
    assert!(!editor.is_dirty());
    editor.text = format!("Meta:\n@usecase 3\n\n{}", editor.text);
    assert!(editor.is_dirty());

    state.save_editor();
    assert!(!state.editor.as_ref().unwrap().is_dirty());
    pump_until_done(&mut state);
    assert_eq!(
        state.report.row("@usecase").map(|r| r.coverage),
        Some(Coverage::Percent(75.0))
    );
}

#[test]
fn opening_a_missing_story_is_a_notice() {
    let (tmp, mut state) = scanned_state();
    state.open_editor(&tmp.path().join("stories/gone.story"));
    assert!(state.editor.is_none());
    assert_eq!(state.notices.last().map(|n| n.level), Some(NoticeLevel::Error));
}

#[test]
fn non_utf8_story_is_not_opened_for_editing() {
    let (tmp, mut state) = scanned_state();
    let path = tmp.path().join("stories/legacy.story");
    let bytes = b"Scenario: caf\xe9 order\nGiven x\n";
    fs::write(&path, bytes).unwrap();

    state.open_editor(&path);
    assert!(state.editor.is_none());
    assert_eq!(state.notices.last().map(|n| n.level), Some(NoticeLevel::Error));
    assert_eq!(fs::read(&path).unwrap(), bytes);
}

// ── Exports and settings ──────────────────────────────────────────────────────

#[test]
fn outline_export_writes_file() {
    let (tmp, mut state) = scanned_state();
    let out = tmp.path().join(OutlineKind::Scenarios.default_file_name());
    state.export_outline(OutlineKind::Scenarios, &out);
    let text = read(&out);
    assert!(text.contains("Scenario: valid login"));
    assert!(text.contains("Scenario: refund"));
}

#[test]
fn report_export_writes_csv() {
    let (tmp, mut state) = scanned_state();
    let out = tmp.path().join("coverage.csv");
    state.export_report(&out);
    let text = read(&out);
    assert!(text.starts_with("Key,Count,Distinct,Percent,Coverage,Category"));
    assert!(text.contains("@usecase"));
}

#[test]
fn applying_settings_saves_and_rescans_new_root() {
    let (tmp, mut state) = scanned_state();
    let other = tmp.path().join("other");
    fs::create_dir_all(&other).unwrap();
    fs::write(other.join("x.story"), "Meta:\n@feature search\n").unwrap();

    state.open_settings();
    let mut form = state.settings_form.take().unwrap();
    form.settings.stories = PathBuf::from("other");
    form.goals = "clean verify".into();
    state.apply_settings(form.into_settings());

    let saved = Settings::load(&state.settings_path).unwrap();
    assert_eq!(saved.stories, PathBuf::from("other"));
    assert_eq!(saved.runner.goals, vec!["clean", "verify"]);
    assert!(state.command_text.starts_with("mvn clean verify"));

    pump_until_done(&mut state);
    assert!(state.report.row("@feature").is_some());
    assert!(state.report.row("@usecase").is_none());
}

#[test]
fn failed_requirement_file_can_be_replaced() {
    let (tmp, mut state) = scanned_state();
    let bad = tmp.path().join("missing.csv");
    state.reload_requirement("Usecases", bad);
    assert!(state.requirements.error("Usecases").is_some());
    assert_eq!(
        state.report.row("@usecase").map(|r| r.coverage),
        Some(Coverage::Unavailable)
    );

    state.reload_requirement("Usecases", tmp.path().join("usecases.csv"));
    assert!(state.requirements.error("Usecases").is_none());
    assert_eq!(
        state.report.row("@usecase").map(|r| r.coverage),
        Some(Coverage::Percent(50.0))
    );
}

// ── Test run ──────────────────────────────────────────────────────────────────

#[cfg(unix)]
#[test]
fn edited_command_streams_into_console() {
    use storysleuth_gui::state::{ConsoleKind, RunPhase};

    let (tmp, mut state) = scanned_state();
    state.settings.runner.working_dir = Some(tmp.path().to_path_buf());
    state.command_text = r#"sh -c "echo hello; echo oops >&2; exit 2""#.into();
    state.command_edited = true;
    state.start_test_run();
    assert_eq!(state.run_phase, RunPhase::Running);
    assert!(state.is_running());

    let deadline = Instant::now() + Duration::from_secs(30);
    while state.run_phase == RunPhase::Running {
        assert!(Instant::now() < deadline, "run did not finish within 30 seconds");
        state.process_run_messages();
        std::thread::sleep(Duration::from_millis(10));
    }

    assert!(!state.is_running());
    assert!(matches!(state.run_phase, RunPhase::Finished(s) if !s.success()));
    let texts: Vec<_> = state
        .console
        .iter()
        .map(|l| (l.kind, l.text.as_str()))
        .collect();
    assert!(texts.contains(&(ConsoleKind::Stdout, "hello")));
    assert!(texts.contains(&(ConsoleKind::Stderr, "oops")));
    assert!(texts
        .iter()
        .any(|(k, t)| *k == ConsoleKind::Error && t.contains("exit code 2")));
}

#[test]
fn empty_edited_command_is_refused() {
    let (_tmp, mut state) = scanned_state();
    state.command_text = "   ".into();
    state.command_edited = true;
    state.start_test_run();
    assert!(!state.is_running());
    assert_eq!(state.notices.last().map(|n| n.level), Some(NoticeLevel::Error));
}
