#![cfg(unix)]

/// End-to-end tests for the child-process runner.
///
/// Real processes, real pipes, real threads. Commands go through `sh`, so
/// these tests only run on Unix.
use std::path::PathBuf;
use std::time::{Duration, Instant};
use storysleuth_core::runner::{start_run, CommandLine, OutputStream, RunEvent, RunHandle, RunStatus};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn sh(script: &str) -> CommandLine {
    CommandLine::new("sh").arg("-c").arg(script)
}

/// Collect every event up to and including the terminal one.
fn collect_events(handle: &RunHandle) -> Vec<RunEvent> {
    let deadline = Instant::now() + Duration::from_secs(30);
    let mut events = Vec::new();
    loop {
        assert!(Instant::now() < deadline, "run did not finish within 30 seconds");
        match handle.events_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                let done = matches!(event, RunEvent::Finished { .. } | RunEvent::Failed(_));
                events.push(event);
                if done {
                    return events;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                panic!("runner channel closed without a terminal event")
            }
        }
    }
}

fn lines_of(events: &[RunEvent], stream: OutputStream) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            RunEvent::Line { stream: s, text } if *s == stream => Some(text.clone()),
            _ => None,
        })
        .collect()
}

fn final_status(events: &[RunEvent]) -> RunStatus {
    match events.last() {
        Some(RunEvent::Finished { status, .. }) => *status,
        other => panic!("expected Finished, got {other:?}"),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn streams_stdout_and_stderr_then_exit_code() {
    let handle = start_run(
        sh("echo one; echo two; echo oops >&2; printf tail"),
        std::env::temp_dir(),
        None,
    );
    let events = collect_events(&handle);

    assert!(matches!(events.first(), Some(RunEvent::Started { .. })));
    assert_eq!(lines_of(&events, OutputStream::Stdout), vec!["one", "two", "tail"]);
    assert_eq!(lines_of(&events, OutputStream::Stderr), vec!["oops"]);
    assert_eq!(final_status(&events), RunStatus::Exited(Some(0)));
    assert!(final_status(&events).success());
}

#[test]
fn non_zero_exit_is_reported() {
    let handle = start_run(sh("echo failing; exit 3"), std::env::temp_dir(), None);
    let events = collect_events(&handle);
    assert_eq!(final_status(&events), RunStatus::Exited(Some(3)));
}

#[test]
fn invalid_utf8_is_replaced_not_dropped() {
    let handle = start_run(sh(r"printf 'caf\351\n'"), std::env::temp_dir(), None);
    let events = collect_events(&handle);
    assert_eq!(lines_of(&events, OutputStream::Stdout), vec!["caf\u{fffd}"]);
}

#[test]
fn runs_in_the_given_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    let workdir: PathBuf = dir.path().canonicalize().unwrap();
    let handle = start_run(sh("pwd"), workdir.clone(), None);
    let events = collect_events(&handle);
    let out = lines_of(&events, OutputStream::Stdout);
    assert_eq!(out.len(), 1);
    assert_eq!(PathBuf::from(&out[0]).canonicalize().unwrap(), workdir);
}

#[test]
fn cancel_kills_the_child() {
    let handle = start_run(
        CommandLine::new("sleep").arg("30"),
        std::env::temp_dir(),
        None,
    );
    let started = handle
        .events_rx
        .recv_timeout(Duration::from_secs(10))
        .unwrap();
    assert!(matches!(started, RunEvent::Started { .. }));

    let begin = Instant::now();
    handle.cancel();
    let events = collect_events(&handle);
    assert_eq!(final_status(&events), RunStatus::Cancelled);
    assert!(begin.elapsed() < Duration::from_secs(10));
}

#[test]
fn timeout_kills_the_child() {
    let handle = start_run(
        CommandLine::new("sleep").arg("30"),
        std::env::temp_dir(),
        Some(Duration::from_millis(200)),
    );
    let events = collect_events(&handle);
    assert_eq!(final_status(&events), RunStatus::TimedOut);
}

#[test]
fn spawn_failure_is_a_failed_event() {
    let handle = start_run(
        CommandLine::new("/definitely/not/a/program"),
        std::env::temp_dir(),
        None,
    );
    let events = collect_events(&handle);
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], RunEvent::Failed(msg) if msg.contains("/definitely/not/a/program")));
}

#[test]
fn cancel_does_not_wait_for_grandchildren() {
    // `sh` forks `sleep`, which inherits the pipes.
    let handle = start_run(sh("sleep 20; echo done"), std::env::temp_dir(), None);
    let started = handle
        .events_rx
        .recv_timeout(Duration::from_secs(10))
        .unwrap();
    assert!(matches!(started, RunEvent::Started { .. }));

    let begin = Instant::now();
    handle.cancel();
    let events = collect_events(&handle);
    assert_eq!(final_status(&events), RunStatus::Cancelled);
    assert!(
        begin.elapsed() < Duration::from_secs(5),
        "cancel took {:?}",
        begin.elapsed()
    );
    assert!(lines_of(&events, OutputStream::Stdout).is_empty());
}

#[test]
fn timeout_does_not_wait_for_grandchildren() {
    let begin = Instant::now();
    let handle = start_run(
        sh("sleep 20; echo done"),
        std::env::temp_dir(),
        Some(Duration::from_secs(1)),
    );
    let events = collect_events(&handle);
    assert_eq!(final_status(&events), RunStatus::TimedOut);
    assert!(
        begin.elapsed() < Duration::from_secs(6),
        "timeout took {:?}",
        begin.elapsed()
    );
}

#[test]
fn nothing_arrives_after_finished() {
    let handle = start_run(sh("sleep 20 & echo early; wait"), std::env::temp_dir(), None);
    let started = handle
        .events_rx
        .recv_timeout(Duration::from_secs(10))
        .unwrap();
    assert!(matches!(started, RunEvent::Started { .. }));
    // Give `echo early` time to land before the kill.
    std::thread::sleep(Duration::from_millis(300));
    handle.cancel();
    let events = collect_events(&handle);
    assert_eq!(final_status(&events), RunStatus::Cancelled);
    assert!(handle
        .events_rx
        .recv_timeout(Duration::from_millis(500))
        .is_err());
}
