/// Child-process streaming.
///
/// A supervisor thread spawns the child and waits for it; one reader thread
/// per output stream turns bytes into lines. Everything reaches the UI as
/// [`RunEvent`]s over a bounded channel. On Unix the child leads its own
/// process group so a cancel or timeout takes its descendants down with it.
/// Readers send through a gate the supervisor closes when it sends
/// `Finished`, so no `Line` ever arrives after it.
use super::command::CommandLine;
use crate::error::CoreError;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Maximum number of run events that may queue up before readers block.
pub const RUN_CHANNEL_CAPACITY: usize = 4_096;

/// How often the supervisor polls the child for exit, cancel, and timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long a killed run waits for its readers to drain before `Finished`.
/// A descendant that escaped the kill can hold a pipe open indefinitely.
const READER_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The child exited on its own. `None` when it was killed by a signal.
    Exited(Option<i32>),
    Cancelled,
    TimedOut,
}

impl RunStatus {
    pub fn success(self) -> bool {
        self == Self::Exited(Some(0))
    }

    pub fn describe(self) -> String {
        match self {
            Self::Exited(Some(0)) => "finished successfully (exit code 0)".into(),
            Self::Exited(Some(code)) => format!("failed (exit code {code})"),
            Self::Exited(None) => "terminated by a signal".into(),
            Self::Cancelled => "cancelled".into(),
            Self::TimedOut => "timed out".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// The child is running. `command` is the masked command line.
    Started { pid: u32, command: String },
    Line { stream: OutputStream, text: String },
    Finished { status: RunStatus, duration: Duration },
    /// The child could not be started; no other event follows.
    Failed(String),
}

/// Handle to a running child process.
pub struct RunHandle {
    pub events_rx: Receiver<RunEvent>,
    cancel_flag: Arc<AtomicBool>,
    child: Arc<Mutex<Option<Child>>>,
    _thread: Option<thread::JoinHandle<()>>,
}

impl RunHandle {
    /// Kill the child. The supervisor reports `Finished(Cancelled)`.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
        if let Some(child) = self.child.lock().as_mut() {
            kill_tree(child);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }
}

/// Spawn `command` in `working_dir` on a background supervisor thread.
pub fn start_run(command: CommandLine, working_dir: PathBuf, timeout: Option<Duration>) -> RunHandle {
    let (events_tx, events_rx) = crossbeam_channel::bounded::<RunEvent>(RUN_CHANNEL_CAPACITY);
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let child_slot: Arc<Mutex<Option<Child>>> = Arc::new(Mutex::new(None));

    let cancel_clone = cancel_flag.clone();
    let slot_clone = child_slot.clone();

    let thread = thread::Builder::new()
        .name("storysleuth-runner".into())
        .spawn(move || supervise(command, working_dir, timeout, events_tx, cancel_clone, slot_clone))
        .expect("failed to spawn runner thread");

    RunHandle {
        events_rx,
        cancel_flag,
        child: child_slot,
        _thread: Some(thread),
    }
}

fn supervise(
    command: CommandLine,
    working_dir: PathBuf,
    timeout: Option<Duration>,
    tx: Sender<RunEvent>,
    cancel_flag: Arc<AtomicBool>,
    child_slot: Arc<Mutex<Option<Child>>>,
) {
    let masked = command.display_masked();
    info!("Running `{masked}` in {}", working_dir.display());

    let mut cmd = command.to_command();
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    let spawned = cmd
        .current_dir(&working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(source) => {
            let err = CoreError::Spawn {
                program: command.program.clone(),
                source,
            };
            warn!("{err}");
            let _ = tx.send(RunEvent::Failed(err.to_string()));
            return;
        }
    };

    let start = Instant::now();
    let pid = child.id();
    let _ = tx.send(RunEvent::Started {
        pid,
        command: masked,
    });
    let gate = Arc::new(Mutex::new(false));
    let readers = [
        child
            .stdout
            .take()
            .map(|out| spawn_reader(out, OutputStream::Stdout, tx.clone(), gate.clone())),
        child
            .stderr
            .take()
            .map(|err| spawn_reader(err, OutputStream::Stderr, tx.clone(), gate.clone())),
    ];
    *child_slot.lock() = Some(child);

    let status = loop {
        if cancel_flag.load(Ordering::Relaxed) {
            if let Some(child) = child_slot.lock().as_mut() {
                kill_tree(child);
                let _ = child.wait();
            }
            break RunStatus::Cancelled;
        }
        if timeout.is_some_and(|limit| start.elapsed() >= limit) {
            if let Some(child) = child_slot.lock().as_mut() {
                warn!("Run exceeded its timeout; killing pid {pid}");
                kill_tree(child);
                let _ = child.wait();
            }
            break RunStatus::TimedOut;
        }

        let polled = match child_slot.lock().as_mut() {
            Some(child) => child.try_wait(),
            None => break RunStatus::Exited(None),
        };
        match polled {
            // A kill from `RunHandle::cancel` can land between the flag
            // check above and this poll.
            Ok(Some(_)) if cancel_flag.load(Ordering::Relaxed) => break RunStatus::Cancelled,
            Ok(Some(exit)) => break RunStatus::Exited(exit.code()),
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(err) => {
                warn!("Failed to poll pid {pid}: {err}");
                break RunStatus::Exited(None);
            }
        }
    };
    child_slot.lock().take();

    let readers: Vec<_> = readers.into_iter().flatten().collect();
    if matches!(status, RunStatus::Exited(_)) {
        for reader in readers {
            let _ = reader.join();
        }
    } else {
        join_within(readers, READER_GRACE);
    }

    let duration = start.elapsed();
    info!("Run {} after {:?}", status.describe(), duration);
    let mut closed = gate.lock();
    *closed = true;
    let _ = tx.send(RunEvent::Finished { status, duration });
}

/// Join readers that finish before `grace` runs out; detach the rest.
fn join_within(readers: Vec<thread::JoinHandle<()>>, grace: Duration) {
    let deadline = Instant::now() + grace;
    while Instant::now() < deadline && readers.iter().any(|r| !r.is_finished()) {
        thread::sleep(POLL_INTERVAL);
    }
    for reader in readers {
        if reader.is_finished() {
            let _ = reader.join();
        } else {
            debug!("Output reader still open after kill; detaching it");
        }
    }
}

/// Forward every line of `source` as a `Line` event. Bytes are decoded as
/// UTF-8 with invalid sequences replaced; a final unterminated line is still
/// delivered. Nothing is sent once `gate` is closed.
fn spawn_reader<R: Read + Send + 'static>(
    source: R,
    stream: OutputStream,
    tx: Sender<RunEvent>,
    gate: Arc<Mutex<bool>>,
) -> thread::JoinHandle<()> {
    let name = match stream {
        OutputStream::Stdout => "storysleuth-stdout",
        OutputStream::Stderr => "storysleuth-stderr",
    };
    thread::Builder::new()
        .name(name.into())
        .spawn(move || {
            let mut reader = BufReader::new(source);
            let mut buf = Vec::with_capacity(256);
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {
                        let text = String::from_utf8_lossy(&buf);
                        let text = text.trim_end_matches(['\r', '\n']).to_string();
                        let closed = gate.lock();
                        if *closed || tx.send(RunEvent::Line { stream, text }).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        debug!("{name} read error: {err}");
                        break;
                    }
                }
            }
        })
        .expect("failed to spawn output reader thread")
}

/// Kill the child and everything it started (`cmd /C mvn` leaves the JVM
/// running otherwise, as does `sh -c` with its own children). On Unix the
/// child's pid is also its process group id.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        let _ = std::process::Command::new("kill")
            .args(["-KILL", "--", &format!("-{}", child.id())])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
    #[cfg(windows)]
    {
        let _ = std::process::Command::new("taskkill")
            .args(["/PID", &child.id().to_string(), "/T", "/F"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
    if let Err(err) = child.kill() {
        debug!("kill pid {}: {err}", child.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_descriptions() {
        assert!(RunStatus::Exited(Some(0)).success());
        assert!(!RunStatus::Exited(Some(1)).success());
        assert!(!RunStatus::Cancelled.success());
        assert_eq!(RunStatus::Exited(Some(2)).describe(), "failed (exit code 2)");
        assert_eq!(RunStatus::TimedOut.describe(), "timed out");
    }

    #[test]
    fn missing_program_reports_failure() {
        let handle = start_run(
            CommandLine::new("storysleuth-no-such-program-xyz"),
            std::env::temp_dir(),
            None,
        );
        let event = handle
            .events_rx
            .recv_timeout(Duration::from_secs(10))
            .unwrap();
        if cfg!(windows) {
            // `cmd /C` starts fine and reports the missing program itself.
            assert!(matches!(event, RunEvent::Started { .. }));
        } else {
            assert!(matches!(event, RunEvent::Failed(msg) if msg.contains("storysleuth-no-such-program-xyz")));
        }
    }
}
