/// Test-runner plumbing: command building and streamed child processes.
///
/// - [`command`]: the Maven/Serenity command line and its working directory.
/// - [`process`]: background execution with line-by-line output events.
/// - [`selenium`]: the standalone Selenium server command.
pub mod command;
pub mod process;
pub mod selenium;

pub use command::{
    build_test_command, resolve_working_dir, CommandLine, Credentials, TestRunRequest,
};
pub use process::{start_run, OutputStream, RunEvent, RunHandle, RunStatus};
pub use selenium::build_selenium_command;
