/// StorySleuth Core -- story scanning, metatag analysis, and test-run plumbing.
///
/// This crate contains all business logic with zero UI dependencies.
/// It is designed to be reusable across different frontends (GUI, CLI, TUI).
///
/// # Modules
///
/// - [`model`] -- Parsed story files, metatags, line classification, and the scan index.
/// - [`scanner`] -- Background story-tree scanning with progress reporting.
/// - [`analysis`] -- Coverage aggregation, coverage matrix, and outline export.
/// - [`requirements`] -- Requirement lists loaded from CSV files.
/// - [`settings`] -- The JSON settings file.
/// - [`runner`] -- Test-runner command building and streamed child processes.
/// - [`editing`] -- Story reading, saving, and bulk metatag edits.
pub mod analysis;
pub mod editing;
pub mod error;
pub mod model;
pub mod requirements;
pub mod runner;
pub mod scanner;
pub mod settings;

pub use error::{CoreError, Result};
