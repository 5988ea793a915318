/// Analysis engines that derive views from a finished [`StoryIndex`].
///
/// - [`coverage`]: per-key counts, percentages, and requirement coverage.
/// - [`matrix`]: requirement-by-story coverage matrix.
/// - [`outline`]: plain-text story/scenario/step outlines.
///
/// [`StoryIndex`]: crate::model::StoryIndex
pub mod coverage;
pub mod matrix;
pub mod outline;

pub use coverage::{
    build_report, coverage_percent, key_coverage, key_stats, Coverage, CoverageBindings,
    CoverageReport, KeyStats, ReportColumn, RequirementTotals,
};
pub use matrix::{coverage_matrix, CoverageMatrix};
pub use outline::{render_outline, write_lines, OutlineKind};
