/// Data model for parsed story trees.
///
/// Re-exports the story, metatag, and index types.
pub mod format;
pub mod index;
pub mod line;
pub mod metatag;
pub mod story;

pub use index::{StoryIndex, UnreadableFile, NO_KEY_METATAGS, NO_METATAGS};
pub use line::{LineKind, StepKeyword};
pub use metatag::Metatag;
pub use story::{NameIssue, Scenario, StoryFile};
