/// The story index: the immutable result of one full scan.
///
/// Every view in the application (key lists, value lists, coverage rows,
/// outlines, the story tree) is a pure function of an index. A rescan builds
/// a new index; nothing is updated in place.
use super::story::StoryFile;
use chrono::{DateTime, Local};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

/// Placeholder returned by [`StoryIndex::metatag_lines`] when nothing was found.
pub const NO_METATAGS: &str = "No @metatags found";

/// Placeholder returned by [`StoryIndex::metatag_keys`] when nothing was found.
pub const NO_KEY_METATAGS: &str = "No key / value metatags found";

/// A file the scanner found but could not read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableFile {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct StoryIndex {
    /// The directory that was scanned.
    pub root: PathBuf,
    /// Parsed stories, sorted by relative path.
    pub stories: Vec<StoryFile>,
    pub unreadable: Vec<UnreadableFile>,
    pub scanned_at: DateTime<Local>,
    pub duration: Duration,
}

impl StoryIndex {
    /// An index with no stories, e.g. for a missing root.
    pub fn empty(root: PathBuf) -> Self {
        Self {
            root,
            stories: Vec::new(),
            unreadable: Vec::new(),
            scanned_at: Local::now(),
            duration: Duration::ZERO,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    /// Unique metatag lines, sorted, or the single [`NO_METATAGS`] placeholder.
    pub fn metatag_lines(&self) -> Vec<String> {
        let lines: BTreeSet<&str> = self
            .stories
            .iter()
            .flat_map(|s| s.metatags.iter().map(|t| t.raw.as_str()))
            .collect();
        or_placeholder(lines, NO_METATAGS)
    }

    /// Unique metatag keys, sorted, or the single [`NO_KEY_METATAGS`] placeholder.
    pub fn metatag_keys(&self) -> Vec<String> {
        let keys = self.keys();
        or_placeholder(keys, NO_KEY_METATAGS)
    }

    /// Unique keys without the placeholder.
    pub fn keys(&self) -> BTreeSet<&str> {
        self.stories
            .iter()
            .flat_map(|s| s.metatags.iter().map(|t| t.key.as_str()))
            .collect()
    }

    /// Values recorded for `key`.
    ///
    /// Without stories: unique values, sorted. With stories: one
    /// `"<file name> <value>"` entry per occurrence, sorted, duplicates kept.
    pub fn metatag_values(&self, key: &str, with_stories: bool) -> Vec<String> {
        if with_stories {
            let mut entries: Vec<String> = self
                .stories
                .iter()
                .flat_map(|s| s.values_of(key).map(move |v| format!("{} {v}", s.name)))
                .collect();
            entries.sort();
            entries
        } else {
            self.distinct_values(key)
                .into_iter()
                .map(str::to_string)
                .collect()
        }
    }

    /// Distinct values recorded for `key`, sorted.
    pub fn distinct_values(&self, key: &str) -> BTreeSet<&str> {
        self.stories
            .iter()
            .flat_map(|s| s.metatags.iter())
            .filter(|t| t.key == key)
            .map(|t| t.value.as_str())
            .collect()
    }

    /// Number of metatag lines with this key, across all files.
    pub fn key_occurrences(&self, key: &str) -> usize {
        self.stories.iter().map(|s| s.values_of(key).count()).sum()
    }

    /// Number of metatag lines of any key.
    pub fn total_metatags(&self) -> usize {
        self.stories.iter().map(|s| s.metatags.len()).sum()
    }

    /// File names of every story, in relative-path order.
    pub fn story_names(&self) -> Vec<&str> {
        self.stories.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn scenario_count(&self) -> usize {
        self.stories.iter().map(|s| s.scenarios.len()).sum()
    }

    pub fn step_count(&self) -> usize {
        self.stories
            .iter()
            .flat_map(|s| s.scenarios.iter())
            .map(|sc| sc.steps.len())
            .sum()
    }

    pub fn invalid_count(&self) -> usize {
        self.stories.iter().filter(|s| s.is_invalid()).count()
    }

    pub fn total_bytes(&self) -> u64 {
        self.stories.iter().map(|s| s.size).sum()
    }

    /// Stories carrying a metatag with exactly this key and value.
    pub fn stories_tagged<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
    ) -> impl Iterator<Item = &'a StoryFile> + 'a {
        self.stories
            .iter()
            .filter(move |s| s.values_of(key).any(|v| v == value))
    }
}

fn or_placeholder(items: BTreeSet<&str>, placeholder: &str) -> Vec<String> {
    if items.is_empty() {
        vec![placeholder.to_string()]
    } else {
        items.into_iter().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(files: &[(&str, &str)]) -> StoryIndex {
        let mut idx = StoryIndex::empty(PathBuf::from("/stories"));
        idx.stories = files
            .iter()
            .map(|(name, text)| {
                StoryFile::parse(PathBuf::from("/stories").join(name), name.to_string(), text)
            })
            .collect();
        idx
    }

    #[test]
    fn empty_index_yields_placeholders() {
        let idx = StoryIndex::empty(PathBuf::from("/nowhere"));
        assert_eq!(idx.metatag_lines(), vec![NO_METATAGS]);
        assert_eq!(idx.metatag_keys(), vec![NO_KEY_METATAGS]);
        assert!(idx.metatag_values("@usecase", false).is_empty());
    }

    #[test]
    fn keys_are_unique_and_sorted() {
        let idx = index(&[
            ("a.story", "@usecase 1\n@requirement A\n"),
            ("b.story", "@usecase 2\n"),
        ]);
        assert_eq!(idx.metatag_keys(), vec!["@requirement", "@usecase"]);
        assert_eq!(
            idx.metatag_lines(),
            vec!["@requirement A", "@usecase 1", "@usecase 2"]
        );
    }

    #[test]
    fn values_with_and_without_stories() {
        let idx = index(&[
            ("b.story", "@usecase 2\n@usecase 1\n"),
            ("a.story", "@usecase 1\n"),
        ]);
        assert_eq!(idx.metatag_values("@usecase", false), vec!["1", "2"]);
        assert_eq!(
            idx.metatag_values("@usecase", true),
            vec!["a.story 1", "b.story 1", "b.story 2"]
        );
        assert_eq!(idx.key_occurrences("@usecase"), 3);
        assert_eq!(idx.total_metatags(), 3);
    }

    #[test]
    fn counts_scenarios_and_invalid_names() {
        let idx = index(&[
            ("a.story", "Scenario: one\nGiven x\nScenario: two\n"),
            ("notes.txt", "Scenario: three\nThen y\nAnd z\n"),
        ]);
        assert_eq!(idx.scenario_count(), 3);
        assert_eq!(idx.step_count(), 3);
        assert_eq!(idx.invalid_count(), 1);
        assert_eq!(idx.story_names(), vec!["a.story", "notes.txt"]);
    }

    #[test]
    fn finds_stories_by_tag_value() {
        let idx = index(&[
            ("a.story", "@usecase 1\n"),
            ("b.story", "@usecase 2\n"),
            ("c.story", "@usecase 1\n"),
        ]);
        let names: Vec<_> = idx
            .stories_tagged("@usecase", "1")
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["a.story", "c.story"]);
    }
}
