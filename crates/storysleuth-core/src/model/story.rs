/// A parsed story file.
use super::line::{self, LineKind};
use super::metatag::Metatag;
use compact_str::CompactString;
use std::path::PathBuf;

/// Extension every story file name is expected to carry.
pub const STORY_EXTENSION: &str = ".story";

/// One `Scenario:` block and the steps beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Header text after `Scenario:`, trimmed.
    pub title: String,
    /// 1-based line number of the header.
    pub line: usize,
    /// Step lines (keyword included), trimmed, in file order.
    pub steps: Vec<String>,
}

/// Problems with a story's file name that break runner story filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameIssue {
    ContainsSpace,
    MissingStoryExtension,
}

impl NameIssue {
    pub fn describe(self) -> &'static str {
        match self {
            Self::ContainsSpace => "file name contains a space",
            Self::MissingStoryExtension => "file name does not end in lower-case .story",
        }
    }
}

/// Check a file name against the runner's naming rules.
pub fn name_issues(file_name: &str) -> Vec<NameIssue> {
    let mut issues = Vec::new();
    if file_name.contains(' ') {
        issues.push(NameIssue::ContainsSpace);
    }
    if !file_name.ends_with(STORY_EXTENSION) {
        issues.push(NameIssue::MissingStoryExtension);
    }
    issues
}

/// Everything extracted from one story file.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the story root, `/`-separated. Used as sort key.
    pub relative: String,
    /// File name only; the runner's story filter works on this.
    pub name: CompactString,
    pub metatags: Vec<Metatag>,
    pub scenarios: Vec<Scenario>,
    pub name_issues: Vec<NameIssue>,
    /// Size of the file in bytes.
    pub size: u64,
}

impl StoryFile {
    /// Parse story text. Steps that appear before the first scenario are
    /// not attached to anything and are dropped.
    pub fn parse(path: PathBuf, relative: String, text: &str) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| relative.clone());

        let mut metatags = Vec::new();
        let mut scenarios: Vec<Scenario> = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            match line::classify(raw) {
                LineKind::Metatag => {
                    if let Some(tag) = Metatag::parse(raw, line_no) {
                        metatags.push(tag);
                    }
                }
                LineKind::Scenario => {
                    let t = raw.trim();
                    let title = t.get("Scenario:".len()..).unwrap_or_default().trim();
                    scenarios.push(Scenario {
                        title: title.to_string(),
                        line: line_no,
                        steps: Vec::new(),
                    });
                }
                LineKind::Step(_) => {
                    if let Some(current) = scenarios.last_mut() {
                        current.steps.push(raw.trim().to_string());
                    }
                }
                _ => {}
            }
        }

        Self {
            path,
            relative,
            name_issues: name_issues(&name),
            name: CompactString::new(name),
            metatags,
            scenarios,
            size: text.len() as u64,
        }
    }

    /// `true` when the file name breaks a naming rule.
    pub fn is_invalid(&self) -> bool {
        !self.name_issues.is_empty()
    }

    /// Values of every metatag with the given key, in file order.
    pub fn values_of<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.metatags
            .iter()
            .filter(move |t| t.key == key)
            .map(|t| t.value.as_str())
    }

    /// `true` when any metatag line equals `tag` (with value) or has key
    /// `tag` (key-only).
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.trim();
        self.metatags.iter().any(|t| t.raw == tag || t.key == tag)
    }
}
