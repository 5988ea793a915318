/// Story reading, saving, and metatag edits.
///
/// Edits work on the text of a story, not on the parsed model, so everything
/// the parser ignores (comments, tables, odd spacing) survives untouched.
/// Line endings are preserved: a file written with `\r\n` keeps `\r\n`.
use crate::error::{CoreError, Result};
use crate::model::line::{self, LineKind};
use crate::model::metatag::key_of;
use crate::model::{StoryFile, StoryIndex};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Read a story for editing. Invalid UTF-8 is an error: a lossy decode
/// would write replacement characters back over the original bytes.
pub fn read_story(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| CoreError::io(path, e))?;
    String::from_utf8(bytes).map_err(|_| CoreError::InvalidUtf8 {
        path: path.to_path_buf(),
    })
}

/// Overwrite a story with `text`, byte for byte.
pub fn save_story(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).map_err(|e| CoreError::io(path, e))?;
    info!("Saved {}", path.display());
    Ok(())
}

/// Look a story up by file name or relative path.
pub fn find_story<'a>(index: &'a StoryIndex, name: &str) -> Result<&'a StoryFile> {
    index
        .stories
        .iter()
        .find(|s| s.relative == name)
        .or_else(|| index.stories.iter().find(|s| s.name == name))
        .ok_or_else(|| CoreError::StoryNotFound(name.to_string()))
}

/// Clean up user input into a metatag: trims and adds the leading `@`.
/// `None` for empty input.
pub fn normalize_tag(input: &str) -> Option<String> {
    let tag = input.trim();
    let tag = tag.strip_prefix('@').unwrap_or(tag).trim_start();
    if tag.is_empty() {
        None
    } else {
        Some(format!("@{tag}"))
    }
}

fn line_ending(text: &str) -> &'static str {
    if text.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

/// Add `tag` to the story-level `Meta:` block: the `Meta:` line that comes
/// before the first scenario. Without one, a new block is prepended.
///
/// Returns `None` when the block already holds the tag.
pub fn add_metatag(text: &str, tag: &str) -> Option<String> {
    let tag = tag.trim();
    let eol = line_ending(text);
    let lines: Vec<&str> = text.split_inclusive('\n').collect();

    let first_scenario = lines
        .iter()
        .position(|l| line::classify(l) == LineKind::Scenario)
        .unwrap_or(lines.len());
    let meta = lines[..first_scenario]
        .iter()
        .position(|l| line::classify(l) == LineKind::MetaKeyword);

    let Some(meta) = meta else {
        return Some(format!("Meta:{eol}{tag}{eol}{eol}{text}"));
    };

    // The block is the run of metatag lines directly under `Meta:`.
    let mut end = meta + 1;
    while end < lines.len() && line::classify(lines[end]) == LineKind::Metatag {
        if line::strip_line_ending(lines[end]).trim_end() == tag {
            return None;
        }
        end += 1;
    }

    let mut out = String::with_capacity(text.len() + tag.len() + eol.len());
    for l in &lines[..end] {
        out.push_str(l);
    }
    if !out.is_empty() && !out.ends_with('\n') {
        out.push_str(eol);
    }
    out.push_str(tag);
    out.push_str(eol);
    for l in &lines[end..] {
        out.push_str(l);
    }
    Some(out)
}

/// Remove metatag lines matching `tag`. A tag with a value (`@usecase 12`)
/// removes lines equal to it; a bare key (`@usecase`) removes every line
/// with that key.
///
/// Returns the new text and the number of lines removed, or `None` when
/// nothing matched.
pub fn remove_metatag(text: &str, tag: &str) -> Option<(String, usize)> {
    let tag = tag.trim();
    let key_only = !tag.contains(char::is_whitespace);

    let mut out = String::with_capacity(text.len());
    let mut removed = 0;
    for l in text.split_inclusive('\n') {
        let is_match = line::classify(l) == LineKind::Metatag && {
            let body = line::strip_line_ending(l).trim_end();
            body == tag || (key_only && key_of(body) == Some(tag))
        };
        if is_match {
            removed += 1;
        } else {
            out.push_str(l);
        }
    }
    (removed > 0).then_some((out, removed))
}

/// A metatag edit applied to many stories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkTagOp {
    Add(String),
    Remove(String),
}

/// Outcome of a bulk edit, per file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub changed: Vec<PathBuf>,
    /// Files the edit did not apply to (tag already present / absent).
    pub unchanged: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BulkReport {
    pub fn summary(&self) -> String {
        format!(
            "{} changed, {} unchanged, {} failed",
            self.changed.len(),
            self.unchanged.len(),
            self.failed.len()
        )
    }
}

/// Apply `op` to every path. Each file is read, edited, and written back on
/// its own; a failure on one file does not stop the others.
pub fn apply_bulk(paths: &[PathBuf], op: &BulkTagOp) -> BulkReport {
    let mut report = BulkReport::default();
    for path in paths {
        let edited = read_story(path).map(|text| match op {
            BulkTagOp::Add(tag) => add_metatag(&text, tag),
            BulkTagOp::Remove(tag) => remove_metatag(&text, tag).map(|(t, _)| t),
        });
        let result = match edited {
            Ok(Some(new_text)) => save_story(path, &new_text).map(|_| true),
            Ok(None) => Ok(false),
            Err(err) => Err(err),
        };
        match result {
            Ok(true) => report.changed.push(path.clone()),
            Ok(false) => report.unchanged.push(path.clone()),
            Err(err) => {
                warn!("Bulk tag edit failed: {err}");
                report.failed.push((path.clone(), err.to_string()));
            }
        }
    }
    info!("Bulk {:?}: {}", op, report.summary());
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_tags() {
        assert_eq!(normalize_tag("  smoke "), Some("@smoke".into()));
        assert_eq!(normalize_tag("@usecase 12"), Some("@usecase 12".into()));
        assert_eq!(normalize_tag("   "), None);
        assert_eq!(normalize_tag("@"), None);
    }

    #[test]
    fn adds_to_existing_story_meta_block() {
        let text = "Narrative:\nMeta:\n@usecase 1\n\nScenario: s\nMeta:\n@wip\nGiven x\n";
        let out = add_metatag(text, "@smoke").unwrap();
        assert_eq!(
            out,
            "Narrative:\nMeta:\n@usecase 1\n@smoke\n\nScenario: s\nMeta:\n@wip\nGiven x\n"
        );
        assert_eq!(add_metatag(&out, "@smoke"), None);
    }

    #[test]
    fn scenario_meta_block_is_not_the_story_block() {
        let text = "Scenario: s\nMeta:\n@wip\nGiven x\n";
        let out = add_metatag(text, "@smoke").unwrap();
        assert_eq!(out, "Meta:\n@smoke\n\nScenario: s\nMeta:\n@wip\nGiven x\n");
    }

    #[test]
    fn preserves_crlf_and_missing_final_newline() {
        let text = "Meta:\r\n@usecase 1";
        let out = add_metatag(text, "@smoke").unwrap();
        assert_eq!(out, "Meta:\r\n@usecase 1\r\n@smoke\r\n");

        let fresh = add_metatag("Scenario: s\r\n", "@smoke").unwrap();
        assert_eq!(fresh, "Meta:\r\n@smoke\r\n\r\nScenario: s\r\n");
    }

    #[test]
    fn removes_by_value_or_key() {
        let text = "Meta:\n@usecase 1\n@usecase 2\n@smoke\nScenario: s\n";

        let (out, n) = remove_metatag(text, "@usecase 2").unwrap();
        assert_eq!(n, 1);
        assert_eq!(out, "Meta:\n@usecase 1\n@smoke\nScenario: s\n");

        let (out, n) = remove_metatag(text, "@usecase").unwrap();
        assert_eq!(n, 2);
        assert_eq!(out, "Meta:\n@smoke\nScenario: s\n");

        assert_eq!(remove_metatag(text, "@missing"), None);
    }

    #[test]
    fn add_then_remove_restores_text() {
        let text = "Meta:\n@usecase 1\n\nScenario: s\n";
        let added = add_metatag(text, "@smoke").unwrap();
        let (removed, _) = remove_metatag(&added, "@smoke").unwrap();
        assert_eq!(removed, text);
    }

    #[test]
    fn bulk_edit_reports_each_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.story");
        let b = dir.path().join("b.story");
        let missing = dir.path().join("gone.story");
        std::fs::write(&a, "Meta:\n@smoke\n").unwrap();
        std::fs::write(&b, "Scenario: s\n").unwrap();

        let report = apply_bulk(
            &[a.clone(), b.clone(), missing.clone()],
            &BulkTagOp::Add("@smoke".into()),
        );
        assert_eq!(report.changed, vec![b.clone()]);
        assert_eq!(report.unchanged, vec![a.clone()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.summary(), "1 changed, 1 unchanged, 1 failed");

        let report = apply_bulk(&[a.clone(), b.clone()], &BulkTagOp::Remove("@smoke".into()));
        assert_eq!(report.changed.len(), 2);
        assert_eq!(std::fs::read_to_string(&b).unwrap(), "Meta:\n\nScenario: s\n");
    }

    #[test]
    fn bulk_edit_leaves_non_utf8_story_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let latin1 = dir.path().join("legacy.story");
        let bytes = b"Meta:\n@usecase 1\n\nScenario: caf\xe9 order\nGiven x\n";
        std::fs::write(&latin1, bytes).unwrap();

        let report = apply_bulk(std::slice::from_ref(&latin1), &BulkTagOp::Add("@smoke".into()));
        assert!(report.changed.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].1.contains("not valid UTF-8"));
        assert_eq!(std::fs::read(&latin1).unwrap(), bytes);
    }

    #[test]
    fn read_story_rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.story");
        std::fs::write(&path, b"Scenario: \xff\n").unwrap();
        assert!(matches!(read_story(&path), Err(CoreError::InvalidUtf8 { .. })));
    }

    #[test]
    fn finds_story_by_name_or_path() {
        let mut index = StoryIndex::empty(PathBuf::from("/s"));
        index.stories.push(StoryFile::parse(
            PathBuf::from("/s/checkout/pay.story"),
            "checkout/pay.story".into(),
            "",
        ));
        assert!(find_story(&index, "pay.story").is_ok());
        assert!(find_story(&index, "checkout/pay.story").is_ok());
        assert!(matches!(
            find_story(&index, "nope.story"),
            Err(CoreError::StoryNotFound(_))
        ));
    }
}
