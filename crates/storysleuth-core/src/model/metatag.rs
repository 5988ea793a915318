/// Metatag annotations: `@key value` lines.
use compact_str::CompactString;

/// One parsed metatag line.
///
/// `key` keeps its leading `@`; a trailing `:` (`@usecase: 12`) is dropped so
/// both spellings group under the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Metatag {
    pub key: CompactString,
    pub value: String,
    /// The line as written, without its line ending.
    pub raw: String,
    /// 1-based line number in the story file.
    pub line: usize,
}

impl Metatag {
    /// Parse a metatag line. Returns `None` unless the first character is `@`.
    pub fn parse(line: &str, line_no: usize) -> Option<Self> {
        let raw = super::line::strip_line_ending(line);
        if !raw.starts_with('@') {
            return None;
        }
        let key = key_of(raw)?;
        let rest = raw[raw.find(char::is_whitespace).unwrap_or(raw.len())..].trim();
        let value = rest.strip_prefix(':').unwrap_or(rest).trim();

        Some(Self {
            key: CompactString::new(key),
            value: value.to_string(),
            raw: raw.trim_end().to_string(),
            line: line_no,
        })
    }

    /// `true` when the tag has no value (`@smoke`).
    pub fn is_flag(&self) -> bool {
        self.value.is_empty()
    }
}

/// Extract the key token of a metatag line (`@usecase 15` → `@usecase`).
///
/// `None` when the line is not a metatag or the key is a bare `@`.
pub fn key_of(line: &str) -> Option<&str> {
    let line = line.trim_end();
    if !line.starts_with('@') {
        return None;
    }
    let token = line.split_whitespace().next()?;
    let key = token.strip_suffix(':').unwrap_or(token);
    (key.len() > 1).then_some(key)
}
