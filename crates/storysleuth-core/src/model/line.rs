/// Line classification for story files.
///
/// Story files have no enforced grammar, only conventional prefixes. Each
/// line is classified on its own, with no look-behind, so the same function
/// drives scenario extraction, outline export, and editor highlighting.
use std::ops::Range;

/// The four step keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKeyword {
    Given,
    When,
    Then,
    And,
}

impl StepKeyword {
    /// Canonical spelling as written in story files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::And => "And",
        }
    }

    const ALL: [StepKeyword; 4] = [Self::Given, Self::When, Self::Then, Self::And];
}

/// What a single story line is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    /// Empty or whitespace-only.
    Blank,
    /// `Narrative:`, `In order to`, `As a`, `I want to`.
    Narrative,
    /// `Scenario:` header (case-insensitive).
    Scenario,
    /// The `Meta:` keyword that opens a metatag block.
    MetaKeyword,
    /// A metatag annotation: first character is `@`.
    Metatag,
    /// `Given` / `When` / `Then` / `And` step.
    Step(StepKeyword),
    /// `Examples:` header.
    Examples,
    /// A row of an examples table (`|a|b|`).
    TableRow,
    /// A JBehave comment (`!-- ...`).
    Comment,
    /// Anything else.
    Text,
}

const SCENARIO: &str = "Scenario:";
const META: &str = "Meta:";
const EXAMPLES: &str = "Examples:";
const NARRATIVE_KEYWORDS: [&str; 4] = ["Narrative:", "In order to", "As a", "I want to"];

/// Classify one line. Trailing `\r`/`\n` are ignored.
pub fn classify(line: &str) -> LineKind {
    let line = strip_line_ending(line);
    if line.trim().is_empty() {
        return LineKind::Blank;
    }
    // Metatags must start in column 0; an indented `@` is plain text.
    if line.starts_with('@') {
        return LineKind::Metatag;
    }

    let t = line.trim_start();
    if starts_with_ignore_case(t, SCENARIO) {
        return LineKind::Scenario;
    }
    if t.starts_with(META) {
        return LineKind::MetaKeyword;
    }
    if starts_with_ignore_case(t, EXAMPLES) {
        return LineKind::Examples;
    }
    if t.starts_with('|') {
        return LineKind::TableRow;
    }
    if t.starts_with("!--") {
        return LineKind::Comment;
    }
    if NARRATIVE_KEYWORDS
        .iter()
        .any(|kw| t.starts_with(kw) && is_word_end(t, kw.len()))
    {
        return LineKind::Narrative;
    }
    if let Some(kw) = step_keyword(t) {
        return LineKind::Step(kw);
    }
    LineKind::Text
}

/// Byte range of the keyword that gives `line` its classification, for
/// syntax highlighting. `None` for kinds without a keyword.
pub fn keyword_span(line: &str) -> Option<Range<usize>> {
    let body = strip_line_ending(line);
    let indent = body.len() - body.trim_start().len();
    let t = &body[indent..];

    let len = match classify(body) {
        LineKind::Metatag => t.find(char::is_whitespace).unwrap_or(t.len()),
        LineKind::Scenario => SCENARIO.len(),
        LineKind::MetaKeyword => META.len(),
        LineKind::Examples => EXAMPLES.len(),
        LineKind::Narrative => NARRATIVE_KEYWORDS
            .iter()
            .find(|kw| t.starts_with(*kw))
            .map(|kw| kw.len())?,
        LineKind::Step(kw) => kw.as_str().len(),
        LineKind::Blank | LineKind::TableRow | LineKind::Comment | LineKind::Text => return None,
    };
    Some(indent..indent + len)
}

/// Remove a trailing `\n` or `\r\n`.
pub fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn step_keyword(t: &str) -> Option<StepKeyword> {
    StepKeyword::ALL.into_iter().find(|kw| {
        let word = kw.as_str();
        starts_with_ignore_case(t, word) && is_word_end(t, word.len())
    })
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// `true` when the keyword ending at `at` is followed by whitespace or
/// end of line, so `Android` is not mistaken for an `And` step.
fn is_word_end(s: &str, at: usize) -> bool {
    s[at..].chars().next().is_none_or(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_structural_lines() {
        assert_eq!(classify("Scenario: login works\n"), LineKind::Scenario);
        assert_eq!(classify("scenario: lower case"), LineKind::Scenario);
        assert_eq!(classify("Meta:"), LineKind::MetaKeyword);
        assert_eq!(classify("Examples:"), LineKind::Examples);
        assert_eq!(classify("|a|b|"), LineKind::TableRow);
        assert_eq!(classify("!-- a comment"), LineKind::Comment);
        assert_eq!(classify("   \r\n"), LineKind::Blank);
    }

    #[test]
    fn classifies_steps_case_insensitively() {
        assert_eq!(classify("Given a user"), LineKind::Step(StepKeyword::Given));
        assert_eq!(classify("when they log in"), LineKind::Step(StepKeyword::When));
        assert_eq!(classify("THEN it works"), LineKind::Step(StepKeyword::Then));
        assert_eq!(classify("And nothing else"), LineKind::Step(StepKeyword::And));
    }

    #[test]
    fn step_keyword_needs_word_boundary() {
        assert_eq!(classify("Android devices are supported"), LineKind::Text);
        assert_eq!(classify("Thence we go"), LineKind::Text);
    }

    #[test]
    fn metatag_only_in_column_zero() {
        assert_eq!(classify("@usecase 15"), LineKind::Metatag);
        assert_eq!(classify("  @usecase 15"), LineKind::Text);
    }

    #[test]
    fn narrative_keywords() {
        assert_eq!(classify("Narrative:"), LineKind::Narrative);
        assert_eq!(classify("In order to save time"), LineKind::Narrative);
        assert_eq!(classify("As a tester"), LineKind::Narrative);
        assert_eq!(classify("Asymmetric text"), LineKind::Text);
    }

    #[test]
    fn keyword_spans_cover_the_keyword_only() {
        let line = "Scenario: checkout";
        assert_eq!(keyword_span(line), Some(0..9));

        let line = "  Given a basket";
        assert_eq!(&line[keyword_span(line).unwrap()], "Given");

        let line = "@requirement R-12";
        assert_eq!(&line[keyword_span(line).unwrap()], "@requirement");

        assert_eq!(keyword_span("|a|b|"), None);
        assert_eq!(keyword_span("plain prose"), None);
    }
}
