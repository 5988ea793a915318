/// Plain-text outlines of the story tree, for the File → Save menu.
use crate::error::{CoreError, Result};
use crate::model::StoryIndex;
use std::io::Write;
use std::path::Path;

const SCENARIO_PREFIX: &str = "-- ";
const STEP_PREFIX: &str = "---- ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutlineKind {
    /// Story file names.
    Stories,
    /// Every scenario header.
    Scenarios,
    /// Each story followed by its scenarios.
    StoriesAndScenarios,
    /// Each story, its scenarios, and their steps.
    StoriesScenariosAndSteps,
}

impl OutlineKind {
    pub const ALL: [OutlineKind; 4] = [
        Self::Stories,
        Self::Scenarios,
        Self::StoriesAndScenarios,
        Self::StoriesScenariosAndSteps,
    ];

    pub fn default_file_name(self) -> &'static str {
        match self {
            Self::Stories => "stories.txt",
            Self::Scenarios => "scenarios.txt",
            Self::StoriesAndScenarios => "stories-and-scenarios.txt",
            Self::StoriesScenariosAndSteps => "stories-scenarios-steps.txt",
        }
    }

    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Stories => "Save stories…",
            Self::Scenarios => "Save scenarios…",
            Self::StoriesAndScenarios => "Save stories and scenarios…",
            Self::StoriesScenariosAndSteps => "Save stories, scenarios and steps…",
        }
    }
}

/// Render an outline. The flat lists are sorted; the nested ones follow
/// the index's relative-path order.
pub fn render_outline(kind: OutlineKind, index: &StoryIndex) -> Vec<String> {
    match kind {
        OutlineKind::Stories => {
            let mut names: Vec<String> = index.stories.iter().map(|s| s.name.to_string()).collect();
            names.sort();
            names
        }
        OutlineKind::Scenarios => {
            let mut headers: Vec<String> = index
                .stories
                .iter()
                .flat_map(|s| s.scenarios.iter())
                .map(|sc| format!("Scenario: {}", sc.title))
                .collect();
            headers.sort();
            headers
        }
        OutlineKind::StoriesAndScenarios | OutlineKind::StoriesScenariosAndSteps => {
            let with_steps = kind == OutlineKind::StoriesScenariosAndSteps;
            let mut lines = Vec::new();
            for story in &index.stories {
                lines.push(story.name.to_string());
                for scenario in &story.scenarios {
                    lines.push(format!("{SCENARIO_PREFIX}Scenario: {}", scenario.title));
                    if with_steps {
                        lines.extend(scenario.steps.iter().map(|s| format!("{STEP_PREFIX}{s}")));
                    }
                }
            }
            lines
        }
    }
}

/// Write one line per entry, each terminated by `\n`.
pub fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|e| CoreError::io(path, e))?;
    let mut out = std::io::BufWriter::new(file);
    for line in lines {
        writeln!(out, "{line}").map_err(|e| CoreError::io(path, e))?;
    }
    out.flush().map_err(|e| CoreError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StoryFile;
    use std::path::PathBuf;

    fn sample() -> StoryIndex {
        let mut idx = StoryIndex::empty(PathBuf::from("/s"));
        idx.stories = vec![
            StoryFile::parse(
                PathBuf::from("/s/a.story"),
                "a.story".into(),
                "Scenario: zebra\nGiven a\nThen b\n",
            ),
            StoryFile::parse(
                PathBuf::from("/s/b.story"),
                "b.story".into(),
                "Scenario: apple\nWhen c\n",
            ),
        ];
        idx
    }

    #[test]
    fn flat_outlines_are_sorted() {
        let idx = sample();
        assert_eq!(render_outline(OutlineKind::Stories, &idx), vec!["a.story", "b.story"]);
        assert_eq!(
            render_outline(OutlineKind::Scenarios, &idx),
            vec!["Scenario: apple", "Scenario: zebra"]
        );
    }

    #[test]
    fn nested_outline_prefixes() {
        let lines = render_outline(OutlineKind::StoriesScenariosAndSteps, &sample());
        assert_eq!(
            lines,
            vec![
                "a.story",
                "-- Scenario: zebra",
                "---- Given a",
                "---- Then b",
                "b.story",
                "-- Scenario: apple",
                "---- When c",
            ]
        );
        let short = render_outline(OutlineKind::StoriesAndScenarios, &sample());
        assert_eq!(short.len(), 4);
    }

    #[test]
    fn writes_lines_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OutlineKind::Stories.default_file_name());
        write_lines(&path, &render_outline(OutlineKind::Stories, &sample())).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a.story\nb.story\n");
    }
}
