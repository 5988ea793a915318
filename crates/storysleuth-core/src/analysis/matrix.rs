/// Coverage matrix: which stories cover which requirement.
///
/// Rows are the requirement ids of one category (first CSV column). A story
/// covers a requirement when it carries the bound key with a value equal to
/// the id, compared after trimming, or numerically when both sides parse as
/// numbers (`@usecase 015` covers requirement `15`). Tagged values that match
/// no requirement are reported as orphans.
use crate::error::{CoreError, Result};
use crate::model::StoryIndex;
use crate::requirements::RequirementTable;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixRow {
    pub id: String,
    /// File names of covering stories, sorted.
    pub stories: Vec<String>,
}

impl MatrixRow {
    pub fn is_covered(&self) -> bool {
        !self.stories.is_empty()
    }
}

/// A tagged value that names no known requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanValue {
    pub value: String,
    pub stories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageMatrix {
    pub key: String,
    pub category: String,
    pub rows: Vec<MatrixRow>,
    pub orphans: Vec<OrphanValue>,
}

impl CoverageMatrix {
    pub fn covered(&self) -> usize {
        self.rows.iter().filter(|r| r.is_covered()).count()
    }

    pub fn total(&self) -> usize {
        self.rows.len()
    }

    /// Export as CSV: one line per requirement, then one per orphan value.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let to_err = |source| CoreError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = csv::Writer::from_path(path).map_err(to_err)?;
        writer
            .write_record(["Requirement", "Covered", "Stories"])
            .map_err(to_err)?;
        for row in &self.rows {
            let covered = if row.is_covered() { "yes" } else { "no" };
            let stories = row.stories.join(" ");
            writer
                .write_record([row.id.as_str(), covered, stories.as_str()])
                .map_err(to_err)?;
        }
        for orphan in &self.orphans {
            let label = format!("{} {} (no requirement)", self.key, orphan.value);
            let stories = orphan.stories.join(" ");
            writer
                .write_record([label.as_str(), "orphan", stories.as_str()])
                .map_err(to_err)?;
        }
        writer.flush().map_err(|e| CoreError::io(path, e))?;
        Ok(())
    }
}

/// `true` when a tagged value names a requirement id.
pub fn values_match(value: &str, id: &str) -> bool {
    let (value, id) = (value.trim(), id.trim());
    if value == id {
        return true;
    }
    match (value.parse::<f64>(), id.parse::<f64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

pub fn coverage_matrix(index: &StoryIndex, key: &str, table: &RequirementTable) -> CoverageMatrix {
    // value → stories carrying it
    let mut by_value: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for story in &index.stories {
        for value in story.values_of(key) {
            by_value.entry(value).or_default().insert(story.name.as_str());
        }
    }

    let mut matched: BTreeSet<&str> = BTreeSet::new();
    let rows = table
        .ids()
        .filter(|id| !id.is_empty())
        .map(|id| {
            let mut stories: BTreeSet<&str> = BTreeSet::new();
            for (value, names) in &by_value {
                if values_match(value, id) {
                    matched.insert(*value);
                    stories.extend(names.iter().copied());
                }
            }
            MatrixRow {
                id: id.to_string(),
                stories: stories.into_iter().map(str::to_string).collect(),
            }
        })
        .collect();

    let orphans = by_value
        .iter()
        .filter(|(value, _)| !matched.contains(*value))
        .map(|(value, names)| OrphanValue {
            value: value.to_string(),
            stories: names.iter().map(|n| n.to_string()).collect(),
        })
        .collect();

    CoverageMatrix {
        key: key.to_string(),
        category: table.category.clone(),
        rows,
        orphans,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StoryFile;
    use std::path::PathBuf;

    fn index(files: &[(&str, &str)]) -> StoryIndex {
        let mut idx = StoryIndex::empty(PathBuf::from("/s"));
        idx.stories = files
            .iter()
            .map(|(n, t)| StoryFile::parse(PathBuf::from("/s").join(n), n.to_string(), t))
            .collect();
        idx
    }

    fn table(ids: &[&str]) -> RequirementTable {
        RequirementTable {
            category: "Usecases".into(),
            path: PathBuf::from("uc.csv"),
            headers: vec!["Id".into()],
            rows: ids.iter().map(|id| vec![id.to_string()]).collect(),
        }
    }

    #[test]
    fn matches_trimmed_and_numeric_values() {
        assert!(values_match(" 15 ", "15"));
        assert!(values_match("015", "15"));
        assert!(values_match("2.0", "2"));
        assert!(!values_match("UC-1", "UC-10"));
        assert!(!values_match("abc", "ABC"));
    }

    #[test]
    fn rows_list_covering_stories_and_orphans() {
        let idx = index(&[
            ("b.story", "@usecase 1\n@usecase 7\n"),
            ("a.story", "@usecase 01\n"),
            ("c.story", "@usecase 3\n"),
        ]);
        let m = coverage_matrix(&idx, "@usecase", &table(&["1", "2", "3"]));

        assert_eq!(m.total(), 3);
        assert_eq!(m.covered(), 2);
        assert_eq!(m.rows[0].stories, vec!["a.story", "b.story"]);
        assert!(!m.rows[1].is_covered());
        assert_eq!(m.rows[2].stories, vec!["c.story"]);
        assert_eq!(
            m.orphans,
            vec![OrphanValue {
                value: "7".into(),
                stories: vec!["b.story".into()]
            }]
        );
    }

    #[test]
    fn exports_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.csv");
        let idx = index(&[("a.story", "@usecase 1\n@usecase 9\n")]);
        coverage_matrix(&idx, "@usecase", &table(&["1", "2"]))
            .write_csv(&path)
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Requirement,Covered,Stories");
        assert_eq!(lines[1], "1,yes,a.story");
        assert_eq!(lines[2], "2,no,");
        assert_eq!(lines[3], "@usecase 9 (no requirement),orphan,a.story");
    }
}
