/// Coverage aggregation: per-key statistics and requirement coverage.
///
/// A key's *coverage* is the number of distinct values tagged with it divided
/// by the number of requirements in the category the key is bound to. Keys
/// with no binding are untracked; bound keys whose requirement file is
/// missing or empty report coverage as unavailable. Nothing here divides by
/// zero or fails.
use crate::error::{CoreError, Result};
use crate::model::format::format_percent;
use crate::model::StoryIndex;
use crate::scanner::{scan_blocking, ScanOptions};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::warn;

/// Metatag key → requirement category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageBindings {
    map: BTreeMap<String, String>,
}

impl Default for CoverageBindings {
    fn default() -> Self {
        let mut map = BTreeMap::new();
        map.insert("@usecase".to_string(), "Usecases".to_string());
        map.insert("@business_rule".to_string(), "Business Data".to_string());
        Self { map }
    }
}

impl CoverageBindings {
    /// No bindings at all: every key is untracked.
    pub fn none() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        Self { map: map.clone() }
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.map
    }

    pub fn bind(&mut self, key: impl Into<String>, category: impl Into<String>) {
        self.map.insert(key.into(), category.into());
    }

    pub fn category_for(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Requirement count per category. `None` means the category's file could
/// not be loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementTotals {
    totals: BTreeMap<String, Option<usize>>,
}

impl RequirementTotals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: impl Into<String>, total: Option<usize>) {
        self.totals.insert(category.into(), total);
    }

    /// Requirement count for a loaded category.
    pub fn get(&self, category: &str) -> Option<usize> {
        self.totals.get(category).copied().flatten()
    }
}

/// Coverage of one key against its requirement category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coverage {
    Percent(f64),
    /// Bound to a category whose requirement count is missing or zero.
    Unavailable,
    /// Not bound to any category.
    Untracked,
}

impl Coverage {
    fn rank(self) -> (u8, f64) {
        match self {
            Self::Untracked => (0, 0.0),
            Self::Unavailable => (1, 0.0),
            Self::Percent(p) => (2, p),
        }
    }

    /// Total order used for sorting report columns.
    pub fn sort_cmp(self, other: Self) -> Ordering {
        let (ra, pa) = self.rank();
        let (rb, pb) = other.rank();
        ra.cmp(&rb).then(pa.total_cmp(&pb))
    }
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(p) => f.write_str(&format_percent(*p)),
            Self::Unavailable => f.write_str("n/a"),
            Self::Untracked => f.write_str("~"),
        }
    }
}

/// `count / total` as a percentage, `None` when `total` is zero.
pub fn coverage_percent(count: usize, total: usize) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(count as f64 * 100.0 / total as f64)
    }
}

/// Statistics for one metatag key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyStats {
    pub key: String,
    /// Occurrences of the key across all files.
    pub count: usize,
    /// Distinct values recorded for the key.
    pub distinct: usize,
    /// Share of all metatag occurrences; `None` when there are none.
    pub percent: Option<f64>,
    pub coverage: Coverage,
    /// Requirement category the key is bound to, if any.
    pub category: Option<String>,
}

impl KeyStats {
    /// Percent column text: `25.0%`, or `n/a` with no metatags at all.
    pub fn percent_label(&self) -> String {
        self.percent
            .map(format_percent)
            .unwrap_or_else(|| "n/a".to_string())
    }
}

pub fn key_stats(
    index: &StoryIndex,
    key: &str,
    bindings: &CoverageBindings,
    totals: &RequirementTotals,
) -> KeyStats {
    let count = index.key_occurrences(key);
    let distinct = index.distinct_values(key).len();
    let percent = coverage_percent(count, index.total_metatags());

    let category = bindings.category_for(key);
    let coverage = match category {
        None => Coverage::Untracked,
        Some(cat) => totals
            .get(cat)
            .and_then(|total| coverage_percent(distinct, total))
            .map_or(Coverage::Unavailable, Coverage::Percent),
    };

    KeyStats {
        key: key.to_string(),
        count,
        distinct,
        percent,
        coverage,
        category: category.map(str::to_string),
    }
}

/// Scan `root` and compute statistics for `key`. A missing root yields
/// zero counts rather than an error.
pub fn key_coverage(
    root: &Path,
    key: &str,
    bindings: &CoverageBindings,
    totals: &RequirementTotals,
) -> KeyStats {
    let index = scan_blocking(root, &ScanOptions::default()).unwrap_or_else(|err| {
        warn!("{err}");
        StoryIndex::empty(root.to_path_buf())
    });
    key_stats(&index, key, bindings, totals)
}

/// Column of the coverage report, for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportColumn {
    Key,
    Count,
    Percent,
    Coverage,
}

/// One row per metatag key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoverageReport {
    pub rows: Vec<KeyStats>,
    /// Number of distinct keys.
    pub key_count: usize,
    /// Number of metatag occurrences of any key.
    pub total_values: usize,
}

impl CoverageReport {
    pub fn sort_by(&mut self, column: ReportColumn, ascending: bool) {
        self.rows.sort_by(|a, b| {
            let ord = match column {
                ReportColumn::Key => a.key.cmp(&b.key),
                ReportColumn::Count => a.count.cmp(&b.count),
                ReportColumn::Percent => {
                    a.percent.unwrap_or(0.0).total_cmp(&b.percent.unwrap_or(0.0))
                }
                ReportColumn::Coverage => a.coverage.sort_cmp(b.coverage),
            };
            let ord = ord.then_with(|| a.key.cmp(&b.key));
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });
    }

    pub fn row(&self, key: &str) -> Option<&KeyStats> {
        self.rows.iter().find(|r| r.key == key)
    }

    /// Write the report as CSV: `Key,Count,Distinct,Percent,Coverage,Category`.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let to_err = |source| CoreError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = csv::Writer::from_path(path).map_err(to_err)?;
        writer
            .write_record(["Key", "Count", "Distinct", "Percent", "Coverage", "Category"])
            .map_err(to_err)?;
        for row in &self.rows {
            writer
                .write_record([
                    row.key.clone(),
                    row.count.to_string(),
                    row.distinct.to_string(),
                    row.percent_label(),
                    row.coverage.to_string(),
                    row.category.clone().unwrap_or_default(),
                ])
                .map_err(to_err)?;
        }
        writer.flush().map_err(|e| CoreError::io(path, e))?;
        Ok(())
    }
}

/// Statistics for every key in the index, sorted by key.
pub fn build_report(
    index: &StoryIndex,
    bindings: &CoverageBindings,
    totals: &RequirementTotals,
) -> CoverageReport {
    let rows: Vec<KeyStats> = index
        .keys()
        .into_iter()
        .map(|key| key_stats(index, key, bindings, totals))
        .collect();
    CoverageReport {
        key_count: rows.len(),
        total_values: index.total_metatags(),
        rows,
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

    fn totals(entries: &[(&str, Option<usize>)]) -> RequirementTotals {
        let mut t = RequirementTotals::new();
        for (cat, n) in entries {
            t.insert(*cat, *n);
        }
        t
    }

    #[test]
    fn percent_of_total() {
        assert_eq!(coverage_percent(5, 20), Some(25.0));
        assert_eq!(coverage_percent(0, 20), Some(0.0));
        assert_eq!(coverage_percent(5, 0), None);
        assert_eq!(Coverage::Percent(25.0).to_string(), "25.0%");
    }

    #[test]
    fn bound_key_uses_distinct_values() {
        let idx = index(&[
            ("a.story", "@usecase 1\n@usecase 2\n"),
            ("b.story", "@usecase 1\n@smoke\n"),
        ]);
        let stats = key_stats(
            &idx,
            "@usecase",
            &CoverageBindings::default(),
            &totals(&[("Usecases", Some(8))]),
        );
        assert_eq!(stats.count, 3);
        assert_eq!(stats.distinct, 2);
        assert_eq!(stats.percent, Some(75.0));
        assert_eq!(stats.coverage, Coverage::Percent(25.0));
        assert_eq!(stats.category.as_deref(), Some("Usecases"));
    }

    #[test]
    fn zero_or_missing_totals_are_unavailable() {
        let idx = index(&[("a.story", "@usecase 1\n@business_rule BR-1\n")]);
        let bindings = CoverageBindings::default();
        let t = totals(&[("Usecases", Some(0)), ("Business Data", None)]);

        assert_eq!(key_stats(&idx, "@usecase", &bindings, &t).coverage, Coverage::Unavailable);
        assert_eq!(
            key_stats(&idx, "@business_rule", &bindings, &t).coverage,
            Coverage::Unavailable
        );
        assert_eq!(Coverage::Unavailable.to_string(), "n/a");
    }

    #[test]
    fn unbound_keys_are_untracked() {
        let idx = index(&[("a.story", "@requirement A\n")]);
        let stats = key_stats(&idx, "@requirement", &CoverageBindings::default(), &totals(&[]));
        assert_eq!(stats.coverage, Coverage::Untracked);
        assert_eq!(stats.coverage.to_string(), "~");
    }

    #[test]
    fn empty_index_has_no_percentages() {
        let idx = index(&[]);
        let stats = key_stats(&idx, "@usecase", &CoverageBindings::none(), &totals(&[]));
        assert_eq!(stats.count, 0);
        assert_eq!(stats.percent, None);
        assert_eq!(stats.percent_label(), "n/a");
        let report = build_report(&idx, &CoverageBindings::default(), &totals(&[]));
        assert!(report.rows.is_empty());
        assert_eq!(report.total_values, 0);
    }

    #[test]
    fn report_rows_sort_by_column() {
        let idx = index(&[(
            "a.story",
            "@usecase 1\n@usecase 2\n@usecase 3\n@requirement A\n@business_rule X\n@business_rule Y\n",
        )]);
        let t = totals(&[("Usecases", Some(3)), ("Business Data", Some(4))]);
        let mut report = build_report(&idx, &CoverageBindings::default(), &t);
        assert_eq!(report.key_count, 3);
        assert_eq!(report.total_values, 6);

        let keys = |r: &CoverageReport| r.rows.iter().map(|s| s.key.clone()).collect::<Vec<_>>();
        assert_eq!(keys(&report), vec!["@business_rule", "@requirement", "@usecase"]);

        report.sort_by(ReportColumn::Count, false);
        assert_eq!(keys(&report), vec!["@usecase", "@business_rule", "@requirement"]);

        report.sort_by(ReportColumn::Coverage, true);
        assert_eq!(keys(&report), vec!["@requirement", "@business_rule", "@usecase"]);
    }

    #[test]
    fn report_exports_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coverage.csv");
        let idx = index(&[("a.story", "@usecase 1\n")]);
        let report = build_report(
            &idx,
            &CoverageBindings::default(),
            &totals(&[("Usecases", Some(4))]),
        );
        report.write_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Key,Count,Distinct,Percent,Coverage,Category"));
        assert_eq!(lines.next(), Some("@usecase,1,1,100.0%,25.0%,Usecases"));
    }
}
