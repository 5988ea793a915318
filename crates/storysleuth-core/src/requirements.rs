/// Requirement lists loaded from CSV files.
///
/// Each configured category (e.g. "Usecases") points at a CSV file with a
/// header row. The first column holds the requirement id; the number of data
/// rows is the category total that coverage is measured against.
use crate::analysis::coverage::RequirementTotals;
use crate::error::{CoreError, Result};
use crate::settings::Settings;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One category's CSV contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementTable {
    pub category: String,
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RequirementTable {
    /// Read a CSV file. A UTF-8 byte-order mark is ignored, rows may have
    /// differing lengths, and rows with only empty fields are skipped.
    pub fn load(category: impl Into<String>, path: &Path) -> Result<Self> {
        let to_err = |source| CoreError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let file = std::fs::File::open(path).map_err(|e| CoreError::io(path, e))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers: Vec<String> = reader
            .byte_headers()
            .map_err(to_err)?
            .iter()
            .map(decode_field)
            .collect();
        let headers = strip_bom(headers);
        if headers.iter().all(|h| h.is_empty()) {
            return Err(CoreError::MissingHeader {
                path: path.to_path_buf(),
            });
        }

        let mut rows = Vec::new();
        for record in reader.byte_records() {
            let record = record.map_err(to_err)?;
            let row: Vec<String> = record.iter().map(decode_field).collect();
            if row.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            rows.push(row);
        }

        let category = category.into();
        info!(
            "Loaded {} requirements for '{category}' from {}",
            rows.len(),
            path.display()
        );
        Ok(Self {
            category,
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    /// Number of requirements (data rows, header excluded).
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// Requirement ids: the first column of every row, trimmed.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(|row| row.first().map(|f| f.trim()).unwrap_or_default())
    }

    /// Row for a requirement id, if present.
    pub fn find(&self, id: &str) -> Option<&[String]> {
        self.rows
            .iter()
            .find(|row| row.first().is_some_and(|f| f.trim() == id))
            .map(Vec::as_slice)
    }
}

/// Decode a field, replacing invalid UTF-8 rather than rejecting the file.
fn decode_field(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn strip_bom(mut headers: Vec<String>) -> Vec<String> {
    if let Some(first) = headers.first_mut() {
        if let Some(rest) = first.strip_prefix('\u{feff}') {
            *first = rest.to_string();
        }
    }
    headers
}

/// Every configured category, loaded or not.
#[derive(Debug, Clone, Default)]
pub struct RequirementSet {
    tables: BTreeMap<String, RequirementTable>,
    /// Category → load error, for categories whose file failed.
    errors: BTreeMap<String, String>,
    /// Category → path, including failed ones.
    paths: BTreeMap<String, PathBuf>,
}

impl RequirementSet {
    /// Load every category configured in `settings`. Failures are recorded
    /// per category and logged, never returned.
    pub fn load(settings: &Settings) -> Self {
        Self::load_paths(settings.requirement_paths())
    }

    pub fn load_paths(entries: impl IntoIterator<Item = (String, PathBuf)>) -> Self {
        let mut set = Self::default();
        for (category, path) in entries {
            set.reload(&category, path);
        }
        set
    }

    /// (Re)load one category from `path`, replacing any previous result.
    pub fn reload(&mut self, category: &str, path: PathBuf) -> bool {
        self.paths.insert(category.to_string(), path.clone());
        match RequirementTable::load(category, &path) {
            Ok(table) => {
                self.errors.remove(category);
                self.tables.insert(category.to_string(), table);
                true
            }
            Err(err) => {
                warn!("Requirement category '{category}': {err}");
                self.tables.remove(category);
                self.errors.insert(category.to_string(), err.to_string());
                false
            }
        }
    }

    /// Category names, sorted.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    pub fn table(&self, category: &str) -> Option<&RequirementTable> {
        self.tables.get(category)
    }

    pub fn error(&self, category: &str) -> Option<&str> {
        self.errors.get(category).map(String::as_str)
    }

    pub fn path(&self, category: &str) -> Option<&Path> {
        self.paths.get(category).map(PathBuf::as_path)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Requirement counts for coverage; failed categories map to `None`.
    pub fn totals(&self) -> RequirementTotals {
        let mut totals = RequirementTotals::new();
        for category in self.paths.keys() {
            totals.insert(category.clone(), self.tables.get(category).map(|t| t.count()));
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn loads_headers_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "uc.csv",
            "Id,Title,Owner\nUC-1,Login,ann\nUC-2,Logout\n,,\n UC-3 ,Pay,bob\n",
        );
        let table = RequirementTable::load("Usecases", &path).unwrap();
        assert_eq!(table.headers, vec!["Id", "Title", "Owner"]);
        assert_eq!(table.count(), 3);
        assert_eq!(table.ids().collect::<Vec<_>>(), vec!["UC-1", "UC-2", "UC-3"]);
        assert_eq!(table.find("UC-2").map(|r| r.len()), Some(2));
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bom.csv", "\u{feff}Id,Name\n1,a\n");
        let table = RequirementTable::load("X", &path).unwrap();
        assert_eq!(table.headers[0], "Id");
        assert_eq!(table.count(), 1);
    }

    #[test]
    fn empty_file_has_no_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "empty.csv", "");
        assert!(matches!(
            RequirementTable::load("X", &path),
            Err(CoreError::MissingHeader { .. })
        ));
    }

    #[test]
    fn set_records_failures_per_category() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(dir.path(), "uc.csv", "Id\n1\n2\n");
        let missing = dir.path().join("nope.csv");

        let mut set = RequirementSet::load_paths([
            ("Usecases".to_string(), good),
            ("Business Data".to_string(), missing),
        ]);
        assert_eq!(
            set.categories().collect::<Vec<_>>(),
            vec!["Business Data", "Usecases"]
        );
        assert!(set.table("Usecases").is_some());
        assert!(set.error("Business Data").is_some());

        let totals = set.totals();
        assert_eq!(totals.get("Usecases"), Some(2));
        assert_eq!(totals.get("Business Data"), None);

        let fixed = write(dir.path(), "bd.csv", "Id\nBR-1\n");
        assert!(set.reload("Business Data", fixed));
        assert!(set.error("Business Data").is_none());
        assert_eq!(set.totals().get("Business Data"), Some(1));
    }
}
