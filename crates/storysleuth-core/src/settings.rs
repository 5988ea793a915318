/// The JSON settings file.
///
/// ```json
/// {
///   "Stories": "../src/test/resources/stories",
///   "Requirements": { "Usecases": "usecases.csv", "Business Data": "business-data.csv" },
///   "Coverage": { "@usecase": "Usecases", "@business_rule": "Business Data" },
///   "Runner": { "Program": "mvn", "Browser": "IE" },
///   "Selenium": { "Port": 5555 },
///   "Scan": { "SkipHidden": true }
/// }
/// ```
///
/// Only `Stories` and `Requirements` are expected in hand-written files;
/// every other section falls back to its defaults. Relative paths resolve
/// against the directory holding the settings file.
use crate::analysis::coverage::CoverageBindings;
use crate::error::{CoreError, Result};
use crate::scanner::ScanOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable that overrides the settings file location.
pub const SETTINGS_ENV: &str = "STORYSLEUTH_SETTINGS";

/// Settings file location relative to the executable or working directory.
pub const SETTINGS_RELATIVE_PATH: &str = "data/settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Settings {
    /// Root directory of the story tree.
    pub stories: PathBuf,
    /// Requirement category name → CSV file.
    pub requirements: BTreeMap<String, PathBuf>,
    /// Metatag key → requirement category it measures coverage against.
    pub coverage: BTreeMap<String, String>,
    pub runner: RunnerSettings,
    pub selenium: SeleniumSettings,
    pub scan: ScanOptions,
    /// Where these settings were loaded from. Not serialized.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stories: PathBuf::new(),
            requirements: BTreeMap::new(),
            coverage: CoverageBindings::default().into_map(),
            runner: RunnerSettings::default(),
            selenium: SeleniumSettings::default(),
            scan: ScanOptions::default(),
            source: None,
        }
    }
}

impl Settings {
    /// `$STORYSLEUTH_SETTINGS`, else `data/settings.json` next to the
    /// executable if it exists, else `data/settings.json` in the working
    /// directory.
    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os(SETTINGS_ENV) {
            return PathBuf::from(path);
        }
        let beside_exe = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(SETTINGS_RELATIVE_PATH)));
        match beside_exe {
            Some(path) if path.is_file() => path,
            _ => PathBuf::from(SETTINGS_RELATIVE_PATH),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        let mut settings: Settings =
            serde_json::from_str(&text).map_err(|source| CoreError::SettingsParse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.source = Some(path.to_path_buf());
        info!(
            "Loaded settings from {} ({} requirement categories)",
            path.display(),
            settings.requirements.len()
        );
        Ok(settings)
    }

    /// Write pretty JSON, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| {
            CoreError::SettingsWrite {
                path: path.to_path_buf(),
                source,
            }
        })?;
        std::fs::write(path, json + "\n").map_err(|e| CoreError::io(path, e))?;
        info!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Directory relative paths are resolved against.
    pub fn base_dir(&self) -> PathBuf {
        self.source
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// Resolve a configured path. Absolute paths are returned unchanged.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path.as_os_str().is_empty() {
            path.to_path_buf()
        } else {
            self.base_dir().join(path)
        }
    }

    pub fn stories_root(&self) -> PathBuf {
        self.resolve(&self.stories)
    }

    /// Requirement categories with their resolved CSV paths, sorted by name.
    pub fn requirement_paths(&self) -> Vec<(String, PathBuf)> {
        self.requirements
            .iter()
            .map(|(name, path)| (name.clone(), self.resolve(path)))
            .collect()
    }

    pub fn coverage_bindings(&self) -> CoverageBindings {
        CoverageBindings::from_map(&self.coverage)
    }

    /// Selenium settings with the jar and driver paths resolved.
    pub fn resolved_selenium(&self) -> SeleniumSettings {
        SeleniumSettings {
            server_jar: self.resolve(&self.selenium.server_jar),
            ie_driver: self.resolve(&self.selenium.ie_driver),
            ..self.selenium.clone()
        }
    }

    /// Report page to open after a run, resolved against `working_dir`.
    pub fn report_path(&self, working_dir: &Path) -> PathBuf {
        if self.runner.report_path.is_absolute() {
            self.runner.report_path.clone()
        } else {
            working_dir.join(&self.runner.report_path)
        }
    }

    /// Configured runner working directory, resolved.
    pub fn runner_working_dir(&self) -> Option<PathBuf> {
        self.runner.working_dir.as_deref().map(|d| self.resolve(d))
    }
}

/// Browser the remote WebDriver should drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Browser {
    #[default]
    #[serde(rename = "IE")]
    Ie,
    Chrome,
    Firefox,
    #[serde(rename = "PhantomJS")]
    PhantomJs,
}

impl Browser {
    pub const ALL: [Browser; 4] = [Self::Ie, Self::Chrome, Self::Firefox, Self::PhantomJs];

    /// Value of `-Dwebdriver.driver`.
    pub fn driver_name(self) -> &'static str {
        match self {
            Self::Ie => "iexplorer",
            Self::Chrome => "chrome",
            Self::Firefox => "firefox",
            Self::PhantomJs => "phantomjs",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ie => "IE",
            Self::Chrome => "Chrome",
            Self::Firefox => "Firefox",
            Self::PhantomJs => "PhantomJS",
        }
    }
}

/// How the Maven/Serenity test run is launched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct RunnerSettings {
    pub program: String,
    pub goals: Vec<String>,
    pub remote_url: String,
    pub browser: Browser,
    /// `serenity.take.screenshots` policy.
    pub screenshots: String,
    pub ignore_failures: bool,
    /// Passed as `--settings <file>` when set.
    pub maven_settings: Option<PathBuf>,
    /// Directory the build runs in; derived from the story root when unset.
    pub working_dir: Option<PathBuf>,
    /// Serenity report, relative to the working directory.
    pub report_path: PathBuf,
    /// System property carrying the run-as user name.
    pub user_property: String,
    /// System property carrying the run-as password.
    pub password_property: String,
    pub extra_args: Vec<String>,
    /// Kill the run after this many seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            program: "mvn".into(),
            goals: vec!["verify".into(), "serenity:aggregate".into()],
            remote_url: "http://127.0.0.1:5555/wd/hub".into(),
            browser: Browser::Ie,
            screenshots: "FOR_FAILURES".into(),
            ignore_failures: true,
            maven_settings: None,
            working_dir: None,
            report_path: PathBuf::from("target/site/serenity/index.html"),
            user_property: "webdriver.remote.user".into(),
            password_property: "webdriver.remote.password".into(),
            extra_args: Vec::new(),
            timeout_secs: None,
        }
    }
}

/// The standalone Selenium server started from the Run menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SeleniumSettings {
    pub java: String,
    pub server_jar: PathBuf,
    pub ie_driver: PathBuf,
    pub port: u16,
}

impl Default for SeleniumSettings {
    fn default() -> Self {
        Self {
            java: "java".into(),
            server_jar: PathBuf::from("extra/selenium-server-standalone-2.43.1.jar"),
            ie_driver: PathBuf::from("extra/IEDriverServer.exe"),
            port: 5555,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{ "Stories": "stories", "Requirements": { "Usecases": "uc.csv" } }"#,
        )
        .unwrap();

        let s = Settings::load(&path).unwrap();
        assert_eq!(s.stories_root(), dir.path().join("stories"));
        assert_eq!(
            s.requirement_paths(),
            vec![("Usecases".to_string(), dir.path().join("uc.csv"))]
        );
        assert_eq!(s.runner.program, "mvn");
        assert_eq!(s.runner.browser, Browser::Ie);
        assert_eq!(s.selenium.port, 5555);
        assert_eq!(s.coverage.get("@usecase").map(String::as_str), Some("Usecases"));
    }

    #[test]
    fn absolute_paths_are_kept() {
        let s = Settings {
            source: Some(PathBuf::from("/etc/storysleuth/settings.json")),
            ..Settings::default()
        };
        let abs = std::env::temp_dir().join("stories");
        assert_eq!(s.resolve(&abs), abs);
        assert_eq!(
            s.resolve(Path::new("csv/uc.csv")),
            PathBuf::from("/etc/storysleuth/csv/uc.csv")
        );
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("settings.json");

        let mut s = Settings::default();
        s.stories = PathBuf::from("stories");
        s.runner.browser = Browser::PhantomJs;
        s.runner.timeout_secs = Some(600);
        s.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"Browser\": \"PhantomJS\""));

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.runner, s.runner);
        assert_eq!(loaded.stories, s.stories);
        assert_eq!(loaded.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn invalid_json_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(err, CoreError::SettingsParse { .. }));
        assert!(err.to_string().contains("settings.json"));
    }

    #[test]
    fn browser_driver_names() {
        assert_eq!(Browser::Ie.driver_name(), "iexplorer");
        assert_eq!(Browser::PhantomJs.driver_name(), "phantomjs");
        assert_eq!(Browser::ALL.len(), 4);
    }
}
