/// Command-line construction for the Maven/Serenity test run.
use crate::error::{CoreError, Result};
use crate::settings::{Browser, RunnerSettings};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Shown in place of credential values.
pub const MASK: &str = "********";

/// Build file whose presence marks the project root.
const PROJECT_MARKER: &str = "pom.xml";

/// A program plus arguments, with some arguments marked secret so they
/// can be masked in logs and on screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    /// Indices into `args` whose value part must be masked.
    secret: BTreeSet<usize>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add `-D<property>=<value>` with the value masked on display.
    pub fn secret_property(mut self, property: &str, value: &str) -> Self {
        self.secret.insert(self.args.len());
        self.args.push(format!("-D{property}={value}"));
        self
    }

    /// The full command line, credentials included.
    pub fn display(&self) -> String {
        self.render(false)
    }

    /// The command line with secret values replaced by [`MASK`].
    pub fn display_masked(&self) -> String {
        self.render(true)
    }

    fn render(&self, masked: bool) -> String {
        std::iter::once(quote(&self.program))
            .chain(self.args.iter().enumerate().map(|(i, arg)| {
                if masked && self.secret.contains(&i) {
                    quote(&mask_value(arg))
                } else {
                    quote(arg)
                }
            }))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Parse an edited command line. Double quotes group words; there is no
    /// escape syntax.
    pub fn parse(text: &str) -> Result<Self> {
        let mut words = split_words(text).into_iter();
        let program = words.next().ok_or(CoreError::EmptyCommand)?;
        Ok(Self::new(program).args(words))
    }

    /// Parse an edited version of `original.display_masked()`. Masked
    /// arguments the user left untouched get their real values back.
    pub fn parse_edited(text: &str, original: &CommandLine) -> Result<Self> {
        let mut parsed = Self::parse(text)?;
        for (i, arg) in parsed.args.iter_mut().enumerate() {
            let restored = original
                .secret
                .iter()
                .filter_map(|&j| original.args.get(j))
                .find(|real| mask_value(real) == *arg);
            if let Some(real) = restored {
                *arg = real.clone();
                parsed.secret.insert(i);
            }
        }
        Ok(parsed)
    }

    /// A `std::process::Command` for this line. On Windows the line goes
    /// through `cmd /C` so `.cmd`/`.bat` launchers such as `mvn` resolve.
    pub fn to_command(&self) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(&self.program).args(&self.args);
            cmd
        } else {
            let mut cmd = Command::new(&self.program);
            cmd.args(&self.args);
            cmd
        }
    }
}

fn mask_value(arg: &str) -> String {
    match arg.split_once('=') {
        Some((name, _)) => format!("{name}={MASK}"),
        None => MASK.to_string(),
    }
}

fn quote(word: &str) -> String {
    if word.is_empty() || word.contains(char::is_whitespace) {
        format!("\"{word}\"")
    } else {
        word.to_string()
    }
}

fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_word = false;

    for ch in text.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_word = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_word {
                    words.push(std::mem::take(&mut current));
                    has_word = false;
                }
            }
            c => {
                current.push(c);
                has_word = true;
            }
        }
    }
    if has_word {
        words.push(current);
    }
    words
}

/// Run-as credentials passed to the remote WebDriver.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

/// What the user asked to run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TestRunRequest {
    /// JBehave meta-filter expression, e.g. `+smoke -wip`.
    pub metafilter: String,
    /// Story file names; empty runs every story.
    pub stories: Vec<String>,
    pub credentials: Option<Credentials>,
    /// Overrides the configured browser.
    pub browser: Option<Browser>,
}

pub fn build_test_command(settings: &RunnerSettings, request: &TestRunRequest) -> CommandLine {
    let browser = request.browser.unwrap_or(settings.browser);
    let mut cmd = CommandLine::new(settings.program.clone())
        .args(settings.goals.iter().cloned())
        .arg(format!("-Dwebdriver.driver={}", browser.driver_name()))
        .arg(format!("-Dwebdriver.remote.url={}", settings.remote_url))
        .arg(format!("-Dserenity.take.screenshots={}", settings.screenshots));

    if settings.ignore_failures {
        cmd = cmd.arg("-Dmaven.test.failure.ignore=true");
    }
    let metafilter = request.metafilter.trim();
    if !metafilter.is_empty() {
        cmd = cmd.arg(format!("-Dmetafilter={metafilter}"));
    }
    if !request.stories.is_empty() {
        cmd = cmd.arg(format!(
            "-DrelativeStoryNamesToRun={}",
            request.stories.join(",")
        ));
    }
    if let Some(file) = &settings.maven_settings {
        cmd = cmd.arg("--settings").arg(file.display().to_string());
    }
    if let Some(creds) = request.credentials.as_ref().filter(|c| !c.user.is_empty()) {
        cmd = cmd
            .secret_property(&settings.user_property, &creds.user)
            .secret_property(&settings.password_property, &creds.password);
    }
    cmd.args(settings.extra_args.iter().cloned())
}

/// Directory the build runs in: the configured one, else the nearest
/// ancestor of the story root holding a `pom.xml`, else the story root.
pub fn resolve_working_dir(stories_root: &Path, configured: Option<&Path>) -> PathBuf {
    if let Some(dir) = configured.filter(|d| !d.as_os_str().is_empty()) {
        return dir.to_path_buf();
    }
    stories_root
        .ancestors()
        .find(|dir| dir.join(PROJECT_MARKER).is_file())
        .unwrap_or(stories_root)
        .to_path_buf()
}
