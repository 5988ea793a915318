/// Error type shared by every fallible core operation.
///
/// Variants carry the offending path so the UI can show an actionable
/// message without re-deriving context.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings file {} is invalid: {source}", path.display())]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("settings could not be written to {}: {source}", path.display())]
    SettingsWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("requirements file {} could not be parsed: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("requirements file {} has no header row", path.display())]
    MissingHeader { path: PathBuf },

    #[error("story {} is not valid UTF-8; edit it in its own encoding", path.display())]
    InvalidUtf8 { path: PathBuf },

    #[error("story root {} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("story `{0}` was not found under the story root")]
    StoryNotFound(String),

    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command line is empty")]
    EmptyCommand,
}

impl CoreError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_and_parse_errors_read_differently() {
        let json_err = || serde_json::from_str::<u8>("x").unwrap_err();
        let write = CoreError::SettingsWrite {
            path: PathBuf::from("cfg/settings.json"),
            source: json_err(),
        };
        let parse = CoreError::SettingsParse {
            path: PathBuf::from("cfg/settings.json"),
            source: json_err(),
        };
        let write = write.to_string();
        assert!(write.starts_with("settings could not be written to cfg"));
        assert!(!write.contains("invalid"));
        assert!(parse.to_string().contains("is invalid"));
    }
}
