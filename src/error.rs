use std::{path::PathBuf, result::Result as StdResult};

use thiserror::Error;

pub type Result<T> = StdResult<T, Error>;

/// An enum for describing and handling the errors encountered while loading,
/// querying or writing release records.
///
/// Every load-time variant names the offending version key, and where it
/// applies, the dotted path of the field (e.g. `commits[2].pr_number`).
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to parse config file: {0}")]
    ConfigParse(PathBuf),

    #[error("incorrect format for config file: {0}")]
    ConfigFormat(PathBuf),

    #[error("cannot get current directory")]
    CurrentDir,

    #[error("release {version}: malformed TOML: {source}")]
    Syntax {
        version: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("release {version}: missing required field `{field}`")]
    MissingField { version: String, field: String },

    #[error("release {version}: field `{field}` should be {expected}, found {found}")]
    TypeMismatch {
        version: String,
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("release {version}: field `{field}` {reason}")]
    InvalidField {
        version: String,
        field: String,
        reason: String,
    },

    #[error("release {version}: unknown field `{field}`")]
    UnknownField { version: String, field: String },

    #[error("release {version}: {source}")]
    Decode {
        version: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("release {version}: failed to serialize: {source}")]
    Serialize {
        version: String,
        #[source]
        source: toml::ser::Error,
    },

    #[error("duplicate release version {0}")]
    DuplicateVersion(String),

    #[error("{0:?} is not a valid release version")]
    InvalidVersion(String),

    #[error("no release found for version {0}")]
    NotFound(String),

    #[error("fatal I/O error")]
    Io(#[from] std::io::Error),

    #[error("failed to convert date/time to string format")]
    TimeFormat(#[from] time::error::Format),

    #[error("failed to convert {0} to valid RecordFormat")]
    RecordFormat(String),
}

impl Error {
    /// The version key the error was raised for, if it concerns a single
    /// release
    pub fn version(&self) -> Option<&str> {
        match self {
            Error::Syntax { version, .. }
            | Error::MissingField { version, .. }
            | Error::TypeMismatch { version, .. }
            | Error::InvalidField { version, .. }
            | Error::UnknownField { version, .. }
            | Error::Decode { version, .. }
            | Error::Serialize { version, .. } => Some(version),
            Error::DuplicateVersion(version)
            | Error::InvalidVersion(version)
            | Error::NotFound(version) => Some(version),
            _ => None,
        }
    }

    /// The dotted path of the offending field, for schema errors
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::MissingField { field, .. }
            | Error::TypeMismatch { field, .. }
            | Error::InvalidField { field, .. }
            | Error::UnknownField { field, .. } => Some(field),
            _ => None,
        }
    }
}
