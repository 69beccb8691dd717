use std::{
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::debug;
use semver::Version;
use toml::{value::Table, Value};

use crate::{
    error::{Error, Result},
    record::ReleaseRecord,
    schema::Checker,
};

/// Gathers release records from one or more sources.
///
/// Every source is validated as it is added, and the first error aborts the
/// load. Versions must be unique across all sources.
///
/// # Example
///
/// ```no_run
/// # use releasedb::Loader;
/// let records = Loader::new()
///     .dir("website/releases")
///     .and_then(|l| l.document_file("website/legacy_releases.toml"))
///     .map(Loader::finish)
///     .unwrap();
/// ```
#[derive(Debug, Default)]
pub struct Loader {
    deny_unknown_fields: bool,
    records: IndexMap<String, ReleaseRecord>,
}

impl Loader {
    pub fn new() -> Self { Loader::default() }

    /// Rejects keys the schema doesn't know about instead of logging and
    /// skipping them (Defaults to `false`)
    pub fn deny_unknown_fields(mut self, deny: bool) -> Self {
        self.deny_unknown_fields = deny;
        self
    }

    /// Adds a single record body for `version`
    pub fn record_str<S: AsRef<str>>(mut self, version: S, src: &str) -> Result<Self> {
        let version = version.as_ref();
        debug!("Loading release {version} from string");
        let value = src.parse::<Value>().map_err(|source| Error::Syntax {
            version: version.to_owned(),
            source,
        })?;
        self.insert(version, value)?;
        Ok(self)
    }

    /// Adds a single record file. The file stem is the version key, i.e.
    /// `releases/0.25.1.toml` holds release `0.25.1`.
    pub fn record_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading release file {path:?}");
        let version = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::InvalidVersion(path.display().to_string()))?
            .to_owned();
        let src = fs::read_to_string(path)?;
        self.record_str(version, &src)
    }

    /// Adds every `*.toml` file directly inside `dir`, in semantic version
    /// order. Other files are skipped.
    pub fn dir<P: AsRef<Path>>(mut self, dir: P) -> Result<Self> {
        debug!("Loading release directory {:?}", dir.as_ref());
        let mut files: Vec<(Version, PathBuf)> = Vec::new();
        for entry in fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if !path.is_file() || path.extension().map_or(true, |ext| ext != "toml") {
                debug!("Skipping {path:?}");
                continue;
            }
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            let version =
                Version::parse(stem).map_err(|_| Error::InvalidVersion(stem.to_owned()))?;
            files.push((version, path));
        }
        files.sort();

        for (_, path) in files {
            self = self.record_file(path)?;
        }
        Ok(self)
    }

    /// Adds every release of a multi-record document, whose top level keys
    /// are versions:
    ///
    /// ```toml
    /// ["0.11.1"]
    /// date = "2020-12-17"
    /// whats_next = []
    /// commits = []
    /// ```
    pub fn document_str(mut self, src: &str) -> Result<Self> {
        debug!("Loading release document");
        let table: Table = toml::from_str(src).map_err(|source| Error::Syntax {
            version: "<document>".to_owned(),
            source,
        })?;
        for (version, value) in table {
            self.insert(&version, value)?;
        }
        Ok(self)
    }

    /// Adds every release of a multi-record document file
    pub fn document_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        debug!("Loading release document {:?}", path.as_ref());
        let src = fs::read_to_string(path.as_ref())?;
        self.document_str(&src)
    }

    /// Returns the records in the order they were added
    pub fn finish(self) -> IndexMap<String, ReleaseRecord> { self.records }

    fn insert(&mut self, version: &str, value: Value) -> Result<()> {
        if Version::parse(version).is_err() {
            return Err(Error::InvalidVersion(version.to_owned()));
        }
        if self.records.contains_key(version) {
            return Err(Error::DuplicateVersion(version.to_owned()));
        }

        let table = match value {
            Value::Table(t) => t,
            other => {
                return Err(Error::TypeMismatch {
                    version: version.to_owned(),
                    field: version.to_owned(),
                    expected: "table",
                    found: other.type_str(),
                })
            }
        };
        Checker::new(version, self.deny_unknown_fields).check_release(&table)?;

        let mut record = Value::Table(table)
            .try_into::<ReleaseRecord>()
            .map_err(|source| Error::Decode {
                version: version.to_owned(),
                source,
            })?;
        record.version = version.to_owned();

        debug!(
            "Loaded release {version} with {} commits",
            record.commits.len()
        );
        self.records.insert(version.to_owned(), record);
        Ok(())
    }
}
