use std::io;

use indexmap::IndexMap;
use log::debug;
use toml::{value::Table, Value};

use crate::{
    error::{Error, Result},
    fmt::FormatWriter,
    record::ReleaseRecord,
    store::ReleaseStore,
};

/// Wraps a `std::io::Write` object to write a release in the same TOML
/// format the loader reads. Loading the output again yields an equal record.
///
/// # Example
///
/// ```no_run
/// # use std::fs::File;
/// # use releasedb::{ReleaseStore, fmt::TomlWriter};
/// let store = ReleaseStore::new().unwrap();
///
/// let mut file = File::create("0.25.1.toml").unwrap();
/// let mut writer = TomlWriter::new(&mut file);
///
/// store.write_release_with("0.25.1", &mut writer).unwrap();
/// ```
pub struct TomlWriter<'a>(&'a mut dyn io::Write);

impl<'a> TomlWriter<'a> {
    pub fn new<T: io::Write + 'a>(writer: &'a mut T) -> TomlWriter<'a> { TomlWriter(writer) }
}

impl<'a> FormatWriter for TomlWriter<'a> {
    fn write_release(&mut self, _store: &ReleaseStore, record: &ReleaseRecord) -> Result<()> {
        debug!("Writing TOML for release {}", record.version);
        let body = record_to_toml(record)?;
        self.0.write_all(body.as_bytes())?;
        self.0.flush().map_err(Into::into)
    }
}

fn record_value(record: &ReleaseRecord) -> Result<Value> {
    Value::try_from(record).map_err(|source| Error::Serialize {
        version: record.version.clone(),
        source,
    })
}

// Going through `Value` puts plain keys ahead of arrays of tables no matter
// the field order, which the TOML serializer requires.
pub(crate) fn record_to_toml(record: &ReleaseRecord) -> Result<String> {
    toml::to_string_pretty(&record_value(record)?).map_err(|source| Error::Serialize {
        version: record.version.clone(),
        source,
    })
}

pub(crate) fn document_to_toml(records: &IndexMap<String, ReleaseRecord>) -> Result<String> {
    let mut doc = Table::new();
    for (version, record) in records {
        doc.insert(version.clone(), record_value(record)?);
    }
    toml::to_string_pretty(&Value::Table(doc)).map_err(|source| Error::Serialize {
        version: "<document>".to_owned(),
        source,
    })
}
