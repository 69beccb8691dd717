mod md_writer;
mod toml_writer;

use strum::{Display, EnumString};

pub use self::{md_writer::MarkdownWriter, toml_writer::TomlWriter};
pub(crate) use self::toml_writer::document_to_toml;
use crate::{error::Result, record::ReleaseRecord, store::ReleaseStore};

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, EnumString, Display)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum RecordFormat {
    Toml,
    #[default]
    Markdown,
}

string_serde!(RecordFormat);

/// A trait that allows writing a single release record in an arbitrary
/// format. The store is passed along for output options such as the
/// repository and link style.
///
/// `releasedb` provides two default implementors of this trait,
/// `releasedb::fmt::TomlWriter` for the authored record format and
/// `releasedb::fmt::MarkdownWriter` for human readable release notes
pub trait FormatWriter {
    /// Writes `record` using the options of `store`
    fn write_release(&mut self, store: &ReleaseStore, record: &ReleaseRecord) -> Result<()>;
}
