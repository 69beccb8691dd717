use std::path::PathBuf;

use serde::Deserialize;

use crate::{fmt::RecordFormat, link_style::LinkStyle};

/// The `[store]` table of a `.releasedb.toml` file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RawStoreCfg {
    /// Directory of `<version>.toml` record files, relative to the config file
    pub releases_dir: Option<PathBuf>,
    /// Multi-record document, relative to the config file
    pub document: Option<PathBuf>,
    pub repository: Option<String>,
    pub link_style: LinkStyle,
    pub output_format: RecordFormat,
    pub outfile: Option<PathBuf>,
    pub deny_unknown_fields: bool,
}
