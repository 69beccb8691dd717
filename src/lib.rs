//! Load, validate and query a project's release records.
//!
//! Each release is a TOML document keyed by its version, holding the release
//! date, optional notes, and the commits that shipped in it. Records are
//! validated field by field at load time and never change afterwards.
//!
//! ```no_run
//! # use releasedb::ReleaseStore;
//! let store = ReleaseStore::with_dir("website/releases").unwrap();
//! for release in store.chronological() {
//!     println!("{} ({}): {} commits", release.version, release.date, release.commits.len());
//! }
//! ```

#[macro_use]
mod macros;
mod config;
pub mod error;
pub mod fmt;
mod link_style;
mod loader;
pub mod record;
mod schema;
mod sectionmap;
mod store;

pub use link_style::LinkStyle;
pub use loader::Loader;
pub use record::{ChangeType, ChangelogEntry, CommitRecord, ReleaseRecord, WhatsNext};
pub use sectionmap::{SectionMap, BREAKING_SECTION};
pub use store::ReleaseStore;

// The default config file
const DEFAULT_CONFIG_FILE: &str = ".releasedb.toml";
