use std::collections::BTreeMap;

use indexmap::IndexMap;
use strum::IntoEnumIterator;

use crate::record::{ChangeType, CommitRecord};

/// The title of the section breaking commits are additionally listed under
pub const BREAKING_SECTION: &str = "Breaking Changes";

/// The second level of the release notes, i.e. the scopes -> commits.
/// Commits without a scope are keyed by the empty string.
pub type ScopeMap<'a> = BTreeMap<String, Vec<&'a CommitRecord>>;

/// A struct which holds sections to scopes->commits map for one release
pub struct SectionMap<'a> {
    /// The top level map of the release notes, i.e. section title -> scopes.
    /// Breaking changes come first, then one section per change type in
    /// `ChangeType` order. Empty sections are left out.
    pub sections: IndexMap<&'static str, ScopeMap<'a>>,
}

impl<'a> SectionMap<'a> {
    /// Creates a section map from a slice of commits, which we can then
    /// iterate through and write
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use releasedb::{ReleaseStore, SectionMap};
    /// let store = ReleaseStore::new().unwrap();
    /// let release = store.get("0.25.1").unwrap();
    ///
    /// let sm = SectionMap::from_commits(&release.commits);
    /// for (title, scopes) in &sm.sections {
    ///     println!("{title}: {} scopes", scopes.len());
    /// }
    /// ```
    pub fn from_commits(commits: &'a [CommitRecord]) -> SectionMap<'a> {
        let mut by_type: BTreeMap<ChangeType, ScopeMap<'a>> = BTreeMap::new();
        let mut breaking = ScopeMap::new();

        for entry in commits {
            let scope = entry.scopes.join(", ");
            if entry.breaking_change {
                breaking.entry(scope.clone()).or_default().push(entry);
            }
            by_type
                .entry(entry.change_type)
                .or_default()
                .entry(scope)
                .or_default()
                .push(entry);
        }

        let mut sections = IndexMap::new();
        if !breaking.is_empty() {
            sections.insert(BREAKING_SECTION, breaking);
        }
        for ty in ChangeType::iter() {
            if let Some(scopes) = by_type.remove(&ty) {
                sections.insert(ty.section_title(), scopes);
            }
        }

        SectionMap { sections }
    }
}
