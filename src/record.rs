//! The typed release record model.
//!
//! Records are produced by the loader after schema validation and never
//! mutated afterwards.

use semver::Version;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, EnumVariantNames};
use time::{macros::format_description, Date, PrimitiveDateTime};

/// The category of a change, as used by both commits and changelog entries
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    EnumString,
    Display,
    EnumIter,
    EnumVariantNames,
)]
#[strum(serialize_all = "lowercase")]
pub enum ChangeType {
    Feat,
    Enhancement,
    Fix,
    Perf,
    Docs,
    Chore,
    Revert,
    Test,
    Security,
}

string_serde!(ChangeType);

impl ChangeType {
    /// The release notes section a change of this type is listed under
    pub fn section_title(&self) -> &'static str {
        match self {
            ChangeType::Feat => "New Features",
            ChangeType::Enhancement => "Enhancements",
            ChangeType::Fix => "Bug Fixes",
            ChangeType::Perf => "Performance",
            ChangeType::Docs => "Documentation",
            ChangeType::Chore => "Chores",
            ChangeType::Revert => "Reverts",
            ChangeType::Test => "Tests",
            ChangeType::Security => "Security",
        }
    }
}

/// An upcoming item announced alongside a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatsNext {
    pub title: String,
    pub description: String,
}

/// A curated, user-facing changelog line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pr_numbers: Vec<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<String>,
}

/// The struct representation of a single commit shipped in a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// The 40 char hash
    pub sha: String,
    /// Commit timestamp, `YYYY-MM-DD HH:MM:SS UTC`
    pub date: String,
    pub description: String,
    /// The pull request the commit was merged from
    pub pr_number: u64,
    pub scopes: Vec<String>,
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    pub breaking_change: bool,
    pub author: String,
    pub files_count: u64,
    pub insertions_count: u64,
    pub deletions_count: u64,
}

impl CommitRecord {
    /// The first 8 characters of the hash
    pub fn short_sha(&self) -> &str {
        self.sha.get(..8).unwrap_or(&self.sha)
    }

    /// Parses the commit timestamp.
    ///
    /// Loaded records have already been validated, so this only fails for
    /// hand-built values.
    pub fn timestamp(&self) -> Result<PrimitiveDateTime, time::error::Parse> {
        parse_timestamp(&self.date)
    }
}

/// One versioned entry describing a release, its notes and its commits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    /// The key the record is stored under. Not part of the record body.
    #[serde(skip)]
    pub version: String,
    /// Release date, `YYYY-MM-DD`
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub known_issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vrl_changelog: Option<String>,
    pub whats_next: Vec<WhatsNext>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changelog: Vec<ChangelogEntry>,
    pub commits: Vec<CommitRecord>,
}

impl ReleaseRecord {
    /// Parses the release date
    pub fn released_on(&self) -> Result<Date, time::error::Parse> {
        parse_date(&self.date)
    }

    /// The version key as a semantic version
    pub fn semver(&self) -> Option<Version> {
        Version::parse(&self.version).ok()
    }

    /// Commits flagged as breaking, in declaration order
    pub fn breaking_changes(&self) -> impl Iterator<Item = &CommitRecord> {
        self.commits.iter().filter(|c| c.breaking_change)
    }

    /// Distinct commit authors in the order they first appear
    pub fn contributors(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for commit in &self.commits {
            if !seen.contains(&commit.author.as_str()) {
                seen.push(&commit.author);
            }
        }
        seen
    }
}

pub(crate) fn parse_date(s: &str) -> Result<Date, time::error::Parse> {
    Date::parse(s, format_description!("[year]-[month]-[day]"))
}

pub(crate) fn parse_timestamp(s: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(
        s,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC"),
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strum::{IntoEnumIterator, VariantNames};
    use time::Month;

    use super::*;

    fn commit(sha: &str, author: &str, breaking: bool) -> CommitRecord {
        CommitRecord {
            sha: sha.into(),
            date: "2022-10-28 21:39:49 UTC".into(),
            description: "something".into(),
            pr_number: 1,
            scopes: vec![],
            change_type: ChangeType::Fix,
            breaking_change: breaking,
            author: author.into(),
            files_count: 1,
            insertions_count: 2,
            deletions_count: 0,
        }
    }

    #[test]
    fn change_type_names() {
        assert_eq!(ChangeType::VARIANTS.len(), ChangeType::iter().count());
        for ty in ChangeType::iter() {
            assert_eq!(ty.to_string().parse::<ChangeType>().ok(), Some(ty));
        }
        assert_eq!(ChangeType::Enhancement.to_string(), "enhancement");
        assert!("Fix".parse::<ChangeType>().is_err());
    }

    #[test]
    fn parses_dates() {
        let rec = ReleaseRecord {
            date: "2022-11-04".into(),
            ..ReleaseRecord::default()
        };
        let date = rec.released_on().unwrap();
        assert_eq!(date.month(), Month::November);
        assert_eq!(date.day(), 4);

        let c = commit("8f43b656d23b013f4da07ddc8422b2140fb56ec9", "a", false);
        let ts = c.timestamp().unwrap();
        assert_eq!(ts.hour(), 21);
        assert_eq!(ts.second(), 49);
        assert!(parse_timestamp("2022-10-28T21:39:49Z").is_err());
    }

    #[test]
    fn short_sha() {
        let c = commit("8f43b656d23b013f4da07ddc8422b2140fb56ec9", "a", false);
        assert_eq!(c.short_sha(), "8f43b656");
        let c = commit("abc", "a", false);
        assert_eq!(c.short_sha(), "abc");
    }

    #[test]
    fn contributors_and_breaking() {
        let rec = ReleaseRecord {
            version: "1.2.3".into(),
            commits: vec![
                commit("a", "Jesse", false),
                commit("b", "Bruce", true),
                commit("c", "Jesse", false),
            ],
            ..ReleaseRecord::default()
        };
        assert_eq!(rec.contributors(), vec!["Jesse", "Bruce"]);
        assert_eq!(
            rec.breaking_changes().map(|c| c.sha.as_str()).collect::<Vec<_>>(),
            vec!["b"]
        );
        assert_eq!(rec.semver(), Some(Version::new(1, 2, 3)));
    }
}
