use std::io;

use log::debug;
use time::macros::format_description;

use crate::{
    error::{Error, Result},
    fmt::FormatWriter,
    record::{CommitRecord, ReleaseRecord},
    sectionmap::{ScopeMap, SectionMap},
    store::ReleaseStore,
};

/// Wraps a `std::io::Write` object to write release notes in a Markdown
/// format
///
/// # Example
///
/// ```no_run
/// # use std::fs::File;
/// # use releasedb::{ReleaseStore, fmt::MarkdownWriter};
/// let store = ReleaseStore::new().unwrap();
///
/// // Create a file to hold our results, which the MarkdownWriter will wrap (note, .unwrap() is only
/// // used to keep the example short and concise)
/// let mut file = File::create("release_notes.md").unwrap();
///
/// // Create the MarkdownWriter
/// let mut writer = MarkdownWriter::new(&mut file);
///
/// // Use the MarkdownWriter to write the notes
/// store.write_release_with("0.25.1", &mut writer).unwrap();
/// ```
pub struct MarkdownWriter<'a>(&'a mut dyn io::Write);

impl<'a> MarkdownWriter<'a> {
    /// Creates a new instance of the `MarkdownWriter` struct using a
    /// `std::io::Write` object.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use std::io::BufWriter;
    /// # use releasedb::fmt::MarkdownWriter;
    /// // Create a MarkdownWriter to wrap stdout
    /// let out = std::io::stdout();
    /// let mut out_buf = BufWriter::new(out.lock());
    /// let mut writer = MarkdownWriter::new(&mut out_buf);
    /// ```
    pub fn new<T: io::Write + 'a>(writer: &'a mut T) -> MarkdownWriter<'a> {
        MarkdownWriter(writer)
    }

    fn write_header(&mut self, record: &ReleaseRecord) -> Result<()> {
        let version = &record.version;
        let date = record
            .released_on()
            .map_err(|e| Error::InvalidField {
                version: version.clone(),
                field: "date".to_owned(),
                reason: e.to_string(),
            })?
            .format(format_description!(
                "[month repr:long] [day padding:none], [year]"
            ))?;

        let title = match record.codename.as_deref() {
            Some(codename) if !codename.trim().is_empty() => format!("{version} \"{codename}\""),
            _ => version.clone(),
        };
        writeln!(self.0, "<a name=\"{version}\"></a>\n## {title} ({date})\n")?;

        if let Some(description) = &record.description {
            writeln!(self.0, "{}\n", description.trim())?;
        }
        Ok(())
    }

    fn write_list(&mut self, title: &str, items: &[String]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        writeln!(self.0, "### {title}\n")?;
        for item in items {
            writeln!(self.0, "* {}", item.trim())?;
        }
        writeln!(self.0).map_err(Into::into)
    }

    /// Writes the curated changelog, one line per entry
    fn write_changelog(&mut self, store: &ReleaseStore, record: &ReleaseRecord) -> Result<()> {
        let items: Vec<String> = record
            .changelog
            .iter()
            .map(|entry| {
                let mut line = String::new();
                if !entry.scopes.is_empty() {
                    line.push_str(&format!("**{}:** ", entry.scopes.join(", ")));
                }
                line.push_str(&collapse(&entry.description));
                line.push_str(&format!(" ({})", entry.change_type));
                for pr in &entry.pr_numbers {
                    line.push_str(&format!(" [#{pr}]({})", store.pr_link(*pr)));
                }
                line
            })
            .collect();
        self.write_list("Changelog", &items)
    }

    /// Writes a particular section of the commit list
    fn write_section(&mut self, store: &ReleaseStore, title: &str, section: &ScopeMap) -> Result<()> {
        if section.is_empty() {
            return Ok(());
        }

        write!(self.0, "\n#### {title}\n\n")?;

        for (scope, entries) in section {
            let nested = (entries.len() > 1) && !scope.is_empty();

            let prefix = if nested {
                writeln!(self.0, "* **{scope}:**")?;
                "  *".to_owned()
            } else if !scope.is_empty() {
                format!("* **{scope}:**")
            } else {
                "*".to_owned()
            };

            for entry in entries {
                self.write_commit(store, &prefix, entry)?;
            }
        }

        Ok(())
    }

    fn write_commit(&mut self, store: &ReleaseStore, prefix: &str, entry: &CommitRecord) -> Result<()> {
        writeln!(
            self.0,
            "{prefix} {} ([{}]({}), [#{}]({}))",
            entry.description,
            entry.short_sha(),
            store.commit_link(&entry.sha),
            entry.pr_number,
            store.pr_link(entry.pr_number),
        )
        .map_err(Into::into)
    }

    fn write_whats_next(&mut self, record: &ReleaseRecord) -> Result<()> {
        if record.whats_next.is_empty() {
            return Ok(());
        }
        write!(self.0, "\n### What's Next\n")?;
        for item in &record.whats_next {
            write!(self.0, "\n#### {}\n\n{}\n", item.title, item.description.trim())?;
        }
        Ok(())
    }
}

// Joins hard-wrapped prose into a single line
fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl<'a> FormatWriter for MarkdownWriter<'a> {
    fn write_release(&mut self, store: &ReleaseStore, record: &ReleaseRecord) -> Result<()> {
        debug!("Writing Markdown notes for release {}", record.version);
        self.write_header(record)?;
        self.write_list("Known Issues", &record.known_issues)?;
        self.write_changelog(store, record)?;

        if let Some(vrl) = &record.vrl_changelog {
            writeln!(self.0, "### VRL Changelog\n\n{}\n", vrl.trim())?;
        }

        let sm = SectionMap::from_commits(&record.commits);
        if !sm.sections.is_empty() {
            writeln!(self.0, "### Commits")?;
        }
        for (title, section) in &sm.sections {
            self.write_section(store, title, section)?;
        }

        self.write_whats_next(record)?;
        self.0.flush().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{link_style::LinkStyle, loader::Loader};

    fn render(store: &ReleaseStore, version: &str) -> String {
        let mut out = Vec::new();
        {
            let mut writer = MarkdownWriter::new(&mut out);
            store.write_release_with(version, &mut writer).unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn writes_release_notes() {
        let records = Loader::new()
            .record_str("0.11.1", include_str!("../../fixtures/releases/0.11.1.toml"))
            .unwrap()
            .finish();
        let store = ReleaseStore::from_records(records)
            .repository("https://github.com/vectordotdev/vector")
            .link_style(LinkStyle::Github);

        let expected = r#"<a name="0.11.1"></a>
## 0.11.1 (December 17, 2020)

### Commits

#### Breaking Changes

* **codecs:** Rename `encoding.only_fields` to `encoding.fields` ([d8a67868](https://github.com/vectordotdev/vector/commit/d8a6786868cbd45494059c0f7f1c2536bc858966), [#5531](https://github.com/vectordotdev/vector/pull/5531))

#### Enhancements

* **codecs:** Rename `encoding.only_fields` to `encoding.fields` ([d8a67868](https://github.com/vectordotdev/vector/commit/d8a6786868cbd45494059c0f7f1c2536bc858966), [#5531](https://github.com/vectordotdev/vector/pull/5531))

#### Bug Fixes

* **kafka source:** Drop `kafka` consumer offsets only after acknowledgement ([e22ea459](https://github.com/vectordotdev/vector/commit/e22ea459ab4cf8bcaedf9ab790720fdbace95739), [#5502](https://github.com/vectordotdev/vector/pull/5502))

#### Documentation

* Fix typo in installation docs ([031588c6](https://github.com/vectordotdev/vector/commit/031588c6150f95286b324e333d57c86c4c40c5f7), [#5560](https://github.com/vectordotdev/vector/pull/5560))
"#;
        assert_eq!(render(&store, "0.11.1"), expected);
    }

    #[test]
    fn writes_changelog_and_whats_next() {
        let records = Loader::new()
            .record_str("0.25.1", include_str!("../../fixtures/releases/0.25.1.toml"))
            .unwrap()
            .document_str(include_str!("../../fixtures/releases.toml"))
            .unwrap()
            .finish();
        let store = ReleaseStore::from_records(records);

        let notes = render(&store, "0.25.1");
        assert!(notes.starts_with("<a name=\"0.25.1\"></a>\n## 0.25.1 (November 4, 2022)\n\nThis patch release"));
        assert!(notes.contains("### Changelog\n\n* **buffers:** Disk buffers no longer report negative values for `buffer_byte_size` after being restored from a previous run. (fix) [#15070](#15070)\n"));
        assert!(notes.contains("\n* **config:** Preserve leading whitespace"));
        assert!(notes.contains("\n#### Chores\n\n* **releasing:**\n  * Bump tokio from 1.21.1 to 1.21.2"));

        let notes = render(&store, "0.12.0");
        assert!(notes.contains("## 0.12.0 \"Vector Remap Language\" (February 11, 2021)"));
        assert!(notes.contains("### Known Issues\n\n* The `route` transform"));
        assert!(notes.ends_with("### What's Next\n\n#### Pipelines\n\nComposable transform groups that can be shared between configs.\n"));
    }
}
