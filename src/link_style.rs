use strum::{Display, EnumString};

/// Determines the hyperlink style used in commit and pull request links.
/// Defaults to `LinkStyle::Github`
///
/// # Example
///
/// ```no_run
/// # use releasedb::{LinkStyle, ReleaseStore};
/// let store = ReleaseStore::new().unwrap().link_style(LinkStyle::Gitlab);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, EnumString, Display)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum LinkStyle {
    #[default]
    Github,
    Gitlab,
    Stash,
    Cgit,
    Gitweb,
}

string_serde!(LinkStyle);

impl LinkStyle {
    /// Gets a hyperlink url to a pull request in the specified format.
    ///
    /// # Example
    ///
    /// ```
    /// # use releasedb::LinkStyle;
    /// let link = LinkStyle::Github;
    /// let pr = link.pr_link(15070, Some("https://github.com/vectordotdev/vector"));
    ///
    /// assert_eq!("https://github.com/vectordotdev/vector/pull/15070", pr);
    /// ```
    pub fn pr_link(&self, pr_number: u64, repo: Option<&str>) -> String {
        match repo {
            None | Some("") => format!("#{pr_number}"),
            Some(link) => match *self {
                LinkStyle::Github => format!("{link}/pull/{pr_number}"),
                LinkStyle::Gitlab => format!("{link}/-/merge_requests/{pr_number}"),
                LinkStyle::Stash => format!("{link}/pull-requests/{pr_number}"),
                // cgit and gitweb have no notion of pull requests
                LinkStyle::Cgit | LinkStyle::Gitweb => format!("#{pr_number}"),
            },
        }
    }

    /// Gets a hyperlink url to a commit in the specified format.
    ///
    /// # Example
    /// ```
    /// # use releasedb::LinkStyle;
    /// let link = LinkStyle::Github;
    /// let commit = link.commit_link(
    ///     "8f43b656d23b013f4da07ddc8422b2140fb56ec9",
    ///     Some("https://github.com/vectordotdev/vector"),
    /// );
    ///
    /// assert_eq!(
    ///     "https://github.com/vectordotdev/vector/commit/8f43b656d23b013f4da07ddc8422b2140fb56ec9",
    ///     commit
    /// );
    /// ```
    ///
    /// # Example
    /// Note that for `LinkStyle::Gitweb` the actual repository name has to be
    /// given as part of the parameter string of the URL:
    ///
    /// ```
    /// # use releasedb::LinkStyle;
    /// let link = LinkStyle::Gitweb;
    /// let commit = link.commit_link("deadbeef", Some("http://example.com/gitweb/?p=foo.git"));
    ///
    /// assert_eq!("http://example.com/gitweb/?p=foo.git;a=commit;h=deadbeef", commit);
    /// ```
    pub fn commit_link(&self, hash: &str, repo: Option<&str>) -> String {
        match repo {
            None | Some("") => hash.get(..8).unwrap_or(hash).to_owned(),
            Some(link) => match *self {
                LinkStyle::Github => format!("{link}/commit/{hash}"),
                LinkStyle::Gitlab => format!("{link}/-/commit/{hash}"),
                LinkStyle::Stash => format!("{link}/commits/{hash}"),
                LinkStyle::Cgit => format!("{link}/commit/?id={hash}"),
                LinkStyle::Gitweb => format!("{link};a=commit;h={hash}"),
            },
        }
    }
}
