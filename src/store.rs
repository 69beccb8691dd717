use std::{
    env,
    fs::{self, File},
    io::{stdout, BufWriter, Write},
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::debug;
use toml::Value;

use crate::{
    config::RawStoreCfg,
    error::{Error, Result},
    fmt::{document_to_toml, FormatWriter, MarkdownWriter, RecordFormat, TomlWriter},
    link_style::LinkStyle,
    loader::Loader,
    record::ReleaseRecord,
    DEFAULT_CONFIG_FILE,
};

/// The directory of record files used when a config names no source
const DEFAULT_RELEASES_DIR: &str = "releases";

/// The base struct used to hold release records and interact with the
/// library.
///
/// Records are immutable once loaded. The store is `Send + Sync` and can be
/// shared between threads for concurrent lookups.
#[derive(Debug, Clone, Default)]
pub struct ReleaseStore {
    records: IndexMap<String, ReleaseRecord>,
    /// The repository used for the base of hyper-links
    pub repo: Option<String>,
    /// The link style to use for commit and pull request hyper-links
    pub link_style: LinkStyle,
    /// The format `write_release` uses (Defaults to Markdown)
    pub out_format: RecordFormat,
    /// Where `write_release` writes to (Defaults to `stdout`)
    pub outfile: Option<PathBuf>,
}

impl ReleaseStore {
    /// Creates a `ReleaseStore` from the default `.releasedb.toml`
    /// configuration file in the current working directory.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use releasedb::ReleaseStore;
    /// let store = ReleaseStore::new().unwrap();
    /// ```
    pub fn new() -> Result<Self> {
        debug!("Creating store with new()");
        ReleaseStore::from_file(DEFAULT_CONFIG_FILE)
    }

    /// Creates a `ReleaseStore` from a custom named TOML configuration file.
    /// Relative paths inside the file are resolved against the directory the
    /// file lives in.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use releasedb::ReleaseStore;
    /// let store = ReleaseStore::from_file("/myproject/website/releasedb.toml").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        debug!("Creating store with \n\tfile: {:?}", file.as_ref());
        let cfg_file = if file.as_ref().is_relative() {
            debug!("file is relative");
            let cwd = env::current_dir().map_err(|_| Error::CurrentDir)?;
            cwd.join(file.as_ref())
        } else {
            debug!("file is absolute");
            file.as_ref().to_path_buf()
        };

        let cfg = read_config(&cfg_file)?;
        let base = cfg_file.parent().map(Path::to_path_buf).unwrap_or_default();
        ReleaseStore::with_config(&base, cfg)
    }

    /// Creates a `ReleaseStore` from a directory of `<version>.toml` record
    /// files, using default options.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use releasedb::ReleaseStore;
    /// let store = ReleaseStore::with_dir("/myproject/website/releases").unwrap();
    /// ```
    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        debug!("Creating store with \n\tdir: {:?}", dir.as_ref());
        let records = Loader::new().dir(dir)?.finish();
        Ok(ReleaseStore::from_records(records))
    }

    /// Creates a `ReleaseStore` from a multi-record document whose top level
    /// keys are versions, using default options.
    pub fn from_document(src: &str) -> Result<Self> {
        debug!("Creating store from document");
        let records = Loader::new().document_str(src)?.finish();
        Ok(ReleaseStore::from_records(records))
    }

    /// Creates a `ReleaseStore` from already loaded records. Each record's
    /// `version` is set to the key it is stored under.
    pub fn from_records(mut records: IndexMap<String, ReleaseRecord>) -> Self {
        for (version, record) in records.iter_mut() {
            if record.version != *version {
                record.version = version.clone();
            }
        }
        ReleaseStore {
            records,
            ..ReleaseStore::default()
        }
    }

    fn with_config(base: &Path, cfg: RawStoreCfg) -> Result<Self> {
        debug!("Applying config:\n{:?}", cfg);
        let mut loader = Loader::new().deny_unknown_fields(cfg.deny_unknown_fields);

        let releases_dir = match (&cfg.releases_dir, &cfg.document) {
            (None, None) => Some(PathBuf::from(DEFAULT_RELEASES_DIR)),
            (dir, _) => dir.clone(),
        };
        if let Some(dir) = releases_dir {
            loader = loader.dir(base.join(dir))?;
        }
        if let Some(doc) = &cfg.document {
            loader = loader.document_file(base.join(doc))?;
        }

        let store = ReleaseStore {
            repo: cfg.repository,
            link_style: cfg.link_style,
            out_format: cfg.output_format,
            outfile: cfg.outfile.map(|f| base.join(f)),
            ..ReleaseStore::from_records(loader.finish())
        };
        debug!("Loaded {} releases", store.len());
        Ok(store)
    }

    /// Sets the repository used for the base of hyper-links
    ///
    /// **NOTE:** Leave off the trailing `.git`
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use releasedb::ReleaseStore;
    /// let store = ReleaseStore::new()
    ///     .unwrap()
    ///     .repository("https://github.com/vectordotdev/vector");
    /// ```
    pub fn repository<S: Into<String>>(mut self, r: S) -> Self {
        self.repo = Some(r.into());
        self
    }

    /// Sets the link style to use for hyper-links
    pub fn link_style(mut self, l: LinkStyle) -> Self {
        self.link_style = l;
        self
    }

    /// The format `write_release` uses (Defaults to Markdown)
    pub fn output_format(mut self, f: RecordFormat) -> Self {
        self.out_format = f;
        self
    }

    /// Sets the file `write_release` writes to (Defaults to `stdout` if
    /// omitted)
    pub fn outfile<P: AsRef<Path>>(mut self, f: P) -> Self {
        self.outfile = Some(f.as_ref().to_path_buf());
        self
    }

    /// Retrieves the record for `version`
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use releasedb::ReleaseStore;
    /// let store = ReleaseStore::new().unwrap();
    /// let release = store.get("0.25.1").unwrap();
    /// println!("{} shipped {} commits", release.date, release.commits.len());
    /// ```
    pub fn get(&self, version: &str) -> Result<&ReleaseRecord> {
        self.records
            .get(version)
            .ok_or_else(|| Error::NotFound(version.to_owned()))
    }

    pub fn contains(&self, version: &str) -> bool { self.records.contains_key(version) }

    /// All records in declaration order, i.e. the order they were loaded in
    pub fn list(&self) -> Vec<&ReleaseRecord> { self.records.values().collect() }

    pub fn iter(&self) -> impl Iterator<Item = &ReleaseRecord> { self.records.values() }

    /// Version keys in declaration order
    pub fn versions(&self) -> impl Iterator<Item = &str> { self.records.keys().map(String::as_str) }

    /// All records ordered by release date, oldest first. Releases sharing a
    /// date are ordered by version.
    pub fn chronological(&self) -> Vec<&ReleaseRecord> {
        let mut list = self.list();
        list.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.semver().cmp(&b.semver()))
        });
        list
    }

    /// The release with the highest version
    pub fn latest(&self) -> Option<&ReleaseRecord> {
        self.records
            .values()
            .filter_map(|r| r.semver().map(|v| (v, r)))
            .max_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, r)| r)
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    /// Gets a hyperlink to a commit using the configured repository and style
    pub fn commit_link(&self, sha: &str) -> String {
        self.link_style.commit_link(sha, self.repo.as_deref())
    }

    /// Gets a hyperlink to a pull request using the configured repository and
    /// style
    pub fn pr_link(&self, pr_number: u64) -> String {
        self.link_style.pr_link(pr_number, self.repo.as_deref())
    }

    /// Serializes the whole store as one multi-record document, which
    /// `ReleaseStore::from_document` reads back.
    pub fn to_document_string(&self) -> Result<String> { document_to_toml(&self.records) }

    /// Writes a release using whatever options have been specified thus far.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use releasedb::ReleaseStore;
    /// let store = ReleaseStore::new().unwrap();
    /// store.write_release("0.25.1").unwrap();
    /// ```
    pub fn write_release(&self, version: &str) -> Result<()> {
        debug!("Writing release {version} with preset options");
        if let Some(ref out) = self.outfile {
            debug!("outfile set to: {:?}", out);
            self.write_release_to(version, out)
        } else {
            debug!("outfile not set using stdout");
            let out = stdout();
            let mut out_buf = BufWriter::new(out.lock());
            self.write_release_in_format(version, &mut out_buf)
        }
    }

    /// Writes a release to a specified file, replacing any existing contents.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use releasedb::ReleaseStore;
    /// let store = ReleaseStore::new().unwrap();
    ///
    /// store.write_release_to("0.25.1", "/myproject/notes/0.25.1.md")
    ///     .unwrap();
    /// ```
    pub fn write_release_to<P: AsRef<Path>>(&self, version: &str, path: P) -> Result<()> {
        debug!("Writing release {version} to file: {:?}", path.as_ref());
        // Look the release up first so a missing version leaves no empty file behind
        self.get(version)?;
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = File::create(path.as_ref())?;
        self.write_release_in_format(version, &mut file)
    }

    /// Writes a release with a specified `FormatWriter` format
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use releasedb::{ReleaseStore, fmt::{FormatWriter, MarkdownWriter}};
    /// # use std::io;
    /// let store = ReleaseStore::new().unwrap();
    ///
    /// // Write release notes to stdout in Markdown format
    /// let out = io::stdout();
    /// let mut out_buf = io::BufWriter::new(out.lock());
    /// let mut writer = MarkdownWriter::new(&mut out_buf);
    ///
    /// store.write_release_with("0.25.1", &mut writer).unwrap();
    /// ```
    pub fn write_release_with<W>(&self, version: &str, writer: &mut W) -> Result<()>
    where
        W: FormatWriter,
    {
        debug!("Writing release {version} from writer");
        let record = self.get(version)?;
        writer.write_release(self, record)
    }

    fn write_release_in_format<T: Write>(&self, version: &str, out: &mut T) -> Result<()> {
        match self.out_format {
            RecordFormat::Markdown => {
                let mut writer = MarkdownWriter::new(out);
                self.write_release_with(version, &mut writer)
            }
            RecordFormat::Toml => {
                let mut writer = TomlWriter::new(out);
                self.write_release_with(version, &mut writer)
            }
        }
    }
}

fn read_config(cfg_file: &Path) -> Result<RawStoreCfg> {
    debug!("Trying to use config file: {:?}", cfg_file);
    let src = fs::read_to_string(cfg_file)?;
    let doc: Value = toml::from_str(&src).map_err(|e| {
        debug!("config parse error: {e}");
        Error::ConfigParse(cfg_file.to_path_buf())
    })?;
    let table = doc
        .get("store")
        .cloned()
        .ok_or_else(|| Error::ConfigFormat(cfg_file.to_path_buf()))?;
    table.try_into::<RawStoreCfg>().map_err(|e| {
        debug!("config format error: {e}");
        Error::ConfigFormat(cfg_file.to_path_buf())
    })
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path, thread};

    use pretty_assertions::assert_eq;

    use super::*;

    const R0_25_1: &str = include_str!("../fixtures/releases/0.25.1.toml");
    const R0_11_1: &str = include_str!("../fixtures/releases/0.11.1.toml");
    const DOCUMENT: &str = include_str!("../fixtures/releases.toml");
    const CONFIG: &str = include_str!("../fixtures/.releasedb.toml");

    fn fixture_dir(root: &Path) -> PathBuf {
        let dir = root.join("releases");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("0.25.1.toml"), R0_25_1).unwrap();
        fs::write(dir.join("0.11.1.toml"), R0_11_1).unwrap();
        dir
    }

    fn store() -> ReleaseStore {
        let dir = tempfile::tempdir().unwrap();
        ReleaseStore::with_dir(fixture_dir(dir.path())).unwrap()
    }

    #[test]
    fn get_release() {
        let store = store();
        let rec = store.get("0.25.1").unwrap();
        assert_eq!(rec.date, "2022-11-04");
        assert_eq!(rec.changelog.len(), 3);
        assert_eq!(rec.commits.len(), 8);
        assert_eq!(rec.commits[0].sha, "8f43b656d23b013f4da07ddc8422b2140fb56ec9");
        assert_eq!(rec.commits[0].pr_number, 15070);

        let err = store.get("9.9.9").unwrap_err();
        assert!(matches!(err, Error::NotFound(ref v) if v == "9.9.9"));
        assert!(store.contains("0.11.1"));
        assert!(!store.contains("0.11.2"));
    }

    #[test]
    fn loaded_invariants() {
        let from_doc = ReleaseStore::from_document(DOCUMENT).unwrap();
        let from_dir = store();
        let pairs = from_doc
            .versions()
            .zip(from_doc.iter())
            .chain(from_dir.versions().zip(from_dir.iter()));
        for (key, rec) in pairs {
            assert_eq!(key, rec.version);
            for commit in &rec.commits {
                assert_eq!(commit.sha.len(), 40);
                assert!(commit.sha.chars().all(|c| c.is_ascii_hexdigit()));
                assert!(commit.pr_number > 0);
            }
        }
    }

    #[test]
    fn ordering() {
        let store = ReleaseStore::from_document(DOCUMENT).unwrap();
        let declared: Vec<_> = store.list().iter().map(|r| r.version.as_str()).collect();
        assert_eq!(declared, vec!["0.12.0", "0.11.1"]);
        let chrono: Vec<_> = store
            .chronological()
            .iter()
            .map(|r| r.version.as_str())
            .collect();
        assert_eq!(chrono, vec!["0.11.1", "0.12.0"]);
        assert_eq!(store.latest().map(|r| r.version.as_str()), Some("0.12.0"));
        assert_eq!(store.len(), 2);
        assert!(!store.is_empty());
        assert!(ReleaseStore::default().latest().is_none());
    }

    #[test]
    fn same_day_releases_order_by_version() {
        let doc = r#"
["1.0.1"]
date = "2023-01-02"
whats_next = []
commits = []

["1.0.0"]
date = "2023-01-02"
whats_next = []
commits = []

["0.9.0"]
date = "2023-01-03"
whats_next = []
commits = []
"#;
        let store = ReleaseStore::from_document(doc).unwrap();
        let chrono: Vec<_> = store
            .chronological()
            .iter()
            .map(|r| r.version.as_str())
            .collect();
        assert_eq!(chrono, vec!["1.0.0", "1.0.1", "0.9.0"]);
        assert_eq!(store.latest().map(|r| r.version.as_str()), Some("1.0.1"));
    }

    #[test]
    fn from_records_keys_versions() {
        let mut records = IndexMap::new();
        records.insert("2.0.0".to_owned(), ReleaseRecord::default());
        let store = ReleaseStore::from_records(records);
        assert_eq!(store.get("2.0.0").unwrap().version, "2.0.0");
    }

    #[test]
    fn from_config_file() {
        let root = tempfile::tempdir().unwrap();
        fixture_dir(root.path());
        let cfg = root.path().join(".releasedb.toml");
        fs::write(&cfg, CONFIG).unwrap();

        let store = ReleaseStore::from_file(&cfg).unwrap();
        assert_eq!(store.versions().collect::<Vec<_>>(), vec!["0.11.1", "0.25.1"]);
        assert_eq!(store.repo.as_deref(), Some("https://github.com/vectordotdev/vector"));
        assert_eq!(
            store.pr_link(15070),
            "https://github.com/vectordotdev/vector/pull/15070"
        );
    }

    #[test]
    fn config_with_document_and_outfile() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("all.toml"), DOCUMENT).unwrap();
        let cfg = root.path().join("releasedb.toml");
        fs::write(
            &cfg,
            "[store]\ndocument = \"all.toml\"\noutput-format = \"toml\"\noutfile = \"out/notes.toml\"",
        )
        .unwrap();

        let store = ReleaseStore::from_file(&cfg).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.out_format, RecordFormat::Toml);

        store.write_release("0.12.0").unwrap();
        let written = fs::read_to_string(root.path().join("out/notes.toml")).unwrap();
        let reread = crate::loader::Loader::new()
            .record_str("0.12.0", &written)
            .unwrap()
            .finish();
        assert_eq!(&reread["0.12.0"], store.get("0.12.0").unwrap());
    }

    #[test]
    fn config_errors() {
        let root = tempfile::tempdir().unwrap();
        let cfg = root.path().join("bad.toml");

        fs::write(&cfg, "[store").unwrap();
        assert!(matches!(ReleaseStore::from_file(&cfg), Err(Error::ConfigParse(_))));

        fs::write(&cfg, "[releases]\nrepository = \"x\"").unwrap();
        assert!(matches!(ReleaseStore::from_file(&cfg), Err(Error::ConfigFormat(_))));

        fs::write(&cfg, "[store]\nlink-style = \"sourcehut\"").unwrap();
        assert!(matches!(ReleaseStore::from_file(&cfg), Err(Error::ConfigFormat(_))));

        let missing = root.path().join("nope.toml");
        assert!(matches!(ReleaseStore::from_file(&missing), Err(Error::Io(_))));
    }

    #[test]
    fn config_denies_unknown_fields() {
        let root = tempfile::tempdir().unwrap();
        let dir = fixture_dir(root.path());
        fs::write(
            dir.join("0.12.0.toml"),
            "date = \"2021-02-11\"\nwhats_next = []\ncommits = []\nhighlights = []",
        )
        .unwrap();
        let cfg = root.path().join(".releasedb.toml");
        fs::write(&cfg, CONFIG).unwrap();

        let err = ReleaseStore::from_file(&cfg).unwrap_err();
        assert!(matches!(err, Error::UnknownField { .. }), "{err:?}");
        assert_eq!(err.version(), Some("0.12.0"));
    }

    #[test]
    fn write_missing_release_leaves_no_file() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("notes.md");
        let err = store().write_release_to("9.9.9", &out).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(!out.exists());
    }

    #[test]
    fn document_round_trip() {
        let store = store();
        let doc = store.to_document_string().unwrap();
        let reread = ReleaseStore::from_document(&doc).unwrap();
        assert_eq!(reread.list(), store.list());
    }

    #[test]
    fn shared_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReleaseStore>();

        let store = std::sync::Arc::new(store());
        let handles: Vec<_> = ["0.25.1", "0.11.1"]
            .into_iter()
            .map(|v| {
                let store = store.clone();
                thread::spawn(move || store.get(v).map(|r| r.commits.len()).unwrap())
            })
            .collect();
        let counts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(counts, vec![8, 3]);
    }
}
