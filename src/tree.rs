//! Reading and writing language packs against a source tree.
//!
//! [`LanguageTree`] scans a root directory for bundles at construction, keeps
//! the catalog plus two caches (files by canonical filename, packs by
//! language), and persists mutated files through the format-preserving
//! writer. Single-threaded by design: callers serialize access themselves.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use encoding_rs::WINDOWS_1252;
use encoding_rs_io::DecodeReaderBytesBuilder;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::Error;
use crate::escape::{Line, classify, unescape};
use crate::types::{BundleInfo, DEFAULT_LANGUAGE, EXTENSION, LanguageFile, LanguagePack};
use crate::writer::{merge_lines, render_fresh};

/// The synchronization engine for one source tree.
///
/// Discovery uses a reference language as the signal: a file named
/// `<base>_<reference>.properties` marks `<base>` as a bundle, and every
/// sibling `<base>*.properties` contributes a language. Files without a `_`
/// suffix belong to [`DEFAULT_LANGUAGE`], which stays distinct from the
/// reference language even when the two coincide on disk.
#[derive(Debug)]
pub struct LanguageTree {
    root: PathBuf,
    reference_language: String,
    languages: BTreeSet<String>,
    bundles: BTreeMap<String, BundleInfo>,
    pack_cache: HashMap<String, Rc<LanguagePack>>,
    file_cache: HashMap<String, Rc<RefCell<LanguageFile>>>,
}

impl LanguageTree {
    /// Scans `root` for bundles and builds the catalog.
    ///
    /// A directory that cannot be listed fails the whole scan.
    pub fn new(
        root: impl Into<PathBuf>,
        reference_language: impl Into<String>,
    ) -> Result<Self, Error> {
        let mut tree = LanguageTree {
            root: root.into(),
            reference_language: reference_language.into(),
            languages: BTreeSet::new(),
            bundles: BTreeMap::new(),
            pack_cache: HashMap::new(),
            file_cache: HashMap::new(),
        };
        let root = tree.root.clone();
        tree.find_bundles(&root)?;
        Ok(tree)
    }

    /// The root of the source tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The language used as the discovery anchor.
    pub fn reference_language(&self) -> &str {
        &self.reference_language
    }

    /// All languages available in at least one bundle.
    pub fn available_languages(&self) -> &BTreeSet<String> {
        &self.languages
    }

    /// The bundle with the given canonical path, if catalogued.
    pub fn bundle(&self, path: &str) -> Option<&BundleInfo> {
        self.bundles.get(path)
    }

    /// All catalogued bundles.
    pub fn bundles(&self) -> impl Iterator<Item = &BundleInfo> {
        self.bundles.values()
    }

    /// Loads one `(bundle, language)` file, or returns the cached handle.
    ///
    /// `Ok(None)` means the file does not exist on disk; callers can tell
    /// that apart from an empty file. Comments, blank lines and malformed
    /// lines contribute no pairs; the writer re-reads them from disk when the
    /// file is saved, so nothing is lost by skipping them here.
    pub fn load_file(
        &mut self,
        bundle_path: &str,
        language: &str,
    ) -> Result<Option<Rc<RefCell<LanguageFile>>>, Error> {
        let filename = LanguageFile::filename_for(bundle_path, language);
        if let Some(cached) = self.file_cache.get(&filename) {
            return Ok(Some(Rc::clone(cached)));
        }

        let path = self.root.join(&filename);
        if !path.exists() {
            return Ok(None);
        }

        let content = read_windows_1252(&path)?;
        let mut file = LanguageFile::new(bundle_path, language);
        for line in content.lines() {
            if let Line::Pair { key, value } = classify(line) {
                file.set(key, unescape(value));
            }
        }
        debug!(file = %filename, pairs = file.len(), "loaded resource file");

        let handle = Rc::new(RefCell::new(file));
        self.file_cache.insert(filename, Rc::clone(&handle));
        Ok(Some(handle))
    }

    /// Loads every file of one language across all bundles as a pack.
    ///
    /// Cached per language; bundles whose catalogued file has gone missing on
    /// disk are skipped with a warning rather than failing the pack.
    pub fn load_language(&mut self, language: &str) -> Result<Rc<LanguagePack>, Error> {
        if let Some(cached) = self.pack_cache.get(language) {
            return Ok(Rc::clone(cached));
        }

        let bundle_paths: Vec<String> = self
            .bundles
            .values()
            .filter(|b| b.has_language(language))
            .map(|b| b.path().to_string())
            .collect();

        let mut files = Vec::new();
        for bundle_path in bundle_paths {
            match self.load_file(&bundle_path, language)? {
                Some(file) => files.push(file),
                None => {
                    warn!(bundle = %bundle_path, language, "catalogued file missing on disk, skipping");
                }
            }
        }

        let pack = Rc::new(LanguagePack::new(language, files));
        self.pack_cache.insert(language.to_string(), Rc::clone(&pack));
        Ok(pack)
    }

    /// Persists a file, preserving the on-disk layout of an existing target.
    ///
    /// A missing target is created fresh from the store in insertion order.
    /// An existing target is merged line by line: comments, blanks and
    /// unrecognized lines stay verbatim, pair lines are rewritten with
    /// freshly escaped values or dropped when their key is gone, and new keys
    /// are appended at the end. The result replaces the target atomically, so
    /// an I/O failure never leaves a truncated file behind.
    pub fn save(&self, file: &LanguageFile) -> Result<(), Error> {
        let filename = file.filename();
        let path = self.root.join(&filename);

        if !path.exists() {
            debug!(file = %filename, pairs = file.len(), "creating fresh resource file");
            let rendered = render_fresh(file);
            let encoded = encode_windows_1252(&rendered, &filename)?;
            return write_atomic(&path, &encoded);
        }

        let content = read_windows_1252(&path)?;
        let lines: Vec<&str> = content.lines().collect();
        let merged = merge_lines(&lines, file);
        let encoded = encode_windows_1252(&merged, &filename)?;
        debug!(file = %filename, pairs = file.len(), "merged resource file");
        write_atomic(&path, &encoded)
    }

    /// Returns true if a file with this file's canonical name exists on disk.
    pub fn exists(&self, file: &LanguageFile) -> bool {
        self.root.join(file.filename()).exists()
    }

    /// Re-scans the tree, replacing the catalog and dropping both caches.
    pub fn update(&mut self) -> Result<(), Error> {
        self.clear_cache();
        self.bundles.clear();
        self.languages.clear();
        let root = self.root.clone();
        self.find_bundles(&root)
    }

    /// Drops the file and pack caches, keeping the catalog.
    pub fn clear_cache(&mut self) {
        self.pack_cache.clear();
        self.file_cache.clear();
    }

    /// Writes the bundle catalog as pretty JSON for external tooling.
    pub fn export_catalog_json<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.bundles)?;
        Ok(())
    }

    fn find_bundles(&mut self, dir: &Path) -> Result<(), Error> {
        let anchor_suffix = format!("_{}{}", self.reference_language, EXTENSION);

        let mut names = Vec::new();
        let mut subdirs = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                subdirs.push(entry.path());
            } else if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        subdirs.sort();

        for name in &names {
            // Reference-language files signal which .properties files are
            // actually bundles and not other stuff.
            if !name.ends_with(&anchor_suffix) {
                continue;
            }
            let Some(underscore) = name.find('_') else {
                continue;
            };
            let base = &name[..underscore];
            if base.is_empty() {
                continue;
            }

            let mut bundle_languages = BTreeSet::new();
            for sibling in &names {
                if !sibling.starts_with(base) || !sibling.ends_with(EXTENSION) {
                    continue;
                }
                let language = derive_language(base, sibling);
                self.languages.insert(language.clone());
                bundle_languages.insert(language);
            }

            let bundle_path = self.bundle_path_for(dir, base);
            debug!(bundle = %bundle_path, languages = bundle_languages.len(), "discovered bundle");
            self.bundles
                .insert(bundle_path.clone(), BundleInfo::new(bundle_path, bundle_languages));
        }

        for subdir in subdirs {
            self.find_bundles(&subdir)?;
        }
        Ok(())
    }

    /// Canonical bundle path: root-relative directory plus base name, always
    /// `/`-separated, no leading separator.
    fn bundle_path_for(&self, dir: &Path, base: &str) -> String {
        let relative = dir.strip_prefix(&self.root).unwrap_or(dir);
        let mut parts: Vec<&str> = relative
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .collect();
        parts.push(base);
        parts.join("/")
    }
}

/// Language of a sibling file: no `_` means the default language, otherwise
/// the text between `<base>_` and the extension.
fn derive_language(base: &str, filename: &str) -> String {
    if !filename.contains('_') {
        return DEFAULT_LANGUAGE.to_string();
    }
    let stem = filename.strip_suffix(EXTENSION).unwrap_or(filename);
    stem.get(base.len() + 1..).unwrap_or_default().to_string()
}

/// Encodes output text as windows-1252, the encoding the load path decodes.
///
/// Values are ASCII after escaping; keys and preserved comment text may carry
/// any Latin-repertoire char. Anything unmappable is an encoding error rather
/// than silent replacement, and both save branches go through here so a file
/// always reloads to the exact text that was written.
fn encode_windows_1252<'a>(text: &'a str, filename: &str) -> Result<Cow<'a, [u8]>, Error> {
    let (encoded, _, had_errors) = WINDOWS_1252.encode(text);
    if had_errors {
        return Err(Error::encoding_error(format!(
            "`{}` contains text not representable in windows-1252",
            filename
        )));
    }
    Ok(encoded)
}

/// Reads a file through a streaming windows-1252 decoder.
fn read_windows_1252(path: &Path) -> Result<String, Error> {
    let file = File::open(path)?;
    let mut decoder = DecodeReaderBytesBuilder::new()
        .encoding(Some(WINDOWS_1252))
        .bom_sniffing(false)
        .build(file);

    let mut decoded = String::new();
    decoder.read_to_string(&mut decoded)?;
    Ok(decoded)
}

/// Writes to a sibling temp file, then renames over the target.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
