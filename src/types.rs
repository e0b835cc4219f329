//! Core types for propsync: language files, bundle metadata, language packs.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

use crate::store::OrderedMap;

/// Marker for the unsuffixed file of a bundle (`msgs.properties`).
///
/// This is a language of its own, distinct from the scanner's reference
/// language even when the two coincide on disk.
pub const DEFAULT_LANGUAGE: &str = "default";

/// File extension shared by every resource file.
pub const EXTENSION: &str = ".properties";

/// The key/value contents of one `(bundle, language)` resource file.
///
/// Ordered like the file itself; mutated freely by callers and persisted via
/// [`crate::LanguageTree::save`]. Two instances describing the same logical
/// file are distinct objects; deduplication happens in the tree's file cache,
/// keyed by canonical filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageFile {
    bundle_path: String,
    language: String,
    pairs: OrderedMap,
}

impl LanguageFile {
    /// Creates an empty file for the given bundle path and language.
    pub fn new(bundle_path: impl Into<String>, language: impl Into<String>) -> Self {
        LanguageFile {
            bundle_path: bundle_path.into(),
            language: language.into(),
            pairs: OrderedMap::new(),
        }
    }

    /// The canonical root-relative bundle path, e.g. `sub/dir/msgs`.
    pub fn bundle_path(&self) -> &str {
        &self.bundle_path
    }

    /// The language code, or [`DEFAULT_LANGUAGE`] for the unsuffixed file.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Canonical root-relative filename for a `(bundle, language)` pair.
    ///
    /// The default language has no suffix; every other language appends
    /// `_<language>` before the extension.
    pub fn filename_for(bundle_path: &str, language: &str) -> String {
        if language == DEFAULT_LANGUAGE {
            format!("{}{}", bundle_path, EXTENSION)
        } else {
            format!("{}_{}{}", bundle_path, language, EXTENSION)
        }
    }

    /// Canonical root-relative filename of this file.
    pub fn filename(&self) -> String {
        Self::filename_for(&self.bundle_path, &self.language)
    }

    /// Returns the value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key)
    }

    /// Sets a key to a value, returning the previous value if any.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.pairs.put(key, value)
    }

    /// Removes a key, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.pairs.remove(key)
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.entries()
    }

    /// Number of key/value pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if the file holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Parses the language code as a BCP 47 identifier, if it is one.
    ///
    /// The default-language marker is not a language code and yields `None`.
    pub fn parse_language_identifier(&self) -> Option<LanguageIdentifier> {
        if self.language == DEFAULT_LANGUAGE {
            return None;
        }
        self.language.parse().ok()
    }
}

/// Scan result for one bundle: its canonical path and the languages present.
///
/// Immutable once constructed; a re-scan replaces the whole catalog rather
/// than patching entries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BundleInfo {
    path: String,
    languages: BTreeSet<String>,
}

impl BundleInfo {
    pub(crate) fn new(path: String, languages: BTreeSet<String>) -> Self {
        BundleInfo { path, languages }
    }

    /// Canonical root-relative bundle path (directory part plus base name).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The language codes observed for this bundle.
    pub fn languages(&self) -> &BTreeSet<String> {
        &self.languages
    }

    /// Returns true if the bundle has a file for the given language.
    pub fn has_language(&self, language: &str) -> bool {
        self.languages.contains(language)
    }
}

/// Every resource file of one language across all bundles in the tree.
///
/// Membership is fixed at construction; the member files themselves stay
/// mutable through their shared handles.
#[derive(Debug, Clone)]
pub struct LanguagePack {
    language: String,
    files: Vec<Rc<RefCell<LanguageFile>>>,
}

impl LanguagePack {
    pub(crate) fn new(language: impl Into<String>, files: Vec<Rc<RefCell<LanguageFile>>>) -> Self {
        LanguagePack {
            language: language.into(),
            files,
        }
    }

    /// The language this pack aggregates.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// The member files, one per bundle that has this language on disk.
    pub fn files(&self) -> &[Rc<RefCell<LanguageFile>>] {
        &self.files
    }

    /// Finds the member file for a bundle path, if the bundle contributed one.
    pub fn file_for_bundle(&self, bundle_path: &str) -> Option<&Rc<RefCell<LanguageFile>>> {
        self.files
            .iter()
            .find(|f| f.borrow().bundle_path() == bundle_path)
    }

    /// Number of member files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if no bundle contributed a file.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
