#![forbid(unsafe_code)]
//! Format-preserving synchronization engine for `.properties` bundle trees.
//!
//! A *bundle* is a group of sibling resource files sharing a base name and
//! distinguished by a language-code suffix (`msgs.properties`,
//! `msgs_fr.properties`, ...). This crate scans a source tree for bundles,
//! aggregates one language's files into a pack, and writes changed values
//! back while leaving the original line layout, comments, blank lines and
//! key order untouched wherever possible.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use propsync::LanguageTree;
//!
//! let mut tree = LanguageTree::new("src/main/resources", "en")?;
//! let pack = tree.load_language("fr")?;
//!
//! for file in pack.files() {
//!     let mut file = file.borrow_mut();
//!     file.set("common.greeting", "Bonjour");
//! }
//! for file in pack.files() {
//!     tree.save(&file.borrow())?;
//! }
//! # Ok::<(), propsync::Error>(())
//! ```
//!
//! # Behavior
//!
//! - 🔎 Bundles are discovered by the presence of a reference-language file;
//!   unsuffixed siblings belong to a distinct default language
//! - 📦 Files and packs are cached per tree; `update()` re-scans and drops
//!   both caches
//! - ✍️ Saving merges into the existing file line by line and replaces it
//!   atomically; new keys append at the end in insertion order
//! - 🔄 Values round-trip through the `.properties` escape encoding,
//!   including non-ASCII and control characters

pub mod error;
pub mod escape;
pub mod store;
pub mod tree;
pub mod types;

mod writer;

// Re-export most used types for easy consumption
pub use crate::{
    error::Error,
    store::OrderedMap,
    tree::LanguageTree,
    types::{BundleInfo, DEFAULT_LANGUAGE, EXTENSION, LanguageFile, LanguagePack},
};
