//! The format-preserving merge at the heart of `save`.
//!
//! Reconciles three things line by line: what the file on disk looks like,
//! what values the in-memory [`LanguageFile`] wants persisted, and what must
//! be preserved verbatim (comments, blank lines, unrecognized lines, key
//! order). Keys the file no longer holds lose their line; keys with no line
//! yet are appended at the end in insertion order.

use std::collections::HashSet;

use crate::escape::{Line, classify, escape};
use crate::types::LanguageFile;

/// Merges the desired key/value state into the original line structure.
///
/// Pure over its inputs; the caller owns reading the original lines and
/// writing the result back out. Every key present in `file` appears exactly
/// once in the output, values freshly re-escaped; comment, blank and
/// unrecognized lines pass through unchanged and in order. Output uses `\n`
/// line endings with a trailing newline.
pub(crate) fn merge_lines(original: &[&str], file: &LanguageFile) -> String {
    let mut written: HashSet<String> = HashSet::new();
    let mut out = String::new();

    for line in original {
        match classify(line) {
            Line::Blank | Line::Comment | Line::Malformed => {
                out.push_str(line);
                out.push('\n');
            }
            Line::Pair { key, .. } => match file.get(key) {
                // Key no longer present: the line goes away.
                None => {}
                Some(value) => {
                    push_pair(&mut out, key, value);
                    written.insert(key.to_string());
                }
            },
        }
    }

    for (key, value) in file.pairs() {
        if !written.contains(key) {
            push_pair(&mut out, key, value);
        }
    }

    out
}

/// Renders a fresh file: every pair in insertion order, no header.
pub(crate) fn render_fresh(file: &LanguageFile) -> String {
    let mut out = String::new();
    for (key, value) in file.pairs() {
        push_pair(&mut out, key, value);
    }
    out
}

fn push_pair(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(" = ");
    out.push_str(&escape(value));
    out.push('\n');
}
