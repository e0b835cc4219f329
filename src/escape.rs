//! Line classification and the on-disk escape encoding for resource files.
//!
//! One logical record per non-blank, non-comment line: `key = value`, with
//! whitespace around the separator insignificant and the value escaped so the
//! whole file stays in a single-byte-safe ASCII repertoire. Both the loader
//! and the format-preserving writer classify lines through [`classify`], so
//! the two never disagree about what counts as a key/value line.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Key chars exclude whitespace, '=', '\', '#' and '!'; the value is the
    // rest of the line after the first '='. Keys cannot contain an escaped
    // '=', so the first '=' on the line is authoritative.
    static ref KEY_VALUE: Regex = Regex::new(r"^([^\s=\\#!]+)\s*=\s*(.*)$").unwrap();
}

/// The four kinds of line a resource file can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// Empty, or whitespace only.
    Blank,
    /// First non-whitespace character is `#` or `!`.
    Comment,
    /// A `key = value` record. `value` is the raw, still-escaped text.
    Pair { key: &'a str, value: &'a str },
    /// Anything else. Tolerated, never an error.
    Malformed,
}

/// Classifies one raw line.
///
/// The pair match only trims leading whitespace, so trailing spaces that are
/// part of an escaped value survive into `value`.
pub fn classify(raw: &str) -> Line<'_> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Line::Blank;
    }
    if trimmed.starts_with('#') || trimmed.starts_with('!') {
        return Line::Comment;
    }
    match KEY_VALUE.captures(raw.trim_start()) {
        Some(captures) => match (captures.get(1), captures.get(2)) {
            (Some(key), Some(value)) => Line::Pair {
                key: key.as_str(),
                value: value.as_str(),
            },
            _ => Line::Malformed,
        },
        None => Line::Malformed,
    }
}

/// Decodes one raw line into a semantic `(key, value)` pair, if it is one.
///
/// Blank, comment and malformed lines yield `None`.
pub fn decode(raw: &str) -> Option<(String, String)> {
    match classify(raw) {
        Line::Pair { key, value } => Some((key.to_string(), unescape(value))),
        _ => None,
    }
}

/// Encodes a semantic value into its escaped on-disk form.
///
/// Backslash and the C0 controls get mnemonic escapes, characters with
/// special meaning in the format (`=`, `:`, `#`, `!`) a guarding backslash,
/// leading and trailing space runs become `\ `, and everything outside
/// printable ASCII is written as `\uXXXX` UTF-16 code units (two of them for
/// supplementary-plane characters). The output is pure ASCII and
/// `unescape(escape(s)) == s` for every string.
pub fn escape(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let leading = chars.iter().take_while(|&&c| c == ' ').count();
    let trailing = if leading == chars.len() {
        0
    } else {
        chars.iter().rev().take_while(|&&c| c == ' ').count()
    };

    let mut out = String::with_capacity(value.len());
    for (i, &c) in chars.iter().enumerate() {
        let edge_space = c == ' ' && (i < leading || i >= chars.len() - trailing);
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{000C}' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            ' ' if edge_space => out.push_str("\\ "),
            c if (' '..='~').contains(&c) => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units).iter() {
                    out.push_str(&format!("\\u{:04X}", unit));
                }
            }
        }
    }
    out
}

/// Reverses the escape encoding back to the semantic value.
///
/// Decoding is lenient: a backslash before an unrecognized character drops
/// the backslash, an incomplete `\u` sequence degrades to literal text, and a
/// lone UTF-16 surrogate becomes U+FFFD. Surrogate pairs written as two `\u`
/// escapes are recombined into one scalar.
pub fn unescape(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '\\' {
            out.push(c);
            i += 1;
            continue;
        }
        if i + 1 >= chars.len() {
            // Trailing lone backslash stays literal.
            out.push('\\');
            break;
        }
        let next = chars[i + 1];
        i += 2;
        match next {
            't' => out.push('\t'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            'f' => out.push('\u{000C}'),
            'u' => match parse_code_unit(&chars, i) {
                Some(unit) => {
                    i += 4;
                    if (0xD800..0xDC00).contains(&unit) {
                        i += push_from_high_surrogate(&mut out, unit, &chars, i);
                    } else if (0xDC00..0xE000).contains(&unit) {
                        out.push(char::REPLACEMENT_CHARACTER);
                    } else {
                        out.push(
                            char::from_u32(u32::from(unit))
                                .unwrap_or(char::REPLACEMENT_CHARACTER),
                        );
                    }
                }
                None => out.push('u'),
            },
            other => out.push(other),
        }
    }
    out
}

/// Reads exactly four hex digits starting at `at`.
fn parse_code_unit(chars: &[char], at: usize) -> Option<u16> {
    if at + 4 > chars.len() {
        return None;
    }
    let mut unit: u32 = 0;
    for &c in &chars[at..at + 4] {
        unit = unit * 16 + c.to_digit(16)?;
    }
    Some(unit as u16)
}

/// Combines a high surrogate with a following `\uXXXX` low surrogate if one
/// is present; emits U+FFFD otherwise. Returns how many chars were consumed.
fn push_from_high_surrogate(out: &mut String, high: u16, chars: &[char], at: usize) -> usize {
    if chars.get(at) == Some(&'\\') && chars.get(at + 1) == Some(&'u') {
        if let Some(low) = parse_code_unit(chars, at + 2) {
            if (0xDC00..0xE000).contains(&low) {
                let scalar = 0x10000
                    + ((u32::from(high) - 0xD800) << 10)
                    + (u32::from(low) - 0xDC00);
                out.push(char::from_u32(scalar).unwrap_or(char::REPLACEMENT_CHARACTER));
                return 6;
            }
        }
    }
    out.push(char::REPLACEMENT_CHARACTER);
    0
}
