//! Reversible escaping of the characters that carry structure in a template.
//!
//! A backslash makes `{`, `}`, `#`, `@` and `|` literal. Before anything scans a
//! template for structure, those escapes are turned into percent triplets
//! (`\{` becomes `%7B`), so that regex synthesis and pipe splitting never see
//! them. The percent sign itself is escaped first (`%` becomes `%25`), which is
//! what keeps the encoding reversible.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

// order matters: '%' must be escaped before anything else introduces a '%'
const ESCAPES: [(&str, &str, &str); 5] = [
    ("\\{", "%7B", "{"),
    ("\\}", "%7D", "}"),
    ("\\#", "%23", "#"),
    ("\\@", "%40", "@"),
    ("\\|", "%7C", "|"),
];

lazy_static! {
    static ref TRIPLET: Regex = Regex::new(r"%(25|7B|7D|23|40|7C)").unwrap();
}

/// Turns every escaped marker into its percent triplet.
pub fn encode(text: &str) -> String {
    let mut encoded = text.replace('%', "%25");
    for (escaped, triplet, _) in ESCAPES {
        encoded = encoded.replace(escaped, triplet);
    }
    encoded
}

/// Exact inverse of [`encode`].
pub fn decode(text: &str) -> String {
    restore(text, |escaped, _| escaped)
}

/// Like [`decode`], but an escaped marker comes back as the bare character.
pub fn unescape(text: &str) -> String {
    restore(text, |_, literal| literal)
}

/// Escapes only the percent sign, so that text spliced into an encoded
/// template comes out of [`unescape`] unchanged.
pub fn protect(text: &str) -> String {
    text.replace('%', "%25")
}

fn restore(text: &str, pick: fn(&'static str, &'static str) -> &'static str) -> String {
    TRIPLET
        .replace_all(text, |caps: &Captures| {
            let triplet = &caps[0];
            if triplet == "%25" {
                return "%";
            }
            ESCAPES
                .iter()
                .find(|(_, t, _)| *t == triplet)
                .map(|&(escaped, _, literal)| pick(escaped, literal))
                .unwrap_or("%")
        })
        .into_owned()
}

/// Splits a `|` separated list, ignoring escaped pipes.
///
/// Leading and trailing separators are dropped and `\|` comes back as a plain
/// `|` inside its piece.
pub fn split(text: &str) -> Vec<String> {
    let encoded = text.replace('%', "%25").replace("\\|", "%7C");
    encoded
        .trim_matches('|')
        .split('|')
        .map(|piece| piece.replace("%7C", "|").replace("%25", "%"))
        .collect()
}

/// Inverse of [`split`]: escapes the pipes inside every piece and joins them.
pub fn join<S: AsRef<str>>(pieces: &[S]) -> String {
    pieces
        .iter()
        .map(|piece| {
            let mut escaped = String::with_capacity(piece.as_ref().len());
            let mut previous = None;
            for c in piece.as_ref().chars() {
                if c == '|' && previous != Some('\\') {
                    escaped.push('\\');
                }
                escaped.push(c);
                previous = Some(c);
            }
            escaped
        })
        .collect::<Vec<_>>()
        .join("|")
}
