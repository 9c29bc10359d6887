//! Compiles an extraction fragment into a regular expression.
//!
//! A fragment such as `TRX {num}, {product} @@` is first cut into spans:
//! literal text, wildcards and at most one placeholder. Tokenizing happens in
//! tiers, each tier only looking at the literal text the previous tiers left:
//!
//! 1. `{alpha}`, `{num}`, `{alphanum}`, `{any}`, optionally counted (`{num:11}`)
//! 2. placeholders, `{identifier}` with an optional modifier chain
//! 3. runs of `@`, one letter each
//! 4. runs of `#`, one digit each
//!
//! The spans are then rendered around one candidate expression of the
//! strategy that owns the placeholder, and the result is compiled
//! case-insensitive and multi-line.

use lazy_static::lazy_static;
use regex::{Captures, NoExpand, Regex};

use crate::error::{Result, TemplexError};
use crate::escape;

lazy_static! {
    pub(crate) static ref PLACEHOLDER: Regex =
        Regex::new(r"(?i)\{\s*([a-z][a-z0-9._]*)\s*([*/+\-:|][^}]+)?\s*\}").unwrap();
    static ref CLASS: Regex =
        Regex::new(r"(?i)\{(alphanum|alpha|num|any)(?::([1-9][0-9]*))?\}").unwrap();
    static ref LETTERS: Regex = Regex::new(r"@+").unwrap();
    static ref DIGITS: Regex = Regex::new(r"#+").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Name of the capture group holding the placeholder's value.
pub const VALUE_GROUP: &str = "value";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    /// Encoded template text, matched literally.
    Literal(String),
    /// A ready-made regular expression.
    Wildcard(String),
    /// The chain is kept encoded, exactly as it was found.
    Placeholder { identifier: String, chain: String },
}

/// How the placeholder group is terminated when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// The candidate must match as written.
    Plain,
    /// The group may be skipped altogether.
    Optional,
    /// The candidate must be followed by whitespace or the end of a line.
    Guarded,
    /// The candidate must run to the end of a line.
    EndOfLine,
}

impl Anchor {
    /// Picks the anchor for candidate `index` of `count`.
    pub fn select(at_end: bool, index: usize, count: usize) -> Self {
        let last = index + 1 >= count;
        match (at_end, last) {
            (true, true) => Anchor::EndOfLine,
            (true, false) => Anchor::Guarded,
            (false, true) => Anchor::Optional,
            (false, false) => Anchor::Plain,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Fragment {
    source: String,
    spans: Vec<Span>,
}

impl Fragment {
    pub fn parse(fragment: &str) -> Result<Self> {
        let mut spans = vec![Span::Literal(escape::encode(fragment))];
        spans = tokenize(spans, &CLASS, |caps| Span::Wildcard(class(caps)));
        spans = tokenize(spans, &PLACEHOLDER, |caps| Span::Placeholder {
            identifier: caps[1].to_owned(),
            chain: caps.get(2).map_or("", |m| m.as_str()).to_owned(),
        });
        spans = tokenize(spans, &LETTERS, |caps| Span::Wildcard(counted("[a-z]", &caps[0])));
        spans = tokenize(spans, &DIGITS, |caps| Span::Wildcard(counted("[0-9]", &caps[0])));
        let placeholders = spans
            .iter()
            .filter(|span| matches!(span, Span::Placeholder { .. }))
            .count();
        if placeholders > 1 {
            return Err(TemplexError::MultipleIdentifier(fragment.to_owned()));
        }
        Ok(Self {
            source: fragment.to_owned(),
            spans,
        })
    }
    pub fn source(&self) -> &str {
        &self.source
    }
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }
    /// Identifier and (encoded) chain of the placeholder, if there is one.
    pub fn placeholder(&self) -> Option<(&str, &str)> {
        self.spans.iter().find_map(|span| match span {
            Span::Placeholder { identifier, chain } => Some((identifier.as_str(), chain.as_str())),
            _ => None,
        })
    }
    /// Whether nothing, not even whitespace, follows the placeholder.
    pub fn at_end(&self) -> bool {
        matches!(self.spans.last(), Some(Span::Placeholder { .. }))
    }
    /// Renders the fragment with `candidate` in place of the placeholder.
    pub fn render(&self, candidate: &str, anchor: Anchor) -> String {
        let mut pattern = String::from("(?im)");
        for span in &self.spans {
            match span {
                Span::Literal(text) => pattern.push_str(&literal(text)),
                Span::Wildcard(wildcard) => pattern.push_str(wildcard),
                Span::Placeholder { .. } => {
                    pattern.push_str(&format!("(?P<{}>{})", VALUE_GROUP, candidate));
                    pattern.push_str(match anchor {
                        Anchor::Plain => "",
                        Anchor::Optional => "?",
                        Anchor::Guarded => r"(?:\s|$)",
                        Anchor::EndOfLine => "$",
                    });
                }
            }
        }
        pattern
    }
    pub fn compile(&self, candidate: &str, anchor: Anchor) -> Result<Regex> {
        let pattern = self.render(candidate, anchor);
        Regex::new(&pattern).map_err(|_| TemplexError::InvalidExpression(pattern))
    }
}

fn tokenize<F>(spans: Vec<Span>, token: &Regex, make: F) -> Vec<Span>
where
    F: Fn(&Captures) -> Span,
{
    let mut tokenized = Vec::with_capacity(spans.len());
    for span in spans {
        let Span::Literal(text) = span else {
            tokenized.push(span);
            continue;
        };
        let mut last = 0;
        for caps in token.captures_iter(&text) {
            let found = caps.get_match();
            if found.start() > last {
                tokenized.push(Span::Literal(text[last..found.start()].to_owned()));
            }
            tokenized.push(make(&caps));
            last = found.end();
        }
        if last < text.len() {
            tokenized.push(Span::Literal(text[last..].to_owned()));
        }
    }
    tokenized
}

fn class(caps: &Captures) -> String {
    let name = caps[1].to_lowercase();
    let set = match name.as_str() {
        "any" => ".",
        "num" => "[0-9]",
        "alpha" => r"[a-z\s]",
        _ => r"[a-z0-9\s]",
    };
    match caps.get(2) {
        Some(count) => format!("{}{{{}}}", set, count.as_str()),
        None if name == "any" => format!("{}*?", set),
        None => format!("{}+?", set),
    }
}

fn counted(set: &str, run: &str) -> String {
    match run.chars().count() {
        1 => set.to_owned(),
        n => format!("{}{{{}}}", set, n),
    }
}

fn literal(text: &str) -> String {
    let quoted = regex::escape(&escape::unescape(text));
    WHITESPACE.replace_all(&quoted, NoExpand(r"\s+")).into_owned()
}
