//! The four operations: resolve, extract, calculate and transform.
//!
//! An [`Engine`] carries the modifier pipeline its operations run chains
//! through, together with the built-in value sources and the fallback string
//! strategy. [`Engine::new`] takes the process-wide default pipeline at the
//! moment it is called.

use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, TemplexError};
use crate::escape;
use crate::modifier::{default_pipeline, evaluate, Pipeline};
use crate::pattern::{Anchor, Fragment, PLACEHOLDER, VALUE_GROUP};
use crate::source::{DatetimeSource, DirectorySource, ValueSource};
use crate::strategy::{ExtractionStrategy, StringStrategy};
use crate::value::{Extraction, Value};

/// One or more template fragments, or the steps of a modifier chain.
///
/// A single string is split on unescaped pipes, a list is taken as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments(Vec<String>);

impl Fragments {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<&str> for Fragments {
    fn from(text: &str) -> Self {
        Fragments(escape::split(text))
    }
}
impl From<String> for Fragments {
    fn from(text: String) -> Self {
        Fragments::from(text.as_str())
    }
}
impl From<&String> for Fragments {
    fn from(text: &String) -> Self {
        Fragments::from(text.as_str())
    }
}
impl From<Vec<String>> for Fragments {
    fn from(list: Vec<String>) -> Self {
        Fragments(list)
    }
}
impl From<Vec<&str>> for Fragments {
    fn from(list: Vec<&str>) -> Self {
        Fragments(list.into_iter().map(str::to_owned).collect())
    }
}
impl From<&[&str]> for Fragments {
    fn from(list: &[&str]) -> Self {
        Fragments(list.iter().map(|s| (*s).to_owned()).collect())
    }
}
impl<const N: usize> From<[&str; N]> for Fragments {
    fn from(list: [&str; N]) -> Self {
        Fragments(list.iter().map(|s| (*s).to_owned()).collect())
    }
}

#[derive(Debug)]
pub struct Engine {
    pipeline: Arc<Pipeline>,
    strings: StringStrategy,
    datetime: DatetimeSource,
    directory: DirectorySource,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_shared_pipeline(default_pipeline())
    }
    /// An engine that ignores the process-wide default pipeline.
    pub fn with_pipeline(pipeline: Pipeline) -> Self {
        Self::with_shared_pipeline(Arc::new(pipeline))
    }
    pub fn with_shared_pipeline(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            strings: StringStrategy::default(),
            datetime: DatetimeSource::new(),
            directory: DirectorySource::new(),
        }
    }
    /// Whether text extracted by the fallback string strategy is trimmed.
    pub fn trim_strings(mut self, trim: bool) -> Self {
        self.strings = StringStrategy::new(trim);
        self
    }
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Replaces every placeholder in `template` with the value of the first
    /// source owning its identifier, after running the value through the
    /// placeholder's modifier chain.
    ///
    /// Caller sources are consulted before the built-in date/time and
    /// directory sources.
    pub fn resolve(&self, template: &str, sources: &[&dyn ValueSource]) -> Result<String> {
        let mut all: Vec<&dyn ValueSource> = sources.to_vec();
        all.push(&self.datetime);
        all.push(&self.directory);

        let encoded = escape::encode(template);
        let mut resolved = String::with_capacity(encoded.len());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(&encoded) {
            let found = caps.get_match();
            resolved.push_str(&encoded[last..found.start()]);
            last = found.end();

            let identifier = &caps[1];
            let source = all
                .iter()
                .find(|source| source.owns(identifier))
                .ok_or_else(|| TemplexError::UnresolvedIdentifier(identifier.to_owned()))?;
            let mut value = source.value(identifier)?;
            if let Some(chain) = caps.get(2) {
                value = self.pipeline.apply(&value.to_string(), &chain_of(chain.as_str()))?;
            }
            debug!(identifier, value = %value, "substituted");
            resolved.push_str(&escape::protect(&value.to_string()));
        }
        resolved.push_str(&encoded[last..]);

        // escaped braces are encoded by now, so any brace left is a stray one
        if resolved.contains('{') || resolved.contains('}') {
            return Err(TemplexError::UnresolvedTemplate(template.to_owned()));
        }
        Ok(escape::unescape(&resolved))
    }

    /// Mines `text` for the values named by the placeholders of `fragments`.
    ///
    /// Every fragment must match. A fragment without a placeholder only
    /// asserts that its text is present; a fragment with one binds the
    /// matched value under the identifier as written.
    pub fn extract(
        &self,
        text: &str,
        fragments: impl Into<Fragments>,
        strategies: &[&dyn ExtractionStrategy],
    ) -> Result<Extraction> {
        let mut all: Vec<&dyn ExtractionStrategy> = strategies.to_vec();
        all.push(&self.strings);

        let fragments: Fragments = fragments.into();
        let mut extraction = Extraction::new();
        for fragment in fragments.iter() {
            let compiled = Fragment::parse(fragment)?;
            let Some((identifier, chain)) = compiled.placeholder() else {
                let assertion = compiled.compile("", Anchor::Plain)?;
                debug!(fragment, pattern = assertion.as_str(), "asserting");
                if !assertion.is_match(text) {
                    return Err(TemplexError::UnmatchedFragment(compiled.source().to_owned()));
                }
                continue;
            };
            let strategy = all
                .iter()
                .find(|strategy| strategy.owns(identifier))
                .ok_or_else(|| TemplexError::InvalidExpression(identifier.to_owned()))?;

            let candidates = strategy.candidates();
            let mut matched = None;
            for (index, candidate) in candidates.iter().enumerate() {
                let anchor = Anchor::select(compiled.at_end(), index, candidates.len());
                let pattern = compiled.compile(candidate, anchor)?;
                debug!(fragment, pattern = pattern.as_str(), "matching");
                if let Some(caps) = pattern.captures(text) {
                    let captured = caps.name(VALUE_GROUP).map_or("", |m| m.as_str());
                    matched = Some((captured.to_owned(), index));
                    break;
                }
            }
            let (captured, index) =
                matched.ok_or_else(|| TemplexError::UnmatchedFragment(compiled.source().to_owned()))?;

            let mut value = strategy
                .convert(&captured, index)
                .map_err(|e| TemplexError::Conversion {
                    identifier: identifier.to_owned(),
                    message: e.to_string(),
                })?;
            let chain = chain_of(chain);
            if !chain.is_empty() {
                value = self.pipeline.apply(&value.to_string(), &chain)?;
            }
            debug!(identifier, value = %value, candidate = index, "extracted");
            extraction.insert(identifier.to_owned(), value);
        }
        Ok(extraction)
    }

    /// Resolves the placeholders of `expression`, then evaluates it.
    pub fn calculate(&self, expression: &str, sources: &[&dyn ValueSource]) -> Result<Value> {
        let resolved = self.resolve(expression, sources)?;
        evaluate(&resolved)
    }

    /// Runs `text` through a modifier chain whose steps may themselves carry
    /// placeholders, as in `post(/{product})`.
    pub fn transform(
        &self,
        text: &str,
        chain: impl Into<Fragments>,
        sources: &[&dyn ValueSource],
    ) -> Result<String> {
        let chain: Fragments = chain.into();
        let steps = chain
            .iter()
            .map(|step| self.resolve(step, sources))
            .collect::<Result<Vec<_>>>()?;
        let chain = escape::join(&steps);
        Ok(self.pipeline.apply(text, &chain)?.to_string())
    }
}

// A placeholder chain is written after `|` or `:`, or starts right away with
// an arithmetic operator. Escaped pipes stay escaped so the chain still splits
// into the steps it was written with; every other escape becomes literal.
fn chain_of(encoded: &str) -> String {
    let chain = encoded
        .split("%7C")
        .map(escape::unescape)
        .collect::<Vec<_>>()
        .join("\\|");
    match chain.trim_start().strip_prefix(':') {
        Some(rest) => rest.to_owned(),
        None => chain,
    }
}
