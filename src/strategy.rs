//! Extraction strategies decide what the value behind a placeholder looks like
//! when a text is mined, and how the matched text becomes a [`Value`].
//!
//! Each strategy offers one or more candidate regular expressions. The engine
//! tries them in order and hands the matched text back to [`convert`] together
//! with the index of the candidate that matched, so a strategy can normalise
//! differently depending on which notation was found.
//!
//! [`convert`]: ExtractionStrategy::convert

use regex::Regex;

use crate::error::{Result, TemplexError};
use crate::source::valid_identifier;
use crate::value::Value;

pub trait ExtractionStrategy: Send + Sync {
    fn owns(&self, identifier: &str) -> bool;
    /// Candidate expressions, most specific first.
    fn candidates(&self) -> Vec<String>;
    fn convert(&self, matched: &str, index: usize) -> Result<Value>;
}

// ------------- Number -------------
/// Numbers in either `1.234.567,89` or `1,234,567.89` notation.
#[derive(Debug, Clone, Default)]
pub struct NumberStrategy {
    identifiers: Vec<String>,
}

impl NumberStrategy {
    // (thousands separator, decimal separator) per candidate
    const NOTATIONS: [(char, char); 2] = [('.', ','), (',', '.')];

    pub fn new<S: Into<String>>(identifiers: impl IntoIterator<Item = S>) -> Self {
        Self {
            identifiers: identifiers.into_iter().map(Into::into).collect(),
        }
    }
}

impl ExtractionStrategy for NumberStrategy {
    fn owns(&self, identifier: &str) -> bool {
        valid_identifier(identifier, &self.identifiers)
    }
    fn candidates(&self) -> Vec<String> {
        vec![
            r"\-?([0-9]{1,3}(\.[0-9]{3})*|([0-9]+))(\,[0-9]{1,2})?".to_owned(),
            r"\-?([0-9]{1,3}(\,[0-9]{3})*|([0-9]+))(\.[0-9]{1,2})?".to_owned(),
        ]
    }
    fn convert(&self, matched: &str, index: usize) -> Result<Value> {
        let mut number = matched.trim().to_owned();
        if let Some(&(thousands, decimal)) = Self::NOTATIONS.get(index) {
            number = number.replace(thousands, "").replace(decimal, ".");
        }
        let value = if number.contains('.') {
            number.parse::<f64>().map(Value::Float).ok()
        } else {
            number.parse::<i64>().map(Value::Int).ok()
        };
        Ok(value.unwrap_or(Value::Text(number)))
    }
}

// ------------- Msisdn -------------
/// How the prefix of a matched phone number is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MsisdnFormat {
    /// `0812...`
    Local,
    /// `62812...`
    Country,
    /// `+62812...`
    #[default]
    International,
}

/// Mobile subscriber numbers written with a local `0` or a country prefix.
#[derive(Debug, Clone)]
pub struct MsisdnStrategy {
    identifiers: Vec<String>,
    country: u32,
    format: MsisdnFormat,
}

impl MsisdnStrategy {
    /// A `country` of 0 only accepts local numbers and leaves them untouched.
    pub fn new<S: Into<String>>(
        country: u32,
        format: MsisdnFormat,
        identifiers: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            identifiers: identifiers.into_iter().map(Into::into).collect(),
            country,
            format,
        }
    }
    fn prefix(&self) -> String {
        format!(r"(0|\+?{})", self.country)
    }
}

impl ExtractionStrategy for MsisdnStrategy {
    fn owns(&self, identifier: &str) -> bool {
        valid_identifier(identifier, &self.identifiers)
    }
    fn candidates(&self) -> Vec<String> {
        if self.country == 0 {
            vec![r"0[1-9][0-9]+".to_owned()]
        } else {
            vec![format!(r"{}[1-9][0-9]+", self.prefix())]
        }
    }
    fn convert(&self, matched: &str, index: usize) -> Result<Value> {
        if self.country == 0 || index != 0 {
            return Ok(Value::Text(matched.to_owned()));
        }
        let replacement = match self.format {
            MsisdnFormat::Local => "0".to_owned(),
            MsisdnFormat::Country => self.country.to_string(),
            MsisdnFormat::International => format!("+{}", self.country),
        };
        let pattern = format!("^{}", self.prefix());
        let prefix = Regex::new(&pattern).map_err(|_| TemplexError::InvalidExpression(pattern))?;
        Ok(Value::Text(
            prefix.replace(matched, replacement.as_str()).into_owned(),
        ))
    }
}

// ------------- String -------------
/// Takes whatever the surrounding text leaves over. Owns every identifier, so
/// it is always the last strategy consulted.
#[derive(Debug, Clone, Copy)]
pub struct StringStrategy {
    trim: bool,
}

impl StringStrategy {
    pub fn new(trim: bool) -> Self {
        Self { trim }
    }
}

impl Default for StringStrategy {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ExtractionStrategy for StringStrategy {
    fn owns(&self, _identifier: &str) -> bool {
        true
    }
    fn candidates(&self) -> Vec<String> {
        vec![r".+?".to_owned()]
    }
    fn convert(&self, matched: &str, _index: usize) -> Result<Value> {
        if self.trim {
            Ok(Value::Text(matched.trim().to_owned()))
        } else {
            Ok(Value::Text(matched.to_owned()))
        }
    }
}
