//! Value sources answer the placeholders of a template being resolved.
//!
//! A source is asked whether it owns an identifier and, if so, for its value.
//! Sources are consulted in the order given, the first owner wins. Identifiers
//! are compared case-insensitively throughout.

use std::collections::HashMap;
use std::env;
use std::sync::OnceLock;

use chrono::Local;
use seahash::SeaHasher;
use std::hash::BuildHasherDefault;

use crate::error::{Result, TemplexError};
use crate::value::{Extraction, Value};

pub type IdentifierHasher = BuildHasherDefault<SeaHasher>;

pub trait ValueSource: Send + Sync {
    fn owns(&self, identifier: &str) -> bool;
    fn value(&self, identifier: &str) -> Result<Value>;
}

/// Checks an identifier against a list, ignoring case.
pub fn valid_identifier<S: AsRef<str>>(identifier: &str, identifiers: &[S]) -> bool {
    identifiers
        .iter()
        .any(|i| i.as_ref().eq_ignore_ascii_case(identifier))
}

fn unknown(identifier: &str) -> TemplexError {
    TemplexError::SourceLookup {
        identifier: identifier.to_owned(),
        message: "invalid identifier".to_owned(),
    }
}

// ------------- Map -------------
/// Fixed values keyed by identifier. Keys that only differ in case collapse
/// into one entry, the last one inserted.
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    values: HashMap<String, Value, IdentifierHasher>,
}

impl MapSource {
    pub fn new<K, V, I>(values: I) -> Self
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut source = Self::default();
        for (key, value) in values {
            source.insert(key.as_ref(), value);
        }
        source
    }
    pub fn insert<V: Into<Value>>(&mut self, identifier: &str, value: V) {
        self.values.insert(identifier.to_lowercase(), value.into());
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Extraction> for MapSource {
    fn from(extraction: Extraction) -> Self {
        Self::new(extraction)
    }
}

impl ValueSource for MapSource {
    fn owns(&self, identifier: &str) -> bool {
        self.values.contains_key(&identifier.to_lowercase())
    }
    fn value(&self, identifier: &str) -> Result<Value> {
        self.values
            .get(&identifier.to_lowercase())
            .cloned()
            .ok_or_else(|| unknown(identifier))
    }
}

// ------------- Datetime -------------
/// The current local date and time, one field per identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatetimeSource;

impl DatetimeSource {
    const FIELDS: [(&'static str, &'static str); 7] = [
        ("yyyy", "%Y"),
        ("yy", "%y"),
        ("mm", "%m"),
        ("dd", "%d"),
        ("hh", "%H"),
        ("nn", "%M"),
        ("ss", "%S"),
    ];
    pub fn new() -> Self {
        Self
    }
    fn layout(identifier: &str) -> Option<&'static str> {
        Self::FIELDS
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(identifier))
            .map(|(_, layout)| *layout)
    }
}

impl ValueSource for DatetimeSource {
    fn owns(&self, identifier: &str) -> bool {
        Self::layout(identifier).is_some()
    }
    fn value(&self, identifier: &str) -> Result<Value> {
        let layout = Self::layout(identifier).ok_or_else(|| unknown(identifier))?;
        Ok(Value::Text(Local::now().format(layout).to_string()))
    }
}

// ------------- Directory -------------
/// `appdir` (directory of the running executable) and `curdir` (working
/// directory). Both are looked up once, on first use.
#[derive(Debug, Default)]
pub struct DirectorySource {
    probed: OnceLock<std::result::Result<(String, String), String>>,
}

impl DirectorySource {
    pub fn new() -> Self {
        Self::default()
    }
    fn probe() -> std::result::Result<(String, String), String> {
        let exe = env::current_exe().map_err(|e| e.to_string())?;
        let appdir = exe
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let curdir = env::current_dir().map_err(|e| e.to_string())?;
        Ok((appdir, curdir.to_string_lossy().into_owned()))
    }
}

impl ValueSource for DirectorySource {
    fn owns(&self, identifier: &str) -> bool {
        identifier.eq_ignore_ascii_case("appdir") || identifier.eq_ignore_ascii_case("curdir")
    }
    fn value(&self, identifier: &str) -> Result<Value> {
        let (appdir, curdir) = self
            .probed
            .get_or_init(Self::probe)
            .as_ref()
            .map_err(|message| TemplexError::SourceLookup {
                identifier: identifier.to_owned(),
                message: message.clone(),
            })?;
        if identifier.eq_ignore_ascii_case("appdir") {
            Ok(Value::Text(appdir.clone()))
        } else if identifier.eq_ignore_ascii_case("curdir") {
            Ok(Value::Text(curdir.clone()))
        } else {
            Err(unknown(identifier))
        }
    }
}
