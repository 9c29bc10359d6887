//! Start-up configuration.
//!
//! Settings are layered from an optional file (`templex.toml`, `.json` or
//! `.yaml` in the working directory, or an explicit path) and `TEMPLEX_*`
//! environment variables, the latter winning. Nested keys use a double
//! underscore, as in `TEMPLEX_MSISDN__COUNTRY=62`.

use std::collections::HashMap;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::engine::Engine;
use crate::error::Result;
use crate::modifier::{set_default_pipeline, Pipeline};
use crate::source::MapSource;
use crate::strategy::{ExtractionStrategy, MsisdnFormat, MsisdnStrategy, NumberStrategy};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Modifier families in the order they get to claim a chain.
    pub modifiers: Vec<String>,
    pub trim_strings: bool,
    /// Fixed values available to every resolve.
    pub values: HashMap<String, String>,
    /// Identifiers extracted as numbers.
    pub numbers: Vec<String>,
    pub msisdn: Option<MsisdnSettings>,
    /// Log filter used when `RUST_LOG` is not set.
    pub log: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MsisdnSettings {
    pub country: u32,
    #[serde(default)]
    pub format: MsisdnFormat,
    #[serde(default)]
    pub identifiers: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            modifiers: vec!["format".into(), "number".into(), "string".into()],
            trim_strings: true,
            values: HashMap::new(),
            numbers: Vec::new(),
            msisdn: None,
            log: "info".into(),
        }
    }
}

impl Settings {
    /// Reads `path` if given (it must then exist), otherwise an optional
    /// `templex.*` file, and overlays the environment.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name("templex").required(false),
        };
        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("TEMPLEX")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("modifiers")
                    .with_list_parse_key("numbers"),
            )
            .build()?;
        Self::from_config(config)
    }
    pub fn from_config(config: Config) -> Result<Self> {
        Ok(config.try_deserialize()?)
    }
    pub fn pipeline(&self) -> Result<Pipeline> {
        Pipeline::from_names(&self.modifiers)
    }
    /// Makes the configured pipeline the process-wide default.
    pub fn install(&self) -> Result<()> {
        set_default_pipeline(self.pipeline()?);
        Ok(())
    }
    pub fn engine(&self) -> Result<Engine> {
        Ok(Engine::with_pipeline(self.pipeline()?).trim_strings(self.trim_strings))
    }
    pub fn source(&self) -> MapSource {
        MapSource::new(self.values.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
    /// Phone numbers first, since their identifiers are the more specific.
    pub fn strategies(&self) -> Vec<Box<dyn ExtractionStrategy>> {
        let mut strategies: Vec<Box<dyn ExtractionStrategy>> = Vec::new();
        if let Some(msisdn) = &self.msisdn {
            strategies.push(Box::new(MsisdnStrategy::new(
                msisdn.country,
                msisdn.format,
                msisdn.identifiers.clone(),
            )));
        }
        if !self.numbers.is_empty() {
            strategies.push(Box::new(NumberStrategy::new(self.numbers.clone())));
        }
        strategies
    }
}
