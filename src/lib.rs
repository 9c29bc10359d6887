//! Templex – placeholders in, placeholders out.
//!
//! Templex works with templates in which `{identifier}` placeholders stand
//! for values:
//! * [`resolve`] substitutes placeholders with values from [`source::ValueSource`]s.
//! * [`extract`] runs the other way: a template is compiled into a regular
//!   expression and matched against a text, yielding the values found where
//!   the placeholders sit.
//! * [`calculate`] resolves a template and evaluates it as arithmetic.
//! * [`transform`] runs a text through a modifier chain.
//!
//! A placeholder may carry a modifier chain that reshapes its value, such as
//! `{amount*100}`, `{name|sub(3)|post(.)}` or `{total|money(,2)|right(15)}`.
//!
//! ## Modules
//! * [`escape`] – Reversible escaping of `{ } # @ |` so that structure and
//!   literal text never get confused.
//! * [`modifier`] – The three modifier families (formatting, arithmetic,
//!   string reshaping) and the [`modifier::Pipeline`] dispatching between them.
//! * [`source`] – Value sources: fixed maps, the current date and time, and
//!   the application/working directories.
//! * [`strategy`] – Extraction strategies deciding what a value looks like in
//!   a text (numbers in two notations, phone numbers, plain strings).
//! * [`pattern`] – Compiles extraction fragments into regular expressions.
//! * [`engine`] – The [`Engine`] behind the four operations.
//! * [`settings`] – Start-up configuration from a file and the environment.
//!
//! ## Extraction Templates
//! Besides a placeholder, a fragment can contain wildcards: `@` stands for a
//! letter, `#` for a digit, and `{alpha}`, `{num}`, `{alphanum}` and `{any}`
//! for runs of those (`{num:11}` for exactly eleven digits). A backslash makes
//! any of `{ } # @ |` literal. A template given as one string is split into
//! fragments on `|`; every fragment must match somewhere in the text.
//!
//! ## Quick Start
//! ```
//! use templex::{extract, resolve, MapSource, NumberStrategy, Value};
//!
//! let source = MapSource::new([("name", "Ada"), ("amount", "1500")]);
//! let letter = resolve("Dear {name}, you owe {amount|money(.2)}.", &[&source]).unwrap();
//! assert_eq!(letter, "Dear Ada, you owe 1,500.00.");
//!
//! let numbers = NumberStrategy::new(["age"]);
//! let found = extract("I am 30 years old", "I am {age} years", &[&numbers]).unwrap();
//! assert_eq!(found["age"], Value::Int(30));
//! ```

pub mod engine;
pub mod error;
pub mod escape;
pub mod modifier;
pub mod pattern;
pub mod settings;
pub mod source;
pub mod strategy;
pub mod value;

pub use engine::{Engine, Fragments};
pub use error::{Result, TemplexError};
pub use modifier::{default_pipeline, set_default_pipeline, Modifier, Pipeline};
pub use settings::Settings;
pub use source::{DatetimeSource, DirectorySource, MapSource, ValueSource};
pub use strategy::{ExtractionStrategy, MsisdnFormat, MsisdnStrategy, NumberStrategy, StringStrategy};
pub use value::{Extraction, Value};

/// Resolves `template` with the default pipeline. See [`Engine::resolve`].
pub fn resolve(template: &str, sources: &[&dyn ValueSource]) -> Result<String> {
    Engine::new().resolve(template, sources)
}

/// Extracts values from `text` with the default pipeline. See [`Engine::extract`].
pub fn extract(
    text: &str,
    fragments: impl Into<Fragments>,
    strategies: &[&dyn ExtractionStrategy],
) -> Result<Extraction> {
    Engine::new().extract(text, fragments, strategies)
}

pub fn calculate(expression: &str, sources: &[&dyn ValueSource]) -> Result<Value> {
    Engine::new().calculate(expression, sources)
}

pub fn transform(
    text: &str,
    chain: impl Into<Fragments>,
    sources: &[&dyn ValueSource],
) -> Result<String> {
    Engine::new().transform(text, chain, sources)
}
