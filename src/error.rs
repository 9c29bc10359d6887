use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplexError {
    #[error("Unresolved identifier: \"{0}\"")]
    UnresolvedIdentifier(String),
    #[error("Unresolved template: \"{0}\"")]
    UnresolvedTemplate(String),
    #[error("Invalid expression: \"{0}\"")]
    InvalidExpression(String),
    #[error("Multiple identifiers in fragment: \"{0}\"")]
    MultipleIdentifier(String),
    #[error("Division by zero: \"{0}\"")]
    DivisionByZero(String),
    #[error("Invalid modifier: \"{0}\"")]
    InvalidModifier(String),
    #[error("Unmatched fragment: \"{0}\"")]
    UnmatchedFragment(String),
    #[error("Conversion of \"{identifier}\" failed: {message}")]
    Conversion { identifier: String, message: String },
    #[error("Lookup of \"{identifier}\" failed: {message}")]
    SourceLookup { identifier: String, message: String },
    #[error("Config error: {0}")]
    Config(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, TemplexError>;

// Helper conversions
impl From<config::ConfigError> for TemplexError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
impl From<serde_json::Error> for TemplexError {
    fn from(e: serde_json::Error) -> Self { Self::Serialization(e.to_string()) }
}
