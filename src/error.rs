use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TfbumpError {
    #[error("Project validation failed: {0}")]
    ProjectValidation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HCL parse error in {file}:{line}:{column}: {message}")]
    Parse {
        file: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("'{input}' is not a valid version: {reason}")]
    VersionParse { input: String, reason: String },

    #[error("No version in the {major}.x family is published for '{module}'")]
    NoCompatibleVersion { module: String, major: u64 },

    #[error("Provider '{provider}' has no usable '{attribute}' identification attribute")]
    MissingIdentification { provider: String, attribute: String },

    #[error("Catalog request failed: {0}")]
    CatalogNetwork(String),

    #[error("Catalog response could not be understood: {0}")]
    CatalogFormat(String),

    #[error("Git operation failed: {0}")]
    GitOperation(String),

    #[error("Failed to write '{path}': {message}")]
    Persistence { path: PathBuf, message: String },

    #[error("Block reference is stale; the document changed after it was taken")]
    StaleReference,

    #[error("Rejected edit: {0}")]
    RejectedEdit(String),

    #[error("Formatting failed: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl TfbumpError {
    pub fn version_parse(input: &str, reason: impl Into<String>) -> Self {
        TfbumpError::VersionParse {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TfbumpError>;
