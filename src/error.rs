use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SubmitError {
    #[error("invalid BPA id: {0}")]
    InvalidBpaId(String),

    #[error("invalid spatial value: {0}")]
    InvalidSpatial(String),

    #[error("unsupported package type: {0}")]
    InvalidPackageType(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("missing CKAN base url (use --ckan-url or set ckan_url in the config)")]
    MissingCkanUrl,

    #[error("CKAN request failed: {0}")]
    CkanHttp(String),

    #[error("CKAN returned status {status}: {message}")]
    CkanStatus { status: u16, message: String },

    #[error("CKAN returned an unusable payload: {0}")]
    CkanPayload(String),

    #[error("failed to write submission file: {0}")]
    Csv(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
