//! Error types for bookprobe operations.

use thiserror::Error;

/// Errors that can occur while loading or analyzing a book package.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML writing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unrecoverable markup: {0}")]
    Markup(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid word pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Incomplete upload: {0}")]
    IncompleteUpload(String),
}

pub type Result<T> = std::result::Result<T, Error>;
