use std::path::PathBuf;

use tailor_core::ColorParseError;
use thiserror::Error;

/// Failure to get bytes out of a path or URL.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("unsupported source '{0}'")]
    Unsupported(String),

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("request to '{url}' failed: {reason}")]
    Http { url: String, reason: String },

    #[error("'{url}' answered {status} {status_text}")]
    HttpStatus {
        url: String,
        status: u16,
        status_text: String,
    },
}

/// The catalog could not be loaded. The previous catalog stays in effect.
#[derive(Error, Debug)]
pub enum CatalogFetchError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed catalog document: {0}")]
    Malformed(String),

    #[error("catalog task failed: {0}")]
    TaskFailed(String),
}

/// The model could not be loaded. The previous scene stays in effect.
#[derive(Error, Debug)]
pub enum SceneLoadError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("scene task failed: {0}")]
    TaskFailed(String),
}

/// A single variant could not be instantiated and is skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MaterialCreationError {
    #[error("invalid {field} color '{value}': {source}")]
    InvalidColor {
        field: &'static str,
        value: String,
        source: ColorParseError,
    },

    #[error("{field} must be a finite number, got {value}")]
    InvalidFactor { field: &'static str, value: f32 },
}

/// A single metadata reference could not be resolved and is skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetadataResolutionError {
    #[error("metadata '{key}' references unknown catalog id '{id}'")]
    UnknownCatalogId { key: String, id: String },

    #[error("metadata '{key}' is not a valid color list: {reason}")]
    MalformedColorList { key: String, reason: String },

    #[error("metadata '{key}' expected {expected}, found {found}")]
    UnexpectedValue {
        key: String,
        expected: &'static str,
        found: String,
    },
}
