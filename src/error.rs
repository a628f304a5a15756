//! Error types for document loading, sampled execution and inference.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading documents, configuration or callable descriptors.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid API document: {message}")]
    InvalidDocument { message: String },

    #[error("invalid configuration in {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Failure of a caller-supplied callable run against a synthetic fixture.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SampleError {
    #[error("fixture has no attribute '{name}'")]
    MissingAttribute { name: String },

    #[error("callable failed: {message}")]
    Failed { message: String },

    #[error("callable panicked: {message}")]
    Panicked { message: String },
}

impl SampleError {
    /// Convenience constructor for callables reporting their own failure.
    pub fn failed(message: impl Into<String>) -> Self {
        SampleError::Failed {
            message: message.into(),
        }
    }
}

/// Why one inference strategy produced no result.
///
/// Never returned from the public inference entry points; misses are logged
/// and the next strategy is tried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceMiss {
    #[error("no declared return type")]
    NoAnnotation,

    #[error("unsupported return annotation `{annotation}`")]
    UnsupportedAnnotation { annotation: String },

    #[error("no source text")]
    NoSource,

    #[error("source did not parse: {message}")]
    ParseFailed { message: String },

    #[error("no return statements with a recognizable shape")]
    NoReturns,

    #[error("no sampler attached")]
    NoSampler,

    #[error(transparent)]
    Sample(#[from] SampleError),
}
