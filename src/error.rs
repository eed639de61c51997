//! Error types for Nodeflow.
//!
//! All errors in Nodeflow are represented by the `NodeflowError` enum.
//! The first group of variants follows the run-level failure taxonomy
//! (validation, structure, limits, tasks, cancellation); the rest cover
//! the ambient plumbing around it.

use std::{io::ErrorKind, string::FromUtf8Error};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all Nodeflow operations.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum NodeflowError {
    /// Malformed input document, rejected before any run starts.
    #[error("invalid workflow: {0}")]
    Validation(String),

    /// The graph cannot be executed at all (e.g. no Start node).
    #[error("{0}")]
    Structural(String),

    /// Step or wall-clock ceiling crossed.
    #[error("{0}")]
    LimitExceeded(String),

    /// A single node's task failed.
    #[error("{0}")]
    Task(String),

    /// The run was cancelled before it could finish.
    #[error("run cancelled")]
    Cancelled,

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, TOML, etc.).
    #[error("{0}")]
    Convert(String),

    /// Runtime execution errors.
    #[error("{0}")]
    Runtime(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

impl NodeflowError {
    /// Shorthand used by task implementations.
    pub fn task(msg: impl Into<String>) -> Self {
        NodeflowError::Task(msg.into())
    }
}

impl From<NodeflowError> for String {
    fn from(val: NodeflowError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for NodeflowError {
    fn from(error: std::io::Error) -> Self {
        NodeflowError::IoError(error.to_string())
    }
}

impl From<NodeflowError> for std::io::Error {
    fn from(val: NodeflowError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<FromUtf8Error> for NodeflowError {
    fn from(_: FromUtf8Error) -> Self {
        NodeflowError::Runtime("Error with utf-8 string convert".to_string())
    }
}

impl From<serde_json::Error> for NodeflowError {
    fn from(error: serde_json::Error) -> Self {
        NodeflowError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for NodeflowError {
    fn from(error: toml::de::Error) -> Self {
        NodeflowError::Config(error.to_string())
    }
}

impl From<reqwest::Error> for NodeflowError {
    fn from(error: reqwest::Error) -> Self {
        NodeflowError::Task(format!("Http error: {}", error))
    }
}

impl From<jsonschema::ValidationError<'_>> for NodeflowError {
    fn from(error: jsonschema::ValidationError<'_>) -> Self {
        NodeflowError::Validation(error.to_string())
    }
}
