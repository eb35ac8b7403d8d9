//! Error types for Evoflow.
//!
//! All errors in Evoflow are represented by the `EvoflowError` enum,
//! which provides specific variants for different error categories.
//! Outer-loop mutation failures carry the typed [`MutationError`] so
//! callers can distinguish a collaborator failure from a rejected proposal.

use std::io::ErrorKind;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all Evoflow operations.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum EvoflowError {
    /// Engine-level errors (agent wiring, evolution setup).
    #[error("{0}")]
    Engine(String),

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, TOML, etc.).
    #[error("{0}")]
    Convert(String),

    /// Graph schema errors: structural or referential validation failures.
    /// The message lists every violation found in the configuration.
    #[error("invalid graph config: {0}")]
    Schema(String),

    /// Node invocation errors reported by the external execution capability.
    #[error("{0}")]
    Node(String),

    /// Runtime execution errors.
    #[error("{0}")]
    Runtime(String),

    /// Outer-loop mutation errors.
    #[error(transparent)]
    Mutation(#[from] MutationError),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

/// Failure modes of an outer-loop architecture proposal.
///
/// Each variant terminates the proposal without touching the active
/// configuration; a mutation either yields a fully validated replacement
/// or nothing at all.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    /// The reasoning collaborator call itself failed.
    #[error("architect collaborator failed: {0}")]
    CollaboratorFailure(String),

    /// The collaborator's output could not be parsed as a configuration document.
    #[error("architect produced malformed output: {0}")]
    MalformedOutput(String),

    /// The proposed configuration parsed but violates the graph schema.
    #[error("proposed architecture violates schema: {0}")]
    SchemaViolation(String),
}

impl From<EvoflowError> for String {
    fn from(val: EvoflowError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for EvoflowError {
    fn from(error: std::io::Error) -> Self {
        EvoflowError::IoError(error.to_string())
    }
}

impl From<EvoflowError> for std::io::Error {
    fn from(val: EvoflowError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<serde_json::Error> for EvoflowError {
    fn from(error: serde_json::Error) -> Self {
        EvoflowError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for EvoflowError {
    fn from(error: toml::de::Error) -> Self {
        EvoflowError::Config(error.to_string())
    }
}

impl From<jsonschema::ValidationError<'_>> for EvoflowError {
    fn from(error: jsonschema::ValidationError<'_>) -> Self {
        EvoflowError::Schema(error.to_string())
    }
}
