//! Error types for Tessera
//!
//! Library errors use `thiserror`. Port-level failures (controllers, layer
//! files) keep their own enums and are wrapped here with call context.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::ports::{ControllerError, LayerFileError};
use crate::domain::value_objects::Operation;

/// Result type alias for Tessera operations
pub type TesseraResult<T> = Result<T, TesseraError>;

/// Coarse classification of a [`TesseraError`].
///
/// Top-level tooling maps these to user-facing messages; retry wrappers use
/// [`TesseraError::is_transient`] on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingRequiredDependency,
    UnboundOperation,
    BackendFailure,
    AttributeMapping,
    Configuration,
    Schema,
}

/// Main error type for Tessera operations
#[derive(Error, Debug)]
pub enum TesseraError {
    /// Key path with no atoms, or with an empty atom
    #[error("invalid key path '{path}': {reason}")]
    InvalidKeyPath { path: String, reason: String },

    /// Layer selector that matches no layer in the stack
    #[error("unknown config layer '{selector}'")]
    UnknownLayer { selector: String },

    /// Layer name already present in the stack
    #[error("config layer '{name}' already exists")]
    DuplicateLayer { name: String },

    #[error("unknown object type '{object_type}'")]
    UnknownObjectType { object_type: String },

    /// A required data or object dependency could not be resolved
    #[error("'{object_type}' {operation} requires '{dependency}'")]
    MissingRequiredDependency {
        object_type: String,
        operation: Operation,
        dependency: String,
        #[source]
        cause: Option<Box<TesseraError>>,
    },

    /// No process handler and no controller binding for the operation
    #[error("'{object_type}' has no handler bound for {operation}")]
    UnboundOperation {
        object_type: String,
        operation: Operation,
    },

    /// Object dependencies loop back onto a type already being resolved
    #[error("dependency cycle while resolving: {}", chain.join(" -> "))]
    DependencyCycle { chain: Vec<String> },

    /// Controller primitive failed
    #[error("backend failure on '{object_type}' {operation}: {source}")]
    Backend {
        object_type: String,
        operation: Operation,
        #[source]
        source: ControllerError,
    },

    /// Process handler failed
    #[error("process handler for '{object_type}' {operation} failed: {source}")]
    Handler {
        object_type: String,
        operation: Operation,
        #[source]
        source: anyhow::Error,
    },

    /// Handler returned a value that does not fit the operation
    #[error("process handler for '{object_type}' {operation} returned {returned}")]
    InvalidHandlerResult {
        object_type: String,
        operation: Operation,
        returned: &'static str,
    },

    /// Query filter that is neither an object nor null
    #[error("query filter for '{object_type}' must be an object, found {found}")]
    InvalidFilter {
        object_type: String,
        found: &'static str,
    },

    /// Metadata validation rule is not a valid regular expression
    #[error("invalid validation rule for '{key}': {message}")]
    InvalidValidationRule { key: String, message: String },

    #[error("attribute '{attribute}' of '{object_type}' unavailable: {reason}")]
    AttributeMapping {
        object_type: String,
        attribute: String,
        reason: String,
    },

    #[error(transparent)]
    LayerFile(#[from] LayerFileError),

    #[error("account '{name}' not found at {path}")]
    AccountNotFound { name: String, path: PathBuf },

    /// Account cannot be saved until the listed keys are set
    #[error("account is not ready to be saved, missing: {}", missing.join(", "))]
    AccountNotReady { missing: Vec<String> },

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<TesseraError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings in {file}: {message}")]
    InvalidSettings { file: PathBuf, message: String },
}

impl TesseraError {
    /// Wrap an arbitrary handler failure with its call context.
    pub fn handler(
        object_type: impl Into<String>,
        operation: Operation,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        TesseraError::Handler {
            object_type: object_type.into(),
            operation,
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TesseraError::MissingRequiredDependency { .. } => ErrorKind::MissingRequiredDependency,
            TesseraError::UnboundOperation { .. } => ErrorKind::UnboundOperation,
            TesseraError::Backend { .. }
            | TesseraError::Handler { .. }
            | TesseraError::InvalidHandlerResult { .. }
            | TesseraError::RetriesExhausted { .. } => ErrorKind::BackendFailure,
            TesseraError::AttributeMapping { .. } => ErrorKind::AttributeMapping,
            TesseraError::UnknownObjectType { .. }
            | TesseraError::DependencyCycle { .. }
            | TesseraError::InvalidValidationRule { .. } => ErrorKind::Schema,
            TesseraError::InvalidKeyPath { .. }
            | TesseraError::InvalidFilter { .. }
            | TesseraError::UnknownLayer { .. }
            | TesseraError::DuplicateLayer { .. }
            | TesseraError::LayerFile(_)
            | TesseraError::AccountNotFound { .. }
            | TesseraError::AccountNotReady { .. }
            | TesseraError::Io(_)
            | TesseraError::InvalidSettings { .. } => ErrorKind::Configuration,
        }
    }

    /// True when the failure comes from a backend condition worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            TesseraError::Backend { source, .. } => source.is_transient(),
            TesseraError::Handler { source, .. } => source
                .downcast_ref::<TesseraError>()
                .is_some_and(TesseraError::is_transient),
            _ => false,
        }
    }
}
