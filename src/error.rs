//! Error types for the variable storage layer.
//!
//! Two families live here. `UnboundVariable`, `UnboundCell` and
//! `NameNotFound` are language-level errors: they flow back into the
//! compiled program's own error propagation and trigger frame teardown
//! along the unwind path. `InvalidClassification` is a translator defect:
//! it can only be produced by a buggy classification pass and aborts
//! compilation before any runtime behavior exists.

use std::error::Error as StdError;
use std::fmt;

/// Result alias used throughout the storage layer.
pub type RtResult<T> = Result<T, RtError>;

/// Typed errors produced by slots, cells, namespaces and frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtError {
    /// A local, parameter or temporary was read or deleted while unbound.
    UnboundVariable { name: String },

    /// A closure cell was read or deleted while unbound.
    /// Distinct from `UnboundVariable` only in its message wording,
    /// which names the enclosing scope.
    UnboundCell { name: String },

    /// A module global was read or deleted while absent from the namespace.
    NameNotFound { name: String },

    /// The classification pass handed the frame allocator something
    /// inconsistent. Always fatal to the compilation.
    InvalidClassification { message: String },
}

impl RtError {
    pub fn unbound_variable(name: impl Into<String>) -> Self {
        RtError::UnboundVariable { name: name.into() }
    }

    pub fn unbound_cell(name: impl Into<String>) -> Self {
        RtError::UnboundCell { name: name.into() }
    }

    pub fn name_not_found(name: impl Into<String>) -> Self {
        RtError::NameNotFound { name: name.into() }
    }

    pub fn invalid_classification(message: impl Into<String>) -> Self {
        RtError::InvalidClassification {
            message: message.into(),
        }
    }

    /// Get a human-readable description of the error.
    ///
    /// The unbound/not-defined wordings match the source language's
    /// reference interpreter so compiled programs report identical text.
    pub fn description(&self) -> String {
        match self {
            RtError::UnboundVariable { name } => {
                format!("local variable '{}' referenced before assignment", name)
            }
            RtError::UnboundCell { name } => {
                format!(
                    "free variable '{}' referenced before assignment in enclosing scope",
                    name
                )
            }
            RtError::NameNotFound { name } => {
                format!("name '{}' is not defined", name)
            }
            RtError::InvalidClassification { message } => {
                format!("invalid binding classification: {}", message)
            }
        }
    }

    /// The name of the variable involved, if the error carries one.
    pub fn variable_name(&self) -> Option<&str> {
        match self {
            RtError::UnboundVariable { name }
            | RtError::UnboundCell { name }
            | RtError::NameNotFound { name } => Some(name),
            RtError::InvalidClassification { .. } => None,
        }
    }

    /// True for the unbound-state errors that a compiled program can catch.
    pub fn is_unbound(&self) -> bool {
        matches!(
            self,
            RtError::UnboundVariable { .. }
                | RtError::UnboundCell { .. }
                | RtError::NameNotFound { .. }
        )
    }

    /// True when the error indicates a translator bug rather than a
    /// property of the program being compiled.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RtError::InvalidClassification { .. })
    }
}

impl fmt::Display for RtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl StdError for RtError {}

/// Conversion to String for callers that only carry message text.
impl From<RtError> for String {
    fn from(err: RtError) -> String {
        err.description()
    }
}
