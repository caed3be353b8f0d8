//! Boundary error types for the model container.
//!
//! [`ModelError`] covers every failure the public load/save/construct
//! entry points can report. Variants are structured and matchable;
//! [`ModelError::kind`] collapses them into the coarse [`ErrorKind`]
//! taxonomy for callers that only branch on the category.

use std::io;
use std::path::PathBuf;

use ogx_core::GraphError;
use thiserror::Error;

/// Coarse error categories exposed at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A structurally invalid argument or envelope (missing graph, no
    /// opset imports, negative descriptor).
    InvalidArgument,
    /// A path did not resolve to an existing file at open time.
    NoSuchFile,
    /// The binary envelope is malformed or was not fully consumed.
    InvalidProtobuf,
    /// Graph resolution failed after a successful parse.
    ResolutionFailure,
    /// Any other OS-level failure, carrying the system error code.
    System,
}

/// Errors produced by model construction, loading, and saving.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The envelope has no graph.
    #[error("model has no graph")]
    MissingGraph,

    /// The envelope declares no operator-set imports.
    #[error("missing opset import: a model must declare at least one operator-set version")]
    MissingOpsetImport,

    /// A descriptor-based entry point was handed a negative descriptor.
    #[error("invalid file descriptor: {fd}")]
    InvalidDescriptor { fd: i32 },

    /// A path argument the OS rejected as invalid.
    #[error("invalid path argument: {}", path.display())]
    InvalidPath { path: PathBuf },

    /// The file to load does not exist.
    #[error("no such file: {}", path.display())]
    NoSuchFile { path: PathBuf },

    /// The envelope bytes could not be decoded.
    #[error("failed to decode model envelope: {0}")]
    Decode(#[from] prost::DecodeError),

    /// Graph resolution failed; propagated verbatim from the graph
    /// collaborator.
    #[error("graph resolution failed: {0}")]
    Resolution(#[from] GraphError),

    /// Any other OS-level failure.
    #[error("system error {code}: {source}")]
    System {
        code: i32,
        #[source]
        source: io::Error,
    },
}

impl ModelError {
    /// The coarse category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelError::MissingGraph
            | ModelError::MissingOpsetImport
            | ModelError::InvalidDescriptor { .. }
            | ModelError::InvalidPath { .. } => ErrorKind::InvalidArgument,
            ModelError::NoSuchFile { .. } => ErrorKind::NoSuchFile,
            ModelError::Decode(_) => ErrorKind::InvalidProtobuf,
            ModelError::Resolution(_) => ErrorKind::ResolutionFailure,
            ModelError::System { .. } => ErrorKind::System,
        }
    }

    /// The underlying OS error code, for [`ErrorKind::System`] errors.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            ModelError::System { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Wraps an I/O error as a system failure carrying its OS code.
    pub(crate) fn system(source: io::Error) -> Self {
        ModelError::System {
            code: source.raw_os_error().unwrap_or(0),
            source,
        }
    }
}
