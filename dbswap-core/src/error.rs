//! Error taxonomy for template rewriting.
//!
//! Every failure the rewriter can hit maps onto one of five variants. All of
//! them are terminal for a CLI invocation: the binary logs the error once and
//! exits with [`DbSwapError::exit_code`].

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The file operation that produced an I/O error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOperation {
    /// Reading the input template
    Read,
    /// Writing the rewritten output
    Write,
}

impl fmt::Display for IoOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "reading"),
            Self::Write => write!(f, "writing"),
        }
    }
}

/// Main error type for dbswap operations.
#[derive(Debug, Error)]
pub enum DbSwapError {
    /// Bad command-line value, such as a path without the `.json` suffix
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Input template does not exist
    #[error("File '{}' not found. Aborting", path.display())]
    NotFound { path: PathBuf },

    /// Read or write failed for a reason other than a missing file
    #[error("I/O error while {operation} '{}': {source}", path.display())]
    IoFailure {
        operation: IoOperation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input is not valid UTF-8, not valid JSON, or has the wrong shape
    #[error("Malformed input: {context}")]
    MalformedInput {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Anything the other variants do not cover
    #[error("Unexpected error: {context}")]
    Internal {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Convenience type alias for Results with DbSwapError
pub type Result<T> = std::result::Result<T, DbSwapError>;

impl DbSwapError {
    /// Translates a low-level I/O failure into the taxonomy.
    ///
    /// This is the single mapping point used by every read and write call
    /// site:
    /// - `NotFound` on read becomes [`DbSwapError::NotFound`]
    /// - `InvalidData` on read (non UTF-8 content) becomes
    ///   [`DbSwapError::MalformedInput`]
    /// - everything else becomes [`DbSwapError::IoFailure`]
    ///
    /// # Example
    /// ```rust
    /// use dbswap_core::error::{DbSwapError, IoOperation};
    /// use std::io;
    ///
    /// let err = DbSwapError::from_io(
    ///     IoOperation::Read,
    ///     "missing.json",
    ///     io::Error::from(io::ErrorKind::NotFound),
    /// );
    /// assert!(matches!(err, DbSwapError::NotFound { .. }));
    /// assert_eq!(err.to_string(), "File 'missing.json' not found. Aborting");
    /// ```
    pub fn from_io(operation: IoOperation, path: impl AsRef<Path>, error: std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match (operation, error.kind()) {
            (IoOperation::Read, std::io::ErrorKind::NotFound) => Self::NotFound { path },
            (IoOperation::Read, std::io::ErrorKind::InvalidData) => Self::MalformedInput {
                context: format!("'{}' is not valid UTF-8 text", path.display()),
                source: Some(Box::new(error)),
            },
            _ => Self::IoFailure {
                operation,
                path,
                source: error,
            },
        }
    }

    /// Creates an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a malformed input error without an underlying cause
    pub fn malformed(context: impl Into<String>) -> Self {
        Self::MalformedInput {
            context: context.into(),
            source: None,
        }
    }

    /// Creates a malformed input error wrapping a parse failure
    pub fn malformed_with<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::MalformedInput {
            context: context.into(),
            source: Some(Box::new(error)),
        }
    }

    /// Creates a catch-all error carrying the underlying cause
    pub fn internal<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Short name of the variant, used as a structured log field.
    pub const fn category(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "InvalidArgument",
            Self::NotFound { .. } => "NotFound",
            Self::IoFailure { .. } => "IoFailure",
            Self::MalformedInput { .. } => "MalformedInput",
            Self::Internal { .. } => "InternalError",
        }
    }

    /// Process exit status for this error. Every handled failure exits with 1.
    pub const fn exit_code(&self) -> u8 {
        1
    }

    /// Full message including the chain of underlying causes.
    pub fn detailed_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let cause_text = cause.to_string();
            if !message.contains(&cause_text) {
                message.push_str(": ");
                message.push_str(&cause_text);
            }
            source = cause.source();
        }
        message
    }
}
