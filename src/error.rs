//! Error types shared by every stage of report generation.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// A failure recorded by a drawing call on the report canvas.
///
/// Drawing calls do not return errors directly. The first failure is stored on the canvas and
/// surfaced once, right before the document is saved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawError {
    operation: &'static str,
    message: String,
}

impl DrawError {
    /// Creates a new draw error for the named canvas operation.
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }

    /// Name of the canvas operation that failed.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Human-readable description of the failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DrawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.operation, self.message)
    }
}

impl std::error::Error for DrawError {}

/// Errors that can occur while loading input data or producing the report document.
#[derive(Debug)]
pub enum ReportError {
    /// A required file does not exist.
    NotFound {
        /// Path that could not be opened.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// A file exists but may not be read or written.
    PermissionDenied {
        /// Path that could not be accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The delimited input could not be parsed into rows.
    MalformedInput {
        /// Source file of the rows.
        path: PathBuf,
        /// 1-indexed line of the offending record, when known.
        line: Option<u64>,
        /// Description of the problem.
        reason: String,
    },
    /// Any other I/O failure, most notably while writing the output file.
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// A drawing call set the deferred error flag of the canvas.
    DeferredDraw(DrawError),
    /// The font family required for rendering could not be loaded.
    Font(genpdf::error::Error),
    /// The PDF document could not be rendered.
    Render(genpdf::error::Error),
    /// The report configuration is inconsistent with the input data.
    InvalidConfig(String),
}

impl ReportError {
    /// Maps an I/O error on `path` to the matching report error variant.
    pub fn from_io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path, source },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path, source },
            _ => Self::Io { path, source },
        }
    }

    /// Creates a [`ReportError::MalformedInput`] value.
    pub fn malformed(path: impl AsRef<Path>, line: Option<u64>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            path: path.as_ref().to_path_buf(),
            line,
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors caused by a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<DrawError> for ReportError {
    fn from(err: DrawError) -> Self {
        Self::DeferredDraw(err)
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path, .. } => write!(f, "File not found: {}", path.display()),
            Self::PermissionDenied { path, .. } => {
                write!(f, "Permission denied: {}", path.display())
            }
            Self::MalformedInput {
                path,
                line: Some(line),
                reason,
            } => write!(
                f,
                "Malformed input in {} at line {}: {}",
                path.display(),
                line,
                reason
            ),
            Self::MalformedInput {
                path,
                line: None,
                reason,
            } => write!(f, "Malformed input in {}: {}", path.display(), reason),
            Self::Io { path, source } => write!(f, "I/O error on {}: {}", path.display(), source),
            Self::DeferredDraw(err) => write!(f, "Failed creating PDF report: {err}"),
            Self::Font(err) => write!(f, "Failed to load fonts: {err}"),
            Self::Render(err) => write!(f, "Failed to render PDF document: {err}"),
            Self::InvalidConfig(reason) => write!(f, "Invalid report configuration: {reason}"),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound { source, .. }
            | Self::PermissionDenied { source, .. }
            | Self::Io { source, .. } => Some(source),
            Self::DeferredDraw(err) => Some(err),
            Self::Font(err) | Self::Render(err) => Some(err),
            Self::MalformedInput { .. } | Self::InvalidConfig(_) => None,
        }
    }
}
