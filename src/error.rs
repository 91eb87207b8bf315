use std::path::PathBuf;

use thiserror::Error;

use crate::data::fcs::FcsError;

/// Errors surfaced by the ridge-plot pipeline.
///
/// Every variant is terminal: the pipeline stops at the first one and
/// nothing is retried.
#[derive(Debug, Error)]
pub enum RidgeError {
    /// Source directory missing, not a directory, or empty
    #[error("invalid directory '{}': {reason}", path.display())]
    InvalidDirectory { path: PathBuf, reason: String },

    /// A capability the requested interaction needs is unavailable
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    /// No filename contains the sample identifier
    #[error("no files matching '{identifier}' in '{}'", dir.display())]
    NoMatchingFiles { identifier: String, dir: PathBuf },

    /// Files match the identifier but none of them is an FCS file
    #[error("files match '{identifier}' in '{}' but none of them are .fcs files", dir.display())]
    NoMatchingFcsFiles { identifier: String, dir: PathBuf },

    /// Output format not in the supported set
    #[error("unsupported output format '{0}' (expected jpeg or pdf)")]
    InvalidFormat(String),

    /// The user declined to save the figure
    #[error("saving cancelled by the user")]
    UserCancelled,

    #[error("invalid gate ({lower}, {upper}): lower bound must be finite and below the upper bound")]
    InvalidGate { lower: f64, upper: f64 },

    #[error("transparency {0} is outside [0, 1]")]
    InvalidAlpha(f64),

    #[error("unrecognised color '{0}'")]
    InvalidColor(String),

    #[error("cannot extract a time point from file name '{0}'")]
    MissingTimePoint(String),

    #[error("time point '{label}' of '{file}' was already loaded from another file")]
    DuplicateTimePoint { label: String, file: String },

    #[error("channel '{channel}' not found in '{file}'")]
    ChannelNotFound { channel: String, file: String },

    #[error("failed to read '{file}': {source}")]
    Fcs {
        file: String,
        #[source]
        source: FcsError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid plot style: {0}")]
    Style(String),

    #[error("rendering failed: {0}")]
    Render(String),

    #[error("JPEG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("PDF conversion failed: {0}")]
    Pdf(String),

    #[error("writing density table failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("preview window failed: {0}")]
    Preview(String),
}

impl RidgeError {
    /// Whether this is the user declining to save rather than a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, RidgeError::UserCancelled)
    }
}

/// Type alias for Results using RidgeError
pub type Result<T> = std::result::Result<T, RidgeError>;
