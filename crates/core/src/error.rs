//! Error types for batch PDF conversion.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the pdf-to-png library.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Input root does not exist or is not a directory. Fatal to the run.
    #[error("input directory does not exist or is not a directory: {0}")]
    InputDirNotFound(PathBuf),

    /// A document could not be opened (corrupt, locked, unreadable).
    /// Recovered at document granularity.
    #[error("failed to open document '{path}': {message}")]
    OpenFailed { path: PathBuf, message: String },

    /// A single page failed to rasterize. Recovered at page granularity.
    #[error("failed to render page {page}: {message}")]
    RenderFailed { page: usize, message: String },

    /// Encoding a rendered page to the output format failed.
    #[error("image encoding failed: {0}")]
    EncodingFailed(String),

    /// Writing an output image to disk failed. Recovered at page granularity.
    #[error("failed to save image '{path}': {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Output directory creation failed.
    #[error("failed to create output directory '{path}': {message}")]
    OutputDirError { path: PathBuf, message: String },

    /// The native rendering library could not be loaded.
    #[error("pdfium library unavailable: {0}")]
    EngineUnavailable(String),

    /// The render worker for an open document went away mid-request.
    #[error("render worker terminated unexpectedly")]
    EngineDisconnected,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Underlying I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, ConvertError>;
