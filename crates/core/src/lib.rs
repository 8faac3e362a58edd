//! # pdf-to-png-core
//!
//! Bounded concurrent batch conversion of PDF directories to per-page
//! raster images using:
//!
//! - **pdfium** (Google's PDF engine) for page rasterization
//! - **A two-level worker model**: a configurable pool of document
//!   workers over a shared cursor, plus a fixed per-document page limit
//!   that keeps peak memory bounded no matter how many workers run
//! - **Thread-safe aggregation** of batch counters and errors
//! - **Cooperative cancellation** via a run-scoped token
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use pdf_to_png_core::{BatchDispatcher, ConversionOptions, PdfiumEngine, find_documents};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let documents = find_documents(Path::new("./pdfs"))?;
//!
//!     let dispatcher = BatchDispatcher::new(
//!         Arc::new(PdfiumEngine::new()),
//!         ConversionOptions::with_dpi(200.0),
//!         4,
//!     );
//!     let result = dispatcher.run(documents, Path::new("./images"), None).await;
//!
//!     println!(
//!         "Converted {}/{} documents ({} pages)",
//!         result.successful_conversions, result.total_pdfs, result.total_pages_converted
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Progress and Cancellation
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use pdf_to_png_core::{
//!     BatchDispatcher, ConversionOptions, PdfiumEngine, ProgressEvent, ProgressSink,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let dispatcher = BatchDispatcher::new(
//!         Arc::new(PdfiumEngine::new()),
//!         ConversionOptions::default(),
//!         0, // auto-detect worker count
//!     );
//!
//!     // Cancel the whole run from anywhere, e.g. a signal handler.
//!     let token = dispatcher.cancellation_token();
//!     tokio::spawn(async move {
//!         tokio::signal::ctrl_c().await.ok();
//!         token.cancel();
//!     });
//!
//!     let sink: ProgressSink = Arc::new(|event: ProgressEvent| {
//!         println!(
//!             "[{}/{}] {} ({} pages so far)",
//!             event.current_document, event.total_documents,
//!             event.document_name, event.pages_processed
//!         );
//!     });
//!
//!     let result = dispatcher.run(Vec::new(), Path::new("./images"), Some(sink)).await;
//!     println!("{} errors", result.errors.len());
//! }
//! ```

pub mod cancel;
pub mod config;
pub mod converter;
pub mod discover;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod limiter;
pub mod pdfium;

// Re-export main types for convenience
pub use cancel::CancellationToken;
pub use config::{
    BatchResult, ConversionOptions, DocumentJob, DocumentResult, ImageFormat, PageOutcome,
    ProgressEvent,
};
pub use converter::{output_filename, DocumentConverter};
pub use discover::{ensure_directory, find_documents};
pub use dispatcher::{BatchDispatcher, ProgressSink};
pub use engine::{PageRenderSource, RasterPage, RenderEngine};
pub use error::{ConvertError, Result};
pub use limiter::{page_slot_limit, PageGate};
pub use pdfium::PdfiumEngine;

/// Supported input file extensions.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf"];

/// Check if a file extension is supported.
pub fn is_supported_extension(ext: &str) -> bool {
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|&e| e.eq_ignore_ascii_case(ext))
}

/// Initialize the library's logging.
/// Call this once at application startup if you want to see logs.
pub fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_extension("pdf"));
        assert!(is_supported_extension("PDF"));
        assert!(is_supported_extension("Pdf"));
        assert!(!is_supported_extension("docx"));
        assert!(!is_supported_extension(""));
    }
}
