//! Configuration and result types for batch PDF conversion.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Lossless PNG output.
    Png,
    /// JPEG output (background flattened to white).
    Jpeg,
}

impl ImageFormat {
    /// File extension used for output names.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            other => Err(format!("unsupported output format: {}", other)),
        }
    }
}

/// Immutable per-run conversion configuration.
///
/// Shared read-only across all workers; never mutated after a run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOptions {
    /// Output resolution in dots per inch.
    /// Default: 150.
    pub dpi: f64,

    /// Output image format.
    /// Default: PNG.
    pub format: ImageFormat,

    /// Maximum output width in pixels. 0 = unconstrained.
    pub max_width: u32,

    /// Maximum output height in pixels. 0 = unconstrained.
    pub max_height: u32,

    /// Whether to preserve the page aspect ratio when a maximum
    /// dimension forces downscaling.
    /// Default: true.
    pub preserve_aspect_ratio: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            dpi: 150.0,
            format: ImageFormat::Png,
            max_width: 0,
            max_height: 0,
            preserve_aspect_ratio: true,
        }
    }
}

impl ConversionOptions {
    /// Create options with the given DPI.
    pub fn with_dpi(dpi: f64) -> Self {
        Self {
            dpi,
            ..Default::default()
        }
    }

    /// Set the output format.
    pub fn format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the maximum output width in pixels.
    pub fn max_width(mut self, width: u32) -> Self {
        self.max_width = width;
        self
    }

    /// Set the maximum output height in pixels.
    pub fn max_height(mut self, height: u32) -> Self {
        self.max_height = height;
        self
    }

    /// Set whether the aspect ratio is preserved when clamping.
    pub fn preserve_aspect_ratio(mut self, preserve: bool) -> Self {
        self.preserve_aspect_ratio = preserve;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.dpi.is_finite() || self.dpi <= 0.0 {
            return Err(crate::error::ConvertError::InvalidConfig(
                "dpi must be a positive number".to_string(),
            ));
        }
        if self.dpi > 1200.0 {
            return Err(crate::error::ConvertError::InvalidConfig(
                "dpi must be at most 1200".to_string(),
            ));
        }
        Ok(())
    }
}

/// One document to convert: its path plus its ordinal position in the
/// discovered list. Identity is the path; immutable once enumerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentJob {
    /// Path to the PDF file.
    pub path: PathBuf,

    /// Zero-based position in the discovered list.
    pub index: usize,
}

impl DocumentJob {
    /// Create a new job.
    pub fn new(path: impl Into<PathBuf>, index: usize) -> Self {
        Self {
            path: path.into(),
            index,
        }
    }

    /// Display name: the file stem, or the full path if it has none.
    pub fn display_name(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Result of converting one page. Produced once, never mutated.
#[derive(Debug, Clone)]
pub struct PageOutcome {
    /// 1-based page number.
    pub page_number: usize,

    /// Whether the page was rendered and saved.
    pub success: bool,

    /// Error detail, present iff the page failed.
    pub error: Option<String>,
}

impl PageOutcome {
    /// A successful page.
    pub fn ok(page_number: usize) -> Self {
        Self {
            page_number,
            success: true,
            error: None,
        }
    }

    /// A failed page with a descriptive message.
    pub fn failed(page_number: usize, message: impl Into<String>) -> Self {
        Self {
            page_number,
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Aggregate result for one document.
#[derive(Debug, Clone)]
pub struct DocumentResult {
    /// Overall success: at least one page converted.
    pub success: bool,

    /// Number of pages successfully converted.
    pub pages_converted: usize,

    /// Per-page error messages, each prefixed with its page number.
    pub errors: Vec<String>,
}

impl DocumentResult {
    /// A document that failed before any page work (open failure,
    /// empty document).
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            pages_converted: 0,
            errors: vec![message.into()],
        }
    }
}

/// Aggregate result for an entire batch run.
///
/// Mutated only under exclusive access while workers merge document
/// results; counters are monotonic until the run completes. The error
/// list is in completion order, not discovery order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    /// Total documents seen by the run.
    pub total_pdfs: usize,

    /// Documents with at least one converted page.
    pub successful_conversions: usize,

    /// Documents with zero converted pages.
    pub failed_conversions: usize,

    /// Pages converted across all documents.
    pub total_pages_converted: usize,

    /// Error messages, prefixed with the document they belong to.
    pub errors: Vec<String>,
}

impl BatchResult {
    /// An empty result for a run over `total_pdfs` documents.
    pub fn new(total_pdfs: usize) -> Self {
        Self {
            total_pdfs,
            successful_conversions: 0,
            failed_conversions: 0,
            total_pages_converted: 0,
            errors: Vec::new(),
        }
    }

    /// Merge one document's result. Must be called under exclusive
    /// access; a single call is one critical section.
    pub fn merge(&mut self, document: &str, result: &DocumentResult) {
        if result.success {
            self.successful_conversions += 1;
        } else {
            self.failed_conversions += 1;
        }
        self.total_pages_converted += result.pages_converted;
        for error in &result.errors {
            self.errors.push(format!("{}: {}", document, error));
        }
    }
}

/// Snapshot emitted after each completed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// 1-based ordinal of the document that just completed.
    pub current_document: usize,

    /// Total number of documents in the run.
    pub total_documents: usize,

    /// Display name of the completed document.
    pub document_name: String,

    /// Best-effort cumulative page count across the batch so far.
    pub pages_processed: usize,
}
