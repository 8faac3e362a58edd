//! Single-document conversion: page fan-out, outcome folding, naming.

use crate::cancel::CancellationToken;
use crate::config::{ConversionOptions, DocumentJob, DocumentResult, ImageFormat, PageOutcome};
use crate::engine::{PageRenderSource, RenderEngine};
use crate::error::Result;
use crate::limiter::PageGate;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Converts one document end-to-end: opens it, dispatches every page
/// through the page-level limiter, and folds the page outcomes into a
/// [`DocumentResult`].
///
/// All failure paths produce a result rather than an error: a document
/// that cannot be opened is a normal, recorded outcome.
pub struct DocumentConverter {
    engine: Arc<dyn RenderEngine>,
    options: Arc<ConversionOptions>,
    output_dir: PathBuf,
    cancel: CancellationToken,
}

impl DocumentConverter {
    pub fn new(
        engine: Arc<dyn RenderEngine>,
        options: Arc<ConversionOptions>,
        output_dir: impl Into<PathBuf>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            engine,
            options,
            output_dir: output_dir.into(),
            cancel,
        }
    }

    /// Convert one document. Never fails the batch: every outcome is a
    /// [`DocumentResult`].
    pub async fn convert(&self, job: &DocumentJob) -> DocumentResult {
        let path = job.path.clone();
        let engine = Arc::clone(&self.engine);
        let opened = tokio::task::spawn_blocking(move || engine.open(&path)).await;

        let source = match opened {
            Ok(Ok(source)) => source,
            Ok(Err(e)) => {
                warn!("Failed to open {:?}: {}", job.path, e);
                return DocumentResult::failure(e.to_string());
            }
            Err(e) => {
                warn!("Open task for {:?} failed: {}", job.path, e);
                return DocumentResult::failure(format!("open task failed: {}", e));
            }
        };

        let page_count = source.page_count();
        if page_count == 0 {
            return DocumentResult::failure("document has no pages");
        }

        debug!("Converting {:?} ({} pages)", job.path, page_count);

        // Fresh gate per document: the bound is per in-flight document,
        // independent of how many batch workers exist.
        let gate = PageGate::for_document();
        let stem = job.display_name();

        let mut tasks = Vec::with_capacity(page_count);
        for index in 0..page_count {
            let gate = gate.clone();
            let source = Arc::clone(&source);
            let options = Arc::clone(&self.options);
            let cancel = self.cancel.clone();
            let output_path = self
                .output_dir
                .join(output_filename(&stem, index + 1, options.format));

            tasks.push(tokio::spawn(async move {
                let page_number = index + 1;

                // Slot released by permit drop on every exit path.
                let _permit = match gate.acquire().await {
                    Ok(permit) => permit,
                    Err(e) => return PageOutcome::failed(page_number, e.to_string()),
                };

                // Pages that have not started rendering when cancellation
                // arrives are skipped; in-flight renders finish naturally.
                if cancel.is_cancelled() {
                    return PageOutcome::failed(page_number, "cancelled before render");
                }

                let rendered = tokio::task::spawn_blocking(move || {
                    render_and_save(source.as_ref(), index, &options, &output_path)
                })
                .await;

                match rendered {
                    Ok(Ok(())) => PageOutcome::ok(page_number),
                    Ok(Err(e)) => {
                        warn!("Page {} failed: {}", page_number, e);
                        PageOutcome::failed(page_number, e.to_string())
                    }
                    Err(e) => PageOutcome::failed(page_number, format!("page task failed: {}", e)),
                }
            }));
        }

        let outcomes = join_all(tasks)
            .await
            .into_iter()
            .enumerate()
            .map(|(index, joined)| {
                joined.unwrap_or_else(|e| {
                    PageOutcome::failed(index + 1, format!("page task panicked: {}", e))
                })
            })
            .collect();

        fold_outcomes(outcomes)
    }
}

/// Render one page and write it to disk.
fn render_and_save(
    source: &dyn PageRenderSource,
    index: usize,
    options: &ConversionOptions,
    output_path: &Path,
) -> Result<()> {
    let (width_pts, height_pts) = source.page_size(index)?;
    let (scale_x, scale_y) = page_scale(width_pts, height_pts, options);
    let raster = source.render_page(index, scale_x, scale_y)?;
    raster.save(output_path, options.format)?;
    debug!("Wrote {:?} ({}x{})", output_path, raster.width(), raster.height());
    Ok(())
}

/// Deterministic, collision-free output name: document stem plus a
/// zero-padded 3-digit 1-based page number plus the format extension.
/// Re-runs with the same inputs and options map to the same paths.
pub fn output_filename(stem: &str, page_number: usize, format: ImageFormat) -> String {
    format!("{}_page_{:03}.{}", stem, page_number, format.extension())
}

/// Per-axis render scale: `dpi / 72`, clamped so the output never
/// exceeds the configured maximum dimensions. With aspect-ratio
/// preservation the smaller axis scale wins for both axes.
pub(crate) fn page_scale(
    width_pts: f32,
    height_pts: f32,
    options: &ConversionOptions,
) -> (f32, f32) {
    let base = (options.dpi / 72.0) as f32;
    let mut scale_x = base;
    let mut scale_y = base;

    if options.max_width > 0 || options.max_height > 0 {
        let target_width = width_pts * scale_x;
        let target_height = height_pts * scale_y;

        if options.max_width > 0 && target_width > options.max_width as f32 {
            scale_x = options.max_width as f32 / width_pts;
        }
        if options.max_height > 0 && target_height > options.max_height as f32 {
            scale_y = options.max_height as f32 / height_pts;
        }

        if options.preserve_aspect_ratio {
            let uniform = scale_x.min(scale_y);
            scale_x = uniform;
            scale_y = uniform;
        }
    }

    (scale_x, scale_y)
}

/// Fold page outcomes into the document aggregate. Outcomes arrive in
/// completion order and are restored to page order here.
fn fold_outcomes(mut outcomes: Vec<PageOutcome>) -> DocumentResult {
    outcomes.sort_by_key(|o| o.page_number);

    let pages_converted = outcomes.iter().filter(|o| o.success).count();
    let errors = outcomes
        .iter()
        .filter(|o| !o.success)
        .map(|o| {
            format!(
                "page {}: {}",
                o.page_number,
                o.error.as_deref().unwrap_or("unknown error")
            )
        })
        .collect();

    DocumentResult {
        success: pages_converted > 0,
        pages_converted,
        errors,
    }
}
