//! Batch dispatcher: the outer worker pool over the shared document cursor.

use crate::cancel::CancellationToken;
use crate::config::{BatchResult, ConversionOptions, DocumentJob, ProgressEvent};
use crate::converter::DocumentConverter;
use crate::discover::ensure_directory;
use crate::engine::RenderEngine;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Callback invoked after each completed document. Must not block the
/// workers for long.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Drives one batch run: a pool of worker tasks pulls documents from a
/// shared atomic cursor, converts them, and merges results into a single
/// [`BatchResult`] under a mutex.
///
/// A dispatcher is single-use: [`run`](Self::run) consumes it, so every
/// run owns a fresh cancellation token and concurrent runs cannot
/// interfere with each other.
pub struct BatchDispatcher {
    engine: Arc<dyn RenderEngine>,
    options: Arc<ConversionOptions>,
    worker_count: usize,
    cancel: CancellationToken,
}

impl BatchDispatcher {
    /// Create a dispatcher. A `worker_count` of 0 selects the detected
    /// hardware parallelism.
    pub fn new(
        engine: Arc<dyn RenderEngine>,
        options: ConversionOptions,
        worker_count: usize,
    ) -> Self {
        let worker_count = if worker_count == 0 {
            num_cpus::get()
        } else {
            worker_count
        };
        Self {
            engine,
            options: Arc::new(options),
            worker_count,
            cancel: CancellationToken::new(),
        }
    }

    /// Number of workers the run will spawn.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Handle for requesting cancellation of this run from another task.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Convert every document, blocking until all spawned workers have
    /// exited. The returned result is never observed mid-update.
    pub async fn run(
        self,
        documents: Vec<DocumentJob>,
        output_dir: &Path,
        progress: Option<ProgressSink>,
    ) -> BatchResult {
        let total = documents.len();
        let mut result = BatchResult::new(total);

        if documents.is_empty() {
            warn!("No PDF files found in input directory");
            result.errors.push("no input files found".to_string());
            return result;
        }

        if !ensure_directory(output_dir) {
            result
                .errors
                .push(format!("failed to create output directory {}", output_dir.display()));
            return result;
        }

        info!("Processing {} PDF files using {} workers", total, self.worker_count);

        let converter = Arc::new(DocumentConverter::new(
            Arc::clone(&self.engine),
            Arc::clone(&self.options),
            output_dir,
            self.cancel.clone(),
        ));
        let documents = Arc::new(documents);
        let shared = Arc::new(Mutex::new(result));
        let cursor = Arc::new(AtomicUsize::new(0));

        let mut workers = Vec::with_capacity(self.worker_count);
        for _ in 0..self.worker_count {
            // No worker starts once cancellation has been requested.
            if self.cancel.is_cancelled() {
                break;
            }
            workers.push(tokio::spawn(worker_loop(
                Arc::clone(&documents),
                Arc::clone(&cursor),
                Arc::clone(&converter),
                Arc::clone(&shared),
                progress.clone(),
                self.cancel.clone(),
            )));
        }

        // Join-before-return: the result is complete once we get here.
        for worker in workers {
            if let Err(e) = worker.await {
                warn!("Worker task failed: {}", e);
            }
        }

        let result = match Arc::try_unwrap(shared) {
            Ok(mutex) => mutex.into_inner().unwrap(),
            Err(shared) => shared.lock().unwrap().clone(),
        };

        info!(
            "Batch complete: {}/{} documents, {} pages",
            result.successful_conversions, result.total_pdfs, result.total_pages_converted
        );

        result
    }
}

/// One worker: claim the next document index, convert it, merge the
/// result, report progress. Exits when the cursor passes the end or
/// cancellation is observed. The cancellation check sits between
/// documents, not between pages.
async fn worker_loop(
    documents: Arc<Vec<DocumentJob>>,
    cursor: Arc<AtomicUsize>,
    converter: Arc<DocumentConverter>,
    shared: Arc<Mutex<BatchResult>>,
    progress: Option<ProgressSink>,
    cancel: CancellationToken,
) {
    let total = documents.len();

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let index = cursor.fetch_add(1, Ordering::SeqCst);
        if index >= total {
            break;
        }

        let job = &documents[index];
        let document_result = converter.convert(job).await;

        // One critical section per merge; the progress read piggybacks on
        // it so the event carries a consistent best-effort page count.
        let pages_so_far = {
            let mut batch = shared.lock().unwrap();
            batch.merge(&job.display_name(), &document_result);
            batch.total_pages_converted
        };

        if let Some(sink) = &progress {
            sink(ProgressEvent {
                current_document: index + 1,
                total_documents: total,
                document_name: job.display_name(),
                pages_processed: pages_so_far,
            });
        }
    }
}
