//! Production render engine backed by pdfium (Google's PDF engine).
//!
//! Pdfium document handles are not safe for concurrent use, so each open
//! document gets a dedicated render thread that owns the pdfium state and
//! serves page requests over channels. The handle returned to the
//! scheduler is `Send + Sync`; page tasks may call it concurrently and
//! their requests are serialized by the worker, which is exactly the
//! "document handle access is serialized" constraint the library imposes.

use crate::engine::{PageRenderSource, RasterPage, RenderEngine};
use crate::error::{ConvertError, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use image::RgbaImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::debug;

/// Render engine that opens documents through pdfium.
#[derive(Debug, Default)]
pub struct PdfiumEngine;

impl PdfiumEngine {
    pub fn new() -> Self {
        Self
    }
}

impl RenderEngine for PdfiumEngine {
    fn open(&self, path: &Path) -> Result<Arc<dyn PageRenderSource>> {
        Ok(Arc::new(PdfiumSource::open(path)?))
    }
}

enum PageRequest {
    Size {
        index: usize,
        reply: Sender<Result<(f32, f32)>>,
    },
    Render {
        index: usize,
        scale_x: f32,
        scale_y: f32,
        reply: Sender<Result<RasterPage>>,
    },
}

/// An open pdfium document, accessed through its render thread.
pub struct PdfiumSource {
    page_count: usize,
    requests: Option<Sender<PageRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl PdfiumSource {
    fn open(path: &Path) -> Result<Self> {
        let (ready_tx, ready_rx) = bounded(1);
        let (request_tx, request_rx) = unbounded();

        let worker_path = path.to_path_buf();
        let worker = std::thread::Builder::new()
            .name("pdfium-render".to_string())
            .spawn(move || document_worker(worker_path, ready_tx, request_rx))
            .map_err(|e| ConvertError::OpenFailed {
                path: path.to_path_buf(),
                message: format!("failed to spawn render thread: {}", e),
            })?;

        match ready_rx.recv() {
            Ok(Ok(page_count)) => {
                debug!("Opened {:?} ({} pages)", path, page_count);
                Ok(Self {
                    page_count,
                    requests: Some(request_tx),
                    worker: Some(worker),
                })
            }
            Ok(Err(e)) => {
                drop(request_tx);
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                drop(request_tx);
                let _ = worker.join();
                Err(ConvertError::EngineDisconnected)
            }
        }
    }

    fn sender(&self) -> Result<&Sender<PageRequest>> {
        self.requests.as_ref().ok_or(ConvertError::EngineDisconnected)
    }
}

impl PageRenderSource for PdfiumSource {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_size(&self, index: usize) -> Result<(f32, f32)> {
        let (reply_tx, reply_rx) = bounded(1);
        self.sender()?
            .send(PageRequest::Size {
                index,
                reply: reply_tx,
            })
            .map_err(|_| ConvertError::EngineDisconnected)?;
        reply_rx.recv().map_err(|_| ConvertError::EngineDisconnected)?
    }

    fn render_page(&self, index: usize, scale_x: f32, scale_y: f32) -> Result<RasterPage> {
        let (reply_tx, reply_rx) = bounded(1);
        self.sender()?
            .send(PageRequest::Render {
                index,
                scale_x,
                scale_y,
                reply: reply_tx,
            })
            .map_err(|_| ConvertError::EngineDisconnected)?;
        reply_rx.recv().map_err(|_| ConvertError::EngineDisconnected)?
    }
}

impl Drop for PdfiumSource {
    fn drop(&mut self) {
        // Closing the request channel ends the worker's receive loop.
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Render thread body: binds pdfium, loads the document, then serves
/// requests until every sender is gone.
fn document_worker(path: PathBuf, ready: Sender<Result<usize>>, requests: Receiver<PageRequest>) {
    let pdfium = match bind_pdfium() {
        Ok(pdfium) => pdfium,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let document = match pdfium.load_pdf_from_file(&path, None) {
        Ok(document) => document,
        Err(e) => {
            let _ = ready.send(Err(ConvertError::OpenFailed {
                path,
                message: e.to_string(),
            }));
            return;
        }
    };

    let page_count = document.pages().len() as usize;
    if ready.send(Ok(page_count)).is_err() {
        return;
    }

    for request in requests {
        match request {
            PageRequest::Size { index, reply } => {
                let _ = reply.send(page_size(&document, index));
            }
            PageRequest::Render {
                index,
                scale_x,
                scale_y,
                reply,
            } => {
                let _ = reply.send(render_page(&document, index, scale_x, scale_y));
            }
        }
    }
}

/// Bind to the pdfium library.
/// Try the working directory and common system paths first, then fall
/// back to the system loader.
fn bind_pdfium() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/lib"))
        })
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/local/lib"))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| ConvertError::EngineUnavailable(e.to_string()))?;
    Ok(Pdfium::new(bindings))
}

fn page_size(document: &PdfDocument, index: usize) -> Result<(f32, f32)> {
    let page = document
        .pages()
        .get(index as u16)
        .map_err(|e| ConvertError::RenderFailed {
            page: index + 1,
            message: e.to_string(),
        })?;
    Ok((page.width().value, page.height().value))
}

fn render_page(
    document: &PdfDocument,
    index: usize,
    scale_x: f32,
    scale_y: f32,
) -> Result<RasterPage> {
    let page = document
        .pages()
        .get(index as u16)
        .map_err(|e| ConvertError::RenderFailed {
            page: index + 1,
            message: e.to_string(),
        })?;

    let width = (page.width().value * scale_x).round().max(1.0) as i32;
    let height = (page.height().value * scale_y).round().max(1.0) as i32;

    let render_config = PdfRenderConfig::new()
        .set_target_width(width)
        .set_target_height(height)
        .rotate_if_landscape(PdfPageRenderRotation::None, false);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| ConvertError::RenderFailed {
            page: index + 1,
            message: e.to_string(),
        })?;

    let rgba = bitmap.as_image().into_rgba8();
    Ok(RasterPage::new(flatten_background(rgba)))
}

/// Composite partially transparent pixels onto a white background so
/// both output formats get opaque pages.
fn flatten_background(mut image: RgbaImage) -> RgbaImage {
    for pixel in image.pixels_mut() {
        let alpha = pixel[3] as f32 / 255.0;
        if alpha < 1.0 {
            let inv_alpha = 1.0 - alpha;
            pixel[0] = ((pixel[0] as f32 * alpha) + (255.0 * inv_alpha)) as u8;
            pixel[1] = ((pixel[1] as f32 * alpha) + (255.0 * inv_alpha)) as u8;
            pixel[2] = ((pixel[2] as f32 * alpha) + (255.0 * inv_alpha)) as u8;
            pixel[3] = 255;
        }
    }
    image
}
