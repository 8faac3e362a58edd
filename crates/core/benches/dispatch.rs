//! Benchmarks for batch dispatch overhead.
//!
//! Run with: cargo bench --package pdf-to-png-core
//!
//! A stub engine renders tiny rasters instantly, so the measurement is
//! dominated by scheduling, aggregation, and output writes rather than
//! rasterization.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::RgbaImage;
use pdf_to_png_core::{
    BatchDispatcher, ConversionOptions, DocumentJob, PageRenderSource, RasterPage, RenderEngine,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

struct StubEngine {
    pages: usize,
}

struct StubSource {
    pages: usize,
}

impl RenderEngine for StubEngine {
    fn open(&self, _path: &Path) -> pdf_to_png_core::Result<Arc<dyn PageRenderSource>> {
        Ok(Arc::new(StubSource { pages: self.pages }))
    }
}

impl PageRenderSource for StubSource {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn page_size(&self, _index: usize) -> pdf_to_png_core::Result<(f32, f32)> {
        Ok((612.0, 792.0))
    }

    fn render_page(&self, _index: usize, _sx: f32, _sy: f32) -> pdf_to_png_core::Result<RasterPage> {
        Ok(RasterPage::new(RgbaImage::new(2, 2)))
    }
}

fn benchmark_dispatch(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("dispatch");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(5));

    for workers in [1usize, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("32_docs_4_pages", workers),
            &workers,
            |b, &workers| {
                b.iter(|| {
                    runtime.block_on(async {
                        let output = tempfile::tempdir().unwrap();
                        let documents: Vec<DocumentJob> = (0..32)
                            .map(|i| DocumentJob::new(format!("/in/doc{:02}.pdf", i), i))
                            .collect();

                        let dispatcher = BatchDispatcher::new(
                            Arc::new(StubEngine { pages: 4 }),
                            ConversionOptions::default(),
                            workers,
                        );
                        black_box(dispatcher.run(documents, output.path(), None).await)
                    })
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_dispatch);
criterion_main!(benches);
