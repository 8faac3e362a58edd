//! Renderer capability interface.
//!
//! The scheduler consumes page rendering through these traits instead of
//! talking to pdfium directly. [`crate::pdfium::PdfiumEngine`] is the
//! production implementation; tests substitute in-memory fakes.

use crate::config::ImageFormat;
use crate::error::{ConvertError, Result};
use image::RgbaImage;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

/// Opens documents for rendering.
pub trait RenderEngine: Send + Sync {
    /// Open a document. Open failures (corrupt file, locked file,
    /// unreadable path) are normal outcomes reported as
    /// [`ConvertError::OpenFailed`].
    fn open(&self, path: &Path) -> Result<Arc<dyn PageRenderSource>>;
}

/// An open document that can rasterize its pages.
///
/// Implementations serialize access to the underlying document handle
/// internally; callers may invoke these methods from multiple page tasks
/// concurrently.
pub trait PageRenderSource: Send + Sync {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Page dimensions in PDF points (1/72 inch), by zero-based index.
    fn page_size(&self, index: usize) -> Result<(f32, f32)>;

    /// Rasterize a page at the given per-axis scale factors.
    fn render_page(&self, index: usize, scale_x: f32, scale_y: f32) -> Result<RasterPage>;
}

/// A rendered page raster, ready to encode and save.
#[derive(Debug, Clone)]
pub struct RasterPage {
    image: RgbaImage,
}

impl RasterPage {
    /// Wrap a rendered RGBA buffer.
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Encode and write the raster to `path` in the given format.
    pub fn save(&self, path: &Path, format: ImageFormat) -> Result<()> {
        match format {
            ImageFormat::Png => self.save_png(path),
            ImageFormat::Jpeg => self.save_jpeg(path),
        }
    }

    fn save_png(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| ConvertError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let writer = BufWriter::new(file);

        let mut encoder = png::Encoder::new(writer, self.image.width(), self.image.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast); // Use fast compression for throughput

        let mut writer = encoder
            .write_header()
            .map_err(|e| ConvertError::EncodingFailed(format!("PNG header: {}", e)))?;
        writer
            .write_image_data(self.image.as_raw())
            .map_err(|e| ConvertError::EncodingFailed(format!("PNG data: {}", e)))?;

        Ok(())
    }

    fn save_jpeg(&self, path: &Path) -> Result<()> {
        use image::buffer::ConvertBuffer;

        // JPEG has no alpha channel; the engine flattens transparency
        // before constructing the raster, so dropping alpha is lossless.
        let rgb: image::RgbImage = self.image.convert();
        rgb.save_with_format(path, image::ImageFormat::Jpeg)
            .map_err(|e| ConvertError::SaveFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid_raster(width: u32, height: u32, pixel: [u8; 4]) -> RasterPage {
        let mut image = RgbaImage::new(width, height);
        for p in image.pixels_mut() {
            *p = Rgba(pixel);
        }
        RasterPage::new(image)
    }

    #[test]
    fn test_raster_dimensions() {
        let raster = solid_raster(12, 7, [255, 0, 0, 255]);
        assert_eq!(raster.width(), 12);
        assert_eq!(raster.height(), 7);
    }

    #[test]
    fn test_save_png_writes_valid_signature() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");

        let raster = solid_raster(10, 10, [0, 255, 0, 255]);
        raster.save(&path, ImageFormat::Png).unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(&data[0..8], &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn test_save_jpeg_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.jpg");

        let raster = solid_raster(10, 10, [0, 0, 255, 255]);
        raster.save(&path, ImageFormat::Jpeg).unwrap();

        let data = std::fs::read(&path).unwrap();
        // JPEG SOI marker
        assert_eq!(&data[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does/not/exist/page.png");

        let raster = solid_raster(4, 4, [0, 0, 0, 255]);
        let result = raster.save(&path, ImageFormat::Png);
        assert!(matches!(result, Err(ConvertError::SaveFailed { .. })));
    }
}
