//! Export artifacts: PNG bytes/files and the paginated PDF. Pagination
//! embeds the same flattened bitmap on every page at a different vertical
//! offset — tall documents span pages by visual crop, not re-layout.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use image::RgbaImage;
use printpdf::{ImageTransform, Mm, PdfDocument};
use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::Path;

pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;
pub const PAGE_MARGIN_MM: f32 = 12.0;
const PDF_DPI: f32 = 150.0;
const MM_PER_INCH: f32 = 25.4;

/// Filesystem-safe ISO-style stamp used in download names.
pub fn file_stamp(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%dT%H-%M-%S").to_string()
}

pub fn report_pdf_filename(patient_id: i64, now: DateTime<Local>) -> String {
    format!("medical-report-{}-{}.pdf", patient_id, file_stamp(now))
}

pub fn report_png_filename(patient_id: i64, now: DateTime<Local>) -> String {
    format!("medical-report-{}-{}.png", patient_id, file_stamp(now))
}

/// Name for the raw annotated-canvas export (no overlay text flattening).
pub fn annotated_png_filename(now: DateTime<Local>) -> String {
    format!("annotated_image_{}.png", file_stamp(now))
}

pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
        .context("encode export png")?;
    Ok(png)
}

pub fn write_png(img: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create export folder {}", parent.display()))?;
    }
    img.save(path)
        .with_context(|| format!("write png {}", path.display()))?;
    Ok(())
}

/// Pure pagination math: the image is fitted to the page content width; the
/// page count covers the scaled height in content-height slices; each page
/// places the full image shifted up by `i * content_height`.
///
/// All millimetre math is `f32` to match printpdf's `Mm`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfLayout {
    /// Rendered image size in millimetres after fitting to content width.
    pub image_mm: (f32, f32),
    pub content_height_mm: f32,
    pub page_count: usize,
    /// printpdf scale factor relative to the image's native dpi size.
    pub scale: f32,
}

impl PdfLayout {
    pub fn compute(image_px: (u32, u32)) -> Self {
        let content_width = A4_WIDTH_MM - 2.0 * PAGE_MARGIN_MM;
        let content_height = A4_HEIGHT_MM - 2.0 * PAGE_MARGIN_MM;

        let native_w_mm = image_px.0.max(1) as f32 / PDF_DPI * MM_PER_INCH;
        let native_h_mm = image_px.1.max(1) as f32 / PDF_DPI * MM_PER_INCH;
        let scale = content_width / native_w_mm;
        let image_mm = (content_width, native_h_mm * scale);

        let page_count = (image_mm.1 / content_height).ceil().max(1.0) as usize;
        Self {
            image_mm,
            content_height_mm: content_height,
            page_count,
            scale,
        }
    }

    /// Bottom-left translation of the bitmap on page `index` (0-based), in
    /// PDF coordinates (origin bottom-left).
    pub fn translate_for_page(&self, index: usize) -> (f32, f32) {
        let top = A4_HEIGHT_MM - PAGE_MARGIN_MM + index as f32 * self.content_height_mm;
        (PAGE_MARGIN_MM, top - self.image_mm.1)
    }
}

/// Render the flattened composite into a paginated A4 PDF.
pub fn write_pdf(img: &RgbaImage, title: &str, path: &Path) -> Result<()> {
    let layout = PdfLayout::compute(img.dimensions());
    let dynamic = image::DynamicImage::ImageRgba8(img.clone());

    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(A4_WIDTH_MM), Mm(A4_HEIGHT_MM), "page 1");

    for index in 0..layout.page_count {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(
                Mm(A4_WIDTH_MM),
                Mm(A4_HEIGHT_MM),
                format!("page {}", index + 1),
            );
            doc.get_page(page).get_layer(layer)
        };

        let (tx, ty) = layout.translate_for_page(index);
        let embedded = printpdf::Image::from_dynamic_image(&dynamic);
        embedded.add_to_layer(
            layer,
            ImageTransform {
                translate_x: Some(Mm(tx)),
                translate_y: Some(Mm(ty)),
                scale_x: Some(layout.scale),
                scale_y: Some(layout.scale),
                dpi: Some(PDF_DPI),
                ..Default::default()
            },
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create export folder {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create pdf {}", path.display()))?;
    doc.save(&mut BufWriter::new(file))
        .context("write pdf document")?;
    Ok(())
}
