use anyhow::{anyhow, Context, Result};
use base64::Engine as _;
use image::RgbaImage;
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Pen,
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub width: f32,
    pub color: Color,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 2.0,
            color: Color::BLACK,
        }
    }
}

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Immutable raster snapshot captured from the drawing surface.
///
/// Snapshots are PNG-encoded at capture time so history entries never alias
/// the live pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasSnapshot {
    pub width: u32,
    pub height: u32,
    png: Vec<u8>,
}

impl CanvasSnapshot {
    pub fn from_image(img: &RgbaImage) -> Result<Self> {
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
            .context("encode canvas snapshot")?;
        Ok(Self {
            width: img.width(),
            height: img.height(),
            png,
        })
    }

    pub fn decode(&self) -> Result<RgbaImage> {
        let img = image::load_from_memory_with_format(&self.png, image::ImageFormat::Png)
            .context("decode canvas snapshot")?;
        Ok(img.to_rgba8())
    }

    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    /// Encode as the `data:image/png;base64,` URI stored in print records.
    pub fn data_uri(&self) -> String {
        let mut uri = String::from(DATA_URI_PREFIX);
        uri.push_str(&base64::engine::general_purpose::STANDARD.encode(&self.png));
        uri
    }

    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let encoded = uri
            .strip_prefix(DATA_URI_PREFIX)
            .ok_or_else(|| anyhow!("unsupported image data uri"))?;
        let png = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .context("decode image data uri")?;
        let img = image::load_from_memory_with_format(&png, image::ImageFormat::Png)
            .context("decode image data uri payload")?;
        Ok(Self {
            width: img.width(),
            height: img.height(),
            png,
        })
    }
}
