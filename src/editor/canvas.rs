use crate::editor::model::{CanvasSnapshot, Color, StrokeStyle};
use anyhow::Result;
use image::{Rgba, RgbaImage};

pub const DEFAULT_CANVAS_WIDTH: u32 = 900;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1200;

/// Pointer samples closer than this (squared px) to the previous sample are
/// dropped instead of appended to the active stroke.
const MIN_POINT_DIST_SQ: f32 = 4.0;

/// Freehand drawing surface. Owns the live pixel buffer; history snapshots
/// are always taken through [`DrawingSurface::serialize`], never by aliasing
/// the buffer.
#[derive(Debug, Clone)]
pub struct DrawingSurface {
    image: RgbaImage,
    zoom: f32,
    pan: (f32, f32),
    active_stroke: Option<ActiveStroke>,
}

#[derive(Debug, Clone)]
struct ActiveStroke {
    style: StrokeStyle,
    last_point: (f32, f32),
    drew_segment: bool,
}

impl Default for DrawingSurface {
    fn default() -> Self {
        Self::blank(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}

impl DrawingSurface {
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width.max(1), height.max(1), Rgba([255, 255, 255, 255])),
            zoom: 1.0,
            pan: (0.0, 0.0),
            active_stroke: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(0.1, 4.0);
    }

    pub fn pan(&self) -> (f32, f32) {
        self.pan
    }

    pub fn set_pan(&mut self, pan: (f32, f32)) {
        self.pan = pan;
    }

    /// Translate a client-space position into canvas space: subtract the
    /// canvas's on-screen origin and divide by the zoom factor.
    pub fn to_canvas_point(&self, client: (f32, f32), origin: (f32, f32)) -> (f32, f32) {
        (
            (client.0 - origin.0) / self.zoom,
            (client.1 - origin.1) / self.zoom,
        )
    }

    /// Replace the buffer with a background image, resizing the surface to
    /// the image's dimensions. `width_scale` stretches legacy photo imports
    /// (e.g. 1.2 for the old scanned-form aspect correction).
    pub fn load_background(&mut self, background: &RgbaImage, width_scale: f32) {
        let scale = if width_scale > 0.0 { width_scale } else { 1.0 };
        let width = ((background.width() as f32) * scale).round().max(1.0) as u32;
        let height = background.height().max(1);
        self.image = if (width, height) == background.dimensions() {
            background.clone()
        } else {
            image::imageops::resize(
                background,
                width,
                height,
                image::imageops::FilterType::Triangle,
            )
        };
        self.active_stroke = None;
    }

    /// Reset to blank white or to a background image.
    pub fn clear(&mut self, background: Option<&RgbaImage>) {
        match background {
            Some(bg) => self.load_background(bg, 1.0),
            None => {
                let (w, h) = self.image.dimensions();
                self.image = RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]));
                self.active_stroke = None;
            }
        }
    }

    pub fn begin_stroke(&mut self, point: (f32, f32), style: StrokeStyle) {
        draw_disc(&mut self.image, point, style.width / 2.0, style.color);
        self.active_stroke = Some(ActiveStroke {
            style,
            last_point: point,
            drew_segment: false,
        });
    }

    /// Append a segment to the active stroke; no-op when no stroke is active.
    pub fn extend_stroke(&mut self, point: (f32, f32)) {
        let Some(stroke) = self.active_stroke.as_mut() else {
            return;
        };
        let dx = point.0 - stroke.last_point.0;
        let dy = point.1 - stroke.last_point.1;
        if dx * dx + dy * dy < MIN_POINT_DIST_SQ {
            return;
        }
        let (start, style) = (stroke.last_point, stroke.style);
        stroke.last_point = point;
        stroke.drew_segment = true;
        draw_segment(&mut self.image, start, point, style.color, style.width);
    }

    /// Finalize the active stroke. Returns true when the stroke touched the
    /// buffer, i.e. the caller should capture a history entry.
    pub fn end_stroke(&mut self) -> bool {
        self.active_stroke.take().is_some()
    }

    pub fn stroke_active(&self) -> bool {
        self.active_stroke.is_some()
    }

    /// Capture the current raster as an encoded snapshot. Side-effect free.
    pub fn serialize(&self) -> Result<CanvasSnapshot> {
        CanvasSnapshot::from_image(&self.image)
    }

    /// Redraw the buffer from a stored snapshot (undo/redo restore path).
    pub fn restore(&mut self, snapshot: &CanvasSnapshot) -> Result<()> {
        self.image = snapshot.decode()?;
        self.active_stroke = None;
        Ok(())
    }
}

pub(crate) fn blend_pixel(img: &mut RgbaImage, x: u32, y: u32, color: Color) {
    if color.a == 0 {
        return;
    }
    let dst = img.get_pixel(x, y).0;
    let src_a = color.a as f32 / 255.0;
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return;
    }
    let blend = |src: u8, dst: u8| {
        let src_f = src as f32 / 255.0;
        let dst_f = dst as f32 / 255.0;
        ((src_f * src_a + dst_f * dst_a * (1.0 - src_a)) / out_a * 255.0)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    img.put_pixel(
        x,
        y,
        Rgba([
            blend(color.r, dst[0]),
            blend(color.g, dst[1]),
            blend(color.b, dst[2]),
            (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
        ]),
    );
}

pub(crate) fn draw_disc(img: &mut RgbaImage, center: (f32, f32), radius: f32, color: Color) {
    let radius = radius.max(0.5);
    let radius_sq = radius * radius;
    let width = img.width() as i32;
    let height = img.height() as i32;
    let min_x = (center.0 - radius).floor().max(0.0) as i32;
    let max_x = ((center.0 + radius).ceil() as i32).min(width - 1);
    let min_y = (center.1 - radius).floor().max(0.0) as i32;
    let max_y = ((center.1 + radius).ceil() as i32).min(height - 1);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f32 + 0.5 - center.0;
            let dy = y as f32 + 0.5 - center.1;
            if dx * dx + dy * dy <= radius_sq {
                blend_pixel(img, x as u32, y as u32, color);
            }
        }
    }
}

/// Stamped-circle segment: steps along the line and stamps a disc of half
/// the stroke width at each step.
pub(crate) fn draw_segment(
    img: &mut RgbaImage,
    start: (f32, f32),
    end: (f32, f32),
    color: Color,
    thickness: f32,
) {
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i32;
    let radius = (thickness / 2.0).max(0.5);
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let point = (start.0 + dx * t, start.1 + dy * t);
        draw_disc(img, point, radius, color);
    }
}

pub(crate) fn fill_rect(
    img: &mut RgbaImage,
    min: (f32, f32),
    max: (f32, f32),
    color: Color,
) {
    let width = img.width() as i32;
    let height = img.height() as i32;
    let min_x = min.0.floor().max(0.0) as i32;
    let max_x = (max.0.ceil() as i32).min(width - 1);
    let min_y = min.1.floor().max(0.0) as i32;
    let max_y = (max.1.ceil() as i32).min(height - 1);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            blend_pixel(img, x as u32, y as u32, color);
        }
    }
}

pub(crate) fn draw_rect_outline(
    img: &mut RgbaImage,
    min: (f32, f32),
    max: (f32, f32),
    color: Color,
    thickness: f32,
) {
    draw_segment(img, (min.0, min.1), (max.0, min.1), color, thickness);
    draw_segment(img, (max.0, min.1), (max.0, max.1), color, thickness);
    draw_segment(img, (max.0, max.1), (min.0, max.1), color, thickness);
    draw_segment(img, (min.0, max.1), (min.0, min.1), color, thickness);
}
