//! Flattening: draw the canvas raster onto an output buffer and overlay each
//! field's current value inside its box, scaled from percentage coordinates
//! to buffer pixels.

use crate::editor::fields::FieldValues;
use crate::editor::model::Color;
use crate::editor::overlay::{OverlayBox, OverlayLayout};
use crate::editor::textlayout::{draw_text_wrapped, regular};
use image::RgbaImage;

/// Fixed inner padding applied to each box's top-left anchor, in output
/// pixels.
pub const TEXT_PADDING_PX: f32 = 4.0;

/// Font size of composited overlay text relative to the output height.
const TEXT_SIZE_RATIO: f32 = 0.016;
const MIN_TEXT_SIZE: f32 = 10.0;

/// Percent → pixel top-left anchor for a box, before padding.
pub fn anchor_for(overlay_box: OverlayBox, width: u32, height: u32) -> (f32, f32) {
    (
        overlay_box.left / 100.0 * width as f32,
        overlay_box.top / 100.0 * height as f32,
    )
}

/// Percent → pixel size of a box.
pub fn extent_for(overlay_box: OverlayBox, width: u32, height: u32) -> (f32, f32) {
    (
        overlay_box.width / 100.0 * width as f32,
        overlay_box.height / 100.0 * height as f32,
    )
}

/// Flatten the canvas plus overlay text. Used by both the save path and the
/// print preview: overlay values are word-wrapped within their box bounds on
/// both paths, so the saved artifact always matches what the preview showed.
///
/// When `generative` is set the canvas already contains all content, so the
/// raster is returned without overlay text.
pub fn composite(
    canvas: &RgbaImage,
    layout: &OverlayLayout,
    fields: &FieldValues,
    generative: bool,
) -> RgbaImage {
    let mut output = canvas.clone();
    if generative {
        return output;
    }

    let (width, height) = output.dimensions();
    let size = (height as f32 * TEXT_SIZE_RATIO).max(MIN_TEXT_SIZE);

    for (field, overlay_box) in layout.boxes() {
        let value = fields.get(field);
        if value.trim().is_empty() {
            continue;
        }
        let (x, y) = anchor_for(*overlay_box, width, height);
        let (box_w, box_h) = extent_for(*overlay_box, width, height);
        draw_text_wrapped(
            &mut output,
            regular(),
            size,
            (x + TEXT_PADDING_PX, y + TEXT_PADDING_PX),
            (box_w - 2.0 * TEXT_PADDING_PX).max(size),
            Some((box_h - TEXT_PADDING_PX).max(size)),
            value,
            Color::BLACK,
        );
    }
    output
}

pub fn composite_for_save(
    canvas: &RgbaImage,
    layout: &OverlayLayout,
    fields: &FieldValues,
    generative: bool,
) -> RgbaImage {
    composite(canvas, layout, fields, generative)
}

pub fn composite_for_print_preview(
    canvas: &RgbaImage,
    layout: &OverlayLayout,
    fields: &FieldValues,
    generative: bool,
) -> RgbaImage {
    composite(canvas, layout, fields, generative)
}
