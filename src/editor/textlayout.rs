//! Raster text: measurement, greedy word-wrap and glyph drawing over an
//! `RgbaImage`, using embedded DejaVu Sans faces.

use crate::editor::canvas::blend_pixel;
use crate::editor::model::Color;
use ab_glyph::{Font, FontArc, ScaleFont};
use image::RgbaImage;
use std::sync::OnceLock;

static REGULAR: OnceLock<FontArc> = OnceLock::new();
static BOLD: OnceLock<FontArc> = OnceLock::new();

pub fn regular() -> &'static FontArc {
    REGULAR.get_or_init(|| {
        FontArc::try_from_slice(include_bytes!("fonts/DejaVuSans.ttf"))
            .expect("embedded DejaVu Sans must parse")
    })
}

pub fn bold() -> &'static FontArc {
    BOLD.get_or_init(|| {
        FontArc::try_from_slice(include_bytes!("fonts/DejaVuSans-Bold.ttf"))
            .expect("embedded DejaVu Sans Bold must parse")
    })
}

/// Rendered width of a single line at the given pixel size.
pub fn line_width(font: &FontArc, size: f32, text: &str) -> f32 {
    let scaled = font.as_scaled(size);
    text.chars()
        .map(|ch| scaled.h_advance(scaled.scaled_glyph(ch).id))
        .sum()
}

pub fn line_height(font: &FontArc, size: f32) -> f32 {
    let scaled = font.as_scaled(size);
    scaled.ascent() - scaled.descent() + scaled.line_gap()
}

/// Greedy line breaking: accumulate words, measuring the candidate line
/// before each append; flush when the next word would overflow the content
/// width. No look-ahead. A single word wider than the content width gets a
/// line of its own rather than being split.
pub fn wrap_text(font: &FontArc, size: f32, max_width: f32, text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };
            if !line.is_empty() && line_width(font, size, &candidate) > max_width {
                lines.push(std::mem::take(&mut line));
                line = word.to_string();
            } else {
                line = candidate;
            }
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines
}

/// Draw a single line with its baseline derived from `pos` as the top-left
/// corner of the text box.
pub fn draw_text(
    img: &mut RgbaImage,
    font: &FontArc,
    size: f32,
    pos: (f32, f32),
    text: &str,
    color: Color,
) {
    if text.is_empty() {
        return;
    }
    let scaled = font.as_scaled(size);
    let mut caret = ab_glyph::point(pos.0, pos.1 + scaled.ascent());
    // A negative left-side bearing on the first glyph would paint pixels
    // left of the anchor; shift the caret so the outline starts at `pos`.
    if let Some(first) = text.chars().next() {
        let mut glyph = scaled.scaled_glyph(first);
        glyph.position = caret;
        if let Some(outlined) = scaled.outline_glyph(glyph) {
            let overshoot = pos.0 - outlined.px_bounds().min.x;
            if overshoot > 0.0 {
                caret.x += overshoot;
            }
        }
    }
    for ch in text.chars() {
        let mut glyph = scaled.scaled_glyph(ch);
        glyph.position = caret;
        caret.x += scaled.h_advance(glyph.id);
        if let Some(outlined) = scaled.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|x, y, coverage| {
                let px = x as i32 + bounds.min.x as i32;
                let py = y as i32 + bounds.min.y as i32;
                if px >= 0 && py >= 0 && px < img.width() as i32 && py < img.height() as i32 {
                    let alpha = (color.a as f32 * coverage).round().clamp(0.0, 255.0) as u8;
                    blend_pixel(
                        img,
                        px as u32,
                        py as u32,
                        Color::rgba(color.r, color.g, color.b, alpha),
                    );
                }
            });
        }
    }
}

/// Word-wrap `text` to `max_width` and draw the lines downward from `pos`.
/// Drawing stops at `max_height` when given. Returns the vertical extent
/// actually used.
pub fn draw_text_wrapped(
    img: &mut RgbaImage,
    font: &FontArc,
    size: f32,
    pos: (f32, f32),
    max_width: f32,
    max_height: Option<f32>,
    text: &str,
    color: Color,
) -> f32 {
    let step = line_height(font, size);
    let mut y = 0.0;
    for line in wrap_text(font, size, max_width, text) {
        if let Some(limit) = max_height {
            if y + step > limit {
                break;
            }
        }
        draw_text(img, font, size, (pos.0, pos.1 + y), &line, color);
        y += step;
    }
    y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_fonts_parse() {
        let _ = regular();
        let _ = bold();
    }

    #[test]
    fn measurement_grows_with_text() {
        let font = regular();
        let short = line_width(font, 16.0, "ab");
        let long = line_width(font, 16.0, "abcdefgh");
        assert!(long > short);
        assert!(short > 0.0);
    }

    #[test]
    fn wrapped_lines_fit_the_content_width() {
        let font = regular();
        let text = "patient presented with high grade fever and productive cough for three days";
        let max_width = 120.0;
        let lines = wrap_text(font, 14.0, max_width, text);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(
                line_width(font, 14.0, line) <= max_width || !line.contains(' '),
                "line overflows: {line:?}"
            );
        }
        // No word is lost or split.
        let rejoined = lines.join(" ");
        assert_eq!(
            rejoined.split_whitespace().collect::<Vec<_>>(),
            text.split_whitespace().collect::<Vec<_>>()
        );
    }

    #[test]
    fn single_fitting_word_stays_on_one_line() {
        let font = regular();
        let lines = wrap_text(font, 14.0, 500.0, "fever");
        assert_eq!(lines, vec!["fever".to_string()]);
    }

    #[test]
    fn newlines_force_breaks() {
        let font = regular();
        let lines = wrap_text(font, 14.0, 1000.0, "one\ntwo");
        assert_eq!(lines, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn drawing_marks_pixels() {
        let mut img = RgbaImage::from_pixel(120, 40, image::Rgba([255, 255, 255, 255]));
        draw_text(&mut img, regular(), 20.0, (4.0, 4.0), "Rx", Color::BLACK);
        let touched = img.pixels().any(|p| p.0 != [255, 255, 255, 255]);
        assert!(touched);
    }

    #[test]
    fn no_pixel_lands_left_of_the_anchor() {
        let mut img = RgbaImage::from_pixel(200, 40, image::Rgba([255, 255, 255, 255]));
        let anchor_x = 30.0;
        draw_text(
            &mut img,
            regular(),
            16.0,
            (anchor_x, 4.0),
            "Jordan Doe",
            Color::BLACK,
        );
        for (x, _, p) in img.enumerate_pixels() {
            if (x as f32) < anchor_x {
                assert_eq!(p.0, [255, 255, 255, 255], "bleed at column {x}");
            }
        }
    }

    #[test]
    fn wrapped_drawing_respects_height_limit() {
        let mut img = RgbaImage::from_pixel(100, 100, image::Rgba([255, 255, 255, 255]));
        let used = draw_text_wrapped(
            &mut img,
            regular(),
            14.0,
            (0.0, 0.0),
            60.0,
            Some(20.0),
            "a very long body of narrative text that wraps many times over",
            Color::BLACK,
        );
        assert!(used <= 20.0);
    }
}
