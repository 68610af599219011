//! Procedural rendering of "predefined" templates: instead of decoding an
//! uploaded image, the template's content is drawn directly onto the canvas
//! raster. The result is used as a background exactly like an uploaded
//! image; overlay editing is disabled because everything is baked in.

use crate::editor::canvas::{draw_rect_outline, draw_segment, fill_rect};
use crate::editor::fields::FieldValues;
use crate::editor::model::Color;
use crate::editor::template::Template;
use crate::editor::textlayout::{self, bold, draw_text, draw_text_wrapped, line_height, regular};
use image::{Rgba, RgbaImage};

pub const GENERATED_WIDTH: u32 = 900;
pub const GENERATED_HEIGHT: u32 = 1273;

const HEADER_BAND: Color = Color::rgb(21, 101, 152);
const BORDER: Color = Color::rgb(60, 60, 60);
const INK: Color = Color::rgb(20, 20, 20);
const MARGIN: f32 = 40.0;

/// Width of the wrapped body text inside a section box.
fn content_width(canvas_width: f32) -> f32 {
    canvas_width - 2.0 * MARGIN - 24.0
}

pub fn render_generated_template(template: &Template, fields: &FieldValues) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(
        GENERATED_WIDTH,
        GENERATED_HEIGHT,
        Rgba([255, 255, 255, 255]),
    );
    let width = GENERATED_WIDTH as f32;

    let mut y = draw_header(&mut img, fields, width);
    y = draw_patient_block(&mut img, fields, width, y + 18.0);

    for (field, title) in template.sections.enabled() {
        y = draw_section(&mut img, width, y + 14.0, title, fields.get(field));
    }

    draw_footer(&mut img, fields, width);
    img
}

/// Colored band with hospital name, subtitle and address/contact lines.
/// Returns the y coordinate just below the band.
fn draw_header(img: &mut RgbaImage, fields: &FieldValues, width: f32) -> f32 {
    let band_height = 110.0;
    fill_rect(img, (0.0, 0.0), (width, band_height), HEADER_BAND);

    let name = non_empty(fields.get("hospitalName"), "Hospital");
    draw_text(img, bold(), 30.0, (MARGIN, 14.0), &name, Color::WHITE);

    let subtitle = fields.get("hospitalSubtitle");
    if !subtitle.is_empty() {
        draw_text(img, regular(), 16.0, (MARGIN, 54.0), subtitle, Color::WHITE);
    }

    let address = fields.get("hospitalAddress");
    draw_text(img, regular(), 14.0, (MARGIN, 76.0), address, Color::WHITE);
    let contact = fields.get("hospitalContact");
    if !contact.is_empty() {
        let w = textlayout::line_width(regular(), 14.0, contact);
        draw_text(
            img,
            regular(),
            14.0,
            (width - MARGIN - w, 76.0),
            contact,
            Color::WHITE,
        );
    }

    band_height
}

fn draw_patient_block(img: &mut RgbaImage, fields: &FieldValues, width: f32, top: f32) -> f32 {
    draw_text(
        img,
        bold(),
        18.0,
        (MARGIN, top),
        "PATIENT INFORMATION",
        INK,
    );
    let mut y = top + 30.0;

    let rows: [(&str, &str); 4] = [
        ("Name", "fullName"),
        ("Age / Gender", "age"),
        ("Contact", "contact"),
        ("Referred By", "referredBy"),
    ];
    for (label, field) in rows {
        let value = if field == "age" {
            let age = fields.get("age");
            let gender = fields.get("gender");
            match (age.is_empty(), gender.is_empty()) {
                (false, false) => format!("{age} / {gender}"),
                (false, true) => age.to_string(),
                (true, false) => gender.to_string(),
                (true, true) => String::new(),
            }
        } else {
            fields.get(field).to_string()
        };
        draw_text(img, bold(), 14.0, (MARGIN, y), &format!("{label}:"), INK);
        draw_text(img, regular(), 14.0, (MARGIN + 140.0, y), &value, INK);
        y += 24.0;
    }

    let address = fields.get("address");
    if !address.is_empty() {
        draw_text(img, bold(), 14.0, (MARGIN, y), "Address:", INK);
        let used = draw_text_wrapped(
            img,
            regular(),
            14.0,
            (MARGIN + 140.0, y),
            width - MARGIN * 2.0 - 140.0,
            None,
            address,
            INK,
        );
        y += used.max(24.0);
    }
    y
}

/// Bordered section box: bold title, then greedy word-wrapped body text at
/// the fixed content width. Box height follows the wrapped text.
fn draw_section(img: &mut RgbaImage, width: f32, top: f32, title: &str, body: &str) -> f32 {
    let font = regular();
    let body_size = 14.0;
    let text_width = content_width(width);
    let lines = textlayout::wrap_text(font, body_size, text_width, body).len().max(1);
    let body_height = lines as f32 * line_height(font, body_size);
    let box_height = body_height + 42.0;

    draw_rect_outline(
        img,
        (MARGIN, top),
        (width - MARGIN, top + box_height),
        BORDER,
        1.5,
    );
    draw_text(img, bold(), 15.0, (MARGIN + 12.0, top + 8.0), title, INK);
    draw_text_wrapped(
        img,
        font,
        body_size,
        (MARGIN + 12.0, top + 32.0),
        text_width,
        Some(body_height + 2.0),
        body,
        INK,
    );

    top + box_height
}

fn draw_footer(img: &mut RgbaImage, fields: &FieldValues, width: f32) {
    let height = GENERATED_HEIGHT as f32;
    let line_y = height - 90.0;
    draw_segment(
        img,
        (width - MARGIN - 240.0, line_y),
        (width - MARGIN, line_y),
        BORDER,
        1.5,
    );

    let doctor = non_empty(fields.get("doctorName"), "Attending Doctor");
    draw_text(
        img,
        bold(),
        14.0,
        (width - MARGIN - 240.0, line_y + 8.0),
        &doctor,
        INK,
    );
    let department = fields.get("doctorDepartment");
    if !department.is_empty() {
        draw_text(
            img,
            regular(),
            13.0,
            (width - MARGIN - 240.0, line_y + 28.0),
            department,
            INK,
        );
    }

    let date = fields.get("date");
    if !date.is_empty() {
        draw_text(
            img,
            regular(),
            13.0,
            (MARGIN, line_y + 8.0),
            &format!("Date: {date}"),
            INK,
        );
    }
}

fn non_empty(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
