//! Canvas painting surface plus the draggable overlay field boxes.

use super::EditorApp;
use crate::editor::fields::{field_label, is_long_form};
use crate::editor::model::Tool;
use crate::editor::overlay::OverlayBox;
use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, TextEdit, Vec2};
use std::time::Instant;

const HANDLE_HEIGHT: f32 = 16.0;
const RESIZE_HANDLE: f32 = 12.0;

pub(super) fn show(ui: &mut egui::Ui, app: &mut EditorApp) {
    ui.horizontal(|ui| {
        let mut zoom = app.session.surface().zoom();
        if ui
            .add(egui::Slider::new(&mut zoom, 0.25..=3.0).text("Zoom"))
            .changed()
        {
            app.session.surface_mut().set_zoom(zoom);
        }
        if let Some(template) = app.session.template() {
            ui.label(format!("Template: {}", template.name));
        }
    });

    let zoom = app.session.surface().zoom();
    let (width, height) = (app.session.surface().width(), app.session.surface().height());
    let display = Vec2::new(width as f32 * zoom, height as f32 * zoom);

    let (response, painter) = ui.allocate_painter(display, Sense::drag());
    let rect = response.rect;
    let origin = (rect.min.x, rect.min.y);

    if let Some(pos) = response.hover_pos() {
        let point = app.session.surface().to_canvas_point((pos.x, pos.y), origin);
        app.tab_pen.track_pointer(point);
        // While Tab is held the stroke follows the hovering pointer, no
        // button press required.
        if app.tab_pen.is_held() && app.session.surface().stroke_active() {
            app.session.pointer_move(point);
            app.canvas_dirty = true;
        }
    }

    let primary = egui::PointerButton::Primary;
    if app.session.tool() == Tool::Pen {
        if response.drag_started_by(primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                let point = app.session.surface().to_canvas_point((pos.x, pos.y), origin);
                app.session.pointer_down(point);
                app.canvas_dirty = true;
            }
        } else if response.dragged_by(primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                let point = app.session.surface().to_canvas_point((pos.x, pos.y), origin);
                app.session.pointer_move(point);
                app.canvas_dirty = true;
            }
        }
        if response.drag_stopped_by(primary) {
            app.session.pointer_up();
            app.canvas_dirty = true;
        }
    }

    if app.canvas_dirty || app.canvas_texture.is_none() {
        let image = app.session.surface().image();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(
            [image.width() as usize, image.height() as usize],
            image.as_raw(),
        );
        app.canvas_texture = Some(ui.ctx().load_texture(
            "canvas",
            color_image,
            egui::TextureOptions::LINEAR,
        ));
        app.canvas_dirty = false;
    }

    if let Some(texture) = &app.canvas_texture {
        let uv = Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(1.0, 1.0));
        painter.image(texture.id(), rect, uv, Color32::WHITE);
    }

    if app.session.overlay_enabled() {
        overlay_fields(ui, app, rect);
    }
}

/// Editable field boxes over the canvas. Geometry is stored in percentages of
/// the canvas, so the boxes track the zoomed display rect automatically.
fn overlay_fields(ui: &mut egui::Ui, app: &mut EditorApp, canvas_rect: Rect) {
    let container = (canvas_rect.width(), canvas_rect.height());
    let boxes: Vec<(String, OverlayBox)> = app
        .session
        .layout()
        .boxes()
        .iter()
        .map(|(field, b)| (field.clone(), *b))
        .collect();

    for (field, b) in boxes {
        let min = canvas_rect.min
            + Vec2::new(
                b.left / 100.0 * container.0,
                b.top / 100.0 * container.1,
            );
        let size = Vec2::new(
            b.width / 100.0 * container.0,
            b.height / 100.0 * container.1,
        );
        let box_rect = Rect::from_min_size(min, size);

        let active = app.session.layout().dragged_field() == Some(field.as_str());
        let stroke = if active {
            Stroke::new(1.5, Color32::from_rgb(60, 120, 200))
        } else {
            Stroke::new(1.0, Color32::from_gray(170))
        };
        ui.painter().rect_stroke(box_rect, 2.0, stroke);

        let handle_rect = Rect::from_min_size(min, Vec2::new(size.x, HANDLE_HEIGHT));
        let resize_rect = Rect::from_min_size(
            box_rect.max - Vec2::splat(RESIZE_HANDLE),
            Vec2::splat(RESIZE_HANDLE),
        );

        let id = ui.id().with(("overlay_box", field.as_str()));
        let move_resp = ui.interact(handle_rect, id.with("move"), Sense::drag());
        let resize_resp = ui.interact(resize_rect, id.with("resize"), Sense::drag());

        let rel = |pos: Pos2| (pos.x - canvas_rect.min.x, pos.y - canvas_rect.min.y);
        let primary = egui::PointerButton::Primary;
        if move_resp.drag_started_by(primary) {
            if let Some(pos) = move_resp.interact_pointer_pos() {
                app.session.layout_mut().start_move(&field, rel(pos));
            }
        }
        if resize_resp.drag_started_by(primary) {
            if let Some(pos) = resize_resp.interact_pointer_pos() {
                app.session.layout_mut().start_resize(&field, rel(pos));
            }
        }
        if move_resp.dragged_by(primary) || resize_resp.dragged_by(primary) {
            let pos = move_resp
                .interact_pointer_pos()
                .or_else(|| resize_resp.interact_pointer_pos());
            if let Some(pos) = pos {
                app.session.layout_mut().on_pointer_move(rel(pos), container);
            }
        }
        if move_resp.drag_stopped() || resize_resp.drag_stopped() {
            app.session.layout_mut().on_pointer_up();
        }

        ui.painter().text(
            handle_rect.left_center() + Vec2::new(3.0, 0.0),
            Align2::LEFT_CENTER,
            field_label(&field),
            FontId::proportional(9.0),
            Color32::DARK_GRAY,
        );
        ui.painter().circle_filled(
            resize_rect.center(),
            RESIZE_HANDLE / 3.0,
            Color32::from_gray(150),
        );

        let text_rect = Rect::from_min_max(
            box_rect.min + Vec2::new(3.0, HANDLE_HEIGHT),
            box_rect.max - Vec2::new(3.0, 2.0),
        );
        if text_rect.height() < 4.0 {
            continue;
        }
        let mut value = app.session.fields().get(&field).to_string();
        let widget = if is_long_form(&field) {
            TextEdit::multiline(&mut value).frame(false)
        } else {
            TextEdit::singleline(&mut value).frame(false)
        };
        let edit_resp = ui.put(text_rect, widget);
        if edit_resp.changed() {
            app.session.edit_field(&field, &value, Instant::now());
        }
    }
}
