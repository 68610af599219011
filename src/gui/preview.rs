//! Print preview window showing the flattened composite with PDF and PNG
//! download buttons.

use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions, Vec2};
use image::RgbaImage;

pub(super) enum PreviewAction {
    DownloadPdf(RgbaImage),
    DownloadPng(RgbaImage),
}

#[derive(Default)]
pub(super) struct PreviewWindow {
    open: bool,
    image: Option<RgbaImage>,
    texture: Option<TextureHandle>,
}

impl PreviewWindow {
    pub fn open(&mut self, image: RgbaImage) {
        self.image = Some(image);
        self.texture = None;
        self.open = true;
    }

    pub fn show(&mut self, ctx: &egui::Context, on_action: &mut dyn FnMut(PreviewAction)) {
        if !self.open {
            return;
        }
        let mut keep_open = self.open;
        egui::Window::new("Print preview")
            .open(&mut keep_open)
            .resizable(true)
            .default_size([640.0, 760.0])
            .show(ctx, |ui| {
                let Some(image) = &self.image else {
                    return;
                };
                ui.horizontal(|ui| {
                    if ui.button("Download PDF").clicked() {
                        on_action(PreviewAction::DownloadPdf(image.clone()));
                    }
                    if ui.button("Download PNG").clicked() {
                        on_action(PreviewAction::DownloadPng(image.clone()));
                    }
                });
                ui.separator();

                let (w, h) = image.dimensions();
                let texture = self.texture.get_or_insert_with(|| {
                    ctx.load_texture(
                        "print_preview",
                        ColorImage::from_rgba_unmultiplied(
                            [w as usize, h as usize],
                            image.as_raw(),
                        ),
                        TextureOptions::LINEAR,
                    )
                });

                egui::ScrollArea::vertical().show(ui, |ui| {
                    let avail = ui.available_width().max(100.0);
                    let scale = (avail / w as f32).min(1.0);
                    let size = Vec2::new(w as f32 * scale, h as f32 * scale);
                    ui.add(egui::Image::new(&*texture).fit_to_exact_size(size));
                });
            });
        self.open = keep_open;
    }
}
