//! egui shell around the editor session: toolbar, canvas with overlay
//! fields, print preview and toast notifications. Network and export work
//! runs on worker threads that report back over an mpsc channel; template
//! results carry the session's load generation so stale completions are
//! dropped.

mod canvas_view;
mod preview;

use crate::editor::export;
use crate::editor::generative::render_generated_template;
use crate::editor::input::{self, ShortcutAction, TabPen};
use crate::editor::model::{Color, Tool};
use crate::editor::session::EditorSession;
use crate::editor::template::{RestTemplateSource, Template, TemplatePrintRecord, TemplateSource};
use crate::notify::{append_notice_log, Notice, NoticeKind};
use eframe::egui;
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;

const TOAST_SECONDS: f64 = 4.0;
pub const EXPORT_SUBDIR: &str = "exports";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub template_type_id: i64,
    pub context: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let int = |key: &str, default: i64| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };
        Self {
            api_base_url: std::env::var("MEDIMARK_API")
                .unwrap_or_else(|_| "http://localhost:8080/api".to_string()),
            doctor_id: int("MEDIMARK_DOCTOR_ID", 1),
            patient_id: int("MEDIMARK_PATIENT_ID", 1),
            template_type_id: int("MEDIMARK_TEMPLATE_TYPE", 2),
            context: std::env::var("MEDIMARK_CONTEXT").unwrap_or_else(|_| "opd".to_string()),
        }
    }
}

/// Results flowing back from worker threads.
enum WorkerEvent {
    TemplateList(Result<Vec<Template>, String>),
    /// Template selection finished fetching: raw image bytes for uploaded
    /// templates, `None` for generative ones.
    TemplateFetched {
        generation: u64,
        template: Template,
        image_bytes: Option<Vec<u8>>,
        prefill: Option<TemplatePrintRecord>,
    },
    TemplateFailed {
        generation: u64,
        message: String,
    },
    SaveFinished(Result<TemplatePrintRecord, String>),
    ExportFinished(Result<PathBuf, String>),
}

pub struct EditorApp {
    session: EditorSession,
    config: AppConfig,
    source: Arc<RestTemplateSource>,
    templates: Vec<Template>,
    tab_pen: TabPen,
    preview: preview::PreviewWindow,
    toasts: Toasts,
    events_tx: Sender<WorkerEvent>,
    events_rx: Receiver<WorkerEvent>,
    canvas_dirty: bool,
    canvas_texture: Option<egui::TextureHandle>,
}

impl EditorApp {
    pub fn new(config: AppConfig) -> Self {
        let (events_tx, events_rx) = channel();
        let source = Arc::new(RestTemplateSource::new(config.api_base_url.clone()));
        let session = EditorSession::new(config.patient_id, config.context.clone());

        let app = Self {
            session,
            config,
            source,
            templates: Vec::new(),
            tab_pen: TabPen::default(),
            preview: preview::PreviewWindow::default(),
            toasts: Toasts::new().anchor(egui::Align2::RIGHT_TOP, [10.0, 10.0]),
            events_tx,
            events_rx,
            canvas_dirty: true,
            canvas_texture: None,
        };
        app.request_template_list();
        app
    }

    fn push_toast(&mut self, toast: Toast) {
        append_notice_log(toast.text.text());
        self.toasts.add(toast);
    }

    fn toast_notice(&mut self, notice: Notice) {
        let kind = match notice.kind {
            NoticeKind::Info => ToastKind::Info,
            NoticeKind::Success => ToastKind::Success,
            NoticeKind::Error => ToastKind::Error,
        };
        self.push_toast(Toast {
            text: notice.message.into(),
            kind,
            options: ToastOptions::default().duration_in_seconds(TOAST_SECONDS),
        });
    }

    // ── worker dispatch ────────────────────────────────────────────────

    fn request_template_list(&self) {
        let source = self.source.clone();
        let tx = self.events_tx.clone();
        let doctor_id = self.config.doctor_id;
        let type_id = self.config.template_type_id;
        std::thread::spawn(move || {
            let result = source
                .list_templates(doctor_id, type_id)
                .map_err(|e| format!("{e:#}"));
            let _ = tx.send(WorkerEvent::TemplateList(result));
        });
    }

    fn select_template(&mut self, template: Template) {
        let generation = self.session.begin_template_load();
        let source = self.source.clone();
        let tx = self.events_tx.clone();
        let patient_id = self.config.patient_id;
        let context = self.config.context.clone();
        std::thread::spawn(move || {
            let prefill =
                match source.fetch_print_record(patient_id, template.template_type_id, &context) {
                    Ok(record) => record,
                    Err(err) => {
                        tracing::warn!("prefill fetch failed: {err:#}");
                        None
                    }
                };

            let image_bytes = if template.is_generative() {
                None
            } else {
                match template.photo_path.as_deref() {
                    Some(path) => match source.fetch_template_image(path) {
                        Ok(bytes) => Some(bytes),
                        Err(err) => {
                            let _ = tx.send(WorkerEvent::TemplateFailed {
                                generation,
                                message: format!("{err:#}"),
                            });
                            return;
                        }
                    },
                    None => {
                        let _ = tx.send(WorkerEvent::TemplateFailed {
                            generation,
                            message: "template has no image".to_string(),
                        });
                        return;
                    }
                }
            };

            let _ = tx.send(WorkerEvent::TemplateFetched {
                generation,
                template,
                image_bytes,
                prefill,
            });
        });
    }

    fn save_report(&mut self) {
        let record = match self.session.build_save_record() {
            Ok(record) => record,
            Err(err) => {
                self.toast_notice(Notice::error(format!("Cannot save: {err}")));
                return;
            }
        };
        self.session.mark_saving();
        let source = self.source.clone();
        let tx = self.events_tx.clone();
        std::thread::spawn(move || {
            let result = source.save_print(&record).map_err(|e| format!("{e:#}"));
            let _ = tx.send(WorkerEvent::SaveFinished(result));
        });
    }

    fn export_canvas_png(&mut self) {
        let image = self.session.surface().image().clone();
        let tx = self.events_tx.clone();
        std::thread::spawn(move || {
            let path = PathBuf::from(EXPORT_SUBDIR)
                .join(export::annotated_png_filename(chrono::Local::now()));
            let result = export::write_png(&image, &path)
                .map(|_| path)
                .map_err(|e| format!("{e:#}"));
            let _ = tx.send(WorkerEvent::ExportFinished(result));
        });
    }

    // ── event pump ─────────────────────────────────────────────────────

    fn pump_worker_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                WorkerEvent::TemplateList(Ok(templates)) => {
                    self.session.set_template_cache(templates.clone());
                    self.templates = templates;
                }
                WorkerEvent::TemplateList(Err(message)) => {
                    self.toast_notice(Notice::error(format!(
                        "Could not load templates: {message}"
                    )));
                }
                WorkerEvent::TemplateFetched {
                    generation,
                    template,
                    image_bytes,
                    prefill,
                } => {
                    self.finish_template_load(generation, template, image_bytes, prefill);
                }
                WorkerEvent::TemplateFailed {
                    generation,
                    message,
                } => {
                    self.session.fail_template_load(generation, &message);
                }
                WorkerEvent::SaveFinished(result) => {
                    self.session
                        .finish_save(result.map_err(|message| anyhow::anyhow!(message)));
                }
                WorkerEvent::ExportFinished(Ok(path)) => {
                    self.toast_notice(Notice::success(format!("Saved {}", path.display())));
                }
                WorkerEvent::ExportFinished(Err(message)) => {
                    self.toast_notice(Notice::error(format!("Export failed: {message}")));
                }
            }
        }
    }

    fn finish_template_load(
        &mut self,
        generation: u64,
        template: Template,
        image_bytes: Option<Vec<u8>>,
        prefill: Option<TemplatePrintRecord>,
    ) {
        if generation != self.session.load_generation() {
            tracing::debug!(generation, "dropping stale template completion");
            return;
        }
        if let Some(record) = &prefill {
            self.session.apply_prefill(generation, record);
        }

        let background = match image_bytes {
            Some(bytes) => match image::load_from_memory(&bytes) {
                Ok(img) => img.to_rgba8(),
                Err(err) => {
                    self.session
                        .fail_template_load(generation, &format!("image decode: {err}"));
                    return;
                }
            },
            None => render_generated_template(&template, self.session.fields()),
        };

        self.session
            .apply_template_background(generation, template, background, 1.0);
        self.canvas_dirty = true;
    }

    // ── input ──────────────────────────────────────────────────────────

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        // Skip single-key handling while a text field has focus; Ctrl-chords
        // still work.
        let typing = ctx.memory(|m| m.focused().is_some());

        let modifiers = ctx.input(|i| input::KeyModifiers {
            command: i.modifiers.command,
            shift: i.modifiers.shift,
        });
        let mut action = None;
        ctx.input(|i| {
            for (key, mapped) in [
                (egui::Key::Z, input::ShortcutKey::Z),
                (egui::Key::Y, input::ShortcutKey::Y),
                (egui::Key::P, input::ShortcutKey::P),
            ] {
                if i.key_pressed(key) {
                    if let Some(a) = input::shortcut_for(mapped, modifiers) {
                        action = Some(a);
                    }
                }
            }
        });

        match action {
            Some(ShortcutAction::Undo) => {
                self.session.undo();
                self.canvas_dirty = true;
            }
            Some(ShortcutAction::Redo) => {
                self.session.redo();
                self.canvas_dirty = true;
            }
            Some(ShortcutAction::PrintPreview) => self.open_preview(),
            None => {}
        }

        if typing {
            return;
        }

        // Holding Tab draws with the pen from the last pointer position.
        if ctx.input(|i| i.key_pressed(egui::Key::Tab)) {
            let (tool, from) = self.tab_pen.press(self.session.tool());
            self.session.set_tool(tool);
            if let Some(point) = from {
                self.session.pointer_down(point);
                self.canvas_dirty = true;
            }
        }
        if ctx.input(|i| i.key_released(egui::Key::Tab)) {
            self.session.pointer_up();
            if let Some(tool) = self.tab_pen.release() {
                self.session.set_tool(tool);
            }
            self.canvas_dirty = true;
        }
    }

    fn open_preview(&mut self) {
        if let Some(image) = self.session.preview_composite() {
            self.preview.open(image);
        }
    }

    // ── panels ─────────────────────────────────────────────────────────

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            let mut tool = self.session.tool();
            ui.selectable_value(&mut tool, Tool::Select, "Select");
            ui.selectable_value(&mut tool, Tool::Pen, "Pen");
            if tool != self.session.tool() {
                self.session.set_tool(tool);
            }

            ui.separator();
            let style = self.session.stroke_style();
            let mut color32 = egui::Color32::from_rgba_unmultiplied(
                style.color.r,
                style.color.g,
                style.color.b,
                style.color.a,
            );
            if ui.color_edit_button_srgba(&mut color32).changed() {
                self.session.set_stroke_color(Color::rgba(
                    color32.r(),
                    color32.g(),
                    color32.b(),
                    color32.a(),
                ));
            }
            for recent in self.session.recent_colors().to_vec() {
                let swatch =
                    egui::Color32::from_rgba_unmultiplied(recent.r, recent.g, recent.b, recent.a);
                let button = egui::Button::new("  ").fill(swatch);
                if ui.add(button).on_hover_text("Recent color").clicked() {
                    self.session.set_stroke_color(recent);
                }
            }

            let mut width = self.session.stroke_style().width;
            if ui
                .add(egui::Slider::new(&mut width, 1.0..=20.0).text("Width"))
                .changed()
            {
                self.session.set_stroke_width(width);
            }

            ui.separator();
            let undo = ui
                .add_enabled(self.session.can_undo(), egui::Button::new("Undo"))
                .clicked();
            let redo = ui
                .add_enabled(self.session.can_redo(), egui::Button::new("Redo"))
                .clicked();
            if undo {
                self.session.undo();
                self.canvas_dirty = true;
            }
            if redo {
                self.session.redo();
                self.canvas_dirty = true;
            }
            if ui.button("Clear").clicked() {
                self.session.clear_canvas();
                self.canvas_dirty = true;
            }

            ui.separator();
            self.template_picker(ui);

            ui.separator();
            if ui.button("Preview").clicked() {
                self.open_preview();
            }
            if ui.button("Canvas PNG").clicked() {
                self.export_canvas_png();
            }
            let save_label = if self.session.saving() {
                "Saving…"
            } else {
                "Save"
            };
            if ui
                .add_enabled(!self.session.saving(), egui::Button::new(save_label))
                .clicked()
            {
                self.save_report();
            }
        });
    }

    fn template_picker(&mut self, ui: &mut egui::Ui) {
        let selected_name = self
            .session
            .template()
            .map(|t| t.name.clone())
            .unwrap_or_else(|| "Select template".to_string());
        let mut chosen: Option<Template> = None;
        egui::ComboBox::from_id_source("template_picker")
            .selected_text(selected_name)
            .show_ui(ui, |ui| {
                for template in &self.templates {
                    let selected = self.session.template().map(|t| t.id) == Some(template.id);
                    if ui.selectable_label(selected, &template.name).clicked() && !selected {
                        chosen = Some(template.clone());
                    }
                }
            });
        if let Some(template) = chosen {
            self.select_template(template);
        }
    }
}

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.pump_worker_events();
        self.session.tick(Instant::now());
        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.toolbar(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| {
                canvas_view::show(ui, self);
            });
        });

        let patient_id = self.config.patient_id;
        let tx = self.events_tx.clone();
        self.preview.show(ctx, &mut |action| match action {
            preview::PreviewAction::DownloadPdf(image) => {
                let tx = tx.clone();
                std::thread::spawn(move || {
                    let path = PathBuf::from(EXPORT_SUBDIR)
                        .join(export::report_pdf_filename(patient_id, chrono::Local::now()));
                    let result = export::write_pdf(&image, "medical report", &path)
                        .map(|_| path)
                        .map_err(|e| format!("{e:#}"));
                    let _ = tx.send(WorkerEvent::ExportFinished(result));
                });
            }
            preview::PreviewAction::DownloadPng(image) => {
                let tx = tx.clone();
                std::thread::spawn(move || {
                    let path = PathBuf::from(EXPORT_SUBDIR)
                        .join(export::report_png_filename(patient_id, chrono::Local::now()));
                    let result = export::write_png(&image, &path)
                        .map(|_| path)
                        .map_err(|e| format!("{e:#}"));
                    let _ = tx.send(WorkerEvent::ExportFinished(result));
                });
            }
        });

        for notice in self.session.drain_notices() {
            self.toast_notice(notice);
        }
        self.toasts.show(ctx);

        // Debounce commits and worker completions need a frame to land in.
        ctx.request_repaint_after(std::time::Duration::from_millis(200));
    }
}
