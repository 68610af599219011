//! The editor session: one explicit context object owning the drawing
//! surface, both field stores, the overlay layout, undo history, template
//! selection, color state and the pending debounced field edit. Multiple
//! sessions can coexist; nothing here is process-global.

use crate::editor::canvas::DrawingSurface;
use crate::editor::composite::{composite_for_print_preview, composite_for_save};
use crate::editor::fields::FieldValues;
use crate::editor::history::{HistoryEntry, PrintHistory};
use crate::editor::model::{Color, StrokeStyle, Tool};
use crate::editor::overlay::OverlayLayout;
use crate::editor::template::{Template, TemplatePrintRecord, TemplateRef};
use crate::notify::Notice;
use anyhow::{anyhow, Result};
use image::RgbaImage;
use std::time::{Duration, Instant};

/// Rapid keystrokes on the same field collapse into one history entry: the
/// contract is one entry per pause in typing, not one per keystroke.
pub const FIELD_EDIT_DEBOUNCE: Duration = Duration::from_millis(600);

const MAX_RECENT_COLORS: usize = 8;

#[derive(Debug, Clone)]
struct PendingEdit {
    field: String,
    last_edit: Instant,
}

#[derive(Debug)]
pub struct EditorSession {
    surface: DrawingSurface,
    fields: FieldValues,
    layout: OverlayLayout,
    history: PrintHistory,
    template: Option<Template>,
    template_cache: Vec<Template>,
    /// Background the canvas resets to on clear (template image or
    /// generated raster).
    background: Option<RgbaImage>,
    tool: Tool,
    stroke_style: StrokeStyle,
    recent_colors: Vec<Color>,
    pending_edit: Option<PendingEdit>,
    /// Generation counter guarding against stale background-load
    /// completions after the user has switched templates again.
    load_generation: u64,
    record_id: Option<i64>,
    patient_id: i64,
    context: String,
    saving: bool,
    notices: Vec<Notice>,
}

impl EditorSession {
    pub fn new(patient_id: i64, context: impl Into<String>) -> Self {
        let mut session = Self {
            surface: DrawingSurface::default(),
            fields: FieldValues::default(),
            layout: OverlayLayout::default(),
            history: PrintHistory::new(),
            template: None,
            template_cache: Vec::new(),
            background: None,
            tool: Tool::Select,
            stroke_style: StrokeStyle::default(),
            recent_colors: Vec::new(),
            pending_edit: None,
            load_generation: 0,
            record_id: None,
            patient_id,
            context: context.into(),
            saving: false,
            notices: Vec::new(),
        };
        // First history entry: the blank surface.
        session.push_history();
        session
    }

    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut DrawingSurface {
        &mut self.surface
    }

    pub fn fields(&self) -> &FieldValues {
        &self.fields
    }

    pub fn layout(&self) -> &OverlayLayout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut OverlayLayout {
        &mut self.layout
    }

    pub fn history(&self) -> &PrintHistory {
        &self.history
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    pub fn patient_id(&self) -> i64 {
        self.patient_id
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn stroke_style(&self) -> StrokeStyle {
        self.stroke_style
    }

    pub fn set_stroke_width(&mut self, width: f32) {
        self.stroke_style.width = width.clamp(1.0, 20.0);
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.stroke_style.color = color;
        self.recent_colors.retain(|c| *c != color);
        self.recent_colors.insert(0, color);
        self.recent_colors.truncate(MAX_RECENT_COLORS);
    }

    pub fn recent_colors(&self) -> &[Color] {
        &self.recent_colors
    }

    pub fn saving(&self) -> bool {
        self.saving
    }

    /// Overlay inputs are hidden while a generative template is active: its
    /// content is baked into the raster, so overlay fields would be
    /// redundant.
    pub fn overlay_enabled(&self) -> bool {
        !self.template.as_ref().is_some_and(Template::is_generative)
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    // ── history ────────────────────────────────────────────────────────

    fn capture_entry(&mut self) -> HistoryEntry {
        let canvas = match self.surface.serialize() {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!("canvas snapshot failed: {err:#}");
                self.notify(Notice::error("Could not capture the canvas state"));
                None
            }
        };
        HistoryEntry {
            canvas,
            medical: self.fields.medical_snapshot(),
            hospital: self.fields.hospital_snapshot(),
            template: self.template.as_ref().map(Template::to_ref),
        }
    }

    fn push_history(&mut self) {
        let entry = self.capture_entry();
        self.history.push(entry);
    }

    fn apply_entry_at(&mut self, index: usize) -> Result<()> {
        let entry = self
            .history
            .entry(index)
            .ok_or_else(|| anyhow!("history index {index} out of range"))?
            .clone();
        match &entry.canvas {
            Some(snapshot) => self.surface.restore(snapshot)?,
            None => self.surface.clear(None),
        }
        self.fields.restore(entry.medical, entry.hospital);
        self.template = match entry.template {
            Some(template_ref) => self.lookup_template(template_ref),
            None => None,
        };
        Ok(())
    }

    fn lookup_template(&self, template_ref: TemplateRef) -> Option<Template> {
        let found = self
            .template_cache
            .iter()
            .find(|t| t.id == template_ref.id)
            .cloned();
        if found.is_none() {
            tracing::warn!(id = template_ref.id, "template missing from cache on restore");
        }
        found.or_else(|| self.template.clone())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step back one entry, restoring canvas pixels, both field stores and
    /// the template selection wholesale. On a decode failure the cursor is
    /// not moved and the previous state stays on screen.
    pub fn undo(&mut self) {
        self.flush_pending_edit();
        if !self.history.can_undo() {
            return;
        }
        let target = (self.history.cursor() - 1) as usize;
        match self.apply_entry_at(target) {
            Ok(()) => {
                self.history.undo();
            }
            Err(err) => {
                tracing::warn!("undo restore failed: {err:#}");
                self.notify(Notice::error("Could not restore the previous state"));
            }
        }
    }

    pub fn redo(&mut self) {
        self.flush_pending_edit();
        if !self.history.can_redo() {
            return;
        }
        let target = (self.history.cursor() + 1) as usize;
        match self.apply_entry_at(target) {
            Ok(()) => {
                self.history.redo();
            }
            Err(err) => {
                tracing::warn!("redo restore failed: {err:#}");
                self.notify(Notice::error("Could not restore the next state"));
            }
        }
    }

    // ── drawing ────────────────────────────────────────────────────────

    pub fn pointer_down(&mut self, canvas_point: (f32, f32)) {
        if self.tool != Tool::Pen {
            return;
        }
        self.surface.begin_stroke(canvas_point, self.stroke_style);
    }

    pub fn pointer_move(&mut self, canvas_point: (f32, f32)) {
        self.surface.extend_stroke(canvas_point);
    }

    /// Finish the active stroke; every completed stroke is one history
    /// entry.
    pub fn pointer_up(&mut self) {
        if self.surface.end_stroke() {
            self.push_history();
        }
    }

    /// Reset the canvas to the template background (or blank) and record the
    /// clear in history.
    pub fn clear_canvas(&mut self) {
        self.flush_pending_edit();
        let background = self.background.clone();
        self.surface.clear(background.as_ref());
        self.push_history();
    }

    // ── field edits (debounced) ────────────────────────────────────────

    /// Apply a field edit immediately; the history capture is deferred until
    /// typing pauses. Switching to a different field commits the pending
    /// edit first.
    pub fn edit_field(&mut self, field: &str, value: &str, now: Instant) {
        if let Some(pending) = &self.pending_edit {
            if pending.field != field {
                self.flush_pending_edit();
            }
        }
        if !self.fields.set(field, value) {
            tracing::warn!(field, "edit for unknown field ignored");
            return;
        }
        self.pending_edit = Some(PendingEdit {
            field: field.to_string(),
            last_edit: now,
        });
    }

    /// Drive the debounce clock; call once per frame. Commits the pending
    /// edit when the pause since the last keystroke exceeds the window.
    pub fn tick(&mut self, now: Instant) {
        let expired = self
            .pending_edit
            .as_ref()
            .is_some_and(|p| now.duration_since(p.last_edit) >= FIELD_EDIT_DEBOUNCE);
        if expired {
            self.flush_pending_edit();
        }
    }

    pub fn flush_pending_edit(&mut self) {
        if self.pending_edit.take().is_some() {
            self.push_history();
        }
    }

    pub fn has_pending_edit(&self) -> bool {
        self.pending_edit.is_some()
    }

    // ── template selection (generation-guarded) ────────────────────────

    pub fn set_template_cache(&mut self, templates: Vec<Template>) {
        self.template_cache = templates;
    }

    pub fn template_cache(&self) -> &[Template] {
        &self.template_cache
    }

    /// Start a background load for a newly selected template. The returned
    /// generation must accompany the completion; completions carrying an
    /// older generation are dropped, so a slow load can never clobber a
    /// newer selection.
    pub fn begin_template_load(&mut self) -> u64 {
        self.load_generation += 1;
        self.load_generation
    }

    pub fn load_generation(&self) -> u64 {
        self.load_generation
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.load_generation
    }

    /// Prefill both field stores from a previously saved print record.
    /// Part of the template-selection pipeline, so it is generation-guarded
    /// too.
    pub fn apply_prefill(&mut self, generation: u64, record: &TemplatePrintRecord) {
        if !self.is_current(generation) {
            tracing::debug!(generation, "stale prefill dropped");
            return;
        }
        self.record_id = record.id;
        let values: [(&str, &String); 19] = [
            ("fullName", &record.full_name),
            ("age", &record.age),
            ("gender", &record.gender),
            ("contact", &record.contact),
            ("address", &record.address),
            ("date", &record.date),
            ("referredBy", &record.referred_by),
            ("chiefComplaint", &record.chief_complaint),
            ("historyOfPresentIllness", &record.history_of_present_illness),
            ("physicalExamination", &record.physical_examination),
            ("provisionalDiagnosis", &record.provisional_diagnosis),
            ("treatmentPlan", &record.treatment_plan),
            ("additionalNotes", &record.additional_notes),
            ("hospitalName", &record.hospital_name),
            ("hospitalSubtitle", &record.hospital_subtitle),
            ("hospitalAddress", &record.hospital_address),
            ("hospitalContact", &record.hospital_contact),
            ("doctorName", &record.doctor_name),
            ("doctorDepartment", &record.doctor_department),
        ];
        for (field, value) in values {
            self.fields.set(field, value.clone());
        }
    }

    /// Complete a template load: install the background, remember the
    /// template and capture the selection in history. Stale completions are
    /// dropped.
    pub fn apply_template_background(
        &mut self,
        generation: u64,
        template: Template,
        background: RgbaImage,
        width_scale: f32,
    ) {
        if !self.is_current(generation) {
            tracing::debug!(generation, "stale template load dropped");
            return;
        }
        self.flush_pending_edit();
        self.surface.load_background(&background, width_scale);
        self.background = Some(background);
        self.template = Some(template);
        self.push_history();
    }

    /// A template load failed; surface the error if the selection is still
    /// current. Local state is unchanged.
    pub fn fail_template_load(&mut self, generation: u64, message: &str) {
        if !self.is_current(generation) {
            return;
        }
        self.notify(Notice::error(format!("Template could not be loaded: {message}")));
    }

    // ── export & save ──────────────────────────────────────────────────

    /// Flattened composite for the save path.
    pub fn composite_for_save(&self) -> RgbaImage {
        composite_for_save(
            self.surface.image(),
            &self.layout,
            &self.fields,
            !self.overlay_enabled(),
        )
    }

    /// Flattened composite for the print preview. Fails when no field data
    /// has been entered yet: no partial artifact is produced.
    pub fn preview_composite(&mut self) -> Option<RgbaImage> {
        if !self.fields.has_content() {
            self.notify(Notice::error(
                "Enter patient details before generating a preview",
            ));
            return None;
        }
        Some(composite_for_print_preview(
            self.surface.image(),
            &self.layout,
            &self.fields,
            !self.overlay_enabled(),
        ))
    }

    /// Build the record persisted to the template service. Requires a
    /// selected template and captures any pending field edit first.
    pub fn build_save_record(&mut self) -> Result<TemplatePrintRecord> {
        let template = self
            .template
            .clone()
            .ok_or_else(|| anyhow!("select a template before saving"))?;
        self.flush_pending_edit();

        let composite = composite_for_save(
            self.surface.image(),
            &self.layout,
            &self.fields,
            template.is_generative(),
        );
        let snapshot = crate::editor::model::CanvasSnapshot::from_image(&composite)?;

        let f = |name: &str| self.fields.get(name).to_string();
        Ok(TemplatePrintRecord {
            id: self.record_id,
            patient_id: self.patient_id,
            template_type_id: template.template_type_id,
            context: self.context.clone(),
            full_name: f("fullName"),
            age: f("age"),
            gender: f("gender"),
            contact: f("contact"),
            address: f("address"),
            date: f("date"),
            referred_by: f("referredBy"),
            chief_complaint: f("chiefComplaint"),
            history_of_present_illness: f("historyOfPresentIllness"),
            physical_examination: f("physicalExamination"),
            provisional_diagnosis: f("provisionalDiagnosis"),
            treatment_plan: f("treatmentPlan"),
            additional_notes: f("additionalNotes"),
            hospital_name: f("hospitalName"),
            hospital_subtitle: f("hospitalSubtitle"),
            hospital_address: f("hospitalAddress"),
            hospital_contact: f("hospitalContact"),
            doctor_name: f("doctorName"),
            doctor_department: f("doctorDepartment"),
            template_content: snapshot.data_uri(),
        })
    }

    pub fn mark_saving(&mut self) {
        self.saving = true;
    }

    /// Save round-trip finished. The saving flag is always cleared so the
    /// user can retry after a failure.
    pub fn finish_save(&mut self, result: Result<TemplatePrintRecord>) {
        self.saving = false;
        match result {
            Ok(saved) => {
                self.record_id = saved.id;
                self.notify(Notice::success("Report saved"));
            }
            Err(err) => {
                tracing::warn!("save failed: {err:#}");
                self.notify(Notice::error(format!("Save failed: {err}")));
            }
        }
    }
}
