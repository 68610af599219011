use crate::editor::fields::{HOSPITAL_FIELDS, MEDICAL_FIELDS};
use std::collections::BTreeMap;

pub const MIN_WIDTH_PCT: f32 = 5.0;
pub const MIN_HEIGHT_PCT: f32 = 3.0;

/// Percentage-based bounding box for one overlay field: all four components
/// are percentages of the rendered container, not pixels.
///
/// Invariants (maintained by the clamped transition methods):
/// `0 <= left`, `0 <= top`, `left + width <= 100`, `top + height <= 100`,
/// `width >= MIN_WIDTH_PCT`, `height >= MIN_HEIGHT_PCT`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl OverlayBox {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Re-establish the invariants on an arbitrary box.
    pub fn normalized(self) -> Self {
        let width = self.width.clamp(MIN_WIDTH_PCT, 100.0);
        let height = self.height.clamp(MIN_HEIGHT_PCT, 100.0);
        Self {
            left: self.left.clamp(0.0, 100.0 - width),
            top: self.top.clamp(0.0, 100.0 - height),
            width,
            height,
        }
    }

    /// Box after a move by percentage deltas, clamped so it never exits the
    /// container.
    pub fn moved(self, dx: f32, dy: f32) -> Self {
        Self {
            left: (self.left + dx).clamp(0.0, 100.0 - self.width),
            top: (self.top + dy).clamp(0.0, 100.0 - self.height),
            ..self
        }
    }

    /// Box after a resize by percentage deltas, clamped to the minimum size
    /// and the container edge. The upper bound never drops below the minimum
    /// size, so this stays total even for a box already pushed past the
    /// point where the minimum width fits.
    pub fn resized(self, dw: f32, dh: f32) -> Self {
        let max_width = (100.0 - self.left).max(MIN_WIDTH_PCT);
        let max_height = (100.0 - self.top).max(MIN_HEIGHT_PCT);
        Self {
            width: (self.width + dw).clamp(MIN_WIDTH_PCT, max_width),
            height: (self.height + dh).clamp(MIN_HEIGHT_PCT, max_height),
            ..self
        }
    }

    pub fn satisfies_invariants(&self) -> bool {
        self.left >= 0.0
            && self.top >= 0.0
            && self.width >= MIN_WIDTH_PCT
            && self.height >= MIN_HEIGHT_PCT
            && self.left + self.width <= 100.0 + f32::EPSILON
            && self.top + self.height <= 100.0 + f32::EPSILON
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Move,
    Resize,
}

/// A single in-flight drag interaction. The session is a value object:
/// pointer-move events produce a new box via [`DragSession::update`] from
/// the *start* geometry, so there is no accumulated floating-point drift and
/// no mutable state captured in callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub field: String,
    pub mode: DragMode,
    pub start_box: OverlayBox,
    pub start_pointer: (f32, f32),
}

impl DragSession {
    pub fn begin(field: &str, mode: DragMode, start_box: OverlayBox, pointer: (f32, f32)) -> Self {
        Self {
            field: field.to_string(),
            mode,
            start_box,
            start_pointer: pointer,
        }
    }

    /// Compute the updated box for the current pointer position. Deltas are
    /// converted to percentages of the overlay container size.
    pub fn update(&self, pointer: (f32, f32), container: (f32, f32)) -> OverlayBox {
        if container.0 <= 0.0 || container.1 <= 0.0 {
            return self.start_box;
        }
        let dx = (pointer.0 - self.start_pointer.0) / container.0 * 100.0;
        let dy = (pointer.1 - self.start_pointer.1) / container.1 * 100.0;
        match self.mode {
            DragMode::Move => self.start_box.moved(dx, dy),
            DragMode::Resize => self.start_box.resized(dx, dy),
        }
    }
}

/// The full overlay layout: one box per named field. Box geometry is a
/// presentation preference, deliberately kept outside undo history.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayout {
    boxes: BTreeMap<String, OverlayBox>,
    drag: Option<DragSession>,
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self {
            boxes: default_boxes(),
            drag: None,
        }
    }
}

impl OverlayLayout {
    pub fn boxes(&self) -> &BTreeMap<String, OverlayBox> {
        &self.boxes
    }

    pub fn get(&self, field: &str) -> Option<OverlayBox> {
        self.boxes.get(field).copied()
    }

    pub fn start_move(&mut self, field: &str, pointer: (f32, f32)) {
        if let Some(start_box) = self.get(field) {
            self.drag = Some(DragSession::begin(field, DragMode::Move, start_box, pointer));
        }
    }

    pub fn start_resize(&mut self, field: &str, pointer: (f32, f32)) {
        if let Some(start_box) = self.get(field) {
            self.drag = Some(DragSession::begin(
                field,
                DragMode::Resize,
                start_box,
                pointer,
            ));
        }
    }

    /// Global pointer-move handler while a drag is active.
    pub fn on_pointer_move(&mut self, pointer: (f32, f32), container: (f32, f32)) {
        let Some(drag) = self.drag.as_ref() else {
            return;
        };
        let updated = drag.update(pointer, container);
        let field = drag.field.clone();
        self.boxes.insert(field, updated);
    }

    /// End the active drag. Repositioning is intentionally not pushed to
    /// undo history.
    pub fn on_pointer_up(&mut self) {
        self.drag = None;
    }

    pub fn drag_active(&self) -> bool {
        self.drag.is_some()
    }

    pub fn dragged_field(&self) -> Option<&str> {
        self.drag.as_ref().map(|d| d.field.as_str())
    }

    pub fn reset(&mut self) {
        self.boxes = default_boxes();
        self.drag = None;
    }
}

/// Hand-tuned default layout: hospital header across the top, patient
/// demographics beneath it, then the long-form narrative sections.
fn default_boxes() -> BTreeMap<String, OverlayBox> {
    let defaults: &[(&str, OverlayBox)] = &[
        ("hospitalName", OverlayBox::new(5.0, 1.0, 45.0, 4.0)),
        ("hospitalSubtitle", OverlayBox::new(5.0, 5.0, 40.0, 3.0)),
        ("hospitalAddress", OverlayBox::new(55.0, 1.0, 40.0, 3.0)),
        ("hospitalContact", OverlayBox::new(55.0, 4.5, 40.0, 3.0)),
        ("doctorName", OverlayBox::new(5.0, 9.0, 30.0, 3.0)),
        ("doctorDepartment", OverlayBox::new(37.0, 9.0, 28.0, 3.0)),
        ("fullName", OverlayBox::new(5.0, 14.0, 35.0, 3.0)),
        ("age", OverlayBox::new(42.0, 14.0, 12.0, 3.0)),
        ("gender", OverlayBox::new(56.0, 14.0, 12.0, 3.0)),
        ("date", OverlayBox::new(70.0, 14.0, 25.0, 3.0)),
        ("contact", OverlayBox::new(5.0, 18.0, 30.0, 3.0)),
        ("address", OverlayBox::new(37.0, 18.0, 35.0, 3.0)),
        ("referredBy", OverlayBox::new(74.0, 18.0, 21.0, 3.0)),
        ("chiefComplaint", OverlayBox::new(5.0, 23.0, 90.0, 9.0)),
        ("historyOfPresentIllness", OverlayBox::new(5.0, 33.0, 90.0, 12.0)),
        ("physicalExamination", OverlayBox::new(5.0, 46.0, 90.0, 12.0)),
        ("provisionalDiagnosis", OverlayBox::new(5.0, 59.0, 90.0, 9.0)),
        ("treatmentPlan", OverlayBox::new(5.0, 69.0, 90.0, 12.0)),
        ("additionalNotes", OverlayBox::new(5.0, 82.0, 90.0, 9.0)),
    ];

    let boxes: BTreeMap<String, OverlayBox> = defaults
        .iter()
        .map(|(name, b)| (name.to_string(), *b))
        .collect();

    debug_assert!(
        MEDICAL_FIELDS
            .iter()
            .chain(HOSPITAL_FIELDS.iter())
            .all(|f| boxes.contains_key(*f)),
        "every schema field needs a default box"
    );
    boxes
}
