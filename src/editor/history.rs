use crate::editor::model::CanvasSnapshot;
use crate::editor::template::TemplateRef;
use std::collections::BTreeMap;

/// One undoable snapshot of the combined editor state: canvas pixels, both
/// field dictionaries and the selected template. Entries hold full copies of
/// the field stores rather than diffs, which keeps apply-on-undo trivial.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub canvas: Option<CanvasSnapshot>,
    pub medical: BTreeMap<String, String>,
    pub hospital: BTreeMap<String, String>,
    pub template: Option<TemplateRef>,
}

/// Linear undo/redo over [`HistoryEntry`] values: an append-only vector that
/// is truncated past the cursor whenever a new entry is pushed. The cursor
/// is -1 only while the stack is empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrintHistory {
    entries: Vec<HistoryEntry>,
    cursor: isize,
}

impl PrintHistory {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: -1,
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        let keep = (self.cursor + 1) as usize;
        self.entries.truncate(keep);
        self.entries.push(entry);
        self.cursor = self.entries.len() as isize - 1;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor >= 0 && self.cursor < self.entries.len() as isize - 1
    }

    /// Step back one entry and return the state to re-apply. No-op at the
    /// initial snapshot.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor as usize)
    }

    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor as usize)
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        if self.cursor < 0 {
            return None;
        }
        self.entries.get(self.cursor as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> isize {
        self.cursor
    }

    pub fn entry(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }
}
