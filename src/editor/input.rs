//! Keyboard shortcut mapping, kept free of windowing types so it is
//! testable without a display.

use crate::editor::model::Tool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyModifiers {
    /// Ctrl on Windows/Linux, Cmd on macOS.
    pub command: bool,
    pub shift: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKey {
    Z,
    Y,
    P,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Undo,
    Redo,
    /// Ctrl/Cmd+P opens the print preview instead of the native print
    /// dialog.
    PrintPreview,
}

pub fn shortcut_for(key: ShortcutKey, modifiers: KeyModifiers) -> Option<ShortcutAction> {
    if !modifiers.command {
        return None;
    }
    match (key, modifiers.shift) {
        (ShortcutKey::Z, false) => Some(ShortcutAction::Undo),
        (ShortcutKey::Z, true) => Some(ShortcutAction::Redo),
        (ShortcutKey::Y, _) => Some(ShortcutAction::Redo),
        (ShortcutKey::P, _) => Some(ShortcutAction::PrintPreview),
    }
}

/// Holding Tab temporarily switches to the pen tool, drawing from the last
/// known pointer position; releasing Tab restores whatever tool was active
/// before.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TabPen {
    held: bool,
    prior_tool: Option<Tool>,
    pub last_pointer: Option<(f32, f32)>,
}

impl TabPen {
    /// Tab pressed. Returns the tool to activate (always the pen) together
    /// with the position drawing should start from, when one is known.
    pub fn press(&mut self, current_tool: Tool) -> (Tool, Option<(f32, f32)>) {
        if !self.held {
            self.held = true;
            self.prior_tool = Some(current_tool);
        }
        (Tool::Pen, self.last_pointer)
    }

    /// Tab released. Returns the tool to restore.
    pub fn release(&mut self) -> Option<Tool> {
        if !self.held {
            return None;
        }
        self.held = false;
        self.prior_tool.take()
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn track_pointer(&mut self, pos: (f32, f32)) {
        self.last_pointer = Some(pos);
    }
}
