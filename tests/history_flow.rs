use medimark::editor::history::{HistoryEntry, PrintHistory};
use medimark::editor::input::TabPen;
use medimark::editor::model::Tool;
use medimark::editor::session::EditorSession;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

fn entry(tag: &str) -> HistoryEntry {
    let mut medical = BTreeMap::new();
    medical.insert("chiefComplaint".to_string(), tag.to_string());
    HistoryEntry {
        canvas: None,
        medical,
        hospital: BTreeMap::new(),
        template: None,
    }
}

#[test]
fn push_after_undo_discards_the_redo_branch() {
    let mut history = PrintHistory::new();
    history.push(entry("initial"));
    history.push(entry("a"));
    history.push(entry("b"));

    history.undo();
    history.push(entry("c"));

    assert_eq!(history.len(), 3);
    assert!(!history.can_redo());
    let tags: Vec<&str> = (0..history.len())
        .map(|i| history.entry(i).unwrap().medical["chiefComplaint"].as_str())
        .collect();
    assert_eq!(tags, ["initial", "a", "c"]);
}

#[test]
fn undoing_everything_reaches_the_initial_entry() {
    let mut history = PrintHistory::new();
    history.push(entry("initial"));
    for tag in ["a", "b", "c", "d"] {
        history.push(entry(tag));
    }

    let mut steps = 0;
    while history.can_undo() {
        history.undo();
        steps += 1;
    }
    assert_eq!(steps, 4);
    assert_eq!(
        history.current().unwrap().medical["chiefComplaint"],
        "initial"
    );
}

#[test]
fn mixed_stroke_and_field_edits_undo_in_order() {
    let mut session = EditorSession::new(1, "opd");
    let start = Instant::now();

    session.set_tool(Tool::Pen);
    session.pointer_down((10.0, 10.0));
    session.pointer_move((60.0, 60.0));
    session.pointer_up();

    session.edit_field("chiefComplaint", "fever", start);
    session.tick(start + Duration::from_secs(1));
    assert_eq!(session.history().len(), 3);

    // Last action first: the field edit comes back off.
    session.undo();
    assert_eq!(session.fields().get("chiefComplaint"), "");
    assert_ne!(
        session.surface().image().get_pixel(30, 30).0,
        [255, 255, 255, 255]
    );

    // Then the stroke.
    session.undo();
    assert_eq!(
        session.surface().image().get_pixel(30, 30).0,
        [255, 255, 255, 255]
    );
    assert!(!session.can_undo());

    session.redo();
    session.redo();
    assert_eq!(session.fields().get("chiefComplaint"), "fever");
    assert_ne!(
        session.surface().image().get_pixel(30, 30).0,
        [255, 255, 255, 255]
    );
}

#[test]
fn tab_hold_draws_a_path_not_a_dot() {
    let mut session = EditorSession::new(1, "opd");
    let mut tab = TabPen::default();
    tab.track_pointer((10.0, 10.0));

    // Tab pressed: pen activates and the stroke starts at the last pointer.
    let (tool, from) = tab.press(session.tool());
    session.set_tool(tool);
    session.pointer_down(from.unwrap());

    // Hover movement while held keeps extending the stroke.
    for point in [(30.0, 30.0), (60.0, 60.0), (90.0, 90.0)] {
        tab.track_pointer(point);
        session.pointer_move(point);
    }

    session.pointer_up();
    if let Some(prior) = tab.release() {
        session.set_tool(prior);
    }

    // Pixels along the path, not just at the origin.
    for (x, y) in [(10, 10), (45, 45), (75, 75)] {
        assert_ne!(
            session.surface().image().get_pixel(x, y).0,
            [255, 255, 255, 255],
            "no ink at ({x}, {y})"
        );
    }
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.tool(), Tool::Select);
}

#[test]
fn new_stroke_after_undo_discards_redo_states() {
    let mut session = EditorSession::new(1, "opd");
    session.set_tool(Tool::Pen);

    session.pointer_down((10.0, 10.0));
    session.pointer_up();
    session.pointer_down((50.0, 50.0));
    session.pointer_up();
    assert_eq!(session.history().len(), 3);

    session.undo();
    assert!(session.can_redo());

    session.pointer_down((80.0, 80.0));
    session.pointer_up();
    assert_eq!(session.history().len(), 3);
    assert!(!session.can_redo());
}
