use medimark::editor::overlay::{OverlayBox, OverlayLayout, MIN_HEIGHT_PCT, MIN_WIDTH_PCT};

#[test]
fn boxes_never_leave_the_container() {
    let mut layout = OverlayLayout::default();
    layout.start_move("hospitalName", (0.0, 0.0));
    layout.on_pointer_move((1e7, 1e7), (800.0, 1000.0));
    let b = layout.get("hospitalName").unwrap();
    assert!(b.satisfies_invariants());
    assert!(b.left + b.width <= 100.0 + f32::EPSILON);
    assert!(b.top + b.height <= 100.0 + f32::EPSILON);

    layout.on_pointer_move((-1e7, -1e7), (800.0, 1000.0));
    let b = layout.get("hospitalName").unwrap();
    assert_eq!((b.left, b.top), (0.0, 0.0));
}

#[test]
fn resize_respects_minimum_dimensions() {
    let mut layout = OverlayLayout::default();
    layout.start_resize("chiefComplaint", (500.0, 500.0));
    layout.on_pointer_move((-1e7, -1e7), (800.0, 1000.0));
    let b = layout.get("chiefComplaint").unwrap();
    assert_eq!(b.width, MIN_WIDTH_PCT);
    assert_eq!(b.height, MIN_HEIGHT_PCT);
}

#[test]
fn move_preserves_size_and_resize_preserves_position() {
    let mut layout = OverlayLayout::default();
    let before = layout.get("treatmentPlan").unwrap();

    layout.start_move("treatmentPlan", (100.0, 100.0));
    layout.on_pointer_move((140.0, 60.0), (1000.0, 1000.0));
    layout.on_pointer_up();
    let moved = layout.get("treatmentPlan").unwrap();
    assert_eq!(moved.width, before.width);
    assert_eq!(moved.height, before.height);

    layout.start_resize("treatmentPlan", (100.0, 100.0));
    layout.on_pointer_move((90.0, 120.0), (1000.0, 1000.0));
    layout.on_pointer_up();
    let resized = layout.get("treatmentPlan").unwrap();
    assert_eq!(resized.left, moved.left);
    assert_eq!(resized.top, moved.top);
}

#[test]
fn drag_is_anchored_to_its_starting_geometry() {
    let mut layout = OverlayLayout::default();
    let before = layout.get("fullName").unwrap();
    layout.start_move("fullName", (200.0, 200.0));

    // Wander far away and come back; no drift accumulates.
    for pointer in [(900.0, 900.0), (10.0, 10.0), (200.0, 200.0)] {
        layout.on_pointer_move(pointer, (1000.0, 1000.0));
    }
    assert_eq!(layout.get("fullName").unwrap(), before);
}

#[test]
fn pointer_up_without_drag_is_harmless() {
    let mut layout = OverlayLayout::default();
    let snapshot = layout.boxes().clone();
    layout.on_pointer_up();
    layout.on_pointer_move((50.0, 50.0), (1000.0, 1000.0));
    assert_eq!(*layout.boxes(), snapshot);
}

#[test]
fn normalized_repairs_out_of_range_geometry() {
    let b = OverlayBox::new(150.0, -20.0, 1.0, 400.0).normalized();
    assert!(b.satisfies_invariants());
}
