use medimark::editor::composite::{anchor_for, composite_for_save, TEXT_PADDING_PX};
use medimark::editor::fields::FieldValues;
use medimark::editor::model::CanvasSnapshot;
use medimark::editor::overlay::{OverlayBox, OverlayLayout};
use medimark::editor::session::EditorSession;
use medimark::editor::template::{Template, TemplateSections, GENERATIVE_TEMPLATE_TYPE};
use medimark::notify::NoticeKind;
use image::RgbaImage;
use std::time::{Duration, Instant};

fn uploaded_template() -> Template {
    Template {
        id: 7,
        name: "Letterhead".to_string(),
        template_type_id: 2,
        active: true,
        photo_path: Some("letterhead.png".to_string()),
        sections: TemplateSections::default(),
    }
}

fn generative_template() -> Template {
    Template {
        id: 9,
        name: "Generated".to_string(),
        template_type_id: GENERATIVE_TEMPLATE_TYPE,
        active: true,
        photo_path: None,
        sections: TemplateSections::default(),
    }
}

fn white(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_pixel(w, h, image::Rgba([255, 255, 255, 255]))
}

#[test]
fn overlay_text_scales_with_output_resolution() {
    // Same 50%/10% box anchors at proportional pixels on both sizes.
    let b = OverlayBox::new(50.0, 10.0, 40.0, 20.0);
    assert_eq!(anchor_for(b, 800, 600), (400.0, 60.0));
    assert_eq!(anchor_for(b, 1600, 1200), (800.0, 120.0));

    let layout = OverlayLayout::default();
    let mut fields = FieldValues::default();
    fields.set("fullName", "Jordan Doe");

    for (w, h) in [(400, 500), (1200, 1500)] {
        let out = composite_for_save(&white(w, h), &layout, &fields, false);
        let b = layout.get("fullName").unwrap();
        let (x, y) = anchor_for(b, w, h);
        let mut found = false;
        'scan: for py in (y as u32)..((y + 60.0) as u32).min(h) {
            for px in (x as u32)..((x + b.width / 100.0 * w as f32) as u32).min(w) {
                if out.get_pixel(px, py).0 != [255, 255, 255, 255] {
                    found = true;
                    break 'scan;
                }
            }
        }
        assert!(found, "no text rendered at {w}x{h}");
        // Nothing to the left of the padded anchor.
        for py in 0..h {
            for px in 0..(x + TEXT_PADDING_PX) as u32 {
                if (py as f32) < y {
                    continue;
                }
                if (py as f32) > y + b.height / 100.0 * h as f32 {
                    continue;
                }
                assert_eq!(out.get_pixel(px, py).0, [255, 255, 255, 255]);
            }
        }
    }
}

#[test]
fn generative_save_embeds_the_raster_without_overlay_text() {
    let layout = OverlayLayout::default();
    let mut fields = FieldValues::default();
    fields.set("chiefComplaint", "cough");

    let canvas = white(300, 400);
    let flattened = composite_for_save(&canvas, &layout, &fields, true);
    assert_eq!(flattened, canvas);
}

#[test]
fn preview_is_refused_until_fields_have_content() {
    let mut session = EditorSession::new(1, "opd");
    assert!(session.preview_composite().is_none());
    let notices = session.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::Error);

    session.edit_field("fullName", "Jordan Doe", Instant::now());
    assert!(session.preview_composite().is_some());
}

#[test]
fn save_record_carries_fields_and_composite_data_uri() {
    let mut session = EditorSession::new(4, "ipd");
    let generation = session.begin_template_load();
    session.apply_template_background(generation, uploaded_template(), white(200, 260), 1.0);

    let start = Instant::now();
    session.edit_field("fullName", "Jordan Doe", start);
    session.edit_field("hospitalName", "City Hospital", start + Duration::from_millis(5));
    let record = session.build_save_record().unwrap();

    assert_eq!(record.patient_id, 4);
    assert_eq!(record.context, "ipd");
    assert_eq!(record.template_type_id, 2);
    assert_eq!(record.full_name, "Jordan Doe");
    assert_eq!(record.hospital_name, "City Hospital");
    assert!(record.id.is_none());

    let snapshot = CanvasSnapshot::from_data_uri(&record.template_content).unwrap();
    let decoded = snapshot.decode().unwrap();
    assert_eq!(decoded.dimensions(), (200, 260));
}

#[test]
fn saving_without_a_template_is_an_error() {
    let mut session = EditorSession::new(1, "opd");
    session.edit_field("fullName", "Jordan Doe", Instant::now());
    assert!(session.build_save_record().is_err());
}

#[test]
fn generative_template_disables_overlay_and_bakes_content() {
    let mut session = EditorSession::new(1, "opd");
    session.edit_field("hospitalName", "City Hospital", Instant::now());
    session.flush_pending_edit();

    let generation = session.begin_template_load();
    let rendered = medimark::editor::generative::render_generated_template(
        &generative_template(),
        session.fields(),
    );
    session.apply_template_background(generation, generative_template(), rendered, 1.0);

    assert!(!session.overlay_enabled());
    // The flattened save output is exactly the canvas: no overlay pass.
    assert_eq!(session.composite_for_save(), *session.surface().image());
}

#[test]
fn stale_template_load_cannot_clobber_a_newer_selection() {
    let mut session = EditorSession::new(1, "opd");
    let stale = session.begin_template_load();
    let current = session.begin_template_load();

    session.apply_template_background(current, uploaded_template(), white(100, 100), 1.0);
    let applied = session.surface().image().clone();

    // The slower, older load completes afterwards and must be ignored.
    session.apply_template_background(
        stale,
        generative_template(),
        RgbaImage::from_pixel(50, 50, image::Rgba([0, 0, 0, 255])),
        1.0,
    );
    assert_eq!(*session.surface().image(), applied);
    assert_eq!(session.template().unwrap().id, uploaded_template().id);

    // A stale failure stays silent too.
    session.fail_template_load(stale, "timeout");
    assert!(session.drain_notices().is_empty());
}
