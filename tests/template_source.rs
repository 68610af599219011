use anyhow::{anyhow, Result};
use image::RgbaImage;
use medimark::editor::session::EditorSession;
use medimark::editor::template::{
    Template, TemplatePrintRecord, TemplateSections, TemplateSource,
};
use std::sync::Mutex;

/// In-memory stand-in for the REST collaborator.
struct MemorySource {
    templates: Vec<Template>,
    saved: Mutex<Vec<TemplatePrintRecord>>,
}

impl MemorySource {
    fn new() -> Self {
        Self {
            templates: vec![
                Template {
                    id: 1,
                    name: "Letterhead".to_string(),
                    template_type_id: 2,
                    active: true,
                    photo_path: Some("letterhead.png".to_string()),
                    sections: TemplateSections::default(),
                },
                Template {
                    id: 2,
                    name: "Retired".to_string(),
                    template_type_id: 2,
                    active: false,
                    photo_path: None,
                    sections: TemplateSections::default(),
                },
            ],
            saved: Mutex::new(Vec::new()),
        }
    }
}

impl TemplateSource for MemorySource {
    fn list_templates(&self, _doctor_id: i64, template_type_id: i64) -> Result<Vec<Template>> {
        Ok(self
            .templates
            .iter()
            .filter(|t| t.active && t.template_type_id == template_type_id)
            .cloned()
            .collect())
    }

    fn fetch_print_record(
        &self,
        patient_id: i64,
        template_type_id: i64,
        context: &str,
    ) -> Result<Option<TemplatePrintRecord>> {
        Ok(self
            .saved
            .lock()
            .unwrap()
            .iter()
            .find(|r| {
                r.patient_id == patient_id
                    && r.template_type_id == template_type_id
                    && r.context == context
            })
            .cloned())
    }

    fn fetch_template_image(&self, path: &str) -> Result<Vec<u8>> {
        if path != "letterhead.png" {
            return Err(anyhow!("unknown template photo {path}"));
        }
        let img = RgbaImage::from_pixel(120, 160, image::Rgba([250, 250, 250, 255]));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageOutputFormat::Png,
        )?;
        Ok(bytes)
    }

    fn save_print(&self, record: &TemplatePrintRecord) -> Result<TemplatePrintRecord> {
        let mut saved = self.saved.lock().unwrap();
        let mut echoed = record.clone();
        match record.id {
            Some(id) => {
                let slot = saved
                    .iter_mut()
                    .find(|r| r.id == Some(id))
                    .ok_or_else(|| anyhow!("no record {id}"))?;
                *slot = echoed.clone();
            }
            None => {
                echoed.id = Some(saved.len() as i64 + 1);
                saved.push(echoed.clone());
            }
        }
        Ok(echoed)
    }
}

#[test]
fn inactive_templates_are_filtered_from_the_catalog() {
    let source = MemorySource::new();
    let listed = source.list_templates(1, 2).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Letterhead");
}

#[test]
fn first_save_creates_then_second_save_updates() {
    let source = MemorySource::new();
    let mut session = EditorSession::new(8, "opd");

    let template = source.list_templates(1, 2).unwrap().remove(0);
    let bytes = source
        .fetch_template_image(template.photo_path.as_deref().unwrap())
        .unwrap();
    let background = image::load_from_memory(&bytes).unwrap().to_rgba8();

    let generation = session.begin_template_load();
    session.apply_template_background(generation, template, background, 1.0);
    session.edit_field("fullName", "Jordan Doe", std::time::Instant::now());

    let record = session.build_save_record().unwrap();
    session.mark_saving();
    let saved = source.save_print(&record).unwrap();
    session.finish_save(Ok(saved.clone()));
    assert_eq!(saved.id, Some(1));
    assert!(!session.saving());

    // The session remembers the id: the next save is an update in place.
    let second = session.build_save_record().unwrap();
    assert_eq!(second.id, Some(1));
    let updated = source.save_print(&second).unwrap();
    assert_eq!(updated.id, Some(1));
    assert_eq!(source.saved.lock().unwrap().len(), 1);
}

#[test]
fn prefill_round_trips_through_the_source() {
    let source = MemorySource::new();

    // First visit saves a record.
    let mut first = EditorSession::new(8, "opd");
    let template = source.list_templates(1, 2).unwrap().remove(0);
    let generation = first.begin_template_load();
    first.apply_template_background(
        generation,
        template.clone(),
        RgbaImage::from_pixel(60, 80, image::Rgba([255, 255, 255, 255])),
        1.0,
    );
    first.edit_field("fullName", "Jordan Doe", std::time::Instant::now());
    let saved = source.save_print(&first.build_save_record().unwrap()).unwrap();
    first.finish_save(Ok(saved));

    // A later session prefills from the stored record.
    let mut second = EditorSession::new(8, "opd");
    let generation = second.begin_template_load();
    let record = source.fetch_print_record(8, 2, "opd").unwrap().unwrap();
    second.apply_prefill(generation, &record);
    assert_eq!(second.fields().get("fullName"), "Jordan Doe");

    // Its next save carries the stored id forward.
    second.apply_template_background(
        generation,
        template,
        RgbaImage::from_pixel(60, 80, image::Rgba([255, 255, 255, 255])),
        1.0,
    );
    let next = second.build_save_record().unwrap();
    assert_eq!(next.id, Some(1));
}
