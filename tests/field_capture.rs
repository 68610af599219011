use medimark::editor::fields::{
    field_label, is_long_form, FieldStore, FieldValues, HOSPITAL_FIELDS, MEDICAL_FIELDS,
};
use medimark::editor::session::{EditorSession, FIELD_EDIT_DEBOUNCE};
use std::time::Instant;

#[test]
fn every_field_routes_to_exactly_one_store() {
    let mut values = FieldValues::default();
    for field in MEDICAL_FIELDS {
        assert!(values.set(field, "m"));
        assert!(values.medical_snapshot().contains_key(*field));
        assert!(!values.hospital_snapshot().contains_key(*field));
    }
    for field in HOSPITAL_FIELDS {
        assert!(values.set(field, "h"));
        assert!(values.hospital_snapshot().contains_key(*field));
        assert!(!values.medical_snapshot().contains_key(*field));
    }
}

#[test]
fn unknown_fields_are_refused() {
    let mut values = FieldValues::default();
    assert!(!values.set("patientWeight", "70kg"));
    assert_eq!(values.get("patientWeight"), "");
}

#[test]
fn store_routing_is_static() {
    assert_eq!(
        medimark::editor::fields::store_for("chiefComplaint"),
        Some(FieldStore::Medical)
    );
    assert_eq!(
        medimark::editor::fields::store_for("hospitalName"),
        Some(FieldStore::Hospital)
    );
    assert_eq!(medimark::editor::fields::store_for("bogus"), None);
}

#[test]
fn labels_and_long_form_classification() {
    assert!(is_long_form("historyOfPresentIllness"));
    assert!(!is_long_form("age"));
    assert!(!field_label("chiefComplaint").is_empty());
}

#[test]
fn debounced_typing_produces_one_entry_per_pause() {
    let mut session = EditorSession::new(1, "opd");
    let start = Instant::now();

    for (i, value) in ["h", "he", "hea", "head", "headache"].iter().enumerate() {
        session.edit_field("chiefComplaint", value, start + i as u32 * (FIELD_EDIT_DEBOUNCE / 10));
    }
    session.tick(start + 2 * FIELD_EDIT_DEBOUNCE);

    // Second burst after the pause.
    let later = start + 10 * FIELD_EDIT_DEBOUNCE;
    session.edit_field("chiefComplaint", "headache, 3 days", later);
    session.tick(later + 2 * FIELD_EDIT_DEBOUNCE);

    // Initial entry plus one per burst.
    assert_eq!(session.history().len(), 3);
    assert_eq!(session.fields().get("chiefComplaint"), "headache, 3 days");

    session.undo();
    assert_eq!(session.fields().get("chiefComplaint"), "headache");
    session.undo();
    assert_eq!(session.fields().get("chiefComplaint"), "");
}

#[test]
fn whitespace_only_values_do_not_count_as_content() {
    let mut values = FieldValues::default();
    assert!(!values.has_content());
    values.set("chiefComplaint", "   \n ");
    assert!(!values.has_content());
    values.set("age", "44");
    assert!(values.has_content());
}
