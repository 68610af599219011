use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};

/// Which of the two value stores a field name belongs to. Every known field
/// name maps to exactly one store; the mapping is built once from the
/// canonical lists below instead of probing the dictionaries at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStore {
    Medical,
    Hospital,
}

pub const MEDICAL_FIELDS: &[&str] = &[
    "fullName",
    "age",
    "gender",
    "contact",
    "address",
    "date",
    "referredBy",
    "chiefComplaint",
    "historyOfPresentIllness",
    "physicalExamination",
    "provisionalDiagnosis",
    "treatmentPlan",
    "additionalNotes",
];

pub const HOSPITAL_FIELDS: &[&str] = &[
    "hospitalName",
    "hospitalSubtitle",
    "hospitalAddress",
    "hospitalContact",
    "doctorName",
    "doctorDepartment",
];

/// Long-form narrative fields render as multi-line text areas and get
/// word-wrapped section boxes in generated templates.
pub const LONG_FORM_FIELDS: &[&str] = &[
    "chiefComplaint",
    "historyOfPresentIllness",
    "physicalExamination",
    "provisionalDiagnosis",
    "treatmentPlan",
    "additionalNotes",
];

static FIELD_SCHEMA: Lazy<HashMap<&'static str, FieldStore>> = Lazy::new(|| {
    let mut schema = HashMap::new();
    for name in MEDICAL_FIELDS {
        schema.insert(*name, FieldStore::Medical);
    }
    for name in HOSPITAL_FIELDS {
        let previous = schema.insert(*name, FieldStore::Hospital);
        debug_assert!(previous.is_none(), "field {name} declared in both stores");
    }
    schema
});

pub fn store_for(field: &str) -> Option<FieldStore> {
    FIELD_SCHEMA.get(field).copied()
}

pub fn is_long_form(field: &str) -> bool {
    LONG_FORM_FIELDS.contains(&field)
}

/// Human-readable label for a field key, used for section titles in
/// generated templates and the print preview.
pub fn field_label(field: &str) -> &'static str {
    match field {
        "fullName" => "Full Name",
        "age" => "Age",
        "gender" => "Gender",
        "contact" => "Contact",
        "address" => "Address",
        "date" => "Date",
        "referredBy" => "Referred By",
        "chiefComplaint" => "Chief Complaint",
        "historyOfPresentIllness" => "History of Present Illness",
        "physicalExamination" => "Physical Examination",
        "provisionalDiagnosis" => "Provisional Diagnosis",
        "treatmentPlan" => "Treatment Plan",
        "additionalNotes" => "Additional Notes",
        "hospitalName" => "Hospital Name",
        "hospitalSubtitle" => "Hospital Subtitle",
        "hospitalAddress" => "Hospital Address",
        "hospitalContact" => "Hospital Contact",
        "doctorName" => "Doctor Name",
        "doctorDepartment" => "Department",
        _ => "Field",
    }
}

/// The two field dictionaries backing the overlay inputs: medical/patient
/// values and hospital/doctor values. Writes route through the static
/// schema, so a name can never end up duplicated across both maps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldValues {
    medical: BTreeMap<String, String>,
    hospital: BTreeMap<String, String>,
}

impl FieldValues {
    pub fn set(&mut self, field: &str, value: impl Into<String>) -> bool {
        match store_for(field) {
            Some(FieldStore::Medical) => {
                self.medical.insert(field.to_string(), value.into());
                true
            }
            Some(FieldStore::Hospital) => {
                self.hospital.insert(field.to_string(), value.into());
                true
            }
            None => false,
        }
    }

    pub fn get(&self, field: &str) -> &str {
        let value = match store_for(field) {
            Some(FieldStore::Medical) => self.medical.get(field),
            Some(FieldStore::Hospital) => self.hospital.get(field),
            None => None,
        };
        value.map(String::as_str).unwrap_or("")
    }

    pub fn medical(&self) -> &BTreeMap<String, String> {
        &self.medical
    }

    pub fn hospital(&self) -> &BTreeMap<String, String> {
        &self.hospital
    }

    pub fn medical_snapshot(&self) -> BTreeMap<String, String> {
        self.medical.clone()
    }

    pub fn hospital_snapshot(&self) -> BTreeMap<String, String> {
        self.hospital.clone()
    }

    /// Wholesale replacement used when applying a history entry.
    pub fn restore(&mut self, medical: BTreeMap<String, String>, hospital: BTreeMap<String, String>) {
        self.medical = medical;
        self.hospital = hospital;
    }

    /// True when at least one field carries non-whitespace content.
    pub fn has_content(&self) -> bool {
        self.medical
            .values()
            .chain(self.hospital.values())
            .any(|v| !v.trim().is_empty())
    }
}
