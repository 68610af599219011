use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Template type tag for "predefined" templates whose content is drawn
/// procedurally onto the canvas instead of decoded from an uploaded image.
/// Overlay editing is suppressed for these.
pub const GENERATIVE_TEMPLATE_TYPE: i64 = 6;

/// Which medical narrative sections a template enables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateSections {
    pub chief_complaint: bool,
    pub history_of_present_illness: bool,
    pub physical_examination: bool,
    pub provisional_diagnosis: bool,
    pub treatment_plan: bool,
    pub additional_notes: bool,
}

impl Default for TemplateSections {
    fn default() -> Self {
        Self {
            chief_complaint: true,
            history_of_present_illness: true,
            physical_examination: true,
            provisional_diagnosis: true,
            treatment_plan: true,
            additional_notes: true,
        }
    }
}

impl TemplateSections {
    /// Enabled sections in document order, as (field key, section title).
    pub fn enabled(&self) -> Vec<(&'static str, &'static str)> {
        let all: [(bool, &str, &str); 6] = [
            (self.chief_complaint, "chiefComplaint", "CHIEF COMPLAINT"),
            (
                self.history_of_present_illness,
                "historyOfPresentIllness",
                "HISTORY OF PRESENT ILLNESS",
            ),
            (
                self.physical_examination,
                "physicalExamination",
                "PHYSICAL EXAMINATION",
            ),
            (
                self.provisional_diagnosis,
                "provisionalDiagnosis",
                "PROVISIONAL DIAGNOSIS",
            ),
            (self.treatment_plan, "treatmentPlan", "TREATMENT PLAN"),
            (self.additional_notes, "additionalNotes", "ADDITIONAL NOTES"),
        ];
        all.iter()
            .filter(|(on, _, _)| *on)
            .map(|(_, key, title)| (*key, *title))
            .collect()
    }
}

/// Catalog entry from the template service. Never mutated by the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub template_type_id: i64,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Server-side path of the uploaded raster, when the template is
    /// image-backed.
    #[serde(default)]
    pub photo_path: Option<String>,
    #[serde(default)]
    pub sections: TemplateSections,
}

fn default_true() -> bool {
    true
}

impl Template {
    pub fn is_generative(&self) -> bool {
        self.template_type_id == GENERATIVE_TEMPLATE_TYPE
    }

    pub fn to_ref(&self) -> TemplateRef {
        TemplateRef {
            id: self.id,
            template_type_id: self.template_type_id,
        }
    }
}

/// Lightweight template identity stored in history entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRef {
    pub id: i64,
    pub template_type_id: i64,
}

impl TemplateRef {
    pub fn is_generative(&self) -> bool {
        self.template_type_id == GENERATIVE_TEMPLATE_TYPE
    }
}

/// Persisted print record: the flattened composite plus every field value.
/// Field names mirror the REST wire shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplatePrintRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub patient_id: i64,
    pub template_type_id: i64,
    pub context: String,
    pub full_name: String,
    pub age: String,
    pub gender: String,
    pub contact: String,
    pub address: String,
    pub date: String,
    pub referred_by: String,
    pub chief_complaint: String,
    pub history_of_present_illness: String,
    pub physical_examination: String,
    pub provisional_diagnosis: String,
    pub treatment_plan: String,
    pub additional_notes: String,
    pub hospital_name: String,
    pub hospital_subtitle: String,
    pub hospital_address: String,
    pub hospital_contact: String,
    pub doctor_name: String,
    pub doctor_department: String,
    /// `data:image/png;base64,` URI of the flattened composite.
    pub template_content: String,
}

/// The external template catalog and print-record store. The editor only
/// consumes this interface; persistence belongs to the collaborator service.
pub trait TemplateSource {
    /// Active templates for a doctor and template type.
    fn list_templates(&self, doctor_id: i64, template_type_id: i64) -> Result<Vec<Template>>;

    /// Previously saved print record for prefill, if one exists.
    fn fetch_print_record(
        &self,
        patient_id: i64,
        template_type_id: i64,
        context: &str,
    ) -> Result<Option<TemplatePrintRecord>>;

    /// Raw bytes of an uploaded template raster.
    fn fetch_template_image(&self, path: &str) -> Result<Vec<u8>>;

    /// Create (no id) or update (id set) a print record. Returns the saved
    /// record as echoed by the server.
    fn save_print(&self, record: &TemplatePrintRecord) -> Result<TemplatePrintRecord>;
}

/// Blocking REST client for the template service.
pub struct RestTemplateSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl RestTemplateSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }

    fn check(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        // Prefer the server-provided message when the body carries one.
        let body = response.text().unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .and_then(|m| m.as_str())
                    .map(|s| s.to_string())
            })
            .unwrap_or_else(|| format!("template service returned {status}"));
        Err(anyhow!(message))
    }
}

impl TemplateSource for RestTemplateSource {
    fn list_templates(&self, doctor_id: i64, template_type_id: i64) -> Result<Vec<Template>> {
        let url = format!(
            "{}/uploaded-templates/doctor/{}/type/{}",
            self.base_url, doctor_id, template_type_id
        );
        let response = Self::check(
            self.client
                .get(&url)
                .send()
                .with_context(|| format!("request template list {url}"))?,
        )?;
        let templates: Vec<Template> = response.json().context("parse template list")?;
        Ok(templates.into_iter().filter(|t| t.active).collect())
    }

    fn fetch_print_record(
        &self,
        patient_id: i64,
        template_type_id: i64,
        context: &str,
    ) -> Result<Option<TemplatePrintRecord>> {
        let url = format!(
            "{}/template-prints/patient/{}/template-type/{}?context={}",
            self.base_url,
            patient_id,
            template_type_id,
            urlencoding::encode(context)
        );
        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("request print record {url}"))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response)?;
        let record = response.json().context("parse print record")?;
        Ok(Some(record))
    }

    fn fetch_template_image(&self, path: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}/uploaded-templates/photo?path={}",
            self.base_url,
            urlencoding::encode(path)
        );
        let response = Self::check(
            self.client
                .get(&url)
                .send()
                .with_context(|| format!("request template photo {url}"))?,
        )?;
        let bytes = response.bytes().context("read template photo body")?;
        Ok(bytes.to_vec())
    }

    fn save_print(&self, record: &TemplatePrintRecord) -> Result<TemplatePrintRecord> {
        let response = match record.id {
            Some(id) => self
                .client
                .put(format!("{}/template-prints/{}", self.base_url, id))
                .json(record)
                .send()
                .context("update print record")?,
            None => self
                .client
                .post(format!("{}/template-prints", self.base_url))
                .json(record)
                .send()
                .context("create print record")?,
        };
        let response = Self::check(response)?;
        let saved = response.json().context("parse saved print record")?;
        Ok(saved)
    }
}
