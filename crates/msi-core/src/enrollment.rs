//! Enrollment records and the form they are built from.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};
use uuid::Uuid;

use crate::{
  error::{Problem, ValidationError},
  reference::ReferenceData,
};

/// Minimum number of supporting documents per enrollment.
pub const MIN_DOCUMENTS: usize = 2;

/// Status given to every record at submission. Later transitions happen
/// outside this system.
pub const STATUS_SUBMITTED: &str = "Submitted";

/// File extensions accepted for supporting documents.
pub const DOCUMENT_EXTENSIONS: [&str; 4] = ["pdf", "jpg", "jpeg", "png"];

/// MIME types a stored document may carry. Anything else a client reports is
/// replaced by the type implied by the file extension.
pub const DOCUMENT_CONTENT_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];

// ─── Fixed option lists ──────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, VariantNames,
)]
pub enum Channel {
  #[serde(rename = "PSS")]
  #[strum(serialize = "PSS")]
  Pss,
  #[serde(rename = "LA")]
  #[strum(serialize = "LA")]
  La,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, VariantNames,
)]
pub enum Gender {
  Female,
  Male,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, VariantNames,
)]
pub enum TrainingType {
  #[serde(rename = "IUD Training")]
  #[strum(serialize = "IUD Training")]
  Iud,
  #[serde(rename = "Implant Training")]
  #[strum(serialize = "Implant Training")]
  Implant,
  #[serde(rename = "LARC Beginners Training")]
  #[strum(serialize = "LARC Beginners Training")]
  LarcBeginners,
  #[serde(rename = "Data Management Training")]
  #[strum(serialize = "Data Management Training")]
  DataManagement,
}

// ─── Documents ───────────────────────────────────────────────────────────────

/// Object-store key of an uploaded supporting document:
/// `{record id}/doc_{n}_{filename}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentReference(String);

impl DocumentReference {
  /// Key for the `index`-th (1-based) document of record `id`.
  pub fn for_upload(id: Uuid, index: usize, filename: &str) -> Self {
    Self(format!("{id}/doc_{index}_{}", base_name(filename)))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl From<String> for DocumentReference {
  fn from(path: String) -> Self { Self(path) }
}

impl fmt::Display for DocumentReference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Final path component of a client-supplied filename, so a name can never
/// reach outside its record's namespace.
fn base_name(filename: &str) -> &str {
  let name = filename
    .rsplit(['/', '\\'])
    .next()
    .unwrap_or(filename)
    .trim();
  if name.is_empty() || name == "." || name == ".." { "document" } else { name }
}

/// A supporting document attached to a submission, before upload.
#[derive(Debug, Clone)]
pub struct NewDocument {
  pub filename:     String,
  /// MIME type reported by the client. Only honoured when it is one of
  /// [`DOCUMENT_CONTENT_TYPES`].
  pub content_type: Option<String>,
  pub bytes:        Vec<u8>,
}

impl NewDocument {
  fn extension(&self) -> Option<String> {
    base_name(&self.filename)
      .rsplit_once('.')
      .map(|(_, ext)| ext.to_ascii_lowercase())
  }

  fn is_supported(&self) -> bool {
    self
      .extension()
      .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext.as_str()))
  }

  pub fn content_type(&self) -> String {
    let reported = self
      .content_type
      .as_deref()
      .and_then(|ct| ct.split(';').next())
      .map(|ct| ct.trim().to_ascii_lowercase());
    if let Some(ct) = reported.filter(|ct| DOCUMENT_CONTENT_TYPES.contains(&ct.as_str())) {
      return ct;
    }
    match self.extension().as_deref() {
      Some("pdf") => "application/pdf",
      Some("jpg" | "jpeg") => "image/jpeg",
      Some("png") => "image/png",
      _ => "application/octet-stream",
    }
    .to_owned()
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A persisted enrollment. Created once on submission and never mutated by
/// this system. Field names match the `enrollments` table columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
  pub id:                   Uuid,
  /// Human-facing id, e.g. `MSI-AE-202405-003`.
  pub enrollment_id:        String,
  pub first_name:           String,
  pub surname:              String,
  pub phone_number:         String,
  pub channel:              Channel,
  pub region:               String,
  pub state:                String,
  pub lga:                  String,
  pub cost_centre:          String,
  pub facility_type:        String,
  pub provider_cadre:       String,
  pub provider_gender:      Gender,
  pub training_type:        TrainingType,
  pub training_date:        NaiveDate,
  /// Email of the submitting user; the row-level ownership filter.
  pub email:                String,
  pub status:               String,
  pub created_at:           DateTime<Utc>,
  #[serde(default)]
  pub supporting_documents: Vec<DocumentReference>,
}

impl EnrollmentRecord {
  /// Case-insensitive substring match over enrollment id, names and region.
  /// `needle` must already be lowercase.
  pub(crate) fn matches(&self, needle: &str) -> bool {
    [&self.enrollment_id, &self.first_name, &self.surname, &self.region]
      .into_iter()
      .any(|field| field.to_lowercase().contains(needle))
  }
}

// ─── Form ────────────────────────────────────────────────────────────────────

/// Raw form input. Every field may be empty until validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrollmentForm {
  pub first_name:      String,
  pub surname:         String,
  pub phone_number:    String,
  pub channel:         String,
  pub region:          String,
  pub state:           String,
  pub lga:             String,
  pub cost_centre:     String,
  pub facility_type:   String,
  pub provider_cadre:  String,
  pub provider_gender: String,
  pub training_type:   String,
  /// Defaults to the submission day.
  pub training_date:   Option<NaiveDate>,
}

/// A form that passed [`EnrollmentForm::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidForm {
  pub first_name:      String,
  pub surname:         String,
  pub phone_number:    String,
  pub channel:         Channel,
  pub region:          String,
  pub state:           String,
  pub lga:             String,
  pub cost_centre:     String,
  pub facility_type:   String,
  pub provider_cadre:  String,
  pub provider_gender: Gender,
  pub training_type:   TrainingType,
  pub training_date:   NaiveDate,
}

impl EnrollmentForm {
  /// Check the form and its documents against the reference data.
  ///
  /// All problems are collected so the user sees them in one message.
  pub fn validate(
    &self,
    reference: &ReferenceData,
    documents: &[NewDocument],
    today: NaiveDate,
  ) -> Result<ValidForm, ValidationError> {
    let mut problems = Vec::new();

    let mut required = |field: &'static str, value: &str| -> String {
      let value = value.trim();
      if value.is_empty() {
        problems.push(Problem::MissingField(field));
      }
      value.to_owned()
    };

    let first_name = required("first name", &self.first_name);
    let surname = required("surname", &self.surname);
    let phone_number = required("phone number", &self.phone_number);
    let channel = required("channel", &self.channel);
    let region = required("region", &self.region);
    let state = required("state", &self.state);
    let lga = required("lga", &self.lga);
    let cost_centre = required("cost centre", &self.cost_centre);
    let facility_type = required("facility type", &self.facility_type);
    let provider_cadre = required("provider cadre", &self.provider_cadre);
    let provider_gender = required("provider gender", &self.provider_gender);
    let training_type = required("training type", &self.training_type);

    let channel = parse_option::<Channel>("channel", &channel, &mut problems);
    let provider_gender =
      parse_option::<Gender>("provider gender", &provider_gender, &mut problems);
    let training_type =
      parse_option::<TrainingType>("training type", &training_type, &mut problems);

    if !region.is_empty()
      && !state.is_empty()
      && !lga.is_empty()
      && !reference.contains_location(&region, &state, &lga)
    {
      problems.push(Problem::InvalidLocation {
        region: region.clone(),
        state:  state.clone(),
        lga:    lga.clone(),
      });
    }
    check_listed("cost centre", &cost_centre, reference.cost_centres(), &mut problems);
    check_listed("facility type", &facility_type, reference.facility_types(), &mut problems);
    check_listed("provider cadre", &provider_cadre, reference.provider_cadres(), &mut problems);

    if documents.len() < MIN_DOCUMENTS {
      problems.push(Problem::TooFewDocuments {
        attached: documents.len(),
        required: MIN_DOCUMENTS,
      });
    }
    for doc in documents {
      if !doc.is_supported() {
        problems.push(Problem::UnsupportedDocument { filename: doc.filename.clone() });
      } else if doc.bytes.is_empty() {
        problems.push(Problem::EmptyDocument { filename: doc.filename.clone() });
      }
    }

    match (channel, provider_gender, training_type) {
      (Some(channel), Some(provider_gender), Some(training_type)) if problems.is_empty() => {
        Ok(ValidForm {
          first_name,
          surname,
          phone_number,
          channel,
          region,
          state,
          lga,
          cost_centre,
          facility_type,
          provider_cadre,
          provider_gender,
          training_type,
          training_date: self.training_date.unwrap_or(today),
        })
      }
      _ => Err(ValidationError { problems }),
    }
  }
}

/// Parse a non-empty value into one of the fixed option enums.
fn parse_option<T: FromStr>(
  field: &'static str,
  value: &str,
  problems: &mut Vec<Problem>,
) -> Option<T> {
  if value.is_empty() {
    return None;
  }
  let parsed = value.parse().ok();
  if parsed.is_none() {
    problems.push(Problem::UnknownValue { field, value: value.to_owned() });
  }
  parsed
}

fn check_listed(
  field: &'static str,
  value: &str,
  options: &[String],
  problems: &mut Vec<Problem>,
) {
  if !value.is_empty() && !options.iter().any(|o| o == value) {
    problems.push(Problem::UnknownValue { field, value: value.to_owned() });
  }
}

impl ValidForm {
  /// Assemble the record stored for this form.
  pub fn into_record(
    self,
    id: Uuid,
    enrollment_id: String,
    email: &str,
    created_at: DateTime<Utc>,
    supporting_documents: Vec<DocumentReference>,
  ) -> EnrollmentRecord {
    EnrollmentRecord {
      id,
      enrollment_id,
      first_name: self.first_name,
      surname: self.surname,
      phone_number: self.phone_number,
      channel: self.channel,
      region: self.region,
      state: self.state,
      lga: self.lga,
      cost_centre: self.cost_centre,
      facility_type: self.facility_type,
      provider_cadre: self.provider_cadre,
      provider_gender: self.provider_gender,
      training_type: self.training_type,
      training_date: self.training_date,
      email: email.to_owned(),
      status: STATUS_SUBMITTED.to_owned(),
      created_at,
      supporting_documents,
    }
  }
}

/// Option lists for the fixed dropdowns, in display order.
pub fn channel_options() -> &'static [&'static str] { Channel::VARIANTS }

pub fn gender_options() -> &'static [&'static str] { Gender::VARIANTS }

pub fn training_type_options() -> &'static [&'static str] { TrainingType::VARIANTS }

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::reference::RawReferenceRow;

  pub(crate) fn reference() -> ReferenceData {
    let row = |region: &str, state: &str, lga: &str| RawReferenceRow {
      region:         Some(region.into()),
      state:          Some(state.into()),
      lga:            Some(lga.into()),
      cost_centre:    Some("CC-LAG-01".into()),
      facility_type:  Some("Primary Health Centre".into()),
      provider_cadre: Some("Nurse/Midwife".into()),
    };
    ReferenceData::from_rows([
      row("South West", "Lagos", "Ikeja"),
      row("South West", "Lagos", "Surulere"),
      row("North Central", "Kwara", "Ilorin West"),
    ])
  }

  pub(crate) fn form() -> EnrollmentForm {
    EnrollmentForm {
      first_name:      "Ada".into(),
      surname:         "Okoye".into(),
      phone_number:    "08030000000".into(),
      channel:         "PSS".into(),
      region:          "South West".into(),
      state:           "Lagos".into(),
      lga:             "Ikeja".into(),
      cost_centre:     "CC-LAG-01".into(),
      facility_type:   "Primary Health Centre".into(),
      provider_cadre:  "Nurse/Midwife".into(),
      provider_gender: "Female".into(),
      training_type:   "IUD Training".into(),
      training_date:   NaiveDate::from_ymd_opt(2024, 6, 3),
    }
  }

  pub(crate) fn doc(name: &str) -> NewDocument {
    NewDocument {
      filename:     name.into(),
      content_type: None,
      bytes:        b"%PDF-1.4 test".to_vec(),
    }
  }

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 5, 20).unwrap() }

  #[test]
  fn complete_form_validates() {
    let valid = form()
      .validate(&reference(), &[doc("id.pdf"), doc("cert.png")], today())
      .unwrap();
    assert_eq!(valid.channel, Channel::Pss);
    assert_eq!(valid.training_type, TrainingType::Iud);
    assert_eq!(valid.training_date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
  }

  #[test]
  fn training_date_defaults_to_today() {
    let mut f = form();
    f.training_date = None;
    let valid = f
      .validate(&reference(), &[doc("a.pdf"), doc("b.pdf")], today())
      .unwrap();
    assert_eq!(valid.training_date, today());
  }

  #[test]
  fn one_document_is_rejected() {
    let err = form()
      .validate(&reference(), &[doc("id.pdf")], today())
      .unwrap_err();
    assert_eq!(err.problems, vec![Problem::TooFewDocuments { attached: 1, required: 2 }]);
  }

  #[test]
  fn blank_fields_are_reported_by_name() {
    let mut f = form();
    f.surname = "   ".into();
    f.training_type.clear();
    let err = f
      .validate(&reference(), &[doc("a.pdf"), doc("b.pdf")], today())
      .unwrap_err();
    assert!(err.has(&Problem::MissingField("surname")));
    assert!(err.has(&Problem::MissingField("training type")));
    assert_eq!(err.problems.len(), 2);
  }

  #[test]
  fn location_must_be_a_reference_triple() {
    let mut f = form();
    f.state = "Kwara".into();
    let err = f
      .validate(&reference(), &[doc("a.pdf"), doc("b.pdf")], today())
      .unwrap_err();
    assert!(matches!(err.problems[..], [Problem::InvalidLocation { .. }]));
  }

  #[test]
  fn unknown_option_values_are_rejected() {
    let mut f = form();
    f.channel = "Radio".into();
    f.cost_centre = "CC-NOPE".into();
    let err = f
      .validate(&reference(), &[doc("a.pdf"), doc("b.pdf")], today())
      .unwrap_err();
    assert!(err.has(&Problem::UnknownValue { field: "channel", value: "Radio".into() }));
    assert!(err.has(&Problem::UnknownValue {
      field: "cost centre",
      value: "CC-NOPE".into(),
    }));
  }

  #[test]
  fn documents_must_be_supported_and_non_empty() {
    let mut empty = doc("scan.JPG");
    empty.bytes.clear();
    let err = form()
      .validate(&reference(), &[doc("notes.docx"), empty], today())
      .unwrap_err();
    assert!(err.has(&Problem::UnsupportedDocument { filename: "notes.docx".into() }));
    assert!(err.has(&Problem::EmptyDocument { filename: "scan.JPG".into() }));
  }

  #[test]
  fn document_keys_are_namespaced_by_record_id() {
    let id = Uuid::nil();
    assert_eq!(
      DocumentReference::for_upload(id, 1, "id card.pdf").as_str(),
      format!("{id}/doc_1_id card.pdf"),
    );
    assert_eq!(
      DocumentReference::for_upload(id, 2, "../../etc/passwd.png").as_str(),
      format!("{id}/doc_2_passwd.png"),
    );
    assert_eq!(
      DocumentReference::for_upload(id, 3, "C:\\scans\\..").as_str(),
      format!("{id}/doc_3_document"),
    );
  }

  #[test]
  fn content_type_is_guessed_from_extension() {
    assert_eq!(doc("a.PDF").content_type(), "application/pdf");
    assert_eq!(doc("a.jpeg").content_type(), "image/jpeg");
    assert_eq!(doc("a.docx").content_type(), "application/octet-stream");
  }

  #[test]
  fn reported_content_type_is_limited_to_document_types() {
    let mut d = doc("photo.png");
    d.content_type = Some("text/html".into());
    assert_eq!(d.content_type(), "image/png");

    d.content_type = Some("image/svg+xml".into());
    assert_eq!(d.content_type(), "image/png");

    d.content_type = Some("Image/JPEG; charset=binary".into());
    assert_eq!(d.content_type(), "image/jpeg");

    let mut d = doc("notes.txt");
    d.content_type = Some("text/html".into());
    assert_eq!(d.content_type(), "application/octet-stream");
  }

  #[test]
  fn option_lists_use_display_names() {
    assert_eq!(channel_options(), ["PSS", "LA"]);
    assert_eq!(gender_options(), ["Female", "Male"]);
    assert_eq!(training_type_options()[2], "LARC Beginners Training");
  }
}
