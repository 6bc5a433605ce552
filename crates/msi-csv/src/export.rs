//! CSV export of enrollment records.

use chrono::SecondsFormat;
use msi_core::enrollment::EnrollmentRecord;

use crate::Result;

/// Header row of the export, one column per `enrollments` table column.
pub const EXPORT_COLUMNS: [&str; 19] = [
  "id",
  "enrollment_id",
  "first_name",
  "surname",
  "phone_number",
  "channel",
  "region",
  "state",
  "lga",
  "cost_centre",
  "facility_type",
  "provider_cadre",
  "provider_gender",
  "training_type",
  "training_date",
  "email",
  "status",
  "created_at",
  "supporting_documents",
];

/// Render `records` as UTF-8 CSV with a header row.
///
/// `created_at` is written as RFC 3339 with as many fractional digits as it
/// carries, and `supporting_documents` as a JSON array of object paths. An
/// empty slice still yields the header.
pub fn export_csv(records: &[EnrollmentRecord]) -> Result<Vec<u8>> {
  let mut writer = csv::Writer::from_writer(Vec::new());
  writer.write_record(EXPORT_COLUMNS)?;

  for r in records {
    let documents = serde_json::to_string(&r.supporting_documents)?;
    writer.write_record([
      r.id.to_string(),
      r.enrollment_id.clone(),
      r.first_name.clone(),
      r.surname.clone(),
      r.phone_number.clone(),
      r.channel.to_string(),
      r.region.clone(),
      r.state.clone(),
      r.lga.clone(),
      r.cost_centre.clone(),
      r.facility_type.clone(),
      r.provider_cadre.clone(),
      r.provider_gender.to_string(),
      r.training_type.to_string(),
      r.training_date.format("%Y-%m-%d").to_string(),
      r.email.clone(),
      r.status.clone(),
      r.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
      documents,
    ])?;
  }

  writer.into_inner().map_err(|e| e.into_error().into())
}
