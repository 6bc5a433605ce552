//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are RFC 3339 strings, dates are `YYYY-MM-DD`, UUIDs are
//! hyphenated lowercase, and the document list is a JSON array of paths.
//! Fixed option enums are stored by their display label.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use msi_core::{
  enrollment::{DocumentReference, EnrollmentRecord},
  user::UserAccount,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_label<T: FromStr>(column: &'static str, value: String) -> Result<T> {
  value
    .parse()
    .map_err(|_| Error::UnknownValue { column, value })
}

// ─── Documents ───────────────────────────────────────────────────────────────

pub fn encode_documents(docs: &[DocumentReference]) -> Result<String> {
  Ok(serde_json::to_string(docs)?)
}

pub fn decode_documents(s: &str) -> Result<Vec<DocumentReference>> {
  Ok(serde_json::from_str(s)?)
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
pub fn escape_like(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawEnrollment::from_row`].
pub const ENROLLMENT_COLUMNS: &str = "id, enrollment_id, first_name, surname, phone_number, \
   channel, region, state, lga, cost_centre, facility_type, provider_cadre, provider_gender, \
   training_type, training_date, email, status, created_at, supporting_documents";

/// Raw strings read directly from an `enrollments` row.
pub struct RawEnrollment {
  pub id:                   String,
  pub enrollment_id:        String,
  pub first_name:           String,
  pub surname:              String,
  pub phone_number:         String,
  pub channel:              String,
  pub region:               String,
  pub state:                String,
  pub lga:                  String,
  pub cost_centre:          String,
  pub facility_type:        String,
  pub provider_cadre:       String,
  pub provider_gender:      String,
  pub training_type:        String,
  pub training_date:        String,
  pub email:                String,
  pub status:               String,
  pub created_at:           String,
  pub supporting_documents: String,
}

impl RawEnrollment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                   row.get(0)?,
      enrollment_id:        row.get(1)?,
      first_name:           row.get(2)?,
      surname:              row.get(3)?,
      phone_number:         row.get(4)?,
      channel:              row.get(5)?,
      region:               row.get(6)?,
      state:                row.get(7)?,
      lga:                  row.get(8)?,
      cost_centre:          row.get(9)?,
      facility_type:        row.get(10)?,
      provider_cadre:       row.get(11)?,
      provider_gender:      row.get(12)?,
      training_type:        row.get(13)?,
      training_date:        row.get(14)?,
      email:                row.get(15)?,
      status:               row.get(16)?,
      created_at:           row.get(17)?,
      supporting_documents: row.get(18)?,
    })
  }

  pub fn encode(record: &EnrollmentRecord) -> Result<Self> {
    Ok(Self {
      id:                   encode_uuid(record.id),
      enrollment_id:        record.enrollment_id.clone(),
      first_name:           record.first_name.clone(),
      surname:              record.surname.clone(),
      phone_number:         record.phone_number.clone(),
      channel:              record.channel.to_string(),
      region:               record.region.clone(),
      state:                record.state.clone(),
      lga:                  record.lga.clone(),
      cost_centre:          record.cost_centre.clone(),
      facility_type:        record.facility_type.clone(),
      provider_cadre:       record.provider_cadre.clone(),
      provider_gender:      record.provider_gender.to_string(),
      training_type:        record.training_type.to_string(),
      training_date:        encode_date(record.training_date),
      email:                record.email.clone(),
      status:               record.status.clone(),
      created_at:           encode_dt(record.created_at),
      supporting_documents: encode_documents(&record.supporting_documents)?,
    })
  }

  pub fn into_record(self) -> Result<EnrollmentRecord> {
    Ok(EnrollmentRecord {
      id:                   decode_uuid(&self.id)?,
      enrollment_id:        self.enrollment_id,
      first_name:           self.first_name,
      surname:              self.surname,
      phone_number:         self.phone_number,
      channel:              decode_label("channel", self.channel)?,
      region:               self.region,
      state:                self.state,
      lga:                  self.lga,
      cost_centre:          self.cost_centre,
      facility_type:        self.facility_type,
      provider_cadre:       self.provider_cadre,
      provider_gender:      decode_label("provider_gender", self.provider_gender)?,
      training_type:        decode_label("training_type", self.training_type)?,
      training_date:        decode_date(&self.training_date)?,
      email:                self.email,
      status:               self.status,
      created_at:           decode_dt(&self.created_at)?,
      supporting_documents: decode_documents(&self.supporting_documents)?,
    })
  }
}

/// Raw values read from a `users` row.
pub struct RawUser {
  pub email:    String,
  pub password: String,
  pub is_admin: bool,
}

impl RawUser {
  pub fn into_account(self) -> UserAccount {
    UserAccount {
      email:         self.email,
      password_hash: self.password,
      is_admin:      self.is_admin,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn like_metacharacters_are_escaped() {
    assert_eq!(escape_like("MSI-AE-202405"), "MSI-AE-202405");
    assert_eq!(escape_like("a_b%c\\d"), "a\\_b\\%c\\\\d");
  }

  #[test]
  fn unknown_labels_are_rejected() {
    let err = decode_label::<msi_core::enrollment::Channel>("channel", "Walk-in".into())
      .unwrap_err();
    assert!(matches!(err, Error::UnknownValue { column: "channel", .. }));
  }
}
