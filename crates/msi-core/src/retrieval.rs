//! Listing and searching submitted enrollments.

use crate::{
  Error, Result,
  enrollment::EnrollmentRecord,
  store::{EnrollmentFilter, EnrollmentStore},
  user::Session,
};

/// The caller's own enrollments. Empty in demo mode.
pub async fn list_mine<S: EnrollmentStore>(
  store: Option<&S>,
  session: &Session,
) -> Result<Vec<EnrollmentRecord>> {
  let Some(store) = store else { return Ok(Vec::new()) };
  store
    .list_enrollments(EnrollmentFilter::SubmittedBy(session.user.email.clone()))
    .await
    .map_err(|e| Error::Store(Box::new(e)))
}

/// Every enrollment. Admin only; empty in demo mode.
pub async fn list_all<S: EnrollmentStore>(
  store: Option<&S>,
  session: &Session,
) -> Result<Vec<EnrollmentRecord>> {
  session.require_admin()?;
  let Some(store) = store else { return Ok(Vec::new()) };
  store
    .list_enrollments(EnrollmentFilter::All)
    .await
    .map_err(|e| Error::Store(Box::new(e)))
}

/// Keep records whose enrollment id, first name, surname or region contains
/// `query`, ignoring case. A blank query keeps everything.
pub fn search(mut records: Vec<EnrollmentRecord>, query: &str) -> Vec<EnrollmentRecord> {
  let needle = query.trim().to_lowercase();
  if !needle.is_empty() {
    records.retain(|r| r.matches(&needle));
  }
  records
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, TimeZone, Utc};
  use uuid::Uuid;

  use super::*;
  use crate::{
    enrollment::{Channel, Gender, TrainingType},
    testing::{MemoryStore, admin_session, session},
  };

  fn record(enrollment_id: &str, first: &str, surname: &str, region: &str, email: &str) -> EnrollmentRecord {
    EnrollmentRecord {
      id:                   Uuid::new_v4(),
      enrollment_id:        enrollment_id.into(),
      first_name:           first.into(),
      surname:              surname.into(),
      phone_number:         "0803".into(),
      channel:              Channel::La,
      region:               region.into(),
      state:                "Lagos".into(),
      lga:                  "Ikeja".into(),
      cost_centre:          "CC".into(),
      facility_type:        "PHC".into(),
      provider_cadre:       "CHEW".into(),
      provider_gender:      Gender::Male,
      training_type:        TrainingType::Implant,
      training_date:        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
      email:                email.into(),
      status:               "Submitted".into(),
      created_at:           Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
      supporting_documents: Vec::new(),
    }
  }

  fn records() -> Vec<EnrollmentRecord> {
    vec![
      record("MSI-AE-202405-001", "Ada", "Okoye", "South East", "ada@msi.org"),
      record("MSI-TO-202405-001", "Tunde", "Lagosian", "North Central", "tunde@msi.org"),
      record("MSI-KO-202405-001", "Kemi", "Bello", "Lagos Metro", "kemi@msi.org"),
    ]
  }

  #[test]
  fn empty_query_returns_everything_unchanged() {
    assert_eq!(search(records(), ""), records());
    assert_eq!(search(records(), "   ").len(), 3);
  }

  #[test]
  fn query_matches_names_and_region_case_insensitively() {
    let found = search(records(), "LAGOS");
    let names: Vec<_> = found.iter().map(|r| r.first_name.as_str()).collect();
    assert_eq!(names, ["Tunde", "Kemi"]);
  }

  #[test]
  fn query_matches_enrollment_id() {
    let found = search(records(), "msi-ae");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].surname, "Okoye");
  }

  #[test]
  fn query_ignores_fields_outside_the_search_set() {
    assert!(search(records(), "ikeja").is_empty());
    assert!(search(records(), "ada@msi").is_empty());
  }

  #[tokio::test]
  async fn list_mine_filters_by_submitter() {
    let store = MemoryStore::default();
    for r in records() {
      store.insert_enrollment(&r).await.unwrap();
    }
    let mine = list_mine(Some(&store), &session("kemi@msi.org")).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].first_name, "Kemi");
  }

  #[tokio::test]
  async fn list_all_requires_admin() {
    let store = MemoryStore::default();
    let err = list_all(Some(&store), &session("ada@msi.org")).await.unwrap_err();
    assert!(matches!(err, Error::Forbidden));

    for r in records() {
      store.insert_enrollment(&r).await.unwrap();
    }
    assert_eq!(list_all(Some(&store), &admin_session()).await.unwrap().len(), 3);
  }

  #[tokio::test]
  async fn store_failures_surface_as_store_errors() {
    let store = MemoryStore { fail_list: true, ..Default::default() };
    let err = list_mine(Some(&store), &session("ada@msi.org")).await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));
  }

  #[tokio::test]
  async fn demo_mode_lists_nothing() {
    let mine = list_mine(None::<&MemoryStore>, &session("ada@msi.org")).await.unwrap();
    assert!(mine.is_empty());
    assert!(list_all(None::<&MemoryStore>, &admin_session()).await.unwrap().is_empty());
  }
}
