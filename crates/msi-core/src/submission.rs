//! Enrollment submission: validate, mint ids, upload documents, insert the row.

use chrono::{DateTime, Utc};
use rand_core::RngCore;
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Result,
  enrollment::{DocumentReference, EnrollmentForm, EnrollmentRecord, NewDocument},
  enrollment_id::IdBase,
  error::{SubmissionError, SubmissionStage},
  reference::ReferenceData,
  store::{DocumentStore, ENROLLMENT_BUCKET, EnrollmentStore},
  user::Session,
};

/// Outcome of a successful submission.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
  pub record:    EnrollmentRecord,
  /// `false` in demo mode, where nothing is uploaded or written.
  pub persisted: bool,
}

/// Submit an enrollment on behalf of `session`.
///
/// Validation happens before any side effect. With a store, each document is
/// uploaded to `{id}/doc_{n}_{filename}` and then one row is inserted. If any
/// of those calls fails, the documents already uploaded for this submission
/// are removed again and a [`SubmissionError`] is returned; nothing is
/// retried. Without a store (demo mode) the record is assembled with a
/// random-suffix enrollment id and returned unsaved.
pub async fn submit<S, R>(
  store: Option<&S>,
  reference: &ReferenceData,
  form: &EnrollmentForm,
  documents: Vec<NewDocument>,
  session: &Session,
  now: DateTime<Utc>,
  rng: &mut R,
) -> Result<Submission>
where
  S: EnrollmentStore + DocumentStore,
  R: RngCore + ?Sized,
{
  let today = now.date_naive();
  let valid = form.validate(reference, &documents, today)?;

  let id = Uuid::new_v4();
  let base = IdBase::new(&valid.first_name, &valid.surname, today);
  let email = session.user.email.as_str();

  let Some(store) = store else {
    let record = valid.into_record(id, base.random(rng), email, now, Vec::new());
    return Ok(Submission { record, persisted: false });
  };

  let existing = store
    .count_enrollment_ids(&base)
    .await
    .map_err(|e| SubmissionError::new(SubmissionStage::IdLookup, e))?;
  let enrollment_id = base.counted(existing);

  let mut uploaded: Vec<DocumentReference> = Vec::with_capacity(documents.len());
  for (index, doc) in documents.into_iter().enumerate() {
    let path = DocumentReference::for_upload(id, index + 1, &doc.filename);
    let content_type = doc.content_type();
    if let Err(e) = store
      .upload(ENROLLMENT_BUCKET, &path, doc.bytes, &content_type)
      .await
    {
      let mut err = SubmissionError::new(SubmissionStage::Upload(path), e);
      err.orphaned = remove_uploaded(store, &uploaded).await;
      return Err(err.into());
    }
    uploaded.push(path);
  }

  let record = valid.into_record(id, enrollment_id, email, now, uploaded);
  if let Err(e) = store.insert_enrollment(&record).await {
    let mut err = SubmissionError::new(SubmissionStage::Insert, e);
    err.orphaned = remove_uploaded(store, &record.supporting_documents).await;
    return Err(err.into());
  }

  Ok(Submission { record, persisted: true })
}

/// Best-effort removal of `paths`; returns the ones that could not be removed.
async fn remove_uploaded<D: DocumentStore>(
  store: &D,
  paths: &[DocumentReference],
) -> Vec<DocumentReference> {
  let mut orphaned = Vec::new();
  for path in paths {
    if store.remove(ENROLLMENT_BUCKET, path).await.is_err() {
      orphaned.push(path.clone());
    }
  }
  orphaned
}
