//! Handlers for the enrollment form and the caller's own records.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/enrollments` | Records submitted by the caller |
//! | `POST` | `/enrollments` | Body: form fields plus base64 `documents` |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use chrono::Utc;
use msi_core::{
  enrollment::{EnrollmentForm, EnrollmentRecord, NewDocument},
  retrieval,
  store::{DocumentStore, EnrollmentStore},
  submission::{self, Submission},
  user::Mode,
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, error::ApiError, session::CurrentSession};

/// Shown alongside empty listings when nothing is persisted.
pub const DEMO_NOTICE: &str = "demo mode: enrollments are not saved";

// ─── Mine ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Listing {
  pub mode:    Mode,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notice:  Option<&'static str>,
  pub total:   usize,
  pub showing: usize,
  pub records: Vec<EnrollmentRecord>,
}

impl Listing {
  pub fn new(mode: Mode, total: usize, records: Vec<EnrollmentRecord>) -> Self {
    Self {
      mode,
      notice: (mode == Mode::Demo).then_some(DEMO_NOTICE),
      total,
      showing: records.len(),
      records,
    }
  }
}

/// `GET /enrollments`
pub async fn mine<S>(
  State(state): State<AppState<S>>,
  CurrentSession(session): CurrentSession,
) -> Result<Json<Listing>, ApiError>
where
  S: EnrollmentStore + DocumentStore + 'static,
{
  let records = retrieval::list_mine(state.store(), &session).await?;
  Ok(Json(Listing::new(state.mode(), records.len(), records)))
}

// ─── Submit ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UploadBody {
  pub filename:       String,
  #[serde(default)]
  pub content_type:   Option<String>,
  pub content_base64: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  #[serde(flatten)]
  pub form:      EnrollmentForm,
  #[serde(default)]
  pub documents: Vec<UploadBody>,
}

fn decode_documents(uploads: Vec<UploadBody>) -> Result<Vec<NewDocument>, ApiError> {
  uploads
    .into_iter()
    .map(|u| {
      let bytes = B64.decode(u.content_base64.trim()).map_err(|e| {
        ApiError::BadRequest(format!("{} is not valid base64: {e}", u.filename))
      })?;
      Ok(NewDocument { filename: u.filename, content_type: u.content_type, bytes })
    })
    .collect()
}

/// `POST /enrollments`
///
/// `201 Created` when the record was saved, `200 OK` in demo mode.
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  CurrentSession(session): CurrentSession,
  Json(body): Json<SubmitBody>,
) -> Result<(StatusCode, Json<Submission>), ApiError>
where
  S: EnrollmentStore + DocumentStore + 'static,
{
  let documents = decode_documents(body.documents)?;
  let submission = submission::submit(
    state.store(),
    &state.reference,
    &body.form,
    documents,
    &session,
    Utc::now(),
    &mut OsRng,
  )
  .await?;

  info!(
    enrollment_id = %submission.record.enrollment_id,
    email = %session.user.email,
    documents = submission.record.supporting_documents.len(),
    persisted = submission.persisted,
    "enrollment submitted"
  );
  let status = if submission.persisted { StatusCode::CREATED } else { StatusCode::OK };
  Ok((status, Json(submission)))
}
