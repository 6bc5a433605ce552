//! Admin-only handlers: the full listing, CSV export and document download.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin/enrollments` | Optional `?q=` search |
//! | `GET`  | `/admin/enrollments/export` | CSV attachment, same `?q=` |
//! | `GET`  | `/admin/documents/{*path}` | A stored supporting document |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, HeaderValue, header},
  response::{IntoResponse, Response},
};
use chrono::Utc;
use msi_core::{
  enrollment::{DOCUMENT_CONTENT_TYPES, DocumentReference, EnrollmentRecord},
  retrieval,
  store::{DocumentStore, ENROLLMENT_BUCKET, EnrollmentStore},
  user::Session,
};
use serde::Deserialize;
use tracing::info;

use crate::{AppState, enrollments::Listing, error::ApiError, session::CurrentSession};

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  /// Case-insensitive match over enrollment id, names and region.
  #[serde(default)]
  pub q: String,
}

/// All records and the subset matching `q`.
async fn search<S>(
  state: &AppState<S>,
  session: &Session,
  q: &str,
) -> Result<(usize, Vec<EnrollmentRecord>), ApiError>
where
  S: EnrollmentStore + DocumentStore + 'static,
{
  let all = retrieval::list_all(state.store(), session).await?;
  let total = all.len();
  Ok((total, retrieval::search(all, q)))
}

/// `GET /admin/enrollments[?q=...]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentSession(session): CurrentSession,
  Query(params): Query<SearchParams>,
) -> Result<Json<Listing>, ApiError>
where
  S: EnrollmentStore + DocumentStore + 'static,
{
  let (total, records) = search(&state, &session, &params.q).await?;
  Ok(Json(Listing::new(state.mode(), total, records)))
}

/// `GET /admin/enrollments/export[?q=...]`
pub async fn export<S>(
  State(state): State<AppState<S>>,
  CurrentSession(session): CurrentSession,
  Query(params): Query<SearchParams>,
) -> Result<Response, ApiError>
where
  S: EnrollmentStore + DocumentStore + 'static,
{
  let (_, records) = search(&state, &session, &params.q).await?;
  let body = msi_csv::export_csv(&records)?;
  let filename = format!("msi_enrollments_{}.csv", Utc::now().format("%Y%m%d"));

  info!(email = %session.user.email, rows = records.len(), %filename, "export");
  Ok(
    (
      [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
      ],
      body,
    )
      .into_response(),
  )
}

/// `GET /admin/documents/{*path}`
pub async fn document<S>(
  State(state): State<AppState<S>>,
  CurrentSession(session): CurrentSession,
  Path(path): Path<String>,
) -> Result<Response, ApiError>
where
  S: EnrollmentStore + DocumentStore + 'static,
{
  session.require_admin()?;
  let not_found = || ApiError::NotFound(format!("document {path} not found"));
  let store = state.store().ok_or_else(not_found)?;

  let reference = DocumentReference::from(path.clone());
  let doc = store
    .fetch(ENROLLMENT_BUCKET, &reference)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(not_found)?;

  Ok((download_headers(&path, &doc.content_type), doc.bytes).into_response())
}

/// Documents are always served as attachments with a type from
/// [`DOCUMENT_CONTENT_TYPES`], so a stored upload never renders inline.
fn download_headers(path: &str, content_type: &str) -> HeaderMap {
  let content_type = DOCUMENT_CONTENT_TYPES
    .into_iter()
    .find(|t| *t == content_type)
    .unwrap_or("application/octet-stream");
  let filename: String = path
    .rsplit('/')
    .next()
    .unwrap_or(path)
    .chars()
    .filter(|c| !c.is_control() && !matches!(c, '"' | '\\'))
    .collect();
  let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

  let mut headers = HeaderMap::new();
  headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
  headers.insert(header::CONTENT_DISPOSITION, disposition);
  headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
  headers
}
