//! JSON HTTP API for the MSI enrollment portal.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`EnrollmentStore`] and [`DocumentStore`], or by no store at all (demo
//! mode). TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", msi_api::api_router(state))
//! ```

pub mod admin;
pub mod auth;
pub mod enrollments;
pub mod error;
pub mod reference;
pub mod session;

use std::sync::Arc;

use axum::{
  Json, Router,
  extract::{DefaultBodyLimit, State},
  routing::{get, post},
};
use chrono::TimeDelta;
use msi_core::{
  reference::ReferenceData,
  store::{DocumentStore, EnrollmentStore},
  user::Mode,
};
use serde_json::{Value, json};

pub use error::ApiError;
pub use session::SessionRegistry;

// ─── Application state ───────────────────────────────────────────────────────

/// Settings the API needs at request time.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// In demo mode, the login that is treated as an admin.
  pub demo_admin_email: String,
  /// Upper bound on a request body, documents included.
  pub max_body_bytes:   usize,
  /// How long a login stays valid.
  pub session_ttl:      TimeDelta,
}

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  /// `None` in demo mode.
  pub store:     Option<Arc<S>>,
  pub reference: Arc<ReferenceData>,
  pub sessions:  SessionRegistry,
  pub config:    Arc<ApiConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:     self.store.clone(),
      reference: self.reference.clone(),
      sessions:  self.sessions.clone(),
      config:    self.config.clone(),
    }
  }
}

impl<S> AppState<S> {
  pub fn new(store: Option<S>, reference: ReferenceData, config: ApiConfig) -> Self {
    Self {
      store:     store.map(Arc::new),
      reference: Arc::new(reference),
      sessions:  SessionRegistry::new(config.session_ttl),
      config:    Arc::new(config),
    }
  }

  pub fn store(&self) -> Option<&S> { self.store.as_deref() }

  pub fn mode(&self) -> Mode {
    if self.store.is_some() { Mode::Persistent } else { Mode::Demo }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: EnrollmentStore + DocumentStore + 'static,
{
  let body_limit = state.config.max_body_bytes;
  Router::new()
    // Session
    .route("/status", get(status::<S>))
    .route("/login", post(session::login::<S>))
    .route("/logout", post(session::logout::<S>))
    .route("/me", get(session::me))
    // Reference data
    .route("/reference", get(reference::options::<S>))
    .route("/reference/states", get(reference::states::<S>))
    .route("/reference/lgas", get(reference::lgas::<S>))
    .route("/reference/cascade", get(reference::cascade::<S>))
    // Enrollments
    .route("/enrollments", get(enrollments::mine::<S>).post(enrollments::submit::<S>))
    // Admin
    .route("/admin/enrollments", get(admin::list::<S>))
    .route("/admin/enrollments/export", get(admin::export::<S>))
    .route("/admin/documents/{*path}", get(admin::document::<S>))
    .layer(DefaultBodyLimit::max(body_limit))
    .with_state(state)
}

/// `GET /status`
async fn status<S>(State(state): State<AppState<S>>) -> Json<Value>
where
  S: EnrollmentStore + DocumentStore + 'static,
{
  Json(json!({
    "mode": state.mode(),
    "reference_rows": state.reference.table().len(),
  }))
}
