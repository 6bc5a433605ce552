//! Bearer-token sessions and the `/login`, `/logout` and `/me` handlers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/login`  | Body: `{"email":"…","password":"…"}` |
//! | `POST` | `/logout` | Drops the caller's session |
//! | `GET`  | `/me`     | The caller's session |

use std::{
  collections::HashMap,
  sync::{Arc, PoisonError, RwLock},
};

use axum::{
  Json,
  extract::{FromRequestParts, State},
  http::{StatusCode, header, request::Parts},
};
use chrono::{DateTime, TimeDelta, Utc};
use msi_core::{
  store::{DocumentStore, EnrollmentStore},
  user::{Mode, Session, User},
};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{AppState, auth, error::ApiError};

// ─── Registry ────────────────────────────────────────────────────────────────

/// Live sessions keyed by bearer token.
///
/// A session lapses `ttl` after it started. Lapsed sessions are dropped when
/// looked up and swept whenever a new one starts.
#[derive(Clone)]
pub struct SessionRegistry {
  inner: Arc<RwLock<HashMap<String, Session>>>,
  ttl:   TimeDelta,
}

impl SessionRegistry {
  pub fn new(ttl: TimeDelta) -> Self { Self { inner: Arc::default(), ttl } }

  /// Start a session for `user` and return it.
  pub fn start(&self, user: User, mode: Mode) -> Session {
    self.start_at(user, mode, Utc::now())
  }

  fn start_at(&self, user: User, mode: Mode, now: DateTime<Utc>) -> Session {
    let session = Session { token: new_token(), user, mode, started_at: now };
    let mut sessions = self.inner.write().unwrap_or_else(PoisonError::into_inner);
    sessions.retain(|_, s| !self.is_expired(s, now));
    sessions.insert(session.token.clone(), session.clone());
    session
  }

  pub fn get(&self, token: &str) -> Option<Session> { self.get_at(token, Utc::now()) }

  fn get_at(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
    let session = self
      .inner
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(token)
      .cloned()?;
    if self.is_expired(&session, now) {
      self.end(token);
      return None;
    }
    Some(session)
  }

  /// Forget the session for `token`. Returns whether one existed.
  pub fn end(&self, token: &str) -> bool {
    self
      .inner
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(token)
      .is_some()
  }

  fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
    now - session.started_at >= self.ttl
  }

  #[cfg(test)]
  fn len(&self) -> usize { self.inner.read().unwrap_or_else(PoisonError::into_inner).len() }
}

/// 32 random bytes, hex-encoded.
fn new_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The session named by the request's `Authorization: Bearer` header.
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<AppState<S>> for CurrentSession
where
  S: EnrollmentStore + DocumentStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = parts
      .headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.strip_prefix("Bearer "))
      .map(str::trim)
      .ok_or_else(|| ApiError::Unauthorized("login required".into()))?;

    state
      .sessions
      .get(token)
      .map(CurrentSession)
      .ok_or_else(|| ApiError::Unauthorized("session expired, please log in again".into()))
  }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
  pub token:      String,
  pub user:       User,
  pub mode:       Mode,
  pub started_at: DateTime<Utc>,
}

impl From<Session> for SessionView {
  fn from(s: Session) -> Self {
    Self { token: s.token, user: s.user, mode: s.mode, started_at: s.started_at }
  }
}

/// `POST /login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<SessionView>, ApiError>
where
  S: EnrollmentStore + DocumentStore + 'static,
{
  let result = auth::authenticate(
    state.store(),
    &state.config.demo_admin_email,
    &body.email,
    &body.password,
  )
  .await;

  let (user, mode) = match result {
    Ok(found) => found,
    Err(e) => {
      warn!(email = %body.email.trim(), "login rejected");
      return Err(e.into());
    }
  };

  info!(email = %user.email, admin = user.is_admin, ?mode, "login");
  Ok(Json(state.sessions.start(user, mode).into()))
}

/// `POST /logout`
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  CurrentSession(session): CurrentSession,
) -> StatusCode
where
  S: EnrollmentStore + DocumentStore + 'static,
{
  state.sessions.end(&session.token);
  info!(email = %session.user.email, "logout");
  StatusCode::NO_CONTENT
}

/// `GET /me`
pub async fn me(CurrentSession(session): CurrentSession) -> Json<SessionView> {
  Json(session.into())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tokens_are_unique_hex() {
    let a = new_token();
    let b = new_token();
    assert_eq!(a.len(), 64);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a, b);
  }

  fn ada() -> User { User { email: "ada@msi.org".into(), is_admin: false } }

  #[test]
  fn registry_start_get_end() {
    let registry = SessionRegistry::new(TimeDelta::hours(1));
    let user = ada();
    let session = registry.start(user.clone(), Mode::Demo);

    assert_eq!(registry.get(&session.token).unwrap().user, user);
    assert!(registry.end(&session.token));
    assert!(registry.get(&session.token).is_none());
    assert!(!registry.end(&session.token));
  }

  #[test]
  fn sessions_lapse_after_ttl() {
    let registry = SessionRegistry::new(TimeDelta::minutes(30));
    let start = Utc::now();
    let session = registry.start_at(ada(), Mode::Persistent, start);

    let nearly = start + TimeDelta::minutes(29);
    assert!(registry.get_at(&session.token, nearly).is_some());

    let lapsed = start + TimeDelta::minutes(30);
    assert!(registry.get_at(&session.token, lapsed).is_none());
    assert_eq!(registry.len(), 0);
  }

  #[test]
  fn starting_a_session_sweeps_lapsed_ones() {
    let registry = SessionRegistry::new(TimeDelta::minutes(30));
    let start = Utc::now();
    let old = registry.start_at(ada(), Mode::Persistent, start);
    let recent = registry.start_at(ada(), Mode::Persistent, start + TimeDelta::minutes(20));

    let fresh = registry.start_at(ada(), Mode::Persistent, start + TimeDelta::minutes(40));
    assert_eq!(registry.len(), 2);
    let later = start + TimeDelta::minutes(41);
    assert!(registry.get_at(&old.token, later).is_none());
    assert!(registry.get_at(&recent.token, later).is_some());
    assert!(registry.get_at(&fresh.token, later).is_some());
  }
}
