//! Process wiring for the MSI enrollment portal: configuration, store
//! selection and the top-level router.

use std::path::{Path, PathBuf};

use axum::Router;
use chrono::TimeDelta;
use msi_api::{ApiConfig, AppState};
use msi_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `MSI_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  /// The reference CSV, or a directory holding `CostCentres.csv`.
  #[serde(default = "default_reference_path")]
  pub reference_path:      PathBuf,
  /// SQLite database file. Absent means demo mode.
  #[serde(default)]
  pub store_path:          Option<PathBuf>,
  #[serde(default = "default_demo_admin_email")]
  pub demo_admin_email:    String,
  #[serde(default = "default_max_body_bytes")]
  pub max_body_bytes:      usize,
  /// Minutes a login stays valid.
  #[serde(default = "default_session_ttl_minutes")]
  pub session_ttl_minutes: i64,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_reference_path() -> PathBuf { PathBuf::from("CostCentres.csv") }

fn default_demo_admin_email() -> String { "admin@msi.org".to_owned() }

fn default_max_body_bytes() -> usize { 25 * 1024 * 1024 }

fn default_session_ttl_minutes() -> i64 { 8 * 60 }

impl ServerConfig {
  pub fn api_config(&self) -> ApiConfig {
    ApiConfig {
      demo_admin_email: self.demo_admin_email.clone(),
      max_body_bytes:   self.max_body_bytes,
      session_ttl:      TimeDelta::minutes(self.session_ttl_minutes),
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Open the configured store, or `None` for demo mode.
///
/// A store that fails to open is logged and also yields demo mode, so the
/// portal stays usable without a database.
pub async fn open_store(path: Option<&Path>) -> Option<SqliteStore> {
  let Some(path) = path else {
    warn!("no store_path configured; running in demo mode");
    return None;
  };
  let path = expand_tilde(path);
  match SqliteStore::open(&path).await {
    Ok(store) => {
      info!(path = %path.display(), "opened store");
      Some(store)
    }
    Err(e) => {
      warn!(path = %path.display(), error = %e, "failed to open store; running in demo mode");
      None
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The API mounted under `/api`, with request tracing.
pub fn app(state: AppState<SqliteStore>) -> Router {
  Router::new()
    .nest("/api", msi_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
  };
  use tower::ServiceExt as _;

  use super::*;

  fn sheet() -> msi_core::reference::ReferenceData {
    let csv = "Region,State,LGA,CostCentre,Facility Type,Provider Cadre\n\
               South West,Lagos,Ikeja,CC-LAG-01,PHC,Nurse\n";
    msi_csv::parse_reference(csv.as_bytes()).unwrap()
  }

  #[test]
  fn config_defaults_fill_missing_keys() {
    let settings = config::Config::builder()
      .set_override("port", 9000)
      .unwrap()
      .build()
      .unwrap();
    let cfg: ServerConfig = settings.try_deserialize().unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.reference_path, PathBuf::from("CostCentres.csv"));
    assert!(cfg.store_path.is_none());
    assert_eq!(cfg.api_config().demo_admin_email, "admin@msi.org");
    assert_eq!(cfg.api_config().session_ttl, TimeDelta::hours(8));
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/msi.db")), PathBuf::from(home).join("msi.db"));
    assert_eq!(expand_tilde(Path::new("/tmp/msi.db")), PathBuf::from("/tmp/msi.db"));
  }

  #[tokio::test]
  async fn missing_store_path_means_demo_mode() {
    assert!(open_store(None).await.is_none());
  }

  #[tokio::test]
  async fn unopenable_store_falls_back_to_demo_mode() {
    let path = Path::new("/nonexistent-dir/for/msi/test.db");
    assert!(open_store(Some(path)).await.is_none());
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let state = AppState::new(open_store(None).await, sheet(), ServerConfig {
      host:                default_host(),
      port:                default_port(),
      reference_path:      default_reference_path(),
      store_path:          None,
      demo_admin_email:    default_demo_admin_email(),
      max_body_bytes:      default_max_body_bytes(),
      session_ttl_minutes: default_session_ttl_minutes(),
    }
    .api_config());

    let req = Request::builder().uri("/api/status").body(Body::empty()).unwrap();
    let resp = app(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value =
      serde_json::from_slice(&to_bytes(resp.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["mode"], "demo");
  }
}
