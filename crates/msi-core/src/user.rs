//! Users and the per-login session context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// An authenticated portal user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub email:    String,
  pub is_admin: bool,
}

/// A row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
  pub email:         String,
  /// argon2 PHC string, or a legacy unsalted SHA-256 hex digest.
  pub password_hash: String,
  pub is_admin:      bool,
}

impl UserAccount {
  pub fn user(&self) -> User {
    User { email: self.email.clone(), is_admin: self.is_admin }
  }
}

/// Whether records are actually persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
  Persistent,
  /// No database: logins are not checked and nothing is stored.
  Demo,
}

/// Everything an operation needs to know about who is calling.
///
/// Created at login, dropped at logout, never shared between logins.
#[derive(Debug, Clone)]
pub struct Session {
  pub token:      String,
  pub user:       User,
  pub mode:       Mode,
  pub started_at: DateTime<Utc>,
}

impl Session {
  pub fn require_admin(&self) -> Result<()> {
    if self.user.is_admin { Ok(()) } else { Err(Error::Forbidden) }
  }
}
