//! Password hashing, verification and login.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use msi_core::{
  Error, Result,
  store::EnrollmentStore,
  user::{Mode, User},
};
use rand_core::OsRng;
use sha2::{Digest, Sha256};

/// Hash `password` into an argon2 PHC string for the `users.password` column.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

/// Check `password` against a stored hash.
///
/// Accepts argon2 PHC strings and, for accounts created before argon2 was
/// introduced, unsalted SHA-256 hex digests.
pub fn verify_password(stored: &str, password: &str) -> bool {
  if stored.starts_with('$') {
    return PasswordHash::new(stored)
      .and_then(|hash| Argon2::default().verify_password(password.as_bytes(), &hash))
      .is_ok();
  }
  let digest = hex::encode(Sha256::digest(password.as_bytes()));
  stored.eq_ignore_ascii_case(&digest)
}

/// Resolve login credentials to a user.
///
/// Without a store every login succeeds in demo mode, and the user is an
/// admin iff the email equals `demo_admin_email`.
pub async fn authenticate<S: EnrollmentStore>(
  store: Option<&S>,
  demo_admin_email: &str,
  email: &str,
  password: &str,
) -> Result<(User, Mode)> {
  let email = email.trim();
  if email.is_empty() {
    return Err(Error::InvalidCredentials);
  }

  let Some(store) = store else {
    let is_admin = email.eq_ignore_ascii_case(demo_admin_email);
    return Ok((User { email: email.to_owned(), is_admin }, Mode::Demo));
  };

  let account = store
    .find_user(email)
    .await
    .map_err(|e| Error::Store(Box::new(e)))?
    .ok_or(Error::InvalidCredentials)?;

  if !verify_password(&account.password_hash, password) {
    return Err(Error::InvalidCredentials);
  }
  Ok((account.user(), Mode::Persistent))
}
