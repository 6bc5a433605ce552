//! Storage collaborators: the `users`/`enrollments` tables and the document
//! object store.
//!
//! Implemented by storage backends (e.g. `msi-store-sqlite`). The submission
//! and retrieval operations depend only on these traits.

use std::future::Future;

use crate::{
  enrollment::{DocumentReference, EnrollmentRecord},
  enrollment_id::IdBase,
  user::UserAccount,
};

/// Bucket holding every uploaded supporting document.
pub const ENROLLMENT_BUCKET: &str = "enrollments";

/// Row filter for [`EnrollmentStore::list_enrollments`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentFilter {
  All,
  /// Only rows whose `email` column equals this address.
  SubmittedBy(String),
}

// ─── Table store ─────────────────────────────────────────────────────────────

/// Abstraction over the `users` and `enrollments` tables.
///
/// Enrollment rows are insert-only; nothing here updates or deletes one.
pub trait EnrollmentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Look up a user by email. Returns `None` if there is no such user.
  fn find_user<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<UserAccount>, Self::Error>> + Send + 'a;

  /// Insert or replace a user account.
  fn put_user(
    &self,
    account: UserAccount,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Enrollments ───────────────────────────────────────────────────────

  /// Number of enrollment ids matching `{base}-*`.
  fn count_enrollment_ids<'a>(
    &'a self,
    base: &'a IdBase,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Insert one row. Fails if the internal id or the enrollment id is taken.
  fn insert_enrollment<'a>(
    &'a self,
    record: &'a EnrollmentRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Rows matching `filter`, oldest first.
  fn list_enrollments(
    &self,
    filter: EnrollmentFilter,
  ) -> impl Future<Output = Result<Vec<EnrollmentRecord>, Self::Error>> + Send + '_;
}

// ─── Object store ────────────────────────────────────────────────────────────

/// A stored object together with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
  pub content_type: String,
  pub bytes:        Vec<u8>,
}

/// Abstraction over the bucketed object store holding supporting documents.
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Store `bytes` at `path`. Fails if the path is already taken.
  fn upload<'a>(
    &'a self,
    bucket: &'a str,
    path: &'a DocumentReference,
    bytes: Vec<u8>,
    content_type: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Delete the object at `path`. Removing a missing object is not an error.
  fn remove<'a>(
    &'a self,
    bucket: &'a str,
    path: &'a DocumentReference,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn fetch<'a>(
    &'a self,
    bucket: &'a str,
    path: &'a DocumentReference,
  ) -> impl Future<Output = Result<Option<StoredDocument>, Self::Error>> + Send + 'a;
}
