//! In-memory store with failure injection, shared by the unit tests.

use std::{
  collections::BTreeMap,
  sync::{Mutex, MutexGuard},
};

use chrono::Utc;
use thiserror::Error;

use crate::{
  enrollment::{DocumentReference, EnrollmentRecord},
  enrollment_id::IdBase,
  store::{DocumentStore, EnrollmentFilter, EnrollmentStore, StoredDocument},
  user::{Mode, Session, User, UserAccount},
};

#[derive(Debug, Error)]
#[error("memory store: {0}")]
pub struct MemoryError(&'static str);

#[derive(Default)]
struct State {
  users:        Vec<UserAccount>,
  records:      Vec<EnrollmentRecord>,
  objects:      BTreeMap<(String, String), StoredDocument>,
  upload_calls: usize,
}

#[derive(Default)]
pub struct MemoryStore {
  /// Fail the n-th (1-based) upload call.
  pub fail_upload_at: Option<usize>,
  pub fail_insert:    bool,
  pub fail_remove:    bool,
  pub fail_list:      bool,
  pub(crate) state:   Mutex<State>,
}

impl MemoryStore {
  fn state(&self) -> MutexGuard<'_, State> { self.state.lock().unwrap() }

  pub fn records(&self) -> Vec<EnrollmentRecord> { self.state().records.clone() }

  pub fn upload_calls(&self) -> usize { self.state().upload_calls }

  pub fn object_paths(&self) -> Vec<String> {
    self.state().objects.keys().map(|(_, path)| path.clone()).collect()
  }
}

impl EnrollmentStore for MemoryStore {
  type Error = MemoryError;

  async fn find_user(&self, email: &str) -> Result<Option<UserAccount>, MemoryError> {
    Ok(self.state().users.iter().find(|u| u.email == email).cloned())
  }

  async fn put_user(&self, account: UserAccount) -> Result<(), MemoryError> {
    let mut state = self.state();
    state.users.retain(|u| u.email != account.email);
    state.users.push(account);
    Ok(())
  }

  async fn count_enrollment_ids(&self, base: &IdBase) -> Result<usize, MemoryError> {
    let prefix = format!("{base}-");
    Ok(
      self
        .state()
        .records
        .iter()
        .filter(|r| r.enrollment_id.starts_with(&prefix))
        .count(),
    )
  }

  async fn insert_enrollment(&self, record: &EnrollmentRecord) -> Result<(), MemoryError> {
    if self.fail_insert {
      return Err(MemoryError("insert refused"));
    }
    self.state().records.push(record.clone());
    Ok(())
  }

  async fn list_enrollments(
    &self,
    filter: EnrollmentFilter,
  ) -> Result<Vec<EnrollmentRecord>, MemoryError> {
    if self.fail_list {
      return Err(MemoryError("select refused"));
    }
    let records = self.state().records.clone();
    Ok(match filter {
      EnrollmentFilter::All => records,
      EnrollmentFilter::SubmittedBy(email) => {
        records.into_iter().filter(|r| r.email == email).collect()
      }
    })
  }
}

impl DocumentStore for MemoryStore {
  type Error = MemoryError;

  async fn upload(
    &self,
    bucket: &str,
    path: &DocumentReference,
    bytes: Vec<u8>,
    content_type: &str,
  ) -> Result<(), MemoryError> {
    let mut state = self.state();
    state.upload_calls += 1;
    if self.fail_upload_at == Some(state.upload_calls) {
      return Err(MemoryError("upload refused"));
    }
    let document = StoredDocument { content_type: content_type.to_owned(), bytes };
    state
      .objects
      .insert((bucket.to_owned(), path.as_str().to_owned()), document);
    Ok(())
  }

  async fn remove(&self, bucket: &str, path: &DocumentReference) -> Result<(), MemoryError> {
    if self.fail_remove {
      return Err(MemoryError("remove refused"));
    }
    self
      .state()
      .objects
      .remove(&(bucket.to_owned(), path.as_str().to_owned()));
    Ok(())
  }

  async fn fetch(
    &self,
    bucket: &str,
    path: &DocumentReference,
  ) -> Result<Option<StoredDocument>, MemoryError> {
    Ok(
      self
        .state()
        .objects
        .get(&(bucket.to_owned(), path.as_str().to_owned()))
        .cloned(),
    )
  }
}

pub fn session(email: &str) -> Session {
  Session {
    token:      "test-token".into(),
    user:       User { email: email.into(), is_admin: false },
    mode:       Mode::Persistent,
    started_at: Utc::now(),
  }
}

pub fn admin_session() -> Session {
  let mut s = session("admin@msi.org");
  s.user.is_admin = true;
  s
}
