//! [`SqliteStore`]: the SQLite implementation of [`EnrollmentStore`] and
//! [`DocumentStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tracing::debug;

use msi_core::{
  enrollment::{DocumentReference, EnrollmentRecord},
  enrollment_id::IdBase,
  store::{DocumentStore, EnrollmentFilter, EnrollmentStore, StoredDocument},
  user::UserAccount,
};

use crate::{
  Error, Result,
  encode::{ENROLLMENT_COLUMNS, RawEnrollment, RawUser, encode_dt, escape_like},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Users, enrollments and documents in a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── EnrollmentStore impl ────────────────────────────────────────────────────

impl EnrollmentStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn find_user(&self, email: &str) -> Result<Option<UserAccount>> {
    let email = email.to_owned();
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT email, password, is_admin FROM users WHERE email = ?1",
            rusqlite::params![email],
            |row| {
              Ok(RawUser {
                email:    row.get(0)?,
                password: row.get(1)?,
                is_admin: row.get(2)?,
              })
            },
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    Ok(raw.map(RawUser::into_account))
  }

  async fn put_user(&self, account: UserAccount) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (email, password, is_admin) VALUES (?1, ?2, ?3)
           ON CONFLICT (email) DO UPDATE
             SET password = excluded.password, is_admin = excluded.is_admin",
          rusqlite::params![account.email, account.password_hash, account.is_admin],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Enrollments ───────────────────────────────────────────────────────────

  async fn count_enrollment_ids(&self, base: &IdBase) -> Result<usize> {
    let pattern = format!("{}-%", escape_like(base.as_str()));
    let count: i64 = self
      .conn
      .call(move |conn| {
        let count = conn.query_row(
          "SELECT COUNT(*) FROM enrollments WHERE enrollment_id LIKE ?1 ESCAPE '\\'",
          rusqlite::params![pattern],
          |row| row.get(0),
        )?;
        Ok(count)
      })
      .await?;
    Ok(usize::try_from(count).unwrap_or_default())
  }

  async fn insert_enrollment(&self, record: &EnrollmentRecord) -> Result<()> {
    let raw = RawEnrollment::encode(record)?;
    debug!(enrollment_id = %raw.enrollment_id, "inserting enrollment");

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO enrollments ({ENROLLMENT_COLUMNS}) VALUES
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
              ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
          ),
          rusqlite::params![
            raw.id,
            raw.enrollment_id,
            raw.first_name,
            raw.surname,
            raw.phone_number,
            raw.channel,
            raw.region,
            raw.state,
            raw.lga,
            raw.cost_centre,
            raw.facility_type,
            raw.provider_cadre,
            raw.provider_gender,
            raw.training_type,
            raw.training_date,
            raw.email,
            raw.status,
            raw.created_at,
            raw.supporting_documents,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_enrollments(&self, filter: EnrollmentFilter) -> Result<Vec<EnrollmentRecord>> {
    let raws: Vec<RawEnrollment> = self
      .conn
      .call(move |conn| {
        let rows = match filter {
          EnrollmentFilter::All => {
            let mut stmt = conn.prepare(&format!(
              "SELECT {ENROLLMENT_COLUMNS} FROM enrollments ORDER BY created_at, rowid"
            ))?;
            stmt
              .query_map([], RawEnrollment::from_row)?
              .collect::<rusqlite::Result<Vec<_>>>()?
          }
          EnrollmentFilter::SubmittedBy(email) => {
            let mut stmt = conn.prepare(&format!(
              "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE email = ?1
               ORDER BY created_at, rowid"
            ))?;
            stmt
              .query_map(rusqlite::params![email], RawEnrollment::from_row)?
              .collect::<rusqlite::Result<Vec<_>>>()?
          }
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEnrollment::into_record).collect()
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  async fn upload(
    &self,
    bucket: &str,
    path: &DocumentReference,
    bytes: Vec<u8>,
    content_type: &str,
  ) -> Result<()> {
    let bucket = bucket.to_owned();
    let path = path.as_str().to_owned();
    let content_type = content_type.to_owned();
    let uploaded_at = encode_dt(Utc::now());
    debug!(%bucket, %path, size = bytes.len(), "uploading object");

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO objects (bucket, path, content_type, bytes, uploaded_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![bucket, path, content_type, bytes, uploaded_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn remove(&self, bucket: &str, path: &DocumentReference) -> Result<()> {
    let bucket = bucket.to_owned();
    let path = path.as_str().to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM objects WHERE bucket = ?1 AND path = ?2",
          rusqlite::params![bucket, path],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn fetch(
    &self,
    bucket: &str,
    path: &DocumentReference,
  ) -> Result<Option<StoredDocument>> {
    let bucket = bucket.to_owned();
    let path = path.as_str().to_owned();

    let doc = self
      .conn
      .call(move |conn| {
        let doc = conn
          .query_row(
            "SELECT content_type, bytes FROM objects WHERE bucket = ?1 AND path = ?2",
            rusqlite::params![bucket, path],
            |row| {
              Ok(StoredDocument {
                content_type: row.get(0)?,
                bytes:        row.get(1)?,
              })
            },
          )
          .optional()?;
        Ok(doc)
      })
      .await?;
    Ok(doc)
  }
}
