//! SQLite backend for the MSI enrollment portal.
//!
//! One database file holds the `users` and `enrollments` tables and the
//! `objects` table standing in for the document bucket. Access goes through
//! [`tokio_rusqlite`] so queries never block the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
