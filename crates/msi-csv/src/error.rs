//! Error type for `msi-csv`.
//!
//! Every variant raised while loading the reference sheet is fatal at
//! startup; there is no fallback reference data.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("reference file not found: {}", .0.display())]
  NotFound(PathBuf),

  #[error("reference sheet is missing required column {0:?}")]
  MissingColumn(&'static str),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
