//! Error types for `msi-core`.

use std::fmt;

use thiserror::Error;

use crate::enrollment::DocumentReference;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid login")]
  InvalidCredentials,

  #[error("admin access required")]
  Forbidden,

  #[error("{value:?} is not a valid {field}")]
  NotAnOption { field: &'static str, value: String },

  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error(transparent)]
  Submission(#[from] SubmissionError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Validation ──────────────────────────────────────────────────────────────

/// One reason an enrollment form was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
  /// A required field was empty or unset.
  MissingField(&'static str),
  /// Fewer supporting documents than the minimum were attached.
  TooFewDocuments { attached: usize, required: usize },
  /// A value that must come from a fixed or reference list did not.
  UnknownValue { field: &'static str, value: String },
  /// The region/state/LGA triple does not exist in the reference data.
  InvalidLocation { region: String, state: String, lga: String },
  UnsupportedDocument { filename: String },
  EmptyDocument { filename: String },
}

impl fmt::Display for Problem {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::MissingField(field) => write!(f, "{field} is required"),
      Self::TooFewDocuments { attached, required } => write!(
        f,
        "at least {required} supporting documents are required ({attached} attached)"
      ),
      Self::UnknownValue { field, value } => {
        write!(f, "{value:?} is not a valid {field}")
      }
      Self::InvalidLocation { region, state, lga } => {
        write!(f, "{lga} / {state} / {region} is not a known location")
      }
      Self::UnsupportedDocument { filename } => {
        write!(f, "{filename} is not a pdf, jpg or png file")
      }
      Self::EmptyDocument { filename } => write!(f, "{filename} is empty"),
    }
  }
}

/// The form was incomplete or inconsistent. Recoverable: the user corrects the
/// form and submits again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
  pub problems: Vec<Problem>,
}

impl ValidationError {
  pub fn has(&self, problem: &Problem) -> bool { self.problems.contains(problem) }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(
      "please complete all required fields and upload at least 2 supporting documents",
    )?;
    for (i, problem) in self.problems.iter().enumerate() {
      f.write_str(if i == 0 { ": " } else { "; " })?;
      write!(f, "{problem}")?;
    }
    Ok(())
  }
}

// ─── Submission ──────────────────────────────────────────────────────────────

/// The step of a submission that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStage {
  /// Counting existing enrollment ids for the sequence suffix.
  IdLookup,
  /// Uploading the given document.
  Upload(DocumentReference),
  /// Inserting the enrollment row.
  Insert,
}

impl fmt::Display for SubmissionStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::IdLookup => f.write_str("enrollment id lookup"),
      Self::Upload(path) => write!(f, "upload of {path}"),
      Self::Insert => f.write_str("record insert"),
    }
  }
}

/// A storage call failed part-way through a submission.
///
/// Documents uploaded before the failure are removed again; `orphaned` lists
/// the ones whose removal also failed.
#[derive(Debug, Error)]
#[error("error submitting enrollment during {stage}: {cause}")]
pub struct SubmissionError {
  pub stage:    SubmissionStage,
  #[source]
  pub cause:    Box<dyn std::error::Error + Send + Sync>,
  pub orphaned: Vec<DocumentReference>,
}

impl SubmissionError {
  pub fn new<E>(stage: SubmissionStage, cause: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self { stage, cause: Box::new(cause), orphaned: Vec::new() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn validation_message_lists_every_problem() {
    let err = ValidationError {
      problems: vec![
        Problem::MissingField("surname"),
        Problem::TooFewDocuments { attached: 1, required: 2 },
      ],
    };
    let message = err.to_string();
    assert!(message.starts_with("please complete all required fields"));
    assert!(message.contains(": surname is required; "), "{message}");
    assert!(message.ends_with("(1 attached)"), "{message}");
  }
}
