//! Human-facing enrollment ids: `MSI-{initials}-{YYYYMM}-{seq:03}`.
//!
//! The sequence is one more than the number of ids already minted from the
//! same base. With no store to count against (demo mode) it is a random
//! number in `1..=999` instead, which can collide. That is a degraded mode,
//! not an error.

use std::fmt;

use chrono::NaiveDate;
use rand_core::RngCore;

pub const PREFIX: &str = "MSI";

/// Upper bound of the demo-mode random sequence.
pub const RANDOM_SEQUENCE_MAX: u32 = 999;

/// `MSI-{initials}-{YYYYMM}`, shared by every id minted for the same initials
/// in the same month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdBase(String);

impl IdBase {
  /// Initials are the first letter of the first name and the last letter of
  /// the surname, uppercased. A blank name contributes `X`.
  pub fn new(first_name: &str, surname: &str, today: NaiveDate) -> Self {
    let first = first_name.trim().chars().next().unwrap_or('X');
    let last = surname.trim().chars().last().unwrap_or('X');
    let initials: String = first.to_uppercase().chain(last.to_uppercase()).collect();
    Self(format!("{PREFIX}-{initials}-{}", today.format("%Y%m")))
  }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn with_sequence(&self, sequence: usize) -> String {
    format!("{}-{sequence:03}", self.0)
  }

  /// Id following `existing` ids already minted from this base.
  pub fn counted(&self, existing: usize) -> String {
    self.with_sequence(existing.saturating_add(1))
  }

  /// Demo-mode id with a random sequence in `1..=999`.
  pub fn random<R: RngCore + ?Sized>(&self, rng: &mut R) -> String {
    let sequence = 1 + rng.next_u32() % RANDOM_SEQUENCE_MAX;
    self.with_sequence(sequence as usize)
  }
}

impl fmt::Display for IdBase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Mint an enrollment id. `existing` is the store's count of ids matching
/// `{base}-*`, or `None` when no store is available.
pub fn generate<R: RngCore + ?Sized>(
  first_name: &str,
  surname: &str,
  today: NaiveDate,
  existing: Option<usize>,
  rng: &mut R,
) -> String {
  let base = IdBase::new(first_name, surname, today);
  match existing {
    Some(count) => base.counted(count),
    None => base.random(rng),
  }
}
