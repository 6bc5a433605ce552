//! Core types and operations for the MSI training enrollment portal.
//!
//! No HTTP or database code lives here. Storage is reached only through the
//! traits in [`store`]; every other crate in the workspace depends on this one.

pub mod cascade;
pub mod enrollment;
pub mod enrollment_id;
pub mod error;
pub mod reference;
pub mod retrieval;
pub mod store;
pub mod submission;
pub mod user;

#[cfg(test)]
mod testing;

pub use error::{Error, Result, SubmissionError, ValidationError};
