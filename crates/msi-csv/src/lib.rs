//! CSV reading and writing for the MSI portal.
//!
//! - [`load_reference`] reads the "CostCentres" reference sheet.
//! - [`export_csv`] renders enrollment records for the admin download.

mod export;
mod reference;

pub mod error;

pub use error::{Error, Result};
pub use export::{EXPORT_COLUMNS, export_csv};
pub use reference::{REFERENCE_COLUMNS, SHEET_NAME, load_reference, parse_reference};
