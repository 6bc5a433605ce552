//! Loading the "CostCentres" reference sheet.
//!
//! The sheet is read as a CSV export with a header row. Columns are located
//! by name, so their order and any extra columns do not matter.

use std::{
  fs::File,
  io::Read,
  path::{Path, PathBuf},
};

use msi_core::reference::{RawReferenceRow, ReferenceData};
use tracing::debug;

use crate::{Error, Result};

/// Name of the reference sheet; a directory path resolves to `{SHEET_NAME}.csv`.
pub const SHEET_NAME: &str = "CostCentres";

/// Header names that must be present, in sheet order.
pub const REFERENCE_COLUMNS: [&str; 6] =
  ["Region", "State", "LGA", "CostCentre", "Facility Type", "Provider Cadre"];

/// Load the reference sheet at `path`.
///
/// `path` may name the CSV file itself or a directory containing
/// `CostCentres.csv`.
pub fn load_reference(path: &Path) -> Result<ReferenceData> {
  let file_path: PathBuf = if path.is_dir() {
    path.join(format!("{SHEET_NAME}.csv"))
  } else {
    path.to_path_buf()
  };
  if !file_path.is_file() {
    return Err(Error::NotFound(file_path));
  }
  let data = parse_reference(File::open(&file_path)?)?;
  debug!(path = %file_path.display(), rows = data.table().len(), "loaded reference sheet");
  Ok(data)
}

/// Parse reference rows from CSV text.
pub fn parse_reference<R: Read>(input: R) -> Result<ReferenceData> {
  let mut reader = csv::ReaderBuilder::new()
    .flexible(true)
    .trim(csv::Trim::All)
    .from_reader(input);

  let headers = reader.headers()?.clone();
  let mut positions = [0usize; REFERENCE_COLUMNS.len()];
  for (slot, name) in positions.iter_mut().zip(REFERENCE_COLUMNS) {
    *slot = headers
      .iter()
      .position(|h| h.eq_ignore_ascii_case(name))
      .ok_or(Error::MissingColumn(name))?;
  }

  let mut rows = Vec::new();
  for record in reader.records() {
    let record = record?;
    let cell = |i: usize| record.get(positions[i]).map(str::to_owned);
    rows.push(RawReferenceRow {
      region:         cell(0),
      state:          cell(1),
      lga:            cell(2),
      cost_centre:    cell(3),
      facility_type:  cell(4),
      provider_cadre: cell(5),
    });
  }

  Ok(ReferenceData::from_rows(rows))
}
