//! Reference data: the static Region/State/LGA hierarchy plus the
//! enumerated facility dimensions used to populate and validate the form.
//!
//! Parsing the reference file is the job of `msi-csv`; this module owns the
//! cleaning rules (drop incomplete rows, deduplicate, sort) so every loader
//! produces the same [`ReferenceData`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::cascade;

// ─── Rows ────────────────────────────────────────────────────────────────────

/// A row exactly as read from the reference sheet; any cell may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawReferenceRow {
  pub region:         Option<String>,
  pub state:          Option<String>,
  pub lga:            Option<String>,
  pub cost_centre:    Option<String>,
  pub facility_type:  Option<String>,
  pub provider_cadre: Option<String>,
}

/// A cleaned reference row. Region, State and LGA are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRow {
  pub region:         String,
  pub state:          String,
  pub lga:            String,
  pub cost_centre:    Option<String>,
  pub facility_type:  Option<String>,
  pub provider_cadre: Option<String>,
}

impl ReferenceRow {
  /// Trim every cell and drop the row if Region, State or LGA is missing.
  fn clean(raw: RawReferenceRow) -> Option<Self> {
    Some(Self {
      region:         present(raw.region)?,
      state:          present(raw.state)?,
      lga:            present(raw.lga)?,
      cost_centre:    present(raw.cost_centre),
      facility_type:  present(raw.facility_type),
      provider_cadre: present(raw.provider_cadre),
    })
  }
}

fn present(cell: Option<String>) -> Option<String> {
  cell
    .map(|s| s.trim().to_owned())
    .filter(|s| !s.is_empty())
}

/// Deduplicate and sort lexicographically.
pub(crate) fn sorted_distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
  values
    .collect::<BTreeSet<_>>()
    .into_iter()
    .map(str::to_owned)
    .collect()
}

// ─── ReferenceData ───────────────────────────────────────────────────────────

/// The in-memory reference table and its sorted dropdown dimensions.
///
/// Built once at startup and shared read-only for the life of the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceData {
  table:           Vec<ReferenceRow>,
  cost_centres:    Vec<String>,
  facility_types:  Vec<String>,
  provider_cadres: Vec<String>,
}

impl ReferenceData {
  pub fn from_rows(rows: impl IntoIterator<Item = RawReferenceRow>) -> Self {
    let table: Vec<ReferenceRow> =
      rows.into_iter().filter_map(ReferenceRow::clean).collect();

    let cost_centres =
      sorted_distinct(table.iter().filter_map(|r| r.cost_centre.as_deref()));
    let facility_types =
      sorted_distinct(table.iter().filter_map(|r| r.facility_type.as_deref()));
    let provider_cadres =
      sorted_distinct(table.iter().filter_map(|r| r.provider_cadre.as_deref()));

    Self { table, cost_centres, facility_types, provider_cadres }
  }

  pub fn table(&self) -> &[ReferenceRow] { &self.table }

  pub fn cost_centres(&self) -> &[String] { &self.cost_centres }

  pub fn facility_types(&self) -> &[String] { &self.facility_types }

  pub fn provider_cadres(&self) -> &[String] { &self.provider_cadres }

  pub fn is_empty(&self) -> bool { self.table.is_empty() }

  pub fn regions(&self) -> Vec<String> { cascade::regions(&self.table) }

  pub fn states_for(&self, region: &str) -> Vec<String> {
    cascade::states_for(&self.table, region)
  }

  pub fn lgas_for(&self, region: &str, state: &str) -> Vec<String> {
    cascade::lgas_for(&self.table, region, state)
  }

  /// Whether `(region, state, lga)` is a row of the hierarchy.
  pub fn contains_location(&self, region: &str, state: &str, lga: &str) -> bool {
    self
      .table
      .iter()
      .any(|r| r.region == region && r.state == state && r.lga == lga)
  }

  /// Places where the data breaks the strict Region → State → LGA hierarchy.
  ///
  /// The cascade still works on such data (it only ever filters), so these
  /// are reported rather than rejected.
  pub fn hierarchy_conflicts(&self) -> Vec<HierarchyConflict> {
    let mut regions_by_state: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut states_by_lga: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for row in &self.table {
      regions_by_state.entry(&row.state).or_default().insert(&row.region);
      states_by_lga.entry(&row.lga).or_default().insert(&row.state);
    }

    let states = regions_by_state
      .into_iter()
      .filter(|(_, parents)| parents.len() > 1)
      .map(|(state, parents)| HierarchyConflict::StateInManyRegions {
        state:   state.to_owned(),
        regions: parents.into_iter().map(str::to_owned).collect(),
      });
    let lgas = states_by_lga
      .into_iter()
      .filter(|(_, parents)| parents.len() > 1)
      .map(|(lga, parents)| HierarchyConflict::LgaInManyStates {
        lga:    lga.to_owned(),
        states: parents.into_iter().map(str::to_owned).collect(),
      });

    states.chain(lgas).collect()
  }
}

/// A violation of the strict hierarchy invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HierarchyConflict {
  StateInManyRegions { state: String, regions: Vec<String> },
  /// LGAs are keyed by bare name, and several Nigerian states share LGA names
  /// (Surulere, Obi, Nasarawa), so this is usually not a data error.
  LgaInManyStates { lga: String, states: Vec<String> },
}

impl HierarchyConflict {
  /// Whether the conflict points at a likely error in the sheet.
  pub fn is_warning(&self) -> bool { matches!(self, Self::StateInManyRegions { .. }) }
}
