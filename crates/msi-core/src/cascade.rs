//! The Region → State → LGA cascade.
//!
//! Every function here is a pure filter over the reference table. Callers
//! re-run them whenever an upstream selection changes; nothing is memoised.
//! An upstream value with no matching rows yields an empty list, never an
//! error. An empty dependent list means the form cannot be submitted.

use serde::Serialize;

use crate::{Error, Result, reference::{ReferenceRow, sorted_distinct}};

/// Sorted distinct regions.
pub fn regions(table: &[ReferenceRow]) -> Vec<String> {
  sorted_distinct(table.iter().map(|r| r.region.as_str()))
}

/// Sorted distinct states of rows whose region is `region`.
pub fn states_for(table: &[ReferenceRow], region: &str) -> Vec<String> {
  sorted_distinct(
    table
      .iter()
      .filter(|r| r.region == region)
      .map(|r| r.state.as_str()),
  )
}

/// Sorted distinct LGAs of rows whose region is `region` and state is `state`.
pub fn lgas_for(table: &[ReferenceRow], region: &str, state: &str) -> Vec<String> {
  sorted_distinct(
    table
      .iter()
      .filter(|r| r.region == region && r.state == state)
      .map(|r| r.lga.as_str()),
  )
}

// ─── Selection ───────────────────────────────────────────────────────────────

/// The three dependent dropdowns of the enrollment form.
///
/// Each `select_*` call recomputes the dependent option lists before it
/// returns. A downstream choice that is no longer offered falls back to the
/// first option, so the selection is always a consistent prefix of the
/// hierarchy.
#[derive(Debug, Clone, Serialize)]
pub struct CascadeSelection<'a> {
  #[serde(skip)]
  table:   &'a [ReferenceRow],
  regions: Vec<String>,
  states:  Vec<String>,
  lgas:    Vec<String>,
  region:  Option<String>,
  state:   Option<String>,
  lga:     Option<String>,
}

impl<'a> CascadeSelection<'a> {
  /// Start on the first option at every level, as a dropdown does.
  pub fn new(table: &'a [ReferenceRow]) -> Self {
    let regions = regions(table);
    let region = regions.first().cloned();
    let mut selection = Self {
      table,
      regions,
      states: Vec::new(),
      lgas: Vec::new(),
      region,
      state: None,
      lga: None,
    };
    selection.refresh_states();
    selection
  }

  pub fn select_region(&mut self, region: &str) -> Result<()> {
    self.region = Some(pick("region", &self.regions, region)?);
    self.refresh_states();
    Ok(())
  }

  pub fn select_state(&mut self, state: &str) -> Result<()> {
    self.state = Some(pick("state", &self.states, state)?);
    self.refresh_lgas();
    Ok(())
  }

  pub fn select_lga(&mut self, lga: &str) -> Result<()> {
    self.lga = Some(pick("lga", &self.lgas, lga)?);
    Ok(())
  }

  fn refresh_states(&mut self) {
    self.states = match &self.region {
      Some(region) => states_for(self.table, region),
      None => Vec::new(),
    };
    self.state = keep_or_first(self.state.take(), &self.states);
    self.refresh_lgas();
  }

  fn refresh_lgas(&mut self) {
    self.lgas = match (&self.region, &self.state) {
      (Some(region), Some(state)) => lgas_for(self.table, region, state),
      _ => Vec::new(),
    };
    self.lga = keep_or_first(self.lga.take(), &self.lgas);
  }

  pub fn regions(&self) -> &[String] { &self.regions }

  pub fn states(&self) -> &[String] { &self.states }

  pub fn lgas(&self) -> &[String] { &self.lgas }

  pub fn region(&self) -> Option<&str> { self.region.as_deref() }

  pub fn state(&self) -> Option<&str> { self.state.as_deref() }

  pub fn lga(&self) -> Option<&str> { self.lga.as_deref() }

  /// True only when every level has a selection.
  pub fn is_submittable(&self) -> bool {
    self.region.is_some() && self.state.is_some() && self.lga.is_some()
  }
}

fn pick(field: &'static str, options: &[String], value: &str) -> Result<String> {
  options
    .iter()
    .find(|o| o.as_str() == value)
    .cloned()
    .ok_or_else(|| Error::NotAnOption { field, value: value.to_owned() })
}

fn keep_or_first(current: Option<String>, options: &[String]) -> Option<String> {
  current
    .filter(|c| options.contains(c))
    .or_else(|| options.first().cloned())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn row(region: &str, state: &str, lga: &str) -> ReferenceRow {
    ReferenceRow {
      region:         region.into(),
      state:          state.into(),
      lga:            lga.into(),
      cost_centre:    None,
      facility_type:  None,
      provider_cadre: None,
    }
  }

  fn table() -> Vec<ReferenceRow> {
    vec![
      row("South West", "Oyo", "Ibadan North"),
      row("South West", "Lagos", "Surulere"),
      row("South West", "Lagos", "Ikeja"),
      row("South West", "Lagos", "Ikeja"),
      row("North Central", "Kwara", "Ilorin West"),
      row("North Central", "Kwara", "Asa"),
    ]
  }

  #[test]
  fn states_are_filtered_distinct_and_sorted() {
    let t = table();
    assert_eq!(states_for(&t, "South West"), ["Lagos", "Oyo"]);
    assert_eq!(states_for(&t, "North Central"), ["Kwara"]);
  }

  #[test]
  fn lgas_require_matching_region_and_state() {
    let t = table();
    assert_eq!(lgas_for(&t, "South West", "Lagos"), ["Ikeja", "Surulere"]);
    assert!(lgas_for(&t, "North Central", "Lagos").is_empty());
  }

  #[test]
  fn unknown_upstream_yields_empty_not_error() {
    let t = table();
    assert!(states_for(&t, "Atlantis").is_empty());
    assert!(lgas_for(&t, "Atlantis", "Nowhere").is_empty());
    assert!(states_for(&[], "South West").is_empty());
    assert!(regions(&[]).is_empty());
  }

  #[test]
  fn selection_starts_on_first_options() {
    let t = table();
    let sel = CascadeSelection::new(&t);
    assert_eq!(sel.region(), Some("North Central"));
    assert_eq!(sel.state(), Some("Kwara"));
    assert_eq!(sel.lga(), Some("Asa"));
    assert!(sel.is_submittable());
  }

  #[test]
  fn changing_region_resets_inconsistent_state_and_lga() {
    let t = table();
    let mut sel = CascadeSelection::new(&t);
    sel.select_region("South West").unwrap();
    sel.select_state("Oyo").unwrap();
    assert_eq!(sel.lga(), Some("Ibadan North"));

    sel.select_region("North Central").unwrap();
    assert_eq!(sel.states(), ["Kwara"]);
    assert_eq!(sel.state(), Some("Kwara"));
    assert_eq!(sel.lgas(), ["Asa", "Ilorin West"]);
    assert_eq!(sel.lga(), Some("Asa"));
  }

  #[test]
  fn reselecting_same_region_keeps_downstream_choice() {
    let t = table();
    let mut sel = CascadeSelection::new(&t);
    sel.select_region("South West").unwrap();
    sel.select_state("Lagos").unwrap();
    sel.select_lga("Surulere").unwrap();
    sel.select_region("South West").unwrap();
    assert_eq!(sel.state(), Some("Lagos"));
    assert_eq!(sel.lga(), Some("Surulere"));
  }

  #[test]
  fn selecting_a_value_not_offered_is_rejected() {
    let t = table();
    let mut sel = CascadeSelection::new(&t);
    let err = sel.select_state("Lagos").unwrap_err();
    assert!(matches!(err, Error::NotAnOption { field: "state", .. }));
    assert_eq!(sel.state(), Some("Kwara"));
  }

  #[test]
  fn empty_table_is_not_submittable() {
    let sel = CascadeSelection::new(&[]);
    assert!(sel.regions().is_empty());
    assert!(!sel.is_submittable());
  }
}
