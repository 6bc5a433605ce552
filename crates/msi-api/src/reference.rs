//! Handlers for `/reference` endpoints: the dropdown option lists.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/reference` | Regions, reference dimensions and fixed options |
//! | `GET`  | `/reference/states` | `?region=` |
//! | `GET`  | `/reference/lgas` | `?region=&state=` |
//! | `GET`  | `/reference/cascade` | `?region=&state=&lga=`; 400 on an unknown value |

use axum::{
  Json,
  extract::{Query, State},
};
use msi_core::{
  cascade::CascadeSelection,
  enrollment::{channel_options, gender_options, training_type_options},
  store::{DocumentStore, EnrollmentStore},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct ReferenceOptions<'a> {
  pub regions:         Vec<String>,
  pub cost_centres:    &'a [String],
  pub facility_types:  &'a [String],
  pub provider_cadres: &'a [String],
  pub channels:        &'static [&'static str],
  pub genders:         &'static [&'static str],
  pub training_types:  &'static [&'static str],
}

/// `GET /reference`
pub async fn options<S>(State(state): State<AppState<S>>) -> Json<Value>
where
  S: EnrollmentStore + DocumentStore + 'static,
{
  let reference = &state.reference;
  let options = ReferenceOptions {
    regions:         reference.regions(),
    cost_centres:    reference.cost_centres(),
    facility_types:  reference.facility_types(),
    provider_cadres: reference.provider_cadres(),
    channels:        channel_options(),
    genders:         gender_options(),
    training_types:  training_type_options(),
  };
  Json(json!(options))
}

#[derive(Debug, Deserialize, Default)]
pub struct CascadeParams {
  pub region: Option<String>,
  pub state:  Option<String>,
  pub lga:    Option<String>,
}

/// `GET /reference/states?region=`
pub async fn states<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<CascadeParams>,
) -> Json<Vec<String>>
where
  S: EnrollmentStore + DocumentStore + 'static,
{
  let region = params.region.unwrap_or_default();
  Json(state.reference.states_for(&region))
}

/// `GET /reference/lgas?region=&state=`
pub async fn lgas<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<CascadeParams>,
) -> Json<Vec<String>>
where
  S: EnrollmentStore + DocumentStore + 'static,
{
  let region = params.region.unwrap_or_default();
  let st = params.state.unwrap_or_default();
  Json(state.reference.lgas_for(&region, &st))
}

/// `GET /reference/cascade[?region=...][&state=...][&lga=...]`
///
/// Applies each given selection in order, as the form would, and returns the
/// resulting choices with their option lists.
pub async fn cascade<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<CascadeParams>,
) -> Result<Json<Value>, ApiError>
where
  S: EnrollmentStore + DocumentStore + 'static,
{
  let mut selection = CascadeSelection::new(state.reference.table());
  if let Some(region) = &params.region {
    selection.select_region(region)?;
  }
  if let Some(st) = &params.state {
    selection.select_state(st)?;
  }
  if let Some(lga) = &params.lga {
    selection.select_lga(lga)?;
  }
  let submittable = selection.is_submittable();
  Ok(Json(json!({ "selection": selection, "submittable": submittable })))
}
