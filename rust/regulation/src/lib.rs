// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Buildable Regulation
//!
//! Zoning rules for a parcel: the regulatory profile, effective coverage and
//! floor area ratios, independent height ceilings reduced to one binding
//! limit, and a screening-grade winter-solstice shadow simulation.

pub mod error;
pub mod profile;
pub mod ratios;
pub mod resolver;
pub mod shadow;

pub use error::{Error, Result};
pub use profile::{
    DistrictPlan, FireZone, HeightDistrict, RegulatoryProfile, ShadowRegulation, TerrainData,
    ZoneCategory,
};
pub use ratios::{effective_coverage_ratio, effective_floor_area_ratio};
pub use resolver::{resolve, HeightConstraint, HeightLimitBundle, HeightLimitInput};
pub use shadow::{
    shadow_height_limit, simulate_shadow, ShadowConfig, ShadowHeatMap, ShadowHeightLimit,
    ShadowSimulationResult,
};
