// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Height limit resolution
//!
//! Each ceiling is computed independently from a [`HeightLimitInput`]; the
//! resolved limit is the minimum of the applicable ones. Absent constraints
//! are `None` in the bundle and count as `+∞` in the reduction.

use crate::error::{Error, Result};
use crate::profile::{HeightDistrict, RegulatoryProfile, TerrainData, ZoneCategory};
use serde::{Deserialize, Serialize};

/// Tolerance for reporting a constraint as binding
pub const BINDING_EPSILON: f64 = 1e-6;

/// Largest relaxation terrain may apply to the road slant line
pub const TERRAIN_RELAXATION_CAP: f64 = 1.15;

/// Everything the individual limit calculations read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightLimitInput {
    pub zone: ZoneCategory,
    #[serde(default)]
    pub absolute_height_cap: Option<f64>,
    pub road_width: f64,
    /// Setback of the building from the front road boundary
    #[serde(default)]
    pub road_setback: f64,
    #[serde(default)]
    pub height_district: Option<HeightDistrict>,
    /// Distance from the building to the north boundary
    #[serde(default)]
    pub north_distance: f64,
    /// Result of the shadow height search, when a shadow regulation applies
    #[serde(default)]
    pub shadow_limit: Option<f64>,
    #[serde(default)]
    pub district_plan_max: Option<f64>,
    #[serde(default)]
    pub terrain: Option<TerrainData>,
}

impl HeightLimitInput {
    /// Input carrying the profile's zoning attributes
    pub fn from_profile(
        profile: &RegulatoryProfile,
        road_width: f64,
        road_setback: f64,
        north_distance: f64,
        shadow_limit: Option<f64>,
    ) -> Self {
        Self {
            zone: profile.zone,
            absolute_height_cap: profile.absolute_height_cap,
            road_width,
            road_setback,
            height_district: profile.height_district,
            north_distance,
            shadow_limit,
            district_plan_max: profile.district_plan.as_ref().and_then(|p| p.max_height),
            terrain: profile.terrain,
        }
    }
}

/// Absolute cap: explicit value, else the zone default
pub fn absolute_limit(input: &HeightLimitInput) -> Option<f64> {
    input
        .absolute_height_cap
        .or_else(|| input.zone.default_absolute_height())
}

/// Road slant line measured from the far side of the front road
pub fn slope_limit(input: &HeightLimitInput) -> f64 {
    input.zone.road_slope_coefficient() * (input.road_width + 2.0 * input.road_setback)
}

pub fn height_district_limit(input: &HeightLimitInput) -> Option<f64> {
    input
        .height_district
        .map(|district| district.limit_at(input.north_distance))
}

/// Road slant line relaxed for a site raised above its road
///
/// Half of the elevation beyond the first meter is added, and the result
/// stays within `[slope, 1.15 × slope]`.
pub fn terrain_adjusted_limit(slope: f64, terrain: Option<&TerrainData>) -> Option<f64> {
    terrain.map(|t| {
        let relief = (t.elevation_above_road - 1.0).max(0.0) / 2.0;
        (slope + relief).clamp(slope, slope * TERRAIN_RELAXATION_CAP)
    })
}

/// Minimum over the present limits, `+∞` when none are present
pub fn reduce_limits<I>(limits: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    limits
        .into_iter()
        .flatten()
        .fold(f64::INFINITY, f64::min)
}

/// Source of a height ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightConstraint {
    Absolute,
    Slope,
    HeightDistrict,
    Shadow,
    DistrictPlan,
    TerrainAdjusted,
}

/// Every individual ceiling plus the resolved limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightLimitBundle {
    pub absolute: Option<f64>,
    pub slope: Option<f64>,
    pub height_district: Option<f64>,
    pub shadow: Option<f64>,
    pub district_plan: Option<f64>,
    pub terrain_adjusted: Option<f64>,
    /// `+∞` (serialized as `null`) when nothing limits the height
    #[serde(with = "unbounded_as_null")]
    pub final_limit: f64,
}

impl HeightLimitBundle {
    /// Bundle from individual ceilings, resolving the final limit
    pub fn from_limits(
        absolute: Option<f64>,
        slope: Option<f64>,
        height_district: Option<f64>,
        shadow: Option<f64>,
        district_plan: Option<f64>,
        terrain_adjusted: Option<f64>,
    ) -> Self {
        let mut bundle = Self {
            absolute,
            slope,
            height_district,
            shadow,
            district_plan,
            terrain_adjusted,
            final_limit: f64::INFINITY,
        };
        bundle.final_limit = reduce_limits(bundle.applicable().map(|(_, v)| Some(v)));
        bundle
    }

    pub fn limit(&self, constraint: HeightConstraint) -> Option<f64> {
        match constraint {
            HeightConstraint::Absolute => self.absolute,
            HeightConstraint::Slope => self.slope,
            HeightConstraint::HeightDistrict => self.height_district,
            HeightConstraint::Shadow => self.shadow,
            HeightConstraint::DistrictPlan => self.district_plan,
            HeightConstraint::TerrainAdjusted => self.terrain_adjusted,
        }
    }

    /// Present ceilings, in reporting order
    pub fn applicable(&self) -> impl Iterator<Item = (HeightConstraint, f64)> + '_ {
        [
            (HeightConstraint::Absolute, self.absolute),
            (HeightConstraint::Slope, self.slope),
            (HeightConstraint::HeightDistrict, self.height_district),
            (HeightConstraint::Shadow, self.shadow),
            (HeightConstraint::DistrictPlan, self.district_plan),
            (HeightConstraint::TerrainAdjusted, self.terrain_adjusted),
        ]
        .into_iter()
        .filter_map(|(c, v)| v.map(|v| (c, v)))
    }

    /// Constraints equal to the final limit within [`BINDING_EPSILON`]
    pub fn binding_constraints(&self) -> Vec<HeightConstraint> {
        if !self.final_limit.is_finite() {
            return Vec::new();
        }
        self.applicable()
            .filter(|(_, v)| (v - self.final_limit).abs() <= BINDING_EPSILON)
            .map(|(c, _)| c)
            .collect()
    }

    pub fn is_unbounded(&self) -> bool {
        self.final_limit.is_infinite()
    }
}

/// Compute every ceiling for `input` and resolve them
pub fn resolve(input: &HeightLimitInput) -> Result<HeightLimitBundle> {
    if !(input.road_width.is_finite() && input.road_width > 0.0) {
        return Err(Error::InvalidProfile(format!(
            "road width must be positive, got {}",
            input.road_width
        )));
    }
    if !(input.road_setback.is_finite() && input.road_setback >= 0.0) {
        return Err(Error::InvalidProfile(format!(
            "road setback must be non-negative, got {}",
            input.road_setback
        )));
    }

    let slope = slope_limit(input);
    let bundle = HeightLimitBundle::from_limits(
        absolute_limit(input),
        Some(slope),
        height_district_limit(input),
        input.shadow_limit.filter(|v| v.is_finite()),
        input.district_plan_max,
        terrain_adjusted_limit(slope, input.terrain.as_ref()),
    );

    tracing::debug!(
        final_limit = bundle.final_limit,
        binding = ?bundle.binding_constraints(),
        "Resolved height limits"
    );

    Ok(bundle)
}

mod unbounded_as_null {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        value.is_finite().then_some(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}
