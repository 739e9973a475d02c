// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Regulatory profile of a site
//!
//! The zoning attributes a data provider attaches to a parcel. Ratios are
//! percentages, lengths are meters.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Land use district
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneCategory {
    Category1LowRiseResidential,
    Category2LowRiseResidential,
    RuralResidential,
    Category1MidHighRiseResidential,
    Category2MidHighRiseResidential,
    Category1Residential,
    Category2Residential,
    QuasiResidential,
    NeighborhoodCommercial,
    Commercial,
    QuasiIndustrial,
    Industrial,
    ExclusiveIndustrial,
    Unzoned,
}

impl ZoneCategory {
    /// Low-rise exclusive districts carry a default absolute height cap
    pub fn is_low_rise_exclusive(self) -> bool {
        matches!(
            self,
            Self::Category1LowRiseResidential
                | Self::Category2LowRiseResidential
                | Self::RuralResidential
        )
    }

    pub fn is_residential(self) -> bool {
        matches!(
            self,
            Self::Category1LowRiseResidential
                | Self::Category2LowRiseResidential
                | Self::RuralResidential
                | Self::Category1MidHighRiseResidential
                | Self::Category2MidHighRiseResidential
                | Self::Category1Residential
                | Self::Category2Residential
                | Self::QuasiResidential
        )
    }

    /// Default absolute height cap for the district, if any
    pub fn default_absolute_height(self) -> Option<f64> {
        self.is_low_rise_exclusive().then_some(10.0)
    }

    /// Rise per unit of horizontal distance of the road slant line
    pub fn road_slope_coefficient(self) -> f64 {
        if self.is_residential() {
            1.25
        } else {
            1.5
        }
    }

    /// Road-width FAR multiplier, in percent per meter of road width
    pub fn road_far_multiplier(self) -> f64 {
        if self.is_residential() {
            40.0
        } else {
            60.0
        }
    }

    /// Default shadow measurement plane height
    pub fn default_shadow_plane_height(self) -> f64 {
        if self.is_low_rise_exclusive() {
            1.5
        } else {
            4.0
        }
    }
}

/// Fire prevention district
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FireZone {
    Fire,
    QuasiFire,
    #[default]
    None,
}

/// Height district overlay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeightDistrict {
    /// North slant line rising 0.6 from 5 m
    First,
    /// North slant line rising 1.25 from 5 m, then 0.6 beyond 8 m
    Second,
    /// North slant line rising 1.25 from 10 m, then 0.6 beyond 8 m
    Third,
    /// Fixed maximum height
    Fixed { max_height: f64 },
}

impl HeightDistrict {
    /// Height allowed at `north_distance` meters from the north boundary
    pub fn limit_at(self, north_distance: f64) -> f64 {
        let d = north_distance.max(0.0);
        match self {
            Self::First => 5.0 + 0.6 * d,
            Self::Second => steep_then_gentle(5.0, d),
            Self::Third => steep_then_gentle(10.0, d),
            Self::Fixed { max_height } => max_height,
        }
    }
}

fn steep_then_gentle(base: f64, d: f64) -> f64 {
    if d <= 8.0 {
        base + 1.25 * d
    } else {
        base + 10.0 + 0.6 * (d - 8.0)
    }
}

/// Shadow regulation applying to the site
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowRegulation {
    /// Measurement plane height; defaults by zone when absent
    #[serde(default)]
    pub measurement_height: Option<f64>,
    /// Allowed hours between 5 m and 10 m from the boundary
    pub allowed_hours_near: f64,
    /// Allowed hours beyond 10 m from the boundary
    pub allowed_hours_far: f64,
}

impl ShadowRegulation {
    pub fn new(allowed_hours_near: f64, allowed_hours_far: f64) -> Self {
        Self {
            measurement_height: None,
            allowed_hours_near,
            allowed_hours_far,
        }
    }

    pub fn plane_height(&self, zone: ZoneCategory) -> f64 {
        self.measurement_height
            .unwrap_or_else(|| zone.default_shadow_plane_height())
    }
}

/// District plan overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistrictPlan {
    #[serde(default)]
    pub max_height: Option<f64>,
    /// Minimum wall setback from every boundary edge
    #[serde(default)]
    pub wall_setback: Option<f64>,
    #[serde(default)]
    pub special_rules: Vec<String>,
}

/// Site elevation relative to the front road
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainData {
    /// Positive when the site sits above the road surface
    pub elevation_above_road: f64,
}

/// Zoning attributes of a parcel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryProfile {
    pub zone: ZoneCategory,
    #[serde(default)]
    pub fire_zone: FireZone,
    /// Legal building coverage ratio, percent
    pub coverage_ratio: f64,
    /// Legal floor area ratio, percent
    pub floor_area_ratio: f64,
    #[serde(default)]
    pub absolute_height_cap: Option<f64>,
    #[serde(default)]
    pub height_district: Option<HeightDistrict>,
    #[serde(default)]
    pub shadow: Option<ShadowRegulation>,
    #[serde(default)]
    pub district_plan: Option<DistrictPlan>,
    /// Front road width in meters
    pub front_road_width: f64,
    #[serde(default)]
    pub terrain: Option<TerrainData>,
}

impl RegulatoryProfile {
    /// Profile with only the mandatory attributes set
    pub fn new(
        zone: ZoneCategory,
        coverage_ratio: f64,
        floor_area_ratio: f64,
        front_road_width: f64,
    ) -> Self {
        Self {
            zone,
            fire_zone: FireZone::None,
            coverage_ratio,
            floor_area_ratio,
            absolute_height_cap: None,
            height_district: None,
            shadow: None,
            district_plan: None,
            front_road_width,
            terrain: None,
        }
    }

    /// Reject non-positive or non-finite dimensions
    pub fn validate(&self) -> Result<()> {
        positive("coverage ratio", self.coverage_ratio)?;
        if self.coverage_ratio > 100.0 {
            return Err(Error::InvalidProfile(format!(
                "coverage ratio above 100%: {}",
                self.coverage_ratio
            )));
        }
        positive("floor area ratio", self.floor_area_ratio)?;
        positive("front road width", self.front_road_width)?;

        if let Some(cap) = self.absolute_height_cap {
            positive("absolute height cap", cap)?;
        }
        if let Some(HeightDistrict::Fixed { max_height }) = self.height_district {
            positive("height district max height", max_height)?;
        }
        if let Some(shadow) = &self.shadow {
            non_negative("allowed shadow hours (5-10 m)", shadow.allowed_hours_near)?;
            non_negative("allowed shadow hours (>10 m)", shadow.allowed_hours_far)?;
            if let Some(h) = shadow.measurement_height {
                non_negative("shadow measurement height", h)?;
            }
        }
        if let Some(plan) = &self.district_plan {
            if let Some(h) = plan.max_height {
                positive("district plan max height", h)?;
            }
            if let Some(s) = plan.wall_setback {
                non_negative("district plan wall setback", s)?;
            }
        }
        if let Some(terrain) = &self.terrain {
            if !terrain.elevation_above_road.is_finite() {
                return Err(Error::InvalidProfile(
                    "terrain elevation must be finite".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidProfile(format!("{name} must be positive, got {value}")))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidProfile(format!(
            "{name} must be non-negative, got {value}"
        )))
    }
}
