// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building program parameters

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Intended use of the building
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    #[default]
    Residential,
    Office,
    Retail,
    Hotel,
    MixedUse,
}

impl AssetCategory {
    /// Typical share of floor area taken by corridors, cores and lobbies, percent
    pub fn typical_common_area_ratio(self) -> f64 {
        match self {
            Self::Residential => 20.0,
            Self::Office => 25.0,
            Self::Retail => 30.0,
            Self::Hotel => 35.0,
            Self::MixedUse => 25.0,
        }
    }

    /// Typical floor-to-floor height, meters
    pub fn typical_floor_height(self) -> f64 {
        match self {
            Self::Residential => 3.0,
            Self::Office => 4.0,
            Self::Retail => 4.5,
            Self::Hotel => 3.2,
            Self::MixedUse => 3.5,
        }
    }
}

/// What the owner wants to build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingProgram {
    #[serde(default)]
    pub asset_category: AssetCategory,
    /// Floor-to-floor height, meters
    pub floor_height: f64,
    /// Common area share, percent; the category's typical ratio when absent
    #[serde(default)]
    pub common_area_ratio: Option<f64>,
    /// Upper bound on the floor count
    #[serde(default)]
    pub desired_floors: Option<u32>,
    /// Replaces the profile's front road width
    #[serde(default)]
    pub road_width_override: Option<f64>,
    #[serde(default)]
    pub fire_resistant: bool,
}

impl BuildingProgram {
    /// Program with the category's typical floor height
    pub fn new(asset_category: AssetCategory) -> Self {
        Self {
            asset_category,
            floor_height: asset_category.typical_floor_height(),
            common_area_ratio: None,
            desired_floors: None,
            road_width_override: None,
            fire_resistant: false,
        }
    }

    pub fn common_area_ratio(&self) -> f64 {
        self.common_area_ratio
            .unwrap_or_else(|| self.asset_category.typical_common_area_ratio())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.floor_height.is_finite() && self.floor_height > 0.0) {
            return Err(Error::InvalidProgram(format!(
                "floor height must be positive, got {}",
                self.floor_height
            )));
        }
        let ratio = self.common_area_ratio();
        if !(0.0..100.0).contains(&ratio) {
            return Err(Error::InvalidProgram(format!(
                "common area ratio must be in [0, 100), got {ratio}"
            )));
        }
        if self.desired_floors == Some(0) {
            return Err(Error::InvalidProgram(
                "desired floor count must be at least 1".to_string(),
            ));
        }
        if let Some(width) = self.road_width_override {
            if !(width.is_finite() && width > 0.0) {
                return Err(Error::InvalidProgram(format!(
                    "road width override must be positive, got {width}"
                )));
            }
        }
        Ok(())
    }
}
