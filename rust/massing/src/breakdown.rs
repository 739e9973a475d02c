// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor area breakdown and compliance summary

use crate::generator::MassingResult;
use buildable_regulation::{HeightLimitBundle, ShadowSimulationResult};
use serde::{Deserialize, Serialize};

/// Planned values this close above the regulation still comply
const COMPLIANCE_EPSILON: f64 = 1e-6;

/// Private and common area of one floor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorBreakdown {
    pub level: u32,
    pub floor_area: f64,
    pub private_area: f64,
    pub common_area: f64,
}

impl FloorBreakdown {
    /// Split a floor by a common area ratio given in percent
    pub fn split(level: u32, floor_area: f64, common_area_ratio: f64) -> Self {
        let common_area = floor_area * common_area_ratio / 100.0;
        Self {
            level,
            floor_area,
            private_area: floor_area - common_area,
            common_area,
        }
    }
}

/// Regulation checked in a compliance row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceItem {
    CoverageRatio,
    FloorAreaRatio,
    Height,
    HeightDistrict,
    DistrictPlan,
    Shadow,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRow {
    pub item: ComplianceItem,
    /// `None` when the regulation does not apply to the site
    pub regulation_value: Option<f64>,
    pub planned_value: f64,
    pub compliant: bool,
}

impl ComplianceRow {
    fn at_most(item: ComplianceItem, regulation_value: Option<f64>, planned_value: f64) -> Self {
        let compliant = regulation_value
            .map_or(true, |limit| planned_value <= limit + COMPLIANCE_EPSILON);
        Self {
            item,
            regulation_value,
            planned_value,
            compliant,
        }
    }
}

/// Regulation values the massing is checked against
#[derive(Debug, Clone, Copy)]
pub struct ComplianceContext<'a> {
    pub site_area: f64,
    /// Effective coverage ratio, percent
    pub coverage_ratio: f64,
    /// Effective floor area ratio, percent
    pub floor_area_ratio: f64,
    pub height_limits: &'a HeightLimitBundle,
    pub shadow: Option<&'a ShadowSimulationResult>,
}

/// Floor areas of a massing split into private and common space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeBreakdown {
    pub floors: Vec<FloorBreakdown>,
    pub total_floor_area: f64,
    pub total_private_area: f64,
    pub total_common_area: f64,
    /// Realized floor area as a percentage of the volume cap
    pub consumption_rate: f64,
    pub compliance: Vec<ComplianceRow>,
}

impl VolumeBreakdown {
    pub fn is_compliant(&self) -> bool {
        self.compliance.iter().all(|row| row.compliant)
    }
}

/// Per-floor split, consumption rate and compliance rows
pub fn compute_breakdown(
    massing: &MassingResult,
    common_area_ratio: f64,
    context: &ComplianceContext<'_>,
) -> VolumeBreakdown {
    let floors: Vec<FloorBreakdown> = massing
        .floors
        .iter()
        .map(|floor| FloorBreakdown::split(floor.level, floor.area, common_area_ratio))
        .collect();

    let total_floor_area: f64 = floors.iter().map(|f| f.floor_area).sum();
    let total_private_area: f64 = floors.iter().map(|f| f.private_area).sum();
    let total_common_area: f64 = floors.iter().map(|f| f.common_area).sum();

    let consumption_rate = if massing.volume_cap > 0.0 {
        total_floor_area / massing.volume_cap * 100.0
    } else {
        0.0
    };

    VolumeBreakdown {
        floors,
        total_floor_area,
        total_private_area,
        total_common_area,
        consumption_rate,
        compliance: compliance_rows(massing, context),
    }
}

/// One row per checked regulation, in a fixed order
pub fn compliance_rows(massing: &MassingResult, context: &ComplianceContext<'_>) -> Vec<ComplianceRow> {
    let percent_of_site = |area: f64| {
        if context.site_area > 0.0 {
            area / context.site_area * 100.0
        } else {
            0.0
        }
    };
    let limits = context.height_limits;
    let final_limit = limits.final_limit.is_finite().then_some(limits.final_limit);

    let shadow = match context.shadow {
        Some(result) => ComplianceRow {
            item: ComplianceItem::Shadow,
            regulation_value: Some(result.allowed_hours_near),
            planned_value: result.max_shadow_hours,
            compliant: result.compliant,
        },
        None => ComplianceRow::at_most(ComplianceItem::Shadow, None, 0.0),
    };

    vec![
        ComplianceRow::at_most(
            ComplianceItem::CoverageRatio,
            Some(context.coverage_ratio),
            percent_of_site(massing.footprint_area),
        ),
        ComplianceRow::at_most(
            ComplianceItem::FloorAreaRatio,
            Some(context.floor_area_ratio),
            percent_of_site(massing.total_floor_area),
        ),
        ComplianceRow::at_most(ComplianceItem::Height, final_limit, massing.height),
        ComplianceRow::at_most(
            ComplianceItem::HeightDistrict,
            limits.height_district,
            massing.height,
        ),
        ComplianceRow::at_most(
            ComplianceItem::DistrictPlan,
            limits.district_plan,
            massing.height,
        ),
        shadow,
    ]
}
