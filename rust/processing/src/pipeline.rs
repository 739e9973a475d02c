// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Buildable-volume study pipeline
//!
//! classify → setbacks → footprint → shadow limit → height limits → floors
//! → breakdown → (optional) financials. Every stage is a pure function of
//! the request and configuration.

use crate::error::Result;
use buildable_finance::{evaluate, FinancialResult, IrrConfig, ProfitabilityRequest};
use buildable_geometry::{
    classify_boundary, classify_with_roads, BoundaryClassification, ClassificationConfidence,
    SitePolygon,
};
use buildable_massing::{
    compute_breakdown, edge_setbacks, north_setback, plan_footprint, road_setback, stack_floors,
    BuildingProgram, ComplianceContext, MassingResult, SetbackRules, TighteningConfig,
    VolumeBreakdown,
};
use buildable_regulation::{
    effective_coverage_ratio, effective_floor_area_ratio, resolve, shadow_height_limit,
    simulate_shadow, HeightLimitBundle, HeightLimitInput, RegulatoryProfile, ShadowConfig,
    ShadowHeightLimit, ShadowSimulationResult,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Tunables shared by every study
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    pub setbacks: SetbackRules,
    pub tightening: TighteningConfig,
    pub shadow: ShadowConfig,
    pub irr: IrrConfig,
}

/// One parcel to study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyRequest {
    pub site: SitePolygon,
    pub profile: RegulatoryProfile,
    pub program: BuildingProgram,
    /// Surveyed road edges; the longest-edge heuristic applies when absent
    #[serde(default)]
    pub road_edges: Option<Vec<usize>>,
    #[serde(default)]
    pub profitability: Option<ProfitabilityRequest>,
}

/// Shadow height search and the simulation at the final height
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowReport {
    pub height_limit: ShadowHeightLimit,
    pub simulation: ShadowSimulationResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyReport {
    pub site_id: String,
    pub classification: BoundaryClassification,
    /// Percent, after corner-lot and fire-zone relaxations
    pub effective_coverage_ratio: f64,
    /// Percent, after the front-road reduction
    pub effective_floor_area_ratio: f64,
    pub height_limits: HeightLimitBundle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<ShadowReport>,
    pub massing: MassingResult,
    pub breakdown: VolumeBreakdown,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financials: Option<FinancialResult>,
}

/// Run the full study for one parcel
pub fn run_study(request: &StudyRequest, config: &StudyConfig) -> Result<StudyReport> {
    let start = Instant::now();
    let site = &request.site;
    let profile = &request.profile;
    let program = &request.program;

    profile.validate()?;
    program.validate()?;

    let road_width = program
        .road_width_override
        .unwrap_or(profile.front_road_width);

    let classification = match &request.road_edges {
        Some(edges) => classify_with_roads(site.points(), road_width, edges)?,
        None => classify_boundary(site.points(), road_width)?,
    };
    if classification.confidence == ClassificationConfidence::Ambiguous {
        tracing::warn!(
            site_id = %site.site_id,
            ambiguous_edges = ?classification.ambiguous_edges,
            "Road frontage is ambiguous, supply surveyed road edges to confirm"
        );
    }

    let coverage =
        effective_coverage_ratio(profile, classification.configuration, program.fire_resistant);
    let far = effective_floor_area_ratio(profile, road_width);
    let volume_cap = site.area() * far / 100.0;

    let wall_setback = profile.district_plan.as_ref().and_then(|p| p.wall_setback);
    let setbacks = edge_setbacks(&classification, &config.setbacks, wall_setback);
    let plan = plan_footprint(site, &setbacks, coverage, volume_cap, &config.tightening)?;

    let shadow_limit = profile
        .shadow
        .as_ref()
        .map(|regulation| {
            shadow_height_limit(
                site.points(),
                &plan.footprint,
                regulation,
                profile.zone,
                &config.shadow,
            )
        })
        .transpose()?;

    let input = HeightLimitInput::from_profile(
        profile,
        road_width,
        road_setback(&plan.setbacks).unwrap_or(0.0),
        north_setback(site.points(), &plan.setbacks).unwrap_or(0.0),
        shadow_limit.map(|limit| limit.as_limit()),
    );
    let height_limits = resolve(&input)?;

    let massing = stack_floors(
        &site.site_id,
        &plan,
        volume_cap,
        height_limits.final_limit,
        program,
    )?;

    let shadow = match (&profile.shadow, shadow_limit) {
        (Some(regulation), Some(height_limit)) => {
            let simulation = simulate_shadow(
                site.points(),
                &plan.footprint,
                massing.height,
                regulation,
                profile.zone,
                &config.shadow,
            )?;
            Some(ShadowReport {
                height_limit,
                simulation,
            })
        }
        _ => None,
    };

    let context = ComplianceContext {
        site_area: site.area(),
        coverage_ratio: coverage,
        floor_area_ratio: far,
        height_limits: &height_limits,
        shadow: shadow.as_ref().map(|s| &s.simulation),
    };
    let breakdown = compute_breakdown(&massing, program.common_area_ratio(), &context);

    let financials = request
        .profitability
        .as_ref()
        .map(|req| evaluate(req, &massing, &breakdown, &config.irr))
        .transpose()?;

    tracing::info!(
        site_id = %site.site_id,
        configuration = ?classification.configuration,
        floors = massing.floor_count(),
        height = massing.height,
        total_floor_area = massing.total_floor_area,
        height_limit = height_limits.final_limit,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Study complete"
    );

    Ok(StudyReport {
        site_id: site.site_id.clone(),
        classification,
        effective_coverage_ratio: coverage,
        effective_floor_area_ratio: far,
        height_limits,
        shadow,
        massing,
        breakdown,
        financials,
    })
}

/// Outcome of one request in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Ok { report: Box<StudyReport> },
    Error { site_id: String, message: String },
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

/// Run independent studies in parallel
///
/// Outcomes keep the order of `requests`; a failed study does not affect the
/// others.
pub fn run_batch(requests: &[StudyRequest], config: &StudyConfig) -> Vec<BatchOutcome> {
    let start = Instant::now();
    tracing::info!(requests = requests.len(), "Starting batch");

    let outcomes: Vec<BatchOutcome> = requests
        .par_iter()
        .map(|request| match run_study(request, config) {
            Ok(report) => BatchOutcome::Ok {
                report: Box::new(report),
            },
            Err(e) => {
                tracing::warn!(site_id = %request.site.site_id, error = %e, "Study failed");
                BatchOutcome::Error {
                    site_id: request.site.site_id.clone(),
                    message: e.to_string(),
                }
            }
        })
        .collect();

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    tracing::info!(
        requests = requests.len(),
        failed,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Batch complete"
    );
    outcomes
}
