// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building-shape generation
//!
//! Footprint first: per-edge setbacks are offset from the site boundary and
//! tightened until the footprint fits the coverage ratio. The floor count is
//! then bounded by both the volume cap and the resolved height limit, and
//! every level reuses the same footprint.

use crate::error::{Error, Result};
use crate::program::BuildingProgram;
use buildable_geometry::classify::outward_normal_bearing;
use buildable_geometry::polygon::{self, MIN_AREA_THRESHOLD};
use buildable_geometry::{
    merging_offset, BoundaryClassification, Frontage, MergedOffset, Point2, SitePolygon,
};
use serde::{Deserialize, Serialize};

/// Areas within this of the cap count as compliant
const AREA_EPSILON: f64 = 1e-6;

/// Slack for floor counts that land exactly on an integer
const FLOOR_COUNT_EPSILON: f64 = 1e-9;

/// Minimum distances from the boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetbackRules {
    pub road_setback: f64,
    pub neighbor_setback: f64,
}

impl Default for SetbackRules {
    fn default() -> Self {
        Self {
            road_setback: 2.0,
            neighbor_setback: 1.0,
        }
    }
}

/// Coverage tightening loop settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TighteningConfig {
    pub max_iterations: u32,
    /// Target fraction of the cap each iteration aims for
    pub target_margin: f64,
    /// Distance given to zero setbacks before they are scaled
    pub seed_distance: f64,
}

impl Default for TighteningConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            target_margin: 0.95,
            seed_distance: 0.5,
        }
    }
}

/// Why an edge has the setback it has
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetbackReason {
    RoadFrontage,
    NeighborBoundary,
    DistrictPlanWallSetback,
}

/// Setback applied to one boundary edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeSetback {
    pub edge: usize,
    pub distance: f64,
    pub reason: SetbackReason,
    pub frontage: Frontage,
}

/// Setback per classified edge, raised to the district-plan wall setback
pub fn edge_setbacks(
    classification: &BoundaryClassification,
    rules: &SetbackRules,
    wall_setback: Option<f64>,
) -> Vec<EdgeSetback> {
    classification
        .segments
        .iter()
        .map(|segment| {
            let (base, reason) = match segment.frontage {
                Frontage::Road => (rules.road_setback, SetbackReason::RoadFrontage),
                Frontage::Neighbor => (rules.neighbor_setback, SetbackReason::NeighborBoundary),
            };
            match wall_setback {
                Some(wall) if wall > base => EdgeSetback {
                    edge: segment.index,
                    distance: wall,
                    reason: SetbackReason::DistrictPlanWallSetback,
                    frontage: segment.frontage,
                },
                _ => EdgeSetback {
                    edge: segment.index,
                    distance: base,
                    reason,
                    frontage: segment.frontage,
                },
            }
        })
        .collect()
}

/// Smallest setback on a road edge, `None` without road edges
pub fn road_setback(setbacks: &[EdgeSetback]) -> Option<f64> {
    setbacks
        .iter()
        .filter(|s| s.frontage == Frontage::Road)
        .map(|s| s.distance)
        .reduce(f64::min)
}

/// Setback of the edge facing closest to north
pub fn north_setback(points: &[Point2<f64>], setbacks: &[EdgeSetback]) -> Option<f64> {
    setbacks
        .iter()
        .filter(|s| s.edge < points.len())
        .map(|s| {
            let bearing = outward_normal_bearing(points, s.edge);
            let off_north = bearing.min(360.0 - bearing);
            (bearing_key(off_north), s.distance)
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, distance)| distance)
}

fn bearing_key(degrees: f64) -> f64 {
    // Bearings within a hundredth of a degree are the same direction
    (degrees * 100.0).round()
}

/// How the coverage tightening loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TighteningOutcome {
    pub iterations: u32,
    pub converged: bool,
    /// The footprint was scaled to the cap instead of offset
    pub fallback_applied: bool,
}

/// Footprint that satisfies the coverage cap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintPlan {
    pub footprint: Vec<Point2<f64>>,
    pub area: f64,
    pub max_footprint_area: f64,
    /// Setbacks after tightening
    pub setbacks: Vec<EdgeSetback>,
    /// Vertices kept at their boundary position by the offset
    pub degenerate_vertices: Vec<usize>,
    /// Short edges that vanished under their setback
    pub collapsed_edges: Vec<usize>,
    pub tightening: TighteningOutcome,
}

/// Offset the site by `setbacks` and tighten until the footprint fits
///
/// The cap is `min(site area × coverage / 100, volume cap)`. Edges too short
/// for their setback are merged away; the site is rejected only when the
/// setbacks overlap. When the loop runs out of iterations the smallest valid
/// candidate is scaled about its centroid to exactly the cap.
pub fn plan_footprint(
    site: &SitePolygon,
    setbacks: &[EdgeSetback],
    coverage_ratio: f64,
    volume_cap: f64,
    config: &TighteningConfig,
) -> Result<FootprintPlan> {
    if !(coverage_ratio > 0.0 && coverage_ratio <= 100.0) {
        return Err(Error::InvalidLimit(format!(
            "coverage ratio must be in (0, 100], got {coverage_ratio}"
        )));
    }
    if !(volume_cap.is_finite() && volume_cap > 0.0) {
        return Err(Error::InvalidLimit(format!(
            "volume cap must be positive, got {volume_cap}"
        )));
    }

    let points = site.points();
    let max_area = (site.area() * coverage_ratio / 100.0).min(volume_cap);

    let mut distances: Vec<f64> = setbacks.iter().map(|s| s.distance).collect();
    let mut outcome = merging_offset(points, &distances)?;
    let is_valid = |candidate: &MergedOffset| {
        !candidate.is_inverted() && candidate.outcome.area() > MIN_AREA_THRESHOLD
    };
    if !is_valid(&outcome) {
        return Err(Error::NoBuildableFootprint {
            site_id: site.site_id.clone(),
        });
    }
    if !outcome.collapsed_edges.is_empty() {
        tracing::debug!(
            site_id = %site.site_id,
            collapsed = ?outcome.collapsed_edges,
            "Merged edges shorter than their setback"
        );
    }

    let mut best = (outcome.clone(), distances.clone());
    let mut iterations = 0;
    let mut area = outcome.outcome.area();

    while area > max_area + AREA_EPSILON && iterations < config.max_iterations {
        let factor = (area / max_area).sqrt() / config.target_margin;
        for d in distances.iter_mut() {
            *d = if *d > 0.0 {
                *d * factor
            } else {
                config.seed_distance
            };
        }
        iterations += 1;

        outcome = merging_offset(points, &distances)?;
        if !is_valid(&outcome) {
            tracing::debug!(iterations, "Tightened offset collapsed, stopping");
            break;
        }
        area = outcome.outcome.area();
        if area < best.0.outcome.area() {
            best = (outcome.clone(), distances.clone());
        }
    }

    let (best_offset, best_distances) = best;
    let best_area = best_offset.outcome.area();
    let degenerate_vertices = best_offset.fallback_source_vertices();
    let collapsed_edges = best_offset.collapsed_edges;
    let best_outcome = best_offset.outcome;
    let final_setbacks = setbacks
        .iter()
        .zip(&best_distances)
        .map(|(s, d)| EdgeSetback {
            distance: *d,
            ..*s
        })
        .collect();

    if best_area <= max_area + AREA_EPSILON {
        tracing::debug!(
            iterations,
            area = best_area,
            max_area,
            "Footprint fits coverage"
        );
        return Ok(FootprintPlan {
            footprint: best_outcome.into_polygon(),
            area: best_area,
            max_footprint_area: max_area,
            setbacks: final_setbacks,
            degenerate_vertices,
            collapsed_edges,
            tightening: TighteningOutcome {
                iterations,
                converged: true,
                fallback_applied: false,
            },
        });
    }

    tracing::warn!(
        site_id = %site.site_id,
        iterations,
        area = best_area,
        max_area,
        "Coverage tightening did not converge, scaling footprint to the cap"
    );
    let footprint =
        polygon::scale_about_centroid(best_outcome.polygon(), (max_area / best_area).sqrt());
    let area = polygon::area(&footprint).min(max_area);

    Ok(FootprintPlan {
        footprint,
        area,
        max_footprint_area: max_area,
        setbacks: final_setbacks,
        degenerate_vertices,
        collapsed_edges,
        tightening: TighteningOutcome {
            iterations,
            converged: false,
            fallback_applied: true,
        },
    })
}

/// One level of the massing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    /// 1-based level number
    pub level: u32,
    pub elevation: f64,
    pub floor_height: f64,
    pub footprint: Vec<Point2<f64>>,
    pub area: f64,
    pub setbacks: Vec<f64>,
    pub setback_reasons: Vec<SetbackReason>,
}

/// Generated building volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassingResult {
    pub site_id: String,
    pub floors: Vec<Floor>,
    pub height: f64,
    pub footprint_area: f64,
    pub total_floor_area: f64,
    /// Legal maximum total floor area
    pub volume_cap: f64,
    /// Total floor area as a fraction of the volume cap
    pub volume_efficiency: f64,
    pub tightening: TighteningOutcome,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degenerate_vertices: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collapsed_edges: Vec<usize>,
}

impl MassingResult {
    pub fn floor_count(&self) -> usize {
        self.floors.len()
    }
}

/// Floor count allowed by a total-area cap and a height limit
///
/// Both bounds are floored; the result is at least 1.
pub fn floor_count(
    footprint_area: f64,
    volume_cap: f64,
    height_limit: f64,
    floor_height: f64,
    desired_floors: Option<u32>,
) -> u32 {
    let by_volume = bounded_count(volume_cap / footprint_area);
    let by_height = bounded_count(height_limit / floor_height);

    let floors = by_volume.min(by_height).max(1);
    match desired_floors {
        Some(desired) => floors.min(desired.max(1)),
        None => floors,
    }
}

fn bounded_count(ratio: f64) -> u32 {
    if ratio.is_finite() {
        (ratio + FLOOR_COUNT_EPSILON).floor().clamp(0.0, u32::MAX as f64) as u32
    } else {
        u32::MAX
    }
}

/// Stack identical floors on a planned footprint
pub fn stack_floors(
    site_id: &str,
    plan: &FootprintPlan,
    volume_cap: f64,
    height_limit: f64,
    program: &BuildingProgram,
) -> Result<MassingResult> {
    program.validate()?;
    if !(height_limit > 0.0) {
        return Err(Error::InvalidLimit(format!(
            "height limit must be positive, got {height_limit}"
        )));
    }
    if !(plan.area > MIN_AREA_THRESHOLD) {
        return Err(Error::NoBuildableFootprint {
            site_id: site_id.to_string(),
        });
    }

    let count = floor_count(
        plan.area,
        volume_cap,
        height_limit,
        program.floor_height,
        program.desired_floors,
    );
    // A single floor under a low limit is shortened to fit
    let floor_height = program.floor_height.min(height_limit);

    let setbacks: Vec<f64> = plan.setbacks.iter().map(|s| s.distance).collect();
    let reasons: Vec<SetbackReason> = plan.setbacks.iter().map(|s| s.reason).collect();
    let floors: Vec<Floor> = (0..count)
        .map(|i| Floor {
            level: i + 1,
            elevation: i as f64 * floor_height,
            floor_height,
            footprint: plan.footprint.clone(),
            area: plan.area,
            setbacks: setbacks.clone(),
            setback_reasons: reasons.clone(),
        })
        .collect();

    let height = count as f64 * floor_height;
    let total_floor_area = count as f64 * plan.area;

    tracing::debug!(
        site_id,
        floors = count,
        height,
        total_floor_area,
        volume_cap,
        "Stacked floors"
    );

    Ok(MassingResult {
        site_id: site_id.to_string(),
        floors,
        height,
        footprint_area: plan.area,
        total_floor_area,
        volume_cap,
        volume_efficiency: total_floor_area / volume_cap,
        tightening: plan.tightening,
        degenerate_vertices: plan.degenerate_vertices.clone(),
        collapsed_edges: plan.collapsed_edges.clone(),
    })
}

/// Limits the generator works against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassingLimits {
    /// Effective coverage ratio, percent
    pub coverage_ratio: f64,
    /// Effective floor area ratio, percent
    pub floor_area_ratio: f64,
    pub height_limit: f64,
}

impl MassingLimits {
    pub fn volume_cap(&self, site_area: f64) -> f64 {
        site_area * self.floor_area_ratio / 100.0
    }
}

/// Footprint and floors in one pass for an already resolved height limit
pub fn generate_massing(
    site: &SitePolygon,
    setbacks: &[EdgeSetback],
    limits: &MassingLimits,
    program: &BuildingProgram,
    config: &TighteningConfig,
) -> Result<MassingResult> {
    let volume_cap = limits.volume_cap(site.area());
    let plan = plan_footprint(site, setbacks, limits.coverage_ratio, volume_cap, config)?;
    stack_floors(&site.site_id, &plan, volume_cap, limits.height_limit, program)
}
