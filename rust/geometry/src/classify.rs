// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Road frontage classification
//!
//! Splits the boundary into road-facing and neighbor-facing edges and infers
//! the site configuration. Without surveyed road data this is a best-effort
//! heuristic: the longest edge faces the road, and an edge adjacent to it
//! that is nearly as long is taken as a second (corner) frontage.

use crate::error::{Error, Result};
use crate::polygon;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// An adjacent edge becomes road frontage at this fraction of the longest edge
pub const CORNER_LENGTH_RATIO: f64 = 0.7;

/// A single frontage shorter than this fraction of the mean edge is a flag lot
pub const FLAG_LOT_RATIO: f64 = 0.3;

/// Neighbor edges within this fraction of the longest road edge are ambiguous
pub const AMBIGUITY_RATIO: f64 = 0.05;

const LENGTH_TIE_EPSILON: f64 = 1e-9;

/// Which side of the boundary an edge faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frontage {
    Road,
    Neighbor,
}

/// One boundary edge, from point `index` to point `index + 1`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundarySegment {
    pub index: usize,
    pub start: Point2<f64>,
    pub end: Point2<f64>,
    pub length: f64,
    /// Direction of travel in degrees clockwise from north, in `[0, 360)`
    pub bearing: f64,
    pub midpoint: Point2<f64>,
    pub frontage: Frontage,
}

impl BoundarySegment {
    fn new(index: usize, start: Point2<f64>, end: Point2<f64>) -> Self {
        let d = end - start;
        Self {
            index,
            start,
            end,
            length: d.norm(),
            bearing: bearing_degrees(d.x, d.y),
            midpoint: nalgebra::center(&start, &end),
            frontage: Frontage::Neighbor,
        }
    }

    pub fn is_road(&self) -> bool {
        self.frontage == Frontage::Road
    }
}

/// Site configuration derived from the road edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteConfiguration {
    Unknown,
    SingleFrontage,
    CornerLot,
    MultiFrontage,
    FlagLot,
}

/// How far the heuristic result can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationConfidence {
    /// Road edges came from surveyed data
    Surveyed,
    /// No neighbor edge competes with the road edges on length
    High,
    /// At least one neighbor edge is as long as the road edge
    Ambiguous,
}

/// Classified boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryClassification {
    pub segments: Vec<BoundarySegment>,
    pub configuration: SiteConfiguration,
    pub road_width: f64,
    pub confidence: ClassificationConfidence,
    /// Neighbor edges that could equally have been the road edge
    pub ambiguous_edges: Vec<usize>,
}

impl BoundaryClassification {
    pub fn road_edges(&self) -> impl Iterator<Item = &BoundarySegment> {
        self.segments.iter().filter(|s| s.is_road())
    }

    pub fn neighbor_edges(&self) -> impl Iterator<Item = &BoundarySegment> {
        self.segments.iter().filter(|s| !s.is_road())
    }

    pub fn road_edge_indices(&self) -> Vec<usize> {
        self.road_edges().map(|s| s.index).collect()
    }

    pub fn is_corner_lot(&self) -> bool {
        self.configuration == SiteConfiguration::CornerLot
    }
}

/// Classify boundary edges with the longest-edge heuristic
pub fn classify_boundary(points: &[Point2<f64>], road_width: f64) -> Result<BoundaryClassification> {
    let mut segments = build_segments(points, road_width)?;
    let n = segments.len();

    // Ties resolve to the lowest index
    let longest = segments
        .iter()
        .fold(0usize, |best, s| {
            if s.length > segments[best].length + LENGTH_TIE_EPSILON {
                s.index
            } else {
                best
            }
        });
    let longest_len = segments[longest].length;

    if longest_len <= LENGTH_TIE_EPSILON {
        return Ok(finish(segments, road_width, ClassificationConfidence::Ambiguous, Vec::new()));
    }

    segments[longest].frontage = Frontage::Road;
    for adjacent in [(longest + n - 1) % n, (longest + 1) % n] {
        if adjacent != longest && segments[adjacent].length >= CORNER_LENGTH_RATIO * longest_len {
            segments[adjacent].frontage = Frontage::Road;
        }
    }

    let ambiguous_edges: Vec<usize> = segments
        .iter()
        .filter(|s| !s.is_road() && s.length >= (1.0 - AMBIGUITY_RATIO) * longest_len)
        .map(|s| s.index)
        .collect();
    let confidence = if ambiguous_edges.is_empty() {
        ClassificationConfidence::High
    } else {
        ClassificationConfidence::Ambiguous
    };

    Ok(finish(segments, road_width, confidence, ambiguous_edges))
}

/// Classify boundary edges from surveyed road edge indices
pub fn classify_with_roads(
    points: &[Point2<f64>],
    road_width: f64,
    road_edges: &[usize],
) -> Result<BoundaryClassification> {
    let mut segments = build_segments(points, road_width)?;
    let n = segments.len();

    for &index in road_edges {
        let segment = segments.get_mut(index).ok_or(Error::InvalidRoadEdge {
            index,
            edge_count: n,
        })?;
        segment.frontage = Frontage::Road;
    }

    Ok(finish(
        segments,
        road_width,
        ClassificationConfidence::Surveyed,
        Vec::new(),
    ))
}

/// Determine the configuration from already tagged segments
pub fn site_configuration(segments: &[BoundarySegment]) -> SiteConfiguration {
    let n = segments.len();
    let roads: Vec<&BoundarySegment> = segments.iter().filter(|s| s.is_road()).collect();

    match roads.len() {
        0 => SiteConfiguration::Unknown,
        1 => {
            let mean = segments.iter().map(|s| s.length).sum::<f64>() / n as f64;
            if roads[0].length < FLAG_LOT_RATIO * mean {
                SiteConfiguration::FlagLot
            } else {
                SiteConfiguration::SingleFrontage
            }
        }
        2 => {
            let (a, b) = (roads[0].index, roads[1].index);
            if (a + 1) % n == b || (b + 1) % n == a {
                SiteConfiguration::CornerLot
            } else {
                SiteConfiguration::MultiFrontage
            }
        }
        _ => SiteConfiguration::MultiFrontage,
    }
}

fn build_segments(points: &[Point2<f64>], road_width: f64) -> Result<Vec<BoundarySegment>> {
    if points.len() < 3 {
        return Err(Error::InvalidPolygon(format!(
            "classification needs at least 3 points, got {}",
            points.len()
        )));
    }
    if !(road_width.is_finite() && road_width >= 0.0) {
        return Err(Error::InvalidDimension(format!(
            "road width must be non-negative, got {road_width}"
        )));
    }

    let n = points.len();
    Ok((0..n)
        .map(|i| BoundarySegment::new(i, points[i], points[(i + 1) % n]))
        .collect())
}

fn finish(
    segments: Vec<BoundarySegment>,
    road_width: f64,
    confidence: ClassificationConfidence,
    ambiguous_edges: Vec<usize>,
) -> BoundaryClassification {
    let configuration = site_configuration(&segments);
    BoundaryClassification {
        segments,
        configuration,
        road_width,
        confidence,
        ambiguous_edges,
    }
}

/// Bearing of a direction vector, degrees clockwise from north (+y)
pub fn bearing_degrees(dx: f64, dy: f64) -> f64 {
    let deg = dx.atan2(dy).to_degrees();
    if deg < 0.0 {
        deg + 360.0
    } else {
        deg
    }
}

/// Bearing of the outward normal of an edge, degrees clockwise from north
///
/// Used to find which edge faces north (bearing near 0) for north slant lines.
pub fn outward_normal_bearing(points: &[Point2<f64>], edge: usize) -> f64 {
    let n = points.len();
    let d = points[(edge + 1) % n] - points[edge];
    // Outward is the right normal for CCW rings
    let sign = if polygon::signed_area(points) >= 0.0 { 1.0 } else { -1.0 };
    bearing_degrees(d.y * sign, -d.x * sign)
}
