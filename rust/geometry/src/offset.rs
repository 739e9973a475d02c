// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-edge inward offsetting
//!
//! Each edge is translated along its inward normal by its own distance, and
//! vertex `i` is rebuilt as the intersection of the offset lines of edges
//! `i - 1` and `i`. Edge `i` runs from point `i` to point `i + 1`.
//!
//! The result keeps the input vertex order and count. Large offsets relative
//! to the site width can produce a self-intersecting ring; this is reported
//! by area, not corrected.

use crate::error::{Error, Result};
use crate::polygon::{self, Orientation};
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Sine of the angle below which two offset lines are treated as parallel
const PARALLEL_EPSILON: f64 = 1e-6;

/// Edges shorter than this have no usable direction
const MIN_EDGE_LENGTH: f64 = 1e-9;

/// Outcome of an offset operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OffsetOutcome {
    /// Every vertex was rebuilt from a line intersection
    Exact { polygon: Vec<Point2<f64>> },
    /// Some vertices kept their original position because the adjacent
    /// offset lines were parallel or an adjacent edge had zero length
    Degenerate {
        polygon: Vec<Point2<f64>>,
        fallback_vertices: SmallVec<[usize; 4]>,
    },
}

impl OffsetOutcome {
    pub fn polygon(&self) -> &[Point2<f64>] {
        match self {
            Self::Exact { polygon } | Self::Degenerate { polygon, .. } => polygon,
        }
    }

    pub fn into_polygon(self) -> Vec<Point2<f64>> {
        match self {
            Self::Exact { polygon } | Self::Degenerate { polygon, .. } => polygon,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Exact { .. })
    }

    /// Vertex indices that fell back to the input position
    pub fn fallback_vertices(&self) -> &[usize] {
        match self {
            Self::Exact { .. } => &[],
            Self::Degenerate {
                fallback_vertices, ..
            } => fallback_vertices,
        }
    }

    pub fn area(&self) -> f64 {
        polygon::area(self.polygon())
    }
}

/// An edge translated along its inward normal
struct OffsetLine {
    origin: Point2<f64>,
    direction: Option<Vector2<f64>>,
}

/// Shrink a ring inward with a distinct distance per edge
///
/// `distances[i]` applies to the edge from point `i` to point `i + 1`.
/// Distances must be finite and non-negative.
pub fn variable_offset(points: &[Point2<f64>], distances: &[f64]) -> Result<OffsetOutcome> {
    if points.len() < 3 {
        return Err(Error::InvalidPolygon(format!(
            "offset needs at least 3 points, got {}",
            points.len()
        )));
    }
    if distances.len() != points.len() {
        return Err(Error::SetbackCountMismatch {
            expected: points.len(),
            got: distances.len(),
        });
    }
    if let Some((edge, &value)) = distances
        .iter()
        .enumerate()
        .find(|(_, d)| !d.is_finite() || **d < 0.0)
    {
        return Err(Error::InvalidSetback { edge, value });
    }

    // Inward normal is the left normal for CCW rings, the right normal for CW
    let inward_sign = match polygon::orientation(points) {
        Orientation::CounterClockwise => 1.0,
        Orientation::Clockwise => -1.0,
        Orientation::Degenerate => {
            return Err(Error::InvalidPolygon(
                "boundary has zero area".to_string(),
            ))
        }
    };

    let n = points.len();
    let lines: Vec<OffsetLine> = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            let edge = b - a;
            let len = edge.norm();
            if len < MIN_EDGE_LENGTH {
                return OffsetLine {
                    origin: a,
                    direction: None,
                };
            }
            let dir = edge / len;
            let normal = Vector2::new(-dir.y, dir.x) * inward_sign;
            OffsetLine {
                origin: a + normal * distances[i],
                direction: Some(dir),
            }
        })
        .collect();

    let mut result = Vec::with_capacity(n);
    let mut fallback_vertices: SmallVec<[usize; 4]> = SmallVec::new();

    for i in 0..n {
        let prev = &lines[(i + n - 1) % n];
        let curr = &lines[i];
        match intersect(prev, curr) {
            Some(p) => result.push(p),
            None => {
                result.push(points[i]);
                fallback_vertices.push(i);
            }
        }
    }

    if fallback_vertices.is_empty() {
        Ok(OffsetOutcome::Exact { polygon: result })
    } else {
        Ok(OffsetOutcome::Degenerate {
            polygon: result,
            fallback_vertices,
        })
    }
}

/// Shrink every edge by the same distance
pub fn uniform_offset(points: &[Point2<f64>], distance: f64) -> Result<OffsetOutcome> {
    variable_offset(points, &vec![distance; points.len()])
}

/// Offset after edges that collapsed under their setback were merged away
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedOffset {
    pub outcome: OffsetOutcome,
    /// Input edges dropped from the ring, in merge order
    pub collapsed_edges: Vec<usize>,
    /// Input edges still reversed when no further merge was possible
    pub reversed_edges: Vec<usize>,
    /// Input vertex each output vertex stands for
    pub vertex_sources: Vec<usize>,
}

impl MergedOffset {
    /// Some edge still points against its boundary edge: the setbacks
    /// overlap and the ring turned inside out
    pub fn is_inverted(&self) -> bool {
        !self.reversed_edges.is_empty()
    }

    /// Fallback vertices as input vertex indices
    pub fn fallback_source_vertices(&self) -> Vec<usize> {
        self.outcome
            .fallback_vertices()
            .iter()
            .map(|&v| self.vertex_sources[v])
            .collect()
    }
}

/// [`variable_offset`] that drops edges whose offset reverses direction
///
/// A short edge between two longer ones (a corner cut) vanishes when its
/// setback exceeds what its length allows. Such an edge is removed and its
/// neighbors are extended to their intersection, shortest edge first, until
/// no edge reverses or no merge is possible. Distances are per input edge.
pub fn merging_offset(points: &[Point2<f64>], distances: &[f64]) -> Result<MergedOffset> {
    let mut ring = points.to_vec();
    let mut dists = distances.to_vec();
    let mut edge_sources: Vec<usize> = (0..points.len()).collect();
    let mut vertex_sources = edge_sources.clone();
    let mut collapsed_edges = Vec::new();

    loop {
        let outcome = variable_offset(&ring, &dists)?;
        let mut reversed = reversed_edges(&ring, outcome.polygon());

        let merge = if ring.len() > 3 {
            reversed.sort_by(|&a, &b| edge_length(&ring, a).total_cmp(&edge_length(&ring, b)));
            reversed
                .iter()
                .find_map(|&edge| merge_point(&ring, edge).map(|joint| (edge, joint)))
        } else {
            None
        };

        let Some((mut edge, joint)) = merge else {
            reversed.sort_unstable();
            return Ok(MergedOffset {
                outcome,
                collapsed_edges,
                reversed_edges: reversed.into_iter().map(|e| edge_sources[e]).collect(),
                vertex_sources,
            });
        };

        // Keep the removed vertex off the wrap-around
        if edge + 1 == ring.len() {
            ring.rotate_left(1);
            dists.rotate_left(1);
            edge_sources.rotate_left(1);
            vertex_sources.rotate_left(1);
            edge -= 1;
        }

        collapsed_edges.push(edge_sources[edge]);
        ring[edge] = joint;
        ring.remove(edge + 1);
        vertex_sources.remove(edge + 1);
        dists.remove(edge);
        edge_sources.remove(edge);
    }
}

/// Edges of `candidate` pointing against the matching edge of `ring`
fn reversed_edges(ring: &[Point2<f64>], candidate: &[Point2<f64>]) -> Vec<usize> {
    let n = ring.len();
    (0..n)
        .filter(|&i| {
            let a = ring[(i + 1) % n] - ring[i];
            let b = candidate[(i + 1) % n] - candidate[i];
            a.dot(&b) < 0.0
        })
        .collect()
}

fn edge_length(ring: &[Point2<f64>], i: usize) -> f64 {
    (ring[(i + 1) % ring.len()] - ring[i]).norm()
}

fn boundary_line(ring: &[Point2<f64>], i: usize) -> OffsetLine {
    let a = ring[i];
    let edge = ring[(i + 1) % ring.len()] - a;
    let len = edge.norm();
    OffsetLine {
        origin: a,
        direction: (len >= MIN_EDGE_LENGTH).then(|| edge / len),
    }
}

/// Where the neighbors of `edge` meet once it is removed
fn merge_point(ring: &[Point2<f64>], edge: usize) -> Option<Point2<f64>> {
    let n = ring.len();
    let prev = boundary_line(ring, (edge + n - 1) % n);
    let next = boundary_line(ring, (edge + 1) % n);
    intersect(&prev, &next)
}

/// Intersection of two offset lines, `None` when parallel or undefined
fn intersect(a: &OffsetLine, b: &OffsetLine) -> Option<Point2<f64>> {
    let (da, db) = (a.direction?, b.direction?);
    let det = da.x * db.y - da.y * db.x;
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }

    let delta = b.origin - a.origin;
    let t = (delta.x * db.y - delta.y * db.x) / det;
    Some(a.origin + da * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rectangle(w: f64, h: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(w, 0.0),
            Point2::new(w, h),
            Point2::new(0.0, h),
        ]
    }

    #[test]
    fn test_uniform_setback_on_rectangle() {
        let outcome = uniform_offset(&rectangle(20.0, 15.0), 2.0).unwrap();

        assert!(outcome.is_exact());
        let poly = outcome.polygon();
        assert_eq!(poly.len(), 4);
        assert_relative_eq!(poly[0], Point2::new(2.0, 2.0), epsilon = 1e-9);
        assert_relative_eq!(poly[2], Point2::new(18.0, 13.0), epsilon = 1e-9);
        assert_relative_eq!(outcome.area(), 176.0, epsilon = 1e-9);
    }

    #[test]
    fn test_clockwise_ring_still_shrinks() {
        let mut cw = rectangle(20.0, 15.0);
        cw.reverse();
        let outcome = uniform_offset(&cw, 2.0).unwrap();
        assert_relative_eq!(outcome.area(), 176.0, epsilon = 1e-9);
    }

    #[test]
    fn test_distinct_distance_per_edge() {
        // Road on the south edge (edge 0) with a 4 m setback, 1 m elsewhere
        let outcome = variable_offset(&rectangle(20.0, 15.0), &[4.0, 1.0, 1.0, 1.0]).unwrap();
        let poly = outcome.polygon();
        assert_relative_eq!(poly[0], Point2::new(1.0, 4.0), epsilon = 1e-9);
        assert_relative_eq!(poly[1], Point2::new(19.0, 4.0), epsilon = 1e-9);
        assert_relative_eq!(outcome.area(), 18.0 * 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_distance_is_identity() {
        let rect = rectangle(10.0, 5.0);
        let outcome = uniform_offset(&rect, 0.0).unwrap();
        for (a, b) in rect.iter().zip(outcome.polygon()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_collinear_vertex_falls_back() {
        let ring = vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(20.0, 0.0),
            Point2::new(20.0, 10.0),
            Point2::new(0.0, 10.0),
        ];
        let outcome = uniform_offset(&ring, 1.0).unwrap();

        assert!(!outcome.is_exact());
        assert_eq!(outcome.fallback_vertices(), &[1]);
        assert_eq!(outcome.polygon()[1], Point2::new(10.0, 0.0));
        assert_eq!(outcome.polygon().len(), 5);
    }

    #[test]
    fn test_zero_length_edge_falls_back() {
        let ring = vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
        ];
        let outcome = uniform_offset(&ring, 1.0).unwrap();
        assert_eq!(outcome.fallback_vertices(), &[1, 2]);
    }

    #[test]
    fn test_area_shrinks_monotonically_for_convex_ring() {
        let hexagon: Vec<Point2<f64>> = (0..6)
            .map(|k| {
                let a = std::f64::consts::PI / 3.0 * k as f64;
                Point2::new(20.0 * a.cos(), 20.0 * a.sin())
            })
            .collect();

        let mut last = polygon::area(&hexagon);
        for step in 1..10 {
            let outcome = uniform_offset(&hexagon, step as f64).unwrap();
            assert_eq!(outcome.polygon().len(), 6);
            assert!(outcome.area() < last);
            last = outcome.area();
        }
    }

    #[test]
    fn test_invalid_inputs() {
        let rect = rectangle(10.0, 5.0);
        assert!(matches!(
            variable_offset(&rect, &[1.0, 1.0]),
            Err(Error::SetbackCountMismatch { expected: 4, got: 2 })
        ));
        assert!(matches!(
            variable_offset(&rect, &[1.0, -1.0, 1.0, 1.0]),
            Err(Error::InvalidSetback { edge: 1, .. })
        ));
        assert!(variable_offset(&rect[..2], &[1.0, 1.0]).is_err());
    }

    fn corner_cut_lot() -> Vec<Point2<f64>> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(19.65, 0.0),
            Point2::new(20.0, 0.35),
            Point2::new(20.0, 15.0),
            Point2::new(0.0, 15.0),
        ]
    }

    #[test]
    fn test_short_corner_cut_reverses_under_plain_offset() {
        let ring = corner_cut_lot();
        let outcome = variable_offset(&ring, &[1.0, 1.0, 1.0, 2.0, 1.0]).unwrap();
        assert_eq!(reversed_edges(&ring, outcome.polygon()), vec![1]);
    }

    #[test]
    fn test_merging_offset_drops_collapsed_corner_cut() {
        let merged = merging_offset(&corner_cut_lot(), &[1.0, 1.0, 1.0, 2.0, 1.0]).unwrap();

        assert!(!merged.is_inverted());
        assert_eq!(merged.collapsed_edges, vec![1]);
        assert_eq!(merged.vertex_sources, vec![0, 1, 3, 4]);

        let poly = merged.outcome.polygon();
        assert_eq!(poly.len(), 4);
        assert_relative_eq!(poly[0], Point2::new(1.0, 1.0), epsilon = 1e-9);
        assert_relative_eq!(poly[1], Point2::new(19.0, 1.0), epsilon = 1e-9);
        assert_relative_eq!(poly[2], Point2::new(19.0, 13.0), epsilon = 1e-9);
        assert_relative_eq!(merged.outcome.area(), 18.0 * 12.0, epsilon = 1e-9);

        // The cut edge keeps at least its own setback
        let corner = poly[1];
        let clearance = (19.65 - (corner.x - corner.y)) / 2f64.sqrt();
        assert!(clearance >= 1.0);
    }

    #[test]
    fn test_merging_offset_wraps_last_edge() {
        // Corner cut as the closing edge
        let ring = vec![
            Point2::new(0.35, 0.0),
            Point2::new(20.0, 0.0),
            Point2::new(20.0, 15.0),
            Point2::new(0.0, 15.0),
            Point2::new(0.0, 0.35),
        ];
        let merged = merging_offset(&ring, &[1.0; 5]).unwrap();

        assert!(!merged.is_inverted());
        assert_eq!(merged.collapsed_edges, vec![4]);
        assert_relative_eq!(merged.outcome.area(), 18.0 * 13.0, epsilon = 1e-9);
    }

    #[test]
    fn test_merging_offset_leaves_clean_rings_alone() {
        let rect = rectangle(20.0, 15.0);
        let merged = merging_offset(&rect, &[2.0; 4]).unwrap();
        assert!(merged.collapsed_edges.is_empty());
        assert_eq!(merged.outcome, uniform_offset(&rect, 2.0).unwrap());
    }

    #[test]
    fn test_overlapping_setbacks_stay_inverted() {
        // Both long sides set back past the middle of a 3 m strip
        let merged = merging_offset(&rectangle(20.0, 3.0), &[2.0, 1.0, 2.0, 1.0]).unwrap();
        assert!(merged.is_inverted());
        assert_eq!(merged.reversed_edges, vec![1, 3]);
    }

    #[test]
    fn test_offset_is_deterministic() {
        let rect = rectangle(31.7, 12.3);
        let a = variable_offset(&rect, &[3.0, 0.5, 0.5, 0.5]).unwrap();
        let b = variable_offset(&rect, &[3.0, 0.5, 0.5, 0.5]).unwrap();
        assert_eq!(a, b);
    }
}
