// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon measurement and containment helpers
//!
//! All functions work on a closed ring given as an open point list (the last
//! point connects back to the first). Winding is not assumed; functions that
//! care about it normalize through [`orientation`].

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Minimum absolute area below which a ring is treated as degenerate
pub const MIN_AREA_THRESHOLD: f64 = 1e-10;

/// Ring winding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    CounterClockwise,
    Clockwise,
    /// Zero area (collinear or fewer than 3 points)
    Degenerate,
}

/// Compute the signed area of a ring
/// Positive = counter-clockwise, Negative = clockwise
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = points.len();

    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }

    area * 0.5
}

/// Shoelace area (absolute value)
#[inline]
pub fn area(points: &[Point2<f64>]) -> f64 {
    signed_area(points).abs()
}

/// Sum of edge lengths, including the closing edge
pub fn perimeter(points: &[Point2<f64>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    let n = points.len();
    (0..n)
        .map(|i| (points[(i + 1) % n] - points[i]).norm())
        .sum()
}

/// Winding of a ring
pub fn orientation(points: &[Point2<f64>]) -> Orientation {
    let a = signed_area(points);
    if a.abs() <= MIN_AREA_THRESHOLD {
        Orientation::Degenerate
    } else if a > 0.0 {
        Orientation::CounterClockwise
    } else {
        Orientation::Clockwise
    }
}

/// Ensure a ring has counter-clockwise winding (positive area)
pub fn ensure_ccw(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if signed_area(points) < 0.0 {
        points.iter().rev().cloned().collect()
    } else {
        points.to_vec()
    }
}

/// Area centroid; falls back to the vertex average for degenerate rings
pub fn centroid(points: &[Point2<f64>]) -> Point2<f64> {
    if points.is_empty() {
        return Point2::origin();
    }

    let a = signed_area(points);
    if a.abs() <= MIN_AREA_THRESHOLD {
        let sum = points
            .iter()
            .fold(Vector2::zeros(), |acc, p| acc + p.coords);
        return Point2::from(sum / points.len() as f64);
    }

    let n = points.len();
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let p = &points[i];
        let q = &points[(i + 1) % n];
        let cross = p.x * q.y - q.x * p.y;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }

    Point2::new(cx / (6.0 * a), cy / (6.0 * a))
}

/// Compute bounding box of a ring
pub fn bounds(points: &[Point2<f64>]) -> Option<(Point2<f64>, Point2<f64>)> {
    let first = points.first()?;
    let mut min = *first;
    let mut max = *first;

    for p in points.iter().skip(1) {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }

    Some((min, max))
}

/// Check if a point is inside a ring using ray casting
pub fn point_in_polygon(point: &Point2<f64>, points: &[Point2<f64>]) -> bool {
    if points.len() < 3 {
        return false;
    }

    let mut inside = false;
    let n = points.len();

    let mut j = n - 1;
    for i in 0..n {
        let pi = &points[i];
        let pj = &points[j];

        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Distance from a point to the segment `a`-`b`
pub fn distance_to_segment(point: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq <= f64::EPSILON {
        return (point - a).norm();
    }

    let t = ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (point - (a + ab * t)).norm()
}

/// Shortest distance from a point to any edge of a ring
pub fn distance_to_boundary(point: &Point2<f64>, points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| distance_to_segment(point, &points[i], &points[(i + 1) % n]))
        .fold(f64::INFINITY, f64::min)
}

/// Scale a ring about its centroid; area scales by `factor²`
pub fn scale_about_centroid(points: &[Point2<f64>], factor: f64) -> Vec<Point2<f64>> {
    let c = centroid(points);
    points.iter().map(|p| c + (p - c) * factor).collect()
}

/// A polygon with holes as returned by boolean operations.
/// The first ring is the outer boundary, the rest are holes.
pub type Shape = Vec<Vec<Point2<f64>>>;

/// Union a set of rings (non-zero fill, rings normalized to CCW first)
///
/// Useful for merging overlapping sweep pieces into a single outline.
pub fn union_rings(rings: &[Vec<Point2<f64>>]) -> Vec<Shape> {
    let valid: Vec<Vec<[f64; 2]>> = rings
        .iter()
        .filter(|r| r.len() >= 3 && area(r) > MIN_AREA_THRESHOLD)
        .map(|r| ring_to_path(&ensure_ccw(r)))
        .collect();

    match valid.len() {
        0 => Vec::new(),
        1 => vec![vec![path_to_ring(&valid[0])]],
        _ => {
            let subject = vec![valid[0].clone()];
            let clip: Vec<Vec<[f64; 2]>> = valid[1..].to_vec();
            let result = subject.overlay(&clip, OverlayRule::Union, FillRule::NonZero);

            result
                .into_iter()
                .map(|shape| {
                    shape
                        .iter()
                        .map(|contour| path_to_ring(contour))
                        .filter(|ring| ring.len() >= 3)
                        .collect::<Shape>()
                })
                .filter(|shape| !shape.is_empty())
                .collect()
        }
    }
}

/// Check if a point lies inside any shape (inside the outer ring, outside its holes)
pub fn point_in_shapes(point: &Point2<f64>, shapes: &[Shape]) -> bool {
    shapes.iter().any(|shape| match shape.split_first() {
        Some((outer, holes)) => {
            point_in_polygon(point, outer) && !holes.iter().any(|h| point_in_polygon(point, h))
        }
        None => false,
    })
}

/// Net area of a set of shapes (outer rings minus holes)
pub fn shapes_area(shapes: &[Shape]) -> f64 {
    shapes
        .iter()
        .map(|shape| match shape.split_first() {
            Some((outer, holes)) => area(outer) - holes.iter().map(|h| area(h)).sum::<f64>(),
            None => 0.0,
        })
        .sum()
}

fn ring_to_path(ring: &[Point2<f64>]) -> Vec<[f64; 2]> {
    ring.iter().map(|p| [p.x, p.y]).collect()
}

fn path_to_ring(path: &[[f64; 2]]) -> Vec<Point2<f64>> {
    path.iter().map(|p| Point2::new(p[0], p[1])).collect()
}
