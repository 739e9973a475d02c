// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Site boundary value object

use crate::error::{Error, Result};
use crate::polygon;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Two points closer than this are treated as the same vertex
pub const DUPLICATE_POINT_TOLERANCE: f64 = 1e-9;

/// Surveyed geographic coordinate of a boundary vertex
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurveyedCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Site boundary in local plane coordinates (x = east, y = north, meters)
///
/// The ring is open: the last point connects back to the first. Winding is
/// preserved as supplied. Self-intersection is not checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSitePolygon")]
pub struct SitePolygon {
    /// Opaque identifier assigned by the data provider
    pub site_id: String,
    points: Vec<Point2<f64>>,
    /// Optional surveyed coordinates, one per boundary point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surveyed: Option<Vec<SurveyedCoordinate>>,
    /// Officially registered area, when it differs from the computed one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_area: Option<f64>,
}

impl SitePolygon {
    /// Create a site polygon, dropping repeated adjacent points
    pub fn new(site_id: impl Into<String>, points: Vec<Point2<f64>>) -> Result<Self> {
        if let Some(bad) = points.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(Error::InvalidPolygon(format!(
                "non-finite coordinate ({}, {})",
                bad.x, bad.y
            )));
        }

        let points = dedup_adjacent(points);
        if points.len() < 3 {
            return Err(Error::InvalidPolygon(format!(
                "site boundary must have at least 3 distinct points, got {}",
                points.len()
            )));
        }

        Ok(Self {
            site_id: site_id.into(),
            points,
            surveyed: None,
            registered_area: None,
        })
    }

    /// Attach surveyed coordinates (one per retained boundary point)
    pub fn with_surveyed(mut self, surveyed: Vec<SurveyedCoordinate>) -> Result<Self> {
        if surveyed.len() != self.points.len() {
            return Err(Error::InvalidPolygon(format!(
                "{} surveyed coordinates for {} boundary points",
                surveyed.len(),
                self.points.len()
            )));
        }
        self.surveyed = Some(surveyed);
        Ok(self)
    }

    /// Attach the registered (official) site area
    pub fn with_registered_area(mut self, area: f64) -> Result<Self> {
        if !(area.is_finite() && area > 0.0) {
            return Err(Error::InvalidDimension(format!(
                "registered area must be positive, got {area}"
            )));
        }
        self.registered_area = Some(area);
        Ok(self)
    }

    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn edge_count(&self) -> usize {
        self.points.len()
    }

    /// Area used for ratio calculations: the registered area when known
    pub fn area(&self) -> f64 {
        self.registered_area
            .unwrap_or_else(|| polygon::area(&self.points))
    }

    /// Area of the boundary ring itself
    pub fn computed_area(&self) -> f64 {
        polygon::area(&self.points)
    }

    pub fn perimeter(&self) -> f64 {
        polygon::perimeter(&self.points)
    }

    /// Rectangle with its lower-left corner at the origin
    pub fn rectangle(site_id: impl Into<String>, width: f64, depth: f64) -> Result<Self> {
        if !(width > 0.0 && depth > 0.0) {
            return Err(Error::InvalidDimension(format!(
                "rectangle sides must be positive, got {width} x {depth}"
            )));
        }

        Self::new(
            site_id,
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(width, 0.0),
                Point2::new(width, depth),
                Point2::new(0.0, depth),
            ],
        )
    }
}

/// Unvalidated wire form; deserialization goes through [`SitePolygon::new`]
#[derive(Deserialize)]
struct RawSitePolygon {
    site_id: String,
    points: Vec<Point2<f64>>,
    #[serde(default)]
    surveyed: Option<Vec<SurveyedCoordinate>>,
    #[serde(default)]
    registered_area: Option<f64>,
}

impl TryFrom<RawSitePolygon> for SitePolygon {
    type Error = Error;

    fn try_from(raw: RawSitePolygon) -> Result<Self> {
        let mut site = SitePolygon::new(raw.site_id, raw.points)?;
        if let Some(surveyed) = raw.surveyed {
            site = site.with_surveyed(surveyed)?;
        }
        if let Some(area) = raw.registered_area {
            site = site.with_registered_area(area)?;
        }
        Ok(site)
    }
}

fn dedup_adjacent(points: Vec<Point2<f64>>) -> Vec<Point2<f64>> {
    let mut out: Vec<Point2<f64>> = Vec::with_capacity(points.len());
    for p in points {
        if out
            .last()
            .map_or(true, |last| (p - last).norm() > DUPLICATE_POINT_TOLERANCE)
        {
            out.push(p);
        }
    }

    // Closing point repeated at the end
    while out.len() > 1 {
        let first = out[0];
        match out.last() {
            Some(last) if (first - last).norm() <= DUPLICATE_POINT_TOLERANCE => {
                out.pop();
            }
            _ => break,
        }
    }

    out
}
