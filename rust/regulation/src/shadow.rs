// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Winter-solstice shadow simulation
//!
//! Approximates the cumulative shadow hours a massed building casts on a
//! horizontal measurement plane around the site. The sun follows a simple
//! declination/hour-angle model at a fixed latitude, sampled in true solar
//! time. For each sample the shadow of the extruded footprint is the sweep of
//! the footprint along the shadow vector, built as a 2D union.
//!
//! Receptors sit on a coarse grid outside the site and are grouped by their
//! distance to the boundary: 5-10 m (near band) and beyond 10 m (far band).
//! This is a screening approximation, not a ray-traced shadow study.

use crate::error::{Error, Result};
use crate::profile::{ShadowRegulation, ZoneCategory};
use buildable_geometry::polygon::{self, Shape};
use buildable_geometry::{Point2, Vector2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Solar declination on the winter solstice, degrees
pub const WINTER_SOLSTICE_DECLINATION: f64 = -23.44;

/// Latitude used when none is configured (Tokyo), degrees north
pub const DEFAULT_LATITUDE: f64 = 35.68;

/// Inner and outer edge of the near regulated band, meters from the boundary
pub const NEAR_BAND: (f64, f64) = (5.0, 10.0);

/// Shadow hours below this difference count as equal
const HOURS_EPSILON: f64 = 1e-9;

/// Shadow simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Site latitude, degrees north
    pub latitude: f64,
    /// Solar declination, degrees
    pub declination: f64,
    /// First hour of the regulated window, true solar time
    pub start_hour: f64,
    /// Last hour of the regulated window, true solar time
    pub end_hour: f64,
    /// Sampling interval, hours
    pub step_hours: f64,
    /// Receptor grid spacing, meters
    pub grid_spacing: f64,
    /// How far beyond the site bounds receptors are placed, meters
    pub grid_margin: f64,
    /// Keep per-receptor hours in the result
    pub include_heat_map: bool,
    /// Tallest height tried when searching for the shadow height limit
    pub max_search_height: f64,
    /// Height search stops once the bracket is narrower than this
    pub search_tolerance: f64,
    /// Upper bound on height search iterations
    pub max_search_iterations: u32,
    /// Largest receptor grid a simulation may allocate
    pub max_receptors: usize,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            latitude: DEFAULT_LATITUDE,
            declination: WINTER_SOLSTICE_DECLINATION,
            start_hour: 8.0,
            end_hour: 16.0,
            step_hours: 0.5,
            grid_spacing: 2.0,
            grid_margin: 20.0,
            include_heat_map: false,
            max_search_height: 150.0,
            search_tolerance: 0.1,
            max_search_iterations: 32,
            max_receptors: 250_000,
        }
    }
}

impl ShadowConfig {
    pub fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(Error::InvalidShadowParameters(msg));

        if !(-66.0..=66.0).contains(&self.latitude) {
            return bad(format!("latitude {} outside the supported range", self.latitude));
        }
        if !(self.start_hour < self.end_hour && self.start_hour >= 0.0 && self.end_hour <= 24.0) {
            return bad(format!(
                "invalid time window {}..{}",
                self.start_hour, self.end_hour
            ));
        }
        if !(self.step_hours > 0.0 && self.step_hours <= self.end_hour - self.start_hour) {
            return bad(format!("invalid time step {}", self.step_hours));
        }
        if !(self.grid_spacing > 0.0 && self.grid_margin > NEAR_BAND.1) {
            return bad(format!(
                "grid spacing {} / margin {} cannot cover the regulated bands",
                self.grid_spacing, self.grid_margin
            ));
        }
        if !(self.max_search_height > 0.0 && self.search_tolerance > 0.0) {
            return bad("height search bounds must be positive".to_string());
        }
        if self.max_receptors == 0 {
            return bad("receptor limit must be positive".to_string());
        }

        Ok(())
    }
}

/// Sun position at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunPosition {
    /// True solar time, hours
    pub solar_time: f64,
    /// Altitude above the horizon, radians
    pub altitude: f64,
    /// Azimuth clockwise from north, radians in `[0, 2π)`
    pub azimuth: f64,
}

impl SunPosition {
    pub fn is_up(&self) -> bool {
        self.altitude > 0.0
    }

    /// Horizontal unit vector pointing away from the sun (east, north)
    pub fn shadow_direction(&self) -> Vector2<f64> {
        Vector2::new(-self.azimuth.sin(), -self.azimuth.cos())
    }
}

/// Sun position from latitude, declination and true solar time
pub fn sun_position(latitude: f64, declination: f64, solar_time: f64) -> SunPosition {
    let phi = latitude.to_radians();
    let delta = declination.to_radians();
    let omega = (15.0 * (solar_time - 12.0)).to_radians();

    let sin_alt = phi.sin() * delta.sin() + phi.cos() * delta.cos() * omega.cos();
    let altitude = sin_alt.clamp(-1.0, 1.0).asin();

    let east = -delta.cos() * omega.sin();
    let north = (delta.sin() - sin_alt * phi.sin()) / phi.cos();
    let azimuth = east.atan2(north).rem_euclid(TAU);

    SunPosition {
        solar_time,
        altitude,
        azimuth,
    }
}

/// Sun positions at the midpoint of each sampling interval
pub fn sun_path(config: &ShadowConfig) -> Vec<SunPosition> {
    let steps = ((config.end_hour - config.start_hour) / config.step_hours).round() as usize;
    (0..steps)
        .map(|k| {
            let t = config.start_hour + (k as f64 + 0.5) * config.step_hours;
            sun_position(config.latitude, config.declination, t)
        })
        .collect()
}

/// Shadow of a prism on a plane `height_above_plane` below its roof
///
/// Empty when the roof is at or below the plane or the sun is down.
pub fn shadow_outline(
    footprint: &[Point2<f64>],
    height_above_plane: f64,
    sun: &SunPosition,
) -> Vec<Shape> {
    if height_above_plane <= 0.0 || !sun.is_up() || footprint.len() < 3 {
        return Vec::new();
    }

    let length = height_above_plane / sun.altitude.tan();
    let v = sun.shadow_direction() * length;

    let n = footprint.len();
    let mut rings = Vec::with_capacity(n + 2);
    rings.push(footprint.to_vec());
    rings.push(footprint.iter().map(|p| p + v).collect());
    for i in 0..n {
        let a = footprint[i];
        let b = footprint[(i + 1) % n];
        rings.push(vec![a, b, b + v, a + v]);
    }

    polygon::union_rings(&rings)
}

/// Regulated band a receptor falls in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceptorBand {
    /// Inside the site or closer than 5 m to it
    Unregulated,
    /// Between 5 m and 10 m from the boundary
    Near,
    /// Beyond 10 m from the boundary
    Far,
}

/// Receptor grid around a site
#[derive(Debug, Clone)]
pub struct ReceptorGrid {
    pub origin: Point2<f64>,
    pub spacing: f64,
    pub columns: usize,
    pub rows: usize,
    pub points: Vec<Point2<f64>>,
    pub bands: Vec<ReceptorBand>,
}

impl ReceptorGrid {
    /// Grid of cell centers covering the site bounds plus the margin
    pub fn around(site: &[Point2<f64>], config: &ShadowConfig) -> Result<Self> {
        let (min, max) = polygon::bounds(site).ok_or_else(|| {
            Error::InvalidShadowParameters("site boundary is empty".to_string())
        })?;

        let origin = Point2::new(min.x - config.grid_margin, min.y - config.grid_margin);
        let width = max.x - min.x + 2.0 * config.grid_margin;
        let height = max.y - min.y + 2.0 * config.grid_margin;
        let columns = (width / config.grid_spacing).ceil().max(1.0);
        let rows = (height / config.grid_spacing).ceil().max(1.0);
        if columns * rows > config.max_receptors as f64 {
            return Err(Error::InvalidShadowParameters(format!(
                "{columns} x {rows} receptor grid exceeds the limit of {}",
                config.max_receptors
            )));
        }
        let (columns, rows) = (columns as usize, rows as usize);

        let mut points = Vec::with_capacity(columns * rows);
        for row in 0..rows {
            for col in 0..columns {
                points.push(Point2::new(
                    origin.x + (col as f64 + 0.5) * config.grid_spacing,
                    origin.y + (row as f64 + 0.5) * config.grid_spacing,
                ));
            }
        }

        let bands = points
            .iter()
            .map(|p| {
                if polygon::point_in_polygon(p, site) {
                    return ReceptorBand::Unregulated;
                }
                let d = polygon::distance_to_boundary(p, site);
                if d <= NEAR_BAND.0 {
                    ReceptorBand::Unregulated
                } else if d <= NEAR_BAND.1 {
                    ReceptorBand::Near
                } else {
                    ReceptorBand::Far
                }
            })
            .collect();

        Ok(Self {
            origin,
            spacing: config.grid_spacing,
            columns,
            rows,
            points,
            bands,
        })
    }
}

/// Per-receptor shadow hours on the receptor grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowHeatMap {
    pub origin: Point2<f64>,
    pub cell_size: f64,
    pub columns: usize,
    pub rows: usize,
    /// Row-major hours, south row first
    pub hours: Vec<f64>,
}

impl ShadowHeatMap {
    pub fn hours_at(&self, column: usize, row: usize) -> Option<f64> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.hours.get(row * self.columns + column).copied()
    }
}

/// Outcome of a shadow simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowSimulationResult {
    /// Worst shadow hours in the 5-10 m band
    pub max_shadow_hours: f64,
    /// Worst shadow hours beyond 10 m
    pub secondary_shadow_hours: f64,
    pub allowed_hours_near: f64,
    pub allowed_hours_far: f64,
    pub compliant: bool,
    pub measurement_height: f64,
    pub building_height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heat_map: Option<ShadowHeatMap>,
}

/// Simulate the shadow of `footprint` extruded to `building_height`
pub fn simulate_shadow(
    site: &[Point2<f64>],
    footprint: &[Point2<f64>],
    building_height: f64,
    regulation: &ShadowRegulation,
    zone: ZoneCategory,
    config: &ShadowConfig,
) -> Result<ShadowSimulationResult> {
    config.validate()?;
    if !(building_height.is_finite() && building_height >= 0.0) {
        return Err(Error::InvalidShadowParameters(format!(
            "building height must be non-negative, got {building_height}"
        )));
    }

    let grid = ReceptorGrid::around(site, config)?;
    let sun = sun_path(config);
    Ok(simulate_on_grid(
        &grid,
        &sun,
        footprint,
        building_height,
        regulation,
        zone,
        config,
    ))
}

fn simulate_on_grid(
    grid: &ReceptorGrid,
    sun: &[SunPosition],
    footprint: &[Point2<f64>],
    building_height: f64,
    regulation: &ShadowRegulation,
    zone: ZoneCategory,
    config: &ShadowConfig,
) -> ShadowSimulationResult {
    let plane = regulation.plane_height(zone);
    let height_above_plane = building_height - plane;

    let outlines: Vec<(Vec<Shape>, Option<(Point2<f64>, Point2<f64>)>)> = sun
        .iter()
        .map(|s| {
            let shapes = shadow_outline(footprint, height_above_plane, s);
            let bbox = shapes_bounds(&shapes);
            (shapes, bbox)
        })
        .collect();

    let keep_all = config.include_heat_map;
    let hours: Vec<f64> = grid
        .points
        .par_iter()
        .zip(grid.bands.par_iter())
        .map(|(p, band)| {
            if !keep_all && *band == ReceptorBand::Unregulated {
                return 0.0;
            }
            let steps = outlines
                .iter()
                .filter(|(shapes, bbox)| match bbox {
                    Some((min, max)) => {
                        p.x >= min.x
                            && p.x <= max.x
                            && p.y >= min.y
                            && p.y <= max.y
                            && polygon::point_in_shapes(p, shapes)
                    }
                    None => false,
                })
                .count();
            steps as f64 * config.step_hours
        })
        .collect();

    let band_max = |wanted: ReceptorBand| {
        hours
            .iter()
            .zip(&grid.bands)
            .filter(|(_, band)| **band == wanted)
            .map(|(h, _)| *h)
            .fold(0.0, f64::max)
    };
    let max_shadow_hours = band_max(ReceptorBand::Near);
    let secondary_shadow_hours = band_max(ReceptorBand::Far);

    let compliant = max_shadow_hours <= regulation.allowed_hours_near + HOURS_EPSILON
        && secondary_shadow_hours <= regulation.allowed_hours_far + HOURS_EPSILON;

    tracing::debug!(
        building_height,
        plane_height = plane,
        max_shadow_hours,
        secondary_shadow_hours,
        compliant,
        "Shadow simulation complete"
    );

    let heat_map = keep_all.then(|| ShadowHeatMap {
        origin: grid.origin,
        cell_size: grid.spacing,
        columns: grid.columns,
        rows: grid.rows,
        hours: hours.clone(),
    });

    ShadowSimulationResult {
        max_shadow_hours,
        secondary_shadow_hours,
        allowed_hours_near: regulation.allowed_hours_near,
        allowed_hours_far: regulation.allowed_hours_far,
        compliant,
        measurement_height: plane,
        building_height,
        heat_map,
    }
}

fn shapes_bounds(shapes: &[Shape]) -> Option<(Point2<f64>, Point2<f64>)> {
    shapes
        .iter()
        .filter_map(|shape| shape.first())
        .filter_map(|outer| polygon::bounds(outer))
        .reduce(|(amin, amax), (bmin, bmax)| {
            (
                Point2::new(amin.x.min(bmin.x), amin.y.min(bmin.y)),
                Point2::new(amax.x.max(bmax.x), amax.y.max(bmax.y)),
            )
        })
}

/// Tallest compliant height found by the bounded search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowHeightLimit {
    /// `None` when even the search ceiling complies
    pub height: Option<f64>,
    /// Whether the search bracket narrowed to the tolerance
    pub converged: bool,
    pub iterations: u32,
}

impl ShadowHeightLimit {
    /// Limit with `+∞` for "not binding"
    pub fn as_limit(&self) -> f64 {
        self.height.unwrap_or(f64::INFINITY)
    }
}

/// Bisect for the tallest height whose shadow complies with the regulation
///
/// Shadows grow monotonically with height, so the compliant heights form an
/// interval starting at the measurement plane. The returned height is the
/// compliant end of the final bracket.
pub fn shadow_height_limit(
    site: &[Point2<f64>],
    footprint: &[Point2<f64>],
    regulation: &ShadowRegulation,
    zone: ZoneCategory,
    config: &ShadowConfig,
) -> Result<ShadowHeightLimit> {
    config.validate()?;
    let grid = ReceptorGrid::around(site, config)?;
    let sun = sun_path(config);

    let complies = |h: f64| {
        simulate_on_grid(&grid, &sun, footprint, h, regulation, zone, config).compliant
    };

    let mut lo = regulation.plane_height(zone);
    let mut hi = config.max_search_height.max(lo);

    if complies(hi) {
        return Ok(ShadowHeightLimit {
            height: None,
            converged: true,
            iterations: 0,
        });
    }

    let mut iterations = 0;
    while hi - lo > config.search_tolerance && iterations < config.max_search_iterations {
        let mid = 0.5 * (lo + hi);
        if complies(mid) {
            lo = mid;
        } else {
            hi = mid;
        }
        iterations += 1;
    }

    let converged = hi - lo <= config.search_tolerance;
    if !converged {
        tracing::warn!(
            iterations,
            bracket = hi - lo,
            "Shadow height search stopped before reaching tolerance"
        );
    }

    Ok(ShadowHeightLimit {
        height: Some(lo),
        converged,
        iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(origin: (f64, f64), size: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(origin.0, origin.1),
            Point2::new(origin.0 + size, origin.1),
            Point2::new(origin.0 + size, origin.1 + size),
            Point2::new(origin.0, origin.1 + size),
        ]
    }

    #[test]
    fn test_noon_sun_on_winter_solstice() {
        let sun = sun_position(DEFAULT_LATITUDE, WINTER_SOLSTICE_DECLINATION, 12.0);
        assert_relative_eq!(
            sun.altitude.to_degrees(),
            90.0 - DEFAULT_LATITUDE + WINTER_SOLSTICE_DECLINATION,
            epsilon = 1e-9
        );
        assert_relative_eq!(sun.azimuth.to_degrees(), 180.0, epsilon = 1e-9);
        // Shadow points due north
        let dir = sun.shadow_direction();
        assert_relative_eq!(dir.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(dir.y, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_morning_sun_is_in_the_east() {
        let sun = sun_position(DEFAULT_LATITUDE, WINTER_SOLSTICE_DECLINATION, 9.0);
        assert!(sun.is_up());
        assert!(sun.azimuth > 0.0 && sun.azimuth < std::f64::consts::PI);
        // Morning shadows fall to the west
        assert!(sun.shadow_direction().x < 0.0);
    }

    #[test]
    fn test_sun_path_samples_midpoints() {
        let path = sun_path(&ShadowConfig::default());
        assert_eq!(path.len(), 16);
        assert_relative_eq!(path[0].solar_time, 8.25);
        assert_relative_eq!(path[15].solar_time, 15.75);
        assert!(path.iter().all(|s| s.is_up()));
    }

    #[test]
    fn test_noon_shadow_outline_area() {
        let footprint = square((0.0, 0.0), 10.0);
        let sun = sun_position(DEFAULT_LATITUDE, WINTER_SOLSTICE_DECLINATION, 12.0);
        let shapes = shadow_outline(&footprint, 10.0, &sun);

        let length = 10.0 / sun.altitude.tan();
        assert_relative_eq!(
            polygon::shapes_area(&shapes),
            10.0 * (10.0 + length),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_building_below_plane_casts_no_shadow() {
        let site = square((0.0, 0.0), 30.0);
        let footprint = square((5.0, 5.0), 20.0);
        let regulation = ShadowRegulation::new(4.0, 2.5);
        let result = simulate_shadow(
            &site,
            &footprint,
            3.0,
            &regulation,
            ZoneCategory::Category1MidHighRiseResidential,
            &ShadowConfig::default(),
        )
        .unwrap();

        assert_eq!(result.max_shadow_hours, 0.0);
        assert_eq!(result.secondary_shadow_hours, 0.0);
        assert!(result.compliant);
        assert_relative_eq!(result.measurement_height, 4.0);
    }

    #[test]
    fn test_tall_building_fails_strict_regulation() {
        let site = square((0.0, 0.0), 30.0);
        let footprint = square((2.0, 2.0), 26.0);
        let regulation = ShadowRegulation::new(3.0, 2.0);
        let config = ShadowConfig {
            include_heat_map: true,
            ..Default::default()
        };
        let result = simulate_shadow(
            &site,
            &footprint,
            40.0,
            &regulation,
            ZoneCategory::Category1MidHighRiseResidential,
            &config,
        )
        .unwrap();

        assert!(!result.compliant);
        assert!(result.max_shadow_hours > 3.0);
        assert!(result.max_shadow_hours >= result.secondary_shadow_hours);

        let heat_map = result.heat_map.unwrap();
        assert_eq!(heat_map.hours.len(), heat_map.columns * heat_map.rows);
        assert!(heat_map.hours_at(heat_map.columns, 0).is_none());
    }

    #[test]
    fn test_height_limit_is_compliant_and_tight() {
        let site = square((0.0, 0.0), 30.0);
        let footprint = square((2.0, 2.0), 26.0);
        let regulation = ShadowRegulation::new(3.0, 2.0);
        let zone = ZoneCategory::Category1MidHighRiseResidential;
        let config = ShadowConfig::default();

        let limit = shadow_height_limit(&site, &footprint, &regulation, zone, &config).unwrap();
        assert!(limit.converged);
        let h = limit.height.unwrap();
        assert!(h > 4.0 && h < config.max_search_height);

        let at_limit = simulate_shadow(&site, &footprint, h, &regulation, zone, &config).unwrap();
        assert!(at_limit.compliant);
        let above = simulate_shadow(&site, &footprint, h + 2.0 * config.search_tolerance, &regulation, zone, &config)
            .unwrap();
        assert!(!above.compliant);
    }

    #[test]
    fn test_generous_regulation_is_not_binding() {
        let site = square((0.0, 0.0), 30.0);
        let footprint = square((10.0, 10.0), 5.0);
        let regulation = ShadowRegulation::new(8.0, 8.0);
        let limit = shadow_height_limit(
            &site,
            &footprint,
            &regulation,
            ZoneCategory::Commercial,
            &ShadowConfig::default(),
        )
        .unwrap();
        assert_eq!(limit.height, None);
        assert!(limit.as_limit().is_infinite());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ShadowConfig {
            step_hours: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ShadowConfig {
            max_receptors: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_receptor_grid_size_is_capped() {
        let config = ShadowConfig::default();
        let small = ReceptorGrid::around(&square((0.0, 0.0), 30.0), &config).unwrap();
        // 70 m across with the margins, 2 m cells
        assert_eq!(small.columns * small.rows, 35 * 35);

        let parcel = square((0.0, 0.0), 3_000.0);
        assert!(matches!(
            ReceptorGrid::around(&parcel, &config),
            Err(Error::InvalidShadowParameters(_))
        ));

        let regulation = ShadowRegulation::new(4.0, 2.5);
        let result = simulate_shadow(
            &parcel,
            &square((100.0, 100.0), 50.0),
            20.0,
            &regulation,
            ZoneCategory::Category1MidHighRiseResidential,
            &config,
        );
        assert!(result.is_err());
    }
}
