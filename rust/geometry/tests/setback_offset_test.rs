// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Setback offsetting and frontage classification on realistic sites

use approx::assert_relative_eq;
use buildable_geometry::polygon::{self, Orientation};
use buildable_geometry::{
    classify_boundary, uniform_offset, variable_offset, Point2, SiteConfiguration, SitePolygon,
};

fn convex_sites() -> Vec<(Vec<Point2<f64>>, f64)> {
    // (ring, half of the minimum width)
    vec![
        (SitePolygon::rectangle("r", 20.0, 15.0).unwrap().points().to_vec(), 7.5),
        (
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(30.0, 0.0),
                Point2::new(26.0, 20.0),
                Point2::new(4.0, 20.0),
            ],
            10.0,
        ),
        (
            (0..8)
                .map(|k| {
                    let a = k as f64 * std::f64::consts::TAU / 8.0;
                    Point2::new(12.0 * a.cos(), 12.0 * a.sin())
                })
                .collect(),
            // Inradius of a regular octagon
            12.0 * (std::f64::consts::PI / 8.0).cos(),
        ),
    ]
}

#[test]
fn test_rectangle_uniform_setback_scenario() {
    let site = SitePolygon::rectangle("lot", 20.0, 15.0).unwrap();
    let outcome = variable_offset(site.points(), &[2.0; 4]).unwrap();

    assert!(outcome.is_exact());
    let (min, max) = polygon::bounds(outcome.polygon()).unwrap();
    assert_relative_eq!(max.x - min.x, 16.0, epsilon = 1e-9);
    assert_relative_eq!(max.y - min.y, 11.0, epsilon = 1e-9);
    assert_relative_eq!(outcome.area(), 176.0, epsilon = 1e-9);
    assert_relative_eq!(site.area(), 300.0);
}

#[test]
fn test_uniform_offset_shrinks_area_monotonically() {
    for (ring, half_width) in convex_sites() {
        let mut previous = polygon::area(&ring);
        let steps = 10;
        for i in 1..steps {
            let d = half_width * i as f64 / steps as f64;
            let outcome = uniform_offset(&ring, d).unwrap();
            assert_eq!(outcome.polygon().len(), ring.len());
            let area = outcome.area();
            assert!(area < previous, "area {area} did not shrink below {previous} at d={d}");
            previous = area;
        }
    }
}

#[test]
fn test_offset_preserves_clockwise_winding() {
    let mut ring = SitePolygon::rectangle("cw", 20.0, 15.0).unwrap().points().to_vec();
    ring.reverse();
    let outcome = variable_offset(&ring, &[2.0, 1.0, 1.0, 1.0]).unwrap();

    assert_eq!(polygon::orientation(outcome.polygon()), Orientation::Clockwise);
    assert!(outcome.area() < 300.0);
}

#[test]
fn test_site_from_json_uses_registered_area() {
    let json = r#"{
        "site_id": "parcel-12",
        "points": [[0.0, 0.0], [20.0, 0.0], [20.0, 15.0], [0.0, 15.0], [0.0, 0.0]],
        "registered_area": 298.5
    }"#;
    let site: SitePolygon = serde_json::from_str(json).unwrap();

    assert_eq!(site.edge_count(), 4);
    assert_relative_eq!(site.area(), 298.5);
    assert_relative_eq!(site.computed_area(), 300.0);

    let too_small = r#"{ "site_id": "x", "points": [[0.0, 0.0], [1.0, 0.0]] }"#;
    assert!(serde_json::from_str::<SitePolygon>(too_small).is_err());
}

#[test]
fn test_double_length_frontage_is_single() {
    let site = SitePolygon::rectangle("lot", 20.0, 10.0).unwrap();
    let classification = classify_boundary(site.points(), 6.0).unwrap();

    assert_eq!(classification.road_edge_indices(), vec![0]);
    assert_eq!(classification.configuration, SiteConfiguration::SingleFrontage);
    assert_eq!(classification.neighbor_edges().count(), 3);
}
