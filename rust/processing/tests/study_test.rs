// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end studies through the pipeline

use approx::assert_relative_eq;
use buildable_processing::{run_batch, run_study, BatchOutcome, StudyConfig, StudyRequest};

const REQUEST: &str = r#"{
    "site": {
        "site_id": "tokyo-001",
        "points": [
            [0.0, 0.0],
            [24.0, 0.0],
            [24.0, 16.0],
            [0.0, 16.0]
        ]
    },
    "profile": {
        "zone": "category1_mid_high_rise_residential",
        "fire_zone": "quasi_fire",
        "coverage_ratio": 60.0,
        "floor_area_ratio": 200.0,
        "front_road_width": 6.0,
        "height_district": { "kind": "second" },
        "shadow": { "allowed_hours_near": 4.0, "allowed_hours_far": 2.5 }
    },
    "program": {
        "asset_category": "residential",
        "floor_height": 3.0,
        "fire_resistant": true
    },
    "profitability": {
        "site_id": "tokyo-001",
        "assumptions": {
            "land_price": 150000000.0,
            "rent_per_area": 3800.0,
            "occupancy_rate": 95.0,
            "management_cost_rate": 8.0,
            "construction_cost_per_area": 320000.0,
            "holding_period_years": 10,
            "cap_rate": 4.0
        }
    }
}"#;

fn request() -> StudyRequest {
    serde_json::from_str(REQUEST).unwrap()
}

#[test]
fn test_full_study_respects_every_limit() {
    let report = run_study(&request(), &StudyConfig::default()).unwrap();
    let massing = &report.massing;

    // Fire-resistant construction in a quasi-fire zone earns 10 points
    assert_relative_eq!(report.effective_coverage_ratio, 70.0);
    assert_relative_eq!(report.effective_floor_area_ratio, 200.0);

    let site_area = 24.0 * 16.0;
    assert!(massing.footprint_area <= site_area * 0.7 + 1e-6);
    assert!(massing.total_floor_area <= massing.volume_cap + 1e-6);
    assert!(massing.height <= report.height_limits.final_limit + 1e-9);
    assert!(report.height_limits.height_district.is_some());
    assert!(!report.height_limits.binding_constraints().is_empty());

    let shadow = report.shadow.as_ref().unwrap();
    assert!(shadow.simulation.compliant);
    assert_relative_eq!(shadow.simulation.measurement_height, 4.0);

    for floor in &report.breakdown.floors {
        assert_relative_eq!(
            floor.private_area + floor.common_area,
            floor.floor_area,
            epsilon = 1e-9
        );
    }
    assert!(report.breakdown.is_compliant());

    let financials = report.financials.as_ref().unwrap();
    assert_eq!(financials.site_id, "tokyo-001");
    assert_eq!(financials.ledger.len(), 10);
}

#[test]
fn test_report_serializes_to_json() {
    let report = run_study(&request(), &StudyConfig::default()).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["site_id"], "tokyo-001");
    assert!(json["massing"]["floors"].is_array());
    assert!(json["height_limits"]["final_limit"].is_number());
}

#[test]
fn test_mismatched_profitability_site_fails() {
    let mut req = request();
    if let Some(p) = req.profitability.as_mut() {
        p.site_id = "osaka-002".to_string();
    }
    assert!(run_study(&req, &StudyConfig::default()).is_err());
}

#[test]
fn test_batch_keeps_order_and_isolates_failures() {
    let mut requests = Vec::new();
    for i in 0..6 {
        let mut req = request();
        req.site.site_id = format!("site-{i}");
        req.profitability = None;
        req.profile.shadow = None;
        if i == 3 {
            req.program.floor_height = -1.0;
        }
        requests.push(req);
    }

    let outcomes = run_batch(&requests, &StudyConfig::default());
    assert_eq!(outcomes.len(), 6);

    for (i, outcome) in outcomes.iter().enumerate() {
        match outcome {
            BatchOutcome::Ok { report } => {
                assert_ne!(i, 3);
                assert_eq!(report.site_id, format!("site-{i}"));
            }
            BatchOutcome::Error { site_id, .. } => {
                assert_eq!(i, 3);
                assert_eq!(site_id, "site-3");
            }
        }
    }
}

#[test]
fn test_surveyed_road_edges_mark_corner_lot() {
    let mut req = request();
    req.road_edges = Some(vec![0, 1]);
    req.profile.shadow = None;
    req.profitability = None;

    let report = run_study(&req, &StudyConfig::default()).unwrap();
    assert!(report.classification.is_corner_lot());
    // Corner lot and fire-resistant bonuses stack
    assert_relative_eq!(report.effective_coverage_ratio, 80.0);
}
