// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Height limit reduction across constraint combinations

use approx::assert_relative_eq;
use buildable_regulation::resolver::reduce_limits;
use buildable_regulation::{
    resolve, HeightConstraint, HeightDistrict, HeightLimitBundle, HeightLimitInput,
    RegulatoryProfile, ShadowRegulation, TerrainData, ZoneCategory,
};

#[test]
fn test_final_limit_is_minimum_of_present_limits() {
    // Terrain is the smallest so a subset containing it must pick it
    let values = [18.0, 22.5, 12.0, 30.0, 15.5, 11.0];

    // Every subset of the six ceilings
    for mask in 0u32..64 {
        let pick = |i: usize| (mask & (1 << i) != 0).then_some(values[i]);
        let bundle =
            HeightLimitBundle::from_limits(pick(0), pick(1), pick(2), pick(3), pick(4), pick(5));

        let expected = (0..6)
            .filter_map(pick)
            .fold(f64::INFINITY, f64::min);

        if mask == 0 {
            assert!(bundle.final_limit.is_infinite());
        } else {
            assert_relative_eq!(bundle.final_limit, expected);
            assert!(!bundle.binding_constraints().is_empty());
            assert!(bundle.applicable().all(|(_, v)| v >= bundle.final_limit));
        }
    }
}

#[test]
fn test_single_present_limit_is_final() {
    for (i, constraint) in [
        HeightConstraint::Absolute,
        HeightConstraint::Slope,
        HeightConstraint::HeightDistrict,
        HeightConstraint::Shadow,
        HeightConstraint::DistrictPlan,
        HeightConstraint::TerrainAdjusted,
    ]
    .into_iter()
    .enumerate()
    {
        let only = |j: usize| (i == j).then_some(42.0);
        let bundle =
            HeightLimitBundle::from_limits(only(0), only(1), only(2), only(3), only(4), only(5));
        assert_relative_eq!(bundle.final_limit, 42.0);
        assert_eq!(bundle.binding_constraints(), vec![constraint]);
        assert_eq!(bundle.limit(constraint), Some(42.0));
    }
}

#[test]
fn test_reduce_limits_all_absent() {
    assert!(reduce_limits([None, None, None]).is_infinite());
    assert_relative_eq!(reduce_limits([None, Some(7.0), Some(3.0)]), 3.0);
}

#[test]
fn test_profile_scenario_absolute_binds() {
    let mut profile =
        RegulatoryProfile::new(ZoneCategory::Category2Residential, 60.0, 300.0, 20.0);
    profile.absolute_height_cap = Some(20.0);
    profile.validate().unwrap();

    let input = HeightLimitInput::from_profile(&profile, profile.front_road_width, 0.0, 4.0, None);
    let bundle = resolve(&input).unwrap();

    assert_relative_eq!(bundle.slope.unwrap(), 25.0);
    assert_eq!(bundle.height_district, None);
    assert_eq!(bundle.shadow, None);
    assert_eq!(bundle.district_plan, None);
    assert_relative_eq!(bundle.final_limit, 20.0);
    assert_eq!(bundle.binding_constraints(), vec![HeightConstraint::Absolute]);
}

#[test]
fn test_profile_with_overlays() {
    let mut profile =
        RegulatoryProfile::new(ZoneCategory::Category1MidHighRiseResidential, 60.0, 200.0, 12.0);
    profile.height_district = Some(HeightDistrict::Second);
    profile.shadow = Some(ShadowRegulation::new(4.0, 2.5));

    // North setback of 4 m puts the second-class slant line at 10 m
    let input = HeightLimitInput::from_profile(&profile, 12.0, 2.0, 4.0, Some(13.7));
    let bundle = resolve(&input).unwrap();

    assert_relative_eq!(bundle.slope.unwrap(), 1.25 * 16.0);
    assert_relative_eq!(bundle.height_district.unwrap(), 10.0);
    assert_relative_eq!(bundle.shadow.unwrap(), 13.7);
    assert_relative_eq!(bundle.final_limit, 10.0);
    assert_eq!(
        bundle.binding_constraints(),
        vec![HeightConstraint::HeightDistrict]
    );
}

#[test]
fn test_terrain_profile_keeps_raw_slope_in_reduction() {
    let mut profile =
        RegulatoryProfile::new(ZoneCategory::Category1Residential, 60.0, 200.0, 8.0);
    profile.terrain = Some(TerrainData {
        elevation_above_road: 4.0,
    });

    let input = HeightLimitInput::from_profile(&profile, 8.0, 0.0, 0.0, None);
    let bundle = resolve(&input).unwrap();

    assert_relative_eq!(bundle.terrain_adjusted.unwrap(), 11.5);
    assert_relative_eq!(bundle.final_limit, 10.0);
    assert_eq!(bundle.binding_constraints(), vec![HeightConstraint::Slope]);
}
