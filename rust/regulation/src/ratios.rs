// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Effective coverage and floor area ratios
//!
//! The legal ratios in a profile are adjusted by site conditions before they
//! bound the massing: corner lots and fire-resistant construction in fire
//! districts relax coverage, narrow front roads tighten FAR.

use crate::profile::{FireZone, RegulatoryProfile};
use buildable_geometry::SiteConfiguration;

/// Roads at least this wide do not reduce the floor area ratio
pub const ROAD_FAR_THRESHOLD: f64 = 12.0;

/// Coverage relaxation for corner lots and fire-resistant construction
pub const COVERAGE_BONUS: f64 = 10.0;

/// Coverage ratio after corner-lot and fire-zone relaxations, percent
pub fn effective_coverage_ratio(
    profile: &RegulatoryProfile,
    configuration: SiteConfiguration,
    fire_resistant: bool,
) -> f64 {
    let legal = profile.coverage_ratio;

    // Fire-resistant buildings in a fire district at 80% are uncapped
    if fire_resistant && profile.fire_zone == FireZone::Fire && legal >= 80.0 {
        return 100.0;
    }

    let mut ratio = legal;
    if configuration == SiteConfiguration::CornerLot {
        ratio += COVERAGE_BONUS;
    }
    if fire_resistant && matches!(profile.fire_zone, FireZone::Fire | FireZone::QuasiFire) {
        ratio += COVERAGE_BONUS;
    }

    ratio.min(100.0)
}

/// Floor area ratio after the front-road width reduction, percent
pub fn effective_floor_area_ratio(profile: &RegulatoryProfile, road_width: f64) -> f64 {
    if road_width >= ROAD_FAR_THRESHOLD {
        return profile.floor_area_ratio;
    }

    let road_cap = road_width * profile.zone.road_far_multiplier();
    profile.floor_area_ratio.min(road_cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ZoneCategory;
    use approx::assert_relative_eq;

    #[test]
    fn test_corner_lot_bonus() {
        let profile = RegulatoryProfile::new(ZoneCategory::Category1Residential, 60.0, 200.0, 6.0);
        assert_relative_eq!(
            effective_coverage_ratio(&profile, SiteConfiguration::CornerLot, false),
            70.0
        );
        assert_relative_eq!(
            effective_coverage_ratio(&profile, SiteConfiguration::SingleFrontage, false),
            60.0
        );
    }

    #[test]
    fn test_fire_zone_bonus_stacks_with_corner() {
        let mut profile = RegulatoryProfile::new(ZoneCategory::Commercial, 60.0, 400.0, 8.0);
        profile.fire_zone = FireZone::QuasiFire;
        assert_relative_eq!(
            effective_coverage_ratio(&profile, SiteConfiguration::CornerLot, true),
            80.0
        );
        // Not fire resistant: no fire bonus
        assert_relative_eq!(
            effective_coverage_ratio(&profile, SiteConfiguration::SingleFrontage, false),
            60.0
        );
    }

    #[test]
    fn test_fire_zone_at_eighty_is_uncapped() {
        let mut profile = RegulatoryProfile::new(ZoneCategory::Commercial, 80.0, 600.0, 15.0);
        profile.fire_zone = FireZone::Fire;
        assert_relative_eq!(
            effective_coverage_ratio(&profile, SiteConfiguration::SingleFrontage, true),
            100.0
        );
    }

    #[test]
    fn test_narrow_road_reduces_far() {
        let residential = RegulatoryProfile::new(ZoneCategory::Category1Residential, 60.0, 300.0, 6.0);
        assert_relative_eq!(effective_floor_area_ratio(&residential, 6.0), 240.0);
        assert_relative_eq!(effective_floor_area_ratio(&residential, 4.0), 160.0);
        assert_relative_eq!(effective_floor_area_ratio(&residential, 12.0), 300.0);

        let commercial = RegulatoryProfile::new(ZoneCategory::Commercial, 80.0, 600.0, 8.0);
        assert_relative_eq!(effective_floor_area_ratio(&commercial, 8.0), 480.0);
        assert_relative_eq!(effective_floor_area_ratio(&commercial, 11.0), 600.0);
    }
}
