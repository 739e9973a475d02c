// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Buildable Massing
//!
//! Turns a classified site and its resolved limits into a stack of floors,
//! then splits the floor area into private and common space and checks the
//! result against each regulation.

pub mod breakdown;
pub mod error;
pub mod generator;
pub mod program;

pub use breakdown::{
    compute_breakdown, ComplianceContext, ComplianceItem, ComplianceRow, FloorBreakdown,
    VolumeBreakdown,
};
pub use error::{Error, Result};
pub use generator::{
    edge_setbacks, generate_massing, north_setback, plan_footprint, road_setback, stack_floors,
    EdgeSetback, Floor, FootprintPlan, MassingLimits, MassingResult, SetbackReason, SetbackRules,
    TighteningConfig, TighteningOutcome,
};
pub use program::{AssetCategory, BuildingProgram};
