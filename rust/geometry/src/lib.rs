// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Buildable Geometry
//!
//! Site boundary kernel for buildable-volume studies: polygon measurement,
//! per-edge inward offsetting (setbacks) and road frontage classification,
//! built on nalgebra points and i_overlay for 2D unions.

pub mod classify;
pub mod error;
pub mod offset;
pub mod polygon;
pub mod site;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Vector2};

pub use classify::{
    classify_boundary, classify_with_roads, BoundaryClassification, BoundarySegment,
    ClassificationConfidence, Frontage, SiteConfiguration,
};
pub use error::{Error, Result};
pub use offset::{merging_offset, uniform_offset, variable_offset, MergedOffset, OffsetOutcome};
pub use polygon::{area, perimeter, Orientation, Shape};
pub use site::{SitePolygon, SurveyedCoordinate};
