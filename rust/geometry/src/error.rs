// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during site geometry processing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid polygon: {0}")]
    InvalidPolygon(String),

    #[error("Setback list has {got} distances but the polygon has {expected} edges")]
    SetbackCountMismatch { expected: usize, got: usize },

    #[error("Invalid setback distance on edge {edge}: {value}")]
    InvalidSetback { edge: usize, value: f64 },

    #[error("Invalid road edge index {index} for a boundary with {edge_count} edges")]
    InvalidRoadEdge { index: usize, edge_count: usize },

    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
}
