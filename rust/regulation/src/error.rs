// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for regulation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while validating or evaluating zoning rules
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid regulatory profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid shadow simulation parameters: {0}")]
    InvalidShadowParameters(String),

    #[error("Geometry error: {0}")]
    Geometry(#[from] buildable_geometry::Error),
}
