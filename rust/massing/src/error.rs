// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for massing operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while generating a massing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid building program: {0}")]
    InvalidProgram(String),

    #[error("Invalid massing limit: {0}")]
    InvalidLimit(String),

    #[error("Setbacks leave no buildable footprint on site {site_id}")]
    NoBuildableFootprint { site_id: String },

    #[error("Geometry error: {0}")]
    Geometry(#[from] buildable_geometry::Error),
}
