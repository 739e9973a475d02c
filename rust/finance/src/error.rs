// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for financial modeling
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid financial assumption: {0}")]
    InvalidAssumption(String),

    #[error("Massing belongs to site {massing_site}, request names site {requested_site}")]
    SiteMismatch {
        requested_site: String,
        massing_site: String,
    },

    #[error(
        "Breakdown ({breakdown_floors} floors, {breakdown_area} m²) does not match massing \
         ({massing_floors} floors, {massing_area} m²)"
    )]
    BreakdownMismatch {
        massing_floors: usize,
        massing_area: f64,
        breakdown_floors: usize,
        breakdown_area: f64,
    },
}
