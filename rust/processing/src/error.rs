// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Study pipeline errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Geometry(#[from] buildable_geometry::Error),

    #[error(transparent)]
    Regulation(#[from] buildable_regulation::Error),

    #[error(transparent)]
    Massing(#[from] buildable_massing::Error),

    #[error(transparent)]
    Finance(#[from] buildable_finance::Error),
}
