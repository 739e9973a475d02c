// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Buildable Processing
//!
//! Study pipeline shared by the command line tool and embedding services:
//! one call runs classification, massing, regulation checks and, when
//! requested, the financial model for a parcel.

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::CliConfig;
pub use error::{Error, Result};
pub use pipeline::{
    run_batch, run_study, BatchOutcome, ShadowReport, StudyConfig, StudyReport, StudyRequest,
};
