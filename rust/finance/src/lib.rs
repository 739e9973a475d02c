// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Buildable Finance
//!
//! Investment, steady-state income and discounted returns for a generated
//! massing. IRR comes from a bounded Newton-Raphson search that reports
//! failure with a `-100%` sentinel instead of an error.

pub mod assumptions;
pub mod error;
pub mod model;
pub mod returns;

pub use assumptions::{FinancialAssumptions, ProfitabilityRequest};
pub use error::{Error, Result};
pub use model::{evaluate, FinancialResult, InvestmentBreakdown, LedgerYear, OperatingFigures};
pub use returns::{cash_flows, irr, npv, IrrConfig, IrrEstimate, IRR_SENTINEL};
