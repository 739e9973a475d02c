// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Discounted cash flow measures
//!
//! Rates here are fractions (0.05 = 5%). Cash flow `t` occurs at the end of
//! year `t`; index 0 is the initial outlay.

use serde::{Deserialize, Serialize};

/// Rate reported when the root finder cannot produce an IRR, percent
pub const IRR_SENTINEL: f64 = -100.0;

/// Derivatives smaller than this stop the Newton iteration
const MIN_DERIVATIVE: f64 = 1e-12;

/// Newton-Raphson settings for the IRR search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrrConfig {
    /// Starting rate as a fraction
    pub initial_guess: f64,
    /// Stop once a step is smaller than this
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for IrrConfig {
    fn default() -> Self {
        Self {
            initial_guess: 0.10,
            tolerance: 1e-4,
            max_iterations: 1000,
        }
    }
}

/// IRR search result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrrEstimate {
    /// Rate in percent; [`IRR_SENTINEL`] when not converged
    pub rate: f64,
    pub converged: bool,
    pub iterations: u32,
}

impl IrrEstimate {
    fn failed(iterations: u32) -> Self {
        Self {
            rate: IRR_SENTINEL,
            converged: false,
            iterations,
        }
    }

    /// The rate as a fraction, when the search converged
    pub fn as_fraction(&self) -> Option<f64> {
        self.converged.then_some(self.rate / 100.0)
    }
}

/// Net present value of `cash_flows` at `rate`
pub fn npv(rate: f64, cash_flows: &[f64]) -> f64 {
    let base = 1.0 + rate;
    cash_flows
        .iter()
        .enumerate()
        .map(|(t, cf)| cf / base.powi(t as i32))
        .sum()
}

/// d(NPV)/d(rate)
fn npv_derivative(rate: f64, cash_flows: &[f64]) -> f64 {
    let base = 1.0 + rate;
    cash_flows
        .iter()
        .enumerate()
        .skip(1)
        .map(|(t, cf)| -(t as f64) * cf / base.powi(t as i32 + 1))
        .sum()
}

/// Internal rate of return by Newton-Raphson
///
/// Stops with the sentinel when the iterate leaves `(-100%, ∞)`, the
/// derivative vanishes, or the iteration budget runs out.
pub fn irr(cash_flows: &[f64], config: &IrrConfig) -> IrrEstimate {
    let mut rate = config.initial_guess;

    for iteration in 1..=config.max_iterations {
        if !(rate.is_finite() && rate > -1.0) {
            return IrrEstimate::failed(iteration);
        }

        let value = npv(rate, cash_flows);
        let slope = npv_derivative(rate, cash_flows);
        if slope.abs() < MIN_DERIVATIVE {
            return IrrEstimate::failed(iteration);
        }

        let next = rate - value / slope;
        if !(next.is_finite() && next > -1.0) {
            return IrrEstimate::failed(iteration);
        }
        if (next - rate).abs() < config.tolerance {
            return IrrEstimate {
                rate: next * 100.0,
                converged: true,
                iterations: iteration,
            };
        }
        rate = next;
    }

    tracing::warn!(
        iterations = config.max_iterations,
        last_rate = rate,
        "IRR search did not converge"
    );
    IrrEstimate::failed(config.max_iterations)
}

/// Outlay, holding-period NOI, and NOI plus exit value in the final year
pub fn cash_flows(investment: f64, annual_noi: f64, years: u32, exit_value: f64) -> Vec<f64> {
    let mut flows = Vec::with_capacity(years as usize + 1);
    flows.push(-investment);
    for year in 1..=years {
        if year == years {
            flows.push(annual_noi + exit_value);
        } else {
            flows.push(annual_noi);
        }
    }
    flows
}
