// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Steady-state investment model
//!
//! Income and costs are flat across the holding period; there is no rent
//! escalation or cost inflation.

use crate::assumptions::{FinancialAssumptions, ProfitabilityRequest};
use crate::error::{Error, Result};
use crate::returns::{self, IrrConfig, IrrEstimate};
use buildable_massing::{MassingResult, VolumeBreakdown};
use serde::{Deserialize, Serialize};

/// Miscellaneous expenses as a share of construction cost
pub const MISC_EXPENSE_RATE: f64 = 0.04;

/// Annual maintenance as a share of construction cost
pub const MAINTENANCE_RATE: f64 = 0.01;

/// Annual property tax as a share of total investment
pub const PROPERTY_TAX_RATE: f64 = 0.01;

/// Relative slack when matching a breakdown to its massing
const AREA_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvestmentBreakdown {
    pub land_price: f64,
    pub construction_cost: f64,
    pub misc_expenses: f64,
    pub total_investment: f64,
}

impl InvestmentBreakdown {
    pub fn new(land_price: f64, total_floor_area: f64, construction_cost_per_area: f64) -> Self {
        let construction_cost = total_floor_area * construction_cost_per_area;
        let misc_expenses = construction_cost * MISC_EXPENSE_RATE;
        Self {
            land_price,
            construction_cost,
            misc_expenses,
            total_investment: land_price + construction_cost + misc_expenses,
        }
    }
}

/// Income and expenses of one operating year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatingFigures {
    pub rental_income: f64,
    pub operating_expenses: f64,
    pub maintenance: f64,
    pub property_tax: f64,
    pub noi: f64,
}

impl OperatingFigures {
    pub fn steady_state(
        private_area: f64,
        assumptions: &FinancialAssumptions,
        investment: &InvestmentBreakdown,
    ) -> Self {
        let rental_income =
            private_area * assumptions.rent_per_area * 12.0 * assumptions.occupancy_rate / 100.0;
        let operating_expenses = rental_income * assumptions.management_cost_rate / 100.0;
        let maintenance = investment.construction_cost * MAINTENANCE_RATE;
        let property_tax = investment.total_investment * PROPERTY_TAX_RATE;

        Self {
            rental_income,
            operating_expenses,
            maintenance,
            property_tax,
            noi: rental_income - (operating_expenses + maintenance + property_tax),
        }
    }

    pub fn total_expenses(&self) -> f64 {
        self.operating_expenses + self.maintenance + self.property_tax
    }
}

/// One row of the holding-period ledger
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerYear {
    pub year: u32,
    #[serde(flatten)]
    pub figures: OperatingFigures,
    /// Sale proceeds, only in the final year
    pub exit_value: f64,
    pub cash_flow: f64,
    pub discounted_cash_flow: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialResult {
    pub site_id: String,
    pub investment: InvestmentBreakdown,
    pub annual: OperatingFigures,
    /// NOI over total investment, percent
    pub noi_yield: f64,
    /// Years of NOI to recover the investment; absent when NOI is not positive
    pub payback_years: Option<f64>,
    pub exit_value: f64,
    pub irr: IrrEstimate,
    pub npv: f64,
    /// Rate used for NPV, percent
    pub discount_rate: f64,
    pub ledger: Vec<LedgerYear>,
}

/// The breakdown must describe the same floors as the massing
fn check_breakdown(massing: &MassingResult, breakdown: &VolumeBreakdown) -> Result<()> {
    let tolerance = AREA_TOLERANCE * massing.total_floor_area.abs().max(1.0);
    let same_floors = breakdown.floors.len() == massing.floor_count();
    let same_area = (breakdown.total_floor_area - massing.total_floor_area).abs() <= tolerance;
    if same_floors && same_area {
        return Ok(());
    }
    Err(Error::BreakdownMismatch {
        massing_floors: massing.floor_count(),
        massing_area: massing.total_floor_area,
        breakdown_floors: breakdown.floors.len(),
        breakdown_area: breakdown.total_floor_area,
    })
}

/// Price a massing and its floor breakdown
///
/// The massing must belong to the site the request names and the breakdown
/// must describe that massing.
pub fn evaluate(
    request: &ProfitabilityRequest,
    massing: &MassingResult,
    breakdown: &VolumeBreakdown,
    irr_config: &IrrConfig,
) -> Result<FinancialResult> {
    if request.site_id != massing.site_id {
        return Err(Error::SiteMismatch {
            requested_site: request.site_id.clone(),
            massing_site: massing.site_id.clone(),
        });
    }
    check_breakdown(massing, breakdown)?;
    let assumptions = &request.assumptions;
    assumptions.validate()?;

    let investment = InvestmentBreakdown::new(
        assumptions.land_price,
        breakdown.total_floor_area,
        assumptions.construction_cost_per_area,
    );
    let annual =
        OperatingFigures::steady_state(breakdown.total_private_area, assumptions, &investment);

    let total = investment.total_investment;
    let noi_yield = if total > 0.0 {
        annual.noi / total * 100.0
    } else {
        0.0
    };
    let payback_years = (annual.noi > 0.0).then(|| total / annual.noi);
    let exit_value = annual.noi / (assumptions.cap_rate / 100.0);

    let years = assumptions.holding_period_years;
    let flows = returns::cash_flows(total, annual.noi, years, exit_value);
    let discount = assumptions.discount_rate() / 100.0;
    let irr = returns::irr(&flows, irr_config);
    let npv = returns::npv(discount, &flows);

    let ledger = (1..=years)
        .map(|year| {
            let cash_flow = flows[year as usize];
            LedgerYear {
                year,
                figures: annual,
                exit_value: if year == years { exit_value } else { 0.0 },
                cash_flow,
                discounted_cash_flow: cash_flow / (1.0 + discount).powi(year as i32),
            }
        })
        .collect();

    tracing::info!(
        site_id = %massing.site_id,
        total_investment = total,
        noi = annual.noi,
        irr = irr.rate,
        irr_converged = irr.converged,
        npv,
        "Financial model evaluated"
    );

    Ok(FinancialResult {
        site_id: massing.site_id.clone(),
        investment,
        annual,
        noi_yield,
        payback_years,
        exit_value,
        irr,
        npv,
        discount_rate: assumptions.discount_rate(),
        ledger,
    })
}
