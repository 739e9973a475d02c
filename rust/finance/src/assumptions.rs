// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Financial assumptions. Rates are percentages.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialAssumptions {
    #[serde(default)]
    pub land_price: f64,
    /// Rent per square meter of private area per month
    pub rent_per_area: f64,
    pub occupancy_rate: f64,
    /// Operating expenses as a share of rental income
    pub management_cost_rate: f64,
    /// Construction cost per square meter of total floor area
    pub construction_cost_per_area: f64,
    pub holding_period_years: u32,
    /// Exit cap rate
    pub cap_rate: f64,
    /// Discount rate for NPV; the cap rate when absent
    #[serde(default)]
    pub discount_rate: Option<f64>,
}

impl FinancialAssumptions {
    pub fn discount_rate(&self) -> f64 {
        self.discount_rate.unwrap_or(self.cap_rate)
    }

    pub fn validate(&self) -> Result<()> {
        non_negative("land price", self.land_price)?;
        non_negative("rent per area", self.rent_per_area)?;
        non_negative("construction cost per area", self.construction_cost_per_area)?;
        non_negative("management cost rate", self.management_cost_rate)?;

        if !(0.0..=100.0).contains(&self.occupancy_rate) {
            return Err(Error::InvalidAssumption(format!(
                "occupancy rate must be in [0, 100], got {}",
                self.occupancy_rate
            )));
        }
        if !(self.cap_rate.is_finite() && self.cap_rate > 0.0) {
            return Err(Error::InvalidAssumption(format!(
                "cap rate must be positive, got {}",
                self.cap_rate
            )));
        }
        if let Some(rate) = self.discount_rate {
            if !(rate.is_finite() && rate > -100.0) {
                return Err(Error::InvalidAssumption(format!(
                    "discount rate must be above -100%, got {rate}"
                )));
            }
        }
        if self.holding_period_years == 0 {
            return Err(Error::InvalidAssumption(
                "holding period must be at least one year".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidAssumption(format!(
            "{name} must be non-negative, got {value}"
        )))
    }
}

/// Price a massing for a named site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityRequest {
    pub site_id: String,
    pub assumptions: FinancialAssumptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FinancialAssumptions {
        FinancialAssumptions {
            land_price: 30_000_000.0,
            rent_per_area: 3_500.0,
            occupancy_rate: 95.0,
            management_cost_rate: 10.0,
            construction_cost_per_area: 250_000.0,
            holding_period_years: 10,
            cap_rate: 4.5,
            discount_rate: None,
        }
    }

    #[test]
    fn test_discount_rate_defaults_to_cap_rate() {
        let mut a = sample();
        assert_eq!(a.discount_rate(), 4.5);
        a.discount_rate = Some(6.0);
        assert_eq!(a.discount_rate(), 6.0);
    }

    #[test]
    fn test_validate() {
        let mut a = sample();
        assert!(a.validate().is_ok());

        a.occupancy_rate = 120.0;
        assert!(a.validate().is_err());

        a.occupancy_rate = 95.0;
        a.cap_rate = 0.0;
        assert!(a.validate().is_err());

        a.cap_rate = 4.5;
        a.holding_period_years = 0;
        assert!(a.validate().is_err());
    }

    #[test]
    fn test_optional_fields_default_from_json() {
        let json = r#"{
            "rent_per_area": 3500.0,
            "occupancy_rate": 95.0,
            "management_cost_rate": 10.0,
            "construction_cost_per_area": 300000.0,
            "holding_period_years": 10,
            "cap_rate": 4.0
        }"#;
        let a: FinancialAssumptions = serde_json::from_str(json).unwrap();
        assert_eq!(a.land_price, 0.0);
        assert_eq!(a.discount_rate, None);
        assert_eq!(a.discount_rate(), 4.0);
        assert!(a.validate().is_ok());
    }
}
