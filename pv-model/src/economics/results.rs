use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// One row of the lifetime ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./economics.ts")]
pub struct YearlyResult {
    /// Year of operation, starting at 1
    pub year: u32,
    /// Production after system losses and degradation in kWh
    pub production_kwh: f64,
    /// Energy used on-site in kWh
    pub self_consumption_kwh: f64,
    /// Energy sold to the grid in kWh
    pub exported_kwh: f64,
    /// Income of this year in NOK, before the inflation adjustment
    pub income: f64,
    /// Running total of inflation-adjusted income in NOK
    pub cumulative_cash_flow: f64,
}

/// Outcome of a lifetime projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./economics.ts")]
pub struct ProjectionSummary {
    pub years: Vec<YearlyResult>,
    /// Final cumulative cash flow minus the investment cost
    pub total_profit: f64,
    /// First year in which the cumulative cash flow covers the investment
    pub payback_years: Option<u32>,
}

impl ProjectionSummary {
    pub fn final_cumulative_cash_flow(&self) -> f64 {
        self.years
            .last()
            .map(|year| year.cumulative_cash_flow)
            .unwrap_or(0.0)
    }

    pub fn total_production_kwh(&self) -> f64 {
        self.years.iter().map(|year| year.production_kwh).sum()
    }

    pub fn total_income(&self) -> f64 {
        self.years.iter().map(|year| year.income).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: u32, income: f64, cumulative_cash_flow: f64) -> YearlyResult {
        YearlyResult {
            year,
            production_kwh: 100.0,
            self_consumption_kwh: 60.0,
            exported_kwh: 40.0,
            income,
            cumulative_cash_flow,
        }
    }

    #[test]
    fn test_summary_totals() {
        let summary = ProjectionSummary {
            years: vec![row(1, 50.0, 50.0), row(2, 50.0, 105.0)],
            total_profit: 5.0,
            payback_years: Some(2),
        };

        assert_eq!(summary.final_cumulative_cash_flow(), 105.0);
        assert_eq!(summary.total_production_kwh(), 200.0);
        assert_eq!(summary.total_income(), 100.0);
    }

    #[test]
    fn test_empty_summary_has_no_cash_flow() {
        let summary = ProjectionSummary {
            years: Vec::new(),
            total_profit: -10.0,
            payback_years: None,
        };

        assert_eq!(summary.final_cumulative_cash_flow(), 0.0);
    }
}
