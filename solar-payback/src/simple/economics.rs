use pv_model::{EconomicParameters, HourlySeries, ProjectionSummary, VAT_MULTIPLIER, YearlyResult};
use tracing::debug;

use crate::error::ProjectionError;

/// Split of one hour's production into on-site use and grid export
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyBalance {
    pub self_consumption: f64,
    pub surplus: f64,
}

impl HourlyBalance {
    pub fn new(production: f64, consumption: f64) -> Self {
        Self {
            self_consumption: production.min(consumption),
            surplus: (production - consumption).max(0.0),
        }
    }
}

/// Energy and money totals of a single projected year
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct YearLedger {
    production: f64,
    self_consumption: f64,
    exported: f64,
    self_consumption_value: f64,
    export_value: f64,
}

impl YearLedger {
    fn income(&self) -> f64 {
        self.self_consumption_value + self.export_value
    }
}

/// Checks the parameter ranges the projection relies on
pub fn validate_parameters(params: &EconomicParameters) -> Result<(), ProjectionError> {
    if params.lifetime_years < 1 {
        return Err(ProjectionError::InvalidParameter {
            name: "lifetime_years",
            value: params.lifetime_years as f64,
            reason: "must be at least 1",
        });
    }
    if !(0.0..1.0).contains(&params.degradation_per_year) {
        return Err(ProjectionError::InvalidParameter {
            name: "degradation_per_year",
            value: params.degradation_per_year,
            reason: "must be in [0, 1)",
        });
    }
    if !(0.0..1.0).contains(&params.system_losses) {
        return Err(ProjectionError::InvalidParameter {
            name: "system_losses",
            value: params.system_losses,
            reason: "must be in [0, 1)",
        });
    }
    if !params.investment_cost.is_finite() {
        return Err(ProjectionError::InvalidParameter {
            name: "investment_cost",
            value: params.investment_cost,
            reason: "must be finite",
        });
    }
    Ok(())
}

/// Project the yearly and cumulative cash flow of a PV system over its lifetime.
///
/// The three series describe one representative year and must have the same
/// length. They are sorted by timestamp and then combined by position. Every
/// projected year reuses the same hourly shape, scaled by system losses and
/// compounding degradation.
///
/// Two behaviours show up in the results:
/// * export income follows the spot price without a floor, so negative spot
///   prices reduce the yearly income and can make the cumulative cash flow fall;
/// * `YearlyResult::income` is the nominal figure, while the cumulative cash flow
///   adds the income multiplied by `(1 + inflation)^(year - 1)`.
pub fn project(
    production: &HourlySeries,
    spot_price: &HourlySeries,
    consumption: &HourlySeries,
    params: &EconomicParameters,
) -> Result<ProjectionSummary, ProjectionError> {
    validate_parameters(params)?;

    if production.len() != spot_price.len() || production.len() != consumption.len() {
        return Err(ProjectionError::DimensionMismatch {
            production: production.len(),
            spot_price: spot_price.len(),
            consumption: consumption.len(),
        });
    }

    let production = production.sorted();
    let spot_price = spot_price.sorted();
    let consumption = consumption.sorted();

    Ok(run_projection(
        production.values(),
        spot_price.values(),
        consumption.values(),
        params,
    ))
}

fn run_projection(
    production: &[f64],
    spot_price: &[f64],
    consumption: &[f64],
    params: &EconomicParameters,
) -> ProjectionSummary {
    // System losses are applied once to the base profile
    let base_production: Vec<f64> = production
        .iter()
        .map(|&value| value * (1.0 - params.system_losses))
        .collect();

    let mut years = Vec::with_capacity(params.lifetime_years as usize);
    let mut cumulative_cash_flow = 0.0;
    let mut payback_years = None;

    for year in 1..=params.lifetime_years {
        let elapsed = (year - 1) as i32;
        let degradation_factor = (1.0 - params.degradation_per_year).powi(elapsed);

        let ledger = project_year(
            &base_production,
            degradation_factor,
            spot_price,
            consumption,
            params,
        );
        let income = ledger.income();

        let inflation_adjustment = (1.0 + params.inflation_rate).powi(elapsed);
        cumulative_cash_flow += income * inflation_adjustment;

        if payback_years.is_none() && cumulative_cash_flow >= params.investment_cost {
            payback_years = Some(year);
        }

        debug!(
            year,
            production_kwh = ledger.production,
            self_consumption_kwh = ledger.self_consumption,
            exported_kwh = ledger.exported,
            income,
            cumulative_cash_flow,
            "projected year"
        );

        years.push(YearlyResult {
            year,
            production_kwh: ledger.production,
            self_consumption_kwh: ledger.self_consumption,
            exported_kwh: ledger.exported,
            income,
            cumulative_cash_flow,
        });
    }

    ProjectionSummary {
        years,
        total_profit: cumulative_cash_flow - params.investment_cost,
        payback_years,
    }
}

fn project_year(
    base_production: &[f64],
    degradation_factor: f64,
    spot_price: &[f64],
    consumption: &[f64],
    params: &EconomicParameters,
) -> YearLedger {
    base_production
        .iter()
        .zip(spot_price.iter())
        .zip(consumption.iter())
        .fold(
            YearLedger::default(),
            |mut ledger, ((&base, &spot), &demand)| {
                let produced = base * degradation_factor;
                let balance = HourlyBalance::new(produced, demand);

                ledger.production += produced;
                ledger.self_consumption += balance.self_consumption;
                ledger.exported += balance.surplus;
                ledger.self_consumption_value += balance.self_consumption * retail_price(spot, params);
                ledger.export_value += balance.surplus * spot;
                ledger
            },
        )
}

/// Price avoided per self-consumed kWh: energy price plus grid tariff, with VAT
fn retail_price(spot: f64, params: &EconomicParameters) -> f64 {
    (params.price_mode.consumption_price(spot) + params.grid_tariff) * VAT_MULTIPLIER
}
