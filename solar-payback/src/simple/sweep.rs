use anyhow::{Context, Result, anyhow};
use indexmap::IndexMap;
use pv_model::{HourlySeries, MonthlyConsumption, PriceMode, ProjectionSummary};
use tracing::{info, warn};

use crate::general::electricity_demand::{
    ConsumptionFilter, adoption_factor, apparent_adoption_factor, average_monthly_consumption,
    consumption_for_year, load_consumption_csv,
};
use crate::general::finance::{LoanCost, amortize};
use crate::general::production::{expand_day_profiles, load_production_profiles_xlsx};
use crate::general::spot_price::load_spot_prices_xlsx;
use crate::simple::config::ScenarioConfig;
use crate::simple::economics::project;

/// Aligned input series of one representative year
#[derive(Debug, Clone)]
pub struct YearInputs {
    pub year: i32,
    pub production: HourlySeries,
    pub spot_price: HourlySeries,
    pub consumption: HourlySeries,
}

/// Result of one price mode / year / adoption combination
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub price_mode: PriceMode,
    pub year: i32,
    pub adoption_applied: bool,
    pub loan: LoanCost,
    pub summary: ProjectionSummary,
}

impl ScenarioOutcome {
    pub fn label(&self) -> String {
        scenario_label(&self.price_mode, self.year, self.adoption_applied)
    }
}

fn scenario_label(price_mode: &PriceMode, year: i32, adoption_applied: bool) -> String {
    let adoption = if adoption_applied {
        "adoption"
    } else {
        "average"
    };
    format!("{} / {} / {}", price_mode.label(), year, adoption)
}

/// Run the projection for every price mode, year and adoption setting.
///
/// The investment cost is the total repayment of the configured loan. When
/// monthly adoption factors are given, every year is evaluated once with the
/// consumption scaled by them and once with the plain average profile.
pub fn evaluate_scenarios(
    config: &ScenarioConfig,
    inputs: &[YearInputs],
    adoption: Option<&[f64; 12]>,
) -> Result<IndexMap<String, ScenarioOutcome>> {
    let loan = amortize(
        config.investment_amount,
        config.loan_annual_rate,
        config.loan_years,
    )?;
    info!(
        total_cost = loan.total_payment,
        total_interest = loan.total_interest,
        "financed investment"
    );

    let adoption_settings: &[bool] = if adoption.is_some() {
        &[true, false]
    } else {
        &[false]
    };

    let mut outcomes = IndexMap::new();
    for price_mode in &config.price_modes {
        info!(price_mode = %price_mode.label(), "evaluating price mode");
        let params = config
            .economics
            .with_price_mode(*price_mode)
            .with_investment_cost(loan.total_payment);

        for inputs in inputs {
            for &adoption_applied in adoption_settings {
                let consumption = match adoption {
                    Some(factors) if adoption_applied => {
                        let hourly_factors = apparent_adoption_factor(factors, inputs.year)?;
                        inputs
                            .consumption
                            .multiply(&hourly_factors)
                            .map_err(|e| anyhow!(e))
                            .with_context(|| {
                                format!("Adoption factor does not fit year {}", inputs.year)
                            })?
                    }
                    _ => inputs.consumption.clone(),
                };

                info!(
                    year = inputs.year,
                    adoption_applied,
                    production_kwh = inputs.production.sum(),
                    consumption_kwh = consumption.sum(),
                    average_spot_price = inputs.spot_price.mean().unwrap_or(0.0),
                    "sanity checks"
                );

                let summary = project(&inputs.production, &inputs.spot_price, &consumption, &params)
                    .with_context(|| format!("Projection failed for year {}", inputs.year))?;

                match summary.payback_years {
                    Some(years) => info!(year = inputs.year, payback_years = years, "payback reached"),
                    None => warn!(year = inputs.year, "investment not recovered within lifetime"),
                }

                let outcome = ScenarioOutcome {
                    price_mode: *price_mode,
                    year: inputs.year,
                    adoption_applied,
                    loan,
                    summary,
                };
                outcomes.insert(outcome.label(), outcome);
            }
        }
    }

    Ok(outcomes)
}

/// Load production, spot price and consumption for every configured year
pub fn load_year_inputs(config: &ScenarioConfig) -> Result<(Vec<YearInputs>, HourlySeries)> {
    let profiles = load_production_profiles_xlsx(&config.production_path)?;
    let spot_prices = load_spot_prices_xlsx(&config.spot_price_path, &config.price_area, None)?;
    let filter = ConsumptionFilter {
        price_area: Some(config.price_area.clone()),
        consumption_group: config.consumption_group.clone(),
    };
    let consumption = load_consumption_csv(&config.consumption_path, &filter)?;

    let mut inputs = Vec::with_capacity(config.years.len());
    for &year in &config.years {
        info!(year, "calculating");
        inputs.push(YearInputs {
            year,
            production: expand_day_profiles(&profiles, year, config.yearly_production_kwh)?,
            spot_price: spot_prices.filter_year(year),
            consumption: consumption_for_year(&consumption, year, config.yearly_consumption_kwh)?,
        });
    }

    Ok((inputs, consumption))
}

/// Metered monthly consumption of the household next to the reference average
#[derive(Debug, Clone, PartialEq)]
pub struct HouseholdAdoption {
    pub actual: MonthlyConsumption,
    pub average: MonthlyConsumption,
    pub factors: [f64; 12],
}

/// Monthly adoption factors of the configured household, if its consumption is known
pub fn household_adoption(
    config: &ScenarioConfig,
    consumption: &HourlySeries,
) -> Result<Option<HouseholdAdoption>> {
    let Some(actual) = &config.actual_monthly_consumption else {
        return Ok(None);
    };

    let reference = config
        .reference_years
        .iter()
        .map(|&year| consumption_for_year(consumption, year, config.yearly_consumption_kwh))
        .collect::<Result<Vec<_>>>()?;
    let average = average_monthly_consumption(&reference)?;
    let factors = adoption_factor(actual, &average)?;

    Ok(Some(HouseholdAdoption {
        actual: actual.clone(),
        average,
        factors,
    }))
}

/// Load all data sources and evaluate every configured scenario
pub fn run_scenario_sweep(config: &ScenarioConfig) -> Result<IndexMap<String, ScenarioOutcome>> {
    config.validate()?;

    let (inputs, consumption) = load_year_inputs(config)?;
    let adoption = household_adoption(config, &consumption)?;

    evaluate_scenarios(config, &inputs, adoption.as_ref().map(|a| &a.factors))
}

/// Summary table with one line per scenario
pub fn format_summary_table(outcomes: &IndexMap<String, ScenarioOutcome>) -> String {
    let mut table = format!(
        "{:<10} {:<12} {:>6} {:>14} {:>8}\n",
        "adoption", "price", "year", "total_profit", "payback"
    );

    for outcome in outcomes.values() {
        let payback = outcome
            .summary
            .payback_years
            .map(|years| years.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.push_str(&format!(
            "{:<10} {:<12} {:>6} {:>14.0} {:>8}\n",
            outcome.adoption_applied,
            outcome.price_mode.label(),
            outcome.year,
            outcome.summary.total_profit.round(),
            payback
        ));
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use pv_model::EconomicParameters;

    fn flat_inputs(year: i32) -> YearInputs {
        YearInputs {
            year,
            production: HourlySeries::constant_for_year(year, 2.0).unwrap(),
            spot_price: HourlySeries::constant_for_year(year, 1.0).unwrap(),
            consumption: HourlySeries::constant_for_year(year, 1.0).unwrap(),
        }
    }

    fn test_config() -> ScenarioConfig {
        ScenarioConfig {
            investment_amount: 39_420.0,
            loan_annual_rate: 0.0,
            loan_years: 10,
            economics: EconomicParameters {
                investment_cost: 0.0,
                lifetime_years: 5,
                degradation_per_year: 0.0,
                grid_tariff: 0.0,
                system_losses: 0.0,
                price_mode: PriceMode::Spot,
                inflation_rate: 0.0,
            },
            price_modes: vec![PriceMode::Spot, PriceMode::capped(0.4)],
            years: vec![2023],
            ..ScenarioConfig::default()
        }
    }

    #[test]
    fn test_evaluate_scenarios_without_adoption() {
        let outcomes = evaluate_scenarios(&test_config(), &[flat_inputs(2023)], None).unwrap();

        assert_eq!(outcomes.len(), 2);
        let labels: Vec<&String> = outcomes.keys().collect();
        assert_eq!(labels, vec!["spot / 2023 / average", "capped 0.40 / 2023 / average"]);

        let spot = &outcomes["spot / 2023 / average"];
        assert!((spot.loan.total_payment - 39_420.0).abs() < 1e-6);
        assert_eq!(spot.summary.payback_years, Some(2));

        // capped at 0.4: 8760 * 0.4 * 1.25 + 8760 * 1.0 = 13140 per year
        let capped = &outcomes["capped 0.40 / 2023 / average"];
        assert!((capped.summary.years[0].income - 13_140.0).abs() < 1e-6);
        assert_eq!(capped.summary.payback_years, Some(3));
    }

    #[test]
    fn test_evaluate_scenarios_with_adoption() {
        let mut config = test_config();
        config.price_modes = vec![PriceMode::Spot];
        let factors = [2.0; 12];

        let outcomes =
            evaluate_scenarios(&config, &[flat_inputs(2023), flat_inputs(2024)], Some(&factors))
                .unwrap();

        assert_eq!(outcomes.len(), 4);
        let adopted = &outcomes["spot / 2023 / adoption"];
        let average = &outcomes["spot / 2023 / average"];
        assert!(adopted.adoption_applied);
        assert!(!average.adoption_applied);

        // doubled consumption absorbs all production on-site
        assert!((adopted.summary.years[0].self_consumption_kwh - 17_520.0).abs() < 1e-6);
        assert!((adopted.summary.years[0].exported_kwh).abs() < 1e-6);
        assert!((average.summary.years[0].exported_kwh - 8_760.0).abs() < 1e-6);

        let leap = &outcomes["spot / 2024 / adoption"];
        assert!((leap.summary.years[0].self_consumption_kwh - 2.0 * 8_784.0).abs() < 1e-6);
    }

    #[test]
    fn test_evaluate_scenarios_propagates_projection_errors() {
        let mut inputs = flat_inputs(2023);
        inputs.spot_price = HourlySeries::constant_for_year(2024, 1.0).unwrap();

        assert!(evaluate_scenarios(&test_config(), &[inputs], None).is_err());
    }

    #[test]
    fn test_household_adoption() {
        let consumption = HourlySeries::constant_for_year(2023, 1.0).unwrap();
        let mut config = test_config();
        config.reference_years = vec![2023];
        config.yearly_consumption_kwh = 8_760.0;
        config.actual_monthly_consumption = Some(MonthlyConsumption::from_array(
            consumption.monthly_totals().map(|total| total * 1.5),
        ));

        let adoption = household_adoption(&config, &consumption).unwrap().unwrap();
        assert!(adoption.factors.iter().all(|&factor| (factor - 1.5).abs() < 1e-9));
        assert!((adoption.average.total() - 8_760.0).abs() < 1e-6);
        assert!((adoption.actual.total() - 13_140.0).abs() < 1e-6);

        config.actual_monthly_consumption = None;
        assert_eq!(household_adoption(&config, &consumption).unwrap(), None);
    }

    #[test]
    fn test_load_year_inputs_requires_data_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScenarioConfig {
            production_path: dir.path().join("production.xlsx"),
            spot_price_path: dir.path().join("prices.xlsx"),
            consumption_path: dir.path().join("consumption.csv"),
            ..test_config()
        };

        assert!(load_year_inputs(&config).is_err());
        assert!(run_scenario_sweep(&config).is_err());
    }

    #[test]
    fn test_format_summary_table() {
        let outcomes = evaluate_scenarios(&test_config(), &[flat_inputs(2023)], None).unwrap();
        let table = format_summary_table(&outcomes);

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("total_profit"));
        assert!(lines[1].contains("spot"));
        assert!(lines[1].contains("59130"));
        assert!(lines[2].contains("capped 0.40"));
    }
}
