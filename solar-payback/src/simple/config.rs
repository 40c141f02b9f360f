use anyhow::{Context, Result, ensure};
use pv_model::{EconomicParameters, MonthlyConsumption, PriceMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration of a scenario sweep: data sources, household, financing and projection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    // Data sources
    pub production_path: PathBuf,  // Solar atlas report with typical-day profiles (xlsx)
    pub spot_price_path: PathBuf,  // Hourly spot prices per price area (xlsx)
    pub consumption_path: PathBuf, // Hourly consumption per price area and group (csv)
    pub price_area: String,        // Price area column / filter, e.g. "NO1"
    pub consumption_group: Option<String>, // Consumption group filter, e.g. "household"

    // Household parameters
    pub yearly_production_kwh: f64, // Production profile is normalized to this total
    pub yearly_consumption_kwh: f64, // Consumption profile is normalized to this total
    pub actual_monthly_consumption: Option<MonthlyConsumption>, // Metered kWh per month of this household
    pub reference_years: Vec<i32>, // Years averaged for the reference household

    // Financing
    pub investment_amount: f64, // Price of the installation in NOK
    pub loan_annual_rate: f64,  // Annual interest rate of the loan
    pub loan_years: u32,        // Loan duration in years

    // Projection
    pub economics: EconomicParameters, // Investment cost is replaced by the total loan payment
    pub price_modes: Vec<PriceMode>,   // Price modes to compare
    pub years: Vec<i32>,               // Representative years to compare
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            production_path: PathBuf::from("data/production_profiles.xlsx"),
            spot_price_path: PathBuf::from("data/spotpriser.xlsx"),
            consumption_path: PathBuf::from("data/consumption.csv"),
            price_area: "NO1".to_string(),
            consumption_group: Some("household".to_string()),

            yearly_production_kwh: 23_000.0,
            yearly_consumption_kwh: 16_000.0,
            actual_monthly_consumption: Some(MonthlyConsumption::from_array([
                2000.0, 1700.0, 1650.0, 1250.0, 1000.0, 900.0, 850.0, 900.0, 900.0, 1100.0,
                1700.0, 1850.0,
            ])),
            reference_years: vec![2023, 2024],

            investment_amount: 265_000.0,
            loan_annual_rate: 0.05,
            loan_years: 20,

            economics: EconomicParameters {
                lifetime_years: 35,
                degradation_per_year: 0.005, // 0.5%
                grid_tariff: 0.5,            // NOK/kWh
                system_losses: 0.12,
                ..EconomicParameters::default()
            },
            price_modes: vec![PriceMode::Spot, PriceMode::capped(0.4)],
            years: vec![2023, 2024],
        }
    }
}

impl ScenarioConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ScenarioConfig =
            toml::from_str(content).context("Failed to parse scenario configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.years.is_empty(), "At least one year must be configured");
        ensure!(
            !self.price_modes.is_empty(),
            "At least one price mode must be configured"
        );
        ensure!(
            self.actual_monthly_consumption.is_none() || !self.reference_years.is_empty(),
            "Reference years are required when actual monthly consumption is given"
        );
        Ok(())
    }
}
