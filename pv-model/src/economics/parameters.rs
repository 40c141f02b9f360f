use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Norwegian VAT (25%), applied to the price of energy bought from the grid
pub const VAT_MULTIPLIER: f64 = 1.25;

/// How the avoided purchase price of self-consumed energy is determined
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "./economics.ts")]
pub enum PriceMode {
    /// Use the hourly spot price
    #[default]
    Spot,
    /// Use a fixed regulated price for every hour
    Capped {
        /// Price in NOK/kWh, excluding VAT
        rate: f64,
    },
}

impl PriceMode {
    pub fn capped(rate: f64) -> Self {
        Self::Capped { rate }
    }

    /// Consumer-side energy price for an hour with the given spot price
    pub fn consumption_price(&self, spot_price: f64) -> f64 {
        match self {
            PriceMode::Spot => spot_price,
            PriceMode::Capped { rate } => *rate,
        }
    }

    /// Short label used in tables and plot titles
    pub fn label(&self) -> String {
        match self {
            PriceMode::Spot => "spot".to_string(),
            PriceMode::Capped { rate } => format!("capped {:.2}", rate),
        }
    }
}

/// Economic and physical parameters of a single projection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[serde(default)]
#[ts(export, export_to = "./economics.ts")]
pub struct EconomicParameters {
    /// Amount to recover in NOK (total repaid when the system is financed)
    pub investment_cost: f64,
    /// Operating lifetime of the system in years
    pub lifetime_years: u32,
    /// Yearly panel degradation as a fraction, compounding
    pub degradation_per_year: f64,
    /// Grid-use fee in NOK/kWh, excluding VAT
    pub grid_tariff: f64,
    /// Fixed wiring and inverter losses as a fraction of production
    pub system_losses: f64,
    /// Price used to value self-consumption
    pub price_mode: PriceMode,
    /// Yearly price inflation as a fraction, compounding
    pub inflation_rate: f64,
}

impl Default for EconomicParameters {
    fn default() -> Self {
        Self {
            investment_cost: 0.0,
            lifetime_years: 25,
            degradation_per_year: 0.005,
            grid_tariff: 0.49 * 0.8, // 0.49 NOK/kWh including VAT
            system_losses: 0.14,
            price_mode: PriceMode::Spot,
            inflation_rate: 0.03,
        }
    }
}

impl EconomicParameters {
    /// Copy of these parameters with a different investment cost
    pub fn with_investment_cost(&self, investment_cost: f64) -> Self {
        Self {
            investment_cost,
            ..self.clone()
        }
    }

    /// Copy of these parameters with a different price mode
    pub fn with_price_mode(&self, price_mode: PriceMode) -> Self {
        Self {
            price_mode,
            ..self.clone()
        }
    }
}
