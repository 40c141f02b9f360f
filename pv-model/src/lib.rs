pub mod economics;
pub mod general;

pub use economics::parameters::{EconomicParameters, PriceMode, VAT_MULTIPLIER};
pub use economics::results::{ProjectionSummary, YearlyResult};
pub use general::monthly::MonthlyConsumption;
pub use general::series::HourlySeries;
