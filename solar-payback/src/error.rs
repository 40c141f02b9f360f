use thiserror::Error;

/// Errors raised by the projection engine and the loan formula
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error(
        "input series must have equal length (production: {production}, spot price: {spot_price}, consumption: {consumption})"
    )]
    DimensionMismatch {
        production: usize,
        spot_price: usize,
        consumption: usize,
    },

    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("cannot amortize a loan at annual rate {annual_rate} over {years} years")]
    InsufficientAmortizationRate { annual_rate: f64, years: u32 },
}
