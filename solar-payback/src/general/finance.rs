use crate::error::ProjectionError;

/// Cost of financing an investment with a fixed-payment loan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanCost {
    pub monthly_payment: f64,
    /// Sum of all monthly payments
    pub total_payment: f64,
    /// Part of the total payment that exceeds the principal
    pub total_interest: f64,
}

/// Total cost of a loan repaid in fixed monthly installments.
///
/// Uses the annuity formula
///   M = P * r / (1 - (1 + r)^(-n))
/// with r = annual_rate / 12 and n = years * 12. A zero rate gives M = P / n.
/// The total payment is what should be recovered by the system, so it is the
/// figure used as investment cost when the installation is financed.
pub fn amortize(principal: f64, annual_rate: f64, years: u32) -> Result<LoanCost, ProjectionError> {
    let insufficient = ProjectionError::InsufficientAmortizationRate { annual_rate, years };

    if years == 0 || !annual_rate.is_finite() {
        return Err(insufficient);
    }

    let monthly_rate = annual_rate / 12.0;
    let num_payments = years.checked_mul(12).ok_or_else(|| insufficient.clone())?;

    let monthly_payment = if monthly_rate == 0.0 {
        principal / num_payments as f64
    } else {
        let exponent = i32::try_from(num_payments).map_err(|_| insufficient.clone())?;
        let denominator = 1.0 - (1.0 + monthly_rate).powi(-exponent);
        if denominator == 0.0 || !denominator.is_finite() {
            return Err(insufficient);
        }
        principal * monthly_rate / denominator
    };

    if !monthly_payment.is_finite() {
        return Err(insufficient);
    }

    let total_payment = monthly_payment * num_payments as f64;

    Ok(LoanCost {
        monthly_payment,
        total_payment,
        total_interest: total_payment - principal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rate_loan_has_no_interest() {
        let cost = amortize(100_000.0, 0.0, 10).unwrap();
        assert!((cost.total_payment - 100_000.0).abs() < 1e-6);
        assert!(cost.total_interest.abs() < 1e-6);
        assert!((cost.monthly_payment - 100_000.0 / 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_annuity_loan() {
        let cost = amortize(100_000.0, 0.05, 20).unwrap();

        assert!((cost.monthly_payment - 659.9557).abs() < 1e-3);
        assert!((cost.total_payment - 158_389.377).abs() < 1e-2);
        assert!(cost.total_interest > 0.0);
        assert!(cost.total_interest < 100_000.0 * 0.05 * 20.0);
    }

    #[test]
    fn test_financed_system_cost() {
        let cost = amortize(265_000.0, 0.05, 20).unwrap();
        assert!((cost.total_payment - 419_731.85).abs() < 1e-1);
        assert!((cost.total_interest - 154_731.85).abs() < 1e-1);
    }

    #[test]
    fn test_zero_years_rejected() {
        assert_eq!(
            amortize(100_000.0, 0.05, 0),
            Err(ProjectionError::InsufficientAmortizationRate {
                annual_rate: 0.05,
                years: 0
            })
        );
        assert!(amortize(100_000.0, 0.0, 0).is_err());
    }

    #[test]
    fn test_degenerate_rate_rejected() {
        assert!(amortize(100_000.0, f64::NAN, 10).is_err());
        // a monthly rate of -100% makes the discount factor infinite
        assert!(amortize(100_000.0, -12.0, 10).is_err());
    }
}
