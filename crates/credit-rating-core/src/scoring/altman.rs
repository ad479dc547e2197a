use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Ratio-map key under which the Altman Z-Score is carried and cached.
pub const ALTMAN_Z_KEY: &str = "altman_z";

// Original Z-Score coefficients (public manufacturing form).
const Z_COEFF_X1: Decimal = dec!(1.2);
const Z_COEFF_X2: Decimal = dec!(1.4);
const Z_COEFF_X3: Decimal = dec!(3.3);
const Z_COEFF_X4: Decimal = dec!(0.6);
const Z_COEFF_X5: Decimal = dec!(1.0);

/// Raw statement components for the Altman Z-Score, one reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AltmanComponents {
    pub working_capital: Decimal,
    pub total_assets: Decimal,
    pub retained_earnings: Decimal,
    pub ebit: Decimal,
    pub market_value_equity: Decimal,
    pub total_liabilities: Decimal,
    pub sales: Decimal,
}

/// Compute the Altman Z-Score from raw components.
///
/// Z = 1.2*X1 + 1.4*X2 + 3.3*X3 + 0.6*X4 + 1.0*X5 where X1..X5 are the
/// classic working-capital, retained-earnings, EBIT, market-equity and
/// sales ratios. Returns `None` when total assets or total liabilities
/// are zero; an undefined score drops out of Z-based scoring and distress
/// checks rather than failing the run.
pub fn compute_altman_z(components: &AltmanComponents) -> Option<Decimal> {
    if components.total_assets.is_zero() || components.total_liabilities.is_zero() {
        return None;
    }

    let x1 = components.working_capital / components.total_assets;
    let x2 = components.retained_earnings / components.total_assets;
    let x3 = components.ebit / components.total_assets;
    let x4 = components.market_value_equity / components.total_liabilities;
    let x5 = components.sales / components.total_assets;

    Some(Z_COEFF_X1 * x1 + Z_COEFF_X2 * x2 + Z_COEFF_X3 * x3 + Z_COEFF_X4 * x4 + Z_COEFF_X5 * x5)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_components() -> AltmanComponents {
        // X1 = 0.1, X2 = 0.2, X3 = 0.15, X4 = 1.5, X5 = 1.8
        AltmanComponents {
            working_capital: dec!(100),
            total_assets: dec!(1000),
            retained_earnings: dec!(200),
            ebit: dec!(150),
            market_value_equity: dec!(600),
            total_liabilities: dec!(400),
            sales: dec!(1800),
        }
    }

    #[test]
    fn test_z_score_formula() {
        // Z = 1.2*0.1 + 1.4*0.2 + 3.3*0.15 + 0.6*1.5 + 1.0*1.8
        //   = 0.12 + 0.28 + 0.495 + 0.9 + 1.8 = 3.595
        let z = compute_altman_z(&sample_components()).unwrap();
        assert_eq!(z, dec!(3.595));
    }

    #[test]
    fn test_zero_total_assets_is_undefined() {
        let mut components = sample_components();
        components.total_assets = Decimal::ZERO;
        assert_eq!(compute_altman_z(&components), None);
    }

    #[test]
    fn test_zero_total_liabilities_is_undefined() {
        let mut components = sample_components();
        components.total_liabilities = Decimal::ZERO;
        assert_eq!(compute_altman_z(&components), None);
    }

    #[test]
    fn test_negative_working_capital_drags_score() {
        let healthy = compute_altman_z(&sample_components()).unwrap();
        let mut components = sample_components();
        components.working_capital = dec!(-100);
        let strained = compute_altman_z(&components).unwrap();
        assert!(strained < healthy);
    }
}
