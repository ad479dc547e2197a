use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Factor names commonly used on analyst questionnaires. Documentation
/// only: the factor set is open-ended and the engine scores any name
/// through the same Likert mapping.
pub const KNOWN_QUALITATIVE_FACTORS: [&str; 14] = [
    "industry_risk",
    "market_position",
    "revenue_diversification",
    "revenue_stability",
    "business_model_resilience",
    "management_quality",
    "governance",
    "financial_policy",
    "sovereign_risk",
    "legal_environment",
    "transparency",
    "liquidity_profile",
    "wc_management_quality",
    "refinancing_risk",
];

/// Map a 1-5 expert score to the 0-100 scale via the configured Likert
/// table. Values with no table entry return `None` and are excluded from
/// aggregation; they are neither clamped nor treated as errors.
pub fn score_qualitative_factor(likert: &BTreeMap<u8, Decimal>, value: u8) -> Option<Decimal> {
    likert.get(&value).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn default_likert() -> BTreeMap<u8, Decimal> {
        [
            (1, dec!(0)),
            (2, dec!(25)),
            (3, dec!(50)),
            (4, dec!(75)),
            (5, dec!(100)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_scale_endpoints_and_midpoint() {
        let likert = default_likert();
        assert_eq!(score_qualitative_factor(&likert, 1), Some(dec!(0)));
        assert_eq!(score_qualitative_factor(&likert, 3), Some(dec!(50)));
        assert_eq!(score_qualitative_factor(&likert, 5), Some(dec!(100)));
    }

    #[test]
    fn test_out_of_scale_values_are_excluded() {
        let likert = default_likert();
        assert_eq!(score_qualitative_factor(&likert, 0), None);
        assert_eq!(score_qualitative_factor(&likert, 6), None);
        assert_eq!(score_qualitative_factor(&likert, 255), None);
    }
}
