use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::types::{PeerMap, RatioMap};

// An issuer underperforms a ratio when it sits below 90% of the peer mean.
const UNDERPERFORMANCE_FACTOR: Decimal = dec!(0.9);

/// Score the issuer's standing against peer averages.
///
/// Every ratio with both an issuer value and a usable peer panel (non-empty,
/// non-zero mean) is compared; the share of ratios on which the issuer
/// underperforms maps to a tiered 0-100 score. Returns `None` when no ratio
/// is comparable, which is distinct from a worst-tier zero.
///
/// The comparison is direction-naive: every ratio is treated as
/// higher-is-better, including inverted measures such as debt/EBITDA where
/// a low value is the strong position.
pub fn compute_peer_score(ratios: &RatioMap, peers: &PeerMap) -> Option<Decimal> {
    let mut under = 0u32;
    let mut total = 0u32;

    for (name, peer_values) in peers {
        let issuer_value = match ratios.get(name) {
            Some(v) => *v,
            None => continue,
        };
        if peer_values.is_empty() {
            continue;
        }
        let sum: Decimal = peer_values.iter().copied().sum();
        let peer_avg = sum / Decimal::from(peer_values.len() as u64);
        if peer_avg.is_zero() {
            continue;
        }
        total += 1;
        if issuer_value < peer_avg * UNDERPERFORMANCE_FACTOR {
            under += 1;
            debug!(ratio = name.as_str(), %issuer_value, %peer_avg, "underperforms peers");
        }
    }

    if total == 0 {
        return None;
    }

    let under_share = Decimal::from(under) / Decimal::from(total);
    let score = if under_share <= dec!(0.10) {
        dec!(100)
    } else if under_share <= dec!(0.30) {
        dec!(75)
    } else if under_share <= dec!(0.60) {
        dec!(50)
    } else if under_share <= dec!(0.80) {
        dec!(25)
    } else {
        Decimal::ZERO
    };
    Some(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PeerMap, RatioMap};

    fn ratios(entries: &[(&str, Decimal)]) -> RatioMap {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn peers(entries: &[(&str, &[Decimal])]) -> PeerMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_vec()))
            .collect()
    }

    #[test]
    fn test_no_underperformance_scores_top_tier() {
        let issuer = ratios(&[("roa", dec!(0.10)), ("roe", dec!(0.20))]);
        let panel = peers(&[
            ("roa", &[dec!(0.08), dec!(0.09)]),
            ("roe", &[dec!(0.15), dec!(0.18)]),
        ]);
        assert_eq!(compute_peer_score(&issuer, &panel), Some(dec!(100)));
    }

    #[test]
    fn test_full_underperformance_scores_zero() {
        let issuer = ratios(&[("roa", dec!(0.01)), ("roe", dec!(0.02))]);
        let panel = peers(&[
            ("roa", &[dec!(0.08), dec!(0.09)]),
            ("roe", &[dec!(0.15), dec!(0.18)]),
        ]);
        assert_eq!(compute_peer_score(&issuer, &panel), Some(Decimal::ZERO));
    }

    #[test]
    fn test_tier_boundaries_are_inclusive() {
        // 1 of 10 under -> share 0.10 -> still the top tier.
        let mut issuer = RatioMap::new();
        let mut panel = PeerMap::new();
        for i in 0..10 {
            let name = format!("r{i}");
            issuer.insert(name.clone(), if i == 0 { dec!(1) } else { dec!(100) });
            panel.insert(name, vec![dec!(100), dec!(100)]);
        }
        assert_eq!(compute_peer_score(&issuer, &panel), Some(dec!(100)));
    }

    #[test]
    fn test_mid_tier_share() {
        // 1 of 2 under -> share 0.5 -> 50.
        let issuer = ratios(&[("roa", dec!(0.01)), ("roe", dec!(0.20))]);
        let panel = peers(&[
            ("roa", &[dec!(0.08), dec!(0.09)]),
            ("roe", &[dec!(0.15), dec!(0.18)]),
        ]);
        assert_eq!(compute_peer_score(&issuer, &panel), Some(dec!(50)));
    }

    #[test]
    fn test_exactly_ninety_percent_is_not_under() {
        // Peer mean 1.0, factor 0.9: an issuer at exactly 0.9 holds its tier.
        let issuer = ratios(&[("roa", dec!(0.9))]);
        let panel = peers(&[("roa", &[dec!(1.0)])]);
        assert_eq!(compute_peer_score(&issuer, &panel), Some(dec!(100)));
    }

    #[test]
    fn test_direction_naive_for_inverted_ratios() {
        // Lower debt/EBITDA is genuinely stronger, but the comparison still
        // counts it as underperformance.
        let issuer = ratios(&[("debt_ebitda", dec!(1.0))]);
        let panel = peers(&[("debt_ebitda", &[dec!(4.0), dec!(4.0)])]);
        assert_eq!(compute_peer_score(&issuer, &panel), Some(Decimal::ZERO));
    }

    #[test]
    fn test_zero_mean_panels_are_skipped() {
        let issuer = ratios(&[("fcf_debt", dec!(0.05)), ("roa", dec!(0.10))]);
        let panel = peers(&[
            ("fcf_debt", &[dec!(0.5), dec!(-0.5)]),
            ("roa", &[dec!(0.08)]),
        ]);
        // Only roa is comparable; issuer is above its mean.
        assert_eq!(compute_peer_score(&issuer, &panel), Some(dec!(100)));
    }

    #[test]
    fn test_no_comparable_ratios_returns_none() {
        let issuer = ratios(&[("roa", dec!(0.10))]);
        assert_eq!(compute_peer_score(&issuer, &PeerMap::new()), None);

        let panel = peers(&[("roe", &[dec!(0.15)])]);
        assert_eq!(compute_peer_score(&issuer, &panel), None);

        let empty_panel = peers(&[("roa", &[])]);
        assert_eq!(compute_peer_score(&issuer, &empty_panel), None);
    }
}
