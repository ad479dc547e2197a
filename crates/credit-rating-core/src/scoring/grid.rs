use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One band of a ratio scoring grid: `lower` inclusive, `upper` exclusive.
/// A `None` bound is unbounded on that side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridBand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<Decimal>,
    pub score: Decimal,
}

impl GridBand {
    pub fn new(lower: Option<Decimal>, upper: Option<Decimal>, score: Decimal) -> Self {
        Self { lower, upper, score }
    }

    fn contains(&self, value: Decimal) -> bool {
        if let Some(lower) = self.lower {
            if value < lower {
                return false;
            }
        }
        if let Some(upper) = self.upper {
            if value >= upper {
                return false;
            }
        }
        true
    }
}

/// Score a ratio value against its configured grid.
///
/// Returns `None` when the ratio has no grid or the value falls outside
/// every band. Callers treat `None` as "excluded from aggregation", never
/// as a zero score.
pub fn score_ratio(
    grids: &BTreeMap<String, Vec<GridBand>>,
    name: &str,
    value: Decimal,
) -> Option<Decimal> {
    let grid = match grids.get(name) {
        Some(grid) if !grid.is_empty() => grid,
        _ => {
            debug!(ratio = name, "no scoring grid registered");
            return None;
        }
    };
    for band in grid {
        if band.contains(value) {
            return Some(band.score);
        }
    }
    debug!(ratio = name, %value, "value outside every grid band");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// Coverage-style grid: higher is better, unbounded at both ends.
    fn coverage_grid() -> BTreeMap<String, Vec<GridBand>> {
        let mut grids = BTreeMap::new();
        grids.insert(
            "interest_coverage".to_string(),
            vec![
                GridBand::new(Some(dec!(8)), None, dec!(100)),
                GridBand::new(Some(dec!(5)), Some(dec!(8)), dec!(75)),
                GridBand::new(Some(dec!(3)), Some(dec!(5)), dec!(50)),
                GridBand::new(Some(dec!(1.5)), Some(dec!(3)), dec!(25)),
                GridBand::new(None, Some(dec!(1.5)), dec!(0)),
            ],
        );
        grids
    }

    #[test]
    fn test_interior_values_score_their_band() {
        let grids = coverage_grid();
        assert_eq!(score_ratio(&grids, "interest_coverage", dec!(6)), Some(dec!(75)));
        assert_eq!(score_ratio(&grids, "interest_coverage", dec!(4)), Some(dec!(50)));
        assert_eq!(score_ratio(&grids, "interest_coverage", dec!(0.2)), Some(dec!(0)));
    }

    #[test]
    fn test_boundary_value_takes_lower_inclusive_band() {
        let grids = coverage_grid();
        // 5 sits on the [5, 8) / [3, 5) boundary and belongs to [5, 8).
        assert_eq!(score_ratio(&grids, "interest_coverage", dec!(5)), Some(dec!(75)));
        assert_eq!(score_ratio(&grids, "interest_coverage", dec!(8)), Some(dec!(100)));
        assert_eq!(score_ratio(&grids, "interest_coverage", dec!(1.5)), Some(dec!(25)));
    }

    #[test]
    fn test_unbounded_ends() {
        let grids = coverage_grid();
        assert_eq!(score_ratio(&grids, "interest_coverage", dec!(1000)), Some(dec!(100)));
        assert_eq!(score_ratio(&grids, "interest_coverage", dec!(-50)), Some(dec!(0)));
    }

    #[test]
    fn test_unknown_ratio_returns_none() {
        let grids = coverage_grid();
        assert_eq!(score_ratio(&grids, "no_such_ratio", dec!(1)), None);
    }

    #[test]
    fn test_empty_grid_returns_none() {
        let mut grids = coverage_grid();
        grids.insert("broken".to_string(), Vec::new());
        assert_eq!(score_ratio(&grids, "broken", dec!(1)), None);
    }

    #[test]
    fn test_gapped_grid_returns_none_for_uncovered_value() {
        let mut grids = BTreeMap::new();
        grids.insert(
            "partial".to_string(),
            vec![GridBand::new(Some(dec!(0)), Some(dec!(1)), dec!(50))],
        );
        assert_eq!(score_ratio(&grids, "partial", dec!(2)), None);
        assert_eq!(score_ratio(&grids, "partial", dec!(0.5)), Some(dec!(50)));
    }

    #[test]
    fn test_two_sided_grid_scores_both_arms() {
        // Capex/depreciation style: a sweet spot in the middle, weaker
        // scores on both the low and high side.
        let mut grids = BTreeMap::new();
        grids.insert(
            "capex_dep".to_string(),
            vec![
                GridBand::new(Some(dec!(1.2)), Some(dec!(1.8)), dec!(100)),
                GridBand::new(Some(dec!(0.9)), Some(dec!(1.2)), dec!(75)),
                GridBand::new(Some(dec!(1.8)), Some(dec!(2.5)), dec!(75)),
                GridBand::new(None, Some(dec!(0.9)), dec!(0)),
                GridBand::new(Some(dec!(2.5)), None, dec!(0)),
            ],
        );
        assert_eq!(score_ratio(&grids, "capex_dep", dec!(1.5)), Some(dec!(100)));
        assert_eq!(score_ratio(&grids, "capex_dep", dec!(1.0)), Some(dec!(75)));
        assert_eq!(score_ratio(&grids, "capex_dep", dec!(2.0)), Some(dec!(75)));
        assert_eq!(score_ratio(&grids, "capex_dep", dec!(3.0)), Some(dec!(0)));
    }
}
