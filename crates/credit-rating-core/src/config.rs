use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::overlay::distress::{DistressBand, DistressIndicator};
use crate::scale::{RatingScale, ScoreBand, ScoreBands};
use crate::scoring::grid::GridBand;
use crate::weights::WeightPolicy;
use crate::{CreditRatingError, CreditRatingResult};

// ---------------------------------------------------------------------------
// Ratio families
// ---------------------------------------------------------------------------

/// Risk-dimension bucket a ratio belongs to. Bucket averages are reported
/// per family for diagnostics; ratios without a family are never scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioFamily {
    Leverage,
    LeverageRev,
    Coverage,
    Profit,
    Other,
    Altman,
}

impl RatioFamily {
    pub const ALL: [RatioFamily; 6] = [
        RatioFamily::Leverage,
        RatioFamily::LeverageRev,
        RatioFamily::Coverage,
        RatioFamily::Profit,
        RatioFamily::Other,
        RatioFamily::Altman,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Leverage => "leverage",
            Self::LeverageRev => "leverage_rev",
            Self::Coverage => "coverage",
            Self::Profit => "profit",
            Self::Other => "other",
            Self::Altman => "altman",
        }
    }
}

impl std::fmt::Display for RatioFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Engine configuration
// ---------------------------------------------------------------------------

/// Full static configuration for the rating engine: scoring grids, the
/// family map, the rating ladder and score bands, distress thresholds,
/// the qualitative Likert table, and the weight policy.
///
/// Built once (usually via `Default`, or deserialized from JSON/YAML),
/// validated at engine entry, and passed by shared reference; the engine
/// never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ratio name -> scoring grid.
    pub ratio_grids: BTreeMap<String, Vec<GridBand>>,
    /// Ratio name -> risk family. Ratios absent from this map are ignored
    /// by the quantitative aggregation.
    pub ratio_families: BTreeMap<String, RatioFamily>,
    /// Ordinal rating ladder, strongest grade first.
    pub rating_scale: RatingScale,
    /// Combined-score cutoffs, descending.
    pub score_bands: ScoreBands,
    /// Distress indicator -> threshold bands, most severe first.
    pub distress_bands: BTreeMap<DistressIndicator, Vec<DistressBand>>,
    /// Floor on the summed distress notches.
    pub distress_notch_floor: i32,
    /// Qualitative 1-5 value -> 0-100 score.
    pub likert_scale: BTreeMap<u8, Decimal>,
    /// Fixed or count-proportional blend weights.
    pub weights: WeightPolicy,
}

impl EngineConfig {
    /// Structural checks on the static tables. Anything caught here is a
    /// configuration defect and fails loudly; data-dependent gaps are
    /// handled item by item at scoring time.
    pub fn validate(&self) -> CreditRatingResult<()> {
        if self.rating_scale.is_empty() {
            return Err(CreditRatingError::InvalidConfig {
                table: "rating_scale".into(),
                reason: "ladder must contain at least one grade".into(),
            });
        }

        let bands = self.score_bands.bands();
        if bands.is_empty() {
            return Err(CreditRatingError::InvalidConfig {
                table: "score_bands".into(),
                reason: "cutoff table must contain at least one band".into(),
            });
        }
        for pair in bands.windows(2) {
            if pair[0].min_score <= pair[1].min_score {
                return Err(CreditRatingError::InvalidConfig {
                    table: "score_bands".into(),
                    reason: format!(
                        "cutoffs must be strictly descending, found {} before {}",
                        pair[0].min_score, pair[1].min_score
                    ),
                });
            }
        }
        for band in bands {
            if self.rating_scale.position(&band.grade).is_none() {
                return Err(CreditRatingError::InvalidConfig {
                    table: "score_bands".into(),
                    reason: format!("grade '{}' is not on the rating scale", band.grade),
                });
            }
        }

        for (indicator, bands) in &self.distress_bands {
            for pair in bands.windows(2) {
                if pair[0].below >= pair[1].below {
                    return Err(CreditRatingError::InvalidConfig {
                        table: "distress_bands".into(),
                        reason: format!(
                            "{indicator} thresholds must be strictly ascending, found {} before {}",
                            pair[0].below, pair[1].below
                        ),
                    });
                }
            }
            for band in bands {
                if band.notches > 0 {
                    return Err(CreditRatingError::InvalidConfig {
                        table: "distress_bands".into(),
                        reason: format!("{indicator} band notches must not be positive"),
                    });
                }
            }
        }
        if self.distress_notch_floor > 0 {
            return Err(CreditRatingError::InvalidConfig {
                table: "distress_notch_floor".into(),
                reason: "the notch floor must not be positive".into(),
            });
        }

        for value in self.likert_scale.keys() {
            if !(1..=5).contains(value) {
                return Err(CreditRatingError::InvalidConfig {
                    table: "likert_scale".into(),
                    reason: format!("scale key {value} is outside 1-5"),
                });
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Production defaults
// ---------------------------------------------------------------------------

fn band(lower: Option<Decimal>, upper: Option<Decimal>, score: Decimal) -> GridBand {
    GridBand::new(lower, upper, score)
}

fn default_ratio_grids() -> BTreeMap<String, Vec<GridBand>> {
    let mut grids = BTreeMap::new();

    // Leverage: lower is better.
    grids.insert(
        "debt_ebitda".to_string(),
        vec![
            band(None, Some(dec!(2)), dec!(100)),
            band(Some(dec!(2)), Some(dec!(3)), dec!(75)),
            band(Some(dec!(3)), Some(dec!(4)), dec!(50)),
            band(Some(dec!(4)), Some(dec!(6)), dec!(25)),
            band(Some(dec!(6)), None, dec!(0)),
        ],
    );
    grids.insert(
        "net_debt_ebitda".to_string(),
        vec![
            band(None, Some(dec!(1.5)), dec!(100)),
            band(Some(dec!(1.5)), Some(dec!(3)), dec!(75)),
            band(Some(dec!(3)), Some(dec!(4.5)), dec!(50)),
            band(Some(dec!(4.5)), Some(dec!(6)), dec!(25)),
            band(Some(dec!(6)), None, dec!(0)),
        ],
    );
    grids.insert(
        "debt_equity".to_string(),
        vec![
            band(None, Some(dec!(0.5)), dec!(100)),
            band(Some(dec!(0.5)), Some(dec!(1)), dec!(75)),
            band(Some(dec!(1)), Some(dec!(2)), dec!(50)),
            band(Some(dec!(2)), Some(dec!(4)), dec!(25)),
            band(Some(dec!(4)), None, dec!(0)),
        ],
    );
    grids.insert(
        "debt_capital".to_string(),
        vec![
            band(None, Some(dec!(0.20)), dec!(100)),
            band(Some(dec!(0.20)), Some(dec!(0.35)), dec!(75)),
            band(Some(dec!(0.35)), Some(dec!(0.50)), dec!(50)),
            band(Some(dec!(0.50)), Some(dec!(0.70)), dec!(25)),
            band(Some(dec!(0.70)), None, dec!(0)),
        ],
    );

    // Cash-flow leverage: higher is better.
    grids.insert(
        "ffo_debt".to_string(),
        vec![
            band(Some(dec!(0.40)), None, dec!(100)),
            band(Some(dec!(0.25)), Some(dec!(0.40)), dec!(75)),
            band(Some(dec!(0.12)), Some(dec!(0.25)), dec!(50)),
            band(Some(dec!(0)), Some(dec!(0.12)), dec!(25)),
            band(None, Some(dec!(0)), dec!(0)),
        ],
    );
    grids.insert(
        "fcf_debt".to_string(),
        vec![
            band(Some(dec!(0.20)), None, dec!(100)),
            band(Some(dec!(0.10)), Some(dec!(0.20)), dec!(75)),
            band(Some(dec!(0)), Some(dec!(0.10)), dec!(50)),
            band(Some(dec!(-0.10)), Some(dec!(0)), dec!(25)),
            band(None, Some(dec!(-0.10)), dec!(0)),
        ],
    );

    // Coverage: higher is better.
    grids.insert(
        "interest_coverage".to_string(),
        vec![
            band(Some(dec!(8)), None, dec!(100)),
            band(Some(dec!(5)), Some(dec!(8)), dec!(75)),
            band(Some(dec!(3)), Some(dec!(5)), dec!(50)),
            band(Some(dec!(1.5)), Some(dec!(3)), dec!(25)),
            band(None, Some(dec!(1.5)), dec!(0)),
        ],
    );
    grids.insert(
        "fixed_charge_coverage".to_string(),
        vec![
            band(Some(dec!(6)), None, dec!(100)),
            band(Some(dec!(4)), Some(dec!(6)), dec!(75)),
            band(Some(dec!(2.5)), Some(dec!(4)), dec!(50)),
            band(Some(dec!(1.5)), Some(dec!(2.5)), dec!(25)),
            band(None, Some(dec!(1.5)), dec!(0)),
        ],
    );
    grids.insert(
        "dscr".to_string(),
        vec![
            band(Some(dec!(2)), None, dec!(100)),
            band(Some(dec!(1.5)), Some(dec!(2)), dec!(75)),
            band(Some(dec!(1.2)), Some(dec!(1.5)), dec!(50)),
            band(Some(dec!(1)), Some(dec!(1.2)), dec!(25)),
            band(None, Some(dec!(1)), dec!(0)),
        ],
    );

    // Profitability: higher is better.
    grids.insert(
        "ebitda_margin".to_string(),
        vec![
            band(Some(dec!(0.25)), None, dec!(100)),
            band(Some(dec!(0.15)), Some(dec!(0.25)), dec!(75)),
            band(Some(dec!(0.10)), Some(dec!(0.15)), dec!(50)),
            band(Some(dec!(0.05)), Some(dec!(0.10)), dec!(25)),
            band(None, Some(dec!(0.05)), dec!(0)),
        ],
    );
    grids.insert(
        "ebit_margin".to_string(),
        vec![
            band(Some(dec!(0.15)), None, dec!(100)),
            band(Some(dec!(0.10)), Some(dec!(0.15)), dec!(75)),
            band(Some(dec!(0.05)), Some(dec!(0.10)), dec!(50)),
            band(Some(dec!(0)), Some(dec!(0.05)), dec!(25)),
            band(None, Some(dec!(0)), dec!(0)),
        ],
    );
    grids.insert(
        "roa".to_string(),
        vec![
            band(Some(dec!(0.12)), None, dec!(100)),
            band(Some(dec!(0.08)), Some(dec!(0.12)), dec!(75)),
            band(Some(dec!(0.04)), Some(dec!(0.08)), dec!(50)),
            band(Some(dec!(0)), Some(dec!(0.04)), dec!(25)),
            band(None, Some(dec!(0)), dec!(0)),
        ],
    );
    grids.insert(
        "roe".to_string(),
        vec![
            band(Some(dec!(0.20)), None, dec!(100)),
            band(Some(dec!(0.12)), Some(dec!(0.20)), dec!(75)),
            band(Some(dec!(0.05)), Some(dec!(0.12)), dec!(50)),
            band(Some(dec!(0)), Some(dec!(0.05)), dec!(25)),
            band(None, Some(dec!(0)), dec!(0)),
        ],
    );

    // Reinvestment has a sweet spot: both starving and overextending the
    // asset base score down.
    grids.insert(
        "capex_dep".to_string(),
        vec![
            band(Some(dec!(1.2)), Some(dec!(1.8)), dec!(100)),
            band(Some(dec!(0.9)), Some(dec!(1.2)), dec!(75)),
            band(Some(dec!(1.8)), Some(dec!(2.5)), dec!(75)),
            band(Some(dec!(0.7)), Some(dec!(0.9)), dec!(50)),
            band(Some(dec!(2.5)), Some(dec!(3.5)), dec!(50)),
            band(Some(dec!(0.5)), Some(dec!(0.7)), dec!(25)),
            band(Some(dec!(3.5)), None, dec!(25)),
            band(None, Some(dec!(0.5)), dec!(0)),
        ],
    );
    grids.insert(
        "current_ratio".to_string(),
        vec![
            band(Some(dec!(2)), None, dec!(100)),
            band(Some(dec!(1.5)), Some(dec!(2)), dec!(75)),
            band(Some(dec!(1)), Some(dec!(1.5)), dec!(50)),
            band(Some(dec!(0.7)), Some(dec!(1)), dec!(25)),
            band(None, Some(dec!(0.7)), dec!(0)),
        ],
    );
    grids.insert(
        "rollover_coverage".to_string(),
        vec![
            band(Some(dec!(2)), None, dec!(100)),
            band(Some(dec!(1.2)), Some(dec!(2)), dec!(75)),
            band(Some(dec!(0.8)), Some(dec!(1.2)), dec!(50)),
            band(Some(dec!(0.5)), Some(dec!(0.8)), dec!(25)),
            band(None, Some(dec!(0.5)), dec!(0)),
        ],
    );

    grids.insert(
        "altman_z".to_string(),
        vec![
            band(Some(dec!(3)), None, dec!(100)),
            band(Some(dec!(2.7)), Some(dec!(3)), dec!(75)),
            band(Some(dec!(1.8)), Some(dec!(2.7)), dec!(50)),
            band(Some(dec!(1.5)), Some(dec!(1.8)), dec!(25)),
            band(None, Some(dec!(1.5)), dec!(0)),
        ],
    );

    grids
}

fn default_ratio_families() -> BTreeMap<String, RatioFamily> {
    [
        ("debt_ebitda", RatioFamily::Leverage),
        ("net_debt_ebitda", RatioFamily::Leverage),
        ("debt_equity", RatioFamily::Leverage),
        ("debt_capital", RatioFamily::Leverage),
        ("ffo_debt", RatioFamily::LeverageRev),
        ("fcf_debt", RatioFamily::LeverageRev),
        ("interest_coverage", RatioFamily::Coverage),
        ("fixed_charge_coverage", RatioFamily::Coverage),
        ("dscr", RatioFamily::Coverage),
        ("ebitda_margin", RatioFamily::Profit),
        ("ebit_margin", RatioFamily::Profit),
        ("roa", RatioFamily::Profit),
        ("roe", RatioFamily::Profit),
        ("capex_dep", RatioFamily::Other),
        ("current_ratio", RatioFamily::Other),
        ("rollover_coverage", RatioFamily::Other),
        ("altman_z", RatioFamily::Altman),
    ]
    .into_iter()
    .map(|(name, family)| (name.to_string(), family))
    .collect()
}

fn default_rating_scale() -> RatingScale {
    RatingScale::new(
        [
            "AAA", "AA+", "AA", "AA-", "A+", "A", "A-", "BBB+", "BBB", "BBB-", "BB+", "BB",
            "BB-", "B+", "B", "B-", "CCC+", "CCC", "CCC-", "CC", "C",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    )
}

fn default_score_bands() -> ScoreBands {
    let cutoffs: [(Decimal, &str); 21] = [
        (dec!(95), "AAA"),
        (dec!(90), "AA+"),
        (dec!(85), "AA"),
        (dec!(80), "AA-"),
        (dec!(75), "A+"),
        (dec!(70), "A"),
        (dec!(65), "A-"),
        (dec!(60), "BBB+"),
        (dec!(55), "BBB"),
        (dec!(50), "BBB-"),
        (dec!(45), "BB+"),
        (dec!(40), "BB"),
        (dec!(35), "BB-"),
        (dec!(30), "B+"),
        (dec!(25), "B"),
        (dec!(20), "B-"),
        (dec!(15), "CCC+"),
        (dec!(10), "CCC"),
        (dec!(5), "CCC-"),
        (dec!(2), "CC"),
        (dec!(0), "C"),
    ];
    ScoreBands::new(
        cutoffs
            .into_iter()
            .map(|(min_score, grade)| ScoreBand {
                min_score,
                grade: grade.to_string(),
            })
            .collect(),
    )
}

fn default_distress_bands() -> BTreeMap<DistressIndicator, Vec<DistressBand>> {
    let mut bands = BTreeMap::new();
    bands.insert(
        DistressIndicator::InterestCoverage,
        vec![
            DistressBand { below: dec!(0.5), notches: -4 },
            DistressBand { below: dec!(0.8), notches: -3 },
            DistressBand { below: dec!(1.0), notches: -2 },
        ],
    );
    bands.insert(
        DistressIndicator::Dscr,
        vec![
            DistressBand { below: dec!(0.8), notches: -3 },
            DistressBand { below: dec!(0.9), notches: -2 },
            DistressBand { below: dec!(1.0), notches: -1 },
        ],
    );
    bands.insert(
        DistressIndicator::AltmanZ,
        vec![
            DistressBand { below: dec!(1.2), notches: -4 },
            DistressBand { below: dec!(1.5), notches: -3 },
            DistressBand { below: dec!(1.81), notches: -2 },
        ],
    );
    bands
}

fn default_likert_scale() -> BTreeMap<u8, Decimal> {
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

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ratio_grids: default_ratio_grids(),
            ratio_families: default_ratio_families(),
            rating_scale: default_rating_scale(),
            score_bands: default_score_bands(),
            distress_bands: default_distress_bands(),
            distress_notch_floor: -4,
            likert_scale: default_likert_scale(),
            weights: WeightPolicy::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_default_tables_are_consistent() {
        let config = EngineConfig::default();
        // Every ratio with a family has a grid and vice versa.
        for name in config.ratio_families.keys() {
            assert!(config.ratio_grids.contains_key(name), "missing grid for {name}");
        }
        for name in config.ratio_grids.keys() {
            assert!(config.ratio_families.contains_key(name), "missing family for {name}");
        }
        assert_eq!(config.rating_scale.len(), 21);
        assert_eq!(config.score_bands.bands().len(), 21);
    }

    #[test]
    fn test_empty_ladder_rejected() {
        let mut config = EngineConfig::default();
        config.rating_scale = RatingScale::new(Vec::new());
        let err = config.validate().unwrap_err();
        match err {
            CreditRatingError::InvalidConfig { table, .. } => assert_eq!(table, "rating_scale"),
            other => panic!("Expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_non_descending_cutoffs_rejected() {
        let mut config = EngineConfig::default();
        config.score_bands = ScoreBands::new(vec![
            ScoreBand { min_score: dec!(50), grade: "BBB".into() },
            ScoreBand { min_score: dec!(70), grade: "A".into() },
        ]);
        let err = config.validate().unwrap_err();
        match err {
            CreditRatingError::InvalidConfig { table, .. } => assert_eq!(table, "score_bands"),
            other => panic!("Expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_band_grade_off_ladder_rejected() {
        let mut config = EngineConfig::default();
        config.score_bands = ScoreBands::new(vec![
            ScoreBand { min_score: dec!(50), grade: "AA".into() },
            ScoreBand { min_score: dec!(0), grade: "ZZZ".into() },
        ]);
        let err = config.validate().unwrap_err();
        match err {
            CreditRatingError::InvalidConfig { table, reason } => {
                assert_eq!(table, "score_bands");
                assert!(reason.contains("ZZZ"));
            }
            other => panic!("Expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_unsorted_distress_bands_rejected() {
        let mut config = EngineConfig::default();
        config.distress_bands.insert(
            DistressIndicator::Dscr,
            vec![
                DistressBand { below: dec!(1.0), notches: -1 },
                DistressBand { below: dec!(0.8), notches: -3 },
            ],
        );
        let err = config.validate().unwrap_err();
        match err {
            CreditRatingError::InvalidConfig { table, .. } => assert_eq!(table, "distress_bands"),
            other => panic!("Expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_positive_distress_notches_rejected() {
        let mut config = EngineConfig::default();
        config.distress_bands.insert(
            DistressIndicator::Dscr,
            vec![DistressBand { below: dec!(1.0), notches: 2 }],
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_likert_key_rejected() {
        let mut config = EngineConfig::default();
        config.likert_scale.insert(9, dec!(120));
        let err = config.validate().unwrap_err();
        match err {
            CreditRatingError::InvalidConfig { table, .. } => assert_eq!(table, "likert_scale"),
            other => panic!("Expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
