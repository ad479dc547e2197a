use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::RatioMap;

/// The three ratios checked for distress-driven downgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistressIndicator {
    InterestCoverage,
    Dscr,
    AltmanZ,
}

impl DistressIndicator {
    pub const ALL: [DistressIndicator; 3] = [
        DistressIndicator::InterestCoverage,
        DistressIndicator::Dscr,
        DistressIndicator::AltmanZ,
    ];

    /// Key of this indicator in the ratio maps.
    pub fn ratio_key(&self) -> &'static str {
        match self {
            Self::InterestCoverage => "interest_coverage",
            Self::Dscr => "dscr",
            Self::AltmanZ => "altman_z",
        }
    }
}

impl std::fmt::Display for DistressIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.ratio_key())
    }
}

/// One distress threshold: values strictly below `below` cost `notches`
/// (a negative count). Bands are declared most severe first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistressBand {
    pub below: Decimal,
    pub notches: i32,
}

/// Outcome of the distress check: the clamped notch total and the value
/// of each indicator that breached a band, keyed by ratio name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistressAssessment {
    pub notches: i32,
    pub triggers: BTreeMap<String, Decimal>,
}

/// Evaluate the distress indicators against their threshold bands.
///
/// Each indicator is checked independently: the first band the value
/// undercuts contributes its notches and ends the scan for that
/// indicator. Indicators without a value contribute nothing. The summed
/// total is clamped at `floor`; breaches are never offset by strength
/// elsewhere.
///
/// Interest coverage and debt-service coverage are read from the raw t0
/// ratio map; the Altman Z is passed separately so a freshly computed
/// score is checked even when the caller never supplied one as a ratio.
pub fn assess_distress(
    bands: &BTreeMap<DistressIndicator, Vec<DistressBand>>,
    floor: i32,
    ratios_t0: &RatioMap,
    altman_z: Option<Decimal>,
) -> DistressAssessment {
    let mut total = 0i32;
    let mut triggers = BTreeMap::new();

    for indicator in DistressIndicator::ALL {
        let value = match indicator {
            DistressIndicator::AltmanZ => altman_z,
            _ => ratios_t0.get(indicator.ratio_key()).copied(),
        };
        let value = match value {
            Some(v) => v,
            None => continue,
        };
        let indicator_bands = match bands.get(&indicator) {
            Some(b) => b,
            None => continue,
        };
        for band in indicator_bands {
            if value < band.below {
                total += band.notches;
                triggers.insert(indicator.ratio_key().to_string(), value);
                debug!(
                    indicator = %indicator,
                    %value,
                    threshold = %band.below,
                    notches = band.notches,
                    "distress band breached"
                );
                break;
            }
        }
    }

    if total < floor {
        total = floor;
    }

    DistressAssessment { notches: total, triggers }
}
