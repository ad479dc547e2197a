use rust_decimal::Decimal;
use tracing::warn;

use crate::overlay::distress::DistressIndicator;
use crate::scale::{RatingScale, ScoreBands};
use crate::types::{Outlook, RatioMap};

/// Everything the outlook ladder looks at. The ratings are the grade
/// strings produced by the earlier pipeline stages; the ratio maps are
/// the caller's raw per-period maps.
#[derive(Debug, Clone)]
pub struct OutlookInputs<'a> {
    pub combined_score: Decimal,
    pub base_rating: &'a str,
    pub hardstop_rating: &'a str,
    pub capped_rating: &'a str,
    pub final_rating: &'a str,
    pub distress_notches: i32,
    pub sovereign_rating: Option<&'a str>,
    pub sovereign_outlook: Option<Outlook>,
    pub sovereign_cap_binding: bool,
    pub ratios_t0: &'a RatioMap,
    pub ratios_t1: &'a RatioMap,
}

/// Resolve the issuer outlook.
///
/// Three steps, in order: a band-position outlook on the base rating;
/// then either sovereign alignment (when the cap is binding and a
/// sovereign outlook is known) or the distress-trend overlay; then the
/// top-of-scale guard, which reports Positive at the strongest grade as
/// Stable.
pub fn resolve_outlook(
    score_bands: &ScoreBands,
    scale: &RatingScale,
    inputs: &OutlookInputs<'_>,
) -> Outlook {
    let base_outlook = band_outlook(score_bands, inputs.combined_score, inputs.base_rating);

    let mut outlook = match (inputs.sovereign_cap_binding, inputs.sovereign_outlook) {
        (true, Some(sovereign_outlook)) => {
            align_with_sovereign(base_outlook, sovereign_outlook, inputs)
        }
        _ => distress_trend_outlook(
            base_outlook,
            inputs.distress_notches,
            inputs.ratios_t0,
            inputs.ratios_t1,
        ),
    };

    if outlook == Outlook::Positive && Some(inputs.final_rating) == scale.best_grade() {
        outlook = Outlook::Stable;
    }

    outlook
}

/// Position of the floored combined score within the base rating's band:
/// top of the band is Positive, bottom is Negative, interior is Stable.
/// A grade with no band (the not-rated sentinel) falls back to Stable.
fn band_outlook(score_bands: &ScoreBands, combined_score: Decimal, base_rating: &str) -> Outlook {
    let (band_min, band_max) = match score_bands.band_range(base_rating) {
        Ok(range) => range,
        Err(e) => {
            warn!("band outlook unavailable, defaulting to Stable: {e}");
            return Outlook::Stable;
        }
    };
    let position = combined_score.floor().max(band_min).min(band_max);
    if position == band_max {
        Outlook::Positive
    } else if position == band_min {
        Outlook::Negative
    } else {
        Outlook::Stable
    }
}

/// Sovereign-aligned outlook while the cap is binding.
fn align_with_sovereign(
    base_outlook: Outlook,
    sovereign_outlook: Outlook,
    inputs: &OutlookInputs<'_>,
) -> Outlook {
    let aligned_at_sovereign = inputs
        .sovereign_rating
        .map(|sov| inputs.hardstop_rating == sov && inputs.capped_rating == sov)
        .unwrap_or(false);

    // Issuer sits at the sovereign level with the same view; the band
    // outlook stands.
    if aligned_at_sovereign && base_outlook == sovereign_outlook {
        return base_outlook;
    }
    // A view more optimistic than the sovereign's is pulled down to it.
    if base_outlook == Outlook::Positive
        && matches!(sovereign_outlook, Outlook::Stable | Outlook::Negative)
    {
        return sovereign_outlook;
    }
    if base_outlook == Outlook::Negative || sovereign_outlook == Outlook::Negative {
        return Outlook::Negative;
    }
    Outlook::Stable
}

/// Trend overlay once a hardstop has bitten: with notches applied, the
/// outlook is set purely by the direction of the distress ratios between
/// t1 and t0 (higher is better for all three).
fn distress_trend_outlook(
    base_outlook: Outlook,
    distress_notches: i32,
    ratios_t0: &RatioMap,
    ratios_t1: &RatioMap,
) -> Outlook {
    if distress_notches >= 0 {
        return base_outlook;
    }

    let mut improving = false;
    let mut deteriorating = false;

    for indicator in DistressIndicator::ALL {
        let key = indicator.ratio_key();
        let (current, prior) = match (ratios_t0.get(key), ratios_t1.get(key)) {
            (Some(current), Some(prior)) => (current, prior),
            _ => continue,
        };
        if current > prior {
            improving = true;
        } else if current < prior {
            deteriorating = true;
        }
    }

    if improving && !deteriorating {
        Outlook::Stable
    } else if deteriorating && !improving {
        Outlook::Negative
    } else {
        Outlook::Stable
    }
}
