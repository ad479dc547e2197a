use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::{EngineConfig, RatioFamily};
use crate::overlay::distress::{assess_distress, DistressAssessment};
use crate::overlay::outlook::{resolve_outlook, OutlookInputs};
use crate::scale::NOT_RATED;
use crate::scoring::altman::{compute_altman_z, AltmanComponents, ALTMAN_Z_KEY};
use crate::scoring::grid::score_ratio;
use crate::scoring::peers::compute_peer_score;
use crate::scoring::qualitative::score_qualitative_factor;
use crate::types::{with_metadata, ComputationOutput, Outlook, PeerMap, RatioMap, Score};
use crate::CreditRatingResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Quantitative inputs for one issuer: per-period ratio maps, optional raw
/// Altman Z components, and the peer panels at t0.
///
/// Missing data is an absent key, never a zero. The engine scores t0 and
/// reads t1 for the distress trend; t2 rides along for callers that keep a
/// rolling window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuantSnapshot {
    /// Current-period ratios
    #[serde(default)]
    pub ratios_t0: RatioMap,
    /// Previous-period ratios
    #[serde(default)]
    pub ratios_t1: RatioMap,
    /// Ratios two periods ago
    #[serde(default)]
    pub ratios_t2: RatioMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components_t0: Option<AltmanComponents>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components_t1: Option<AltmanComponents>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components_t2: Option<AltmanComponents>,
    /// Ratio name -> peer values at t0
    #[serde(default)]
    pub peers_t0: PeerMap,
}

/// Qualitative assessments for one issuer, factor name -> value intended
/// to be in 1-5. The factor set is open; unknown names score like any
/// other.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualSnapshot {
    #[serde(default)]
    pub factors_t0: BTreeMap<String, u8>,
    #[serde(default)]
    pub factors_t1: BTreeMap<String, u8>,
}

/// Complete input for one issuer rating run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerRatingInput {
    /// Issuer label used on the output record and in diagnostics
    pub issuer_name: String,
    #[serde(default)]
    pub quantitative: QuantSnapshot,
    #[serde(default)]
    pub qualitative: QualSnapshot,
    /// Sovereign rating symbol on the configured scale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sovereign_rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sovereign_outlook: Option<Outlook>,
    /// Apply the distress notching overlay
    #[serde(default)]
    pub enable_hardstops: bool,
    /// Cap the post-distress rating at the sovereign rating
    #[serde(default)]
    pub enable_sovereign_cap: bool,
}

/// Switch and trigger states echoed on every output record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingFlags {
    pub hardstops_enabled: bool,
    /// True only when the cap switch is on and a sovereign rating was supplied
    pub sovereign_cap_enabled: bool,
    pub hardstop_triggered: bool,
    pub sovereign_cap_binding: bool,
}

/// Authoritative record of one rating run. Assembled once by the pipeline
/// and never mutated afterwards; serializable as-is for storage and audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerRatingOutput {
    pub issuer_name: String,
    /// Mean of the scored ratios plus the peer score, 0 if none scored
    pub quantitative_score: Score,
    /// Mean of the scored qualitative factors, 0 if none scored
    pub qualitative_score: Score,
    /// Weighted blend of the quantitative and qualitative scores
    pub combined_score: Score,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_score: Option<Score>,
    /// Model rating before hardstops and cap
    pub base_rating: String,
    /// Total distress notches applied, never positive
    pub distress_notches: i32,
    /// Rating after distress notches
    pub hardstop_rating: String,
    /// Rating after the sovereign cap
    pub capped_rating: String,
    /// Delivered rating (currently the capped rating)
    pub final_rating: String,
    pub hardstop_triggered: bool,
    /// Distress indicators that breached, with the breaching values
    pub hardstop_details: BTreeMap<String, Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sovereign_rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sovereign_outlook: Option<Outlook>,
    /// True when the delivered rating sits exactly at the sovereign rating
    pub sovereign_cap_binding: bool,
    pub outlook: Outlook,
    /// Per-family mean ratio score to one decimal place, all families present
    pub bucket_avgs: BTreeMap<RatioFamily, Decimal>,
    /// Altman Z at t0, supplied or computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altman_z_t0: Option<Decimal>,
    pub flags: RatingFlags,
    /// Narrative walking the chain from combined score to final rating
    pub rating_explanation: String,
}

// ---------------------------------------------------------------------------
// Rating pipeline
// ---------------------------------------------------------------------------

/// Run the full rating pipeline for one issuer.
///
/// Sequence: quantitative and qualitative aggregation, weight blend,
/// score-to-rating mapping, distress notching, sovereign cap, outlook.
/// Data gaps degrade item by item and surface as envelope warnings;
/// only a structurally invalid configuration returns an error.
pub fn calculate_issuer_rating(
    input: &IssuerRatingInput,
    config: &EngineConfig,
) -> CreditRatingResult<ComputationOutput<IssuerRatingOutput>> {
    let start = Instant::now();
    config.validate()?;

    let mut warnings: Vec<String> = Vec::new();
    let issuer = input.issuer_name.as_str();

    // -- Scores -------------------------------------------------------------

    let quant = aggregate_quantitative(issuer, config, &input.quantitative, &mut warnings);
    let (qual_score, n_qual) = aggregate_qualitative(issuer, config, &input.qualitative, &mut warnings);

    let (w_quant, w_qual) = config.weights.effective_weights(quant.items, n_qual);
    if w_quant.is_zero() && w_qual.is_zero() {
        warnings.push(
            "No scored quantitative or qualitative inputs; combined score defaults to 0"
                .to_string(),
        );
    }
    info!(
        issuer,
        n_quant = quant.items,
        n_qual,
        w_quant = %w_quant,
        w_qual = %w_qual,
        "effective weights"
    );

    let combined_score = w_quant * quant.score + w_qual * qual_score;

    // -- Base rating --------------------------------------------------------

    let base_rating = config
        .score_bands
        .grade_for_score_tolerant(combined_score)
        .to_string();
    if base_rating == NOT_RATED {
        warnings.push(format!(
            "Combined score {:.1} matched no rating band; issuer reported as {NOT_RATED}",
            combined_score
        ));
    }

    // -- Distress overlay ---------------------------------------------------

    let distress = if input.enable_hardstops {
        assess_distress(
            &config.distress_bands,
            config.distress_notch_floor,
            &input.quantitative.ratios_t0,
            quant.altman_z,
        )
    } else {
        DistressAssessment::default()
    };
    let hardstop_rating = config
        .rating_scale
        .move_notches(&base_rating, distress.notches)
        .to_string();
    let hardstop_triggered = distress.notches < 0;

    // -- Sovereign cap ------------------------------------------------------

    let capped_rating = if input.enable_sovereign_cap {
        config
            .rating_scale
            .cap_at_sovereign(&hardstop_rating, input.sovereign_rating.as_deref())
            .to_string()
    } else {
        hardstop_rating.clone()
    };
    let final_rating = capped_rating.clone();

    let sovereign_cap_binding = input.enable_sovereign_cap
        && input
            .sovereign_rating
            .as_deref()
            .map(|sovereign| sovereign == final_rating)
            .unwrap_or(false);

    // -- Outlook ------------------------------------------------------------

    let outlook = resolve_outlook(
        &config.score_bands,
        &config.rating_scale,
        &OutlookInputs {
            combined_score,
            base_rating: &base_rating,
            hardstop_rating: &hardstop_rating,
            capped_rating: &capped_rating,
            final_rating: &final_rating,
            distress_notches: distress.notches,
            sovereign_rating: input.sovereign_rating.as_deref(),
            sovereign_outlook: input.sovereign_outlook,
            sovereign_cap_binding,
            ratios_t0: &input.quantitative.ratios_t0,
            ratios_t1: &input.quantitative.ratios_t1,
        },
    );

    info!(
        issuer,
        base = %base_rating,
        hardstop = %hardstop_rating,
        capped = %capped_rating,
        final_rating = %final_rating,
        outlook = %outlook,
        notches = distress.notches,
        "rating chain resolved"
    );

    // -- Assemble record ----------------------------------------------------

    let flags = RatingFlags {
        hardstops_enabled: input.enable_hardstops,
        sovereign_cap_enabled: input.enable_sovereign_cap && input.sovereign_rating.is_some(),
        hardstop_triggered,
        sovereign_cap_binding,
    };

    let mut record = IssuerRatingOutput {
        issuer_name: input.issuer_name.clone(),
        quantitative_score: quant.score,
        qualitative_score: qual_score,
        combined_score,
        peer_score: quant.peer_score,
        base_rating,
        distress_notches: distress.notches,
        hardstop_rating,
        capped_rating,
        final_rating,
        hardstop_triggered,
        hardstop_details: distress.triggers,
        sovereign_rating: input.sovereign_rating.clone(),
        sovereign_outlook: input.sovereign_outlook,
        sovereign_cap_binding,
        outlook,
        bucket_avgs: quant.bucket_avgs,
        altman_z_t0: quant.altman_z,
        flags,
        rating_explanation: String::new(),
    };
    record.rating_explanation = build_explanation(&record);

    let assumptions = serde_json::json!({
        "weight_mode": if config.weights.is_fixed() { "fixed" } else { "count_proportional" },
        "quantitative_weight": w_quant.to_string(),
        "qualitative_weight": w_qual.to_string(),
        "hardstops_enabled": input.enable_hardstops,
        "sovereign_cap_enabled": input.enable_sovereign_cap,
        "distress_notch_floor": config.distress_notch_floor,
    });

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Grid-based issuer credit rating with distress and sovereign overlays",
        &assumptions,
        warnings,
        elapsed,
        record,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct QuantAssessment {
    score: Score,
    peer_score: Option<Score>,
    bucket_avgs: BTreeMap<RatioFamily, Decimal>,
    altman_z: Option<Decimal>,
    /// Scored ratios plus the peer score, the quantitative weight count
    items: usize,
}

fn mean(values: &[Score]) -> Option<Score> {
    if values.is_empty() {
        return None;
    }
    let total: Decimal = values.iter().sum();
    Some(total / Decimal::from(values.len() as u64))
}

/// Resolve the t0 Altman Z, preferring a value already present in the
/// working ratio map over recomputation. A freshly computed Z is cached
/// into the map so grid scoring picks it up like any other ratio.
fn ensure_altman_z(
    issuer: &str,
    ratios: &mut RatioMap,
    components: Option<&AltmanComponents>,
) -> Option<Decimal> {
    if let Some(z) = ratios.get(ALTMAN_Z_KEY) {
        return Some(*z);
    }
    let components = components?;
    let z = compute_altman_z(components)?;
    ratios.insert(ALTMAN_Z_KEY.to_string(), z);
    info!(issuer, z = %z.round_dp(3), "Altman Z computed from components");
    Some(z)
}

fn aggregate_quantitative(
    issuer: &str,
    config: &EngineConfig,
    quant: &QuantSnapshot,
    warnings: &mut Vec<String>,
) -> QuantAssessment {
    // Work on a copy so the caller's snapshot never sees the injected Z.
    let mut ratios = quant.ratios_t0.clone();
    let altman_z = ensure_altman_z(issuer, &mut ratios, quant.components_t0.as_ref());

    let mut scores: Vec<Score> = Vec::new();
    let mut buckets: BTreeMap<RatioFamily, Vec<Score>> = RatioFamily::ALL
        .iter()
        .map(|family| (*family, Vec::new()))
        .collect();

    for (name, value) in &ratios {
        let family = match config.ratio_families.get(name) {
            Some(family) => *family,
            None => continue,
        };
        let score = match score_ratio(&config.ratio_grids, name, *value) {
            Some(score) => score,
            None => continue,
        };
        debug!(
            issuer,
            ratio = %name,
            value = %value,
            score = %score,
            family = %family,
            "ratio scored"
        );
        scores.push(score);
        buckets.entry(family).or_default().push(score);
    }

    let peer_score = compute_peer_score(&ratios, &quant.peers_t0);
    if let Some(peer) = peer_score {
        info!(issuer, score = %peer, "peer positioning scored");
        scores.push(peer);
        buckets.entry(RatioFamily::Other).or_default().push(peer);
    }

    let items = scores.len();
    let score = match mean(&scores) {
        Some(value) => value,
        None => {
            warnings.push(
                "No quantitative inputs could be scored; quantitative score defaults to 0"
                    .to_string(),
            );
            Decimal::ZERO
        }
    };
    info!(issuer, score = %score.round_dp(1), items, "quantitative aggregate");

    let bucket_avgs = buckets
        .iter()
        .map(|(family, values)| (*family, mean(values).unwrap_or(Decimal::ZERO).round_dp(1)))
        .collect();

    QuantAssessment {
        score,
        peer_score,
        bucket_avgs,
        altman_z,
        items,
    }
}

fn aggregate_qualitative(
    issuer: &str,
    config: &EngineConfig,
    qual: &QualSnapshot,
    warnings: &mut Vec<String>,
) -> (Score, usize) {
    let mut scores: Vec<Score> = Vec::new();
    for (name, &value) in &qual.factors_t0 {
        match score_qualitative_factor(&config.likert_scale, value) {
            Some(score) => {
                debug!(issuer, factor = %name, value, score = %score, "qualitative factor scored");
                scores.push(score);
            }
            None => {
                warnings.push(format!(
                    "Qualitative factor '{name}' has value {value} outside the scoring scale and was skipped"
                ));
            }
        }
    }

    let items = scores.len();
    let score = match mean(&scores) {
        Some(value) => value,
        None => {
            warnings.push(
                "No qualitative factors could be scored; qualitative score defaults to 0"
                    .to_string(),
            );
            Decimal::ZERO
        }
    };
    info!(issuer, score = %score.round_dp(1), items, "qualitative aggregate");

    (score, items)
}

/// Narrative for the output record; fixed sentence templates selected by
/// the hardstop and sovereign-cap outcomes.
fn build_explanation(record: &IssuerRatingOutput) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(format!(
        "Based on the quantitative and qualitative factors, the combined score is {:.1}, \
         corresponding to a base rating of {}.",
        record.combined_score, record.base_rating
    ));

    if record.hardstop_triggered {
        let triggers: Vec<&str> = record.hardstop_details.keys().map(String::as_str).collect();
        parts.push(format!(
            " Distress factors [{}] triggered a total of {} notch(es) of downgrade, \
             resulting in a post-distress (hardstop) rating of {}.",
            triggers.join(", "),
            record.distress_notches.abs(),
            record.hardstop_rating
        ));
    } else {
        parts.push(format!(
            " No distress-related hardstops were applied, so the hardstop rating remains \
             equal to the base rating at {}.",
            record.hardstop_rating
        ));
    }

    match record.sovereign_rating.as_deref() {
        Some(sovereign) if record.flags.sovereign_cap_enabled => {
            if record.sovereign_cap_binding {
                if record.hardstop_rating != record.capped_rating {
                    parts.push(format!(
                        " The sovereign cap is binding: given the sovereign rating of \
                         {sovereign}, the rating is constrained from {} to a capped rating \
                         of {}.",
                        record.hardstop_rating, record.capped_rating
                    ));
                } else {
                    parts.push(format!(
                        " The issuer's rating is aligned with the sovereign rating at \
                         {sovereign}, so the sovereign cap is effectively binding."
                    ));
                }
            } else {
                parts.push(format!(
                    " A sovereign rating of {sovereign} is considered, but it does not \
                     constrain the issuer rating, so the capped rating remains {}.",
                    record.capped_rating
                ));
            }
        }
        _ => {
            parts.push(format!(
                " No sovereign cap is applied, so the capped rating is the same as the \
                 post-distress rating at {}.",
                record.capped_rating
            ));
        }
    }

    parts.push(format!(
        " The final issuer rating is {} with an outlook of {}.",
        record.final_rating, record.outlook
    ));

    parts.concat()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn components() -> AltmanComponents {
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

    /// Record with a quiet rating chain, used as the narrative baseline.
    fn sample_record() -> IssuerRatingOutput {
        IssuerRatingOutput {
            issuer_name: "SampleCorp".to_string(),
            quantitative_score: dec!(60),
            qualitative_score: dec!(55),
            combined_score: dec!(57.8),
            peer_score: Some(dec!(50)),
            base_rating: "BBB".to_string(),
            distress_notches: 0,
            hardstop_rating: "BBB".to_string(),
            capped_rating: "BBB".to_string(),
            final_rating: "BBB".to_string(),
            hardstop_triggered: false,
            hardstop_details: BTreeMap::new(),
            sovereign_rating: None,
            sovereign_outlook: None,
            sovereign_cap_binding: false,
            outlook: Outlook::Stable,
            bucket_avgs: BTreeMap::new(),
            altman_z_t0: Some(dec!(2.5)),
            flags: RatingFlags {
                hardstops_enabled: false,
                sovereign_cap_enabled: false,
                hardstop_triggered: false,
                sovereign_cap_binding: false,
            },
            rating_explanation: String::new(),
        }
    }

    #[test]
    fn test_existing_altman_z_wins_over_components() {
        let mut ratios = RatioMap::new();
        ratios.insert("altman_z".to_string(), dec!(2.5));
        let z = ensure_altman_z("Test", &mut ratios, Some(&components()));
        assert_eq!(z, Some(dec!(2.5)));
        assert_eq!(ratios.get("altman_z"), Some(&dec!(2.5)));
    }

    #[test]
    fn test_computed_altman_z_is_cached_into_the_map() {
        let mut ratios = RatioMap::new();
        let z = ensure_altman_z("Test", &mut ratios, Some(&components()));
        // 1.2*0.1 + 1.4*0.2 + 3.3*0.15 + 0.6*1.5 + 1.0*1.8 = 3.595
        assert_eq!(z, Some(dec!(3.595)));
        assert_eq!(ratios.get("altman_z"), Some(&dec!(3.595)));
    }

    #[test]
    fn test_altman_z_undefined_without_components() {
        let mut ratios = RatioMap::new();
        let z = ensure_altman_z("Test", &mut ratios, None);
        assert_eq!(z, None);
        assert!(!ratios.contains_key("altman_z"));
    }

    #[test]
    fn test_mean_of_empty_slice_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[dec!(70), dec!(80)]), Some(dec!(75)));
    }

    #[test]
    fn test_out_of_range_factor_warns_and_skips() {
        let config = EngineConfig::default();
        let mut warnings = Vec::new();
        let mut qual = QualSnapshot::default();
        qual.factors_t0.insert("governance".to_string(), 4);
        qual.factors_t0.insert("transparency".to_string(), 9);
        let (score, items) = aggregate_qualitative("Test", &config, &qual, &mut warnings);
        assert_eq!(score, dec!(75));
        assert_eq!(items, 1);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("transparency"));
    }

    #[test]
    fn test_narrative_quiet_chain() {
        let text = build_explanation(&sample_record());
        assert_eq!(
            text,
            "Based on the quantitative and qualitative factors, the combined score is 57.8, \
             corresponding to a base rating of BBB. No distress-related hardstops were \
             applied, so the hardstop rating remains equal to the base rating at BBB. No \
             sovereign cap is applied, so the capped rating is the same as the post-distress \
             rating at BBB. The final issuer rating is BBB with an outlook of Stable."
        );
    }

    #[test]
    fn test_narrative_hardstop_branch() {
        let mut record = sample_record();
        record.hardstop_triggered = true;
        record.distress_notches = -3;
        record.hardstop_rating = "BB".to_string();
        record.hardstop_details.insert("dscr".to_string(), dec!(0.85));
        record.hardstop_details.insert("interest_coverage".to_string(), dec!(0.7));
        let text = build_explanation(&record);
        assert!(text.contains(
            "Distress factors [dscr, interest_coverage] triggered a total of 3 notch(es)"
        ));
        assert!(text.contains("post-distress (hardstop) rating of BB"));
    }

    #[test]
    fn test_narrative_binding_cap_that_moved_the_rating() {
        let mut record = sample_record();
        record.sovereign_rating = Some("BB".to_string());
        record.capped_rating = "BB".to_string();
        record.final_rating = "BB".to_string();
        record.sovereign_cap_binding = true;
        record.flags.sovereign_cap_enabled = true;
        record.flags.sovereign_cap_binding = true;
        let text = build_explanation(&record);
        assert!(text.contains(
            "The sovereign cap is binding: given the sovereign rating of BB, the rating is \
             constrained from BBB to a capped rating of BB."
        ));
    }

    #[test]
    fn test_narrative_cap_binding_at_sovereign_level() {
        let mut record = sample_record();
        record.sovereign_rating = Some("BBB".to_string());
        record.sovereign_cap_binding = true;
        record.flags.sovereign_cap_enabled = true;
        record.flags.sovereign_cap_binding = true;
        let text = build_explanation(&record);
        assert!(text.contains(
            "The issuer's rating is aligned with the sovereign rating at BBB, so the \
             sovereign cap is effectively binding."
        ));
    }

    #[test]
    fn test_narrative_cap_considered_but_not_constraining() {
        let mut record = sample_record();
        record.sovereign_rating = Some("A".to_string());
        record.flags.sovereign_cap_enabled = true;
        let text = build_explanation(&record);
        assert!(text.contains(
            "A sovereign rating of A is considered, but it does not constrain the issuer \
             rating, so the capped rating remains BBB."
        ));
    }

    #[test]
    fn test_pipeline_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.rating_scale = crate::scale::RatingScale::new(Vec::new());
        let input = IssuerRatingInput {
            issuer_name: "Test".to_string(),
            quantitative: QuantSnapshot::default(),
            qualitative: QualSnapshot::default(),
            sovereign_rating: None,
            sovereign_outlook: None,
            enable_hardstops: false,
            enable_sovereign_cap: false,
        };
        assert!(calculate_issuer_rating(&input, &config).is_err());
    }
}
