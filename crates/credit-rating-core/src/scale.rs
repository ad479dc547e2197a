use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{CreditRatingError, CreditRatingResult};

/// Sentinel grade substituted by the tolerant score mapping when no band
/// matches. Not a member of any rating scale; ladder operations pass it
/// through unchanged.
pub const NOT_RATED: &str = "N/R";

// ---------------------------------------------------------------------------
// Rating scale (ordinal ladder)
// ---------------------------------------------------------------------------

/// Position of a grade on the ladder. Index 0 is the strongest grade,
/// larger indices are weaker. All rating movement and comparison goes
/// through this type; ordering is never derived from the grade strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GradeIndex(usize);

/// Ordered rating ladder, strongest grade first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingScale {
    grades: Vec<String>,
}

impl RatingScale {
    pub fn new(grades: Vec<String>) -> Self {
        Self { grades }
    }

    pub fn len(&self) -> usize {
        self.grades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grades.is_empty()
    }

    /// Ladder position of a grade, if the grade is on the scale.
    pub fn position(&self, grade: &str) -> Option<GradeIndex> {
        self.grades.iter().position(|g| g == grade).map(GradeIndex)
    }

    pub fn grade_at(&self, index: GradeIndex) -> &str {
        &self.grades[index.0]
    }

    /// The strongest grade on the ladder.
    pub fn best_grade(&self) -> Option<&str> {
        self.grades.first().map(String::as_str)
    }

    /// Move a grade along the ladder. Positive notches upgrade (towards
    /// index 0), negative notches downgrade; the result is clamped to the
    /// ends of the ladder. Grades not on the scale pass through unchanged.
    pub fn move_notches<'a>(&'a self, grade: &'a str, notches: i32) -> &'a str {
        let index = match self.position(grade) {
            Some(GradeIndex(i)) => i,
            None => return grade,
        };
        let last = self.grades.len() as i64 - 1;
        let moved = (index as i64 - notches as i64).clamp(0, last);
        &self.grades[moved as usize]
    }

    /// Clamp an issuer grade so it is never stronger than the sovereign
    /// grade. With no sovereign, or with either grade off the scale, the
    /// issuer grade passes through unchanged. Idempotent.
    pub fn cap_at_sovereign<'a>(&'a self, issuer: &'a str, sovereign: Option<&str>) -> &'a str {
        let sovereign = match sovereign {
            Some(s) => s,
            None => return issuer,
        };
        match (self.position(issuer), self.position(sovereign)) {
            (Some(i), Some(s)) => self.grade_at(i.max(s)),
            _ => issuer,
        }
    }
}

// ---------------------------------------------------------------------------
// Score bands (combined score -> rating grade)
// ---------------------------------------------------------------------------

/// One entry of the score band table: scores at or above `min_score`, and
/// below the previous entry's minimum, map to `grade`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBand {
    pub min_score: Decimal,
    pub grade: String,
}

/// Score-to-grade cutoff table, descending by minimum score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreBands {
    bands: Vec<ScoreBand>,
}

impl ScoreBands {
    pub fn new(bands: Vec<ScoreBand>) -> Self {
        Self { bands }
    }

    pub fn bands(&self) -> &[ScoreBand] {
        &self.bands
    }

    /// Map a combined score to its rating grade. A score below every
    /// cutoff is a configuration error; a well-formed table covers the
    /// whole scale down to zero.
    pub fn grade_for_score(&self, score: Decimal) -> CreditRatingResult<&str> {
        for band in &self.bands {
            if score >= band.min_score {
                return Ok(&band.grade);
            }
        }
        Err(CreditRatingError::ScoreOutOfBands { score })
    }

    /// Batch-safe variant of `grade_for_score`: a score that matches no
    /// band becomes the [`NOT_RATED`] sentinel and the failure is logged
    /// instead of aborting the run.
    pub fn grade_for_score_tolerant(&self, score: Decimal) -> &str {
        match self.grade_for_score(score) {
            Ok(grade) => grade,
            Err(e) => {
                error!("score-to-rating mapping failed: {e}");
                NOT_RATED
            }
        }
    }

    /// Inclusive score interval [band_min, band_max] mapping to `grade`.
    /// The strongest grade's band tops out at 100; every other band ends
    /// one point below the cutoff above it.
    pub fn band_range(&self, grade: &str) -> CreditRatingResult<(Decimal, Decimal)> {
        for (i, band) in self.bands.iter().enumerate() {
            if band.grade == grade {
                let band_max = if i == 0 {
                    dec!(100)
                } else {
                    self.bands[i - 1].min_score - Decimal::ONE
                };
                return Ok((band.min_score, band_max));
            }
        }
        Err(CreditRatingError::UnknownGrade {
            grade: grade.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
