pub mod config;
pub mod engine;
pub mod error;
pub mod overlay;
pub mod scale;
pub mod scoring;
pub mod types;
pub mod weights;

pub use config::{EngineConfig, RatioFamily};
pub use engine::{
    calculate_issuer_rating, IssuerRatingInput, IssuerRatingOutput, QualSnapshot, QuantSnapshot,
    RatingFlags,
};
pub use error::CreditRatingError;
pub use scale::{RatingScale, ScoreBands, NOT_RATED};
pub use scoring::altman::{compute_altman_z, AltmanComponents};
pub use types::*;
pub use weights::WeightPolicy;

/// Standard result type for all rating operations
pub type CreditRatingResult<T> = Result<T, CreditRatingError>;
