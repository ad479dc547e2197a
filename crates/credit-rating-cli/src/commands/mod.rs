pub mod altman;
pub mod rate;
