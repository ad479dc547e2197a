pub mod altman;
pub mod grid;
pub mod peers;
pub mod qualitative;
