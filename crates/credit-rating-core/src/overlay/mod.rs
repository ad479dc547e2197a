pub mod distress;
pub mod outlook;
