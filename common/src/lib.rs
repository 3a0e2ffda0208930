//! Glasscalc Common Types
//!
//! Value types shared by the calculation engine and the rate cache,
//! including the currency descriptor and timing constants.

pub mod currency;
pub mod time;

pub use currency::*;
pub use time::*;
