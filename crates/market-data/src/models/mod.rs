//! Market data models
//!
//! - `quote` - The [`PriceSample`] contract every provider converts into

mod quote;

pub use quote::PriceSample;
