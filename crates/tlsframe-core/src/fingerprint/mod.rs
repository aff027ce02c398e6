//! JA3 fingerprinting of parsed Hello messages.

pub mod ja3;
pub mod names;

pub use ja3::{compute_ja3, Ja3Result};
