//! Theoretical dispersion curves from inversion results.

pub mod curve;
pub mod set;
pub mod suite;

pub use curve::*;
pub use set::*;
pub use suite::*;
