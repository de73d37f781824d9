//! Mathematical utilities: sample grids, interpolation, and descriptive statistics.

pub mod interp;
pub mod spacing;
pub mod stats;

pub use interp::*;
pub use spacing::*;
pub use stats::*;
