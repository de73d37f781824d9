//! Layered ground models and suites of them.

pub mod model;
pub mod suite;

pub use model::*;
pub use suite::*;
