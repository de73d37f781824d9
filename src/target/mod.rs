//! Experimental dispersion targets for inversion.

pub mod modal;
pub mod set;

pub use modal::*;
pub use set::*;
