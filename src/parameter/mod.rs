//! Inversion search bounds: per-profile [`Parameter`]s and the four-profile
//! [`Parameterization`] written to Dinver `.param` files.

pub mod parameter;
pub mod parameterization;

pub use parameter::*;
pub use parameterization::*;
