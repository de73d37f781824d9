//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - engine schema selection (`GeopsyVersion`)
//! - closed profile / polarization / domain enums (`ProfileKind`, `Polarization`, ...)
//! - JSON parameterization recipes (`ParamRecipe`)

pub mod types;

pub use types::*;
