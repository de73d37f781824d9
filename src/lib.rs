//! `swprepost` library crate.
//!
//! Surface-wave inversion pre- and post-processing for the Geopsy/Dinver
//! engine: parameterizations and dispersion targets go in, ground models and
//! dispersion curves come back out.
//!
//! The binary (`swprep`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - file formats and statistics are reusable from other tools
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod dispersion;
pub mod domain;
pub mod error;
pub mod ground;
pub mod io;
pub mod logging;
pub mod math;
pub mod parameter;
pub mod report;
pub mod suite;
pub mod target;
