//! Input/output helpers.
//!
//! - engine archives (`.param` / `.target`) (`archive`)
//! - minimal XML element access (`xml`)
//! - shared pieces of the engine's text dumps (`geopsy`)
//! - result exports (CSV) (`export`)
//! - stats JSON read/write (`summary`)

pub mod archive;
pub mod export;
pub mod geopsy;
pub mod summary;
pub mod xml;

pub use export::*;
pub use summary::*;
