//! Utilities
//!
//! Error type and path helpers shared by the rest of the crate.

pub mod error;
pub mod paths;

pub use error::*;
pub use paths::*;
