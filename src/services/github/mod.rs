//! GitHub Integration
//!
//! REST client implementing the discovery collaborator, plus artifact zip
//! unpacking.

pub mod archive;
pub mod client;

pub use archive::unpack_zip;
pub use client::GitHubSource;
