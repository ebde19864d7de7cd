//! Shared utilities.

pub mod hash;
pub mod mime;
pub mod path;
